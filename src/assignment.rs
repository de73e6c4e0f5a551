//! Assignments of truth values to variables.
//!
//! A [`Schema`] is the sorted list of free variables of an expression. It is
//! computed once and passed around explicitly; an [`Assignment`] gives one
//! boolean to each variable of a schema.

use std::fmt;
use std::rc::Rc;

use num_bigint::BigUint;

use crate::expr::{Expr, Variable};
use crate::namespace::Namespace;

/// Sorted, duplicate-free list of variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema {
    variables: Rc<[Variable]>,
}

impl Schema {
    /// Schema over no variables.
    pub fn empty() -> Self {
        Self::from_variables(Vec::new())
    }

    /// Schema over the free variables of `expr`.
    pub fn of(expr: &Expr) -> Self {
        // Free variable sets are already ordered by name.
        Schema {
            variables: expr.free_variables().iter().cloned().collect(),
        }
    }

    pub fn from_variables(variables: impl IntoIterator<Item = Variable>) -> Self {
        let mut variables: Vec<Variable> = variables.into_iter().collect();
        variables.sort();
        variables.dedup();
        Schema {
            variables: variables.into(),
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Builds the assignment giving `values[i]` to the `i`-th variable.
    ///
    /// # Panics
    ///
    /// Panics if the number of values differs from the number of variables.
    pub fn assign(&self, values: impl IntoIterator<Item = bool>) -> Assignment {
        let entries: Vec<(Variable, bool)> = self.variables.iter().cloned().zip(values).collect();
        assert_eq!(entries.len(), self.len(), "Assignment arity must match the schema");
        Assignment { entries }
    }

    /// Iterates over all `2^n` assignments of the schema in canonical order:
    /// every variable takes `true` before `false`, and the first variable varies slowest.
    pub fn assignments(&self) -> Assignments {
        Assignments {
            schema: self.clone(),
            next: Some(vec![true; self.len()]),
        }
    }

    /// Number of assignments of the schema, `2^n`.
    pub fn assignment_count(&self) -> BigUint {
        BigUint::from(2u32).pow(self.len() as u32)
    }
}

/// Iterator over the assignments of a [`Schema`].
///
/// Created by [`Schema::assignments()`].
#[derive(Debug, Clone)]
pub struct Assignments {
    schema: Schema,
    next: Option<Vec<bool>>,
}

impl Iterator for Assignments {
    type Item = Assignment;

    fn next(&mut self) -> Option<Self::Item> {
        let values = self.next.take()?;
        let assignment = self.schema.assign(values.iter().copied());

        // Advance the odometer: the last `true` flips to `false`, everything after it resets.
        if let Some(i) = values.iter().rposition(|&v| v) {
            let mut succ = values;
            succ[i] = false;
            succ[i + 1..].fill(true);
            self.next = Some(succ);
        }

        Some(assignment)
    }
}

/// Truth values for a fixed set of variables, sorted by variable name.
///
/// Equality and hashing are by the full list of `(variable, value)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Assignment {
    entries: Vec<(Variable, bool)>,
}

impl Assignment {
    /// The assignment over no variables.
    pub fn empty() -> Self {
        Assignment { entries: Vec::new() }
    }

    /// Builds an assignment from `(variable, value)` pairs in any order.
    ///
    /// # Panics
    ///
    /// Panics if a variable occurs twice.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Variable, bool)>) -> Self {
        let mut entries: Vec<(Variable, bool)> = pairs.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        assert!(
            entries.windows(2).all(|w| w[0].0 != w[1].0),
            "Assignment must not bind a variable twice"
        );
        Assignment { entries }
    }

    pub fn get(&self, var: &Variable) -> Option<bool> {
        self.entries
            .binary_search_by(|(v, _)| v.cmp(var))
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn get_by_name(&self, name: &str) -> Option<bool> {
        self.entries
            .binary_search_by(|(v, _)| v.name().cmp(name))
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, bool)> {
        self.entries.iter().map(|(var, value)| (var, *value))
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.entries.iter().map(|(var, _)| var)
    }

    pub fn values(&self) -> impl Iterator<Item = bool> + '_ {
        self.entries.iter().map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Namespace binding every variable to its boolean value.
    pub fn to_namespace(&self) -> Namespace {
        Namespace::from(self)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (var, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", var, value)?;
        }
        write!(f, ")")
    }
}
