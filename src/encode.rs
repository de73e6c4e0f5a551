//! Clause encoding of CNF formulas.
//!
//! Every variable of the formula gets a 1-based index. The constants `true` and
//! `false` have no clause form of their own, so they are expressed through one
//! anchor variable with the next free index, forced true by a unit clause:
//! `true` becomes `+anchor` and `false` becomes `-anchor`. The anchor never gets
//! a name, so it cannot collide with user variables.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::assignment::{Assignment, Schema};
use crate::error::{Error, Result};
use crate::expr::{Expr, VarSet, Variable};
use crate::types::{Lit, Var};

/// A CNF formula as integer clauses, with the mapping back to variables.
#[derive(Debug, Clone)]
pub struct Encoding {
    variables: Vec<Variable>,
    indices: HashMap<Variable, Var>,
    anchor: Option<Var>,
    clauses: Vec<Vec<Lit>>,
}

impl Encoding {
    /// Encodes a formula in conjunctive normal form.
    ///
    /// An `And` contributes one clause per child; any other node is a single
    /// clause. Each clause is a disjunction of atoms or a single atom.
    ///
    /// Fails with [`Error::InternalInvariantViolation`] on any other shape, such
    /// as a negation of a compound formula.
    pub fn new(cnf: &Expr) -> Result<Self> {
        Self::over(&Schema::empty(), cnf)
    }

    /// Like [`new`][Encoding::new], but also indexes the variables of `schema`,
    /// whether or not they occur in `cnf`.
    pub fn over(schema: &Schema, cnf: &Expr) -> Result<Self> {
        let mut all: VarSet = (*cnf.free_variables()).clone();
        all.extend(schema.variables().iter().cloned());
        let variables: Vec<Variable> = all.into_iter().collect();

        let mut indices = HashMap::with_capacity(variables.len());
        for (i, var) in variables.iter().enumerate() {
            indices.insert(var.clone(), Var::new(i as u32 + 1));
        }

        let mut encoder = Encoder {
            indices: &indices,
            anchor: Var::new(variables.len() as u32 + 1),
            anchor_used: false,
        };

        let conjuncts = match cnf {
            Expr::And(_) => cnf.children(),
            _ => std::slice::from_ref(cnf),
        };
        let mut clauses = Vec::with_capacity(conjuncts.len() + 1);
        for conjunct in conjuncts {
            clauses.push(encoder.clause(conjunct)?);
        }

        let anchor = if encoder.anchor_used {
            clauses.push(vec![encoder.anchor.pos()]);
            Some(encoder.anchor)
        } else {
            None
        };

        debug!(
            "encoded {} variables{} into {} clauses",
            variables.len(),
            if anchor.is_some() { " and the anchor" } else { "" },
            clauses.len()
        );

        Ok(Encoding {
            variables,
            indices,
            anchor,
            clauses,
        })
    }

    /// Number of clause variables, including the anchor.
    pub fn num_vars(&self) -> u32 {
        self.variables.len() as u32 + u32::from(self.anchor.is_some())
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Vec<Lit>] {
        &self.clauses
    }

    /// Variables in index order: `variables()[i]` has index `i + 1`.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The anchor variable, present iff the formula mentions a constant.
    pub fn anchor(&self) -> Option<Var> {
        self.anchor
    }

    pub fn index_of(&self, var: &Variable) -> Option<Var> {
        self.indices.get(var).copied()
    }

    /// Maps a model back to an assignment of the encoded variables.
    ///
    /// The model must assign every variable and set the anchor to true.
    pub fn decode(&self, model: &[Lit]) -> Result<Assignment> {
        let mut values = vec![None; self.variables.len()];
        for &lit in model {
            let var = lit.var();
            if Some(var) == self.anchor {
                if !lit.is_positive() {
                    return Err(Error::InternalInvariantViolation(
                        "model sets the anchor variable to false".to_string(),
                    ));
                }
                continue;
            }
            let slot = values.get_mut(var.id() as usize - 1).ok_or_else(|| {
                Error::InternalInvariantViolation(format!("model assigns unknown variable {}", var))
            })?;
            *slot = Some(lit.is_positive());
        }

        let pairs = self
            .variables
            .iter()
            .zip(values)
            .map(|(var, value)| {
                value.map(|b| (var.clone(), b)).ok_or_else(|| {
                    Error::InternalInvariantViolation(format!("model does not assign `{}`", var))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Assignment::from_pairs(pairs))
    }
}

struct Encoder<'a> {
    indices: &'a HashMap<Variable, Var>,
    anchor: Var,
    anchor_used: bool,
}

impl Encoder<'_> {
    fn clause(&mut self, conjunct: &Expr) -> Result<Vec<Lit>> {
        match conjunct {
            Expr::Or(literals) => literals.iter().map(|l| self.literal(l)).collect(),
            _ => Ok(vec![self.literal(conjunct)?]),
        }
    }

    fn literal(&mut self, expr: &Expr) -> Result<Lit> {
        match expr {
            Expr::Var(v) => self.index(v).map(Var::pos),
            Expr::Lit(b) => Ok(self.constant(*b)),
            Expr::Not(_) => match expr.children() {
                [Expr::Var(v)] => self.index(v).map(Var::neg),
                [Expr::Lit(b)] => Ok(self.constant(!*b)),
                _ => Err(Error::InternalInvariantViolation(format!(
                    "negation of a compound formula reached the encoder: `{}`",
                    expr
                ))),
            },
            Expr::Or(_) | Expr::And(_) | Expr::Rel(_) => Err(Error::InternalInvariantViolation(format!(
                "`{}` is not a literal",
                expr
            ))),
        }
    }

    fn index(&self, var: &Variable) -> Result<Var> {
        self.indices.get(var).copied().ok_or_else(|| {
            Error::InternalInvariantViolation(format!("variable `{}` has no index", var))
        })
    }

    fn constant(&mut self, value: bool) -> Lit {
        self.anchor_used = true;
        self.anchor.lit(value)
    }
}

/// DIMACS form, with the variable names as comments.
impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, var) in self.variables.iter().enumerate() {
            writeln!(f, "c {} {}", i + 1, var)?;
        }
        if let Some(anchor) = self.anchor {
            writeln!(f, "c {} <anchor>", anchor.id())?;
        }
        writeln!(f, "p cnf {} {}", self.num_vars(), self.num_clauses())?;
        for clause in &self.clauses {
            for lit in clause {
                write!(f, "{} ", lit)?;
            }
            writeln!(f, "0")?;
        }
        Ok(())
    }
}
