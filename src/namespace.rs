//! Substitution namespaces.
//!
//! A [`Namespace`] maps variable names to substitution targets ([`Term`]s). It is
//! supplied by callers to [`Expr::reify`][crate::expr::Expr::reify] and
//! [`Expr::eval`][crate::expr::Expr::eval] and never modified by them.

use std::collections::HashMap;
use std::rc::Rc;

use crate::assignment::Assignment;
use crate::error::{Error, Result};
use crate::expr::{Term, Variable};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    bindings: HashMap<Rc<str>, Term>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` (a [`Variable`] or a plain name) to `target`.
    ///
    /// Rebinding a key to an equal target is a no-op. Rebinding it to a different
    /// target fails with [`Error::AmbiguousNamespace`].
    pub fn insert(&mut self, key: impl AsRef<str>, target: impl Into<Term>) -> Result<()> {
        let name = key.as_ref();
        let target = target.into();
        match self.bindings.get(name) {
            Some(existing) if *existing != target => Err(Error::AmbiguousNamespace {
                name: name.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.bindings.insert(Rc::from(name), target);
                Ok(())
            }
        }
    }

    /// Builder form of [`insert`][Namespace::insert].
    pub fn with(mut self, key: impl AsRef<str>, target: impl Into<Term>) -> Result<Self> {
        self.insert(key, target)?;
        Ok(self)
    }

    /// Builds a namespace from `(key, target)` pairs.
    pub fn try_from_pairs<I, K, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, T)>,
        K: AsRef<str>,
        T: Into<Term>,
    {
        let mut ns = Self::new();
        for (key, target) in pairs {
            ns.insert(key, target)?;
        }
        Ok(ns)
    }

    /// Combines two substitution sources.
    ///
    /// Fails with [`Error::AmbiguousNamespace`] if both bind the same name to
    /// different targets. Supplying two sources is not ambiguous in itself:
    /// they may overlap as long as every shared name has the same target.
    pub fn merge(mut self, other: &Namespace) -> Result<Self> {
        for (name, target) in &other.bindings {
            self.insert(&**name, target.clone())?;
        }
        Ok(self)
    }

    /// Target bound to `var`, if any.
    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.bindings.get(var.name())
    }

    /// Target bound to the variable named `name`, if any.
    pub fn get_by_name(&self, name: &str) -> Option<&Term> {
        self.bindings.get(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.bindings.iter().map(|(name, target)| (&**name, target))
    }
}

impl From<&Assignment> for Namespace {
    fn from(assignment: &Assignment) -> Self {
        let bindings = assignment
            .iter()
            .map(|(var, value)| (Rc::from(var.name()), Term::from(value)))
            .collect();
        Namespace { bindings }
    }
}
