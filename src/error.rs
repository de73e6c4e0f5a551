//! Error type shared by every fallible operation of the crate.

use thiserror::Error;

/// Errors raised while building, substituting, evaluating, normalizing or solving formulas.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A variable name was rejected by [`is_valid_identifier`][crate::ident::is_valid_identifier].
    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),

    /// Two substitution sources disagree on the target of the same variable.
    #[error("conflicting bindings for variable `{name}`")]
    AmbiguousNamespace { name: String },

    /// An operand does not support the boolean or comparison operation applied to it.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Chained substitution came back to a variable it was already resolving.
    #[error("cyclic substitution through variable `{0}`")]
    CyclicSubstitution(String),

    /// The normalizer or the encoder met a shape it never produces.
    /// This is a bug, not a user error.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// The satisfiability oracle reported a failure.
    #[error("satisfiability oracle failed: {0}")]
    Oracle(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
