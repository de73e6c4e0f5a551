//! # reasoner-rs: Symbolic Boolean Expressions in Rust
//!
//! **`reasoner-rs`** is a small library for building propositional formulas as expression trees,
//! substituting and evaluating them, converting them to conjunctive normal form, and handing
//! them to a SAT solver.
//!
//! ## Key Features
//!
//! - **Immutable Expression Trees**: An [`Expr`][crate::expr::Expr] is a cheap-to-clone tree with structural equality and hashing.
//!   Free variables are computed once per node and cached.
//! - **Substitution vs. Evaluation**: [`reify`][crate::expr::Expr::reify] replaces variables without simplifying anything,
//!   while [`eval`][crate::expr::Expr::eval] reduces the formula as far as the bindings allow.
//! - **Truth Tables**: Exhaustive evaluation over all assignments, used for [`is_logically_equivalent`][crate::eval::is_logically_equivalent].
//! - **CNF Conversion**: De Morgan push-down and distribution, always yielding a conjunction of clauses.
//! - **SAT Solving**: Lazy enumeration of satisfying assignments through a pluggable [`Oracle`][crate::sat::Oracle],
//!   backed by `varisat` by default.
//!
//! ## Basic Usage
//!
//! ```rust
//! use reasoner_rs::expr::{variables, Expr};
//! use reasoner_rs::namespace::Namespace;
//! use reasoner_rs::cnf::normalize_to_cnf;
//! use reasoner_rs::sat::{is_satisfiable, solve};
//!
//! // 1. Create variables
//! let vs = variables("a b c").unwrap();
//! let (a, b, c) = (Expr::from(&vs[0]), Expr::from(&vs[1]), Expr::from(&vs[2]));
//!
//! // 2. Build a formula: f = (a AND b) OR NOT c
//! let f = (a & b) | !c;
//!
//! // 3. Evaluate under a partial assignment
//! let ns = Namespace::new().with("c", true).unwrap();
//! assert_eq!(f.eval(&ns).unwrap().as_bool(), None); // still depends on `a` and `b`
//!
//! // 4. Convert to CNF
//! let cnf = normalize_to_cnf(&f).unwrap();
//! assert_eq!(cnf.to_string(), "((a | ~c) & (b | ~c))");
//!
//! // 5. Solve
//! assert!(is_satisfiable(&f).unwrap());
//! assert_eq!(solve(&f, None).unwrap().count(), 5);
//! ```
//!
//! ## Core Components
//!
//! - **[`expr`]**: The expression model, builders, and operator sugar.
//! - **[`eval`]**: Substitution, evaluation, and truth tables.
//! - **[`cnf`]**: Conversion to conjunctive normal form.
//! - **[`sat`]**: Clause solving and model enumeration.

pub mod assignment;
pub mod cnf;
pub mod encode;
pub mod error;
pub mod eval;
pub mod expr;
pub mod ident;
pub mod namespace;
pub mod sat;
pub mod types;

pub use error::{Error, Result};
