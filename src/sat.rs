//! Satisfiability checking and model enumeration.
//!
//! [`solve`] normalizes an expression to CNF, encodes it into integer clauses,
//! and asks an [`Oracle`] for models, which are decoded back into
//! [`Assignment`]s lazily, one per call to `next`.

use log::debug;
use varisat::{ExtendFormula, Solver};

use crate::assignment::{Assignment, Schema};
use crate::cnf::normalize_to_cnf;
use crate::encode::Encoding;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::types::{Lit, Var};

/// A source of models for a set of clauses.
///
/// Every model must assign all variables `1..=num_vars`, and models must be
/// pairwise distinct.
pub trait Oracle {
    type Models: Iterator<Item = Result<Vec<Lit>>>;

    /// Enumerates models of `clauses`, at most `limit` of them if given.
    fn models(&self, num_vars: u32, clauses: &[Vec<Lit>], limit: Option<usize>) -> Self::Models;
}

/// Oracle backed by the `varisat` CDCL solver.
///
/// Models are enumerated incrementally: after each model, the clause blocking it
/// is added and the solver is run again.
#[derive(Debug, Default, Copy, Clone)]
pub struct VarisatOracle;

impl Oracle for VarisatOracle {
    type Models = VarisatModels;

    fn models(&self, num_vars: u32, clauses: &[Vec<Lit>], limit: Option<usize>) -> Self::Models {
        let mut solver = Solver::new();
        for clause in clauses {
            let lits: Vec<varisat::Lit> = clause.iter().map(|&lit| to_varisat(lit)).collect();
            solver.add_clause(&lits);
        }
        VarisatModels {
            solver,
            num_vars,
            remaining: limit,
            done: false,
        }
    }
}

fn to_varisat(lit: Lit) -> varisat::Lit {
    varisat::Lit::from_dimacs(lit.to_dimacs() as isize)
}

/// Iterator over the models found by [`VarisatOracle`].
pub struct VarisatModels {
    solver: Solver<'static>,
    num_vars: u32,
    remaining: Option<usize>,
    done: bool,
}

impl VarisatModels {
    fn next_model(&mut self) -> Result<Option<Vec<Lit>>> {
        let sat = self.solver.solve().map_err(|e| Error::Oracle(e.to_string()))?;
        if !sat {
            return Ok(None);
        }
        let found = self
            .solver
            .model()
            .ok_or_else(|| Error::Oracle("solver reported SAT without a model".to_string()))?;

        // Variables the solver never saw are unconstrained; any value will do.
        let mut values = vec![false; self.num_vars as usize];
        for lit in found {
            let index = lit.var().index();
            if index < values.len() {
                values[index] = lit.is_positive();
            }
        }
        let model: Vec<Lit> = values
            .iter()
            .enumerate()
            .map(|(i, &value)| Var::new(i as u32 + 1).lit(value))
            .collect();

        if model.is_empty() {
            // The only model over no variables.
            self.done = true;
        } else {
            let blocking: Vec<varisat::Lit> = model.iter().map(|&lit| to_varisat(-lit)).collect();
            self.solver.add_clause(&blocking);
        }
        Ok(Some(model))
    }
}

impl Iterator for VarisatModels {
    type Item = Result<Vec<Lit>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.remaining == Some(0) {
            return None;
        }
        match self.next_model() {
            Ok(Some(model)) => {
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                debug!("model: {:?}", model.iter().map(|l| l.to_dimacs()).collect::<Vec<_>>());
                Some(Ok(model))
            }
            Ok(None) => {
                debug!("no more models");
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Satisfying assignments of an expression.
///
/// Created by [`solve`] and [`solve_with`].
pub struct Solutions<M> {
    encoding: Encoding,
    models: M,
    failed: bool,
}

impl<M> Solutions<M> {
    /// The clause encoding handed to the oracle.
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }
}

impl<M> Iterator for Solutions<M>
where
    M: Iterator<Item = Result<Vec<Lit>>>,
{
    type Item = Result<Assignment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.models.next()?.and_then(|model| self.encoding.decode(&model));
        self.failed = item.is_err();
        Some(item)
    }
}

/// Enumerates the assignments of the free variables of `expr` that make it true,
/// at most `limit` of them if given, using the default [`VarisatOracle`].
///
/// Normalization and encoding happen up front; models are searched for lazily.
/// Every call starts a fresh search.
///
/// ```
/// use reasoner_rs::expr::{lit, Expr};
/// use reasoner_rs::sat::solve;
///
/// let a = Expr::var("a").unwrap();
/// let b = Expr::var("b").unwrap();
/// let solutions: Vec<_> = solve(&(a & !b), None).unwrap().collect::<Result<_, _>>().unwrap();
/// assert_eq!(solutions.len(), 1);
/// assert_eq!(solutions[0].get_by_name("a"), Some(true));
/// assert_eq!(solutions[0].get_by_name("b"), Some(false));
///
/// assert_eq!(solve(&lit(true), None).unwrap().count(), 1);
/// ```
pub fn solve(expr: &Expr, limit: Option<usize>) -> Result<Solutions<VarisatModels>> {
    solve_with(&VarisatOracle, expr, limit)
}

/// Like [`solve`], with the given oracle.
pub fn solve_with<O: Oracle>(oracle: &O, expr: &Expr, limit: Option<usize>) -> Result<Solutions<O::Models>> {
    let cnf = normalize_to_cnf(expr)?;
    let encoding = Encoding::over(&Schema::of(expr), &cnf)?;
    debug!(
        "solve: {} variables, {} clauses, limit {:?}",
        encoding.num_vars(),
        encoding.num_clauses(),
        limit
    );
    let models = oracle.models(encoding.num_vars(), encoding.clauses(), limit);
    Ok(Solutions {
        encoding,
        models,
        failed: false,
    })
}

/// Returns `true` if some assignment makes `expr` true.
pub fn is_satisfiable(expr: &Expr) -> Result<bool> {
    let solution = solve(expr, Some(1))?.next().transpose()?;
    Ok(solution.is_some())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use test_log::test;

    use super::*;
    use crate::eval::truth_table;
    use crate::expr::{and, lit, or, variables};

    fn all_solutions(expr: &Expr) -> Vec<Assignment> {
        solve(expr, None).unwrap().collect::<Result<_>>().unwrap()
    }

    #[test]
    fn test_four_variable_example() {
        let vs = variables("x1 x3 x4 x5").unwrap();
        let [x1, x3, x4, x5] = [0, 1, 2, 3].map(|i| Expr::from(&vs[i]));
        let expr = (x1.clone() | !x5.clone() | x4.clone())
            & (!x1 | x5 | x3.clone() | x4.clone())
            & (!x3 | !x4);

        assert!(is_satisfiable(&expr).unwrap());

        let expected = Schema::of(&expr).assign([true, false, false, true]);
        assert_eq!(expr.eval(&expected.to_namespace()).unwrap(), true.into());

        let solutions = all_solutions(&expr);
        assert!(solutions.contains(&expected));
        assert_eq!(solutions.len(), 9);

        let distinct: BTreeSet<Assignment> = solutions.into_iter().collect();
        let reference: BTreeSet<Assignment> = truth_table(&expr).unwrap().satisfying().cloned().collect();
        assert_eq!(distinct, reference);
    }

    #[test]
    fn test_constants() {
        assert!(is_satisfiable(&lit(true)).unwrap());
        assert_eq!(all_solutions(&lit(true)), vec![Assignment::empty()]);
        assert!(!is_satisfiable(&lit(false)).unwrap());
        assert!(all_solutions(&lit(false)).is_empty());

        let a = Expr::var("a").unwrap();
        assert!(is_satisfiable(&or([lit(true), lit(false), a.clone()])).unwrap());
        assert!(!is_satisfiable(&and([lit(true), lit(false), a])).unwrap());
    }

    #[test]
    fn test_empty_connectives() {
        assert_eq!(all_solutions(&and(Vec::<Expr>::new())), vec![Assignment::empty()]);
        assert!(all_solutions(&or(Vec::<Expr>::new())).is_empty());
    }

    #[test]
    fn test_limit() {
        let vs = variables("a b c").unwrap();
        let expr = Expr::from(&vs[0]) | Expr::from(&vs[1]) | Expr::from(&vs[2]);
        assert_eq!(all_solutions(&expr).len(), 7);
        assert_eq!(solve(&expr, Some(3)).unwrap().count(), 3);
        assert_eq!(solve(&expr, Some(0)).unwrap().count(), 0);
        assert_eq!(solve(&expr, Some(100)).unwrap().count(), 7);
    }

    #[test]
    fn test_restartable() {
        let vs = variables("a b").unwrap();
        let expr = Expr::from(&vs[0]) | !Expr::from(&vs[1]);
        let first: BTreeSet<Assignment> = all_solutions(&expr).into_iter().collect();
        let second: BTreeSet<Assignment> = all_solutions(&expr).into_iter().collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_absorbed_variable_is_enumerated() {
        let vs = variables("a").unwrap();
        let a = Expr::from(&vs[0]);
        // `a` is unconstrained once the empty conjunction makes the formula true.
        let expr = a | and(Vec::<Expr>::new());
        let solutions = all_solutions(&expr);
        assert_eq!(solutions.len(), 2);
        assert!(solutions.iter().all(|s| s.get(&vs[0]).is_some()));
    }

    #[test]
    fn test_relation_is_rejected() {
        let a = Expr::var("a").unwrap();
        assert!(matches!(solve(&a.less_than(3), None), Err(Error::TypeMismatch(_))));
    }

    struct FaultyOracle;

    impl Oracle for FaultyOracle {
        type Models = std::vec::IntoIter<Result<Vec<Lit>>>;

        fn models(&self, num_vars: u32, _clauses: &[Vec<Lit>], _limit: Option<usize>) -> Self::Models {
            let partial = (2..=num_vars).map(|i| Var::new(i).pos()).collect();
            vec![Ok(partial), Err(Error::Oracle("unreachable".to_string()))].into_iter()
        }
    }

    #[test]
    fn test_incomplete_model_is_reported() {
        let vs = variables("a b").unwrap();
        let expr = Expr::from(&vs[0]) & Expr::from(&vs[1]);
        let mut solutions = solve_with(&FaultyOracle, &expr, None).unwrap();
        assert!(matches!(solutions.next(), Some(Err(Error::InternalInvariantViolation(_)))));
        assert!(solutions.next().is_none());
    }
}
