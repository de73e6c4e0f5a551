//! Conversion to conjunctive normal form.
//!
//! The conversion is the textbook one: negations are pushed down to the atoms
//! with De Morgan's laws, nested disjunctions are flattened, and disjunctions
//! over conjunctions are split with the distributive law. The result can be
//! exponentially larger than the input, which is fine for the small formulas
//! this crate deals with.
//!
//! [`normalize_to_cnf`] always returns an `And` node whose children are
//! disjunctions of atoms, so consumers can iterate over clauses uniformly.

use log::debug;

use crate::error::{Error, Result};
use crate::expr::{and, conjoin, disjoin, lit, not, or, Expr};

/// Atom: a variable, a constant, or a single negation of either.
pub fn is_boolean_atom(expr: &Expr) -> bool {
    match expr {
        Expr::Lit(_) | Expr::Var(_) => true,
        Expr::Not(_) => matches!(expr.children(), [Expr::Lit(_) | Expr::Var(_)]),
        _ => false,
    }
}

/// An atom, or an `Or` of atoms.
pub fn is_disjunction_of_atoms(expr: &Expr) -> bool {
    match expr {
        Expr::Or(children) => children.iter().all(is_boolean_atom),
        _ => is_boolean_atom(expr),
    }
}

/// A disjunction of atoms, or an `And` of such disjunctions.
pub fn is_conjunctive_normal_form(expr: &Expr) -> bool {
    match expr {
        Expr::And(children) => children.iter().all(is_disjunction_of_atoms),
        _ => is_disjunction_of_atoms(expr),
    }
}

/// Pushes a top-level negation one step towards the atoms.
///
/// - `~true` and `~false` become the complementary constant.
/// - `~~x` becomes `x`, itself distributed if `x` is a negation.
/// - `~(x | y)` becomes `(~x & ~y)` and `~(x & y)` becomes `(~x | ~y)`, with the
///   new negations distributed recursively.
///
/// Anything else, including negated atoms, is returned unchanged.
pub fn distribute_negation(expr: &Expr) -> Expr {
    let Expr::Not(child) = expr else {
        return expr.clone();
    };
    let child: &Expr = child;
    match child {
        Expr::Lit(b) => lit(!b),
        Expr::Not(inner) => {
            let inner: &Expr = inner;
            match inner {
                Expr::Not(_) => distribute_negation(inner),
                _ => inner.clone(),
            }
        }
        Expr::Or(children) => and(children.iter().map(|c| distribute_negation(&not(c.clone())))),
        Expr::And(children) => or(children.iter().map(|c| distribute_negation(&not(c.clone())))),
        Expr::Var(_) | Expr::Rel(_) => expr.clone(),
    }
}

/// Flattens nested disjunctions of an `Or` node into a single level,
/// distributing negated children on the way.
fn collapse(children: &[Expr]) -> Vec<Expr> {
    let mut result = Vec::with_capacity(children.len());
    for child in children {
        let child = match child {
            Expr::Not(_) => distribute_negation(child),
            _ => child.clone(),
        };
        match child {
            Expr::Or(nested) => result.extend(collapse(&nested)),
            child => result.push(child),
        }
    }
    result
}

fn contains_relation(expr: &Expr) -> bool {
    match expr {
        Expr::Rel(_) => true,
        _ => expr.children().iter().any(contains_relation),
    }
}

/// Converts `expr` into an equivalent formula in conjunctive normal form.
///
/// The result is always an `And` of disjunctions of atoms: `a` becomes `(a)`,
/// the empty disjunction becomes `(())`, and the empty conjunction stays `()`.
///
/// Fails with [`Error::TypeMismatch`] if `expr` contains a relational atom.
///
/// ```
/// use reasoner_rs::cnf::{is_conjunctive_normal_form, normalize_to_cnf};
/// use reasoner_rs::expr::Expr;
///
/// let a = Expr::var("a").unwrap();
/// let b = Expr::var("b").unwrap();
/// let c = Expr::var("c").unwrap();
///
/// let f = (a.clone() & b.clone()) | c.clone();
/// assert!(!is_conjunctive_normal_form(&f));
///
/// let cnf = normalize_to_cnf(&f).unwrap();
/// assert_eq!(cnf, (a | c.clone()) & (b | c));
/// ```
pub fn normalize_to_cnf(expr: &Expr) -> Result<Expr> {
    if contains_relation(expr) {
        return Err(Error::TypeMismatch(format!(
            "relational atoms have no clause form: `{}`",
            expr
        )));
    }
    let cnf = conjoin(and(Vec::<Expr>::new()), convert(expr)?);
    debug!(
        "normalize_to_cnf: size {} -> {}, {} clauses",
        expr.size(),
        cnf.size(),
        cnf.children().len()
    );
    Ok(cnf)
}

fn convert(expr: &Expr) -> Result<Expr> {
    if is_disjunction_of_atoms(expr) {
        return Ok(expr.clone());
    }
    match expr {
        Expr::Not(_) => convert(&distribute_negation(expr)),
        Expr::Or(children) => {
            let collapsed = collapse(children);
            if collapsed.iter().all(is_boolean_atom) {
                return Ok(or(collapsed));
            }
            let Some(i) = collapsed.iter().position(|c| matches!(c, Expr::And(_))) else {
                return Err(Error::InternalInvariantViolation(format!(
                    "disjunction without conjunctive child is not flat: `{}`",
                    or(collapsed)
                )));
            };
            let others: Vec<Expr> = collapsed
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, c)| c.clone())
                .collect();
            // `rest | And()` is true but must keep the variables of `rest`.
            if collapsed[i].children().is_empty() {
                let mut clause = others;
                clause.push(lit(true));
                return convert(&or(clause));
            }
            // (c1 & ... & ck) | rest  ==>  (c1 | rest) & ... & (ck | rest)
            let distributed = and(collapsed[i]
                .children()
                .iter()
                .map(|c| disjoin(c.clone(), or(others.clone()))));
            convert(&distributed)
        }
        Expr::And(children) => children
            .iter()
            .try_fold(and(Vec::<Expr>::new()), |acc, child| -> Result<Expr> {
                Ok(conjoin(acc, convert(child)?))
            }),
        Expr::Lit(_) | Expr::Var(_) | Expr::Rel(_) => Err(Error::InternalInvariantViolation(format!(
            "unexpected shape during normalization: `{}`",
            expr
        ))),
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::eval::is_logically_equivalent;
    use crate::expr::{less_than, variables};

    fn abcde() -> [Expr; 5] {
        let vs = variables("a b c d e").unwrap();
        [0, 1, 2, 3, 4].map(|i| Expr::from(&vs[i]))
    }

    #[test]
    fn test_atoms() {
        let [a, b, ..] = abcde();
        assert!(is_boolean_atom(&a));
        assert!(is_boolean_atom(&lit(true)));
        assert!(is_boolean_atom(&!a.clone()));
        assert!(is_boolean_atom(&not(lit(false))));
        assert!(!is_boolean_atom(&!!a.clone()));
        assert!(!is_boolean_atom(&(a.clone() | b.clone())));
        assert!(!is_boolean_atom(&a.less_than(3)));
    }

    #[test]
    fn test_is_conjunctive_normal_form() {
        let [a, b, c, d, _] = abcde();
        assert!(is_conjunctive_normal_form(&lit(true)));
        assert!(is_conjunctive_normal_form(&lit(false)));
        assert!(is_conjunctive_normal_form(&a));
        assert!(is_conjunctive_normal_form(&(a.clone() | b.clone())));
        assert!(is_conjunctive_normal_form(&((a.clone() | b.clone()) & c.clone())));
        assert!(is_conjunctive_normal_form(&((a.clone() | b.clone()) & (c.clone() | d))));
        assert!(!is_conjunctive_normal_form(&(a.clone() | (b & c.clone()))));
        assert!(!is_conjunctive_normal_form(&(a | (true & c))));
    }

    #[test]
    fn test_distribute_negation() {
        let [a, b, c, ..] = abcde();
        assert_eq!(distribute_negation(&not(lit(true))), lit(false));
        assert_eq!(distribute_negation(&!!a.clone()), a);
        assert_eq!(distribute_negation(&!!!a.clone()), !a.clone());
        assert_eq!(distribute_negation(&!a.clone()), !a.clone());
        assert_eq!(distribute_negation(&!(a.clone() | b.clone())), !a.clone() & !b.clone());
        assert_eq!(distribute_negation(&!(a.clone() & b.clone())), !a.clone() | !b.clone());
        assert_eq!(
            distribute_negation(&!(a.clone() & !(b.clone() | c.clone()))),
            or([!a, b | c])
        );
    }

    #[test]
    fn test_cnf_expressions_are_preserved() {
        let [a, b, c, d, e] = abcde();
        let cnf_expressions = [
            !a.clone() & (b.clone() | c.clone()),
            (a.clone() | b.clone()) & (!b.clone() | c | !d.clone()) & (d | e),
            a.clone() | b.clone(),
            a & b,
        ];
        for expr in cnf_expressions {
            assert!(is_conjunctive_normal_form(&expr), "{}", expr);
            let cnf = normalize_to_cnf(&expr).unwrap();
            assert!(is_logically_equivalent(&cnf, &expr).unwrap(), "{} vs {}", cnf, expr);
        }
    }

    #[test]
    fn test_negated_disjunction() {
        let [_, b, c, ..] = abcde();
        let expr = !(b.clone() | c.clone());
        assert!(!is_conjunctive_normal_form(&expr));
        let cnf = normalize_to_cnf(&expr).unwrap();
        assert_eq!(cnf, !b & !c);
    }

    #[test]
    fn test_distribution_over_conjunction() {
        let [a, b, c, ..] = abcde();
        let expr = (a.clone() & b.clone()) | c.clone();
        assert!(!is_conjunctive_normal_form(&expr));
        let cnf = normalize_to_cnf(&expr).unwrap();
        assert_eq!(cnf, (a | c.clone()) & (b | c));
    }

    #[test]
    fn test_nested_distribution() {
        let [a, b, _, d, e] = abcde();
        let expr = a.clone() & (b.clone() | (d.clone() & e.clone()));
        assert!(!is_conjunctive_normal_form(&expr));
        let cnf = normalize_to_cnf(&expr).unwrap();
        assert!(is_conjunctive_normal_form(&cnf));
        let expected = a & (b.clone() | d) & (b | e);
        assert!(is_logically_equivalent(&cnf, &expected).unwrap());
    }

    #[test]
    fn test_wraps_atoms() {
        let [a, ..] = abcde();
        assert_eq!(normalize_to_cnf(&a).unwrap(), and([a.clone()]));
        assert_eq!(normalize_to_cnf(&lit(true)).unwrap(), and([lit(true)]));
        assert_eq!(normalize_to_cnf(&!!a.clone()).unwrap(), and([a]));
    }

    #[test]
    fn test_empty_expressions() {
        assert_eq!(
            normalize_to_cnf(&or(Vec::<Expr>::new())).unwrap(),
            and([or(Vec::<Expr>::new())])
        );
        assert_eq!(normalize_to_cnf(&and(Vec::<Expr>::new())).unwrap(), and(Vec::<Expr>::new()));
    }

    #[test]
    fn test_empty_conjunction_in_disjunction() {
        let [a, b, c, ..] = abcde();
        let expr = a.clone() | and(Vec::<Expr>::new());
        let cnf = normalize_to_cnf(&expr).unwrap();
        assert_eq!(cnf, and([or([a.clone(), lit(true)])]));
        assert!(is_logically_equivalent(&cnf, &expr).unwrap());

        let nested = a | (b & and(Vec::<Expr>::new())) | !or(Vec::<Expr>::new()) | c;
        let cnf = normalize_to_cnf(&nested).unwrap();
        assert!(is_conjunctive_normal_form(&cnf), "{}", cnf);
        assert_eq!(cnf.free_variables(), nested.free_variables());
        assert!(is_logically_equivalent(&cnf, &nested).unwrap());
    }

    #[test]
    fn test_deep_negations() {
        let [a, b, c, d, _] = abcde();
        let expr = !((a.clone() | !(b.clone() & c.clone())) & !(d.clone() | !a.clone()));
        let cnf = normalize_to_cnf(&expr).unwrap();
        assert!(is_conjunctive_normal_form(&cnf), "{}", cnf);
        assert!(is_logically_equivalent(&cnf, &expr).unwrap());
    }

    #[test]
    fn test_relation_is_rejected() {
        let [a, b, ..] = abcde();
        assert!(matches!(
            normalize_to_cnf(&(b | less_than(a, 5))),
            Err(Error::TypeMismatch(_))
        ));
    }
}
