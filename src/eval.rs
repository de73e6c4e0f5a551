//! Substitution and evaluation of expressions.
//!
//! Two related but distinct operations:
//!
//! - [`Expr::reify`] substitutes variables structurally. The result has the same
//!   shape as the input, and no boolean reduction happens: `(a | true)` under
//!   `a ↦ false` becomes `(false | true)`, not `true`. A variable is replaced by
//!   its binding in a single step, even if the binding is itself a bound variable.
//!   [`Expr::reify_chained`] follows such chains.
//! - [`Expr::eval`] substitutes and then reduces. Variable bindings are followed
//!   until they reach a value or an unbound variable. Unbound variables stay
//!   symbolic, so evaluating under a partial namespace yields an expression.
//!
//! Both chained operations fail with [`Error::CyclicSubstitution`] when a chain
//! comes back to a variable it is already resolving, e.g. under `{a ↦ b, b ↦ a}`.

use std::collections::BTreeMap;

use log::debug;

use crate::assignment::{Assignment, Schema};
use crate::error::{Error, Result};
use crate::expr::{and, conjoin, disjoin, not, or, relation, Expr, RelOp, Term, Value, Variable};
use crate::namespace::Namespace;

impl Expr {
    /// Replaces every variable bound in `ns` by its target, without reduction.
    ///
    /// Substitution is single-step: under `{a ↦ b, b ↦ c}`, `a` becomes `b`.
    ///
    /// Fails with [`Error::TypeMismatch`] if a non-boolean value lands in a
    /// boolean position (an operand of `Not`, `Or` or `And`).
    pub fn reify(&self, ns: &Namespace) -> Result<Term> {
        match self {
            Expr::Var(v) => Ok(ns.get(v).cloned().unwrap_or_else(|| Term::Expr(self.clone()))),
            _ => self.rebuild(|child| child.reify(ns)),
        }
    }

    /// Like [`reify`][Expr::reify], but follows chains of variable bindings:
    /// under `{a ↦ b, b ↦ c}`, `a` becomes `c`.
    pub fn reify_chained(&self, ns: &Namespace) -> Result<Term> {
        self.reify_chain(ns, &mut Vec::new())
    }

    fn reify_chain(&self, ns: &Namespace, resolving: &mut Vec<Variable>) -> Result<Term> {
        match self {
            Expr::Var(v) => match ns.get(v) {
                Some(Term::Expr(target)) if target != self => {
                    enter(v, resolving)?;
                    let result = target.reify_chain(ns, resolving);
                    resolving.pop();
                    result
                }
                Some(target) => Ok(target.clone()),
                None => Ok(Term::Expr(self.clone())),
            },
            _ => self.rebuild(|child| child.reify_chain(ns, resolving)),
        }
    }

    /// Rebuilds the node with every child mapped through `f`.
    fn rebuild<F>(&self, mut f: F) -> Result<Term>
    where
        F: FnMut(&Expr) -> Result<Term>,
    {
        let expr = match self {
            Expr::Lit(_) | Expr::Var(_) => self.clone(),
            Expr::Not(child) => {
                let child: &Expr = child;
                not(f(child)?.into_expr()?)
            }
            Expr::Or(children) => or(children
                .iter()
                .map(|c| f(c).and_then(Term::into_expr))
                .collect::<Result<Vec<_>>>()?),
            Expr::And(children) => and(children
                .iter()
                .map(|c| f(c).and_then(Term::into_expr))
                .collect::<Result<Vec<_>>>()?),
            Expr::Rel(rel) => {
                let lhs = map_operand(&rel.lhs, &mut f)?;
                let rhs = map_operand(&rel.rhs, &mut f)?;
                relation(lhs, rel.op, rhs)
            }
        };
        Ok(Term::Expr(expr))
    }

    /// Substitutes bindings from `ns` and reduces the result.
    ///
    /// - `Or`/`And` fold their evaluated children left to right, starting from
    ///   `false`/`true` respectively.
    /// - `Not` complements a boolean and negates a symbolic result; any other value
    ///   is a [`Error::TypeMismatch`].
    /// - Relational atoms compare their evaluated operands; ordering values of
    ///   different kinds is a [`Error::TypeMismatch`].
    ///
    /// ```
    /// use reasoner_rs::expr::{Expr, Term};
    /// use reasoner_rs::namespace::Namespace;
    ///
    /// let a = Expr::var("a").unwrap();
    /// let b = Expr::var("b").unwrap();
    /// let ns = Namespace::new().with("a", b).unwrap().with("b", 1).unwrap();
    /// assert_eq!(a.eval(&ns).unwrap(), Term::from(1));
    /// ```
    pub fn eval(&self, ns: &Namespace) -> Result<Term> {
        self.eval_in(ns, &mut Vec::new())
    }

    fn eval_in(&self, ns: &Namespace, resolving: &mut Vec<Variable>) -> Result<Term> {
        match self {
            Expr::Lit(b) => Ok(Term::from(*b)),
            Expr::Var(v) => match ns.get(v) {
                Some(Term::Expr(target)) if target != self => {
                    enter(v, resolving)?;
                    let result = target.eval_in(ns, resolving);
                    resolving.pop();
                    result
                }
                Some(Term::Expr(_)) | None => Ok(Term::Expr(self.clone())),
                Some(value) => Ok(value.clone()),
            },
            Expr::Not(child) => {
                let term = child.eval_in(ns, resolving)?;
                if let Some(b) = term.as_bool() {
                    return Ok(Term::from(!b));
                }
                match term {
                    Term::Expr(e) => Ok(Term::Expr(not(e))),
                    Term::Value(v) => Err(Error::TypeMismatch(format!(
                        "cannot negate {} `{}`",
                        v.kind(),
                        v
                    ))),
                }
            }
            Expr::Or(children) => children.iter().try_fold(Term::from(false), |acc, child| {
                reduce(acc, Connective::Or, child.eval_in(ns, resolving)?)
            }),
            Expr::And(children) => children.iter().try_fold(Term::from(true), |acc, child| {
                reduce(acc, Connective::And, child.eval_in(ns, resolving)?)
            }),
            Expr::Rel(rel) => {
                let lhs = eval_operand(&rel.lhs, ns, resolving)?;
                let rhs = eval_operand(&rel.rhs, ns, resolving)?;
                compare(lhs, rel.op, rhs)
            }
        }
    }

    /// Truth table of the expression. See [`truth_table`].
    pub fn truth_table(&self) -> Result<TruthTable> {
        truth_table(self)
    }
}

impl Term {
    /// Reifies an expression; plain values are returned unchanged.
    pub fn reify(&self, ns: &Namespace) -> Result<Term> {
        match self {
            Term::Expr(e) => e.reify(ns),
            Term::Value(_) => Ok(self.clone()),
        }
    }

    /// Evaluates an expression; plain values are returned unchanged.
    pub fn eval(&self, ns: &Namespace) -> Result<Term> {
        match self {
            Term::Expr(e) => e.eval(ns),
            Term::Value(_) => Ok(self.clone()),
        }
    }
}

fn enter(var: &Variable, resolving: &mut Vec<Variable>) -> Result<()> {
    if resolving.contains(var) {
        return Err(Error::CyclicSubstitution(var.name().to_string()));
    }
    resolving.push(var.clone());
    Ok(())
}

fn map_operand<F>(operand: &Term, f: &mut F) -> Result<Term>
where
    F: FnMut(&Expr) -> Result<Term>,
{
    match operand {
        Term::Expr(e) => f(e),
        Term::Value(_) => Ok(operand.clone()),
    }
}

fn eval_operand(operand: &Term, ns: &Namespace, resolving: &mut Vec<Variable>) -> Result<Term> {
    match operand {
        Term::Expr(e) => e.eval_in(ns, resolving),
        Term::Value(_) => Ok(operand.clone()),
    }
}

#[derive(Debug, Copy, Clone)]
enum Connective {
    Or,
    And,
}

impl Connective {
    fn symbol(self) -> &'static str {
        match self {
            Connective::Or => "|",
            Connective::And => "&",
        }
    }
}

/// One step of the left fold behind `Or`/`And` evaluation.
///
/// Booleans reduce; a symbolic operand turns the accumulator into an expression
/// built with the operator flattening rules.
fn reduce(acc: Term, connective: Connective, next: Term) -> Result<Term> {
    if let (Some(a), Some(b)) = (acc.as_bool(), next.as_bool()) {
        return Ok(Term::from(match connective {
            Connective::Or => a || b,
            Connective::And => a && b,
        }));
    }
    let rhs = boolean_operand(next, connective)?;
    let result = match (acc.as_bool(), connective) {
        (Some(a), Connective::Or) => a | rhs,
        (Some(a), Connective::And) => a & rhs,
        (None, Connective::Or) => disjoin(boolean_operand(acc, connective)?, rhs),
        (None, Connective::And) => conjoin(boolean_operand(acc, connective)?, rhs),
    };
    Ok(Term::Expr(result))
}

fn boolean_operand(term: Term, connective: Connective) -> Result<Expr> {
    match term {
        Term::Value(v) if v.as_bool().is_none() => Err(Error::TypeMismatch(format!(
            "cannot apply `{}` to {} `{}`",
            connective.symbol(),
            v.kind(),
            v
        ))),
        term => term.into_expr(),
    }
}

fn compare(lhs: Term, op: RelOp, rhs: Term) -> Result<Term> {
    match (lhs, rhs) {
        (Term::Value(l), Term::Value(r)) => compare_values(&l, op, &r).map(Term::from),
        // A symbolic operand keeps the atom symbolic.
        (lhs, rhs) => Ok(Term::Expr(relation(lhs, op, rhs))),
    }
}

fn compare_values(lhs: &Value, op: RelOp, rhs: &Value) -> Result<bool> {
    let ordering = || match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => Err(Error::TypeMismatch(format!(
            "cannot order {} `{}` against {} `{}`",
            lhs.kind(),
            lhs,
            rhs.kind(),
            rhs
        ))),
    };
    match op {
        RelOp::Eq => Ok(lhs == rhs),
        RelOp::Lt => ordering().map(|o| o.is_lt()),
        RelOp::Gt => ordering().map(|o| o.is_gt()),
    }
}

/// Truth values of an expression under every assignment of its free variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    schema: Schema,
    rows: BTreeMap<Assignment, bool>,
}

impl TruthTable {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get(&self, assignment: &Assignment) -> Option<bool> {
        self.rows.get(assignment).copied()
    }

    /// Number of rows, `2^n` for `n` free variables.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Assignment, bool)> {
        self.rows.iter().map(|(assignment, value)| (assignment, *value))
    }

    /// Assignments under which the expression is true.
    pub fn satisfying(&self) -> impl Iterator<Item = &Assignment> {
        self.iter().filter(|(_, value)| *value).map(|(assignment, _)| assignment)
    }

    pub fn is_tautology(&self) -> bool {
        self.rows.values().all(|&value| value)
    }

    pub fn is_contradiction(&self) -> bool {
        self.rows.values().all(|&value| !value)
    }
}

/// Evaluates `expr` under all `2^n` assignments of its free variables.
///
/// Fails with [`Error::TypeMismatch`] if some row does not evaluate to a boolean.
pub fn truth_table(expr: &Expr) -> Result<TruthTable> {
    let schema = Schema::of(expr);
    debug!("truth_table(expr of size {}) over {} variables", expr.size(), schema.len());

    let mut rows = BTreeMap::new();
    for assignment in schema.assignments() {
        let value = expr.eval(&assignment.to_namespace())?;
        let value = value.as_bool().ok_or_else(|| {
            Error::TypeMismatch(format!(
                "`{}` evaluates to `{}` under {}, not to a boolean",
                expr, value, assignment
            ))
        })?;
        rows.insert(assignment, value);
    }

    Ok(TruthTable { schema, rows })
}

/// Two expressions are equivalent iff they have the same free variables and the
/// same truth table over them.
pub fn is_logically_equivalent(lhs: &Expr, rhs: &Expr) -> Result<bool> {
    if lhs.free_variables() != rhs.free_variables() {
        return Ok(false);
    }
    Ok(truth_table(lhs)? == truth_table(rhs)?)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::expr::{equal, less_than, lit, variables};

    fn abc() -> (Expr, Expr, Expr) {
        let vs = variables("a b c").unwrap();
        (Expr::from(&vs[0]), Expr::from(&vs[1]), Expr::from(&vs[2]))
    }

    fn ns<const N: usize>(pairs: [(&str, Term); N]) -> Namespace {
        Namespace::try_from_pairs(pairs).unwrap()
    }

    #[test]
    fn test_reify_var() {
        let (a, b, _) = abc();
        assert_eq!(a.reify(&ns([("a", 6.into())])).unwrap(), Term::from(6));
        assert_eq!(a.reify(&ns([("b", 6.into())])).unwrap(), Term::from(a.clone()));
        assert_eq!(a.reify(&ns([("a", b.clone().into())])).unwrap(), Term::from(b));
    }

    #[test]
    fn test_reify_is_single_step() {
        let (a, b, c) = abc();
        let chain = ns([("a", b.clone().into()), ("b", c.clone().into())]);
        assert_eq!(a.reify(&chain).unwrap(), Term::from(b));
        assert_eq!(a.reify_chained(&chain).unwrap(), Term::from(c.clone()));
        assert_eq!(a.reify(&ns([("b", c.into())])).unwrap(), Term::from(a));
    }

    #[test]
    fn test_reify_chained_cycle() {
        let (a, b, _) = abc();
        let cycle = ns([("a", b.clone().into()), ("b", a.clone().into())]);
        assert_eq!(
            a.reify_chained(&cycle),
            Err(Error::CyclicSubstitution("a".to_string()))
        );
        // Single-step substitution is unaffected by the cycle.
        assert_eq!((a.clone() | b.clone()).reify(&cycle).unwrap(), Term::from(b | a));
    }

    #[test]
    fn test_reify_compound() {
        let (a, _, c) = abc();
        assert_eq!(
            (a.clone() | c.clone()).reify(&ns([("c", a.clone().into())])).unwrap(),
            Term::from(a.clone() | a.clone())
        );
        assert_eq!(
            (a.clone() & c.clone()).reify(&ns([("c", a.clone().into())])).unwrap(),
            Term::from(a.clone() & a.clone())
        );
    }

    #[test]
    fn test_reify_keeps_truth_literals() {
        let (a, _, _) = abc();
        assert_eq!(
            (a.clone() | true).reify(&ns([("a", false.into())])).unwrap(),
            Term::from(or([lit(false), lit(true)]))
        );
        assert_eq!(
            (!a.clone()).reify(&ns([("a", false.into())])).unwrap(),
            Term::from(not(lit(false)))
        );
        assert_eq!(
            (!a.clone()).reify(&ns([("c", a.clone().into())])).unwrap(),
            Term::from(!a.clone())
        );
        assert_eq!((!a.clone()).eval(&ns([("c", a.clone().into())])).unwrap(), Term::from(!a));
    }

    #[test]
    fn test_reify_non_boolean_in_boolean_position() {
        let (a, b, _) = abc();
        let result = (a | b).reify(&ns([("a", 5.into())]));
        assert!(matches!(result, Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn test_reify_empty_namespace_is_identity() {
        let (a, b, c) = abc();
        let f = !(a.clone() & b.clone()) | (c.clone() & true) | less_than(a, 3);
        assert_eq!(f.reify(&Namespace::new()).unwrap(), Term::from(f));
    }

    #[test]
    fn test_chained_evaluation() {
        let (a, b, c) = abc();
        assert_eq!(
            a.eval(&ns([("a", b.clone().into()), ("b", 1.into())])).unwrap(),
            Term::from(1)
        );
        assert_eq!(
            a.eval(&ns([("a", b.clone().into()), ("b", c.clone().into())])).unwrap(),
            Term::from(c)
        );
        assert_eq!(
            a.eval(&ns([("a", (!b.clone()).into()), ("b", false.into())])).unwrap(),
            Term::from(true)
        );
    }

    #[test]
    fn test_eval_cycle() {
        let (a, b, _) = abc();
        let cycle = ns([("a", b.clone().into()), ("b", a.clone().into())]);
        assert!(matches!(a.eval(&cycle), Err(Error::CyclicSubstitution(_))));

        let self_loop = ns([("a", (a.clone() | b.clone()).into())]);
        assert!(matches!(a.eval(&self_loop), Err(Error::CyclicSubstitution(_))));

        // Binding a variable to itself is not a cycle.
        assert_eq!(a.eval(&ns([("a", a.clone().into())])).unwrap(), Term::from(a));
    }

    #[test]
    fn test_eval_empty_connectives() {
        let empty = Namespace::new();
        assert_eq!(or(Vec::<Expr>::new()).eval(&empty).unwrap(), Term::from(false));
        assert_eq!(and(Vec::<Expr>::new()).eval(&empty).unwrap(), Term::from(true));
    }

    #[test]
    fn test_eval_partial() {
        let (a, b, _) = abc();
        let partial = ns([("a", true.into())]);
        // Folding is left to right, so a decided prefix does not short-circuit.
        assert_eq!(
            (a.clone() | b.clone()).eval(&partial).unwrap(),
            Term::from(or([lit(true), b.clone()]))
        );
        assert_eq!(
            (a.clone() & b.clone()).eval(&partial).unwrap(),
            Term::from(and([lit(true), b.clone()]))
        );
        assert_eq!(
            (b.clone() | a.clone()).eval(&partial).unwrap(),
            Term::from(or([lit(false), b.clone(), lit(true)]))
        );
        assert_eq!((!b.clone()).eval(&partial).unwrap(), Term::from(!b));
    }

    #[test]
    fn test_eval_type_mismatch() {
        let (a, b, _) = abc();
        assert!(matches!(
            (!a.clone()).eval(&ns([("a", 3.into())])),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            (a.clone() & b).eval(&ns([("a", "x".into())])),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            less_than(a, 5).eval(&ns([("a", "x".into())])),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_relational_equality() {
        let (a, _, _) = abc();
        let empty = Namespace::new();
        assert_eq!(equal(5, 6).eval(&empty).unwrap(), Term::from(false));
        assert_eq!(equal(5, 5).eval(&empty).unwrap(), Term::from(true));
        assert_eq!(equal(5, "5").eval(&empty).unwrap(), Term::from(false));
        assert_eq!(
            equal(a.clone(), 5).reify(&ns([("a", 5.into())])).unwrap(),
            Term::from(equal(5, 5))
        );
        assert_eq!(equal(a.clone(), 5).eval(&empty).unwrap(), Term::from(equal(a, 5)));
    }

    #[test]
    fn test_relational_ordering() {
        let (a, _, _) = abc();
        let empty = Namespace::new();
        assert_eq!(less_than(5, 6).eval(&empty).unwrap(), Term::from(true));
        assert_eq!(a.clone().less_than(5).eval(&ns([("a", 4.into())])).unwrap(), Term::from(true));
        assert_eq!(a.clone().less_than(5).eval(&ns([("a", 6.into())])).unwrap(), Term::from(false));
        assert_eq!(less_than(4, a.clone()).eval(&ns([("a", 5.into())])).unwrap(), Term::from(true));
        assert_eq!(a.greater_than("m").eval(&ns([("a", "z".into())])).unwrap(), Term::from(true));
    }

    #[test]
    fn test_relational_in_connective() {
        let (a, b, _) = abc();
        let f = a.clone().less_than(3) | b.clone();
        let env = ns([("a", 5.into()), ("b", false.into())]);
        assert_eq!(f.eval(&env).unwrap(), Term::from(false));
    }

    #[test]
    fn test_truth_table_and() {
        let (a, b, _) = abc();
        let table = truth_table(&(a & b)).unwrap();
        assert_eq!(table.len(), 4);
        for x in [true, false] {
            for y in [true, false] {
                let row = table.schema().assign([x, y]);
                assert_eq!(table.get(&row), Some(x && y));
            }
        }
    }

    #[test]
    fn test_truth_table_or() {
        let (a, b, _) = abc();
        let table = truth_table(&(a | b)).unwrap();
        for x in [true, false] {
            for y in [true, false] {
                let row = table.schema().assign([x, y]);
                assert_eq!(table.get(&row), Some(x || y));
            }
        }
    }

    #[test]
    fn test_truth_table_negation() {
        let (a, _, _) = abc();
        let table = (!a).truth_table().unwrap();
        assert_eq!(table.get(&table.schema().assign([true])), Some(false));
        assert_eq!(table.get(&table.schema().assign([false])), Some(true));
    }

    #[test]
    fn test_truth_table_no_free_variables() {
        let empty = Assignment::empty();
        assert_eq!(truth_table(&or([lit(true), lit(false)])).unwrap().get(&empty), Some(true));
        assert_eq!(truth_table(&and([lit(true), lit(false)])).unwrap().get(&empty), Some(false));
        let table = truth_table(&lit(true)).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.is_tautology());
    }

    #[test]
    fn test_truth_table_rejects_non_boolean() {
        let (a, _, _) = abc();
        assert!(matches!(truth_table(&a.less_than(5)), Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn test_truth_table_invariants() {
        let (a, b, c) = abc();
        let f = (a.clone() & !b.clone()) | c.clone();
        let table = truth_table(&f).unwrap();
        assert_eq!(truth_table(&(f.clone() | f.clone())).unwrap(), table);
        assert_eq!(truth_table(&(f.clone() & f.clone())).unwrap(), table);
        assert!(truth_table(&(f.clone() & !f.clone())).unwrap().is_contradiction());
        assert!(truth_table(&(f.clone() | !f.clone())).unwrap().is_tautology());
        let negated = truth_table(&!f).unwrap();
        for (row, value) in table.iter() {
            assert_eq!(negated.get(row), Some(!value));
        }
        assert_eq!(table.satisfying().count(), 5);
    }

    #[test]
    fn test_logical_equivalence() {
        let (a, b, c) = abc();
        assert!(is_logically_equivalent(&!(a.clone() & b.clone()), &(!a.clone() | !b.clone())).unwrap());
        assert!(is_logically_equivalent(&!(a.clone() | b.clone()), &(!a.clone() & !b.clone())).unwrap());
        assert!(!is_logically_equivalent(&(a.clone() | b.clone()), &(a.clone() & b.clone())).unwrap());
        // Different free variables are never equivalent, even for tautologies.
        assert!(!is_logically_equivalent(&(a.clone() | !a.clone()), &(c.clone() | !c)).unwrap());
        assert!(!is_logically_equivalent(&a, &(a.clone() & (b.clone() | !b))).unwrap());
    }
}
