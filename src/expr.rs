//! Expression trees for propositional formulas.
//!
//! An [`Expr`] is an immutable tree. Compound nodes live behind [`Rc`], so cloning
//! an expression is cheap and the same subtree may appear under many parents.
//! Every transformation in this crate builds a new tree instead of mutating one.
//!
//! Expressions are built with the free functions of this module ([`lit`],
//! [`not`], [`or`], [`and`], [`less_than`], [`greater_than`], [`equal`]) or with the
//! operator sugar `|`, `&` and `!`:
//!
//! ```
//! use reasoner_rs::expr::{and, not, or, variables, Expr};
//!
//! let [a, b, c]: [Expr; 3] = variables("a b c")
//!     .unwrap()
//!     .into_iter()
//!     .map(Expr::from)
//!     .collect::<Vec<_>>()
//!     .try_into()
//!     .unwrap();
//!
//! let f = (a.clone() & b.clone()) | !c.clone();
//! assert_eq!(f, or([and([a, b]), not(c)]));
//! assert_eq!(f.to_string(), "((a & b) | ~c)");
//! ```

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter;
use std::ops::{BitAnd, BitOr, Deref};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::ident::is_valid_identifier;

/// Set of variables, ordered by name.
pub type VarSet = BTreeSet<Variable>;

/// An atomic proposition, identified by its name.
///
/// Two variables are equal iff their names are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(Rc<str>);

impl Variable {
    /// Creates a variable named `name`.
    ///
    /// Fails with [`Error::InvalidIdentifier`] if `name` is not a valid identifier.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if !is_valid_identifier(name) {
            return Err(Error::InvalidIdentifier(name.to_string()));
        }
        Ok(Variable(Rc::from(name)))
    }

    /// Creates a variable with a generated name of the form `_x<n>`.
    ///
    /// The leading `_` is reserved, so a fresh variable never equals one made
    /// with [`Variable::new`].
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        Variable(Rc::from(format!("_x{}", n)))
    }

    /// Creates one variable per name.
    pub fn all<I, S>(names: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().map(Variable::new).collect()
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn less_than(self, rhs: impl Into<Term>) -> Expr {
        relation(self, RelOp::Lt, rhs)
    }

    pub fn greater_than(self, rhs: impl Into<Term>) -> Expr {
        relation(self, RelOp::Gt, rhs)
    }

    pub fn equal_to(self, rhs: impl Into<Term>) -> Expr {
        relation(self, RelOp::Eq, rhs)
    }
}

impl AsRef<str> for Variable {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Creates variables from a list of names separated by commas and/or whitespace.
///
/// ```
/// use reasoner_rs::expr::variables;
///
/// assert_eq!(variables("a b c").unwrap(), variables("a, b, c").unwrap());
/// assert!(variables("a in").is_err());
/// ```
pub fn variables(names: &str) -> Result<Vec<Variable>> {
    Variable::all(
        names
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|name| !name.is_empty()),
    )
}

/// A plain, non-symbolic value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the value kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Either an expression or a plain value.
///
/// Terms are substitution targets, operands of relational atoms, and the results
/// of [`Expr::reify`] and [`Expr::eval`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Expr(Expr),
    Value(Value),
}

impl Term {
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Term::Expr(e) => Some(e),
            Term::Value(_) => None,
        }
    }

    /// Returns the truth value of a boolean value or a boolean literal.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Term::Expr(e) => e.as_lit(),
            Term::Value(v) => v.as_bool(),
        }
    }

    /// Converts into an expression usable in a boolean position.
    ///
    /// Boolean values become literals; any other value is a [`Error::TypeMismatch`].
    pub fn into_expr(self) -> Result<Expr> {
        match self {
            Term::Expr(e) => Ok(e),
            Term::Value(Value::Bool(b)) => Ok(Expr::Lit(b)),
            Term::Value(v) => Err(Error::TypeMismatch(format!(
                "expected a boolean or an expression, found {} `{}`",
                v.kind(),
                v
            ))),
        }
    }

    /// Free variables of the term (none for plain values).
    pub fn free_variables(&self) -> Rc<VarSet> {
        match self {
            Term::Expr(e) => e.free_variables(),
            Term::Value(_) => Rc::new(VarSet::new()),
        }
    }
}

impl From<Expr> for Term {
    fn from(expr: Expr) -> Self {
        Term::Expr(expr)
    }
}

impl From<Variable> for Term {
    fn from(var: Variable) -> Self {
        Term::Expr(Expr::Var(var))
    }
}

impl From<&Variable> for Term {
    fn from(var: &Variable) -> Self {
        Term::Expr(Expr::Var(var.clone()))
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::Value(value)
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::Value(Value::Bool(value))
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Value(Value::from(value))
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Term::Value(Value::from(value))
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::Value(Value::from(value))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Expr(e) => write!(f, "{}", e),
            Term::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Comparison operator of a relational atom.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RelOp {
    Lt,
    Gt,
    Eq,
}

impl RelOp {
    pub fn symbol(self) -> &'static str {
        match self {
            RelOp::Lt => "<",
            RelOp::Gt => ">",
            RelOp::Eq => "==",
        }
    }
}

/// A binary comparison `lhs op rhs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub lhs: Term,
    pub op: RelOp,
    pub rhs: Term,
}

/// Shared payload of a compound node.
///
/// Holds the lazily computed free-variable set of the node. The cache takes no
/// part in equality or hashing.
pub struct Node<T> {
    inner: T,
    free: OnceCell<Rc<VarSet>>,
}

impl<T> Node<T> {
    fn new(inner: T) -> Rc<Self> {
        Rc::new(Node {
            inner,
            free: OnceCell::new(),
        })
    }
}

impl<T> Deref for Node<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: PartialEq> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Eq> Eq for Node<T> {}

impl<T: Hash> Hash for Node<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// A propositional formula.
///
/// Equality is structural and order-sensitive: `Or(a, b) != Or(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Constant truth value.
    Lit(bool),
    /// Atomic proposition.
    Var(Variable),
    /// Negation.
    Not(Rc<Node<Expr>>),
    /// N-ary disjunction; the empty disjunction is `false`.
    Or(Rc<Node<Vec<Expr>>>),
    /// N-ary conjunction; the empty conjunction is `true`.
    And(Rc<Node<Vec<Expr>>>),
    /// Relational atom.
    Rel(Rc<Node<Relation>>),
}

impl Expr {
    /// Creates a variable expression named `name`.
    pub fn var(name: impl AsRef<str>) -> Result<Self> {
        Variable::new(name).map(Expr::Var)
    }

    pub fn as_lit(&self) -> Option<bool> {
        match self {
            Expr::Lit(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Expr::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Boolean children of the node: the negated operand, or the disjuncts/conjuncts.
    pub fn children(&self) -> &[Expr] {
        match self {
            Expr::Not(child) => std::slice::from_ref(&child.inner),
            Expr::Or(children) | Expr::And(children) => &children.inner,
            Expr::Lit(_) | Expr::Var(_) | Expr::Rel(_) => &[],
        }
    }

    /// Size of the expression tree (number of nodes).
    pub fn size(&self) -> usize {
        match self {
            Expr::Lit(_) | Expr::Var(_) => 1,
            Expr::Not(child) => 1 + child.size(),
            Expr::Or(children) | Expr::And(children) => 1 + children.iter().map(Expr::size).sum::<usize>(),
            Expr::Rel(rel) => {
                let operand_size = |t: &Term| match t {
                    Term::Expr(e) => e.size(),
                    Term::Value(_) => 1,
                };
                1 + operand_size(&rel.lhs) + operand_size(&rel.rhs)
            }
        }
    }

    /// The set of variables occurring in the expression.
    ///
    /// Computed once per compound node and cached there.
    pub fn free_variables(&self) -> Rc<VarSet> {
        match self {
            Expr::Lit(_) => Rc::new(VarSet::new()),
            Expr::Var(v) => Rc::new(VarSet::from([v.clone()])),
            Expr::Not(node) => node.free.get_or_init(|| node.inner.free_variables()).clone(),
            Expr::Or(node) | Expr::And(node) => node
                .free
                .get_or_init(|| union(node.iter().map(Expr::free_variables)))
                .clone(),
            Expr::Rel(node) => node
                .free
                .get_or_init(|| union([node.lhs.free_variables(), node.rhs.free_variables()]))
                .clone(),
        }
    }

    pub fn less_than(self, rhs: impl Into<Term>) -> Expr {
        relation(self, RelOp::Lt, rhs)
    }

    pub fn greater_than(self, rhs: impl Into<Term>) -> Expr {
        relation(self, RelOp::Gt, rhs)
    }

    pub fn equal_to(self, rhs: impl Into<Term>) -> Expr {
        relation(self, RelOp::Eq, rhs)
    }
}

fn union(sets: impl IntoIterator<Item = Rc<VarSet>>) -> Rc<VarSet> {
    let mut result = VarSet::new();
    for set in sets {
        result.extend(set.iter().cloned());
    }
    Rc::new(result)
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Lit(value)
    }
}

impl From<Variable> for Expr {
    fn from(var: Variable) -> Self {
        Expr::Var(var)
    }
}

impl From<&Variable> for Expr {
    fn from(var: &Variable) -> Self {
        Expr::Var(var.clone())
    }
}

/// Constant `value`.
pub fn lit(value: bool) -> Expr {
    Expr::Lit(value)
}

/// Negation of `child`.
pub fn not(child: impl Into<Expr>) -> Expr {
    Expr::Not(Node::new(child.into()))
}

/// Disjunction of `children`, kept exactly as given (no flattening).
pub fn or<I>(children: I) -> Expr
where
    I: IntoIterator,
    I::Item: Into<Expr>,
{
    Expr::Or(Node::new(children.into_iter().map(Into::into).collect()))
}

/// Conjunction of `children`, kept exactly as given (no flattening).
pub fn and<I>(children: I) -> Expr
where
    I: IntoIterator,
    I::Item: Into<Expr>,
{
    Expr::And(Node::new(children.into_iter().map(Into::into).collect()))
}

/// Relational atom `lhs op rhs`.
pub fn relation(lhs: impl Into<Term>, op: RelOp, rhs: impl Into<Term>) -> Expr {
    Expr::Rel(Node::new(Relation {
        lhs: lhs.into(),
        op,
        rhs: rhs.into(),
    }))
}

/// Relational atom `lhs < rhs`.
pub fn less_than(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Expr {
    relation(lhs, RelOp::Lt, rhs)
}

/// Relational atom `lhs > rhs`.
pub fn greater_than(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Expr {
    relation(lhs, RelOp::Gt, rhs)
}

/// Relational atom `lhs == rhs`.
pub fn equal(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Expr {
    relation(lhs, RelOp::Eq, rhs)
}

/// `lhs | rhs`: extends `lhs` if it is already a disjunction, splicing in the
/// children of `rhs` if that is a disjunction too.
pub(crate) fn disjoin(lhs: Expr, rhs: Expr) -> Expr {
    match lhs {
        Expr::Or(node) => {
            let mut children = node.inner.clone();
            match rhs {
                Expr::Or(other) => children.extend(other.iter().cloned()),
                other => children.push(other),
            }
            or(children)
        }
        lhs => or([lhs, rhs]),
    }
}

/// `lhs & rhs`: the conjunctive counterpart of [`disjoin`].
pub(crate) fn conjoin(lhs: Expr, rhs: Expr) -> Expr {
    match lhs {
        Expr::And(node) => {
            let mut children = node.inner.clone();
            match rhs {
                Expr::And(other) => children.extend(other.iter().cloned()),
                other => children.push(other),
            }
            and(children)
        }
        lhs => and([lhs, rhs]),
    }
}

impl<R: Into<Expr>> BitOr<R> for Expr {
    type Output = Expr;

    fn bitor(self, rhs: R) -> Self::Output {
        disjoin(self, rhs.into())
    }
}

impl<R: Into<Expr>> BitAnd<R> for Expr {
    type Output = Expr;

    fn bitand(self, rhs: R) -> Self::Output {
        conjoin(self, rhs.into())
    }
}

impl<R: Into<Expr>> BitOr<R> for Variable {
    type Output = Expr;

    fn bitor(self, rhs: R) -> Self::Output {
        disjoin(Expr::Var(self), rhs.into())
    }
}

impl<R: Into<Expr>> BitAnd<R> for Variable {
    type Output = Expr;

    fn bitand(self, rhs: R) -> Self::Output {
        conjoin(Expr::Var(self), rhs.into())
    }
}

// A constant on the left is prepended to a disjunction on the right.
impl BitOr<Expr> for bool {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Self::Output {
        match rhs {
            Expr::Or(node) => or(iter::once(lit(self)).chain(node.iter().cloned())),
            rhs => or([lit(self), rhs]),
        }
    }
}

impl BitAnd<Expr> for bool {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Self::Output {
        match rhs {
            Expr::And(node) => and(iter::once(lit(self)).chain(node.iter().cloned())),
            rhs => and([lit(self), rhs]),
        }
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Self::Output {
        not(self)
    }
}

impl std::ops::Not for Variable {
    type Output = Expr;

    fn not(self) -> Self::Output {
        not(self)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Lit(b) => write!(f, "{}", b),
            Expr::Var(v) => write!(f, "{}", v),
            Expr::Not(child) => write!(f, "~{}", child.inner),
            Expr::Or(children) => write_joined(f, children, " | "),
            Expr::And(children) => write_joined(f, children, " & "),
            Expr::Rel(rel) => write!(f, "({} {} {})", rel.lhs, rel.op.symbol(), rel.rhs),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Expr], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", child)?;
    }
    write!(f, ")")
}
