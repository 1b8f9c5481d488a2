//! Expression — the immutable predicate tree handed to `search_prefix`.
//!
//! Leaves are built with [`equals`], [`equals_any`] and [`contains`], which
//! reject empty field names. Leaves are combined with [`and`] / [`or`] (or the
//! [`Expression::and`] / [`Expression::or`] methods). Children are held behind
//! [`Arc`], so cloning an expression to reuse it inside another tree is cheap
//! and never copies or mutates the original.
//!
//! ```rust
//! use nipap_query::{equals, equals_any, or};
//!
//! let tag = or(equals_any("tags", "foobar")?, equals_any("inherited_tags", "foobar")?);
//! let query = tag.clone().and(equals("type", "assignment")?);
//! assert_eq!(query.depth(), 3);
//! # Ok::<(), nipap_query::QueryError>(())
//! ```

use std::sync::Arc;

use crate::error::QueryError;
use crate::types::{Operator, Value};

/// One predicate, or a boolean combination of two expressions.
///
/// The variants are public for pattern matching. Building leaves directly
/// skips field validation; such values are rejected by
/// [`compile`](crate::compile) instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// `field` must equal `value` exactly.
    Equals { field: String, value: Value },
    /// `field` is multi-valued (a tag set); `value` must be a member.
    EqualsAny { field: String, value: Value },
    /// `field` must contain `value` (CIDR supernet, substring) per the
    /// backend's semantics for that field.
    Contains { field: String, value: Value },
    And(Arc<Expression>, Arc<Expression>),
    Or(Arc<Expression>, Arc<Expression>),
}

fn leaf_field(field: impl Into<String>, op: Operator) -> Result<String, QueryError> {
    let field = field.into();
    if field.is_empty() {
        return Err(QueryError::InvalidArgument(format!(
            "{op}: field name must not be empty"
        )));
    }
    Ok(field)
}

/// `field == value`.
pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Result<Expression, QueryError> {
    Ok(Expression::Equals {
        field: leaf_field(field, Operator::Equals)?,
        value: value.into(),
    })
}

/// `value ∈ field`, for multi-valued attributes such as `tags`.
pub fn equals_any(
    field: impl Into<String>,
    value: impl Into<Value>,
) -> Result<Expression, QueryError> {
    Ok(Expression::EqualsAny {
        field: leaf_field(field, Operator::EqualsAny)?,
        value: value.into(),
    })
}

/// `field` contains `value`, e.g. `contains("prefix", "10.0.0.1/32")` matches
/// every prefix covering that host.
pub fn contains(
    field: impl Into<String>,
    value: impl Into<Value>,
) -> Result<Expression, QueryError> {
    Ok(Expression::Contains {
        field: leaf_field(field, Operator::Contains)?,
        value: value.into(),
    })
}

/// Both `left` and `right` must hold.
pub fn and(left: Expression, right: Expression) -> Expression {
    Expression::And(Arc::new(left), Arc::new(right))
}

/// At least one of `left` and `right` must hold.
pub fn or(left: Expression, right: Expression) -> Expression {
    Expression::Or(Arc::new(left), Arc::new(right))
}

impl Expression {
    pub fn and(self, other: Expression) -> Expression {
        and(self, other)
    }

    pub fn or(self, other: Expression) -> Expression {
        or(self, other)
    }

    pub fn operator(&self) -> Operator {
        match self {
            Expression::Equals { .. } => Operator::Equals,
            Expression::EqualsAny { .. } => Operator::EqualsAny,
            Expression::Contains { .. } => Operator::Contains,
            Expression::And(..) => Operator::And,
            Expression::Or(..) => Operator::Or,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !self.operator().is_combinator()
    }

    /// Number of levels in the tree; a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let Expression::And(l, r) | Expression::Or(l, r) = node {
                stack.push((&**l, level + 1));
                stack.push((&**r, level + 1));
            }
        }
        deepest
    }

    /// Number of leaf predicates in the tree.
    pub fn leaf_count(&self) -> usize {
        let mut leaves = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Expression::And(l, r) | Expression::Or(l, r) => {
                    stack.push(&**l);
                    stack.push(&**r);
                }
                _ => leaves += 1,
            }
        }
        leaves
    }

    /// Stand-in left behind when a child is unlinked during drop.
    fn detached() -> Expression {
        Expression::Equals {
            field: String::new(),
            value: Value::Bool(false),
        }
    }
}

// Unlinks uniquely owned combinator children onto a heap stack so that
// dropping a long chain does not recurse once per level.
impl Drop for Expression {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach_children(&mut node, &mut pending);
        }
    }
}

fn detach_children(expr: &mut Expression, pending: &mut Vec<Expression>) {
    if let Expression::And(l, r) | Expression::Or(l, r) = expr {
        for child in [l, r] {
            if let Some(inner) = Arc::get_mut(child) {
                if !inner.is_leaf() {
                    pending.push(std::mem::replace(inner, Expression::detached()));
                }
            }
        }
    }
}

/// Every expression in `exprs` must hold, combined as a balanced tree so
/// the depth grows with the logarithm of the count. Order is preserved
/// left to right. `None` when `exprs` is empty.
pub fn and_all(exprs: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    balanced(exprs.into_iter().collect(), and)
}

/// At least one expression in `exprs` must hold; balanced like [`and_all`].
pub fn or_any(exprs: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    balanced(exprs.into_iter().collect(), or)
}

fn balanced(
    mut exprs: Vec<Expression>,
    combine: fn(Expression, Expression) -> Expression,
) -> Option<Expression> {
    match exprs.len() {
        0 => None,
        1 => exprs.pop(),
        n => {
            let right = exprs.split_off((n + 1) / 2);
            Some(combine(balanced(exprs, combine)?, balanced(right, combine)?))
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Equals { field, value }
            | Expression::EqualsAny { field, value }
            | Expression::Contains { field, value } => {
                write!(f, "{}({field}, {value})", self.operator())
            }
            Expression::And(l, r) => write!(f, "({l} and {r})"),
            Expression::Or(l, r) => write!(f, "({l} or {r})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
