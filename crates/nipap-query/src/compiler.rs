//! Query compiler — turns an [`Expression`] into the nested wire object the
//! `search_prefix` RPC accepts.
//!
//! Every node becomes exactly one object with the keys `operator`, `val1`,
//! `val2`, always in that order:
//!
//! ```text
//! leaf        {"operator": "equals", "val1": "prefix", "val2": "172.16.5.0/24"}
//! combinator  {"operator": "and", "val1": {..left..}, "val2": {..right..}}
//! ```
//!
//! The left operand of a combinator always lands in `val1`. Compilation is
//! pure: the same expression always yields the same (byte-identical when
//! serialised) wire object, wherever it sits in a larger tree.
//!
//! Trees deeper than [`MAX_DEPTH`] are rejected before any node is visited.
//! Long predicate lists should be combined with
//! [`and_all`](crate::and_all) / [`or_any`](crate::or_any), which keep the
//! depth logarithmic in the number of leaves.

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::expression::Expression;
use crate::types::{Operator, Value};

/// One node of the compiled query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireObject {
    pub operator: Operator,
    pub val1: Operand,
    pub val2: Operand,
}

/// A `val1` / `val2` slot: either a nested query (combinators) or a scalar
/// (the field name or the value of a leaf).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Nested(Box<WireObject>),
    Scalar(Value),
}

impl WireObject {
    /// The two compiled children of a combinator, `None` for leaves.
    pub fn children(&self) -> Option<(&WireObject, &WireObject)> {
        match (&self.val1, &self.val2) {
            (Operand::Nested(l), Operand::Nested(r)) => Some((l, r)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        // A struct of strings, integers and booleans always maps to JSON.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Deepest expression [`compile`] accepts. The compiled object nests once
/// per level, and JSON decoders commonly refuse nesting past 128.
pub const MAX_DEPTH: usize = 64;

/// Compile `expr` into its wire form.
///
/// Fails with [`QueryError::MalformedExpression`] when a leaf constructed
/// without the builders carries an empty field name, or when the tree is
/// deeper than [`MAX_DEPTH`]. Nothing is returned on failure; the whole tree
/// compiles or none of it does.
pub fn compile(expr: &Expression) -> Result<WireObject, QueryError> {
    let depth = expr.depth();
    if depth > MAX_DEPTH {
        return Err(QueryError::MalformedExpression(format!(
            "expression depth {depth} exceeds the maximum of {MAX_DEPTH}"
        )));
    }
    let wire = compile_node(expr)?;
    tracing::trace!(operator = %wire.operator, depth, "compiled search expression");
    Ok(wire)
}

fn compile_node(expr: &Expression) -> Result<WireObject, QueryError> {
    match expr {
        Expression::Equals { field, value }
        | Expression::EqualsAny { field, value }
        | Expression::Contains { field, value } => {
            if field.is_empty() {
                return Err(QueryError::MalformedExpression(format!(
                    "{} leaf has an empty field name",
                    expr.operator()
                )));
            }
            Ok(WireObject {
                operator: expr.operator(),
                val1: Operand::Scalar(Value::Str(field.clone())),
                val2: Operand::Scalar(value.clone()),
            })
        }
        Expression::And(left, right) | Expression::Or(left, right) => Ok(WireObject {
            operator: expr.operator(),
            val1: Operand::Nested(Box::new(compile_node(left)?)),
            val2: Operand::Nested(Box::new(compile_node(right)?)),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
