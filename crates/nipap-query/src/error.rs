//! Error type for expression construction and compilation.

/// Failures raised while building or compiling an [`Expression`](crate::Expression).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// A builder was given an operand it cannot accept (empty field name).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An expression that bypassed the builders reached the compiler.
    #[error("malformed expression: {0}")]
    MalformedExpression(String),
}
