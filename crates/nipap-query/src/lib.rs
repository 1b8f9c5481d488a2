//! nipap-query — search expressions for the NIPAP client.
//!
//! This crate holds the pure part of the client: an immutable predicate
//! algebra ([`Expression`]), the compiler that turns it into the nested wire
//! object the `search_prefix` RPC accepts, and the [`SearchExecutor`] seam an
//! RPC layer implements.
//!
//! # Architecture
//!
//! ```text
//! builders ──► Expression ──► compile ──► WireObject ──► SearchExecutor
//! ```
//!
//! Nothing here performs I/O. Expressions and wire objects are `Send + Sync`
//! and may be built and compiled from any thread.

pub mod compiler;
pub mod error;
pub mod expression;
pub mod search;
pub mod types;

pub use compiler::{compile, Operand, WireObject, MAX_DEPTH};
pub use error::QueryError;
pub use expression::{and, and_all, contains, equals, equals_any, or, or_any, Expression};
pub use search::{search, ResultRecord, SearchExecutor, SearchOptions, SearchResult};
pub use types::{Operator, Value};
