//! nipap — client library for the NIPAP IP address management service.
//!
//! This crate re-exports the two workspace layers so that callers and the
//! integration tests can depend on a single crate.
//!
//! # Architecture
//!
//! ```text
//! nipap-query (Expression ──► compile ──► WireObject)
//!      │
//!      ▼
//! nipap-client (Client ──► RpcTransport)
//! ```
//!
//! The query layer is pure and synchronous; only the client is async.

pub mod cli;

pub use nipap_client::{
    AuthOptions, Client, ClientError, Config, PrefixSpec, RpcTransport, SmartSearchResult,
    TransportError,
};
pub use nipap_query::{
    and, and_all, compile, contains, equals, equals_any, or, or_any, search, Expression, Operand,
    Operator, QueryError, ResultRecord, SearchExecutor, SearchOptions, SearchResult, Value,
    WireObject, MAX_DEPTH,
};
