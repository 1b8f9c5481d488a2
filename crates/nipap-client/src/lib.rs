//! nipap-client — RPC client for the NIPAP IP address management service.
//!
//! The client speaks to the backend through an [`RpcTransport`] the caller
//! provides (typically an XML-RPC stack pointed at `/RPC2`). On top of it,
//! [`Client`] adds authentication, the prefix operations and both search
//! flavours: structured search with a compiled
//! [`Expression`](nipap_query::Expression) and free-text smart search.
//!
//! ```text
//! Config ──► Client ──► RpcTransport ──► backend
//!              ▲
//!   Expression ┘ (compiled by nipap-query)
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use auth::AuthOptions;
pub use client::{Client, PrefixSpec, SmartSearchResult};
pub use config::Config;
pub use error::ClientError;
pub use transport::{RpcTransport, TransportError};
