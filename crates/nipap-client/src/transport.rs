//! Transport seam. The client never opens sockets itself; it hands a method
//! name and JSON-shaped params to an [`RpcTransport`] and gets the decoded
//! response back.

use std::future::Future;

/// Failures reported by a transport implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (connect, TLS, timeout, ...).
    #[error("connection failed: {0}")]
    Connection(String),
    /// The backend answered with an RPC fault.
    #[error("rpc fault {code}: {message}")]
    Fault { code: i64, message: String },
    /// The response body could not be decoded into a value.
    #[error("undecodable response: {0}")]
    Protocol(String),
}

/// A single remote procedure call against the backend.
///
/// `params` is the struct passed as the only positional argument of the
/// call; implementations map it onto their wire encoding.
pub trait RpcTransport: Send + Sync {
    fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, TransportError>> + Send;
}
