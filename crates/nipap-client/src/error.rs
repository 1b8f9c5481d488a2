//! Client error type.

use nipap_query::QueryError;

use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The search expression could not be compiled.
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// The backend processed the call but reported an error in its result.
    #[error("backend error: {0}")]
    Backend(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("could not encode params for {method}: {source}")]
    Encode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unexpected response to {method}: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
