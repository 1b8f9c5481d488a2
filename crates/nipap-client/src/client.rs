//! The NIPAP client: authenticated prefix operations and searches over an
//! [`RpcTransport`].
//!
//! Every call sends a single struct whose `auth` member carries the
//! [`AuthOptions`]. Responses are decoded with serde; prefix rows stay opaque
//! JSON objects ([`ResultRecord`]).

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use nipap_query::{
    search, Expression, ResultRecord, SearchExecutor, SearchOptions, SearchResult, WireObject,
};

use crate::auth::AuthOptions;
use crate::config::Config;
use crate::error::ClientError;
use crate::transport::{RpcTransport, TransportError};

/// Attribute map used to select (`list_prefix`) or create (`add_prefix`)
/// prefixes, e.g. `{"prefix": "172.16.5.0/24"}`.
pub type PrefixSpec = serde_json::Map<String, serde_json::Value>;

/// Result of a free-text smart search: the usual result plus the backend's
/// interpretation of the query string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SmartSearchResult {
    #[serde(flatten)]
    pub search: SearchResult,
    #[serde(default)]
    pub interpretation: serde_json::Value,
    #[serde(default)]
    error: bool,
    #[serde(default)]
    error_message: Option<String>,
}

// ---------------------------------------------------------------------------
// Call parameters
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EchoParams<'a> {
    auth: &'a AuthOptions,
    message: &'a str,
}

#[derive(Serialize)]
struct PrefixParams<'a> {
    auth: &'a AuthOptions,
    prefix: &'a PrefixSpec,
}

#[derive(Serialize)]
struct AddPrefixParams<'a> {
    auth: &'a AuthOptions,
    attr: &'a PrefixSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<FromPrefixArgs<'a>>,
}

#[derive(Serialize)]
struct FromPrefixArgs<'a> {
    #[serde(rename = "from-prefix")]
    from_prefix: [&'a str; 1],
    prefix_length: u8,
}

#[derive(Serialize)]
struct RemovePrefixParams<'a> {
    auth: &'a AuthOptions,
    prefix: PrefixId,
    recursive: bool,
}

#[derive(Serialize)]
struct PrefixId {
    id: u64,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    auth: &'a AuthOptions,
    query: &'a WireObject,
    search_options: &'a SearchOptions,
}

#[derive(Serialize)]
struct SmartSearchParams<'a> {
    auth: &'a AuthOptions,
    query_string: &'a str,
    search_options: &'a SearchOptions,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Client<T> {
    transport: T,
    auth: AuthOptions,
}

impl<T: RpcTransport> Client<T> {
    pub fn new(transport: T, auth: AuthOptions) -> Self {
        Self { transport, auth }
    }

    /// Build a client authenticating with the `[connection]` credentials.
    /// `transport` is expected to already point at `config.connection.url`;
    /// use [`Client::connect`] to have the URL handed to you.
    pub fn from_config(config: &Config, transport: T) -> Self {
        Self::new(transport, config.connection.auth())
    }

    /// Open a transport to the configured endpoint and wrap it in a client.
    ///
    /// `open` receives `config.connection.url`; failing to open is reported
    /// as [`ClientError::Transport`].
    ///
    /// ```rust,ignore
    /// let client = Client::connect(&Config::load()?, |url| MyXmlRpc::new(url))?;
    /// ```
    pub fn connect<F>(config: &Config, open: F) -> Result<Self, ClientError>
    where
        F: FnOnce(&str) -> Result<T, TransportError>,
    {
        tracing::debug!(url = %config.connection.url, "opening nipap transport");
        let transport = open(&config.connection.url)?;
        Ok(Self::from_config(config, transport))
    }

    pub fn auth(&self) -> &AuthOptions {
        &self.auth
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<P, R>(&self, method: &'static str, params: &P) -> Result<R, ClientError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let params =
            serde_json::to_value(params).map_err(|source| ClientError::Encode { method, source })?;
        tracing::debug!(method, "dispatching rpc call");
        let response = self.transport.call(method, params).await?;
        serde_json::from_value(response).map_err(|source| ClientError::Decode { method, source })
    }

    /// Round-trip `message` through the backend; useful as a liveness and
    /// credentials check.
    pub async fn echo(&self, message: &str) -> Result<String, ClientError> {
        let params = EchoParams {
            auth: &self.auth,
            message,
        };
        self.call("echo", &params).await
    }

    /// List prefixes matching every attribute in `spec`. An empty spec lists
    /// all prefixes.
    pub async fn list_prefix(&self, spec: &PrefixSpec) -> Result<Vec<ResultRecord>, ClientError> {
        let params = PrefixParams {
            auth: &self.auth,
            prefix: spec,
        };
        self.call("list_prefix", &params).await
    }

    /// Create a prefix from `attr` (which must hold the `prefix` itself) and
    /// return the stored record.
    pub async fn add_prefix(&self, attr: &PrefixSpec) -> Result<ResultRecord, ClientError> {
        let params = AddPrefixParams {
            auth: &self.auth,
            attr,
            args: None,
        };
        self.call("add_prefix", &params).await
    }

    /// Allocate the first free `/prefix_length` inside `from_prefix` and
    /// create it with `attr`.
    pub async fn add_prefix_from_prefix(
        &self,
        attr: &PrefixSpec,
        from_prefix: &str,
        prefix_length: u8,
    ) -> Result<ResultRecord, ClientError> {
        if !(1..=128).contains(&prefix_length) {
            return Err(ClientError::InvalidArgument(format!(
                "prefix_length must be within 1..=128, got {prefix_length}"
            )));
        }
        if from_prefix.is_empty() {
            return Err(ClientError::InvalidArgument(
                "from_prefix must not be empty".to_string(),
            ));
        }
        let params = AddPrefixParams {
            auth: &self.auth,
            attr,
            args: Some(FromPrefixArgs {
                from_prefix: [from_prefix],
                prefix_length,
            }),
        };
        self.call("add_prefix", &params).await
    }

    /// Remove the prefix with `id`; with `recursive` its children go too.
    pub async fn remove_prefix(&self, id: u64, recursive: bool) -> Result<(), ClientError> {
        let params = RemovePrefixParams {
            auth: &self.auth,
            prefix: PrefixId { id },
            recursive,
        };
        let _: serde_json::Value = self.call("remove_prefix", &params).await?;
        Ok(())
    }

    /// Structured search. `expr` is compiled before anything is sent.
    pub async fn search_prefix(
        &self,
        expr: &Expression,
        options: SearchOptions,
    ) -> Result<SearchResult, ClientError> {
        search(self, expr, options).await
    }

    /// Free-text search; the backend parses `query` (addresses, `#tags`,
    /// words) itself.
    pub async fn smart_search_prefix(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<SmartSearchResult, ClientError> {
        let params = SmartSearchParams {
            auth: &self.auth,
            query_string: query,
            search_options: &options,
        };
        let result: SmartSearchResult = self.call("smart_search_prefix", &params).await?;
        if result.error {
            let message = result
                .error_message
                .unwrap_or_else(|| "smart search failed".to_string());
            tracing::warn!(query, %message, "backend rejected smart search");
            return Err(ClientError::Backend(message));
        }
        Ok(result)
    }
}

impl<T: RpcTransport> SearchExecutor for Client<T> {
    type Error = ClientError;

    fn execute(
        &self,
        query: WireObject,
        options: SearchOptions,
    ) -> impl Future<Output = Result<SearchResult, ClientError>> + Send {
        async move {
            let params = SearchParams {
                auth: &self.auth,
                query: &query,
                search_options: &options,
            };
            self.call("search_prefix", &params).await
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
