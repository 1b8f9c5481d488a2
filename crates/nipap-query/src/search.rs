//! Search seam — options, results and the [`SearchExecutor`] trait an RPC
//! layer implements.
//!
//! The core only produces the compiled query; the executor owns the network
//! call and response decoding. Result records are opaque JSON objects here.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::compiler::{compile, WireObject};
use crate::error::QueryError;
use crate::expression::Expression;

/// One matching record as returned by the backend (a prefix row).
pub type ResultRecord = serde_json::Map<String, serde_json::Value>;

/// Options sent next to the query as `search_options`.
///
/// Only `parents_depth` is always sent; unset fields are omitted so the
/// backend applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// How many ancestor levels of each match are returned as well.
    pub parents_depth: u32,
    /// How many descendant levels of each match are returned as well.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all_parents: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all_children: Option<bool>,
    /// Restrict the result to the subtree below this prefix id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_prefix: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_result: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl SearchOptions {
    pub fn with_parents_depth(parents_depth: u32) -> Self {
        Self {
            parents_depth,
            ..Self::default()
        }
    }
}

/// Matching records plus the effective options the backend applied
/// (pagination and depth metadata).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "result", default)]
    pub records: Vec<ResultRecord>,
    #[serde(rename = "search_options", default)]
    pub options: SearchOptions,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Runs a compiled query against the remote service.
pub trait SearchExecutor {
    type Error: From<QueryError>;

    fn execute(
        &self,
        query: WireObject,
        options: SearchOptions,
    ) -> impl Future<Output = Result<SearchResult, Self::Error>> + Send;
}

/// Compile `expr` and hand it to `executor`.
///
/// Compilation failures are converted into the executor's error type before
/// any call is made.
pub async fn search<E: SearchExecutor>(
    executor: &E,
    expr: &Expression,
    options: SearchOptions,
) -> Result<SearchResult, E::Error> {
    let query = compile(expr)?;
    executor.execute(query, options).await
}
