//! In-process fake NIPAP backend for integration tests.
//!
//! Implements [`RpcTransport`] over an in-memory prefix table. Serves:
//! - `echo` — returns `message`
//! - `list_prefix` — rows whose attributes equal every key of `prefix`
//! - `add_prefix` — stores `attr`, or allocates from `args.from-prefix`
//! - `remove_prefix` — deletes by id, children too when `recursive`
//! - `search_prefix` — evaluates the wire query against every row
//! - `smart_search_prefix` — `#tag` words and address/description words
//!
//! Every call checks the `auth` member and answers a fault on bad
//! credentials, like the real backend. Only IPv4 is understood.
//!
//! # Example
//!
//! ```rust,no_run
//! let backend = FakeNipap::seeded();
//! let client = Client::new(backend.clone(), admin_auth());
//! let rows = client.list_prefix(&PrefixSpec::new()).await?;
//! assert_eq!(backend.calls().await.len(), 1);
//! ```

use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use nipap::{AuthOptions, ResultRecord, RpcTransport, TransportError};

use super::fixtures::{seed_prefixes, ADMIN_PASSWORD, ADMIN_USER};

/// Backend default page size, echoed in `search_options`.
const DEFAULT_MAX_RESULT: u64 = 50;

#[derive(Default)]
struct BackendState {
    prefixes: Vec<ResultRecord>,
    next_id: u64,
    calls: Vec<(String, Value)>,
}

/// Handle to the fake backend. Clones share the same table.
#[derive(Clone, Default)]
pub struct FakeNipap {
    state: Arc<Mutex<BackendState>>,
}

pub fn admin_auth() -> AuthOptions {
    AuthOptions::new(ADMIN_USER, ADMIN_PASSWORD)
}

impl FakeNipap {
    pub fn empty() -> Self {
        Self::with_prefixes(Vec::new())
    }

    pub fn seeded() -> Self {
        Self::with_prefixes(seed_prefixes())
    }

    pub fn with_prefixes(prefixes: Vec<ResultRecord>) -> Self {
        let next_id = prefixes
            .iter()
            .filter_map(|p| p.get("id").and_then(Value::as_u64))
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            state: Arc::new(Mutex::new(BackendState {
                prefixes,
                next_id,
                calls: Vec::new(),
            })),
        }
    }

    /// Every `(method, params)` received so far, oldest first.
    pub async fn calls(&self) -> Vec<(String, Value)> {
        self.state.lock().await.calls.clone()
    }

    pub async fn last_call(&self) -> (String, Value) {
        self.calls().await.pop().expect("no rpc call recorded")
    }

    pub async fn prefixes(&self) -> Vec<ResultRecord> {
        self.state.lock().await.prefixes.clone()
    }
}

impl RpcTransport for FakeNipap {
    fn call(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        let state = self.state.clone();
        let method = method.to_string();
        async move {
            let mut state = state.lock().await;
            state.calls.push((method.clone(), params.clone()));
            check_auth(&params)?;
            match method.as_str() {
                "echo" => Ok(params["message"].clone()),
                "list_prefix" => Ok(list_prefix(&state, &params["prefix"])),
                "add_prefix" => add_prefix(&mut state, &params),
                "remove_prefix" => remove_prefix(&mut state, &params),
                "search_prefix" => search_prefix(&state, &params),
                "smart_search_prefix" => smart_search_prefix(&state, &params),
                other => Err(fault(1000, format!("unknown method {other}"))),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn fault(code: i64, message: impl Into<String>) -> TransportError {
    TransportError::Fault {
        code,
        message: message.into(),
    }
}

fn check_auth(params: &Value) -> Result<(), TransportError> {
    let auth = &params["auth"];
    if auth["username"] == ADMIN_USER && auth["password"] == ADMIN_PASSWORD {
        Ok(())
    } else {
        Err(fault(1510, "Authentication failed"))
    }
}

fn list_prefix(state: &BackendState, spec: &Value) -> Value {
    let spec = spec.as_object().cloned().unwrap_or_default();
    let rows: Vec<&ResultRecord> = state
        .prefixes
        .iter()
        .filter(|row| spec.iter().all(|(k, v)| row.get(k) == Some(v)))
        .collect();
    json!(rows)
}

fn add_prefix(state: &mut BackendState, params: &Value) -> Result<Value, TransportError> {
    let mut row = params["attr"]
        .as_object()
        .cloned()
        .ok_or_else(|| fault(1110, "missing attr"))?;

    if let Some(args) = params.get("args") {
        let parent = args["from-prefix"][0]
            .as_str()
            .ok_or_else(|| fault(1110, "missing from-prefix"))?;
        let length = args["prefix_length"]
            .as_u64()
            .ok_or_else(|| fault(1110, "missing prefix_length"))?;
        let allocated = allocate(state, parent, length as u8)?;
        row.insert("prefix".to_string(), json!(allocated));
    }

    let prefix = row
        .get("prefix")
        .and_then(Value::as_str)
        .ok_or_else(|| fault(1110, "missing prefix"))?;
    if state.prefixes.iter().any(|p| p["prefix"] == prefix) {
        return Err(fault(1300, format!("duplicate prefix {prefix}")));
    }

    row.insert("id".to_string(), json!(state.next_id));
    row.entry("tags").or_insert_with(|| json!([]));
    row.entry("inherited_tags").or_insert_with(|| json!([]));
    state.next_id += 1;
    state.prefixes.push(row.clone());
    Ok(Value::Object(row))
}

/// First free `/length` inside `parent` not overlapping an existing row.
fn allocate(state: &BackendState, parent: &str, length: u8) -> Result<String, TransportError> {
    let (base, parent_len) = parse_cidr(parent).ok_or_else(|| fault(1200, "bad from-prefix"))?;
    if length < parent_len || length > 32 {
        return Err(fault(1200, "prefix_length outside parent"));
    }
    let step = 1u64 << (32 - length);
    let count = 1u64 << (length - parent_len);
    let taken: Vec<(u32, u8)> = state
        .prefixes
        .iter()
        .filter_map(|p| p["prefix"].as_str().and_then(parse_cidr))
        .filter(|&(_, len)| len > parent_len)
        .collect();

    (0..count)
        .map(|i| ((u64::from(base) + i * step) as u32, length))
        .find(|&candidate| {
            taken
                .iter()
                .all(|&existing| !covers(existing, candidate) && !covers(candidate, existing))
        })
        .map(|(addr, len)| format!("{}/{}", Ipv4Addr::from(addr), len))
        .ok_or_else(|| fault(1200, format!("{parent} is full")))
}

fn remove_prefix(state: &mut BackendState, params: &Value) -> Result<Value, TransportError> {
    let id = params["prefix"]["id"]
        .as_u64()
        .ok_or_else(|| fault(1110, "missing prefix id"))?;
    let target = state
        .prefixes
        .iter()
        .find(|p| p["id"] == id)
        .and_then(|p| p["prefix"].as_str().and_then(parse_cidr))
        .ok_or_else(|| fault(1310, format!("no prefix with id {id}")))?;

    let recursive = params["recursive"].as_bool().unwrap_or(false);
    let is_child = |p: &ResultRecord| {
        p["id"] != id
            && p["prefix"]
                .as_str()
                .and_then(parse_cidr)
                .is_some_and(|c| covers(target, c))
    };
    if !recursive && state.prefixes.iter().any(is_child) {
        return Err(fault(1200, "prefix has children"));
    }
    state.prefixes.retain(|p| p["id"] != id && !is_child(p));
    Ok(Value::Null)
}

fn search_prefix(state: &BackendState, params: &Value) -> Result<Value, TransportError> {
    let query = &params["query"];
    let mut matched = Vec::new();
    for row in &state.prefixes {
        if eval(query, row)? {
            matched.push(row.clone());
        }
    }
    Ok(json!({
        "search_options": effective_options(&params["search_options"]),
        "result": with_parents(state, matched, &params["search_options"]),
    }))
}

fn smart_search_prefix(state: &BackendState, params: &Value) -> Result<Value, TransportError> {
    let query = params["query_string"].as_str().unwrap_or_default();
    if query.matches('"').count() % 2 == 1 {
        return Ok(json!({
            "error": true,
            "error_message": "Unclosed quote.",
            "interpretation": [],
            "search_options": effective_options(&params["search_options"]),
            "result": [],
        }));
    }

    let words: Vec<&str> = query.split_whitespace().collect();
    let interpretation: Vec<Value> = words
        .iter()
        .map(|w| match w.strip_prefix('#') {
            Some(tag) => json!({"string": w, "interpretation": "tag", "attribute": "tag", "operator": "equals_any", "value": tag}),
            None if parse_cidr(w).is_some() => json!({"string": w, "interpretation": "prefix", "attribute": "prefix", "operator": "contains_equals"}),
            None => json!({"string": w, "interpretation": "text", "attribute": "description", "operator": "regex"}),
        })
        .collect();

    let matched: Vec<ResultRecord> = state
        .prefixes
        .iter()
        .filter(|row| words.iter().all(|w| smart_word_matches(w, row)))
        .cloned()
        .collect();

    Ok(json!({
        "interpretation": interpretation,
        "search_options": effective_options(&params["search_options"]),
        "result": with_parents(state, matched, &params["search_options"]),
    }))
}

fn smart_word_matches(word: &str, row: &ResultRecord) -> bool {
    if let Some(tag) = word.strip_prefix('#') {
        return has_member(row.get("tags"), tag) || has_member(row.get("inherited_tags"), tag);
    }
    if let Some(needle) = parse_cidr(word) {
        // a prefix matches when it covers, or equals, the searched range
        return row["prefix"]
            .as_str()
            .and_then(parse_cidr)
            .is_some_and(|p| covers(p, needle));
    }
    row.get("description")
        .and_then(Value::as_str)
        .is_some_and(|d| d.contains(word))
}

// ---------------------------------------------------------------------------
// Wire query evaluation
// ---------------------------------------------------------------------------

fn eval(query: &Value, row: &ResultRecord) -> Result<bool, TransportError> {
    let op = query["operator"]
        .as_str()
        .ok_or_else(|| fault(1130, "missing operator"))?;
    match op {
        "and" => Ok(eval(&query["val1"], row)? && eval(&query["val2"], row)?),
        "or" => Ok(eval(&query["val1"], row)? || eval(&query["val2"], row)?),
        "equals" | "equals_any" | "contains" => {
            let field = query["val1"]
                .as_str()
                .ok_or_else(|| fault(1200, "val1 must be a field name"))?;
            let value = &query["val2"];
            let attr = row.get(field);
            Ok(match op {
                "equals" => attr == Some(value),
                "equals_any" => attr
                    .and_then(Value::as_array)
                    .is_some_and(|items| items.contains(value)),
                _ => contains_value(attr, value),
            })
        }
        other => Err(fault(1130, format!("no such operator {other}"))),
    }
}

fn contains_value(attr: Option<&Value>, value: &Value) -> bool {
    match (attr.and_then(Value::as_str), value.as_str()) {
        (Some(outer), Some(inner)) => match (parse_cidr(outer), parse_cidr(inner)) {
            (Some(o), Some(i)) => o.1 < i.1 && covers(o, i),
            _ => outer.contains(inner),
        },
        _ => false,
    }
}

fn has_member(items: Option<&Value>, needle: &str) -> bool {
    items
        .and_then(Value::as_array)
        .is_some_and(|items| items.iter().any(|i| i == needle))
}

/// Append up to `parents_depth` ancestors of each match, each row once.
fn with_parents(state: &BackendState, matched: Vec<ResultRecord>, options: &Value) -> Vec<ResultRecord> {
    let depth = options["parents_depth"].as_u64().unwrap_or(0) as usize;
    let mut out: Vec<ResultRecord> = Vec::new();
    for row in matched {
        let Some(net) = row["prefix"].as_str().and_then(parse_cidr) else {
            continue;
        };
        let mut ancestors: Vec<&ResultRecord> = state
            .prefixes
            .iter()
            .filter(|p| {
                p["prefix"]
                    .as_str()
                    .and_then(parse_cidr)
                    .is_some_and(|a| a.1 < net.1 && covers(a, net))
            })
            .collect();
        // nearest first
        ancestors.sort_by_key(|p| std::cmp::Reverse(p["prefix"].as_str().and_then(parse_cidr).map(|a| a.1)));
        for parent in ancestors.into_iter().take(depth) {
            if !out.iter().any(|r| r["id"] == parent["id"]) {
                out.push(parent.clone());
            }
        }
        if !out.iter().any(|r| r["id"] == row["id"]) {
            out.push(row);
        }
    }
    out
}

fn effective_options(requested: &Value) -> Value {
    let mut opts = json!({
        "parents_depth": 0,
        "children_depth": 0,
        "include_all_parents": false,
        "include_all_children": false,
        "parent_prefix": null,
        "max_result": DEFAULT_MAX_RESULT,
        "offset": 0,
    });
    if let (Some(out), Some(req)) = (opts.as_object_mut(), requested.as_object()) {
        for (k, v) in req {
            out.insert(k.clone(), v.clone());
        }
    }
    opts
}

// ---------------------------------------------------------------------------
// IPv4 helpers
// ---------------------------------------------------------------------------

/// `"a.b.c.d/len"` (or a bare address, as /32) into `(network, len)`.
pub fn parse_cidr(s: &str) -> Option<(u32, u8)> {
    let (addr, len) = match s.split_once('/') {
        Some((a, l)) => (a, l.parse::<u8>().ok()?),
        None => (s, 32),
    };
    if len > 32 {
        return None;
    }
    let addr = u32::from(addr.parse::<Ipv4Addr>().ok()?);
    Some((addr & mask(len), len))
}

fn mask(len: u8) -> u32 {
    if len == 0 {
        0
    } else {
        u32::MAX << (32 - len)
    }
}

/// `outer` covers `inner` (equal ranges included).
pub fn covers(outer: (u32, u8), inner: (u32, u8)) -> bool {
    outer.1 <= inner.1 && inner.0 & mask(outer.1) == outer.0
}
