//! Query assembly for the `nipap query` command.
//!
//! Flags are turned into leaf predicates in a fixed order (equals, equals-any,
//! contains, tags) and combined with `and`, or with `or` when `--any` is
//! given. The combination is balanced, so the order of predicates is kept and
//! any number of flags stays well within the compiler's depth limit.

use clap::Args;
use serde::Serialize;

use nipap_query::{
    and_all, compile, contains, equals, equals_any, or, or_any, Expression, SearchOptions, Value,
    WireObject,
};

#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    /// `field=value` that must match exactly. Repeatable.
    #[arg(long = "equals", value_name = "FIELD=VALUE")]
    pub equals: Vec<String>,
    /// `field=value` where value must be a member of the multi-valued field.
    #[arg(long = "equals-any", value_name = "FIELD=VALUE")]
    pub equals_any: Vec<String>,
    /// `field=value` where field must contain value (e.g. a covering prefix).
    #[arg(long = "contains", value_name = "FIELD=VALUE")]
    pub contains: Vec<String>,
    /// Match a tag either set directly or inherited from a parent.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    /// Combine predicates with `or` instead of `and`.
    #[arg(long)]
    pub any: bool,
    /// Ancestor levels to include; defaults to the config value.
    #[arg(long)]
    pub parents_depth: Option<u32>,
}

/// What `nipap query` prints: the params a `search_prefix` call would carry,
/// minus credentials.
#[derive(Debug, Serialize)]
pub struct RenderedQuery {
    pub query: WireObject,
    pub search_options: SearchOptions,
}

/// Build the combined expression from the flags.
pub fn build_expression(args: &QueryArgs) -> anyhow::Result<Expression> {
    let mut leaves = Vec::new();
    for pair in &args.equals {
        let (field, value) = split_pair(pair)?;
        leaves.push(equals(field, value)?);
    }
    for pair in &args.equals_any {
        let (field, value) = split_pair(pair)?;
        leaves.push(equals_any(field, value)?);
    }
    for pair in &args.contains {
        let (field, value) = split_pair(pair)?;
        leaves.push(contains(field, value)?);
    }
    for tag in &args.tags {
        leaves.push(tag_expression(tag)?);
    }

    let combined = if args.any { or_any(leaves) } else { and_all(leaves) };
    combined.ok_or_else(|| anyhow::anyhow!("no predicates given; use --equals, --equals-any, --contains or --tag"))
}

/// `tag` set on the prefix itself or inherited from a parent.
pub fn tag_expression(tag: &str) -> Result<Expression, nipap_query::QueryError> {
    Ok(or(equals_any("tags", tag)?, equals_any("inherited_tags", tag)?))
}

pub fn render(args: &QueryArgs, defaults: SearchOptions) -> anyhow::Result<RenderedQuery> {
    let expr = build_expression(args)?;
    tracing::debug!(%expr, "assembled query");
    let mut search_options = defaults;
    if let Some(depth) = args.parents_depth {
        search_options.parents_depth = depth;
    }
    Ok(RenderedQuery {
        query: compile(&expr)?,
        search_options,
    })
}

fn split_pair(pair: &str) -> anyhow::Result<(&str, Value)> {
    let (field, raw) = pair
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected FIELD=VALUE, got {pair:?}"))?;
    Ok((field, parse_value(raw)))
}

/// Integers and `true`/`false` are sent typed, everything else as a string.
///
/// Only the canonical spelling of an integer counts: `"007"` or `"+5"` would
/// lose characters as a number, so they stay strings.
pub fn parse_value(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        if i.to_string() == raw {
            return Value::Int(i);
        }
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Str(raw.to_string()),
    }
}
