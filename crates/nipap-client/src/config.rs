//! Configuration types for the NIPAP client.
//!
//! [`Config::load`] reads `~/.config/nipap/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist. [`Config::load_from`] reads
//! an explicit file, which must exist and is always parsed as TOML whatever
//! its extension (`nipap.conf` works too). `NIPAP_*` environment
//! variables override file values (`NIPAP_CONNECTION__URL`,
//! `NIPAP_SEARCH__PARENTS_DEPTH`, ...). [`Config::defaults`] returns the
//! built-in defaults without touching the filesystem or the environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use nipap_query::SearchOptions;

use crate::auth::{AuthOptions, DEFAULT_AUTHORITATIVE_SOURCE};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[connection]
url                  = "http://localhost:1337/RPC2"
username             = "guest@local"
password             = ""
authoritative_source = "nipap"

[search]
parents_depth = 0
# children_depth       = 0
# include_all_parents  = false
# include_all_children = false
# max_result           = 50
# offset               = 0
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level client configuration, loaded from `~/.config/nipap/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[connection]` section of `config.toml`.
#[derive(Clone, Deserialize)]
pub struct ConnectionConfig {
    /// XML-RPC endpoint of the backend, e.g. `http://localhost:1337/RPC2`.
    ///
    /// The client itself never dials out; this is the address handed to
    /// whichever [`RpcTransport`](crate::RpcTransport) the caller constructs
    /// before calling [`Client::from_config`](crate::Client::from_config).
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_authoritative_source")]
    pub authoritative_source: String,
}

fn default_url() -> String { "http://localhost:1337/RPC2".to_string() }
fn default_username() -> String { "guest@local".to_string() }
fn default_authoritative_source() -> String { DEFAULT_AUTHORITATIVE_SOURCE.to_string() }

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_username(),
            password: String::new(),
            authoritative_source: default_authoritative_source(),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("authoritative_source", &self.authoritative_source)
            .finish_non_exhaustive()
    }
}

impl ConnectionConfig {
    pub fn auth(&self) -> AuthOptions {
        AuthOptions::new(&self.username, &self.password).with_source(&self.authoritative_source)
    }
}

/// `[search]` section of `config.toml`: default options for structured and
/// smart searches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub parents_depth: u32,
    #[serde(default)]
    pub children_depth: Option<u32>,
    #[serde(default)]
    pub include_all_parents: Option<bool>,
    #[serde(default)]
    pub include_all_children: Option<bool>,
    #[serde(default)]
    pub max_result: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl SearchConfig {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            parents_depth: self.parents_depth,
            children_depth: self.children_depth,
            include_all_parents: self.include_all_parents,
            include_all_children: self.include_all_children,
            parent_prefix: None,
            max_result: self.max_result,
            offset: self.offset,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/nipap/config.toml`, layered on top of the built-in
    /// defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
            tracing::info!(path = %path.display(), "wrote default nipap config");
        }

        Self::load_from(&path)
    }

    /// Load from an explicit TOML file, layered on top of the built-in
    /// defaults and under `NIPAP_*` environment overrides. A missing file is
    /// an error.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.is_file() {
            anyhow::bail!("config file {} does not exist", path.display());
        }
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            )
            .add_source(
                config::Environment::with_prefix("NIPAP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("nipap")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
