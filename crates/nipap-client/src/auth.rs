//! Authentication options sent as the `auth` member of every call.

use serde::Serialize;

pub const DEFAULT_AUTHORITATIVE_SOURCE: &str = "nipap";

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AuthOptions {
    pub authoritative_source: String,
    pub username: String,
    pub password: String,
}

impl AuthOptions {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            authoritative_source: DEFAULT_AUTHORITATIVE_SOURCE.to_string(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.authoritative_source = source.into();
        self
    }
}

impl std::fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthOptions")
            .field("authoritative_source", &self.authoritative_source)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
