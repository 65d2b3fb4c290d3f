//! Client configuration and the service's endpoint map.

use std::borrow::Cow;
use std::env;

/// Production host of the task service.
pub const DEFAULT_BASE_URL: &str = "https://sm-prod2.any.do";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "ANYDO_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read `ANYDO_BASE_URL`, falling back to the production host.
    pub fn from_env() -> Self {
        match env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            base: self.base_url.clone(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Absolute URLs of every resource the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

/// Percent-encode `id` as exactly one path segment. Dot segments are
/// encoded too so they cannot climb out of the collection path.
fn segment(id: &str) -> Cow<'_, str> {
    match id {
        "." => Cow::Borrowed("%2E"),
        ".." => Cow::Borrowed("%2E%2E"),
        _ => urlencoding::encode(id),
    }
}

impl Endpoints {
    pub fn login(&self) -> String {
        format!("{}/login", self.base)
    }

    pub fn me(&self) -> String {
        format!("{}/me", self.base)
    }

    pub fn user(&self) -> String {
        format!("{}/user", self.base)
    }

    pub fn tasks(&self) -> String {
        format!("{}/me/tasks", self.base)
    }

    pub fn task(&self, id: &str) -> String {
        format!("{}/me/tasks/{}", self.base, segment(id))
    }

    pub fn categories(&self) -> String {
        format!("{}/me/categories", self.base)
    }

    pub fn category(&self, id: &str) -> String {
        format!("{}/me/categories/{}", self.base, segment(id))
    }

    pub fn pending(&self) -> String {
        format!("{}/me/pending", self.base)
    }

    pub fn accept_pending(&self, id: &str) -> String {
        format!("{}/me/pending/{}/accept", self.base, segment(id))
    }
}
