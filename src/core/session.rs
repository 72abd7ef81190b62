use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

/// Authenticated browsing context for one user.
#[derive(Debug, Clone)]
pub struct AuthenticatedContext {
    pub username: String,
    pub base_url: Url,
    pub cookies: Vec<SessionCookie>,
}

/// Source of authenticated contexts, keyed by username.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn context_for(&self, username: &str) -> Result<AuthenticatedContext>;
}
