//! Environment files: the base address of a deployment plus the session
//! cookies of the users tests may act as.

use crate::core::{AuthenticatedContext, SessionCookie, SessionProvider};
use crate::errors::{EngineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub cookies: Vec<SessionCookie>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub users: Vec<UserSession>,
}

impl EnvironmentConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let environment: EnvironmentConfig = serde_json::from_str(raw)?;
        environment.validate()?;
        Ok(environment)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::config(format!(
                "cannot read environment file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&raw).map_err(|e| {
            EngineError::config(format!("environment file '{}': {}", path.display(), e.detail()))
        })
    }

    /// Load `<name>.json` from `dir`, matching the file stem without regard to case.
    pub fn discover(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let path = Self::locate(dir, name)?;
        debug!("Loading environment '{}' from {}", name, path.display());
        Self::from_file(path)
    }

    fn locate(dir: &Path, name: &str) -> Result<PathBuf> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            EngineError::config(format!(
                "cannot list environment directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let mut matches = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            let stem_matches = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| stem.eq_ignore_ascii_case(name));
            if is_json && stem_matches && path.is_file() {
                matches.push(path);
            }
        }

        match matches.len() {
            0 => Err(EngineError::config(format!(
                "no environment file named '{}.json' in '{}'",
                name,
                dir.display()
            ))),
            1 => Ok(matches.remove(0)),
            n => Err(EngineError::config(format!(
                "{} environment files match '{}' in '{}'",
                n,
                name,
                dir.display()
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::config("'name' must not be blank"));
        }
        if self.base_url.trim().is_empty() {
            return Err(EngineError::config(format!(
                "environment '{}': 'baseUrl' must not be blank",
                self.name
            )));
        }
        self.parsed_base_url()?;
        if self.users.is_empty() {
            return Err(EngineError::config(format!(
                "environment '{}': 'users' must list at least one user",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for (index, user) in self.users.iter().enumerate() {
            if user.username.trim().is_empty() {
                return Err(EngineError::config(format!(
                    "environment '{}': users[{}].username must not be blank",
                    self.name, index
                )));
            }
            if !seen.insert(user.username.to_lowercase()) {
                return Err(EngineError::config(format!(
                    "environment '{}': users[{}] repeats username '{}'",
                    self.name, index, user.username
                )));
            }
        }
        Ok(())
    }

    pub fn parsed_base_url(&self) -> Result<Url> {
        Url::parse(self.base_url.trim()).map_err(|e| {
            EngineError::config(format!(
                "environment '{}': 'baseUrl' is not a valid URL: {}",
                self.name, e
            ))
        })
    }

    pub fn user(&self, username: &str) -> Option<&UserSession> {
        self.users
            .iter()
            .find(|user| user.username.eq_ignore_ascii_case(username))
    }

    pub fn context(&self, username: &str) -> Result<AuthenticatedContext> {
        let user = self.user(username).ok_or_else(|| {
            EngineError::config(format!(
                "environment '{}' has no user '{}'",
                self.name, username
            ))
        })?;
        Ok(AuthenticatedContext {
            username: user.username.clone(),
            base_url: self.parsed_base_url()?,
            cookies: user.cookies.clone(),
        })
    }
}

#[async_trait]
impl SessionProvider for EnvironmentConfig {
    async fn context_for(&self, username: &str) -> Result<AuthenticatedContext> {
        self.context(username)
    }
}
