//! Persisted sign-in session.
//!
//! The session file holds the current user, the bearer token issued with it
//! and the preferred locale. A missing file is an empty session. Auth calls
//! go through `AuthBackend`; anonymous sign-in never touches the network.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use frames::{AuthSession, User};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::net::api::{ApiError, AuthBackend};
use crate::util::i18n::Locale;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub locale: Option<Locale>,
    /// Alert ids the user has hidden; reapplied after every fetch.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dismissed_alerts: BTreeSet<String>,
}

impl Session {
    /// Read the session at `path`; a missing file yields the empty session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no session file");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the session to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on serialization or I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Remove the session file. Removing a missing file succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] for any other I/O failure.
    pub fn clear(path: &Path) -> Result<(), SessionError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn apply_auth(&mut self, auth: AuthSession) {
        self.user = Some(auth.user);
        self.token = auth.token;
    }

    /// # Errors
    ///
    /// Propagates backend failures; the session is unchanged on error.
    pub async fn login(&mut self, backend: &dyn AuthBackend, email: &str, password: &str) -> Result<&User, ApiError> {
        let auth = backend.login(email, password).await?;
        info!(user_id = %auth.user.id, "logged in");
        self.apply_auth(auth);
        self.user.as_ref().ok_or(ApiError::Unauthenticated)
    }

    /// # Errors
    ///
    /// Propagates backend failures; the session is unchanged on error.
    pub async fn register(
        &mut self,
        backend: &dyn AuthBackend,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<&User, ApiError> {
        let auth = backend.register(email, password, name).await?;
        info!(user_id = %auth.user.id, "registered");
        self.apply_auth(auth);
        self.user.as_ref().ok_or(ApiError::Unauthenticated)
    }

    /// Refresh the user from `GET /api/auth/me`, keeping the token.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn refresh_user(&mut self, backend: &dyn AuthBackend) -> Result<&User, ApiError> {
        let user = backend.me().await?;
        self.user = Some(user);
        self.user.as_ref().ok_or(ApiError::Unauthenticated)
    }

    /// Sign in as a local anonymous user.
    pub fn login_anonymous(&mut self, name: Option<&str>, now_ms: i64) -> &User {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| format!("Anonyme_{}", rand::rng().random_range(0..10_000)), str::to_owned);
        let user = User {
            id: format!("anon-{now_ms}"),
            email: String::new(),
            name,
            is_anonymous: true,
            created_at: now_ms,
        };
        info!(user_id = %user.id, "anonymous session started");
        self.token = None;
        self.user.insert(user)
    }

    /// Forget the user and token. The locale preference survives.
    pub fn logout(&mut self) {
        self.user = None;
        self.token = None;
    }
}
