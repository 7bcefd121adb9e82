//! Admin authentication: token expiry, credential storage and the session
//! auth context handed to the backend client.

mod client;
mod store;
mod token;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

pub use client::{AdminAuthClient, LOGIN_PATH};
pub use store::{ChainedCredentialStore, CredentialStore, MemoryCredentialStore};
pub use token::{is_token_expired, is_token_expired_at, token_expiry};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not signed in")]
    MissingToken,
    #[error("Session expired, sign in again")]
    Expired,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Login failed: {0}")]
    Api(String),
    #[error("Credential storage error: {0}")]
    Storage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// The one auth object of a console session.
///
/// Created at session start from a credential store, handed to the backend
/// client, and invalidated on logout, expiry or a 401 response. Clones
/// share the same state.
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<AuthState>,
}

struct AuthState {
    token: Mutex<Option<String>>,
    store: Arc<dyn CredentialStore>,
}

impl AuthContext {
    /// A signed-out context over `store`.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner: Arc::new(AuthState {
                token: Mutex::new(None),
                store,
            }),
        }
    }

    /// Load the persisted token, if any.
    pub fn restore(store: Arc<dyn CredentialStore>) -> AuthResult<Self> {
        let token = store.load_token()?;
        let context = Self::new(store);
        *context.lock() = crate::util::normalize_text_option(token);
        Ok(context)
    }

    /// A context holding `token` in memory only.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let context = Self::new(Arc::new(MemoryCredentialStore::new()));
        *context.lock() = Some(token.into());
        context
    }

    /// Store a freshly issued token and make it current.
    pub fn establish(&self, token: impl Into<String>) -> AuthResult<()> {
        let token = token.into();
        self.inner.store.save_token(&token)?;
        *self.lock() = Some(token);
        Ok(())
    }

    /// Whether a non-expired token is present. Never clears anything.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock()
            .as_deref()
            .is_some_and(|token| !is_token_expired(token))
    }

    /// The token to attach to the next request.
    ///
    /// A missing or expired token invalidates the session before any request
    /// is built.
    pub fn bearer_token(&self) -> AuthResult<String> {
        let current = self.lock().clone();
        match current {
            None => {
                self.invalidate();
                Err(AuthError::MissingToken)
            }
            Some(token) if is_token_expired(&token) => {
                tracing::info!("Stored admin token has expired");
                self.invalidate();
                Err(AuthError::Expired)
            }
            Some(token) => Ok(token),
        }
    }

    /// Drop the token from memory and from the credential store.
    pub fn invalidate(&self) {
        self.lock().take();
        if let Err(error) = self.inner.store.clear_token() {
            tracing::warn!("Failed to clear stored credentials: {}", error);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.lock().is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        formatter
            .debug_struct("AuthContext")
            .field("token", &token)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fresh_token, stale_token};

    #[test]
    fn restore_reads_persisted_token() {
        let token = fresh_token();
        let store = Arc::new(MemoryCredentialStore::with_token(token.clone()));
        let auth = AuthContext::restore(store).unwrap();
        assert!(auth.is_authenticated());
        assert_eq!(auth.bearer_token().unwrap(), token);
    }

    #[test]
    fn expired_token_is_cleared_from_store() {
        let store = Arc::new(MemoryCredentialStore::with_token(stale_token()));
        let auth = AuthContext::restore(store.clone()).unwrap();
        assert!(!auth.is_authenticated());
        assert!(matches!(auth.bearer_token(), Err(AuthError::Expired)));
        assert_eq!(store.load_token().unwrap(), None);
    }

    #[test]
    fn missing_token_is_unauthenticated() {
        let auth = AuthContext::new(Arc::new(MemoryCredentialStore::new()));
        assert!(matches!(auth.bearer_token(), Err(AuthError::MissingToken)));
    }

    #[test]
    fn establish_persists_and_invalidate_clears() {
        let store = Arc::new(MemoryCredentialStore::new());
        let auth = AuthContext::new(store.clone());
        auth.establish(fresh_token()).unwrap();
        assert!(store.load_token().unwrap().is_some());

        let clone = auth.clone();
        clone.invalidate();
        assert!(!auth.is_authenticated());
        assert_eq!(store.load_token().unwrap(), None);
    }

    #[test]
    fn debug_redacts_token() {
        let auth = AuthContext::with_token("secret-admin-token");
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("secret-admin-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
