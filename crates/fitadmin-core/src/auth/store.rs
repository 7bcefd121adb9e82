//! Credential persistence.

use std::sync::{Mutex, PoisonError};

use super::{AuthError, AuthResult};

/// Where the bearer token lives between sessions.
pub trait CredentialStore: Send + Sync {
    fn load_token(&self) -> AuthResult<Option<String>>;
    fn save_token(&self, token: &str) -> AuthResult<()>;
    fn clear_token(&self) -> AuthResult<()>;
}

/// Process-local store, used for tests and `--token` sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load_token(&self) -> AuthResult<Option<String>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save_token(&self, token: &str) -> AuthResult<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> AuthResult<()> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

/// A preferred store backed by a fallback.
///
/// Reads try the preferred store first. Saves go to the preferred store and
/// only fall back when it fails. Clearing always clears both.
pub struct ChainedCredentialStore<P, F> {
    preferred: P,
    fallback: F,
}

impl<P: CredentialStore, F: CredentialStore> ChainedCredentialStore<P, F> {
    pub const fn new(preferred: P, fallback: F) -> Self {
        Self {
            preferred,
            fallback,
        }
    }
}

impl<P: CredentialStore, F: CredentialStore> CredentialStore for ChainedCredentialStore<P, F> {
    fn load_token(&self) -> AuthResult<Option<String>> {
        match self.preferred.load_token() {
            Ok(Some(token)) => return Ok(Some(token)),
            Ok(None) => {}
            Err(error) => tracing::warn!("Preferred credential store unavailable: {}", error),
        }
        self.fallback.load_token()
    }

    fn save_token(&self, token: &str) -> AuthResult<()> {
        match self.preferred.save_token(token) {
            Ok(()) => Ok(()),
            Err(error) => {
                tracing::warn!(
                    "Preferred credential store rejected token, using fallback: {}",
                    error
                );
                self.fallback.save_token(token)
            }
        }
    }

    fn clear_token(&self) -> AuthResult<()> {
        let preferred = self.preferred.clear_token();
        let fallback = self.fallback.clear_token();
        match (preferred, fallback) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(error), Ok(())) | (Ok(()), Err(error)) => Err(error),
            (Err(first), Err(second)) => Err(AuthError::Storage(format!("{first}; {second}"))),
        }
    }
}
