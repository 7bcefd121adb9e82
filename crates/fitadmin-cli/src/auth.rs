//! Admin token persistence: OS keychain first, session file as fallback.

#[cfg(test)]
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use fitadmin_core::auth::{
    AuthContext, AuthError, AuthResult, ChainedCredentialStore, CredentialStore,
};

use crate::config_profiles::config_dir;
use crate::error::CliError;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "fitadmin-cli";

/// Token slot in the OS keychain, one per profile
#[derive(Clone)]
pub struct KeyringStore {
    username: String,
}

impl KeyringStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("admin_token:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::Storage(error.to_string()))
    }
}

impl CredentialStore for KeyringStore {
    #[cfg(not(test))]
    fn load_token(&self) -> AuthResult<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::Storage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_token(&self) -> AuthResult<Option<String>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::Storage(error.to_string()))?;
        Ok(guard.get(&self.username).cloned())
    }

    #[cfg(not(test))]
    fn save_token(&self, token: &str) -> AuthResult<()> {
        self.entry()?
            .set_password(token)
            .map_err(|error| AuthError::Storage(error.to_string()))
    }

    #[cfg(test)]
    fn save_token(&self, token: &str) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::Storage(error.to_string()))?;
        guard.insert(self.username.clone(), token.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_token(&self) -> AuthResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::Storage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_token(&self) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::Storage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

/// Plain-file token store for machines without a usable keychain
#[derive(Clone)]
pub struct SessionFileStore {
    path: PathBuf,
}

impl SessionFileStore {
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_profile(profile_name: &str) -> Result<Self, CliError> {
        let dir = config_dir().map_err(CliError::Config)?;
        Ok(Self::new(dir.join("sessions").join(format!("{profile_name}.token"))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for SessionFileStore {
    fn load_token(&self) -> AuthResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(fitadmin_core::util::normalize_text_option(Some(raw))),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AuthError::Storage(error.to_string())),
        }
    }

    fn save_token(&self, token: &str) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| AuthError::Storage(error.to_string()))?;
        }
        std::fs::write(&self.path, token).map_err(|error| AuthError::Storage(error.to_string()))?;
        restrict_permissions(&self.path)
    }

    fn clear_token(&self) -> AuthResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AuthError::Storage(error.to_string())),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> AuthResult<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|error| AuthError::Storage(error.to_string()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> AuthResult<()> {
    Ok(())
}

pub fn credential_store(profile_name: &str) -> Result<Arc<dyn CredentialStore>, CliError> {
    Ok(Arc::new(ChainedCredentialStore::new(
        KeyringStore::new(profile_name),
        SessionFileStore::for_profile(profile_name)?,
    )))
}

/// The profile's auth context, holding whatever token was stored.
pub fn restore_auth(profile_name: &str) -> Result<AuthContext, CliError> {
    Ok(AuthContext::restore(credential_store(profile_name)?)?)
}
