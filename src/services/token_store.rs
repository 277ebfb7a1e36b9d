//! Access token persistence.
//!
//! The OAuth access token lives under one fixed key in a durable key-value
//! store shared by the whole page. Two backends are provided: an in-memory
//! map (tests, headless hosts) and the OS keychain (Keychain on macOS,
//! Credential Manager on Windows, Secret Service on Linux).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use keyring::Entry;

use crate::error::AppError;

/// Key the access token is stored under.
pub const TOKEN_KEY: &str = "beblobAccessToken";

/// Service name used in the keychain.
const SERVICE_NAME: &str = "beblob";

/// Durable key-value persistence provided by the host.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Process-local store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::credential_storage("Memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// OS keychain store.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringStore;

impl KeyringStore {
    /// Create a keyring entry for the given key.
    fn get_entry(key: &str) -> Result<Entry, AppError> {
        Entry::new(SERVICE_NAME, key).map_err(|e| {
            AppError::credential_storage(format!("Failed to create keyring entry: {}", e))
        })
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match Self::get_entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::credential_storage(format!(
                "Failed to retrieve token: {}",
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        Self::get_entry(key)?
            .set_password(value)
            .map_err(|e| AppError::credential_storage(format!("Failed to store token: {}", e)))
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        match Self::get_entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Idempotent: already deleted
            Err(e) => Err(AppError::credential_storage(format!(
                "Failed to delete token: {}",
                e
            ))),
        }
    }
}

/// Read/write/clear access to the persisted access token.
///
/// No expiry is tracked here: an expired token is discovered when the API
/// answers 401, at which point the caller clears it.
pub struct TokenStore {
    backend: Box<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// The stored token, if any. Empty values count as absent.
    pub fn get(&self) -> Result<Option<String>, AppError> {
        Ok(self
            .backend
            .get(TOKEN_KEY)?
            .filter(|token| !token.is_empty()))
    }

    /// Replace the stored token.
    pub fn set(&self, token: &str) -> Result<(), AppError> {
        self.backend.set(TOKEN_KEY, token)
    }

    /// Forget the stored token. Safe to call repeatedly.
    pub fn clear(&self) -> Result<(), AppError> {
        self.backend.remove(TOKEN_KEY)
    }

    /// Whether a token is currently stored.
    pub fn has_token(&self) -> bool {
        matches!(self.get(), Ok(Some(_)))
    }

    /// Clear the token when `err` reports it as rejected by the server.
    ///
    /// Returns `err` unchanged so it can be used inside `map_err`.
    pub fn invalidate_on(&self, err: AppError) -> AppError {
        if err.is_unauthorized() {
            log::warn!("GitLab rejected the access token; clearing it");
            if let Err(e) = self.clear() {
                log::error!("Failed to clear rejected token: {}", e);
            }
        }
        err
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.has_token())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_overwrite() {
        let store = TokenStore::new(MemoryStore::new());
        assert_eq!(store.get().unwrap(), None);

        store.set("first").unwrap();
        store.set("second").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_clear_twice_is_safe() {
        let store = TokenStore::new(MemoryStore::new());
        store.set("token").unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
        assert!(!store.has_token());
    }

    #[test]
    fn test_backend_is_shared_between_clones() {
        let backend = MemoryStore::new();
        let store = TokenStore::new(backend.clone());
        store.set("shared").unwrap();

        assert_eq!(backend.get(TOKEN_KEY).unwrap().as_deref(), Some("shared"));
        assert_eq!(TokenStore::new(backend).get().unwrap().as_deref(), Some("shared"));
    }

    #[test]
    fn test_empty_value_reads_as_absent() {
        let backend = MemoryStore::new();
        backend.set(TOKEN_KEY, "").unwrap();
        assert_eq!(TokenStore::new(backend).get().unwrap(), None);
    }

    #[test]
    fn test_invalidate_only_on_unauthorized() {
        let store = TokenStore::new(MemoryStore::new());
        store.set("token").unwrap();

        let err = store.invalidate_on(AppError::network("offline"));
        assert!(matches!(err, AppError::Network { .. }));
        assert!(store.has_token());

        let err = store.invalidate_on(AppError::unauthorized("expired"));
        assert!(err.is_unauthorized());
        assert!(!store.has_token());
    }

    // Note: keychain-backed storage needs a real or test keychain; it is
    // exercised manually rather than in unit tests.
}
