// Session credential persistence
//
// Exactly one secure-storage entry exists: the opaque session token, keyed
// by a fixed service identifier. One attempt per call, no retry -- callers
// decide whether a failure is fatal.

use std::sync::Mutex;

use crate::error::StoreError;

/// Default keyring service identifier.
pub const DEFAULT_SERVICE: &str = "amicale";

/// Key under which the session token is stored.
const TOKEN_KEY: &str = "session-token";

/// Persistence for the single session credential.
pub trait CredentialStore: Send + Sync {
    /// Read the stored token. `Ok(None)` when no credential is stored.
    fn get(&self) -> Result<Option<String>, StoreError>;

    /// Persist the token, replacing any previous value.
    fn set(&self, token: &str) -> Result<(), StoreError>;

    /// Remove the stored token. Clearing an absent credential succeeds.
    fn clear(&self) -> Result<(), StoreError>;
}

/// OS-backed store using the platform keyring.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(&self.service, TOKEN_KEY)
            .map_err(|e| StoreError::Retrieve(e.to_string()))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::Retrieve(e.to_string())),
        }
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        let entry = keyring::Entry::new(&self.service, TOKEN_KEY)
            .map_err(|e| StoreError::Save(e.to_string()))?;
        entry
            .set_password(token)
            .map_err(|e| StoreError::Save(e.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let entry = keyring::Entry::new(&self.service, TOKEN_KEY)
            .map_err(|e| StoreError::Clear(e.to_string()))?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::Clear(e.to_string())),
        }
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    token: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.token.lock().expect("store lock poisoned").clone())
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        *self.token.lock().expect("store lock poisoned") = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.token.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}
