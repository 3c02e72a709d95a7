//! Bearer token and user profile persistence.

use crate::obfuscate::{conceal, reveal};
use crate::{DeviceFingerprint, KeyValueStorage, StorageKeys};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Fingerprint-namespaced, obfuscated store for the session credential.
///
/// Every operation fails soft: backend and decoding errors are logged and
/// surface as "nothing stored", so callers degrade to unauthenticated
/// instead of failing.
pub struct CredentialStore {
    storage: Box<dyn KeyValueStorage>,
    fingerprint: DeviceFingerprint,
}

impl CredentialStore {
    pub fn new(storage: Box<dyn KeyValueStorage>, fingerprint: DeviceFingerprint) -> Self {
        Self {
            storage,
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> &DeviceFingerprint {
        &self.fingerprint
    }

    fn key(&self, logical: &str) -> String {
        StorageKeys::namespaced(logical, self.fingerprint.hash())
    }

    fn write(&self, logical: &str, plaintext: &str) {
        let key = self.key(logical);
        if let Err(e) = self.storage.set(&key, &conceal(&self.fingerprint, plaintext)) {
            warn!(key = %key, error = %e, "Failed to persist credential entry");
        }
    }

    fn read(&self, logical: &str) -> Option<String> {
        let key = self.key(logical);
        let stored = match self.storage.get(&key) {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read credential entry");
                return None;
            }
        };

        match reveal(&self.fingerprint, &stored) {
            Ok(plaintext) => Some(plaintext),
            Err(e) => {
                debug!(key = %key, error = %e, "Ignoring unreadable credential entry");
                None
            }
        }
    }

    /// Persist the bearer token.
    pub fn save(&self, token: &str) {
        self.write(StorageKeys::AUTH_TOKEN, token);
    }

    /// Load the bearer token, or `None` if absent or unreadable.
    pub fn load(&self) -> Option<String> {
        self.read(StorageKeys::AUTH_TOKEN)
    }

    /// Cache the user profile.
    pub fn save_profile<T: Serialize>(&self, profile: &T) {
        match serde_json::to_string(profile) {
            Ok(json) => self.write(StorageKeys::USER_PROFILE, &json),
            Err(e) => warn!(error = %e, "Failed to serialize user profile"),
        }
    }

    /// Load the cached user profile, or `None` if absent or unreadable.
    pub fn load_profile<T: DeserializeOwned>(&self) -> Option<T> {
        let json = self.read(StorageKeys::USER_PROFILE)?;
        match serde_json::from_str(&json) {
            Ok(profile) => Some(profile),
            Err(e) => {
                debug!(error = %e, "Ignoring cached profile with unexpected shape");
                None
            }
        }
    }

    /// Remove the token and cached profile.
    pub fn clear(&self) {
        for logical in [StorageKeys::AUTH_TOKEN, StorageKeys::USER_PROFILE] {
            let key = self.key(logical);
            if let Err(e) = self.storage.delete(&key) {
                warn!(key = %key, error = %e, "Failed to delete credential entry");
            }
        }
        debug!("Credentials cleared");
    }
}
