//! Credential persistence for the FinWatch dashboard client.
//!
//! This crate provides:
//! - A `KeyValueStorage` abstraction with in-memory and file-backed implementations
//! - A best-effort device fingerprint used to namespace storage keys
//! - `CredentialStore`, which keeps the bearer token and cached user profile
//!   obfuscated at rest and fails soft on corrupt or foreign data
//!
//! The obfuscation is a reversible XOR transform. It keeps tokens from being
//! readable at a glance; it is not encryption.

mod credentials;
mod file;
mod fingerprint;
mod keys;
mod memory;
mod obfuscate;
mod traits;

pub use credentials::CredentialStore;
pub use file::FileStorage;
pub use fingerprint::{DeviceFingerprint, DeviceTraits};
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::KeyValueStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend could not be read or written
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
