//! Storage key constants.

/// Logical storage keys. Each is suffixed with the device fingerprint hash
/// before it reaches a backend.
pub struct StorageKeys;

impl StorageKeys {
    /// Bearer access token
    pub const AUTH_TOKEN: &'static str = "auth_token";

    /// Cached user profile (JSON)
    pub const USER_PROFILE: &'static str = "user_profile";

    /// Namespace a logical key with a fingerprint hash: `<logical-key>_<fingerprint-hash>`.
    pub fn namespaced(logical: &str, fingerprint_hash: &str) -> String {
        format!("{}_{}", logical, fingerprint_hash)
    }
}
