//! Best-effort device fingerprint.
//!
//! The fingerprint namespaces storage keys and keys the obfuscation
//! transform. It is derived from environment traits that are stable for a
//! given user on a given machine; it is not an identity or a secret.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Number of digest bytes rendered into the fingerprint hash.
const HASH_BYTES: usize = 8;

/// Device characteristics the fingerprint is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTraits {
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub screen: String,
    pub timezone: String,
}

impl DeviceTraits {
    /// Collect traits from the current process environment.
    pub fn detect() -> Self {
        Self::from_env(|name| std::env::var(name).ok(), system_zone)
    }

    /// Traits must not change across DST switches or terminal resizes or
    /// upgrades: a new fingerprint orphans the stored session. The zone is a
    /// name, never an offset.
    fn from_env(
        lookup: impl Fn(&str) -> Option<String>,
        system_zone: impl FnOnce() -> Option<String>,
    ) -> Self {
        let env = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let language = env("LC_ALL")
            .or_else(|| env("LANG"))
            .unwrap_or_else(|| "en-US".to_string());

        // POSIX allows a leading ':' on TZ values that name a zoneinfo file.
        let timezone = env("TZ")
            .map(|tz| tz.trim_start_matches(':').to_string())
            .or_else(system_zone)
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            user_agent: "finwatch-cli".to_string(),
            language,
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            screen: "terminal".to_string(),
            timezone,
        }
    }

    fn canonical(&self) -> String {
        [
            self.user_agent.as_str(),
            self.language.as_str(),
            self.platform.as_str(),
            self.screen.as_str(),
            self.timezone.as_str(),
        ]
        .join("|")
    }
}

/// IANA name of the system zone, from the `/etc/localtime` link target or
/// `/etc/timezone`.
fn system_zone() -> Option<String> {
    std::fs::read_link("/etc/localtime")
        .ok()
        .and_then(|target| zone_from_localtime(&target))
        .or_else(|| {
            std::fs::read_to_string("/etc/timezone")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

fn zone_from_localtime(target: &Path) -> Option<String> {
    let target = target.to_str()?;
    let (_, zone) = target.split_once("zoneinfo/")?;
    (!zone.is_empty()).then(|| zone.to_string())
}

/// Hash of a set of `DeviceTraits`, plus the key material derived from it.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceFingerprint {
    hash: String,
    key: [u8; 32],
}

impl DeviceFingerprint {
    pub fn from_traits(traits: &DeviceTraits) -> Self {
        let digest: [u8; 32] = Sha256::digest(traits.canonical().as_bytes()).into();
        let hash = digest[..HASH_BYTES]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();

        Self { hash, key: digest }
    }

    /// Fingerprint of the current device.
    pub fn detect() -> Self {
        Self::from_traits(&DeviceTraits::detect())
    }

    /// Short hex hash used as the storage key suffix.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub(crate) fn key(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for DeviceFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceFingerprint")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits(user_agent: &str) -> DeviceTraits {
        DeviceTraits {
            user_agent: user_agent.to_string(),
            language: "en-US".to_string(),
            platform: "linux-x86_64".to_string(),
            screen: "1920x1080".to_string(),
            timezone: "Europe/Oslo".to_string(),
        }
    }

    #[test]
    fn test_same_traits_same_fingerprint() {
        let a = DeviceFingerprint::from_traits(&traits("browser/1"));
        let b = DeviceFingerprint::from_traits(&traits("browser/1"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_trait_change_changes_hash() {
        let base = DeviceFingerprint::from_traits(&traits("browser/1"));
        let mut other = traits("browser/1");
        other.timezone = "UTC".to_string();

        assert_ne!(base.hash(), DeviceFingerprint::from_traits(&other).hash());
        assert_ne!(
            base.hash(),
            DeviceFingerprint::from_traits(&traits("browser/2")).hash()
        );
    }

    #[test]
    fn test_hash_is_short_lowercase_hex() {
        let fp = DeviceFingerprint::from_traits(&traits("browser/1"));
        assert_eq!(fp.hash().len(), HASH_BYTES * 2);
        assert!(fp
            .hash()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_debug_does_not_print_key() {
        let fp = DeviceFingerprint::from_traits(&traits("browser/1"));
        let rendered = format!("{:?}", fp);
        assert!(rendered.contains(fp.hash()));
        assert!(!rendered.contains("key"));
    }

    #[test]
    fn test_detect_is_stable_within_process() {
        assert_eq!(DeviceFingerprint::detect(), DeviceFingerprint::detect());
    }

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_timezone_is_a_zone_name_not_an_offset() {
        let detected = DeviceTraits::from_env(vars(&[("LANG", "nb_NO.UTF-8")]), || {
            Some("Europe/Oslo".to_string())
        });
        assert_eq!(detected.timezone, "Europe/Oslo");
        assert_eq!(detected.language, "nb_NO.UTF-8");
    }

    #[test]
    fn test_tz_variable_wins_over_system_zone() {
        let detected = DeviceTraits::from_env(vars(&[("TZ", ":America/Chicago")]), || {
            Some("Europe/Oslo".to_string())
        });
        assert_eq!(detected.timezone, "America/Chicago");
    }

    #[test]
    fn test_terminal_size_does_not_affect_traits() {
        let plain = DeviceTraits::from_env(vars(&[("TZ", "UTC")]), || None);
        let resized = DeviceTraits::from_env(
            vars(&[("TZ", "UTC"), ("COLUMNS", "211"), ("LINES", "58")]),
            || None,
        );
        assert_eq!(plain, resized);
    }

    #[test]
    fn test_unknown_zone_falls_back_to_constant() {
        let detected = DeviceTraits::from_env(vars(&[]), || None);
        assert_eq!(detected.timezone, "unknown");
        assert_eq!(detected.language, "en-US");
    }

    #[test]
    fn test_zone_from_localtime_link() {
        assert_eq!(
            zone_from_localtime(Path::new("/usr/share/zoneinfo/Europe/Berlin")).as_deref(),
            Some("Europe/Berlin")
        );
        assert_eq!(
            zone_from_localtime(Path::new("../usr/share/zoneinfo/UTC")).as_deref(),
            Some("UTC")
        );
        assert_eq!(zone_from_localtime(Path::new("/etc/custom")), None);
    }
}
