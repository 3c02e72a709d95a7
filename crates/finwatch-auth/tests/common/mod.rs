//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use finwatch_auth::{AuthGateway, GatewayConfig};
use finwatch_storage::{
    CredentialStore, DeviceFingerprint, DeviceTraits, KeyValueStorage, MemoryStorage, StorageResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

/// JWT-shaped token that expires an hour from now. `label` keeps tokens apart.
pub fn jwt(label: &str) -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{}","exp":{}}}"#, label, exp));
    format!("{}.{}.sig-{}", header, payload, label)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn fingerprint() -> DeviceFingerprint {
    DeviceFingerprint::from_traits(&DeviceTraits {
        user_agent: "finwatch/test".to_string(),
        language: "en-US".to_string(),
        platform: "linux".to_string(),
        screen: "120x40".to_string(),
        timezone: "UTC".to_string(),
    })
}

/// Memory backend that counts deletions, so tests can tell how often the
/// credentials were cleared.
#[derive(Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    deletes: AtomicUsize,
}

impl CountingStorage {
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct SharedStorage(pub Arc<CountingStorage>);

impl KeyValueStorage for SharedStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.0.inner.set(key, value)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.0.inner.get(key)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        self.0.deletes.fetch_add(1, Ordering::SeqCst);
        self.0.inner.delete(key)
    }
}

pub struct Harness {
    pub server: MockServer,
    pub gateway: Arc<AuthGateway>,
    pub storage: Arc<CountingStorage>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::with_refresh_timeout(Duration::from_secs(5)).await
    }

    pub async fn with_refresh_timeout(refresh_timeout: Duration) -> Self {
        let server = MockServer::start().await;
        let storage = Arc::new(CountingStorage::default());
        let store = CredentialStore::new(Box::new(SharedStorage(storage.clone())), fingerprint());
        let config = GatewayConfig {
            refresh_timeout,
            request_timeout: Duration::from_secs(5),
        };
        let base_url = format!("{}/api", server.uri());
        let gateway =
            AuthGateway::with_config(&base_url, Arc::new(store), config).expect("gateway");

        Self {
            server,
            gateway: Arc::new(gateway),
            storage,
        }
    }
}
