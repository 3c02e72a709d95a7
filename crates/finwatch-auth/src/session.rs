//! Session flows on top of the gateway: login, profile, logout, status.

use crate::gateway::{error_message, AccessToken};
use crate::{
    token, ApiRequest, AuthError, AuthGateway, AuthResult, Envelope, Role, SessionEvent,
    UserProfile,
};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Local view of the session, built from the credential store without
/// network I/O.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSnapshot {
    /// A token and a cached profile are both present.
    pub authenticated: bool,
    /// The stored token's `exp` is in the past. The next request will refresh.
    pub expired: bool,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub profile: Option<UserProfile>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

impl AuthGateway {
    /// Log in with email and password.
    ///
    /// Login bypasses the refresh coordinator: a 401 here means the
    /// credentials were rejected, not that a token expired.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<UserProfile> {
        let request = ApiRequest::post("/auth/login").json(&LoginBody { email, password })?;
        let response = self.dispatch(&request, None).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            warn!(status = status.as_u16(), "Login rejected");
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    AuthError::InvalidCredentials(message)
                }
                _ => AuthError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let envelope: Envelope<AccessToken> = response.json().await?;
        let expires_at = token::expires_at(&envelope.data.access_token)?;
        self.credentials.save(&envelope.data.access_token);
        debug!(expires_at = %expires_at, "Login issued access token");

        let profile = match self.fetch_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                self.credentials.clear();
                return Err(e);
            }
        };

        info!(user_id = %profile.id, role = %profile.role, "Logged in");
        self.emit(SessionEvent::LoggedIn {
            user_id: profile.id.clone(),
        });

        Ok(profile)
    }

    /// Fetch the current user's profile and cache it.
    pub async fn fetch_profile(&self) -> AuthResult<UserProfile> {
        if self.credentials.load().is_none() {
            return Err(AuthError::NotLoggedIn);
        }

        let response = self.send(ApiRequest::get("/auth/profile")).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let envelope: Envelope<UserProfile> = response.json().await?;
        self.credentials.save_profile(&envelope.data);
        debug!(user_id = %envelope.data.id, "Profile cached");

        Ok(envelope.data)
    }

    /// Log out. The backend call is best-effort; local state is always cleared.
    pub async fn logout(&self) {
        let token = self.credentials.load();
        let request = ApiRequest::post("/auth/logout");

        match self.dispatch(&request, token.as_deref()).await {
            Ok(response) if response.status().is_success() => {
                debug!("Backend session revoked");
            }
            Ok(response) => {
                warn!(status = response.status().as_u16(), "Logout endpoint returned an error");
            }
            Err(e) => {
                warn!(error = %e, "Logout request failed");
            }
        }

        self.credentials.clear();
        info!("Logged out");
        self.emit(SessionEvent::LoggedOut);
    }

    /// Snapshot of the stored session.
    pub fn status(&self) -> AuthSnapshot {
        let token = self.credentials.load();
        let profile: Option<UserProfile> = self.credentials.load_profile();
        let token_expires_at = token.as_deref().and_then(|t| token::expires_at(t).ok());

        AuthSnapshot {
            authenticated: token.is_some() && profile.is_some(),
            expired: token_expires_at.is_some_and(|exp| exp <= Utc::now()),
            token_expires_at,
            profile,
        }
    }

    /// Route guard: the cached profile must hold at least `min`.
    pub fn require_role(&self, min: Role) -> AuthResult<UserProfile> {
        let profile = self
            .credentials
            .load()
            .and_then(|_| self.credentials.load_profile::<UserProfile>())
            .ok_or(AuthError::NotLoggedIn)?;

        if !profile.role.allows(min) {
            return Err(AuthError::Forbidden {
                required: min,
                actual: profile.role,
            });
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use finwatch_storage::{CredentialStore, DeviceFingerprint, MemoryStorage};
    use std::sync::Arc;

    fn gateway() -> AuthGateway {
        let store =
            CredentialStore::new(Box::new(MemoryStorage::new()), DeviceFingerprint::detect());
        AuthGateway::new("http://localhost:9/api", Arc::new(store)).unwrap()
    }

    fn token_expiring_at(exp: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{}}}"#, exp));
        format!("e30.{}.sig", payload)
    }

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: "42".to_string(),
            email: "keeper@example.com".to_string(),
            name: None,
            role,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_status_empty_store() {
        let snapshot = gateway().status();
        assert!(!snapshot.authenticated);
        assert!(!snapshot.expired);
        assert!(snapshot.token_expires_at.is_none());
        assert!(snapshot.profile.is_none());
    }

    #[test]
    fn test_status_reports_expired_token() {
        let gateway = gateway();
        gateway.credentials().save(&token_expiring_at(1_000));
        gateway.credentials().save_profile(&profile(Role::User));

        let snapshot = gateway.status();
        assert!(snapshot.authenticated);
        assert!(snapshot.expired);
        assert_eq!(snapshot.token_expires_at.unwrap().timestamp(), 1_000);
    }

    #[test]
    fn test_status_token_without_profile_is_not_authenticated() {
        let gateway = gateway();
        let exp = Utc::now().timestamp() + 3600;
        gateway.credentials().save(&token_expiring_at(exp));

        let snapshot = gateway.status();
        assert!(!snapshot.authenticated);
        assert!(!snapshot.expired);
    }

    #[test]
    fn test_require_role_ranks_roles() {
        let gateway = gateway();
        assert!(matches!(gateway.require_role(Role::User), Err(AuthError::NotLoggedIn)));

        gateway.credentials().save("token");
        gateway.credentials().save_profile(&profile(Role::Admin));

        assert_eq!(gateway.require_role(Role::User).unwrap().role, Role::Admin);
        assert!(gateway.require_role(Role::Admin).is_ok());
        match gateway.require_role(Role::Superuser) {
            Err(AuthError::Forbidden { required, actual }) => {
                assert_eq!(required, Role::Superuser);
                assert_eq!(actual, Role::Admin);
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn test_require_role_needs_token_and_profile() {
        let gateway = gateway();
        gateway.credentials().save_profile(&profile(Role::Superuser));
        assert!(matches!(gateway.require_role(Role::User), Err(AuthError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_fetch_profile_without_token_is_not_logged_in() {
        assert!(matches!(gateway().fetch_profile().await, Err(AuthError::NotLoggedIn)));
    }
}
