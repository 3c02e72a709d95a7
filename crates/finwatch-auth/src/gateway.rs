//! Request pipeline and single-flight token refresh.
//!
//! Every request goes out with the stored bearer token. When one comes back
//! `401 Unauthorized`, the gateway exchanges the token via `/auth/refresh`
//! and replays the request once. Concurrent 401s share a single refresh:
//! the first task to observe `Idle` becomes the leader and calls the
//! endpoint, everybody else queues a oneshot waiter and is resolved with
//! the leader's outcome.
//!
//! The refresh state is checked and updated under a mutex that is never
//! held across an `.await`.

use crate::events::EVENT_CHANNEL_CAPACITY;
use crate::refresh_fsm::{RefreshMachine, RefreshMachineInput, RefreshMachineState};
use crate::{token, ApiRequest, AuthError, AuthResult, Envelope, SessionEvent};
use finwatch_storage::CredentialStore;
use parking_lot::Mutex;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_SUMMARY_LIMIT: usize = 200;

/// Gateway tuning.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upper bound on a refresh call. Requests queued behind it fail when it elapses.
    pub refresh_timeout: Duration,
    /// Timeout applied to every ordinary request.
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// `data` payload of `/auth/login` and `/auth/refresh`.
#[derive(Debug, Deserialize)]
pub(crate) struct AccessToken {
    pub(crate) access_token: String,
}

/// Outcome handed to a request queued behind a refresh; `None` means it failed.
type Waiter = oneshot::Sender<Option<String>>;

struct RefreshState {
    machine: RefreshMachine,
    waiters: Vec<Waiter>,
}

enum RefreshRole {
    Leader,
    Waiter(oneshot::Receiver<Option<String>>),
}

/// Authenticated HTTP gateway to the monitoring backend.
///
/// One instance per application session. The refresh state belongs to the
/// instance, so independent gateways never coordinate with each other.
pub struct AuthGateway {
    http_client: Client,
    base_url: String,
    pub(crate) credentials: Arc<CredentialStore>,
    refresh: Mutex<RefreshState>,
    events: broadcast::Sender<SessionEvent>,
    config: GatewayConfig,
}

impl AuthGateway {
    /// Create a gateway with default timeouts.
    pub fn new(base_url: &str, credentials: Arc<CredentialStore>) -> AuthResult<Self> {
        Self::with_config(base_url, credentials, GatewayConfig::default())
    }

    /// Create a gateway with custom timeouts.
    ///
    /// The HTTP client keeps a cookie store so the refresh credential set by
    /// `/auth/login` is sent back to `/auth/refresh`.
    pub fn with_config(
        base_url: &str,
        credentials: Arc<CredentialStore>,
        config: GatewayConfig,
    ) -> AuthResult<Self> {
        url::Url::parse(base_url)?;

        let http_client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            refresh: Mutex::new(RefreshState {
                machine: RefreshMachine::new(),
                waiters: Vec::new(),
            }),
            events,
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Current refresh state.
    pub fn refresh_state(&self) -> RefreshMachineState {
        self.refresh.lock().machine.state().clone()
    }

    /// Number of requests queued behind the in-flight refresh.
    pub fn pending_waiters(&self) -> usize {
        self.refresh.lock().waiters.len()
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send one attempt of `request` with an optional bearer token.
    pub(crate) async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> AuthResult<Response> {
        let mut builder = self
            .http_client
            .request(request.method().clone(), self.endpoint(request.path()));

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        debug!(
            method = %request.method(),
            path = %request.path(),
            authenticated = token.is_some(),
            retried = request.is_retried(),
            "Dispatching request"
        );

        Ok(builder.send().await?)
    }

    /// Send `request` through the authenticated pipeline.
    ///
    /// Any response other than 401 is returned unchanged, including error
    /// statuses. A 401 triggers (or joins) a token refresh and a single
    /// replay; a replayed request that is rejected again fails with
    /// [`AuthError::Unauthorized`].
    pub async fn send(&self, mut request: ApiRequest) -> AuthResult<Response> {
        let mut token = self.credentials.load();

        loop {
            let response = self.dispatch(&request, token.as_deref()).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if request.is_retried() {
                warn!(
                    method = %request.method(),
                    path = %request.path(),
                    "Request rejected again after token refresh"
                );
                return Err(AuthError::Unauthorized);
            }

            request.mark_retried();
            token = Some(self.refreshed_token(token.as_deref()).await?);
        }
    }

    /// Obtain a token to replay a request that was rejected with `sent_with`.
    async fn refreshed_token(&self, sent_with: Option<&str>) -> AuthResult<String> {
        let role = {
            let mut state = self.refresh.lock();
            let current = state.machine.state().clone();

            match current {
                RefreshMachineState::Refreshing => {
                    let (tx, rx) = oneshot::channel();
                    state.waiters.push(tx);
                    debug!(
                        waiters = state.waiters.len(),
                        "Queued behind in-flight token refresh"
                    );
                    RefreshRole::Waiter(rx)
                }
                RefreshMachineState::Idle => {
                    // A refresh that settled after this request went out has
                    // already stored a newer token.
                    if let Some(stored) = self
                        .credentials
                        .load()
                        .filter(|stored| Some(stored.as_str()) != sent_with)
                    {
                        debug!("Token already rotated, replaying with stored token");
                        return Ok(stored);
                    }

                    transition(&mut state.machine, &RefreshMachineInput::RefreshStarted)?;
                    RefreshRole::Leader
                }
            }
        };

        match role {
            RefreshRole::Waiter(rx) => match rx.await {
                Ok(Some(token)) => Ok(token),
                _ => Err(AuthError::SessionExpired),
            },
            RefreshRole::Leader => {
                let flight = RefreshFlight {
                    gateway: self,
                    settled: false,
                };
                info!("Access token rejected, refreshing");

                let limit = self.config.refresh_timeout;
                let outcome = tokio::time::timeout(limit, self.request_new_token())
                    .await
                    .unwrap_or_else(|_| {
                        Err(AuthError::TokenRefresh(format!(
                            "no response within {}ms",
                            limit.as_millis()
                        )))
                    });

                flight.settle(outcome.map_err(|e| match e {
                    AuthError::TokenRefresh(_) | AuthError::MalformedToken(_) => e,
                    other => AuthError::TokenRefresh(other.to_string()),
                }))
            }
        }
    }

    /// Single call to the refresh endpoint. The refresh credential travels
    /// as a cookie.
    async fn request_new_token(&self) -> AuthResult<String> {
        let url = self.endpoint("/auth/refresh");
        debug!(url = %url, "Refreshing access token");

        let response = self.http_client.post(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenRefresh(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_message(&body)
            )));
        }

        let envelope: Envelope<AccessToken> = response.json().await?;
        let expires_at = token::expires_at(&envelope.data.access_token)?;
        debug!(expires_at = %expires_at, "Refresh endpoint issued a new token");

        Ok(envelope.data.access_token)
    }

    /// Persist or clear credentials, return to `Idle`, and resolve every
    /// queued waiter with the outcome.
    fn finish_refresh(&self, outcome: AuthResult<String>) -> AuthResult<String> {
        match &outcome {
            Ok(token) => self.credentials.save(token),
            Err(_) => self.credentials.clear(),
        }

        let waiters = {
            let mut state = self.refresh.lock();
            let input = if outcome.is_ok() {
                RefreshMachineInput::RefreshSucceeded
            } else {
                RefreshMachineInput::RefreshFailed
            };
            if let Err(e) = transition(&mut state.machine, &input) {
                warn!(error = %e, "Refresh settled outside of Refreshing state");
            }
            std::mem::take(&mut state.waiters)
        };

        let waiter_count = waiters.len();
        let delivered = outcome.as_ref().ok().cloned();
        for waiter in waiters {
            // The waiting request may have been dropped.
            let _ = waiter.send(delivered.clone());
        }

        match &outcome {
            Ok(_) => {
                info!(waiters = waiter_count, "Access token refreshed");
                self.emit(SessionEvent::TokenRefreshed);
            }
            Err(e) => {
                warn!(
                    error = %e,
                    waiters = waiter_count,
                    "Token refresh failed, session cleared"
                );
                self.emit(SessionEvent::LogoutRequired {
                    reason: e.to_string(),
                });
            }
        }

        outcome
    }
}

/// Settles the in-flight refresh exactly once, including when the leading
/// request is dropped mid-refresh.
struct RefreshFlight<'a> {
    gateway: &'a AuthGateway,
    settled: bool,
}

impl RefreshFlight<'_> {
    fn settle(mut self, outcome: AuthResult<String>) -> AuthResult<String> {
        self.settled = true;
        self.gateway.finish_refresh(outcome)
    }
}

impl Drop for RefreshFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Token refresh abandoned before completion");
            let _ = self.gateway.finish_refresh(Err(AuthError::TokenRefresh(
                "refresh abandoned".to_string(),
            )));
        }
    }
}

fn transition(machine: &mut RefreshMachine, input: &RefreshMachineInput) -> AuthResult<()> {
    machine.consume(input).map(|_| ()).map_err(|_| {
        AuthError::InvalidStateTransition(format!(
            "Cannot apply {:?} in state {:?}",
            input,
            machine.state()
        ))
    })
}

/// Human-readable message from an error response body.
///
/// Prefers the `detail`, `message` or `error` field of a JSON body and falls
/// back to the shortened raw text.
pub fn error_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["detail", "message", "error"] {
            match map.get(field) {
                Some(serde_json::Value::String(text)) if !text.trim().is_empty() => {
                    return text.trim().to_string();
                }
                Some(serde_json::Value::Null) | None => {}
                Some(other) => return summarize_body(&other.to_string()),
            }
        }
    }
    summarize_body(body)
}

/// Shorten a response body for error messages.
pub(crate) fn summarize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_SUMMARY_LIMIT {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(BODY_SUMMARY_LIMIT).collect();
    format!("{}… ({} bytes)", head, trimmed.len())
}
