//! CLI command implementations.

mod auth;
mod resources;

pub use auth::{login, logout, status, whoami};
pub use resources::{
    compare, devices_add, devices_list, devices_remove, devices_show, devices_update, feedings_add,
    feedings_list, history, measurements_add, measurements_list, mortalities_add,
    mortalities_list, water_changes_add, water_changes_list,
};

use crate::output::{self, OutputFormat};
use anyhow::Result;
use finwatch_api::{ApiError, DashboardClient};
use finwatch_auth::{AuthError, AuthGateway, GatewayConfig, SessionEvent};
use finwatch_config_and_utils::{Config, Paths};
use finwatch_storage::{CredentialStore, DeviceFingerprint, FileStorage};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Everything a command needs: resolved paths, configuration and a client
/// bound to the persisted session.
pub struct Context {
    pub paths: Paths,
    pub config: Config,
    pub client: DashboardClient,
    pub format: OutputFormat,
    events: broadcast::Receiver<SessionEvent>,
}

impl Context {
    pub fn new(paths: Paths, config: Config, format: OutputFormat) -> Result<Self> {
        paths.ensure_dirs()?;

        let storage = FileStorage::new(paths.credentials_file());
        let fingerprint = DeviceFingerprint::detect();
        debug!(fingerprint = %fingerprint.hash(), "Device fingerprint resolved");
        let credentials = CredentialStore::new(Box::new(storage), fingerprint);

        let gateway = AuthGateway::with_config(
            &config.api_url,
            Arc::new(credentials),
            GatewayConfig {
                refresh_timeout: config.refresh_timeout(),
                request_timeout: config.request_timeout(),
            },
        )?;
        let events = gateway.subscribe();

        Ok(Self {
            paths,
            config,
            client: DashboardClient::new(Arc::new(gateway)),
            format,
            events,
        })
    }

    pub fn gateway(&self) -> &AuthGateway {
        self.client.gateway()
    }

    /// Report session changes that happened while the command ran.
    pub fn report_session_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            debug!(event = ?event, "Session event");
            if let SessionEvent::LogoutRequired { reason } = event {
                output::print_error(
                    &format!(
                        "Session ended ({}). Run 'finwatch login' to sign in again.",
                        reason
                    ),
                    &self.format,
                );
            }
        }
    }
}

/// Extra guidance for well-known failures.
pub fn error_hint(error: &anyhow::Error) -> Option<&'static str> {
    let auth = error
        .downcast_ref::<AuthError>()
        .or_else(|| match error.downcast_ref::<ApiError>() {
            Some(ApiError::Auth(e)) => Some(e),
            _ => None,
        });

    if let Some(auth) = auth {
        if matches!(auth, AuthError::Forbidden { .. }) {
            return Some("Your account role does not allow this action.");
        }
        if auth.requires_login() {
            return Some("Run 'finwatch login' to sign in.");
        }
        if auth.is_transient() {
            return Some("The backend is unreachable. Check FINWATCH_API_URL and try again.");
        }
    }

    match error.downcast_ref::<ApiError>() {
        Some(e) if e.is_transient() => {
            Some("The backend is unreachable. Check FINWATCH_API_URL and try again.")
        }
        _ => None,
    }
}
