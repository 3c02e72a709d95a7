//! Session change notifications.

use serde::{Deserialize, Serialize};

/// Capacity of the session event channel. Slow listeners lag rather than
/// block the gateway.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Session lifecycle signal, broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Login succeeded and the profile was fetched.
    LoggedIn { user_id: String },
    /// A rejected token was exchanged for a new one.
    TokenRefreshed,
    /// Refresh failed; credentials were cleared and the user must log in again.
    LogoutRequired { reason: String },
    /// The user logged out.
    LoggedOut,
}
