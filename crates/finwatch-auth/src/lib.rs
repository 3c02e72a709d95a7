//! Authenticated request gateway for the FinWatch backend.
//!
//! This crate provides:
//! - A request pipeline that attaches the stored bearer token to every call
//! - A single-flight refresh coordinator: concurrent 401s share one
//!   `/auth/refresh` call and are retried with its token
//! - Session flows (login, logout, profile) and a role guard
//! - Session events broadcast to interested listeners

mod error;
mod events;
mod gateway;
mod profile;
mod refresh_fsm;
mod request;
mod session;
mod token;

pub use error::{AuthError, AuthResult};
pub use events::SessionEvent;
pub use gateway::{error_message, AuthGateway, GatewayConfig};
pub use profile::{deserialize_id, Role, UserProfile};
pub use refresh_fsm::refresh_machine;
pub use refresh_fsm::{RefreshMachine, RefreshMachineInput, RefreshMachineState};
pub use request::{ApiRequest, Envelope};
pub use session::AuthSnapshot;
pub use token::{expires_at, is_expired};
