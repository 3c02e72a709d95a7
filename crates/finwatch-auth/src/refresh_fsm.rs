//! Token refresh state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐  RefreshStarted   ┌─────────────────┐
//! │      Idle       │ ────────────────► │   Refreshing    │
//! │    (initial)    │ ◄──────────────── │                 │
//! └─────────────────┘  RefreshSucceeded └─────────────────┘
//!                      RefreshFailed
//! ```
//!
//! Only the task that moves the machine out of `Idle` calls the refresh
//! endpoint. Everyone who observes `Refreshing` queues behind it.

use rust_fsm::*;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub refresh_machine(Idle)

    Idle => {
        RefreshStarted => Refreshing
    },
    Refreshing => {
        RefreshSucceeded => Idle,
        RefreshFailed => Idle
    }
}

pub use refresh_machine::Input as RefreshMachineInput;
pub use refresh_machine::State as RefreshMachineState;
pub use refresh_machine::StateMachine as RefreshMachine;
