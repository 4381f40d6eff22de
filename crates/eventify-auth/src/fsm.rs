//! State machines for request replay and route guarding.
//!
//! ## Request lifecycle
//!
//! ```text
//! Initial ──Dispatch──► Sent ──Completed──► Succeeded
//!                        │
//!                        │ Unauthorized
//!                        ▼
//!                   AuthFailed ──BeginRefresh──► Refreshing ──RefreshFailed──► FinalFailure
//!                                                   │                             ▲
//!                                                   │ RefreshSucceeded            │ Unauthorized
//!                                                   ▼                             │
//!                                                 Resent ─────────────────────────┘
//!                                                   │
//!                                                   │ Completed
//!                                                   ▼
//!                                               Succeeded
//! ```
//!
//! ## Route guard
//!
//! ```text
//! NotInitialized ──Mount──► Initializing ──Grant──► Authorized
//!                                │
//!                                └──Deny──► Unauthorized
//! ```
//!
//! Both settled guard states accept `Remount`, which re-runs the check after
//! the session changed underneath a mounted page. `Initializing` accepts it
//! too: a check dropped before it settled leaves the guard there.

use rust_fsm::*;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub request_machine(Initial)

    Initial => {
        Dispatch => Sent
    },
    Sent => {
        Completed => Succeeded,
        Unauthorized => AuthFailed
    },
    AuthFailed => {
        BeginRefresh => Refreshing
    },
    Refreshing => {
        RefreshSucceeded => Resent,
        RefreshFailed => FinalFailure
    },
    Resent => {
        Completed => Succeeded,
        // A second 401 is terminal: no further refresh
        Unauthorized => FinalFailure
    }
}

pub use request_machine::Input as RequestMachineInput;
pub use request_machine::State as RequestMachineState;
pub use request_machine::StateMachine as RequestMachine;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub guard_machine(NotInitialized)

    NotInitialized => {
        Mount => Initializing
    },
    Initializing => {
        Grant => Authorized,
        Deny => Unauthorized,
        Remount => Initializing
    },
    Authorized => {
        Remount => Initializing
    },
    Unauthorized => {
        Remount => Initializing
    }
}

pub use guard_machine::Input as GuardMachineInput;
pub use guard_machine::State as GuardMachineState;
pub use guard_machine::StateMachine as GuardMachine;
