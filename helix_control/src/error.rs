//! Resolution-phase error types.
//!
//! These errors occur while an action instance resolves its declared signal
//! and slot names against the runtime (non-realtime, once per instance).
//! They are rich and allocating by design: a misconfigured action should be
//! diagnosable from the error message alone. Cycle-time failures use
//! `helix_common::rt::RtError` instead.

use thiserror::Error;

/// Errors raised while resolving an action's signature against the runtime.
#[derive(Error, Debug)]
pub enum ControlError {
    /// The action's signature does not declare the requested signal.
    #[error(
        "Action type '{action_type}' does not declare realtime signal '{name}' \
         in its signature. Available signals: [{}]", declared.join(", ")
    )]
    UnknownSignal {
        /// Action type whose signature was consulted.
        action_type: String,
        /// The signal name that failed to resolve.
        name: String,
        /// Every signal name the signature declares.
        declared: Vec<String>,
    },

    /// A signature declares the same signal name twice.
    #[error("Action type '{action_type}' declares realtime signal '{name}' more than once")]
    DuplicateSignal {
        /// Action type whose signature is invalid.
        action_type: String,
        /// The duplicated signal name.
        name: String,
    },

    /// No slot with the requested name exists in the slot map.
    #[error("No slot named '{name}'. Available slots: [{}]", available.join(", "))]
    UnknownSlot {
        /// The slot name that failed to resolve.
        name: String,
        /// Every slot name the runtime exposes.
        available: Vec<String>,
    },

    /// No action type with the requested name is registered.
    #[error("No action type named '{name}' is registered")]
    UnknownActionType {
        /// The action type name.
        name: String,
    },

    /// A shared-memory interface the action needs failed to resolve.
    #[error(transparent)]
    Shm(#[from] helix_shm::ShmError),
}

/// Result type for resolution-phase operations.
pub type ControlResult<T> = Result<T, ControlError>;
