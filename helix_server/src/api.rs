//! The externally reachable control API surface.
//!
//! These traits are the method surface the envelope wraps; the wire
//! transport in front of them is out of scope here. Request and response
//! types are plain serde structs.

use crate::error::EnvelopeError;
use helix_control::{ActionSignature, ServerConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Operational state of the control runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalState {
    /// Runtime is up, motion is disabled.
    Disabled,
    /// Runtime is up and serving motion.
    Enabled,
    /// Runtime is faulted (or absent entirely).
    Faulted,
}

/// Operational status report.
///
/// Monitoring distinguishes "envelope up, control faulted" from "envelope
/// down" through this structure: the status query itself succeeds even when
/// no control runtime is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalStatus {
    /// Current state.
    pub state: OperationalState,
    /// Fault description; set only in [`OperationalState::Faulted`].
    pub fault_reason: Option<String>,
}

impl OperationalStatus {
    /// A non-faulted status.
    pub fn up(state: OperationalState) -> Self {
        Self {
            state,
            fault_reason: None,
        }
    }

    /// A faulted status with a reason.
    pub fn faulted(reason: impl Into<String>) -> Self {
        Self {
            state: OperationalState::Faulted,
            fault_reason: Some(reason.into()),
        }
    }
}

/// Full status snapshot returned by `get_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Operational status.
    pub operational: OperationalStatus,
    /// Current speed override factor in [0, 1].
    pub speed_override: f64,
    /// Control cycle period [µs].
    pub cycle_time_us: u64,
    /// Monotonically increasing generation of the control runtime; bumps
    /// on every rebuild.
    pub generation: u64,
}

/// Parameters of a long-lived action session stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Upper bound on the session lifetime [ms].
    pub max_duration_ms: u64,
}

impl SessionRequest {
    /// The session duration as a [`Duration`].
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

/// Result of a completed (or cancelled) session stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// True if the session ended because of a cancellation signal.
    pub cancelled: bool,
}

/// Description of one GPIO signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioSignalDescription {
    /// Signal name.
    pub name: String,
    /// True if the signal can be written.
    pub writable: bool,
}

/// The control service methods the envelope forwards.
///
/// Implementations run in the request-handling domain: they may block,
/// allocate and lock freely.
pub trait ControlApi: Send + Sync {
    /// Full status snapshot.
    fn get_status(&self) -> Result<StatusSnapshot, EnvelopeError>;

    /// The server configuration.
    fn get_config(&self) -> Result<ServerConfig, EnvelopeError>;

    /// Signatures of every registered action type.
    fn list_action_signatures(&self) -> Result<Vec<ActionSignature>, EnvelopeError>;

    /// Signature of one action type by name.
    fn get_action_signature(
        &self,
        action_type: &str,
    ) -> Result<Option<ActionSignature>, EnvelopeError>;

    /// Enable motion.
    fn enable(&self) -> Result<(), EnvelopeError>;

    /// Disable motion.
    fn disable(&self) -> Result<(), EnvelopeError>;

    /// Clear recoverable faults inside the runtime.
    fn clear_faults(&self) -> Result<(), EnvelopeError>;

    /// Operational status of the runtime.
    fn get_operational_status(&self) -> Result<OperationalStatus, EnvelopeError>;

    /// Set the speed override factor. Values outside [0, 1] are rejected.
    fn set_speed_override(&self, factor: f64) -> Result<(), EnvelopeError>;

    /// Current speed override factor.
    fn get_speed_override(&self) -> Result<f64, EnvelopeError>;

    /// Open a long-lived session stream. Blocks for the session's lifetime
    /// and must return promptly once [`ControlApi::cancel_streams`] fires.
    fn open_session(&self, request: SessionRequest) -> Result<SessionSummary, EnvelopeError>;

    /// Advisory, non-blocking cancellation of all long-lived streams.
    /// Streams usually close soon after, but this is not guaranteed.
    fn cancel_streams(&self);
}

/// The GPIO service methods the envelope forwards.
pub trait GpioApi: Send + Sync {
    /// Descriptions of all GPIO signals.
    fn signal_descriptions(&self) -> Result<Vec<GpioSignalDescription>, EnvelopeError>;

    /// Read a signal by name.
    fn read_signal(&self, name: &str) -> Result<bool, EnvelopeError>;

    /// Write a signal by name.
    fn write_signal(&self, name: &str, value: bool) -> Result<(), EnvelopeError>;
}
