//! # Helix Service Envelope
//!
//! The externally reachable wrapper around the control runtime.
//!
//! The [`Envelope`] owns the current [`ControlRuntime`] (or its construction
//! error) behind a reader-writer lock, forwards every wrapped method under
//! the shared lock, and can discard and rebuild the runtime — on an
//! administrative restart, or on clear-faults while faulted — without the
//! process dropping its externally reachable surface. Rebuild time is
//! bounded by a watchdog whose firing is, by design, fatal to the process.
//!
//! Two execution domains meet here: the request-handling thread pool
//! (general-purpose, may block) and the administrative rebuild path. The
//! envelope's reader-writer lock is their only synchronization point.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod envelope;
pub mod error;
pub mod runtime;
pub mod sim;
pub mod watchdog;

pub use api::{
    ControlApi, GpioApi, GpioSignalDescription, OperationalState, OperationalStatus,
    SessionRequest, SessionSummary, StatusSnapshot,
};
pub use envelope::{Envelope, EnvelopeConfig};
pub use error::EnvelopeError;
pub use runtime::{ControlRuntime, RuntimeFactory};
pub use sim::{SimControlRuntime, SimFactoryHandle, SimRuntimeOptions, sim_runtime_factory};
pub use watchdog::{RebuildWatchdog, TimeoutHandler, exit_process_handler};
