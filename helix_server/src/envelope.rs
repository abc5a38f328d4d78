//! The hot-swappable service envelope.
//!
//! The envelope wraps every externally reachable control and GPIO method:
//! take a shared lock on the runtime slot, fetch the current runtime or
//! propagate its stored error as the method's failure, forward the call.
//! Two methods deviate:
//!
//! - `get_operational_status` converts "runtime absent" into a structured
//!   faulted response instead of an error, so monitoring can distinguish
//!   "envelope up, control faulted" from "envelope down".
//! - `restart` / `clear_faults` can discard the current runtime and build
//!   a replacement via the injected factory (`clear_faults` only does so
//!   while the runtime is in an error state).
//!
//! Readers run concurrently with each other but never with a rebuild;
//! replacement happens entirely under the exclusive lock, so no caller ever
//! observes a half-swapped runtime.

use crate::api::{
    ControlApi, GpioApi, GpioSignalDescription, OperationalStatus, SessionRequest, SessionSummary,
    StatusSnapshot,
};
use crate::error::EnvelopeError;
use crate::runtime::{ControlRuntime, RuntimeFactory};
use crate::watchdog::{RebuildWatchdog, TimeoutHandler, exit_process_handler};
use helix_control::{ActionSignature, ServerConfig};
use parking_lot::RwLock;
use std::time::Duration;

/// Envelope configuration.
#[derive(Clone)]
pub struct EnvelopeConfig {
    /// How long a rebuild may wait for in-flight requests to drain before
    /// the watchdog fires.
    pub rebuild_timeout: Duration,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            rebuild_timeout: Duration::from_secs(30),
        }
    }
}

/// Owns the current control runtime and serializes rebuild against serving.
pub struct Envelope {
    config: EnvelopeConfig,
    factory: RuntimeFactory,
    runtime: RwLock<Result<Box<dyn ControlRuntime>, EnvelopeError>>,
    on_watchdog_timeout: TimeoutHandler,
}

impl Envelope {
    /// Build an envelope and immediately construct the initial runtime via
    /// `factory`. A factory failure is stored, not returned: the envelope
    /// keeps serving (with errors) so the failure stays reachable and a
    /// later `restart`/`clear_faults` can recover.
    pub fn new(config: EnvelopeConfig, factory: RuntimeFactory) -> Self {
        let initial = factory();
        if let Err(error) = &initial {
            tracing::warn!(%error, "initial control runtime construction failed");
        }
        Self {
            config,
            factory,
            runtime: RwLock::new(initial),
            on_watchdog_timeout: exit_process_handler(),
        }
    }

    /// An envelope whose runtime slot starts empty; the first runtime is
    /// built by the first `restart` call.
    pub fn without_initial_runtime(config: EnvelopeConfig, factory: RuntimeFactory) -> Self {
        Self {
            config,
            factory,
            runtime: RwLock::new(Err(EnvelopeError::unavailable(
                "control runtime is not set yet",
            ))),
            on_watchdog_timeout: exit_process_handler(),
        }
    }

    /// Replace the watchdog timeout handler. The default terminates the
    /// process; tests inject an observer instead.
    pub fn with_watchdog_handler(mut self, handler: TimeoutHandler) -> Self {
        self.on_watchdog_timeout = handler;
        self
    }

    /// Forward a call to the control service under the shared lock.
    fn with_control<R>(
        &self,
        f: impl FnOnce(&dyn ControlApi) -> Result<R, EnvelopeError>,
    ) -> Result<R, EnvelopeError> {
        let guard = self.runtime.read();
        let runtime = guard.as_ref().map_err(Clone::clone)?;
        f(runtime.control()?)
    }

    /// Forward a call to the GPIO service under the shared lock.
    fn with_gpio<R>(
        &self,
        f: impl FnOnce(&dyn GpioApi) -> Result<R, EnvelopeError>,
    ) -> Result<R, EnvelopeError> {
        let guard = self.runtime.read();
        let runtime = guard.as_ref().map_err(Clone::clone)?;
        f(runtime.gpio()?)
    }

    // ─── Wrapped control methods ────────────────────────────────────

    /// Full status snapshot.
    pub fn get_status(&self) -> Result<StatusSnapshot, EnvelopeError> {
        self.with_control(|c| c.get_status())
    }

    /// The server configuration.
    pub fn get_config(&self) -> Result<ServerConfig, EnvelopeError> {
        self.with_control(|c| c.get_config())
    }

    /// Signatures of every registered action type.
    pub fn list_action_signatures(&self) -> Result<Vec<ActionSignature>, EnvelopeError> {
        self.with_control(|c| c.list_action_signatures())
    }

    /// Signature of one action type by name.
    pub fn get_action_signature(
        &self,
        action_type: &str,
    ) -> Result<Option<ActionSignature>, EnvelopeError> {
        self.with_control(|c| c.get_action_signature(action_type))
    }

    /// Enable motion.
    pub fn enable(&self) -> Result<(), EnvelopeError> {
        self.with_control(|c| c.enable())
    }

    /// Disable motion.
    pub fn disable(&self) -> Result<(), EnvelopeError> {
        self.with_control(|c| c.disable())
    }

    /// Set the speed override factor.
    pub fn set_speed_override(&self, factor: f64) -> Result<(), EnvelopeError> {
        self.with_control(|c| c.set_speed_override(factor))
    }

    /// Current speed override factor.
    pub fn get_speed_override(&self) -> Result<f64, EnvelopeError> {
        self.with_control(|c| c.get_speed_override())
    }

    /// Open a long-lived session stream. Holds the shared lock for the
    /// session's lifetime; a rebuild cancels it via `cancel_streams`.
    pub fn open_session(
        &self,
        request: SessionRequest,
    ) -> Result<SessionSummary, EnvelopeError> {
        self.with_control(|c| c.open_session(request))
    }

    /// Operational status. Never fails at the envelope level: an absent or
    /// errored runtime reports as a structured faulted state.
    pub fn get_operational_status(&self) -> OperationalStatus {
        let guard = self.runtime.read();
        let control = guard
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|runtime| runtime.control());
        match control {
            Ok(api) => api
                .get_operational_status()
                .unwrap_or_else(|error| OperationalStatus::faulted(error.to_string())),
            Err(error) => OperationalStatus::faulted(error.to_string()),
        }
    }

    /// Clear faults. If the current runtime is in an error state (or absent)
    /// this discards it and builds a replacement; otherwise the call is
    /// forwarded to the runtime.
    pub fn clear_faults(&self) -> Result<(), EnvelopeError> {
        let latched_error = {
            let guard = self.runtime.read();
            match guard.as_ref() {
                Err(error) => Some(error.clone()),
                Ok(runtime) => runtime.control().err(),
            }
        };
        if let Some(error) = latched_error {
            tracing::info!(%error, "clear-faults received while faulted, rebuilding runtime");
            return self.rebuild();
        }
        self.with_control(|c| c.clear_faults())
    }

    /// Unconditionally discard the current runtime and build a replacement.
    pub fn restart(&self) -> Result<(), EnvelopeError> {
        tracing::warn!(
            "received restart request, will cancel streams and swap the control runtime"
        );
        self.rebuild()
    }

    // ─── Wrapped GPIO methods ───────────────────────────────────────

    /// Descriptions of all GPIO signals.
    pub fn gpio_signal_descriptions(
        &self,
    ) -> Result<Vec<GpioSignalDescription>, EnvelopeError> {
        self.with_gpio(|g| g.signal_descriptions())
    }

    /// Read a GPIO signal by name.
    pub fn gpio_read_signal(&self, name: &str) -> Result<bool, EnvelopeError> {
        self.with_gpio(|g| g.read_signal(name))
    }

    /// Write a GPIO signal by name.
    pub fn gpio_write_signal(&self, name: &str, value: bool) -> Result<(), EnvelopeError> {
        self.with_gpio(|g| g.write_signal(name, value))
    }

    // ─── Rebuild ────────────────────────────────────────────────────

    /// Best-effort, non-blocking cancellation of the current runtime's
    /// long-lived streams. Streams usually close soon after, but this is
    /// not guaranteed.
    pub fn try_cancel_all_streams(&self) {
        let guard = self.runtime.read();
        if let Ok(runtime) = guard.as_ref() {
            if let Ok(control) = runtime.control() {
                control.cancel_streams();
            }
        }
    }

    /// Discard the current runtime and build a replacement via the factory.
    ///
    /// Protocol: cancel streams (advisory), arm the watchdog, block on the
    /// exclusive lock until in-flight requests drain, disarm, destroy the
    /// old runtime, then store the factory's result (runtime or error) as
    /// current. If the watchdog deadline elapses first, its handler fires
    /// (by default terminating the process).
    fn rebuild(&self) -> Result<(), EnvelopeError> {
        self.try_cancel_all_streams();

        let watchdog = RebuildWatchdog::arm(
            self.config.rebuild_timeout,
            TimeoutHandler::clone(&self.on_watchdog_timeout),
        );

        // Blocks until all current requests have released their shared
        // locks. Cancellation above makes that happen eventually; if it
        // does not, the watchdog fires.
        let mut guard = self.runtime.write();
        watchdog.disarm();

        // Destroy the old runtime first so old and new never overlap.
        *guard = Err(EnvelopeError::unavailable("restarting control runtime"));
        *guard = (self.factory)();
        match guard.as_ref() {
            Ok(_) => {
                tracing::info!("control runtime rebuilt");
                Ok(())
            }
            Err(error) => {
                tracing::error!(%error, "control runtime factory failed during rebuild");
                Err(error.clone())
            }
        }
    }
}
