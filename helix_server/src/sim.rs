//! Simulated control runtime.
//!
//! An in-process [`ControlRuntime`] with no hardware behind it, used by the
//! `helix_server` binary in simulation mode and by the envelope tests. The
//! factory handle lets a test (or an operator tool) inject faults and
//! observe how many runtimes have been built.

use crate::api::{
    ControlApi, GpioApi, GpioSignalDescription, OperationalState, OperationalStatus,
    SessionRequest, SessionSummary, StatusSnapshot,
};
use crate::error::EnvelopeError;
use crate::runtime::{ControlRuntime, RuntimeFactory};
use helix_control::{ActionSignature, ServerConfig, SignalRole};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Options fixed across all runtimes a factory builds.
#[derive(Clone)]
pub struct SimRuntimeOptions {
    /// Server configuration reported by `get_config`.
    pub config: ServerConfig,
    /// Whether session streams return promptly on cancellation. Disabled
    /// only by tests that need a stream to outlive a rebuild attempt.
    pub honor_cancellation: bool,
}

impl Default for SimRuntimeOptions {
    fn default() -> Self {
        Self {
            config: ServerConfig::default(),
            honor_cancellation: true,
        }
    }
}

/// State shared between the factory and its handle.
struct SimShared {
    build_count: AtomicU64,
    injected_fatal_fault: Mutex<Option<String>>,
    fail_next_build: AtomicBool,
}

/// Control surface over a simulated runtime factory, for tests and tooling.
#[derive(Clone)]
pub struct SimFactoryHandle {
    shared: Arc<SimShared>,
}

impl SimFactoryHandle {
    /// Number of runtimes the factory has built so far.
    pub fn build_count(&self) -> u64 {
        self.shared.build_count.load(Ordering::SeqCst)
    }

    /// Put the *current* runtime into a persistent fault: its services stop
    /// resolving until a rebuild constructs a replacement.
    pub fn inject_fatal_fault(&self, reason: impl Into<String>) {
        *self.shared.injected_fatal_fault.lock() = Some(reason.into());
    }

    /// Make the next factory invocation fail with a bring-up error.
    pub fn fail_next_build(&self) {
        self.shared.fail_next_build.store(true, Ordering::SeqCst);
    }
}

/// Build a simulated runtime factory plus its control handle.
pub fn sim_runtime_factory(options: SimRuntimeOptions) -> (RuntimeFactory, SimFactoryHandle) {
    let shared = Arc::new(SimShared {
        build_count: AtomicU64::new(0),
        injected_fatal_fault: Mutex::new(None),
        fail_next_build: AtomicBool::new(false),
    });
    let handle = SimFactoryHandle {
        shared: Arc::clone(&shared),
    };

    let factory: RuntimeFactory = Box::new(move || {
        if shared.fail_next_build.swap(false, Ordering::SeqCst) {
            return Err(EnvelopeError::unavailable(
                "simulated runtime bring-up failure",
            ));
        }
        // A fresh runtime starts healthy: building it consumes any fault
        // that was injected into its predecessor.
        shared.injected_fatal_fault.lock().take();
        let generation = shared.build_count.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(SimControlRuntime::new(
            generation,
            options.clone(),
            Arc::clone(&shared),
        )) as Box<dyn ControlRuntime>)
    });

    (factory, handle)
}

struct SimState {
    operational: OperationalState,
    fault_reason: Option<String>,
    speed_override: f64,
}

/// The simulated runtime itself.
pub struct SimControlRuntime {
    generation: u64,
    options: SimRuntimeOptions,
    signatures: Vec<ActionSignature>,
    state: Mutex<SimState>,
    gpio: Mutex<Vec<(String, bool)>>,
    cancel: AtomicBool,
    shared: Arc<SimShared>,
}

impl SimControlRuntime {
    fn new(generation: u64, options: SimRuntimeOptions, shared: Arc<SimShared>) -> Self {
        let signatures = vec![
            ActionSignature::new("helix.hold_position")
                .with_required_slot("arm")
                .with_signal("settled", SignalRole::Output),
            ActionSignature::new("helix.point_to_point_move")
                .with_required_slot("arm")
                .with_signal("done", SignalRole::Output),
        ];
        Self {
            generation,
            options,
            signatures,
            state: Mutex::new(SimState {
                operational: OperationalState::Disabled,
                fault_reason: None,
                speed_override: 1.0,
            }),
            gpio: Mutex::new(vec![
                ("tool_clamp".to_string(), false),
                ("vacuum".to_string(), false),
            ]),
            cancel: AtomicBool::new(false),
            shared,
        }
    }

    fn check_alive(&self) -> Result<(), EnvelopeError> {
        if let Some(reason) = self.shared.injected_fatal_fault.lock().clone() {
            return Err(EnvelopeError::unavailable(reason));
        }
        Ok(())
    }
}

impl ControlRuntime for SimControlRuntime {
    fn control(&self) -> Result<&dyn ControlApi, EnvelopeError> {
        self.check_alive()?;
        Ok(self)
    }

    fn gpio(&self) -> Result<&dyn GpioApi, EnvelopeError> {
        self.check_alive()?;
        Ok(self)
    }
}

impl ControlApi for SimControlRuntime {
    fn get_status(&self) -> Result<StatusSnapshot, EnvelopeError> {
        let state = self.state.lock();
        let operational = match &state.fault_reason {
            Some(reason) => OperationalStatus::faulted(reason.clone()),
            None => OperationalStatus::up(state.operational),
        };
        Ok(StatusSnapshot {
            operational,
            speed_override: state.speed_override,
            cycle_time_us: self.options.config.cycle_time_us,
            generation: self.generation,
        })
    }

    fn get_config(&self) -> Result<ServerConfig, EnvelopeError> {
        Ok(self.options.config.clone())
    }

    fn list_action_signatures(&self) -> Result<Vec<ActionSignature>, EnvelopeError> {
        Ok(self.signatures.clone())
    }

    fn get_action_signature(
        &self,
        action_type: &str,
    ) -> Result<Option<ActionSignature>, EnvelopeError> {
        Ok(self
            .signatures
            .iter()
            .find(|s| s.action_type_name == action_type)
            .cloned())
    }

    fn enable(&self) -> Result<(), EnvelopeError> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.fault_reason {
            return Err(EnvelopeError::failed_precondition(format!(
                "cannot enable while faulted: {reason}"
            )));
        }
        state.operational = OperationalState::Enabled;
        Ok(())
    }

    fn disable(&self) -> Result<(), EnvelopeError> {
        self.state.lock().operational = OperationalState::Disabled;
        Ok(())
    }

    fn clear_faults(&self) -> Result<(), EnvelopeError> {
        let mut state = self.state.lock();
        state.fault_reason = None;
        state.operational = OperationalState::Disabled;
        Ok(())
    }

    fn get_operational_status(&self) -> Result<OperationalStatus, EnvelopeError> {
        let state = self.state.lock();
        Ok(match &state.fault_reason {
            Some(reason) => OperationalStatus::faulted(reason.clone()),
            None => OperationalStatus::up(state.operational),
        })
    }

    fn set_speed_override(&self, factor: f64) -> Result<(), EnvelopeError> {
        if !(0.0..=1.0).contains(&factor) || factor.is_nan() {
            return Err(EnvelopeError::invalid_argument(format!(
                "speed override {factor} outside [0, 1]"
            )));
        }
        self.state.lock().speed_override = factor;
        Ok(())
    }

    fn get_speed_override(&self) -> Result<f64, EnvelopeError> {
        Ok(self.state.lock().speed_override)
    }

    fn open_session(&self, request: SessionRequest) -> Result<SessionSummary, EnvelopeError> {
        let deadline = Instant::now() + request.max_duration();
        while Instant::now() < deadline {
            if self.options.honor_cancellation && self.cancel.load(Ordering::Acquire) {
                return Ok(SessionSummary { cancelled: true });
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        Ok(SessionSummary { cancelled: false })
    }

    fn cancel_streams(&self) {
        self.cancel.store(true, Ordering::Release);
    }
}

impl GpioApi for SimControlRuntime {
    fn signal_descriptions(&self) -> Result<Vec<GpioSignalDescription>, EnvelopeError> {
        Ok(self
            .gpio
            .lock()
            .iter()
            .map(|(name, _)| GpioSignalDescription {
                name: name.clone(),
                writable: true,
            })
            .collect())
    }

    fn read_signal(&self, name: &str) -> Result<bool, EnvelopeError> {
        self.gpio
            .lock()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| EnvelopeError::NotFound {
                name: name.to_string(),
            })
    }

    fn write_signal(&self, name: &str, value: bool) -> Result<(), EnvelopeError> {
        let mut gpio = self.gpio.lock();
        match gpio.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                *slot = value;
                Ok(())
            }
            None => Err(EnvelopeError::NotFound {
                name: name.to_string(),
            }),
        }
    }
}
