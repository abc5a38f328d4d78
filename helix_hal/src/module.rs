//! The simulated hardware module runtime.
//!
//! Publishes the standard interface set at startup (non-realtime), then
//! runs a fixed-period cycle: advance the cycle counter, read commands,
//! integrate simulated joint motion, write state, stamp every written
//! interface with the current cycle.

use crate::config::ModuleConfig;
use helix::consts::{CYCLE_STATE_INTERFACE, MAX_DOF};
use helix::guard;
use helix_shm::interfaces::{CycleState, DigitalIoBank, JointCommand, JointLimits, JointState};
use helix_shm::{
    Interface, InterfaceHandle, InterfaceHandleMut, SegmentRegistry, ShmResult, monotonic_ns,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A running simulated module: owns the published segments and the
/// simulated joint state.
pub struct HalModule {
    registry: SegmentRegistry,
    config: ModuleConfig,
    cycle_state: InterfaceHandleMut<CycleState>,
    joint_state: InterfaceHandleMut<JointState>,
    joint_command: InterfaceHandle<JointCommand>,
    digital_io: InterfaceHandleMut<DigitalIoBank>,
    current_cycle: u64,
    positions: [f64; MAX_DOF],
    velocities: [f64; MAX_DOF],
}

impl HalModule {
    /// Publish all interfaces and module info under `/dev/shm`.
    pub fn publish(config: ModuleConfig) -> ShmResult<Self> {
        Self::publish_in(helix_shm::registry::DEFAULT_SHM_DIR, config)
    }

    /// Like [`HalModule::publish`], with an explicit segment directory.
    pub fn publish_in(dir: &str, config: ModuleConfig) -> ShmResult<Self> {
        let dof = config.dof;
        let mut registry = SegmentRegistry::create_in(dir, &config.name)?;

        registry.add_segment::<CycleState>(CYCLE_STATE_INTERFACE, true)?;
        registry.add_segment_with::<JointState>("joint_state", true, |buf| {
            JointState::init(buf)?;
            JointState::view_mut(buf).dof = dof as u32;
            Ok(())
        })?;
        registry.add_segment_with::<JointCommand>("joint_command", true, |buf| {
            JointCommand::init(buf)?;
            JointCommand::view_mut(buf).dof = dof as u32;
            Ok(())
        })?;
        registry.add_segment_with::<JointLimits>("joint_limits", false, |buf| {
            JointLimits::build(buf, dof)
        })?;
        registry.add_segment::<DigitalIoBank>("digital_io", false)?;
        registry.publish_module_info()?;

        tracing::info!(
            module = %config.name,
            dof,
            "published hardware interfaces"
        );

        let cycle_state = registry.get_mut::<CycleState>(CYCLE_STATE_INTERFACE)?;
        let joint_state = registry.get_mut::<JointState>("joint_state")?;
        let joint_command = registry.get::<JointCommand>("joint_command")?;
        let digital_io = registry.get_mut::<DigitalIoBank>("digital_io")?;

        Ok(Self {
            registry,
            config,
            cycle_state,
            joint_state,
            joint_command,
            digital_io,
            current_cycle: 0,
            positions: [0.0; MAX_DOF],
            velocities: [0.0; MAX_DOF],
        })
    }

    /// The registry owning this module's segments.
    pub fn registry(&self) -> &SegmentRegistry {
        &self.registry
    }

    /// The current control cycle.
    pub fn current_cycle(&self) -> u64 {
        self.current_cycle
    }

    /// Execute one control cycle. Realtime path: no allocation, no locks.
    pub fn step(&mut self, dt_s: f64) {
        let cycle_start = monotonic_ns();
        self.current_cycle += 1;

        // Advance the cycle counter first so strict readers of this cycle's
        // data validate against the new cycle.
        {
            let state = self.cycle_state.value_mut();
            state.current_cycle = self.current_cycle;
            state.cycle_start_ns = cycle_start;
        }
        self.cycle_state.updated_at(cycle_start, self.current_cycle);

        // First-order lag of each joint toward its commanded position.
        let dof = self.config.dof;
        let tau = self.config.tracking_time_constant_s.max(1e-6);
        let alpha = (dt_s / tau).clamp(0.0, 1.0);
        {
            let command = self.joint_command.value();
            for joint in 0..dof {
                let target = command.position_setpoint[joint];
                let previous = self.positions[joint];
                let next = previous + alpha * (target - previous);
                self.velocities[joint] = if dt_s > 0.0 {
                    (next - previous) / dt_s
                } else {
                    0.0
                };
                self.positions[joint] = next;
            }
        }

        {
            let state = self.joint_state.value_mut();
            state.dof = dof as u32;
            state.position[..dof].copy_from_slice(&self.positions[..dof]);
            state.velocity[..dof].copy_from_slice(&self.velocities[..dof]);
        }
        let now = monotonic_ns();
        self.joint_state.updated_at(now, self.current_cycle);

        // Mirror outputs to inputs: the simulation's wiring loopback.
        {
            let bank = self.digital_io.value_mut();
            bank.inputs = bank.outputs;
        }
        self.digital_io.updated_at(now, self.current_cycle);

        let state = self.cycle_state.value_mut();
        state.cycle_duration_ns = monotonic_ns().saturating_sub(cycle_start);
    }

    /// Run the fixed-period cycle until `shutdown` is set.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        let period = Duration::from_micros(self.config.cycle_time_us);
        let dt_s = period.as_secs_f64();
        tracing::info!(
            module = %self.config.name,
            cycle_time_us = self.config.cycle_time_us,
            "entering control cycle"
        );

        let _scope = guard::enter_cycle();
        while !shutdown.load(Ordering::Relaxed) {
            self.step(dt_s);
            std::thread::sleep(period);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_module(dof: usize) -> (tempfile::TempDir, HalModule) {
        let tempdir = tempfile::tempdir().unwrap();
        let dir = tempdir.path().to_string_lossy().into_owned();
        let config = ModuleConfig {
            name: format!("halmod_{}", std::process::id()),
            dof,
            ..ModuleConfig::default()
        };
        let module = HalModule::publish_in(&dir, config).unwrap();
        (tempdir, module)
    }

    #[test]
    fn publish_exposes_the_standard_interface_set() {
        let (_dir, module) = test_module(6);
        let info = module.registry().module_info().unwrap();
        let names = info.value().interface_names();
        for expected in [
            "cycle_state",
            "joint_state",
            "joint_command",
            "joint_limits",
            "digital_io",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn step_advances_cycle_and_stamps_interfaces() {
        let (_dir, mut module) = test_module(3);

        module.step(0.001);
        module.step(0.001);

        let cycle = module.registry().get::<CycleState>(CYCLE_STATE_INTERFACE).unwrap();
        assert_eq!(cycle.value().current_cycle, 2);
        assert_eq!(cycle.last_updated_cycle(), 2);

        let state = module.registry().get::<JointState>("joint_state").unwrap();
        assert_eq!(state.last_updated_cycle(), 2);
        assert_eq!(state.num_updates(), 2);
    }

    #[test]
    fn joints_track_commanded_position() {
        let (_dir, mut module) = test_module(2);

        let mut command = module
            .registry()
            .get_mut::<JointCommand>("joint_command")
            .unwrap();
        command.value_mut().position_setpoint[0] = 1.0;
        command.updated_at(monotonic_ns(), 0);

        // 2 s of simulated time at dt = 10 ms, tau = 50 ms: fully settled.
        for _ in 0..200 {
            module.step(0.01);
        }

        let state = module.registry().get::<JointState>("joint_state").unwrap();
        assert!((state.value().position[0] - 1.0).abs() < 1e-6);
        assert_eq!(state.value().position[1], 0.0);
    }

    #[test]
    fn digital_outputs_loop_back_to_inputs() {
        let (_dir, mut module) = test_module(2);

        let mut io = module
            .registry()
            .get_mut::<DigitalIoBank>("digital_io")
            .unwrap();
        io.value_mut().set_output(7, true);

        module.step(0.001);

        assert!(io.value().input(7));
    }
}
