//! Feature interfaces exposed to actions per slot.
//!
//! Actions never touch shared memory directly; each slot hands them a
//! bundle of small trait objects resolved once at construction time. The
//! shm-backed implementations here wrap (strict) interface handles, so
//! every cycle-time call stays O(1) and allocation-free.

use helix::consts::MAX_DOF;
use helix::rt::{RtCode, RtResult};
use helix::rt_err;
use helix_shm::interfaces::{JointCommand, JointLimits, JointState};
use helix_shm::{InterfaceHandle, StrictHandle, StrictHandleMut, monotonic_ns};

/// A fixed-capacity vector of per-joint values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointVector {
    values: [f64; MAX_DOF],
    len: usize,
}

impl JointVector {
    /// A zeroed vector for `len` joints.
    pub fn zeroed(len: usize) -> Self {
        Self {
            values: [0.0; MAX_DOF],
            len: len.min(MAX_DOF),
        }
    }

    /// Build from a slice. Panics if the slice exceeds `MAX_DOF`; joint
    /// counts are validated at configuration time.
    pub fn from_slice(values: &[f64]) -> Self {
        assert!(values.len() <= MAX_DOF);
        let mut vector = Self::zeroed(values.len());
        vector.values[..values.len()].copy_from_slice(values);
        vector
    }

    /// The meaningful values.
    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len]
    }

    /// Number of joints.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the vector holds no joints.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value at `joint`.
    pub fn get(&self, joint: usize) -> f64 {
        self.values[joint]
    }

    /// Set value at `joint`.
    pub fn set(&mut self, joint: usize, value: f64) {
        self.values[joint] = value;
    }
}

/// Sensed joint positions for one slot.
pub trait JointPositionSensor: Send {
    /// Number of joints this slot drives.
    fn dof(&self) -> usize;

    /// Sensed position of all joints. Fails if the backing interface is
    /// stale for the current cycle.
    fn sensed_position(&self) -> RtResult<JointVector>;
}

/// Joint position setpoint sink for one slot.
pub trait JointPositionCommand: Send {
    /// Number of joints this slot drives.
    fn dof(&self) -> usize;

    /// Send position setpoints for this cycle. Fails if the setpoint count
    /// does not match the slot's joint count.
    fn set_position_setpoints(&mut self, setpoints: &JointVector) -> RtResult<()>;

    /// The setpoints from the previous cycle.
    fn previous_setpoints(&self) -> JointVector;
}

/// Snapshot of a slot's configured joint limits.
#[derive(Debug, Clone, Copy)]
pub struct JointLimitsSnapshot {
    /// Minimum position per joint [rad].
    pub min_position: JointVector,
    /// Maximum position per joint [rad].
    pub max_position: JointVector,
    /// Maximum velocity per joint [rad/s]; meaningful if `has_velocity_limits`.
    pub max_velocity: JointVector,
    /// Maximum effort per joint [Nm]; meaningful if `has_effort_limits`.
    pub max_effort: JointVector,
    /// Whether velocity limits are configured.
    pub has_velocity_limits: bool,
    /// Whether effort limits are configured.
    pub has_effort_limits: bool,
}

/// Joint limits provider for one slot.
pub trait JointLimitsSource: Send {
    /// The limits configured for this slot.
    fn limits(&self) -> RtResult<JointLimitsSnapshot>;
}

// ─── Shared-memory backed implementations ───────────────────────────

/// [`JointPositionSensor`] over a strict `JointState` handle.
pub struct ShmJointPositionSensor {
    handle: StrictHandle<JointState>,
    dof: usize,
}

impl ShmJointPositionSensor {
    /// Wrap a strict joint state handle for a slot with `dof` joints.
    pub fn new(handle: StrictHandle<JointState>, dof: usize) -> Self {
        Self { handle, dof }
    }
}

impl JointPositionSensor for ShmJointPositionSensor {
    fn dof(&self) -> usize {
        self.dof
    }

    fn sensed_position(&self) -> RtResult<JointVector> {
        let state = self.handle.value()?;
        // dof comes from shared memory; clamp rather than trust it.
        let dof = (state.dof as usize).min(MAX_DOF);
        Ok(JointVector::from_slice(&state.position[..dof]))
    }
}

/// [`JointPositionCommand`] over a strict `JointCommand` handle.
pub struct ShmJointPositionCommand {
    handle: StrictHandleMut<JointCommand>,
    dof: usize,
    previous: JointVector,
}

impl ShmJointPositionCommand {
    /// Wrap a strict joint command handle for a slot with `dof` joints.
    pub fn new(handle: StrictHandleMut<JointCommand>, dof: usize) -> Self {
        Self {
            handle,
            dof,
            previous: JointVector::zeroed(dof),
        }
    }
}

impl JointPositionCommand for ShmJointPositionCommand {
    fn dof(&self) -> usize {
        self.dof
    }

    fn set_position_setpoints(&mut self, setpoints: &JointVector) -> RtResult<()> {
        if setpoints.len() != self.dof {
            return Err(rt_err!(
                RtCode::InvalidArgument,
                "expected {} setpoints but got {}",
                self.dof,
                setpoints.len()
            ));
        }
        let command = self.handle.value_mut();
        command.dof = self.dof as u32;
        command.position_setpoint[..setpoints.len()].copy_from_slice(setpoints.as_slice());
        self.handle.updated_at(monotonic_ns());
        self.previous = *setpoints;
        Ok(())
    }

    fn previous_setpoints(&self) -> JointVector {
        self.previous
    }
}

/// [`JointLimitsSource`] over a `JointLimits` handle.
///
/// Limits change rarely (configuration events, not cycles), so this wraps a
/// plain handle rather than a strict one.
pub struct ShmJointLimitsSource {
    handle: InterfaceHandle<JointLimits>,
}

impl ShmJointLimitsSource {
    /// Wrap a joint limits handle.
    pub fn new(handle: InterfaceHandle<JointLimits>) -> Self {
        Self { handle }
    }
}

impl JointLimitsSource for ShmJointLimitsSource {
    fn limits(&self) -> RtResult<JointLimitsSnapshot> {
        let view = self.handle.value();
        let dof = view.num_dof();
        let mut snapshot = JointLimitsSnapshot {
            min_position: JointVector::zeroed(dof),
            max_position: JointVector::zeroed(dof),
            max_velocity: JointVector::zeroed(dof),
            max_effort: JointVector::zeroed(dof),
            has_velocity_limits: view.has_velocity_limits(),
            has_effort_limits: view.has_effort_limits(),
        };
        for joint in 0..dof {
            snapshot.min_position.set(joint, view.min_position(joint));
            snapshot.max_position.set(joint, view.max_position(joint));
            snapshot.max_velocity.set(joint, view.max_velocity(joint));
            snapshot.max_effort.set(joint, view.max_effort(joint));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_vector_roundtrip() {
        let vector = JointVector::from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(vector.len(), 3);
        assert_eq!(vector.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(vector.get(1), 2.0);
    }

    #[test]
    fn zeroed_vector_is_zero() {
        let vector = JointVector::zeroed(4);
        assert_eq!(vector.as_slice(), &[0.0; 4]);
    }

    #[test]
    #[should_panic]
    fn oversized_slice_panics() {
        let values = vec![0.0; MAX_DOF + 1];
        let _ = JointVector::from_slice(&values);
    }
}
