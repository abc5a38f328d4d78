//! Joint state and command interfaces.
//!
//! Fixed-layout payloads: arrays are sized at `MAX_DOF`; `dof` says how many
//! leading entries are meaningful. The writer updates values in place every
//! cycle, readers access them through (strict) handles.

use super::impl_default_zeroed;
use crate::fixed_interface;
use helix::consts::MAX_DOF;

/// Per-joint sensed state, written by the hardware module every cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(8))]
pub struct JointState {
    /// Number of meaningful entries in the arrays below (0..MAX_DOF).
    pub dof: u32,
    _pad: u32,
    /// Sensed position per joint [rad].
    pub position: [f64; MAX_DOF],
    /// Sensed velocity per joint [rad/s].
    pub velocity: [f64; MAX_DOF],
    /// Sensed torque per joint [Nm].
    pub torque: [f64; MAX_DOF],
}

impl JointState {
    /// A zeroed state for `dof` joints.
    pub fn with_dof(dof: u32) -> Self {
        Self {
            dof,
            ..Self::default()
        }
    }
}

/// Per-joint setpoints, written by the control process every cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(8))]
pub struct JointCommand {
    /// Number of meaningful entries in the arrays below (0..MAX_DOF).
    pub dof: u32,
    _pad: u32,
    /// Position setpoint per joint [rad].
    pub position_setpoint: [f64; MAX_DOF],
    /// Velocity feedforward per joint [rad/s].
    pub velocity_feedforward: [f64; MAX_DOF],
    /// Torque feedforward per joint [Nm].
    pub torque_feedforward: [f64; MAX_DOF],
}

impl JointCommand {
    /// A zeroed command for `dof` joints.
    pub fn with_dof(dof: u32) -> Self {
        Self {
            dof,
            ..Self::default()
        }
    }
}

impl_default_zeroed!(JointState, JointCommand);

fixed_interface!(JointState, "helix.joint_state");
fixed_interface!(JointCommand, "helix.joint_command");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::Interface;

    #[test]
    fn defaults_are_zeroed() {
        let state = JointState::default();
        assert_eq!(state.dof, 0);
        assert!(state.position.iter().all(|&p| p == 0.0));

        let command = JointCommand::with_dof(6);
        assert_eq!(command.dof, 6);
        assert!(command.position_setpoint.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn type_ids_differ() {
        assert_ne!(JointState::TYPE_ID, JointCommand::TYPE_ID);
    }

    #[test]
    fn payload_sizes_are_layout_determined() {
        assert_eq!(
            JointState::MAX_SIZE,
            8 + 3 * 8 * MAX_DOF
        );
        assert_eq!(JointState::MAX_SIZE, JointCommand::MAX_SIZE);
    }
}
