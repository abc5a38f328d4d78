//! The distinguished cycle counter interface.
//!
//! Published once per module under the reserved name
//! `helix_common::consts::CYCLE_STATE_INTERFACE`. The realtime writer
//! advances `current_cycle` exactly once per control cycle; strict handles
//! compare every other interface's last-updated cycle against it to detect
//! stale data without blocking or allocating.

use crate::fixed_interface;

/// Cycle counter payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C, align(8))]
pub struct CycleState {
    /// Current control cycle, monotonically increasing.
    pub current_cycle: u64,
    /// Monotonic timestamp of the cycle start [ns].
    pub cycle_start_ns: u64,
    /// Duration of the previous cycle [ns].
    pub cycle_duration_ns: u64,
}

fixed_interface!(CycleState, "helix.cycle_state");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::Interface;

    #[test]
    fn default_is_cycle_zero() {
        let state = CycleState::default();
        assert_eq!(state.current_cycle, 0);
        assert_eq!(state.cycle_start_ns, 0);
    }

    #[test]
    fn type_id_is_registered() {
        assert_eq!(CycleState::TYPE_ID, "helix.cycle_state");
        assert_eq!(CycleState::MAX_SIZE, 24);
    }
}
