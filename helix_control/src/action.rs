//! The realtime action contract.
//!
//! Factory-time and cycle-time are strictly separated: a factory gets an
//! `ActionFactoryContext` and may allocate, look up names and fail richly;
//! the constructed action only ever sees a [`CycleContext`] and must stay
//! allocation-free and non-blocking.

use crate::signals::SignalAccess;
use crate::slots::SlotMap;
use helix::rt::RtResult;

/// Everything an action may touch during one control cycle.
pub struct CycleContext<'a> {
    /// Per-slot feature interfaces, indexed by resolved slot IDs.
    pub slots: &'a mut SlotMap,
    /// Realtime signal storage, indexed by resolved signal IDs.
    pub signals: &'a mut SignalAccess,
    /// The current control cycle.
    pub current_cycle: u64,
}

/// A control action running inside the realtime cycle.
///
/// Implementations resolve all names (slots, signals, interfaces) at
/// construction time through the factory context and store the dense IDs;
/// the cycle methods below must not allocate, block or look up names.
pub trait RealtimeAction: Send {
    /// Called once when the action becomes the active action of its slots,
    /// still outside the first cycle that runs it.
    fn on_activate(&mut self) -> RtResult<()> {
        Ok(())
    }

    /// Called every control cycle while the action is active.
    fn cycle(&mut self, ctx: &mut CycleContext<'_>) -> RtResult<()>;
}
