//! Typed hardware-interface handles.
//!
//! Three variants over the same underlying segment:
//!
//! - [`InterfaceHandle`]: read-only value accessors.
//! - [`InterfaceHandleMut`]: adds in-place mutation and update stamping.
//! - [`StrictHandle`] / [`StrictHandleMut`]: additionally compare the
//!   interface's last-updated cycle against the cycle counter interface on
//!   every read, detecting stale data without blocking or allocating.
//!
//! Construction performs the header check and structural validation exactly
//! once (non-realtime); every subsequent access is O(1) and allocation-free,
//! suitable for the control cycle.

use crate::error::{ShmError, ShmResult};
use crate::interface::Interface;
use crate::interfaces::CycleState;
use crate::segment::{MappedSegment, SEGMENT_VERSION};
use helix::rt::{RtCode, RtError, RtResult};
use helix::rt_err;
use std::marker::PhantomData;
use std::sync::Arc;

/// Header check: layout version and type id must match the compiled
/// expectation, then the payload must pass the type's structural validation.
///
/// This is the only defense against a stale module talking to a newer or
/// older controller, so mismatches report both found and expected values.
pub(crate) fn check_segment<T: Interface>(segment: &MappedSegment) -> ShmResult<()> {
    let name = segment.name();
    let header = segment.header();
    header.check_magic(name)?;

    if header.layout_version() != SEGMENT_VERSION {
        return Err(ShmError::VersionMismatch {
            interface: name.to_string(),
            found: header.layout_version(),
            expected: SEGMENT_VERSION,
        });
    }
    if header.type_id() != T::TYPE_ID {
        return Err(ShmError::TypeMismatch {
            interface: name.to_string(),
            found: header.type_id().to_string(),
            expected: T::TYPE_ID.to_string(),
        });
    }

    T::validate(segment.payload(), name)
}

/// Read-only handle to a hardware interface segment.
pub struct InterfaceHandle<T: Interface> {
    segment: Arc<MappedSegment>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Interface> InterfaceHandle<T> {
    pub(crate) fn new(segment: Arc<MappedSegment>) -> ShmResult<Self> {
        check_segment::<T>(&segment)?;
        segment.header().add_reader();
        Ok(Self {
            segment,
            _marker: PhantomData,
        })
    }

    /// Interface name this handle was resolved under.
    pub fn name(&self) -> &str {
        self.segment.name()
    }

    /// Read-only view of the payload.
    #[inline]
    pub fn value(&self) -> T::View<'_> {
        T::view(self.segment.payload())
    }

    /// Number of updates made to the segment. Helps detect missing updates.
    #[inline]
    pub fn num_updates(&self) -> u64 {
        self.segment.header().num_updates()
    }

    /// Monotonic time the segment was last updated [ns].
    #[inline]
    pub fn last_updated_ns(&self) -> u64 {
        self.segment.header().last_updated_ns()
    }

    /// Control cycle the segment was last updated in.
    #[inline]
    pub fn last_updated_cycle(&self) -> u64 {
        self.segment.header().last_updated_cycle()
    }
}

impl<T: Interface> std::fmt::Debug for InterfaceHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceHandle")
            .field("name", &self.segment.name())
            .finish()
    }
}

impl<T: Interface> Clone for InterfaceHandle<T> {
    fn clone(&self) -> Self {
        self.segment.header().add_reader();
        Self {
            segment: Arc::clone(&self.segment),
            _marker: PhantomData,
        }
    }
}

impl<T: Interface> Drop for InterfaceHandle<T> {
    fn drop(&mut self) {
        self.segment.header().remove_reader();
    }
}

/// Read-write handle to a hardware interface segment.
///
/// Thread-compatible, not thread-safe: the system runs a single writer per
/// interface, and readers detect (rather than exclude) concurrent updates
/// via the cycle counter comparison in the strict handles.
pub struct InterfaceHandleMut<T: Interface> {
    segment: Arc<MappedSegment>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Interface> InterfaceHandleMut<T> {
    pub(crate) fn new(segment: Arc<MappedSegment>) -> ShmResult<Self> {
        check_segment::<T>(&segment)?;
        segment.header().add_writer();
        Ok(Self {
            segment,
            _marker: PhantomData,
        })
    }

    /// Interface name this handle was resolved under.
    pub fn name(&self) -> &str {
        self.segment.name()
    }

    /// Read-only view of the payload.
    #[inline]
    pub fn value(&self) -> T::View<'_> {
        T::view(self.segment.payload())
    }

    /// Mutable view of the payload. In-place field mutation only; the
    /// payload was constructed once at fixed maximum size and never grows.
    #[inline]
    pub fn value_mut(&mut self) -> T::ViewMut<'_> {
        // SAFETY: &mut self gives this handle exclusive mutation rights;
        // one writer per interface is the system-wide contract.
        T::view_mut(unsafe { self.segment.payload_mut() })
    }

    /// Stamp the segment as updated at `time_ns` in `cycle` and increment
    /// the update counter. Call once per cycle after all values are written.
    #[inline]
    pub fn updated_at(&mut self, time_ns: u64, cycle: u64) {
        self.segment.header().updated_at(time_ns, cycle);
    }

    /// Number of updates made to the segment.
    #[inline]
    pub fn num_updates(&self) -> u64 {
        self.segment.header().num_updates()
    }

    /// Monotonic time the segment was last updated [ns].
    #[inline]
    pub fn last_updated_ns(&self) -> u64 {
        self.segment.header().last_updated_ns()
    }

    /// Control cycle the segment was last updated in.
    #[inline]
    pub fn last_updated_cycle(&self) -> u64 {
        self.segment.header().last_updated_cycle()
    }
}

impl<T: Interface> Drop for InterfaceHandleMut<T> {
    fn drop(&mut self) {
        self.segment.header().remove_writer();
    }
}

/// Checks that `last_updated_cycle` matches the cycle counter's current
/// cycle. Returns FailedPrecondition otherwise. Allocation-free.
fn check_updated_this_cycle(
    cycle_state: &InterfaceHandle<CycleState>,
    last_updated_cycle: u64,
) -> RtResult<()> {
    let current = cycle_state.value().current_cycle;
    if cycle_state.last_updated_cycle() != current {
        return Err(RtError::failed_precondition(
            "cycle counter interface is inconsistent",
        ));
    }
    if last_updated_cycle != current {
        return Err(rt_err!(
            RtCode::FailedPrecondition,
            "interface was not updated this cycle: cycle[{current}] != interface[{last_updated_cycle}]"
        ));
    }
    Ok(())
}

/// Read-only handle whose every access is checked against the cycle counter.
///
/// Prefer this over [`InterfaceHandle`] for reading commands and status
/// inside the control cycle.
pub struct StrictHandle<T: Interface> {
    interface: InterfaceHandle<T>,
    cycle_state: InterfaceHandle<CycleState>,
}

impl<T: Interface> StrictHandle<T> {
    /// Wrap a handle plus the module's cycle counter interface.
    pub fn new(interface: InterfaceHandle<T>, cycle_state: InterfaceHandle<CycleState>) -> Self {
        Self {
            interface,
            cycle_state,
        }
    }

    /// Read-only view, checked to have been updated in the current cycle.
    /// Returns FailedPrecondition when not.
    #[inline]
    pub fn value(&self) -> RtResult<T::View<'_>> {
        check_updated_this_cycle(&self.cycle_state, self.interface.last_updated_cycle())?;
        Ok(self.interface.value())
    }

    /// Number of updates made to the segment.
    pub fn num_updates(&self) -> u64 {
        self.interface.num_updates()
    }

    /// Control cycle the segment was last updated in.
    pub fn last_updated_cycle(&self) -> u64 {
        self.interface.last_updated_cycle()
    }
}

/// Read-write handle whose reads are checked against the cycle counter.
///
/// Writes are unchecked; call [`StrictHandleMut::updated_at`] once all
/// values for the cycle are written.
pub struct StrictHandleMut<T: Interface> {
    interface: InterfaceHandleMut<T>,
    cycle_state: InterfaceHandle<CycleState>,
}

impl<T: Interface> StrictHandleMut<T> {
    /// Wrap a mutable handle plus the module's cycle counter interface.
    pub fn new(
        interface: InterfaceHandleMut<T>,
        cycle_state: InterfaceHandle<CycleState>,
    ) -> Self {
        Self {
            interface,
            cycle_state,
        }
    }

    /// Read-only view, checked to have been updated in the current cycle.
    #[inline]
    pub fn value(&self) -> RtResult<T::View<'_>> {
        check_updated_this_cycle(&self.cycle_state, self.interface.last_updated_cycle())?;
        Ok(self.interface.value())
    }

    /// Mutable view. Not cycle-checked.
    #[inline]
    pub fn value_mut(&mut self) -> T::ViewMut<'_> {
        self.interface.value_mut()
    }

    /// Stamp the segment as updated at `time_ns` in the cycle counter's
    /// current cycle.
    #[inline]
    pub fn updated_at(&mut self, time_ns: u64) {
        let cycle = self.cycle_state.value().current_cycle;
        self.interface.updated_at(time_ns, cycle);
    }

    /// Number of updates made to the segment.
    pub fn num_updates(&self) -> u64 {
        self.interface.num_updates()
    }

    /// Control cycle the segment was last updated in.
    pub fn last_updated_cycle(&self) -> u64 {
        self.interface.last_updated_cycle()
    }
}
