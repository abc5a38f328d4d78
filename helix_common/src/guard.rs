//! Realtime-safety guard.
//!
//! The control-cycle thread marks itself with [`CycleScope`]; non-realtime
//! operations (segment mapping, name resolution) call
//! [`assert_non_realtime`] at their entry points. In debug builds a
//! violation panics; in release builds it is logged and execution
//! continues, on the grounds that a controller mid-motion is better off
//! logging a diagnosable misuse than dying on it.

use std::cell::Cell;

thread_local! {
    static IN_CYCLE: Cell<bool> = const { Cell::new(false) };
}

/// RAII marker for the control-cycle execution domain.
///
/// While a `CycleScope` is alive on a thread, that thread is considered
/// realtime and must not reach any blocking or allocating entry point.
pub struct CycleScope {
    _priv: (),
}

/// Mark the current thread as executing the control cycle.
pub fn enter_cycle() -> CycleScope {
    IN_CYCLE.with(|f| f.set(true));
    CycleScope { _priv: () }
}

impl Drop for CycleScope {
    fn drop(&mut self) {
        IN_CYCLE.with(|f| f.set(false));
    }
}

/// Returns true if the current thread is inside a [`CycleScope`].
pub fn in_cycle() -> bool {
    IN_CYCLE.with(|f| f.get())
}

/// Assert that the caller is not on the control-cycle thread.
///
/// Panics in debug builds; logs and continues in release builds.
pub fn assert_non_realtime(operation: &str) {
    if in_cycle() {
        if cfg!(debug_assertions) {
            panic!("non-realtime operation '{operation}' called from the control cycle");
        }
        tracing::error!(
            operation,
            "non-realtime operation called from the control cycle"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_marks_and_unmarks_thread() {
        assert!(!in_cycle());
        {
            let _scope = enter_cycle();
            assert!(in_cycle());
        }
        assert!(!in_cycle());
    }

    #[test]
    fn assert_outside_cycle_is_quiet() {
        assert_non_realtime("unit test");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "non-realtime operation")]
    fn assert_inside_cycle_panics_in_debug() {
        let _scope = enter_cycle();
        assert_non_realtime("map segment");
    }
}
