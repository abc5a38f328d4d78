//! Integration tests for the service envelope.
//!
//! Covers the rebuild state machine (restart, clear-faults), the
//! no-half-swap guarantee under concurrent readers, stream cancellation
//! during rebuild, and the watchdog's injected timeout path.

use helix_server::{
    Envelope, EnvelopeConfig, EnvelopeError, OperationalState, SessionRequest,
    SimFactoryHandle, SimRuntimeOptions, sim_runtime_factory,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

fn envelope_with(options: SimRuntimeOptions, timeout: Duration) -> (Envelope, SimFactoryHandle) {
    let (factory, handle) = sim_runtime_factory(options);
    let envelope = Envelope::new(
        EnvelopeConfig {
            rebuild_timeout: timeout,
        },
        factory,
    );
    (envelope, handle)
}

fn default_envelope() -> (Envelope, SimFactoryHandle) {
    envelope_with(SimRuntimeOptions::default(), Duration::from_secs(5))
}

// ─── Basic forwarding ───────────────────────────────────────────────

#[test]
fn methods_forward_to_the_current_runtime() {
    let (envelope, handle) = default_envelope();
    assert_eq!(handle.build_count(), 1);

    let status = envelope.get_status().unwrap();
    assert_eq!(status.generation, 1);
    assert_eq!(status.operational.state, OperationalState::Disabled);

    envelope.enable().unwrap();
    assert_eq!(
        envelope.get_operational_status().state,
        OperationalState::Enabled
    );

    envelope.set_speed_override(0.5).unwrap();
    assert_eq!(envelope.get_speed_override().unwrap(), 0.5);

    let signatures = envelope.list_action_signatures().unwrap();
    assert!(!signatures.is_empty());
    assert!(
        envelope
            .get_action_signature("helix.hold_position")
            .unwrap()
            .is_some()
    );

    envelope.gpio_write_signal("tool_clamp", true).unwrap();
    assert!(envelope.gpio_read_signal("tool_clamp").unwrap());
}

#[test]
fn empty_slot_reports_unavailable_on_every_method_except_status() {
    let (factory, _handle) = sim_runtime_factory(SimRuntimeOptions::default());
    let envelope = Envelope::without_initial_runtime(
        EnvelopeConfig {
            rebuild_timeout: Duration::from_secs(5),
        },
        factory,
    );

    assert!(matches!(
        envelope.get_status(),
        Err(EnvelopeError::Unavailable { .. })
    ));
    assert!(matches!(
        envelope.enable(),
        Err(EnvelopeError::Unavailable { .. })
    ));
    assert!(matches!(
        envelope.gpio_read_signal("tool_clamp"),
        Err(EnvelopeError::Unavailable { .. })
    ));

    // The status query itself succeeds with a structured faulted report.
    let status = envelope.get_operational_status();
    assert_eq!(status.state, OperationalState::Faulted);
    assert!(status.fault_reason.unwrap().contains("not set yet"));

    // The first restart builds the first runtime.
    envelope.restart().unwrap();
    assert!(envelope.get_status().is_ok());
}

// ─── Rebuild transitions ────────────────────────────────────────────

#[test]
fn restart_always_rebuilds_exactly_once() {
    let (envelope, handle) = default_envelope();
    assert_eq!(handle.build_count(), 1);

    envelope.restart().unwrap();
    assert_eq!(handle.build_count(), 2);
    assert_eq!(envelope.get_status().unwrap().generation, 2);

    // Restart is unconditional: no fault required.
    envelope.restart().unwrap();
    assert_eq!(handle.build_count(), 3);
}

#[test]
fn clear_faults_rebuilds_only_while_faulted() {
    let (envelope, handle) = default_envelope();

    // Healthy runtime: clear_faults forwards, no rebuild.
    envelope.clear_faults().unwrap();
    assert_eq!(handle.build_count(), 1);

    // Persistent fault: services stop resolving, wrapped calls fail...
    handle.inject_fatal_fault("encoder glitch");
    assert!(matches!(
        envelope.get_status(),
        Err(EnvelopeError::Unavailable { .. })
    ));
    let status = envelope.get_operational_status();
    assert_eq!(status.state, OperationalState::Faulted);
    assert!(status.fault_reason.unwrap().contains("encoder glitch"));

    // ...and clear_faults triggers exactly one rebuild.
    envelope.clear_faults().unwrap();
    assert_eq!(handle.build_count(), 2);
    assert_eq!(envelope.get_status().unwrap().generation, 2);

    // Faults do not survive the swap.
    assert_eq!(
        envelope.get_operational_status().state,
        OperationalState::Disabled
    );
}

#[test]
fn factory_failure_is_stored_and_recoverable() {
    let (envelope, handle) = default_envelope();

    handle.fail_next_build();
    let err = envelope.restart().unwrap_err();
    assert!(matches!(err, EnvelopeError::Unavailable { .. }));

    // Every wrapped call now propagates the stored factory error.
    assert!(matches!(
        envelope.get_status(),
        Err(EnvelopeError::Unavailable { .. })
    ));
    let status = envelope.get_operational_status();
    assert_eq!(status.state, OperationalState::Faulted);
    assert!(status.fault_reason.unwrap().contains("bring-up failure"));

    // Clear-faults sees the stored error and rebuilds successfully.
    envelope.clear_faults().unwrap();
    assert!(envelope.get_status().is_ok());
}

// ─── Swap atomicity ─────────────────────────────────────────────────

#[test]
fn readers_never_observe_a_half_swapped_runtime() {
    let (envelope, handle) = default_envelope();
    let envelope = Arc::new(envelope);
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let envelope = Arc::clone(&envelope);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut seen = Vec::new();
                while !stop.load(Ordering::Relaxed) {
                    match envelope.get_status() {
                        Ok(status) => seen.push(status.generation),
                        Err(e) => panic!("reader observed an unavailable runtime: {e}"),
                    }
                }
                seen
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(30));
    envelope.restart().unwrap();
    thread::sleep(Duration::from_millis(30));
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        let seen = reader.join().unwrap();
        assert!(!seen.is_empty());
        // Each call saw generation 1 or 2, never anything else, and the
        // sequence is monotonic: once the swap is visible it stays visible.
        assert!(seen.iter().all(|&g| g == 1 || g == 2));
        let mut sorted = seen.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, seen, "generation went backwards");
    }
    assert_eq!(handle.build_count(), 2);
}

// ─── Streams and cancellation ───────────────────────────────────────

#[test]
fn rebuild_cancels_long_lived_streams() {
    let (envelope, handle) = default_envelope();
    let envelope = Arc::new(envelope);

    let session = {
        let envelope = Arc::clone(&envelope);
        thread::spawn(move || {
            envelope.open_session(SessionRequest {
                max_duration_ms: 10_000,
            })
        })
    };

    // Let the session take its shared lock, then rebuild.
    thread::sleep(Duration::from_millis(50));
    envelope.restart().unwrap();

    let summary = session.join().unwrap().unwrap();
    assert!(summary.cancelled, "rebuild should cancel in-flight streams");
    assert_eq!(handle.build_count(), 2);
}

// ─── Watchdog ───────────────────────────────────────────────────────

#[test]
fn watchdog_fires_when_a_reader_outlives_the_deadline() {
    // Streams ignore cancellation: the rebuild's exclusive lock stays
    // blocked past the watchdog deadline.
    let (envelope, _handle) = envelope_with(
        SimRuntimeOptions {
            honor_cancellation: false,
            ..SimRuntimeOptions::default()
        },
        Duration::from_millis(150),
    );

    let fired = Arc::new(AtomicBool::new(false));
    let observer = {
        let fired = Arc::clone(&fired);
        Arc::new(move || fired.store(true, Ordering::SeqCst))
    };
    let envelope = Arc::new(envelope.with_watchdog_handler(observer));

    let session = {
        let envelope = Arc::clone(&envelope);
        thread::spawn(move || {
            envelope.open_session(SessionRequest {
                max_duration_ms: 700,
            })
        })
    };

    thread::sleep(Duration::from_millis(50));
    // Blocks until the stubborn session finally returns; the watchdog
    // deadline (150 ms) elapses long before that.
    envelope.restart().unwrap();

    assert!(
        fired.load(Ordering::SeqCst),
        "watchdog should have fired while the rebuild was blocked"
    );
    let summary = session.join().unwrap().unwrap();
    assert!(!summary.cancelled);
}

#[test]
fn watchdog_stays_quiet_when_rebuild_is_fast() {
    let (envelope, _handle) =
        envelope_with(SimRuntimeOptions::default(), Duration::from_millis(200));

    let fired = Arc::new(AtomicBool::new(false));
    let observer = {
        let fired = Arc::clone(&fired);
        Arc::new(move || fired.store(true, Ordering::SeqCst))
    };
    let envelope = envelope.with_watchdog_handler(observer);

    envelope.restart().unwrap();
    thread::sleep(Duration::from_millis(350));
    assert!(!fired.load(Ordering::SeqCst));
}
