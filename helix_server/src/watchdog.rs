//! Rebuild watchdog.
//!
//! There is no way to wait with a timeout on the envelope's write lock,
//! only to block on it. So the rebuild path arms a deadline thread before
//! blocking: if the lock is not acquired (and the watchdog disarmed) before
//! the deadline, the timeout handler fires. The production handler
//! terminates the process: a wedged rebuild holding readers hostage is
//! worse than restarting under external supervision. Tests inject their own
//! handler instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Handler invoked when the rebuild deadline elapses.
pub type TimeoutHandler = Arc<dyn Fn() + Send + Sync>;

/// The production timeout handler: log and terminate the process.
pub fn exit_process_handler() -> TimeoutHandler {
    Arc::new(|| {
        tracing::error!(
            "rebuild watchdog deadline elapsed while waiting for in-flight \
             requests; terminating for external restart"
        );
        std::process::exit(helix::exit::ExitCode::FatalFaultDuringRebuild.code());
    })
}

/// Deadline thread armed around the rebuild's exclusive-lock acquisition.
pub struct RebuildWatchdog {
    disarmed: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

/// Poll interval of the deadline thread.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl RebuildWatchdog {
    /// Arm a watchdog that fires `on_timeout` if not disarmed within
    /// `deadline`.
    pub fn arm(deadline: Duration, on_timeout: TimeoutHandler) -> Self {
        let disarmed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&disarmed);
        let expires_at = Instant::now() + deadline;

        let thread = thread::Builder::new()
            .name("rebuild-watchdog".to_string())
            .spawn(move || {
                while Instant::now() < expires_at {
                    if flag.load(Ordering::Acquire) {
                        return;
                    }
                    thread::sleep(POLL_INTERVAL.min(deadline));
                }
                if !flag.load(Ordering::Acquire) {
                    on_timeout();
                }
            })
            .expect("failed to spawn rebuild watchdog thread");

        Self {
            disarmed,
            thread: Some(thread),
        }
    }

    /// Disarm the watchdog and wait for its thread to exit.
    pub fn disarm(mut self) {
        self.disarm_inner();
    }

    fn disarm_inner(&mut self) {
        self.disarmed.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for RebuildWatchdog {
    fn drop(&mut self) {
        self.disarm_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disarmed_watchdog_does_not_fire() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let watchdog = RebuildWatchdog::arm(
            Duration::from_millis(50),
            Arc::new(move || flag.store(true, Ordering::SeqCst)),
        );
        watchdog.disarm();

        thread::sleep(Duration::from_millis(120));
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn armed_watchdog_fires_after_deadline() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let watchdog = RebuildWatchdog::arm(
            Duration::from_millis(30),
            Arc::new(move || flag.store(true, Ordering::SeqCst)),
        );

        thread::sleep(Duration::from_millis(200));
        assert!(fired.load(Ordering::SeqCst));
        drop(watchdog);
    }

    #[test]
    fn drop_disarms() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        {
            let _watchdog = RebuildWatchdog::arm(
                Duration::from_millis(50),
                Arc::new(move || flag.store(true, Ordering::SeqCst)),
            );
        }
        thread::sleep(Duration::from_millis(120));
        assert!(!fired.load(Ordering::SeqCst));
    }
}
