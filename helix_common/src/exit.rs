//! Process exit codes.
//!
//! Shared between the server envelope and the supervising infrastructure so
//! that a restart policy can distinguish fault classes.

/// Exit codes used by Helix binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Clean shutdown.
    Ok = 0,
    /// Startup failed before the service became reachable.
    StartupFailure = 100,
    /// A control runtime rebuild exceeded its watchdog deadline.
    ///
    /// Deliberate fail-fast: a wedged rebuild holding readers hostage is
    /// worse than restarting the process under external supervision.
    FatalFaultDuringRebuild = 110,
}

impl ExitCode {
    /// Raw value passed to `std::process::exit`.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_and_stable() {
        assert_eq!(ExitCode::Ok.code(), 0);
        assert_eq!(ExitCode::StartupFailure.code(), 100);
        assert_eq!(ExitCode::FatalFaultDuringRebuild.code(), 110);
    }
}
