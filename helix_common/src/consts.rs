//! System-wide constants for the Helix workspace.
//!
//! Single source of truth for all numeric limits and reserved names.
//! Imported by all crates — no duplication permitted.

/// Maximum number of degrees of freedom per slot.
pub const MAX_DOF: usize = 32;

/// Maximum number of realtime signals an action may declare.
pub const MAX_SIGNALS: usize = 64;

/// Maximum number of slots a server may expose.
pub const MAX_SLOTS: usize = 16;

/// Maximum number of digital I/O channels per bank.
pub const MAX_DIGITAL_IO: usize = 1024;

/// Digital I/O bank width — 1024 bits packed into 16×u64.
pub const IO_BANK_WORDS: usize = MAX_DIGITAL_IO / 64;

/// Maximum number of interfaces a single module may publish.
pub const MAX_INTERFACES: usize = 32;

/// Maximum length of an interface name, including the NUL terminator.
pub const MAX_INTERFACE_NAME: usize = 48;

/// Default control cycle time in microseconds (1 kHz = 1000 µs).
pub const CYCLE_TIME_US: u64 = 1000;

/// Prefix for all Helix shared memory files in `/dev/shm`.
pub const SHM_PREFIX: &str = "helix_";

/// Reserved interface name of the cycle counter segment.
///
/// Every module publishes this interface; strict handles compare the
/// last-updated cycle of other interfaces against it.
pub const CYCLE_STATE_INTERFACE: &str = "cycle_state";

/// Reserved interface name enumerating all interfaces a module publishes.
pub const MODULE_INFO_INTERFACE: &str = "module_info";

/// Default configuration directory path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/helix/config";
