//! Error types for shared memory interface operations.

use thiserror::Error;

/// Errors that can occur while publishing or attaching hardware interfaces.
///
/// All of these are construction-time errors: they are resolved once, before
/// the control cycle starts, and are allowed to allocate. Cycle-time failures
/// use `helix_common::rt::RtError` instead.
#[derive(Error, Debug)]
pub enum ShmError {
    /// Interface already registered under this name.
    #[error("Interface already exists: {name}")]
    AlreadyExists {
        /// Interface name
        name: String,
    },

    /// Interface not found.
    #[error("Interface not found: {name}")]
    NotFound {
        /// Interface name
        name: String,
    },

    /// Read-write access requested against a registry not opened for writing.
    #[error("Permission denied: interface '{name}' was not opened for writing")]
    PermissionDenied {
        /// Interface name
        name: String,
    },

    /// Segment layout version does not match the compiled expectation.
    ///
    /// The only defense against a stale module talking to a newer or older
    /// controller. Never auto-corrected.
    #[error(
        "Version mismatch: Interface '{interface}' has version '{found}' \
         but expected version '{expected}'"
    )]
    VersionMismatch {
        /// Interface name
        interface: String,
        /// Version found in the segment header
        found: u32,
        /// Version compiled into this binary
        expected: u32,
    },

    /// Segment carries a different interface type than requested.
    #[error(
        "Type mismatch: Interface '{interface}' has type '{found}' \
         but expected type '{expected}'"
    )]
    TypeMismatch {
        /// Interface name
        interface: String,
        /// Type id found in the segment header
        found: String,
        /// Type id of the requested interface type
        expected: String,
    },

    /// Structural verification of a variable-layout payload failed.
    #[error(
        "Validation failed for interface '{interface}': {reason}. \
         This can be due to a version mismatch between producer and consumer."
    )]
    ValidationError {
        /// Interface name
        interface: String,
        /// What the verifier rejected
        reason: String,
    },

    /// Segment is too small for the requested interface type.
    #[error(
        "Interface '{name}': segment payload of {size} bytes must be >= {required} bytes. \
         This can be due to a version mismatch between producer and consumer."
    )]
    InvalidSize {
        /// Interface name
        name: String,
        /// Actual payload size in bytes
        size: usize,
        /// Minimum size required by the type
        required: usize,
    },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },

    /// Nix system call error
    #[error("System call error: {source}")]
    Nix {
        /// Source nix error
        #[from]
        source: nix::Error,
    },
}

/// Result type for shared memory interface operations.
pub type ShmResult<T> = Result<T, ShmError>;
