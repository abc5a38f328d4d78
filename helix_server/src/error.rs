//! Request-domain error type.
//!
//! Errors here flow back to external callers as the failure of a wrapped
//! RPC method. They are always recoverable by retry or by an explicit
//! rebuild. The one non-recoverable path (the rebuild watchdog) does not
//! produce an error at all, it terminates the process.

use thiserror::Error;

/// Failure of a wrapped control or GPIO method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// No control runtime is currently available.
    #[error("Unavailable: {reason}")]
    Unavailable {
        /// Why the runtime is absent (initializing, factory error, fault).
        reason: String,
    },

    /// The requested entity does not exist.
    #[error("Not found: {name}")]
    NotFound {
        /// Name of the missing entity.
        name: String,
    },

    /// The runtime's state does not permit the operation.
    #[error("Failed precondition: {message}")]
    FailedPrecondition {
        /// What was violated.
        message: String,
    },

    /// The caller supplied an invalid value.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was invalid.
        message: String,
    },

    /// Invariant violation inside the envelope or runtime.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the violation.
        message: String,
    },
}

impl EnvelopeError {
    /// Unavailable with a reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// FailedPrecondition with a message.
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::FailedPrecondition {
            message: message.into(),
        }
    }

    /// InvalidArgument with a message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Internal with a message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = EnvelopeError::unavailable("control runtime is not set yet");
        assert_eq!(err.to_string(), "Unavailable: control runtime is not set yet");

        let err = EnvelopeError::NotFound {
            name: "tool_clamp".to_string(),
        };
        assert!(err.to_string().contains("tool_clamp"));
    }

    #[test]
    fn errors_are_cloneable_for_the_runtime_slot() {
        let err = EnvelopeError::unavailable("factory failed");
        assert_eq!(err.clone(), err);
    }
}
