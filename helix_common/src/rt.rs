//! Allocation-free status type for the control cycle.
//!
//! Construction-time errors (segment lookup, handle validation) are allowed
//! to be rich and allocating; anything produced *inside* the control cycle
//! must not touch the heap. [`RtError`] carries a status code plus a
//! fixed-capacity, truncating message buffer so it can be built and
//! propagated from a realtime context.
//!
//! Use [`rt_err!`] to build an error with formatted context:
//!
//! ```rust
//! use helix_common::{rt_err, rt::{RtCode, RtResult}};
//!
//! fn read_slot(index: usize, len: usize) -> RtResult<usize> {
//!     if index >= len {
//!         return Err(rt_err!(RtCode::NotFound, "no slot with id {index}"));
//!     }
//!     Ok(index)
//! }
//! ```

use core::fmt::{self, Write as _};

/// Message capacity of [`RtError`] in bytes. Longer messages truncate.
pub const RT_MSG_CAPACITY: usize = 96;

/// Status code taxonomy for cycle-time errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RtCode {
    /// Requested entity (signal id, slot id) does not exist.
    NotFound,
    /// State required for the operation is not satisfied (e.g. stale data).
    FailedPrecondition,
    /// Caller supplied an invalid value.
    InvalidArgument,
    /// Subsystem is not currently able to serve the request.
    Unavailable,
    /// Invariant violation inside the control layer itself.
    Internal,
}

impl RtCode {
    /// Short text form used in log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Unavailable => "UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }
}

/// Realtime-safe error: code + fixed-capacity message.
///
/// `Clone`/`PartialEq` are cheap; the whole value lives on the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtError {
    code: RtCode,
    msg: heapless::String<RT_MSG_CAPACITY>,
}

/// Result alias for cycle-time operations.
pub type RtResult<T> = Result<T, RtError>;

impl RtError {
    /// Build an error from preformatted arguments. Prefer [`rt_err!`].
    pub fn format(code: RtCode, args: fmt::Arguments<'_>) -> Self {
        let mut msg = heapless::String::new();
        // Truncating sink: formatting never fails, overflow drops the tail.
        let _ = Truncating(&mut msg).write_fmt(args);
        Self { code, msg }
    }

    /// Build an error from a plain message.
    pub fn new(code: RtCode, msg: &str) -> Self {
        Self::format(code, format_args!("{msg}"))
    }

    /// NotFound with a plain message.
    pub fn not_found(msg: &str) -> Self {
        Self::new(RtCode::NotFound, msg)
    }

    /// FailedPrecondition with a plain message.
    pub fn failed_precondition(msg: &str) -> Self {
        Self::new(RtCode::FailedPrecondition, msg)
    }

    /// InvalidArgument with a plain message.
    pub fn invalid_argument(msg: &str) -> Self {
        Self::new(RtCode::InvalidArgument, msg)
    }

    /// Unavailable with a plain message.
    pub fn unavailable(msg: &str) -> Self {
        Self::new(RtCode::Unavailable, msg)
    }

    /// Internal with a plain message.
    pub fn internal(msg: &str) -> Self {
        Self::new(RtCode::Internal, msg)
    }

    /// The status code.
    pub fn code(&self) -> RtCode {
        self.code
    }

    /// The (possibly truncated) message text.
    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for RtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.msg)
    }
}

impl std::error::Error for RtError {}

/// `fmt::Write` sink that silently truncates at capacity instead of failing.
struct Truncating<'a>(&'a mut heapless::String<RT_MSG_CAPACITY>);

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = RT_MSG_CAPACITY - self.0.len();
        let mut end = s.len().min(room);
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        // push_str only errors on overflow, which the clamp above rules out.
        let _ = self.0.push_str(&s[..end]);
        Ok(())
    }
}

/// Build an [`RtError`] with formatted context, without heap allocation.
#[macro_export]
macro_rules! rt_err {
    ($code:expr, $($arg:tt)*) => {
        $crate::rt::RtError::format($code, core::format_args!($($arg)*))
    };
}
