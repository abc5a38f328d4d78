//! The swappable control runtime slot.
//!
//! A [`ControlRuntime`] owns the live control and GPIO services, or an
//! error standing in for "not available". Exactly one instance is current
//! at any time, owned exclusively by the envelope; it is destroyed only
//! after the envelope has stopped routing new calls to it and all in-flight
//! calls have returned.

use crate::api::{ControlApi, GpioApi};
use crate::error::EnvelopeError;

/// The live control implementation behind the envelope.
pub trait ControlRuntime: Send + Sync {
    /// The control service. The reference is valid for the lifetime of the
    /// runtime. Returns an error if the runtime is in an error state.
    fn control(&self) -> Result<&dyn ControlApi, EnvelopeError>;

    /// The GPIO service. The reference is valid for the lifetime of the
    /// runtime. Returns an error if the runtime is in an error state.
    fn gpio(&self) -> Result<&dyn GpioApi, EnvelopeError>;
}

/// Factory building a replacement runtime during a rebuild.
///
/// The envelope invokes this with the exclusive lock held; the factory may
/// block (hardware bring-up, segment attach) but must eventually return:
/// the rebuild watchdog only covers lock acquisition, not construction.
pub type RuntimeFactory =
    Box<dyn Fn() -> Result<Box<dyn ControlRuntime>, EnvelopeError> + Send + Sync>;
