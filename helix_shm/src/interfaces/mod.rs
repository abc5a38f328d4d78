//! Builtin hardware-interface payload types.
//!
//! Fixed-layout payloads are `#[repr(C)] Copy` structs declared through
//! `fixed_interface!`; [`JointLimits`] is the one variable-layout payload
//! (per-joint vectors sized by `num_dof` at build time).

mod cycle_state;
mod digital_io;
mod joint;
mod joint_limits;

pub use cycle_state::CycleState;
pub use digital_io::DigitalIoBank;
pub use joint::{JointCommand, JointState};
pub use joint_limits::{JointLimits, JointLimitsMut, JointLimitsView};

// ─── Default via zeroed() ───────────────────────────────────────────
//
// Large payload structs use mem::zeroed() for Default to avoid deep stack
// usage. This is safe because all fields are plain numeric types or arrays
// thereof — zero is a valid value for every field.

macro_rules! impl_default_zeroed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Default for $ty {
                fn default() -> Self {
                    // SAFETY: All fields are numeric primitives or fixed-size
                    // arrays of numeric primitives. Zero is a valid value for
                    // every field.
                    unsafe { core::mem::zeroed() }
                }
            }
        )*
    };
}

pub(crate) use impl_default_zeroed;
