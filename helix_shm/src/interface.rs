//! The `Interface` trait: typed access to segment payloads.
//!
//! Two payload kinds exist:
//!
//! - **Fixed-layout**: `#[repr(C)] Copy` structs whose byte layout is fully
//!   determined by the type. Their accessors cannot read out of bounds by
//!   construction, so validation is a size lower-bound check only. Declared
//!   with the [`fixed_interface!`] macro.
//! - **Variable-layout**: self-describing, offset-based encodings (see
//!   [`crate::varbuf`]) that must pass a structural verifier before any
//!   accessor is trusted. These implement [`Interface`] by hand.
//!
//! Validation runs exactly once, at handle construction (non-realtime).
//! After construction, accessors are trusted and O(1).

use crate::error::{ShmError, ShmResult};

/// A typed hardware-interface payload.
pub trait Interface: Sized + 'static {
    /// Type id stored in the segment header. At most 31 bytes.
    const TYPE_ID: &'static str;

    /// Maximum payload size in bytes; segments are allocated at this size
    /// and never grow.
    const MAX_SIZE: usize;

    /// Read-only view over a validated payload.
    type View<'a>;

    /// Mutable view over a validated payload. In-place field mutation only;
    /// no accessor may change the payload's layout.
    type ViewMut<'a>;

    /// Initialize a freshly allocated payload to its default value.
    fn init(buf: &mut [u8]) -> ShmResult<()>;

    /// Structural validation, run once before any view is handed out.
    ///
    /// `interface_name` is only used for error reporting.
    fn validate(buf: &[u8], interface_name: &str) -> ShmResult<()>;

    /// Build a read-only view. Callers must have run [`Self::validate`].
    fn view(buf: &[u8]) -> Self::View<'_>;

    /// Build a mutable view. Callers must have run [`Self::validate`].
    fn view_mut(buf: &mut [u8]) -> Self::ViewMut<'_>;
}

/// Size lower-bound check shared by all fixed-layout interfaces.
///
/// Accurate for `#[repr(C)]` `Copy` payloads only; variable-layout types
/// run the structural verifier in [`crate::varbuf`] instead.
pub fn check_fixed_size<T>(len: usize, interface_name: &str) -> ShmResult<()> {
    let required = core::mem::size_of::<T>();
    if len < required {
        return Err(ShmError::InvalidSize {
            name: interface_name.to_string(),
            size: len,
            required,
        });
    }
    Ok(())
}

/// Reinterpret a payload buffer as a fixed-layout value.
///
/// Callers must have size-checked the buffer. Payload buffers handed out by
/// `MappedSegment` start on a 128-byte boundary, which satisfies any
/// fixed-layout interface (alignment is capped at 64 by `fixed_interface!`).
pub fn fixed_view<T>(buf: &[u8]) -> &T {
    debug_assert!(buf.len() >= core::mem::size_of::<T>());
    debug_assert_eq!(buf.as_ptr() as usize % core::mem::align_of::<T>(), 0);
    // SAFETY: size and alignment asserted above; fixed-layout interfaces are
    // repr(C) Copy types for which any bit pattern is a value.
    unsafe { &*(buf.as_ptr() as *const T) }
}

/// Mutable counterpart of [`fixed_view`].
pub fn fixed_view_mut<T>(buf: &mut [u8]) -> &mut T {
    debug_assert!(buf.len() >= core::mem::size_of::<T>());
    debug_assert_eq!(buf.as_ptr() as usize % core::mem::align_of::<T>(), 0);
    // SAFETY: as for fixed_view, plus exclusive access via &mut.
    unsafe { &mut *(buf.as_mut_ptr() as *mut T) }
}

/// Implement [`Interface`] for a `#[repr(C)] Copy + Default` struct.
///
/// ```rust,ignore
/// fixed_interface!(JointState, "helix.joint_state");
/// ```
#[macro_export]
macro_rules! fixed_interface {
    ($ty:ty, $type_id:literal) => {
        const _: () = {
            assert!(
                core::mem::align_of::<$ty>() <= 64,
                "fixed interfaces must not require more than cache-line alignment"
            );
            assert!($type_id.len() <= 31, "type id exceeds 31 bytes");
        };

        impl $crate::interface::Interface for $ty {
            const TYPE_ID: &'static str = $type_id;
            const MAX_SIZE: usize = core::mem::size_of::<$ty>();

            type View<'a> = &'a $ty;
            type ViewMut<'a> = &'a mut $ty;

            fn init(buf: &mut [u8]) -> $crate::error::ShmResult<()> {
                $crate::interface::check_fixed_size::<$ty>(buf.len(), $type_id)?;
                *$crate::interface::fixed_view_mut::<$ty>(buf) = <$ty>::default();
                Ok(())
            }

            fn validate(
                buf: &[u8],
                interface_name: &str,
            ) -> $crate::error::ShmResult<()> {
                $crate::interface::check_fixed_size::<$ty>(buf.len(), interface_name)
            }

            fn view(buf: &[u8]) -> Self::View<'_> {
                $crate::interface::fixed_view::<$ty>(buf)
            }

            fn view_mut(buf: &mut [u8]) -> Self::ViewMut<'_> {
                $crate::interface::fixed_view_mut::<$ty>(buf)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    #[repr(C, align(8))]
    struct Probe {
        a: u64,
        b: u32,
        _pad: u32,
    }

    fixed_interface!(Probe, "helix.test_probe");

    // Backing store with enough alignment for any fixed interface.
    #[repr(C, align(64))]
    struct Backing([u8; 64]);

    #[test]
    fn macro_wires_constants() {
        assert_eq!(Probe::TYPE_ID, "helix.test_probe");
        assert_eq!(Probe::MAX_SIZE, core::mem::size_of::<Probe>());
    }

    #[test]
    fn init_writes_default_and_views_read_back() {
        let mut backing = Backing([0xAA; 64]);
        let buf = &mut backing.0[..];

        Probe::init(buf).unwrap();
        assert_eq!(*Probe::view(buf), Probe::default());

        Probe::view_mut(buf).a = 42;
        assert_eq!(Probe::view(buf).a, 42);
    }

    #[test]
    fn validate_rejects_short_buffer() {
        let short = [0u8; 4];
        let result = Probe::validate(&short, "probe");
        assert!(matches!(
            result,
            Err(ShmError::InvalidSize { ref name, .. }) if name == "probe"
        ));
    }
}
