//! # Helix Shared-Memory Hardware Interfaces
//!
//! Versioned, typed shared-memory interfaces between a control process and
//! hardware/simulation modules.
//!
//! A module publishes *interface segments* through a [`SegmentRegistry`] at
//! startup (non-realtime). Each segment carries a [`SegmentHeader`] naming
//! its payload type and layout version, followed by the payload itself.
//! Consumers attach by name, and handle construction checks, exactly once,
//! that the segment's version and type match the compiled expectation, and
//! that variable-layout payloads pass structural verification. After that,
//! handle accessors are O(1) and allocation-free, suitable for the control
//! cycle.
//!
//! ## Handle variants
//!
//! | Variant | Access | Staleness check |
//! |---|---|---|
//! | [`InterfaceHandle`] | read-only | none |
//! | [`InterfaceHandleMut`] | read-write | none |
//! | [`StrictHandle`] | read-only | every read vs. cycle counter |
//! | [`StrictHandleMut`] | read-write | reads vs. cycle counter |
//!
//! ## Example
//!
//! ```rust,no_run
//! use helix_shm::{AccessMode, SegmentRegistry};
//! use helix_shm::interfaces::{CycleState, JointState};
//! use helix::consts::CYCLE_STATE_INTERFACE;
//!
//! # fn main() -> Result<(), helix_shm::ShmError> {
//! // Module side (startup):
//! let mut registry = SegmentRegistry::create("arm")?;
//! registry.add_segment::<CycleState>(CYCLE_STATE_INTERFACE, true)?;
//! registry.add_segment::<JointState>("joint_state", true)?;
//! registry.publish_module_info()?;
//!
//! // Control side (startup):
//! let consumer = SegmentRegistry::attach("arm", AccessMode::ReadOnly)?;
//! let joint_state = consumer.get_strict::<JointState>("joint_state")?;
//!
//! // Control cycle (realtime): checked, allocation-free access.
//! if let Ok(state) = joint_state.value() {
//!     let _ = state.position[0];
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod handle;
pub mod interface;
pub mod interfaces;
pub mod module_info;
pub mod platform;
pub mod registry;
pub mod segment;
pub mod varbuf;

pub use error::{ShmError, ShmResult};
pub use handle::{InterfaceHandle, InterfaceHandleMut, StrictHandle, StrictHandleMut};
pub use interface::Interface;
pub use module_info::ModuleInfo;
pub use registry::{AccessMode, SegmentMetadata, SegmentRegistry, discover_modules};
pub use segment::{HEADER_SIZE, MappedSegment, SEGMENT_VERSION, SegmentHeader, monotonic_ns};
