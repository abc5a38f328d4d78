//! # Helix Realtime Action Surface
//!
//! The plugin surface between a control runtime and its actions.
//!
//! Everything an action needs is resolved in two phases:
//!
//! - **Factory time** (non-realtime, once per instance): the action's
//!   declared signal and slot names are resolved through an
//!   [`ActionFactoryContext`] into dense integer IDs. Errors here are rich
//!   and enumerate the valid names.
//! - **Cycle time** (realtime, every cycle): signals and per-slot feature
//!   interfaces are reached by integer ID only: direct indexed access,
//!   no hashing, no allocation, no locking.
//!
//! Action types register a static [`ActionSignature`] plus a factory in an
//! [`ActionRegistry`], keeping host and actions compile-time decoupled
//! behind `Box<dyn RealtimeAction>`.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod context;
pub mod error;
pub mod features;
pub mod registry;
pub mod signals;
pub mod signature;
pub mod slots;
pub mod testing;

pub use action::{CycleContext, RealtimeAction};
pub use context::{ActionFactoryContext, ResolvedSlot, ServerConfig, SlotConfig};
pub use error::{ControlError, ControlResult};
pub use features::{
    JointLimitsSnapshot, JointLimitsSource, JointPositionCommand, JointPositionSensor, JointVector,
};
pub use registry::{ActionFactory, ActionRegistry};
pub use signals::{SignalAccess, SignalId, SignalMap, SignalValue};
pub use signature::{ActionSignature, SignalInfo, SignalRole};
pub use slots::{RealtimeSlotId, SlotInterfaces, SlotMap};
