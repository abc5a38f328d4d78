//! # Helix Simulated Hardware Module
//!
//! Publishes the standard Helix interface set over shared memory and runs a
//! fixed-period simulated cycle: joints follow commanded positions with a
//! first-order lag, digital outputs loop back to inputs, and the cycle
//! counter interface advances every period.
//!
//! The binary in this crate is the simulation stand-in for a real hardware
//! module; a driver for real hardware publishes the same interfaces through
//! the same `SegmentRegistry` path.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod module;

pub use config::{HalConfig, ModuleConfig};
pub use module::HalModule;
