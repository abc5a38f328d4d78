//! Helix Common Library
//!
//! Shared constants, realtime-safe status types and configuration loading
//! for all Helix workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - System-wide limits and reserved segment names
//! - [`rt`] - Allocation-free status type for the control cycle
//! - [`guard`] - Realtime-safety guard for the cycle thread
//! - [`config`] - Configuration loading traits and types
//! - [`exit`] - Process exit codes
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! helix = { package = "helix_common", path = "../helix_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use helix_common::consts::*;
//! use helix_common::rt::{RtCode, RtError, RtResult};
//! ```

pub mod config;
pub mod consts;
pub mod exit;
pub mod guard;
pub mod rt;
