//! Shared utilities for the Mycel client
//!
//! This crate provides:
//! - ID types (ClientId, HardwareId)
//! - Time utilities (mock-able wall clock, `HH:MM` parsing, minute arithmetic)
//! - Error types for fatal session outcomes
//! - Fixed-delay retry policy used by every unbounded retry loop
//! - Default paths for the configuration file and the hardware address

mod error;
mod ids;
mod paths;
mod retry;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use retry::*;
pub use time::*;
