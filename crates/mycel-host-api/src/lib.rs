//! Collaborator trait interfaces for the Mycel client
//!
//! This crate defines the seams between the session core and everything it
//! talks to: the directory and authentication services, the patron-facing
//! frontend and the local environment (display, browser, printers). It
//! contains no platform code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
