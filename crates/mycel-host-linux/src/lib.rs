//! Linux host for the Mycel client
//!
//! Provides:
//! - HTTP access to the Mycel directory and login service
//! - Screen resolution, browser homepage and printer setup
//! - Hardware id and hardware-spec collection
//! - Ending the desktop session

mod command;
mod environment;
mod hardware;
mod http;

pub use command::*;
pub use environment::*;
pub use hardware::*;
pub use http::*;
