//! Session lifecycle and time-budget manager for the Mycel client
//!
//! This crate is the heart of the client, containing:
//! - Identity resolution (hardware id -> client policy), with retries
//! - Budget calculation (closing cutoff, granted and extra minutes)
//! - The keep-alive heartbeat
//! - Session state machine (Idle -> Identifying -> Authenticating ->
//!   BudgetComputed -> ChannelConnecting -> SessionActive -> Terminating ->
//!   Terminated)

mod budget;
mod clock;
mod events;
mod heartbeat;
mod identity;
mod machine;
mod session;

#[cfg(test)]
mod proptest_budget;

pub use budget::*;
pub use clock::*;
pub use events::*;
pub use heartbeat::*;
pub use identity::*;
pub use machine::*;
pub use session::*;
