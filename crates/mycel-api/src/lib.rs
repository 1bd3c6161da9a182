//! Wire types for the Mycel client
//!
//! This crate defines the documents exchanged with the Mycel server:
//! - Client policy as returned by the directory service
//! - Authentication request/response
//! - Live-channel frames (log-on/log-off intents, status events)
//! - Hardware-spec report

mod auth;
mod channel;
mod policy;
mod specs;

pub use auth::*;
pub use channel::*;
pub use policy::*;
pub use specs::*;

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` the same as a missing field.
///
/// The directory service emits `null` for unset values, including for lists
/// and nested objects.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
