//! Core data model for logreplay.
//!
//! One log line decodes to one [`EventRecord`]. Records reference the
//! operations of the producing system through opaque [`BlockId`]s.

mod block;
mod event;

use serde::{Deserialize, Deserializer};

pub use block::BlockId;
pub use event::EventRecord;

/// Decodes an explicit JSON `null` the same way as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
