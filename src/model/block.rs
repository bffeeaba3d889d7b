//! Block identifiers: the origin of an operation in a distributed log.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(clock, client)` pair identifying where an operation came from.
///
/// Carried through unchanged; nothing in this crate interprets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub clock: i64,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub client: i64,
}

impl BlockId {
    pub fn new(clock: i64, client: i64) -> Self {
        Self { clock, client }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.clock, self.client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_clock_at_client() {
        assert_eq!(BlockId::new(7, 42).to_string(), "7@42");
    }

    #[test]
    fn missing_members_default_to_zero() {
        let id: BlockId = serde_json::from_str(r#"{"clock": 3}"#).unwrap();
        assert_eq!(id, BlockId::new(3, 0));
    }

    #[test]
    fn null_members_default_to_zero() {
        let id: BlockId = serde_json::from_str(r#"{"clock": null, "client": 8}"#).unwrap();
        assert_eq!(id, BlockId::new(0, 8));
    }
}
