//! Event records: one timestamped occurrence per log line.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::BlockId;

/// A single recorded occurrence.
///
/// Every field except `timestamp` is optional, and absence means the event
/// did not carry that attribute. Keys this type does not know about are
/// kept in `extra` so a record serializes back to what was read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Milliseconds on the producer's clock. Zero when the line omits it or
    /// sets it to `null`.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub timestamp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Present only on operation events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<BlockId>,

    /// Payload, e.g. inserted text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    // Position-resolution references from the producing system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_origin: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_origin: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<BlockId>,

    #[serde(rename = "msg", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    /// A record carrying only a timestamp.
    pub fn at(timestamp: i64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// One-line human summary: `[type/phase] block "content" msg`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        match (self.event_type.as_deref(), self.phase.as_deref()) {
            (Some(kind), Some(phase)) => parts.push(format!("[{kind}/{phase}]")),
            (Some(kind), None) => parts.push(format!("[{kind}]")),
            (None, Some(phase)) => parts.push(format!("[{phase}]")),
            (None, None) => {}
        }
        if let Some(id) = self.block_id {
            parts.push(id.to_string());
        }
        if let Some(content) = &self.content {
            parts.push(format!("{content:?}"));
        }
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        if let Some(details) = &self.details {
            parts.push(format!("({details})"));
        }

        parts.join(" ")
    }
}
