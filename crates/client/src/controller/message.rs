//! Control messages from pages to the controller, and the replies they get.

use serde::{Deserialize, Serialize};

/// A message posted by a page, tagged by its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate a waiting controller now instead of after every page closes.
    SkipWaiting,
    /// Report the total stored body bytes across all partitions.
    GetCacheSize,
    /// Delete every partition.
    ClearCache,
}

/// Reply posted back on the message's reply channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlReply {
    CacheSize { size: u64 },
    CacheCleared,
}
