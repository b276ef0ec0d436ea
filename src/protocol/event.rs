//! Normalized inbound events.
//!
//! Every adapter emits [`NexusEvent`] records, one JSON object per line on
//! stdout, from its `monitor` and `backfill` commands.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The normalized event format all adapters emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NexusEvent {
    /// Globally unique id, by convention `"{platform}:{source_id}"`.
    pub event_id: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,

    /// Message content.
    pub content: String,
    /// `"text"`, `"image"`, `"audio"`, `"video"`, `"file"`, `"reaction"`, `"membership"`.
    pub content_type: String,
    /// Media attached to the event.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    /// Platform name.
    pub platform: String,
    /// Adapter account that received the event.
    pub account_id: String,
    /// Platform-specific sender id.
    pub sender_id: String,
    /// Sender display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Parent container scope (guild, workspace).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// Display name of the space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_name: Option<String>,
    /// Chat, channel or DM identifier.
    pub container_id: String,
    /// `"dm"`, `"direct"`, `"group"` or `"channel"`.
    pub container_kind: String,
    /// Display name of the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    /// Thread id for threaded conversations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Thread display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    /// Event id this event replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,

    /// Channel-specific metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    /// Metadata the runtime echoes back when delivering replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_metadata: Option<Map<String, Value>>,
}

/// A media attachment on an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment id.
    pub id: String,
    /// Original file name.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Remote URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Local file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
