//! Adapter identity, health and account records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output of the `info` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    /// Channel name: `gmail`, `imessage`, `discord`, ...
    pub channel: String,
    /// Human-friendly name.
    pub name: String,
    /// Adapter version.
    pub version: String,
    /// Commands and features the adapter implements.
    pub supports: Vec<Capability>,
    /// Credential store service the adapter's accounts link to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_service: Option<String>,
    /// Whether several accounts can be configured.
    #[serde(default)]
    pub multi_account: bool,
    /// Formatting and feature limits of the channel.
    pub channel_capabilities: ChannelCapabilities,
}

impl AdapterInfo {
    /// Whether the adapter advertises `capability`.
    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        self.supports.contains(&capability)
    }
}

/// A command or feature an adapter supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// `monitor`
    Monitor,
    /// `send`
    Send,
    /// `stream`
    Stream,
    /// `backfill`
    Backfill,
    /// `health`
    Health,
    /// `accounts`
    Accounts,
    /// Reactions.
    React,
    /// Message edits.
    Edit,
    /// Message deletion.
    Delete,
    /// Polls.
    Poll,
}

/// What a channel supports, reported through `info` so replies can be
/// formatted for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelCapabilities {
    /// Maximum message length.
    pub text_limit: usize,
    /// Maximum caption length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_limit: Option<usize>,
    /// Markdown rendering.
    pub supports_markdown: bool,
    /// `standard`, `discord`, `telegram_html`, `slack_mrkdwn`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_flavor: Option<String>,
    /// Tables.
    pub supports_tables: bool,
    /// Fenced code blocks.
    pub supports_code_blocks: bool,
    /// Rich embeds.
    pub supports_embeds: bool,
    /// Threads.
    pub supports_threads: bool,
    /// Reactions.
    pub supports_reactions: bool,
    /// Polls.
    pub supports_polls: bool,
    /// Buttons.
    pub supports_buttons: bool,
    /// Editing sent messages.
    pub supports_edit: bool,
    /// Deleting sent messages.
    pub supports_delete: bool,
    /// Media attachments.
    pub supports_media: bool,
    /// Voice notes.
    pub supports_voice_notes: bool,
    /// Pseudo-streaming by editing a sent message.
    pub supports_streaming_edit: bool,
}

/// Output of the `health` command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterHealth {
    /// Whether the adapter can reach its platform.
    pub connected: bool,
    /// Account checked.
    pub account: String,
    /// Unix ms of the last event seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_at: Option<i64>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Channel-specific details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl AdapterHealth {
    /// A disconnected account with an error message.
    #[must_use]
    pub fn disconnected(account: &str, error: impl Into<String>) -> Self {
        Self {
            connected: false,
            account: account.to_string(),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// A configured account within the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterAccount {
    /// Account id.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Credential store reference, e.g. `google/user@example.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,
    /// `ready`, `active` or `error`.
    pub status: String,
}
