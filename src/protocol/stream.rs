//! Streaming delivery records.
//!
//! The runtime pipes [`StreamEvent`] lines to the adapter's stdin while an
//! agent reply is being generated; the adapter answers with
//! [`AdapterStreamStatus`] lines on stdout.

use serde::{Deserialize, Serialize};

/// One inbound streaming event, selected by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A reply run has started.
    StreamStart(StreamStart),
    /// A chunk of reply text.
    Token(TextDelta),
    /// Progress of a tool call made by the agent.
    ToolStatus(ToolStatus),
    /// A chunk of reasoning text.
    Reasoning(TextDelta),
    /// The run has finished.
    StreamEnd(StreamEnd),
    /// The run failed upstream.
    StreamError(StreamFailure),
}

impl StreamEvent {
    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> StreamEventKind {
        match self {
            Self::StreamStart(_) => StreamEventKind::StreamStart,
            Self::Token(_) => StreamEventKind::Token,
            Self::ToolStatus(_) => StreamEventKind::ToolStatus,
            Self::Reasoning(_) => StreamEventKind::Reasoning,
            Self::StreamEnd(_) => StreamEventKind::StreamEnd,
            Self::StreamError(_) => StreamEventKind::StreamError,
        }
    }
}

/// The six stream event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamEventKind {
    /// `stream_start`
    StreamStart,
    /// `token`
    Token,
    /// `tool_status`
    ToolStatus,
    /// `reasoning`
    Reasoning,
    /// `stream_end`
    StreamEnd,
    /// `stream_error`
    StreamError,
}

impl StreamEventKind {
    /// Maps a wire `type` value to a kind.
    #[must_use]
    pub fn from_type(value: &str) -> Option<Self> {
        match value {
            "stream_start" => Some(Self::StreamStart),
            "token" => Some(Self::Token),
            "tool_status" => Some(Self::ToolStatus),
            "reasoning" => Some(Self::Reasoning),
            "stream_end" => Some(Self::StreamEnd),
            "stream_error" => Some(Self::StreamError),
            _ => None,
        }
    }

    /// Wire `type` value of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StreamStart => "stream_start",
            Self::Token => "token",
            Self::ToolStatus => "tool_status",
            Self::Reasoning => "reasoning",
            Self::StreamEnd => "stream_end",
            Self::StreamError => "stream_error",
        }
    }
}

/// Payload of `stream_start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamStart {
    /// Agent run id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Session label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_label: Option<String>,
    /// Where the reply goes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<DeliveryTarget>,
}

/// Payload of `token` and `reasoning`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextDelta {
    /// Text fragment.
    pub text: String,
}

/// Payload of `tool_status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolStatus {
    /// Tool name.
    pub tool_name: String,
    /// Tool call id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// `started`, `completed` or `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Short summary of the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Payload of `stream_end`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamEnd {
    /// Agent run id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Whether this ends the whole reply.
    #[serde(rename = "final")]
    pub is_final: bool,
}

/// Payload of `stream_error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamFailure {
    /// Error message.
    pub error: String,
    /// Whether some of the reply was already produced.
    pub partial: bool,
}

/// Where to deliver a streamed reply.
///
/// Missing fields parse as empty so a partial target still starts a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryTarget {
    /// Platform name.
    pub platform: String,
    /// Sending account.
    pub account_id: String,
    /// Recipient.
    pub to: String,
    /// Thread to post in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Event to reply to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
}

/// Status line emitted by the adapter during streaming delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AdapterStreamStatus {
    /// A platform message was created.
    MessageCreated {
        /// Platform message id.
        message_id: String,
    },
    /// A platform message was edited to hold `chars` characters.
    MessageUpdated {
        /// Platform message id.
        message_id: String,
        /// Current message length.
        chars: usize,
    },
    /// A platform message reached its final content.
    MessageSent {
        /// Platform message id.
        message_id: String,
        /// Whether this is the last message of the reply.
        #[serde(rename = "final")]
        is_final: bool,
    },
    /// All messages of the reply were delivered.
    DeliveryComplete {
        /// Ids of every message sent.
        message_ids: Vec<String>,
    },
    /// Delivery failed.
    DeliveryError {
        /// Error message.
        error: String,
    },
}
