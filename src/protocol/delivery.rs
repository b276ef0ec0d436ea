//! Outbound delivery records: the `send` request and its result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Parameters of a `send` command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    /// Sending account.
    pub account: String,
    /// Recipient: email, phone, `channel:id`, ...
    pub to: String,
    /// Message text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Path of a media file to attach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    /// Caption for the media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Event id to reply to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    /// Thread to post in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Structured output of a `send` command.
///
/// `message_ids.len() == chunks_sent` holds for every result produced by
/// the delivery coordinator, including failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Whether every chunk was delivered.
    pub success: bool,
    /// Platform ids of the delivered chunks, in order.
    #[serde(default)]
    pub message_ids: Vec<String>,
    /// Number of chunks delivered.
    pub chunks_sent: usize,
    /// Length of the original text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chars: Option<usize>,
    /// Why the delivery failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DeliveryError>,
}

impl DeliveryResult {
    /// A fully successful delivery.
    #[must_use]
    pub fn delivered(message_ids: Vec<String>) -> Self {
        Self {
            success: true,
            chunks_sent: message_ids.len(),
            message_ids,
            total_chars: None,
            error: None,
        }
    }

    /// A failed delivery after `message_ids` were already sent.
    #[must_use]
    pub fn failed(message_ids: Vec<String>, error: DeliveryError) -> Self {
        Self {
            success: false,
            chunks_sent: message_ids.len(),
            message_ids,
            total_chars: None,
            error: Some(error),
        }
    }

    /// Sets the total text length.
    #[must_use]
    pub const fn with_total_chars(mut self, total: usize) -> Self {
        self.total_chars = Some(total);
        self
    }
}

/// Why a delivery failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryError {
    /// Error category.
    #[serde(rename = "type")]
    pub kind: DeliveryErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Wait hint for `rate_limited` errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    /// Whether the runtime should retry.
    pub retry: bool,
    /// Channel-specific debugging data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl DeliveryError {
    /// Creates an error of `kind` with the kind's default retry flag.
    #[must_use]
    pub fn new(kind: DeliveryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after_ms: None,
            retry: kind.is_retryable(),
            details: None,
        }
    }

    /// The message was refused before any chunk was sent.
    #[must_use]
    pub fn content_rejected(message: impl Into<String>) -> Self {
        Self::new(DeliveryErrorKind::ContentRejected, message)
    }

    /// A transport failure while sending.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(DeliveryErrorKind::Network, message)
    }

    /// The platform asked the caller to slow down.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>, retry_after_ms: u64) -> Self {
        Self {
            retry_after_ms: Some(retry_after_ms),
            ..Self::new(DeliveryErrorKind::RateLimited, message)
        }
    }

    /// An unclassified failure.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(DeliveryErrorKind::Unknown, message)
    }

    /// Attaches one debugging detail.
    #[must_use]
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }
}

/// Delivery error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryErrorKind {
    /// Retry after `retry_after_ms`.
    RateLimited,
    /// Credentials lack access to the target.
    PermissionDenied,
    /// Target does not exist.
    NotFound,
    /// Platform refused the content.
    ContentRejected,
    /// Transport failure.
    Network,
    /// Anything else.
    Unknown,
}

impl DeliveryErrorKind {
    /// Whether errors of this kind are retried by default.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Network)
    }

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::ContentRejected => "content_rejected",
            Self::Network => "network",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeliveryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
