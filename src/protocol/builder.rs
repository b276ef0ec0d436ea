//! Staged construction of [`NexusEvent`] records.

use crate::protocol::event::{Attachment, NexusEvent};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Builder for [`NexusEvent`].
///
/// Setters take `self` by value, so a finished event is produced once by
/// [`EventBuilder::build`] and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use nexus_adapter::protocol::EventBuilder;
///
/// let event = EventBuilder::new("imessage", "imessage:abc-123")
///     .timestamp_ms(1_700_000_000_000)
///     .content("see you at 6")
///     .sender("+15551234", Some("Casey"))
///     .container("chat-42", "dm")
///     .account("default")
///     .build();
///
/// assert_eq!(event.content_type, "text");
/// assert_eq!(event.sender_name.as_deref(), Some("Casey"));
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct EventBuilder {
    event: NexusEvent,
}

impl EventBuilder {
    /// Starts an event for `platform` with the given id.
    ///
    /// Content type defaults to `"text"` and the timestamp to now.
    pub fn new(platform: &str, event_id: &str) -> Self {
        Self {
            event: NexusEvent {
                event_id: event_id.to_string(),
                timestamp: Utc::now().timestamp_millis(),
                content: String::new(),
                content_type: "text".to_string(),
                attachments: Vec::new(),
                platform: platform.to_string(),
                account_id: String::new(),
                sender_id: String::new(),
                sender_name: None,
                space_id: None,
                space_name: None,
                container_id: String::new(),
                container_kind: String::new(),
                container_name: None,
                thread_id: None,
                thread_name: None,
                reply_to_id: None,
                metadata: None,
                delivery_metadata: None,
            },
        }
    }

    /// Sets the timestamp from a UTC date-time.
    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.event.timestamp = at.timestamp_millis();
        self
    }

    /// Sets the timestamp from Unix milliseconds.
    pub const fn timestamp_ms(mut self, ms: i64) -> Self {
        self.event.timestamp = ms;
        self
    }

    /// Sets the text content.
    pub fn content(mut self, content: &str) -> Self {
        self.event.content = content.to_string();
        self
    }

    /// Sets the content type.
    pub fn content_type(mut self, content_type: &str) -> Self {
        self.event.content_type = content_type.to_string();
        self
    }

    /// Sets the sender id and optional display name.
    pub fn sender(mut self, id: &str, name: Option<&str>) -> Self {
        self.event.sender_id = id.to_string();
        self.event.sender_name = name.map(str::to_string);
        self
    }

    /// Sets the conversation container and its kind (`dm`, `group`, `channel`).
    pub fn container(mut self, id: &str, kind: &str) -> Self {
        self.event.container_id = id.to_string();
        self.event.container_kind = kind.to_string();
        self
    }

    /// Sets the container display name.
    pub fn container_name(mut self, name: &str) -> Self {
        self.event.container_name = Some(name.to_string());
        self
    }

    /// Sets the parent space and optional display name.
    pub fn space(mut self, id: &str, name: Option<&str>) -> Self {
        self.event.space_id = Some(id.to_string());
        self.event.space_name = name.map(str::to_string);
        self
    }

    /// Sets the receiving account.
    pub fn account(mut self, account: &str) -> Self {
        self.event.account_id = account.to_string();
        self
    }

    /// Sets the thread id.
    pub fn thread(mut self, thread_id: &str) -> Self {
        self.event.thread_id = Some(thread_id.to_string());
        self
    }

    /// Sets the event this one replies to.
    pub fn reply_to(mut self, event_id: &str) -> Self {
        self.event.reply_to_id = Some(event_id.to_string());
        self
    }

    /// Adds an attachment.
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.event.attachments.push(attachment);
        self
    }

    /// Sets one channel-specific metadata entry.
    pub fn metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.event
            .metadata
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// Sets one delivery metadata entry.
    pub fn delivery_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.event
            .delivery_metadata
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// Returns the finished event.
    #[must_use]
    pub fn build(self) -> NexusEvent {
        self.event
    }
}
