//! Wire records of the adapter protocol.
//!
//! All records are exchanged as JSONL: one JSON object per line. Keys are
//! `snake_case` except in the streaming records, which use `camelCase`.

pub mod adapter;
pub mod builder;
pub mod delivery;
pub mod event;
pub mod stream;

pub use adapter::{AdapterAccount, AdapterHealth, AdapterInfo, Capability, ChannelCapabilities};
pub use builder::EventBuilder;
pub use delivery::{DeliveryError, DeliveryErrorKind, DeliveryResult, SendRequest};
pub use event::{Attachment, NexusEvent};
pub use stream::{
    AdapterStreamStatus, DeliveryTarget, StreamEnd, StreamEvent, StreamEventKind, StreamFailure,
    StreamStart, TextDelta, ToolStatus,
};
