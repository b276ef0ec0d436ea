//! # nexus-adapter
//!
//! SDK for Nexus channel adapters.
//!
//! An adapter is a process that bridges one messaging channel (email, chat,
//! SMS) to the Nexus runtime over line-delimited JSON on stdin and stdout.
//! This crate handles the protocol so an adapter only supplies the
//! platform-specific calls.
//!
//! ## Features
//!
//! - **Chunking**: boundary-aware splitting of outbound text that keeps
//!   fenced code blocks intact, re-fencing blocks that exceed the limit
//! - **Delivery**: ordered chunk-by-chunk sending with partial-progress
//!   reporting
//! - **Monitoring**: cursor-based polling loop with error backoff, a
//!   consecutive-error ceiling and cancellation
//! - **Streaming**: dispatcher for the streaming delivery protocol
//! - **Runner**: the shared CLI (`info`, `monitor`, `send`, `backfill`,
//!   `health`, `accounts`, `stream`)

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]

pub mod chunking;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod error;
pub mod io;
pub mod logging;
pub mod monitor;
pub mod protocol;
pub mod stream;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export chunking types
pub use chunking::{
    Chunker, DEFAULT_TEXT_LIMIT, FencedChunker, PlainChunker, available_strategies, chunk_text,
    create_chunker,
};

// Re-export delivery and monitor entry points
pub use delivery::{send_chunked, send_chunked_async, send_chunked_with};
pub use monitor::{Cursor, FetchBatch, MonitorReport, PollConfig, PollMonitor, RetryPolicy};

// Re-export protocol records
pub use protocol::{
    AdapterAccount, AdapterHealth, AdapterInfo, AdapterStreamStatus, Capability,
    ChannelCapabilities, DeliveryError, DeliveryErrorKind, DeliveryResult, EventBuilder,
    NexusEvent, SendRequest, StreamEvent,
};

// Re-export stream types
pub use stream::{DispatchReport, StreamContext, StreamHandler, dispatch};

// Re-export runner types
pub use cli::{Adapter, AdapterContext, Cli, Commands, EventEmitter, run};
pub use config::RuntimeContext;
