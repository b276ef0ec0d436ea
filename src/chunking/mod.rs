//! Message chunking for channel size limits.
//!
//! This module provides a trait-based system for splitting outbound text
//! into chunks a channel will accept. Two strategies are available:
//!
//! - **Fenced** (default): boundary-aware splitting that keeps fenced code
//!   blocks intact, re-fencing any block that alone exceeds the limit
//! - **Plain**: boundary-aware splitting with no fence handling
//!
//! Lengths are UTF-8 byte counts. A byte budget is never looser than the
//! same character budget, so chunks also satisfy character-based limits.

pub mod fence;
pub mod fenced;
pub mod plain;
pub mod split;
pub mod traits;

pub use fenced::{FencedChunker, chunk_text};
pub use plain::PlainChunker;
pub use traits::Chunker;

/// Default per-message limit used when a channel does not report one.
pub const DEFAULT_TEXT_LIMIT: usize = 2000;

/// Creates the default chunker (fence-aware).
#[must_use]
pub const fn default_chunker() -> FencedChunker {
    FencedChunker
}

/// Creates a chunker by name.
///
/// # Arguments
///
/// * `name` - Chunker strategy name: "fenced" or "plain".
///
/// # Errors
///
/// Returns [`crate::error::ChunkingError::UnknownStrategy`] if the strategy name is not recognized.
pub fn create_chunker(name: &str) -> crate::error::Result<Box<dyn Chunker>> {
    match name.to_lowercase().as_str() {
        "fenced" => Ok(Box::new(FencedChunker)),
        "plain" => Ok(Box::new(PlainChunker)),
        _ => Err(crate::error::ChunkingError::UnknownStrategy {
            name: name.to_string(),
        }
        .into()),
    }
}

/// Lists available chunking strategy names.
#[must_use]
pub fn available_strategies() -> Vec<&'static str> {
    vec!["fenced", "plain"]
}
