//! Chunker trait definition.
//!
//! Defines the interface for all chunking strategies, so the delivery
//! coordinator can work with any of them.

/// Trait for splitting message text into channel-sized chunks.
///
/// Implementations must be `Send + Sync` and deterministic: the same text
/// and limit always produce the same chunks.
///
/// # Examples
///
/// ```
/// use nexus_adapter::chunking::{Chunker, PlainChunker};
///
/// let text = "Hello, world! ".repeat(20);
/// let chunks = PlainChunker.chunk(&text, 100);
/// assert!(chunks.iter().all(|c| c.len() <= 100));
/// ```
pub trait Chunker: Send + Sync {
    /// Splits `text` into chunks of at most `limit` bytes.
    ///
    /// Empty text yields no chunks. A `limit` of zero disables chunking.
    fn chunk(&self, text: &str, limit: usize) -> Vec<String>;

    /// Returns the name of the chunking strategy.
    fn name(&self) -> &'static str;

    /// Returns a description of the chunking strategy.
    fn description(&self) -> &'static str {
        "No description available"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal chunker that uses all default trait implementations
    struct WholeChunker;

    impl Chunker for WholeChunker {
        fn chunk(&self, text: &str, _limit: usize) -> Vec<String> {
            vec![text.to_string()]
        }

        fn name(&self) -> &'static str {
            "whole"
        }
    }

    #[test]
    fn test_chunker_default_description() {
        assert_eq!(WholeChunker.description(), "No description available");
    }

    #[test]
    fn test_chunker_is_object_safe() {
        let chunker: Box<dyn Chunker> = Box::new(WholeChunker);
        assert_eq!(chunker.chunk("abc", 1), vec!["abc"]);
        assert_eq!(chunker.name(), "whole");
    }
}
