//! Plain boundary-aware chunking strategy.
//!
//! Splits at paragraph, line, sentence and word boundaries without any
//! knowledge of fenced code blocks. Suitable for channels that render no
//! markdown at all, where a re-fenced block would only add noise.

use crate::chunking::split::find_split_point;
use crate::chunking::traits::Chunker;

/// Chunker that ignores fences and only looks at prose boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainChunker;

impl Chunker for PlainChunker {
    fn chunk(&self, text: &str, limit: usize) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        if limit == 0 || text.len() <= limit {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut remaining = text;

        while !remaining.is_empty() {
            if remaining.len() <= limit {
                chunks.push(remaining.to_string());
                break;
            }

            let split = find_split_point(remaining, limit);
            let chunk = remaining[..split.at].trim_end_matches(' ');
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }
            remaining = remaining[split.at..].trim_start_matches(' ');
        }

        chunks
    }

    fn name(&self) -> &'static str {
        "plain"
    }

    fn description(&self) -> &'static str {
        "Boundary-aware chunking without fenced code block handling"
    }
}
