//! Fence-aware chunking strategy.
//!
//! Fills chunks greedily from the pre-segmented text. Plain text is split at
//! natural boundaries; fenced code blocks are kept whole when they fit and
//! otherwise re-fenced piece by piece so every chunk is a closed block.

use crate::chunking::fence::{FencedBlock, Segment, split_fenced_segments};
use crate::chunking::split::{Boundary, find_split_point};
use crate::chunking::traits::Chunker;
use crate::io::unicode::hard_cut_point;

/// Fence-aware chunker. This is the default strategy.
///
/// # Examples
///
/// ```
/// use nexus_adapter::chunking::{Chunker, FencedChunker};
///
/// let text = "Intro.\n\n```\nfn main() {}\n```\n";
/// let chunks = FencedChunker.chunk(text, 1000);
/// assert_eq!(chunks, vec![text.to_string()]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FencedChunker;

impl Chunker for FencedChunker {
    fn chunk(&self, text: &str, limit: usize) -> Vec<String> {
        chunk_text(text, limit)
    }

    fn name(&self) -> &'static str {
        "fenced"
    }

    fn description(&self) -> &'static str {
        "Boundary-aware chunking that keeps fenced code blocks closed"
    }
}

/// Splits `text` into chunks of at most `limit` bytes.
///
/// Returns no chunks for empty text, and the text unchanged as a single
/// chunk when `limit` is zero or the text already fits.
///
/// # Examples
///
/// ```
/// use nexus_adapter::chunking::chunk_text;
///
/// assert!(chunk_text("", 10).is_empty());
/// assert_eq!(chunk_text("hello", 0), vec!["hello"]);
/// let chunks = chunk_text("one two three four five six", 10);
/// assert!(chunks.iter().all(|c| c.len() <= 10));
/// ```
#[must_use]
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if limit == 0 || text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut builder = ChunkBuilder::new(limit);
    for segment in split_fenced_segments(text) {
        match segment {
            Segment::Plain(plain) => builder.append_text(plain),
            Segment::Fenced(block) => builder.append_fence(&block),
        }
    }
    builder.finish()
}

/// Accumulates chunks while walking the segments.
struct ChunkBuilder {
    limit: usize,
    chunks: Vec<String>,
    current: String,
}

impl ChunkBuilder {
    const fn new(limit: usize) -> Self {
        Self {
            limit,
            chunks: Vec::new(),
            current: String::new(),
        }
    }

    /// Emits a finished chunk, dropping trailing spaces; blank chunks vanish.
    fn emit(&mut self, chunk: &str) {
        let out = chunk.trim_end_matches(' ');
        if !out.is_empty() {
            self.chunks.push(out.to_string());
        }
    }

    fn flush(&mut self) {
        let current = std::mem::take(&mut self.current);
        self.emit(&current);
    }

    fn append_text(&mut self, segment: &str) {
        let mut remaining = segment;
        while !remaining.is_empty() {
            let available = self.limit.saturating_sub(self.current.len());
            if available == 0 {
                self.flush();
                continue;
            }
            if remaining.len() <= available {
                self.current.push_str(remaining);
                return;
            }

            let split = find_split_point(remaining, available);
            if split.boundary == Boundary::Hard && !self.current.is_empty() {
                // Start a fresh chunk rather than cutting mid-word to fill
                // the tail of this one.
                self.flush();
                continue;
            }

            self.current
                .push_str(remaining[..split.at].trim_end_matches(' '));
            self.flush();
            remaining = remaining[split.at..].trim_start_matches(' ');
        }
    }

    fn append_fence(&mut self, block: &FencedBlock<'_>) {
        if block.len() > self.limit {
            self.flush();
            for piece in split_fence(block, self.limit) {
                self.emit(&piece);
            }
            return;
        }

        if self.current.len() + block.len() > self.limit {
            self.flush();
        }
        self.current.push_str(&block.render());
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

/// Splits an oversized fenced block into re-fenced pieces of at most `limit`
/// bytes each.
///
/// The body is divided on whole lines; a line longer than the per-piece
/// budget is hard-cut. If the delimiters leave fewer than two bytes for a
/// body the block is returned whole.
fn split_fence(block: &FencedBlock<'_>, limit: usize) -> Vec<String> {
    if block.len() <= limit {
        return vec![block.render()];
    }
    // Below two bytes of body budget a piece cannot hold a character plus
    // the newline `wrap` inserts, so the block is emitted whole.
    let Some(max_body) = limit.checked_sub(block.overhead()).filter(|&b| b >= 2) else {
        return vec![block.render()];
    };

    let mut parts: Vec<&str> = Vec::new();
    let mut start = 0;
    let mut end = 0;
    let body = block.body;

    for line in body.split_inclusive('\n') {
        let cost = line_cost(line);
        if cost > max_body {
            if end > start {
                parts.push(&body[start..end]);
            }
            // Hard-cut pieces lack a newline; reserve a byte for the one
            // `wrap` inserts before the closing delimiter.
            let budget = max_body - 1;
            let mut rest = line;
            while !rest.is_empty() {
                let cut = hard_cut_point(rest, budget);
                let piece = &rest[..cut];
                if piece == "\n" {
                    break;
                }
                parts.push(piece);
                rest = &rest[cut..];
            }
            start = end + line.len();
            end = start;
            continue;
        }

        if end > start && end - start + cost > max_body {
            parts.push(&body[start..end]);
            start = end;
        }
        end += line.len();
    }
    if end > start {
        parts.push(&body[start..end]);
    }

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|p| block.wrap(p))
        .collect()
}

/// Bytes a body line occupies once wrapped, counting the newline `wrap`
/// adds after a final line that lacks one.
fn line_cost(line: &str) -> usize {
    line.len() + usize::from(!line.ends_with('\n'))
}
