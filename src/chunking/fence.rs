//! Fenced code block detection.
//!
//! Partitions text into alternating plain and fenced segments so the
//! segmenter can keep code blocks intact, or re-fence them when a single
//! block is larger than the channel limit.

use std::borrow::Cow;

/// Minimum run of fence characters that opens a block.
pub const MIN_FENCE_LEN: usize = 3;

/// A fence delimiter: the character used and the length of its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    /// Either `` ` `` or `~`.
    pub ch: char,
    /// Number of consecutive fence characters on the opening line.
    pub len: usize,
}

impl Fence {
    /// Parses an opening delimiter from a line with leading whitespace and
    /// the trailing newline already removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use nexus_adapter::chunking::fence::Fence;
    ///
    /// let fence = Fence::parse_open("````rust").unwrap();
    /// assert_eq!((fence.ch, fence.len), ('`', 4));
    /// assert!(Fence::parse_open("``not a fence").is_none());
    /// ```
    #[must_use]
    pub fn parse_open(trimmed: &str) -> Option<Self> {
        let ch = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = run_length(trimmed, ch);
        (len >= MIN_FENCE_LEN).then_some(Self { ch, len })
    }

    /// Returns `true` if `trimmed` closes this fence.
    ///
    /// A closing line needs at least as many fence characters as the opener;
    /// longer runs are accepted.
    #[must_use]
    pub fn is_closed_by(&self, trimmed: &str) -> bool {
        run_length(trimmed, self.ch) >= self.len
    }

    /// Builds a synthetic closing delimiter line for an unterminated block.
    fn synthetic_close(&self) -> String {
        let mut close = self.ch.to_string().repeat(self.len.max(MIN_FENCE_LEN));
        close.push('\n');
        close
    }
}

/// Counts the leading run of `ch` in `s` (fence characters are ASCII).
fn run_length(s: &str, ch: char) -> usize {
    s.chars().take_while(|&c| c == ch).count()
}

/// A fenced code block: opening line, body, and closing line.
///
/// `open` and `close` include their trailing newline when the source had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Opening delimiter line, including any info string.
    pub open: &'a str,
    /// Lines between the delimiters.
    pub body: &'a str,
    /// Closing delimiter line (synthesized for unterminated blocks).
    pub close: Cow<'a, str>,
}

impl FencedBlock<'_> {
    /// Total length in bytes of the rendered block.
    #[must_use]
    pub fn len(&self) -> usize {
        self.open.len()
            + self.body.len()
            + usize::from(self.needs_break(self.body))
            + self.close.len()
    }

    /// Returns `true` if the block renders to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delimiter bytes that every re-fenced piece has to carry.
    #[must_use]
    pub fn overhead(&self) -> usize {
        self.open.len() + self.close.len()
    }

    /// Renders the block back to text.
    #[must_use]
    pub fn render(&self) -> String {
        self.wrap(self.body)
    }

    /// Wraps `body` in this block's delimiters.
    ///
    /// A newline is inserted before the closing delimiter when the text
    /// preceding it does not already end with one, so the fence stays
    /// syntactically closed.
    #[must_use]
    pub fn wrap(&self, body: &str) -> String {
        let mut out = String::with_capacity(self.overhead() + body.len() + 1);
        out.push_str(self.open);
        out.push_str(body);
        if self.needs_break(body) {
            out.push('\n');
        }
        out.push_str(&self.close);
        out
    }

    /// Whether `wrap(body)` has to insert a newline before the close.
    fn needs_break(&self, body: &str) -> bool {
        let tail = if body.is_empty() { self.open } else { body };
        !tail.ends_with('\n')
    }
}

/// A piece of the input, either plain prose or a fenced block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any fence.
    Plain(&'a str),
    /// A fenced code block.
    Fenced(FencedBlock<'a>),
}

#[derive(Debug, Clone, Copy)]
struct OpenFence {
    fence: Fence,
    start: usize,
    open_end: usize,
}

/// Strips the trailing newline (and carriage return) and leading indentation.
fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
        .trim_start_matches([' ', '\t'])
}

/// Splits `text` into plain and fenced segments, in source order.
///
/// A fence still open at end-of-input is closed with a synthesized
/// delimiter of the same character and length (at least three).
///
/// # Examples
///
/// ```
/// use nexus_adapter::chunking::fence::{Segment, split_fenced_segments};
///
/// let segments = split_fenced_segments("intro\n```\ncode\n```\noutro");
/// assert_eq!(segments.len(), 3);
/// assert!(matches!(segments[1], Segment::Fenced(_)));
/// ```
#[must_use]
pub fn split_fenced_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    let mut open: Option<OpenFence> = None;
    let mut line_start = 0;

    for line in text.split_inclusive('\n') {
        let line_end = line_start + line.len();
        let trimmed = trim_line(line);

        match open {
            None => {
                if let Some(fence) = Fence::parse_open(trimmed) {
                    if line_start > last {
                        segments.push(Segment::Plain(&text[last..line_start]));
                    }
                    open = Some(OpenFence {
                        fence,
                        start: line_start,
                        open_end: line_end,
                    });
                }
            }
            Some(current) => {
                if current.fence.is_closed_by(trimmed) {
                    segments.push(Segment::Fenced(FencedBlock {
                        open: &text[current.start..current.open_end],
                        body: &text[current.open_end..line_start],
                        close: Cow::Borrowed(&text[line_start..line_end]),
                    }));
                    open = None;
                    last = line_end;
                }
            }
        }

        line_start = line_end;
    }

    if let Some(current) = open {
        let open_line = &text[current.start..current.open_end];
        segments.push(Segment::Fenced(FencedBlock {
            open: open_line,
            body: &text[current.open_end..],
            close: Cow::Owned(current.fence.synthetic_close()),
        }));
    } else if last < text.len() {
        segments.push(Segment::Plain(&text[last..]));
    }

    segments
}
