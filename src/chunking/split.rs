//! Boundary search for plain text.
//!
//! Searches backward from a byte budget for the most readable place to cut:
//! paragraph break, line break, sentence end, word boundary, and finally a
//! hard cut.

use crate::io::unicode::{find_char_boundary, hard_cut_point, is_whitespace_or_end};

/// Which rule produced a split point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// After a `\n\n` in the last 30% of the window.
    Paragraph,
    /// After a `\n` in the last 40% of the window.
    Line,
    /// After `.`, `!` or `?` followed by whitespace, in the last 50%.
    Sentence,
    /// After a space in the last 20% of the window.
    Word,
    /// No natural boundary; cut at the budget.
    Hard,
}

/// A chosen split position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPoint {
    /// Byte offset to split at; the first piece is `text[..at]`.
    pub at: usize,
    /// Rule that selected this offset.
    pub boundary: Boundary,
}

impl SplitPoint {
    const fn new(at: usize, boundary: Boundary) -> Self {
        Self { at, boundary }
    }
}

/// Start of the search window covering the last `(100 - keep_pct)`% of `limit`.
fn window_start(text: &str, limit: usize, keep_pct: usize) -> usize {
    find_char_boundary(text, limit * keep_pct / 100)
}

/// Finds the best position to split `text` so the first piece fits in `limit`
/// bytes.
///
/// Returns `text.len()` when the whole text fits. The returned offset is
/// always a UTF-8 character boundary and, for non-empty text, always greater
/// than zero.
///
/// # Examples
///
/// ```
/// use nexus_adapter::chunking::split::{Boundary, find_split_point};
///
/// let text = "First line of text\nsecond line keeps going";
/// let split = find_split_point(text, 25);
/// assert_eq!(split.boundary, Boundary::Line);
/// assert_eq!(&text[..split.at], "First line of text\n");
/// ```
#[must_use]
pub fn find_split_point(text: &str, limit: usize) -> SplitPoint {
    if limit >= text.len() {
        return SplitPoint::new(text.len(), Boundary::Hard);
    }
    let end = find_char_boundary(text, limit);

    // 1. Paragraph break in the last 30%.
    let start = window_start(text, end, 70);
    if let Some(idx) = text[start..end].rfind("\n\n") {
        return SplitPoint::new(start + idx + 2, Boundary::Paragraph);
    }

    // 2. Line break in the last 40%.
    let start = window_start(text, end, 60);
    if let Some(idx) = text[start..end].rfind('\n') {
        return SplitPoint::new(start + idx + 1, Boundary::Line);
    }

    // 3. Sentence end in the last 50%. Terminators are ASCII, so byte
    // positions are character boundaries.
    let start = window_start(text, end, 50);
    let sentence_end = text[start..end]
        .char_indices()
        .rev()
        .find(|&(i, c)| matches!(c, '.' | '!' | '?') && is_whitespace_or_end(text, start + i + 1));
    if let Some((idx, _)) = sentence_end {
        return SplitPoint::new(start + idx + 1, Boundary::Sentence);
    }

    // 4. Word boundary in the last 20%.
    let start = window_start(text, end, 80);
    if let Some(idx) = text[start..end].rfind(' ') {
        return SplitPoint::new(start + idx + 1, Boundary::Word);
    }

    // 5. Hard cut.
    SplitPoint::new(hard_cut_point(text, limit), Boundary::Hard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_fits_entirely() {
        let split = find_split_point("short", 10);
        assert_eq!(split.at, 5);
    }

    #[test]
    fn test_paragraph_preferred_over_line() {
        // Paragraph break at 16..18 lies in the last 30% of a 20 byte window.
        let text = "aaaaaaaaa\nbbbbbb\n\ncccccccccc";
        let split = find_split_point(text, 20);
        assert_eq!(split.boundary, Boundary::Paragraph);
        assert_eq!(split.at, 18);
    }

    #[test]
    fn test_paragraph_outside_window_falls_through() {
        let text = "Paragraph one.\n\nParagraph two is quite long indeed and continues on and on and on.";
        let split = find_split_point(text, 40);
        assert_ne!(split.boundary, Boundary::Paragraph);
        assert_ne!(split.boundary, Boundary::Hard);
        assert!(split.at <= 40);
        assert!(text[..split.at].ends_with(' '));
    }

    #[test]
    fn test_sentence_boundary() {
        let text = "The first sentence ends here. Then the next one runs long";
        let split = find_split_point(text, 40);
        assert_eq!(split.boundary, Boundary::Sentence);
        assert_eq!(&text[..split.at], "The first sentence ends here.");
    }

    #[test]
    fn test_abbreviation_is_not_sentence_end() {
        // "e.g" has no whitespace after the dot, so a word boundary wins.
        let text = "aaaaaaaaaaaaaaaaaaaaaaaaaa e.g.value bbbbbbbbbbbb";
        let split = find_split_point(text, 40);
        assert_eq!(split.boundary, Boundary::Word);
        assert_eq!(split.at, 37);
    }

    #[test]
    fn test_word_boundary() {
        let text = "abcdefghijklmnopqrstuvwxyz abcdefghijklmnopqrstuvwxyz";
        let split = find_split_point(text, 30);
        assert_eq!(split.boundary, Boundary::Word);
        assert_eq!(split.at, 27);
    }

    #[test]
    fn test_hard_cut() {
        let text = "x".repeat(100);
        let split = find_split_point(&text, 30);
        assert_eq!(split, SplitPoint::new(30, Boundary::Hard));
    }

    #[test_case("世界世界世界世界", 7, 6 ; "cjk backs up to char boundary")]
    #[test_case("ééééééé", 5, 4 ; "two byte chars")]
    fn test_hard_cut_respects_utf8(text: &str, limit: usize, expected: usize) {
        let split = find_split_point(text, limit);
        assert_eq!(split.at, expected);
        assert!(text.is_char_boundary(split.at));
    }
}
