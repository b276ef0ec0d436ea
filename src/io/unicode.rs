//! Unicode utilities for text segmentation.
//!
//! Every cut the chunker makes goes through these helpers, so no chunk ever
//! ends inside a UTF-8 sequence and hard cuts never tear a grapheme cluster.

use unicode_segmentation::UnicodeSegmentation;

/// Finds a valid UTF-8 character boundary at or before the given position.
///
/// # Examples
///
/// ```
/// use nexus_adapter::io::find_char_boundary;
///
/// let s = "Hello 世界";
/// assert_eq!(find_char_boundary(s, 6), 6); // Before '世'
/// assert_eq!(find_char_boundary(s, 7), 6); // Middle of '世', backs up
/// ```
#[must_use]
pub const fn find_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut boundary = pos;
    // UTF-8 continuation bytes start with 10xxxxxx (0x80-0xBF)
    while boundary > 0 && (bytes[boundary] & 0xC0) == 0x80 {
        boundary -= 1;
    }
    boundary
}

/// Finds the last extended grapheme cluster boundary at or before `pos`.
///
/// Returns `0` when the first grapheme is already longer than `pos`.
#[must_use]
pub fn grapheme_floor(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let mut floor = 0;
    for (start, grapheme) in s.grapheme_indices(true) {
        let end = start + grapheme.len();
        if end > pos {
            break;
        }
        floor = end;
    }
    floor
}

/// Returns the byte position for a hard cut of `s` within `budget` bytes.
///
/// The cut lands on a grapheme boundary at or before `budget`. When a single
/// grapheme is wider than the budget the whole grapheme is taken, so callers
/// always make progress on non-empty input.
///
/// # Examples
///
/// ```
/// use nexus_adapter::io::hard_cut_point;
///
/// assert_eq!(hard_cut_point("abcdef", 4), 4);
/// assert_eq!(hard_cut_point("ab世界", 4), 2);
/// assert_eq!(hard_cut_point("世界", 1), 3);
/// ```
#[must_use]
pub fn hard_cut_point(s: &str, budget: usize) -> usize {
    if budget >= s.len() {
        return s.len();
    }
    match grapheme_floor(s, budget) {
        0 => s.graphemes(true).next().map_or(s.len(), str::len),
        cut => cut,
    }
}

/// Returns `true` if the character starting at byte `pos` is whitespace, or
/// if `pos` is at the end of the string.
#[must_use]
pub fn is_whitespace_or_end(s: &str, pos: usize) -> bool {
    s.get(pos..)
        .and_then(|rest| rest.chars().next())
        .is_none_or(char::is_whitespace)
}
