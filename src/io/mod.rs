//! I/O utilities for the adapter protocol.
//!
//! Provides the JSONL writer and bounded line reader used on stdin/stdout,
//! along with the Unicode boundary helpers used by the chunkers.

pub mod jsonl;
pub mod unicode;

pub use jsonl::{JsonlWriter, LineRead, MAX_LINE_BYTES, next_line};
pub use unicode::{find_char_boundary, hard_cut_point};
