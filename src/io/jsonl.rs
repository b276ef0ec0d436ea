//! Line-delimited JSON on the protocol streams.
//!
//! [`JsonlWriter`] serializes one record per line behind a shared lock so
//! that clones handed to concurrent emitters never interleave partial
//! lines. [`next_line`] reads one bounded line from an async reader.

use crate::error::Result;
use serde::Serialize;
use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Longest accepted input line (1 MiB).
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Cloneable JSONL writer.
///
/// # Examples
///
/// ```
/// use nexus_adapter::io::JsonlWriter;
/// use serde_json::json;
///
/// let writer = JsonlWriter::new(Vec::new());
/// writer.write(&json!({"type": "message_created"})).unwrap();
/// let out = writer.with_inner(|buf| String::from_utf8_lossy(buf).into_owned());
/// assert_eq!(out, "{\"type\":\"message_created\"}\n");
/// ```
#[derive(Debug)]
pub struct JsonlWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for JsonlWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl JsonlWriter<Stdout> {
    /// Writer over the process stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonlWriter<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Writes `record` as one JSON line and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or the underlying
    /// writer fails.
    pub fn write<T: Serialize + ?Sized>(&self, record: &T) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut guard = self.lock();
        guard.write_all(&line)?;
        guard.flush()?;
        Ok(())
    }

    /// Runs `f` with the underlying writer locked.
    pub fn with_inner<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, W> {
        // A panic mid-write leaves at worst a truncated line; keep writing.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Outcome of [`next_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRead {
    /// A line is in the buffer, without its line terminator.
    Line,
    /// The line exceeded the limit and was discarded.
    TooLong,
    /// End of input.
    Eof,
}

/// Reads the next line from `reader` into `buf`.
///
/// The trailing `\n` (and a `\r` before it) is stripped. Lines longer than
/// `max` bytes are consumed and dropped, leaving `buf` empty. A final line
/// without a terminator is still returned.
///
/// # Errors
///
/// Returns any I/O error from the reader.
pub async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut read_any = false;
    let mut overflow = false;

    loop {
        let (consumed, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(if overflow {
                    LineRead::TooLong
                } else if read_any {
                    strip_cr(buf);
                    LineRead::Line
                } else {
                    LineRead::Eof
                });
            }
            read_any = true;

            let (consumed, content, done) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, &available[..i], true),
                None => (available.len(), available, false),
            };
            if !overflow {
                if buf.len() + content.len() > max {
                    overflow = true;
                    buf.clear();
                } else {
                    buf.extend_from_slice(content);
                }
            }
            (consumed, done)
        };
        reader.consume(consumed);

        if done {
            if overflow {
                return Ok(LineRead::TooLong);
            }
            strip_cr(buf);
            return Ok(LineRead::Line);
        }
    }
}

fn strip_cr(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}
