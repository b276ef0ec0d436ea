//! Protocol output for adapter commands.
//!
//! Every record an adapter produces is one JSON line on stdout. This module
//! holds the output format switch and the event emitter handed to `monitor`
//! and `backfill` handlers.

use crate::error::Result;
use crate::io::JsonlWriter;
use crate::protocol::NexusEvent;
use clap::ValueEnum;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    Jsonl,
}

/// Destination for [`NexusEvent`] records.
pub trait EventSink: Send + Sync {
    /// Writes one event.
    fn emit_event(&self, event: &NexusEvent) -> Result<()>;
}

impl<W: Write + Send> EventSink for JsonlWriter<W> {
    fn emit_event(&self, event: &NexusEvent) -> Result<()> {
        self.write(event)
    }
}

/// Cloneable handle adapters use to emit events.
///
/// # Examples
///
/// ```
/// use nexus_adapter::cli::EventEmitter;
/// use nexus_adapter::io::JsonlWriter;
/// use nexus_adapter::protocol::EventBuilder;
///
/// let out = JsonlWriter::new(Vec::new());
/// let events = EventEmitter::new(out.clone());
/// events.emit(&EventBuilder::new("loopback", "loopback:1").build()).unwrap();
/// assert_eq!(events.emitted(), 1);
/// ```
#[derive(Clone)]
pub struct EventEmitter {
    sink: Arc<dyn EventSink>,
    emitted: Arc<AtomicU64>,
}

impl EventEmitter {
    /// Creates an emitter writing to `sink`.
    pub fn new(sink: impl EventSink + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
            emitted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emits one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be written.
    pub fn emit(&self, event: &NexusEvent) -> Result<()> {
        self.sink.emit_event(event)?;
        self.emitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("emitted", &self.emitted())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::EventBuilder;

    #[test]
    fn test_emitter_writes_jsonl_and_counts() {
        let out = JsonlWriter::new(Vec::new());
        let events = EventEmitter::new(out.clone());
        let clone = events.clone();

        events
            .emit(&EventBuilder::new("t", "t:1").timestamp_ms(1).build())
            .unwrap();
        clone
            .emit(&EventBuilder::new("t", "t:2").timestamp_ms(2).build())
            .unwrap();

        assert_eq!(events.emitted(), 2);
        let text = out.with_inner(|buf| String::from_utf8_lossy(buf).into_owned());
        let ids: Vec<String> = text
            .lines()
            .map(|l| serde_json::from_str::<NexusEvent>(l).unwrap().event_id)
            .collect();
        assert_eq!(ids, vec!["t:1", "t:2"]);
    }

    #[test]
    fn test_output_format_values() {
        let names: Vec<_> = OutputFormat::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["jsonl"]);
    }
}
