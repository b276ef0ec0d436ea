//! Streaming delivery callbacks.

use crate::error::Result;
use crate::io::JsonlWriter;
use crate::protocol::{
    AdapterStreamStatus, StreamEnd, StreamFailure, StreamStart, TextDelta, ToolStatus,
};
use async_trait::async_trait;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Destination for [`AdapterStreamStatus`] lines.
pub trait StatusSink: Send + Sync {
    /// Writes one status record.
    fn emit(&self, status: &AdapterStreamStatus) -> Result<()>;
}

impl<W: Write + Send> StatusSink for JsonlWriter<W> {
    fn emit(&self, status: &AdapterStreamStatus) -> Result<()> {
        self.write(status)
    }
}

/// Shared state handed to every [`StreamHandler`] callback.
#[derive(Clone)]
pub struct StreamContext {
    status: Arc<dyn StatusSink>,
    cancel: CancellationToken,
}

impl StreamContext {
    /// Creates a context reporting status to `status`.
    pub fn new(status: impl StatusSink + 'static, cancel: CancellationToken) -> Self {
        Self {
            status: Arc::new(status),
            cancel,
        }
    }

    /// Reports delivery progress to the runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the status line cannot be written.
    pub fn emit(&self, status: &AdapterStreamStatus) -> Result<()> {
        self.status.emit(status)
    }

    /// Token cancelled when the adapter is shutting down.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl fmt::Debug for StreamContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Callbacks for the six stream event kinds.
///
/// Every method defaults to a no-op, so an adapter overrides only the events
/// it cares about. A returned error is reported to the runtime as a
/// `delivery_error` status and the stream keeps going.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use nexus_adapter::protocol::TextDelta;
/// use nexus_adapter::stream::{StreamContext, StreamHandler};
///
/// #[derive(Default)]
/// struct Collect(String);
///
/// #[async_trait]
/// impl StreamHandler for Collect {
///     async fn on_token(&mut self, _ctx: &StreamContext, event: TextDelta) -> anyhow::Result<()> {
///         self.0.push_str(&event.text);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait StreamHandler: Send {
    /// A reply run has started; typically creates the platform message.
    async fn on_stream_start(&mut self, _ctx: &StreamContext, event: StreamStart) -> anyhow::Result<()> {
        debug!(run_id = ?event.run_id, "stream_start not handled");
        Ok(())
    }

    /// A chunk of reply text arrived.
    async fn on_token(&mut self, _ctx: &StreamContext, event: TextDelta) -> anyhow::Result<()> {
        debug!(chars = event.text.len(), "token not handled");
        Ok(())
    }

    /// A tool call changed status.
    async fn on_tool_status(&mut self, _ctx: &StreamContext, event: ToolStatus) -> anyhow::Result<()> {
        debug!(tool = %event.tool_name, "tool_status not handled");
        Ok(())
    }

    /// A chunk of reasoning text arrived.
    async fn on_reasoning(&mut self, _ctx: &StreamContext, event: TextDelta) -> anyhow::Result<()> {
        debug!(chars = event.text.len(), "reasoning not handled");
        Ok(())
    }

    /// The run finished; typically finalizes the platform message.
    async fn on_stream_end(&mut self, _ctx: &StreamContext, event: StreamEnd) -> anyhow::Result<()> {
        debug!(is_final = event.is_final, "stream_end not handled");
        Ok(())
    }

    /// The run failed upstream.
    async fn on_stream_error(&mut self, _ctx: &StreamContext, event: StreamFailure) -> anyhow::Result<()> {
        debug!(error = %event.error, partial = event.partial, "stream_error not handled");
        Ok(())
    }
}
