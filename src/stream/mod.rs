//! Streaming delivery dispatcher.
//!
//! Reads [`StreamEvent`] lines from the runtime and routes each one to the
//! matching [`StreamHandler`] method. A line that cannot be parsed is logged
//! and skipped; a handler error becomes a `delivery_error` status line. Only
//! end of input, cancellation or a read failure end the loop.

pub mod handler;

pub use handler::{StatusSink, StreamContext, StreamHandler};

use crate::error::{Result, StreamError};
use crate::io::{LineRead, MAX_LINE_BYTES, next_line};
use crate::protocol::{AdapterStreamStatus, StreamEvent, StreamEventKind};
use serde_json::Value;
use tokio::io::AsyncBufRead;
use tracing::{debug, error, info, warn};

/// Counters from one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Non-empty lines read.
    pub lines: u64,
    /// Events handed to the handler.
    pub dispatched: u64,
    /// Lines that were malformed, oversized or of an unknown type.
    pub skipped: u64,
    /// Handler calls that returned an error.
    pub handler_errors: u64,
}

/// Reads events from `reader` until end of input or cancellation of the
/// context's token.
///
/// # Errors
///
/// Returns [`StreamError::Read`] if the reader fails. Parse and handler
/// failures are not errors.
pub async fn dispatch<R, H>(reader: R, handler: &mut H, ctx: &StreamContext) -> Result<DispatchReport>
where
    R: AsyncBufRead + Unpin,
    H: StreamHandler + ?Sized,
{
    let mut reader = reader;
    let mut buf = Vec::new();
    let mut report = DispatchReport::default();
    let cancel = ctx.cancellation().clone();

    loop {
        if cancel.is_cancelled() {
            info!("stream shutting down (cancelled)");
            break;
        }

        let read = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("stream shutting down (cancelled)");
                break;
            }
            read = next_line(&mut reader, &mut buf, MAX_LINE_BYTES) => read,
        };

        match read.map_err(|e| StreamError::Read(e.to_string()))? {
            LineRead::Eof => break,
            LineRead::TooLong => {
                report.lines += 1;
                report.skipped += 1;
                warn!(max_bytes = MAX_LINE_BYTES, "stream: skipping oversized line");
                continue;
            }
            LineRead::Line => {}
        }

        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        report.lines += 1;

        let event = match parse_event(&buf) {
            Ok(Some(event)) => event,
            Ok(None) => {
                report.skipped += 1;
                continue;
            }
            Err(err) => {
                report.skipped += 1;
                error!(error = %err, "stream: failed to parse event");
                continue;
            }
        };

        let kind = event.kind();
        report.dispatched += 1;
        if let Err(err) = deliver(handler, ctx, event).await {
            report.handler_errors += 1;
            let message = format!("{err:#}");
            error!(kind = kind.as_str(), error = %message, "stream handler error");
            let status = AdapterStreamStatus::DeliveryError { error: message };
            if let Err(write_err) = ctx.emit(&status) {
                warn!(error = %write_err, "failed to report stream handler error");
            }
        }
    }

    debug!(
        lines = report.lines,
        dispatched = report.dispatched,
        skipped = report.skipped,
        handler_errors = report.handler_errors,
        "stream finished"
    );
    Ok(report)
}

/// Parses one line. Returns `Ok(None)` for a well-formed line whose `type`
/// is not a stream event kind.
fn parse_event(line: &[u8]) -> serde_json::Result<Option<StreamEvent>> {
    let value: Value = serde_json::from_slice(line)?;
    let type_name = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if StreamEventKind::from_type(&type_name).is_none() {
        debug!(kind = %type_name, "stream: unknown event type");
        return Ok(None);
    }
    serde_json::from_value(value).map(Some)
}

async fn deliver<H>(handler: &mut H, ctx: &StreamContext, event: StreamEvent) -> anyhow::Result<()>
where
    H: StreamHandler + ?Sized,
{
    match event {
        StreamEvent::StreamStart(e) => handler.on_stream_start(ctx, e).await,
        StreamEvent::Token(e) => handler.on_token(ctx, e).await,
        StreamEvent::ToolStatus(e) => handler.on_tool_status(ctx, e).await,
        StreamEvent::Reasoning(e) => handler.on_reasoning(ctx, e).await,
        StreamEvent::StreamEnd(e) => handler.on_stream_end(ctx, e).await,
        StreamEvent::StreamError(e) => handler.on_stream_error(ctx, e).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::JsonlWriter;
    use crate::protocol::{StreamEnd, StreamFailure, StreamStart, TextDelta, ToolStatus};
    use anyhow::bail;
    use async_trait::async_trait;
    use tokio::io::AsyncWriteExt;
    use tokio_util::sync::CancellationToken;

    /// Records which callbacks ran.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_tokens: bool,
    }

    #[async_trait]
    impl StreamHandler for Recorder {
        async fn on_stream_start(&mut self, _ctx: &StreamContext, e: StreamStart) -> anyhow::Result<()> {
            self.calls
                .push(format!("start:{}", e.run_id.unwrap_or_default()));
            Ok(())
        }

        async fn on_token(&mut self, _ctx: &StreamContext, e: TextDelta) -> anyhow::Result<()> {
            if self.fail_tokens {
                bail!("edit failed");
            }
            self.calls.push(format!("token:{}", e.text));
            Ok(())
        }

        async fn on_tool_status(&mut self, _ctx: &StreamContext, e: ToolStatus) -> anyhow::Result<()> {
            self.calls.push(format!("tool:{}", e.tool_name));
            Ok(())
        }

        async fn on_reasoning(&mut self, _ctx: &StreamContext, e: TextDelta) -> anyhow::Result<()> {
            self.calls.push(format!("reasoning:{}", e.text));
            Ok(())
        }

        async fn on_stream_end(&mut self, ctx: &StreamContext, e: StreamEnd) -> anyhow::Result<()> {
            self.calls.push(format!("end:{}", e.is_final));
            ctx.emit(&AdapterStreamStatus::DeliveryComplete {
                message_ids: vec!["m1".to_string()],
            })?;
            Ok(())
        }

        async fn on_stream_error(&mut self, _ctx: &StreamContext, e: StreamFailure) -> anyhow::Result<()> {
            self.calls.push(format!("error:{}", e.error));
            Ok(())
        }
    }

    /// Uses only the default no-op callbacks.
    struct Silent;

    impl StreamHandler for Silent {}

    fn context() -> (StreamContext, JsonlWriter<Vec<u8>>, CancellationToken) {
        let status = JsonlWriter::new(Vec::new());
        let cancel = CancellationToken::new();
        (StreamContext::new(status.clone(), cancel.clone()), status, cancel)
    }

    fn status_lines(status: &JsonlWriter<Vec<u8>>) -> Vec<Value> {
        status.with_inner(|buf| {
            String::from_utf8_lossy(buf)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        })
    }

    #[tokio::test]
    async fn test_token_invokes_only_on_token() {
        let (ctx, status, _) = context();
        let mut handler = Recorder::default();
        let input: &[u8] = b"{\"type\":\"token\",\"text\":\"hi\"}\n";

        let report = dispatch(input, &mut handler, &ctx).await.unwrap();
        assert_eq!(handler.calls, vec!["token:hi"]);
        assert_eq!(report.dispatched, 1);
        assert!(status_lines(&status).is_empty());
    }

    #[tokio::test]
    async fn test_all_kinds_dispatched_in_order() {
        let (ctx, status, _) = context();
        let mut handler = Recorder::default();
        let input = concat!(
            "{\"type\":\"stream_start\",\"runId\":\"r1\"}\n",
            "{\"type\":\"reasoning\",\"text\":\"think\"}\n",
            "{\"type\":\"tool_status\",\"toolName\":\"search\",\"status\":\"started\"}\n",
            "{\"type\":\"token\",\"text\":\"a\"}\n",
            "{\"type\":\"stream_error\",\"error\":\"upstream\",\"partial\":true}\n",
            "{\"type\":\"stream_end\",\"final\":true}\n",
        );

        let report = dispatch(input.as_bytes(), &mut handler, &ctx).await.unwrap();
        assert_eq!(
            handler.calls,
            vec![
                "start:r1",
                "reasoning:think",
                "tool:search",
                "token:a",
                "error:upstream",
                "end:true"
            ]
        );
        assert_eq!(report.lines, 6);
        assert_eq!(report.dispatched, 6);
        assert_eq!(status_lines(&status)[0]["type"], "delivery_complete");
    }

    #[tokio::test]
    async fn test_unknown_malformed_and_empty_lines_are_skipped() {
        let (ctx, _, _) = context();
        let mut handler = Recorder::default();
        let input = "\n{\"type\":\"unknown_x\"}\nnot json\n   \n[1,2]\n{\"type\":\"token\",\"text\":\"ok\"}\n";

        let report = dispatch(input.as_bytes(), &mut handler, &ctx).await.unwrap();
        assert_eq!(handler.calls, vec!["token:ok"]);
        assert_eq!(
            report,
            DispatchReport {
                lines: 4,
                dispatched: 1,
                skipped: 3,
                handler_errors: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_handler_error_emits_delivery_error_and_continues() {
        let (ctx, status, _) = context();
        let mut handler = Recorder {
            fail_tokens: true,
            ..Recorder::default()
        };
        let input = "{\"type\":\"token\",\"text\":\"a\"}\n{\"type\":\"stream_end\"}\n";

        let report = dispatch(input.as_bytes(), &mut handler, &ctx).await.unwrap();
        assert_eq!(report.handler_errors, 1);
        assert_eq!(handler.calls, vec!["end:false"]);

        let lines = status_lines(&status);
        assert_eq!(lines[0], serde_json::json!({"type": "delivery_error", "error": "edit failed"}));
        assert_eq!(lines[1]["type"], "delivery_complete");
    }

    #[tokio::test]
    async fn test_default_callbacks_are_noops() {
        let (ctx, status, _) = context();
        let input = "{\"type\":\"stream_start\"}\n{\"type\":\"token\",\"text\":\"x\"}\n{\"type\":\"stream_end\",\"final\":true}\n";
        let report = dispatch(input.as_bytes(), &mut Silent, &ctx).await.unwrap();
        assert_eq!(report.dispatched, 3);
        assert_eq!(report.handler_errors, 0);
        assert!(status_lines(&status).is_empty());
    }

    #[tokio::test]
    async fn test_oversized_line_is_skipped() {
        let (ctx, _, _) = context();
        let mut handler = Recorder::default();
        let big = format!(
            "{{\"type\":\"token\",\"text\":\"{}\"}}\n{{\"type\":\"token\",\"text\":\"small\"}}\n",
            "x".repeat(MAX_LINE_BYTES)
        );
        let report = dispatch(big.as_bytes(), &mut handler, &ctx).await.unwrap();
        assert_eq!(handler.calls, vec!["token:small"]);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_reads_nothing() {
        let (ctx, _, cancel) = context();
        cancel.cancel();
        let mut handler = Recorder::default();
        let input: &[u8] = b"{\"type\":\"token\",\"text\":\"hi\"}\n";
        let report = dispatch(input, &mut handler, &ctx).await.unwrap();
        assert!(handler.calls.is_empty());
        assert_eq!(report.lines, 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_blocked_read() {
        let (ctx, _, cancel) = context();
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut handler = Recorder::default();

        writer
            .write_all(b"{\"type\":\"token\",\"text\":\"first\"}\n")
            .await
            .unwrap();

        let stopper = cancel.clone();
        let task = async move {
            tokio::task::yield_now().await;
            stopper.cancel();
        };

        // The writer stays open, so only cancellation can end the read.
        let (report, ()) = tokio::join!(
            dispatch(tokio::io::BufReader::new(reader), &mut handler, &ctx),
            task
        );
        let report = report.unwrap();
        assert!(report.lines <= 1);
        drop(writer);
    }

    #[tokio::test]
    async fn test_boxed_handler_dispatch() {
        let (ctx, _, _) = context();
        let mut handler: Box<dyn StreamHandler> = Box::new(Silent);
        let input: &[u8] = b"{\"type\":\"token\",\"text\":\"hi\"}\n";
        let report = dispatch(input, handler.as_mut(), &ctx).await.unwrap();
        assert_eq!(report.dispatched, 1);
    }
}
