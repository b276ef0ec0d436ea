//! `nexus-loopback`: a reference adapter with no external platform.
//!
//! Sends are chunked and assigned `loopback:<n>` ids, optionally appended to
//! an outbox file. Inbound events come from an inbox file, one message per
//! line. Both paths come from the runtime context config (`inbox`,
//! `outbox`), along with `text_limit`, `chunker`, `poll_interval_ms` and
//! `max_errors`.

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nexus_adapter::chunking::{DEFAULT_TEXT_LIMIT, create_chunker};
use nexus_adapter::cli::{Adapter, AdapterContext, EventEmitter, run};
use nexus_adapter::delivery::send_chunked_with;
use nexus_adapter::monitor::{FetchBatch, PollConfig, PollMonitor, RetryPolicy};
use nexus_adapter::protocol::{
    AdapterAccount, AdapterHealth, AdapterInfo, AdapterStreamStatus, Capability,
    ChannelCapabilities, DeliveryResult, EventBuilder, NexusEvent, SendRequest, StreamEnd,
    StreamFailure, StreamStart, TextDelta,
};
use nexus_adapter::stream::{StreamContext, StreamHandler};
use serde_json::json;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

const CHANNEL: &str = "loopback";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

fn main() -> ExitCode {
    run(Loopback::default())
}

/// Hands out `loopback:<n>` message ids.
#[derive(Debug, Default, Clone)]
struct IdSource(Arc<AtomicU64>);

impl IdSource {
    fn next(&self) -> String {
        format!("{CHANNEL}:{}", self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[derive(Debug, Default)]
struct Loopback {
    ids: IdSource,
}

impl Loopback {
    fn text_limit(ctx: &AdapterContext) -> usize {
        ctx.config_u64("text_limit")
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(DEFAULT_TEXT_LIMIT)
    }

    fn inbox(ctx: &AdapterContext) -> anyhow::Result<PathBuf> {
        ctx.config_str("inbox")
            .map(PathBuf::from)
            .context("no inbox configured (runtime config `inbox`)")
    }
}

#[async_trait]
impl Adapter for Loopback {
    fn info(&self) -> AdapterInfo {
        AdapterInfo {
            channel: CHANNEL.to_string(),
            name: "Loopback".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            supports: vec![
                Capability::Monitor,
                Capability::Send,
                Capability::Stream,
                Capability::Backfill,
                Capability::Health,
                Capability::Accounts,
            ],
            credential_service: None,
            multi_account: false,
            channel_capabilities: ChannelCapabilities {
                text_limit: DEFAULT_TEXT_LIMIT,
                supports_markdown: true,
                markdown_flavor: Some("standard".to_string()),
                supports_code_blocks: true,
                supports_edit: true,
                supports_streaming_edit: true,
                ..ChannelCapabilities::default()
            },
        }
    }

    async fn monitor(&self, ctx: &AdapterContext, account: &str, events: &EventEmitter) -> anyhow::Result<()> {
        let inbox = Self::inbox(ctx)?;
        let interval = ctx
            .config_u64("poll_interval_ms")
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        let config = PollConfig::new(Duration::from_millis(interval)).with_retry_policy(
            RetryPolicy::from_max_errors(
                ctx.config_u64("max_errors")
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(0),
            ),
        );

        let account = account.to_string();
        let monitor = PollMonitor::new(config, 0_u64, |cursor: u64| {
            let inbox = inbox.clone();
            let account = account.clone();
            async move {
                let (events, lines) = read_inbox(&inbox, &account, cursor).await?;
                Ok::<_, anyhow::Error>(FetchBatch::new(events, lines))
            }
        })?;

        let report = monitor.run(|event| events.emit(&event), &ctx.cancel).await?;
        info!(cursor = report.cursor, polls = report.polls, "inbox monitor finished");
        Ok(())
    }

    async fn send(&self, ctx: &AdapterContext, request: SendRequest) -> anyhow::Result<DeliveryResult> {
        let limit = Self::text_limit(ctx);
        let chunker = create_chunker(ctx.config_str("chunker").unwrap_or("fenced"))?;
        let mut outbox = match ctx.config_str("outbox") {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("open outbox {path}"))?,
            ),
            None => None,
        };

        Ok(send_chunked_with(chunker.as_ref(), &request.text, limit, |chunk| {
            let id = self.ids.next();
            if let Some(file) = outbox.as_mut() {
                let record = json!({"id": id, "to": request.to, "text": chunk});
                writeln!(file, "{record}").context("append to outbox")?;
            }
            debug!(id = %id, chars = chunk.len(), "chunk delivered");
            Ok(id)
        }))
    }

    async fn backfill(
        &self,
        ctx: &AdapterContext,
        account: &str,
        since: DateTime<Utc>,
        events: &EventEmitter,
    ) -> anyhow::Result<()> {
        let inbox = Self::inbox(ctx)?;
        let (batch, _) = read_inbox(&inbox, account, 0).await?;
        let since_ms = since.timestamp_millis();
        for event in batch.iter().filter(|e| e.timestamp >= since_ms) {
            events.emit(event)?;
        }
        Ok(())
    }

    async fn health(&self, ctx: &AdapterContext, account: &str) -> anyhow::Result<AdapterHealth> {
        let mut health = AdapterHealth {
            connected: true,
            account: account.to_string(),
            ..AdapterHealth::default()
        };
        if let Some(inbox) = ctx.config_str("inbox") {
            if !Path::new(inbox).exists() {
                return Ok(AdapterHealth::disconnected(account, format!("inbox {inbox} not found")));
            }
            health.details = Some(
                [("inbox".to_string(), json!(inbox))]
                    .into_iter()
                    .collect(),
            );
        }
        Ok(health)
    }

    async fn accounts(&self, ctx: &AdapterContext) -> anyhow::Result<Vec<AdapterAccount>> {
        let id = ctx
            .runtime
            .as_ref()
            .map_or_else(|| "default".to_string(), |r| r.account_id.clone());
        Ok(vec![AdapterAccount {
            id,
            display_name: Some("Loopback".to_string()),
            credential_ref: None,
            status: "ready".to_string(),
        }])
    }

    fn stream_handler(&self, ctx: &AdapterContext) -> Option<Box<dyn StreamHandler>> {
        Some(Box::new(LoopbackStream::new(
            self.ids.clone(),
            Self::text_limit(ctx),
        )))
    }
}

/// Reads inbox lines after `cursor`, returning their events and the total
/// line count.
///
/// Line `n` is stamped `n` milliseconds after the file's modification time,
/// so timestamps are stable across reads and ordered by line.
async fn read_inbox(path: &Path, account: &str, cursor: u64) -> anyhow::Result<(Vec<NexusEvent>, u64)> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read inbox {}", path.display()))?;
    let modified: DateTime<Utc> = tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .map_or_else(|_| Utc::now(), DateTime::from);
    let base_ms = modified.timestamp_millis();

    let mut events = Vec::new();
    let mut lines = 0_u64;
    for line in raw.lines() {
        lines += 1;
        if lines <= cursor || line.trim().is_empty() {
            continue;
        }
        events.push(
            EventBuilder::new(CHANNEL, &format!("{CHANNEL}:inbox:{lines}"))
                .timestamp_ms(base_ms.saturating_add(i64::try_from(lines).unwrap_or(i64::MAX)))
                .content(line)
                .sender("inbox", Some("Inbox"))
                .container("inbox", "direct")
                .account(account)
                .metadata("line", lines)
                .build(),
        );
    }
    Ok((events, lines))
}

/// Pseudo-streams a reply by "editing" a message, rolling over to a new
/// message whenever the text limit would be exceeded.
struct LoopbackStream {
    ids: IdSource,
    limit: usize,
    current: Option<String>,
    text: String,
    sent: Vec<String>,
}

impl LoopbackStream {
    const fn new(ids: IdSource, limit: usize) -> Self {
        Self {
            ids,
            limit,
            current: None,
            text: String::new(),
            sent: Vec::new(),
        }
    }

    fn open(&mut self, ctx: &StreamContext) -> nexus_adapter::Result<String> {
        let id = self.ids.next();
        ctx.emit(&AdapterStreamStatus::MessageCreated {
            message_id: id.clone(),
        })?;
        self.current = Some(id.clone());
        self.text.clear();
        Ok(id)
    }

    fn close(&mut self, ctx: &StreamContext, is_final: bool) -> nexus_adapter::Result<()> {
        if let Some(id) = self.current.take() {
            ctx.emit(&AdapterStreamStatus::MessageSent {
                message_id: id.clone(),
                is_final,
            })?;
            self.sent.push(id);
        }
        Ok(())
    }
}

#[async_trait]
impl StreamHandler for LoopbackStream {
    async fn on_stream_start(&mut self, ctx: &StreamContext, event: StreamStart) -> anyhow::Result<()> {
        debug!(run_id = ?event.run_id, "stream started");
        self.sent.clear();
        self.open(ctx)?;
        Ok(())
    }

    async fn on_token(&mut self, ctx: &StreamContext, event: TextDelta) -> anyhow::Result<()> {
        if self.limit > 0 && !self.text.is_empty() && self.text.len() + event.text.len() > self.limit {
            self.close(ctx, false)?;
        }
        let id = match self.current.clone() {
            Some(id) => id,
            None => self.open(ctx)?,
        };
        self.text.push_str(&event.text);
        ctx.emit(&AdapterStreamStatus::MessageUpdated {
            message_id: id,
            chars: self.text.len(),
        })?;
        Ok(())
    }

    async fn on_stream_end(&mut self, ctx: &StreamContext, event: StreamEnd) -> anyhow::Result<()> {
        self.close(ctx, event.is_final)?;
        if event.is_final {
            ctx.emit(&AdapterStreamStatus::DeliveryComplete {
                message_ids: std::mem::take(&mut self.sent),
            })?;
        }
        Ok(())
    }

    async fn on_stream_error(&mut self, ctx: &StreamContext, event: StreamFailure) -> anyhow::Result<()> {
        self.close(ctx, true)?;
        ctx.emit(&AdapterStreamStatus::DeliveryError { error: event.error })?;
        Ok(())
    }
}
