//! The trait adapter binaries implement.

use crate::cli::output::EventEmitter;
use crate::config::RuntimeContext;
use crate::error::CommandError;
use crate::protocol::{AdapterAccount, AdapterHealth, AdapterInfo, DeliveryResult, SendRequest};
use crate::stream::StreamHandler;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Per-invocation state shared with adapter handlers.
#[derive(Debug, Clone, Default)]
pub struct AdapterContext {
    /// Runtime context, when one was injected.
    pub runtime: Option<RuntimeContext>,
    /// Cancelled on SIGINT or SIGTERM.
    pub cancel: CancellationToken,
}

impl AdapterContext {
    /// Creates a context.
    #[must_use]
    pub const fn new(runtime: Option<RuntimeContext>, cancel: CancellationToken) -> Self {
        Self { runtime, cancel }
    }

    /// Resolves the account: the `--account` flag, else the runtime
    /// context's account, else empty.
    #[must_use]
    pub fn account(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.runtime.as_ref().map(|r| r.account_id.clone()))
            .unwrap_or_default()
    }

    /// String value from the runtime context's config.
    #[must_use]
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.runtime.as_ref().and_then(|r| r.config_str(key))
    }

    /// Unsigned integer value from the runtime context's config.
    #[must_use]
    pub fn config_u64(&self, key: &str) -> Option<u64> {
        self.runtime.as_ref().and_then(|r| r.config_u64(key))
    }
}

/// Handlers for the adapter protocol commands.
///
/// Only [`Adapter::info`] is required. Every other command defaults to a
/// "not supported" error, so an adapter implements just the capabilities it
/// advertises.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Identity and capabilities.
    fn info(&self) -> AdapterInfo;

    /// Emits live events until `ctx.cancel` fires.
    async fn monitor(
        &self,
        _ctx: &AdapterContext,
        _account: &str,
        _events: &EventEmitter,
    ) -> anyhow::Result<()> {
        Err(CommandError::Unsupported("monitor").into())
    }

    /// Delivers one message.
    async fn send(&self, _ctx: &AdapterContext, _request: SendRequest) -> anyhow::Result<DeliveryResult> {
        Err(CommandError::Unsupported("send").into())
    }

    /// Emits historical events since `since`, then returns.
    async fn backfill(
        &self,
        _ctx: &AdapterContext,
        _account: &str,
        _since: DateTime<Utc>,
        _events: &EventEmitter,
    ) -> anyhow::Result<()> {
        Err(CommandError::Unsupported("backfill").into())
    }

    /// Reports the connection status of an account.
    async fn health(&self, _ctx: &AdapterContext, _account: &str) -> anyhow::Result<AdapterHealth> {
        Err(CommandError::Unsupported("health").into())
    }

    /// Lists configured accounts.
    async fn accounts(&self, _ctx: &AdapterContext) -> anyhow::Result<Vec<AdapterAccount>> {
        Err(CommandError::Unsupported("accounts").into())
    }

    /// Creates the handler for one `stream` invocation, if streaming is
    /// supported.
    fn stream_handler(&self, _ctx: &AdapterContext) -> Option<Box<dyn StreamHandler>> {
        None
    }
}
