//! CLI command implementations.
//!
//! Routes a parsed [`Cli`] to the adapter's handlers and writes each
//! command's protocol output.

use crate::cli::adapter::{Adapter, AdapterContext};
use crate::cli::output::EventEmitter;
use crate::cli::parser::{AccountsCommand, Cli, Commands};
use crate::error::{CommandError, Error, Result};
use crate::io::JsonlWriter;
use crate::protocol::{AdapterHealth, DeliveryError, DeliveryResult, SendRequest};
use crate::stream::{StreamContext, dispatch};
use chrono::{DateTime, Utc};
use std::io::Write;
use tokio::io::{AsyncRead, BufReader};
use tracing::{info, warn};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `adapter` - Adapter handling the command.
/// * `cli` - Parsed CLI arguments.
/// * `ctx` - Runtime context and cancellation token.
/// * `out` - Protocol output (stdout).
/// * `input` - Protocol input (stdin), read by `stream` only.
///
/// # Errors
///
/// Returns an error if the command is unsupported, its handler fails, or
/// output cannot be written. `send` and `health` failures are reported as
/// protocol records instead.
pub async fn execute<A, W, R>(
    adapter: &A,
    cli: &Cli,
    ctx: &AdapterContext,
    out: JsonlWriter<W>,
    input: R,
) -> Result<()>
where
    A: Adapter + ?Sized,
    W: Write + Send + 'static,
    R: AsyncRead + Unpin,
{
    match &cli.command {
        Commands::Info => out.write(&adapter.info()),
        Commands::Monitor { account, .. } => {
            cmd_monitor(adapter, ctx, &ctx.account(account.as_deref()), out).await
        }
        Commands::Send {
            account,
            to,
            text,
            media,
            caption,
            reply_to,
            thread,
        } => {
            let request = SendRequest {
                account: ctx.account(account.as_deref()),
                to: to.clone(),
                text: text.clone(),
                media: media.clone(),
                caption: caption.clone(),
                reply_to_id: reply_to.clone(),
                thread_id: thread.clone(),
            };
            cmd_send(adapter, ctx, request, &out).await
        }
        Commands::Backfill { account, since, .. } => {
            cmd_backfill(adapter, ctx, &ctx.account(account.as_deref()), *since, out).await
        }
        Commands::Health { account } => {
            cmd_health(adapter, ctx, &ctx.account(account.as_deref()), &out).await
        }
        Commands::Accounts { action } => {
            cmd_accounts(adapter, ctx, action.unwrap_or(AccountsCommand::List), &out).await
        }
        Commands::Stream { .. } => cmd_stream(adapter, ctx, out, input).await,
    }
}

async fn cmd_monitor<A, W>(adapter: &A, ctx: &AdapterContext, account: &str, out: JsonlWriter<W>) -> Result<()>
where
    A: Adapter + ?Sized,
    W: Write + Send + 'static,
{
    let events = EventEmitter::new(out);
    info!(account, "monitor starting");
    adapter
        .monitor(ctx, account, &events)
        .await
        .map_err(|e| command_failed("monitor", e))?;
    info!(events = events.emitted(), "monitor stopped cleanly");
    Ok(())
}

async fn cmd_send<A, W>(adapter: &A, ctx: &AdapterContext, request: SendRequest, out: &JsonlWriter<W>) -> Result<()>
where
    A: Adapter + ?Sized,
    W: Write + Send + 'static,
{
    let result = match adapter.send(ctx, request).await {
        Ok(result) => result,
        Err(err) => {
            let err = command_failed("send", err);
            if matches!(err, Error::Command(CommandError::Unsupported(_))) {
                return Err(err);
            }
            warn!(error = %err, "send failed");
            DeliveryResult::failed(Vec::new(), DeliveryError::unknown(reason(&err)))
        }
    };
    out.write(&result)
}

async fn cmd_backfill<A, W>(
    adapter: &A,
    ctx: &AdapterContext,
    account: &str,
    since: DateTime<Utc>,
    out: JsonlWriter<W>,
) -> Result<()>
where
    A: Adapter + ?Sized,
    W: Write + Send + 'static,
{
    let events = EventEmitter::new(out);
    info!(account, since = %since.to_rfc3339(), "backfill starting");
    adapter
        .backfill(ctx, account, since, &events)
        .await
        .map_err(|e| command_failed("backfill", e))?;
    info!(events = events.emitted(), "backfill completed");
    Ok(())
}

async fn cmd_health<A, W>(adapter: &A, ctx: &AdapterContext, account: &str, out: &JsonlWriter<W>) -> Result<()>
where
    A: Adapter + ?Sized,
    W: Write + Send + 'static,
{
    let health = match adapter.health(ctx, account).await {
        Ok(health) => health,
        Err(err) => {
            let err = command_failed("health", err);
            if matches!(err, Error::Command(CommandError::Unsupported(_))) {
                return Err(err);
            }
            AdapterHealth::disconnected(account, reason(&err))
        }
    };
    out.write(&health)
}

async fn cmd_accounts<A, W>(
    adapter: &A,
    ctx: &AdapterContext,
    action: AccountsCommand,
    out: &JsonlWriter<W>,
) -> Result<()>
where
    A: Adapter + ?Sized,
    W: Write + Send + 'static,
{
    match action {
        AccountsCommand::List => {
            let accounts = adapter
                .accounts(ctx)
                .await
                .map_err(|e| command_failed("accounts list", e))?;
            out.write(&accounts)
        }
    }
}

async fn cmd_stream<A, W, R>(adapter: &A, ctx: &AdapterContext, out: JsonlWriter<W>, input: R) -> Result<()>
where
    A: Adapter + ?Sized,
    W: Write + Send + 'static,
    R: AsyncRead + Unpin,
{
    let mut handler = adapter
        .stream_handler(ctx)
        .ok_or(CommandError::Unsupported("stream"))?;
    let stream_ctx = StreamContext::new(out, ctx.cancel.clone());

    info!("stream handler starting");
    let report = dispatch(BufReader::new(input), handler.as_mut(), &stream_ctx).await?;
    info!(
        dispatched = report.dispatched,
        skipped = report.skipped,
        handler_errors = report.handler_errors,
        "stream handler stopped cleanly"
    );
    Ok(())
}

/// Folds a handler error into a crate error, keeping SDK errors the handler
/// passed through.
fn command_failed(command: &'static str, err: anyhow::Error) -> Error {
    match err.downcast::<CommandError>() {
        Ok(cmd) => cmd.into(),
        Err(err) => match err.downcast::<Error>() {
            Ok(sdk) => sdk,
            Err(err) => CommandError::ExecutionFailed {
                command,
                reason: format!("{err:#}"),
            }
            .into(),
        },
    }
}

/// Message for a protocol error record.
fn reason(err: &Error) -> String {
    match err {
        Error::Command(CommandError::ExecutionFailed { reason, .. }) => reason.clone(),
        other => other.to_string(),
    }
}
