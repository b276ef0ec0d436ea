//! Adapter runner.
//!
//! Provides the command-line interface every adapter binary shares: clap
//! parsing, logging setup, runtime-context loading, signal-driven
//! cancellation and routing to the [`Adapter`] handlers.

pub mod adapter;
pub mod commands;
pub mod output;
pub mod parser;

pub use adapter::{Adapter, AdapterContext};
pub use commands::execute;
pub use output::{EventEmitter, EventSink, OutputFormat};
pub use parser::{AccountsCommand, Cli, Commands, parse_date};

use crate::config::{CONTEXT_PATH_ENV, RuntimeContext};
use crate::error::{ConfigError, Result};
use crate::io::JsonlWriter;
use crate::logging::{self, Verbosity};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How long shutdown waits for a blocked stdin read.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Runs `adapter` as the current process's command.
///
/// Call this from `main`. Protocol records go to stdout, logs to stderr.
/// Returns exit code 0 on success and 1 on any error.
///
/// ```no_run
/// use nexus_adapter::cli::{Adapter, run};
/// use nexus_adapter::protocol::{AdapterInfo, ChannelCapabilities};
///
/// struct Echo;
///
/// impl Adapter for Echo {
///     fn info(&self) -> AdapterInfo {
///         AdapterInfo {
///             channel: "echo".into(),
///             name: "Echo".into(),
///             version: "0.1.0".into(),
///             supports: Vec::new(),
///             credential_service: None,
///             multi_account: false,
///             channel_capabilities: ChannelCapabilities::default(),
///         }
///     }
/// }
///
/// fn main() -> std::process::ExitCode {
///     run(Echo)
/// }
/// ```
pub fn run<A: Adapter>(adapter: A) -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let _guard =
        tracing::subscriber::set_default(logging::subscriber(Verbosity::from_flag(cli.verbose)));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async {
        let ctx = AdapterContext::new(load_context(cli.require_context)?, CancellationToken::new());
        tokio::spawn(cancel_on_signal(ctx.cancel.clone()));
        execute(&adapter, &cli, &ctx, JsonlWriter::stdout(), tokio::io::stdin()).await
    });
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

/// Loads the runtime context, failing on its absence when `required`.
fn load_context(required: bool) -> Result<Option<RuntimeContext>> {
    let ctx = RuntimeContext::load_optional()?;
    match &ctx {
        Some(rc) => info!(channel = %rc.channel, account = %rc.account_id, "runtime context loaded"),
        None if required => {
            return Err(ConfigError::MissingContext {
                var: CONTEXT_PATH_ENV,
            }
            .into());
        }
        None => {}
    }
    Ok(ctx)
}

/// Cancels `cancel` on SIGINT or SIGTERM.
async fn cancel_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
    cancel.cancel();
}
