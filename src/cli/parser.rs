//! Command-line argument parsing.
//!
//! Defines the adapter protocol's CLI using clap derive macros. Every
//! adapter binary built on this crate accepts the same commands.

use crate::cli::output::OutputFormat;
use crate::error::{CommandError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};

/// A Nexus channel adapter.
///
/// Speaks the adapter protocol: JSONL records on stdout, logs on stderr.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true, env = "NEXUS_ADAPTER_VERBOSE")]
    pub verbose: bool,

    /// Fail unless a runtime context is provided via
    /// `$NEXUS_ADAPTER_CONTEXT_PATH`.
    #[arg(long, global = true)]
    pub require_context: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Adapter protocol commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Self-describe this adapter.
    Info,

    /// Stream live events as JSONL until interrupted.
    Monitor {
        /// Account ID.
        #[arg(long)]
        account: Option<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
        format: OutputFormat,
    },

    /// Deliver a message.
    Send {
        /// Account ID.
        #[arg(long)]
        account: Option<String>,

        /// Target (email, phone, channel:id).
        #[arg(long)]
        to: String,

        /// Message text.
        #[arg(long, default_value = "")]
        text: String,

        /// Media file path.
        #[arg(long)]
        media: Option<String>,

        /// Media caption.
        #[arg(long)]
        caption: Option<String>,

        /// Event ID to reply to.
        #[arg(long)]
        reply_to: Option<String>,

        /// Thread ID.
        #[arg(long)]
        thread: Option<String>,
    },

    /// Emit historical events as JSONL, then exit.
    Backfill {
        /// Account ID.
        #[arg(long)]
        account: Option<String>,

        /// Start date (RFC 3339, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`).
        #[arg(long, value_parser = parse_date)]
        since: DateTime<Utc>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
        format: OutputFormat,
    },

    /// Check connection status.
    Health {
        /// Account ID.
        #[arg(long)]
        account: Option<String>,
    },

    /// Manage configured accounts.
    Accounts {
        /// Accounts action (defaults to `list`).
        #[command(subcommand)]
        action: Option<AccountsCommand>,
    },

    /// Streaming delivery: read stream events on stdin, report status on
    /// stdout.
    Stream {
        /// Account ID.
        #[arg(long)]
        account: Option<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
        format: OutputFormat,
    },
}

/// `accounts` subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountsCommand {
    /// List configured accounts.
    #[command(alias = "ls")]
    List,
}

/// Parses a `--since` date.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) and `YYYY-MM-DD`
/// (midnight UTC).
///
/// # Errors
///
/// Returns [`CommandError::InvalidArgument`] for an empty or unrecognized
/// date.
///
/// # Examples
///
/// ```
/// use nexus_adapter::cli::parse_date;
///
/// let day = parse_date("2024-03-01").unwrap();
/// assert_eq!(day.to_rfc3339(), "2024-03-01T00:00:00+00:00");
/// ```
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    if value.is_empty() {
        return Err(CommandError::InvalidArgument("date is required".to_string()).into());
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(at.and_utc());
    }
    if let Some(at) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
    {
        return Ok(at.and_utc());
    }
    Err(CommandError::InvalidArgument(format!(
        "unrecognized date {value:?} (expected ISO 8601 or YYYY-MM-DD)"
    ))
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use test_case::test_case;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test_case("2024-03-01T10:20:30Z", "2024-03-01T10:20:30+00:00" ; "rfc3339 utc")]
    #[test_case("2024-03-01T10:20:30+02:00", "2024-03-01T08:20:30+00:00" ; "rfc3339 offset")]
    #[test_case("2024-03-01T10:20:30", "2024-03-01T10:20:30+00:00" ; "naive datetime")]
    #[test_case("2024-03-01", "2024-03-01T00:00:00+00:00" ; "date only")]
    fn test_parse_date_formats(input: &str, expected: &str) {
        assert_eq!(parse_date(input).unwrap().to_rfc3339(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("yesterday" ; "words")]
    #[test_case("03/01/2024" ; "us format")]
    #[test_case("2024-13-01" ; "bad month")]
    fn test_parse_date_rejects(input: &str) {
        assert!(matches!(
            parse_date(input),
            Err(crate::Error::Command(CommandError::InvalidArgument(_)))
        ));
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from([
            "adapter", "send", "--account", "work", "--to", "+1555", "--text", "hi", "--reply-to",
            "ev-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Send {
                account,
                to,
                text,
                reply_to,
                thread,
                ..
            } => {
                assert_eq!(account.as_deref(), Some("work"));
                assert_eq!(to, "+1555");
                assert_eq!(text, "hi");
                assert_eq!(reply_to.as_deref(), Some("ev-1"));
                assert!(thread.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["adapter", "monitor", "--account", "a", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.require_context);
    }

    #[test]
    fn test_accounts_defaults_to_list() {
        let cli = Cli::try_parse_from(["adapter", "accounts"]).unwrap();
        assert!(matches!(cli.command, Commands::Accounts { action: None }));
        let cli = Cli::try_parse_from(["adapter", "accounts", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Accounts {
                action: Some(AccountsCommand::List)
            }
        ));
    }

    #[test]
    fn test_backfill_rejects_bad_date() {
        assert!(Cli::try_parse_from(["adapter", "backfill", "--since", "soon"]).is_err());
        let cli = Cli::try_parse_from(["adapter", "backfill", "--since", "2024-01-02"]).unwrap();
        assert!(matches!(cli.command, Commands::Backfill { .. }));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["adapter", "explode"]).is_err());
    }
}
