//! Structured logging setup using `tracing-subscriber`.
//!
//! All logs go to stderr; stdout is reserved for protocol records. The
//! filter is `info` by default, `debug` when verbose, and `RUST_LOG`
//! overrides both.

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

/// Log detail level chosen on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Info and above.
    #[default]
    Normal,
    /// Debug and above.
    Verbose,
}

impl Verbosity {
    /// Maps the `--verbose` flag.
    #[must_use]
    pub const fn from_flag(verbose: bool) -> Self {
        if verbose { Self::Verbose } else { Self::Normal }
    }

    /// Default filter directive for this level.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }
}

/// Builds a stderr subscriber for `verbosity`.
///
/// The caller decides whether to install it globally or as a scoped default
/// with [`tracing::subscriber::set_default`].
#[must_use]
pub fn subscriber(verbosity: Verbosity) -> impl Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish()
}
