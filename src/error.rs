//! Error types for adapter SDK operations.
//!
//! This module provides the error hierarchy using `thiserror` for the
//! chunking engine, the poll monitor, the stream dispatcher, runtime-context
//! loading and the command runner. Code supplied by adapter authors (fetch
//! functions, senders, stream handlers) reports failures as [`anyhow::Error`]
//! and the SDK folds those into protocol records.

use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for SDK operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Chunking-related errors (text segmentation).
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Poll monitor errors.
    #[error("monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// Stream dispatcher errors.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Runtime context / configuration errors.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// I/O errors on the protocol streams.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors on the protocol streams.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Chunking-specific errors.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Unknown chunking strategy.
    #[error("unknown chunking strategy: {name}")]
    UnknownStrategy {
        /// Name of the unknown strategy.
        name: String,
    },
}

/// Poll monitor errors.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The poll interval must be positive.
    #[error("invalid poll interval: {reason}")]
    InvalidInterval {
        /// Why the interval was rejected.
        reason: String,
    },

    /// The consecutive-error ceiling was reached.
    #[error("too many consecutive errors ({count}): {last}")]
    TooManyErrors {
        /// Number of consecutive failed fetches.
        count: u32,
        /// Message of the last fetch failure.
        last: String,
    },
}

/// Stream dispatcher errors.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Reading the input stream failed.
    #[error("stdin read error: {0}")]
    Read(String),
}

/// Runtime context errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The runtime context environment variable is not set.
    #[error("missing runtime context (expected ${var})")]
    MissingContext {
        /// Name of the environment variable.
        var: &'static str,
    },

    /// The runtime context file could not be read.
    #[error("read runtime context: {path}: {reason}")]
    ReadFailed {
        /// Path to the context file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// The runtime context file is not valid JSON.
    #[error("parse runtime context json: {0}")]
    Parse(String),

    /// A required field is missing or empty.
    #[error("runtime context missing {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The adapter does not implement the requested command.
    #[error("{0} not supported by this adapter")]
    Unsupported(&'static str),

    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("{command}: {reason}")]
    ExecutionFailed {
        /// Command that failed.
        command: &'static str,
        /// Reason for failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: Error = MonitorError::TooManyErrors {
            count: 3,
            last: "timeout".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "monitor error: too many consecutive errors (3): timeout"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingContext {
            var: "NEXUS_ADAPTER_CONTEXT_PATH",
        };
        assert_eq!(
            err.to_string(),
            "missing runtime context (expected $NEXUS_ADAPTER_CONTEXT_PATH)"
        );

        let err = ConfigError::MissingField { field: "channel" };
        assert_eq!(err.to_string(), "runtime context missing channel");
    }

    #[test]
    fn test_command_error_display() {
        let err = CommandError::Unsupported("monitor");
        assert_eq!(err.to_string(), "monitor not supported by this adapter");

        let err = CommandError::ExecutionFailed {
            command: "backfill",
            reason: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "backfill: boom");
    }

    #[test]
    fn test_chunking_error_display() {
        let err = ChunkingError::UnknownStrategy {
            name: "foobar".to_string(),
        };
        assert!(err.to_string().contains("foobar"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<i32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_error_from_stream() {
        let err: Error = StreamError::Read("eof".to_string()).into();
        assert!(matches!(err, Error::Stream(_)));
        assert!(err.to_string().contains("stdin read error"));
    }
}
