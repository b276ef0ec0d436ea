//! Runtime context injected by the coordinating runtime.
//!
//! The runtime writes a short-lived JSON file holding the adapter's channel,
//! account, free-form configuration and resolved credential, and passes its
//! path in `$NEXUS_ADAPTER_CONTEXT_PATH`.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// Environment variable naming the runtime context file.
pub const CONTEXT_PATH_ENV: &str = "NEXUS_ADAPTER_CONTEXT_PATH";

/// Credential kind assumed when the context omits one.
const DEFAULT_CREDENTIAL_KIND: &str = "token";

/// Configuration and credential handed to an adapter at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeContext {
    /// Context format version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Channel the adapter serves.
    #[serde(default)]
    pub channel: String,
    /// Account the adapter acts for.
    #[serde(default)]
    pub account_id: String,
    /// Free-form adapter configuration.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub config: Map<String, Value>,
    /// Resolved credential, absent in unauthenticated mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<RuntimeCredential>,
}

/// A resolved plaintext secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeCredential {
    /// `token`, `oauth`, ...
    #[serde(default)]
    pub kind: String,
    /// Secret value.
    #[serde(default)]
    pub value: String,
    /// Credential store reference.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Credential store service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Credential store account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl fmt::Debug for RuntimeCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeCredential")
            .field("kind", &self.kind)
            .field("value", &"[REDACTED]")
            .field("reference", &self.reference)
            .field("service", &self.service)
            .field("account", &self.account)
            .finish()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

impl RuntimeContext {
    /// Loads the context named by `$NEXUS_ADAPTER_CONTEXT_PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingContext`] if the variable is unset or
    /// empty, otherwise any error from [`RuntimeContext::load_from_file`].
    pub fn load_from_env() -> Result<Self> {
        match std::env::var_os(CONTEXT_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::load_from_file(path),
            _ => Err(ConfigError::MissingContext {
                var: CONTEXT_PATH_ENV,
            }
            .into()),
        }
    }

    /// Loads the context if `$NEXUS_ADAPTER_CONTEXT_PATH` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is set but the file is unusable.
    pub fn load_optional() -> Result<Option<Self>> {
        match Self::load_from_env() {
            Ok(ctx) => Ok(Some(ctx)),
            Err(crate::Error::Config(ConfigError::MissingContext { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Reads, parses and validates a context file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadFailed`] or [`ConfigError::Parse`] for an
    /// unreadable file and [`ConfigError::MissingField`] for a context
    /// without channel, account or credential value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&raw)
    }

    /// Parses and validates context JSON.
    ///
    /// # Errors
    ///
    /// See [`RuntimeContext::load_from_file`].
    pub fn parse(raw: &str) -> Result<Self> {
        let mut ctx: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if ctx.channel.is_empty() {
            return Err(ConfigError::MissingField { field: "channel" }.into());
        }
        if ctx.account_id.is_empty() {
            return Err(ConfigError::MissingField {
                field: "account_id",
            }
            .into());
        }
        if let Some(credential) = ctx.credential.as_mut() {
            if credential.value.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "credential value",
                }
                .into());
            }
            if credential.kind.is_empty() {
                DEFAULT_CREDENTIAL_KIND.clone_into(&mut credential.kind);
            }
        }
        Ok(ctx)
    }

    /// String value of a config key.
    #[must_use]
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    /// Unsigned integer value of a config key.
    #[must_use]
    pub fn config_u64(&self, key: &str) -> Option<u64> {
        self.config.get(key).and_then(Value::as_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use test_case::test_case;

    fn context_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_context() {
        let file = context_file(
            r#"{"version":1,"channel":"gmail","account_id":"work",
                "config":{"inbox":"/tmp/in","text_limit":500},
                "credential":{"kind":"oauth","value":"s3cret","ref":"google/work"}}"#,
        );
        let ctx = RuntimeContext::load_from_file(file.path()).unwrap();
        assert_eq!(ctx.version, Some(1));
        assert_eq!(ctx.channel, "gmail");
        assert_eq!(ctx.account_id, "work");
        assert_eq!(ctx.config_str("inbox"), Some("/tmp/in"));
        assert_eq!(ctx.config_u64("text_limit"), Some(500));
        let credential = ctx.credential.unwrap();
        assert_eq!(credential.kind, "oauth");
        assert_eq!(credential.reference.as_deref(), Some("google/work"));
    }

    #[test]
    fn test_config_defaults_to_empty() {
        let ctx = RuntimeContext::parse(r#"{"channel":"c","account_id":"a"}"#).unwrap();
        assert!(ctx.config.is_empty());
        assert!(ctx.credential.is_none());
        assert!(ctx.config_str("missing").is_none());
    }

    #[test]
    fn test_config_null_becomes_empty() {
        let ctx =
            RuntimeContext::parse(r#"{"channel":"c","account_id":"a","config":null}"#).unwrap();
        assert!(ctx.config.is_empty());
    }

    #[test]
    fn test_credential_kind_defaults_to_token() {
        let ctx = RuntimeContext::parse(
            r#"{"channel":"c","account_id":"a","credential":{"value":"v"}}"#,
        )
        .unwrap();
        assert_eq!(ctx.credential.unwrap().kind, "token");
    }

    #[test_case(r#"{"account_id":"a"}"#, "channel" ; "missing channel")]
    #[test_case(r#"{"channel":"","account_id":"a"}"#, "channel" ; "empty channel")]
    #[test_case(r#"{"channel":"c"}"#, "account_id" ; "missing account")]
    #[test_case(r#"{"channel":"c","account_id":"a","credential":{"kind":"token"}}"#, "credential value" ; "credential without value")]
    fn test_missing_fields(json: &str, expected: &str) {
        match RuntimeContext::parse(json) {
            Err(crate::Error::Config(ConfigError::MissingField { field })) => {
                assert_eq!(field, expected);
            }
            other => panic!("expected missing {expected}, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json() {
        let err = RuntimeContext::parse("{not json").unwrap_err();
        assert!(err.to_string().contains("parse runtime context json"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RuntimeContext::load_from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_credential_debug_redacts_value() {
        let credential = RuntimeCredential {
            kind: "token".to_string(),
            value: "hunter2".to_string(),
            reference: None,
            service: None,
            account: None,
        };
        let debug = format!("{credential:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
