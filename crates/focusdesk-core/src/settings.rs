//! Client settings and validation.
//!
//! All fields are optional so settings can be assembled from partial sources
//! (environment, `.env`, CLI flags); the `effective_*` accessors supply the
//! defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client name sent in the `initialize` handshake.
pub const DEFAULT_CLIENT_NAME: &str = "focusdesk-mcp-client";

/// Bound on each handshake, discovery and tool-call round trip.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// How long a server gets to exit after its stdin closes before it is killed.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2_000;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

const ENV_CLIENT_NAME: &str = "FOCUSDESK_CLIENT_NAME";
const ENV_CLIENT_VERSION: &str = "FOCUSDESK_CLIENT_VERSION";
const ENV_REQUEST_TIMEOUT: &str = "FOCUSDESK_REQUEST_TIMEOUT_SECS";
const ENV_SHUTDOWN_GRACE: &str = "FOCUSDESK_SHUTDOWN_GRACE_MS";
const ENV_JAVASCRIPT_RUNTIME: &str = "FOCUSDESK_JAVASCRIPT_RUNTIME";
const ENV_PYTHON_RUNTIME: &str = "FOCUSDESK_PYTHON_RUNTIME";
const ENV_PATH_EXTRA: &str = "FOCUSDESK_PATH_EXTRA";

/// Errors from loading or validating settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid settings: {0}")]
    Validation(String),
}

/// Settings for the tool-server client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientSettings {
    /// Client name reported during the handshake.
    pub client_name: Option<String>,

    /// Client version reported during the handshake.
    pub client_version: Option<String>,

    /// Timeout for each request to the server, in seconds (1-600).
    pub request_timeout_secs: Option<u64>,

    /// Grace period between closing stdin and killing the server, in milliseconds.
    pub shutdown_grace_ms: Option<u64>,

    /// Interpreter for `.js`/`.mjs` scripts. Defaults to the current executable.
    pub javascript_runtime: Option<String>,

    /// Interpreter for `.py` scripts. Defaults to `python3` (`python` on Windows).
    pub python_runtime: Option<String>,

    /// Additional PATH entries for the server process.
    pub path_extra: Option<String>,
}

impl ClientSettings {
    /// Create settings with every default filled in.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            client_name: Some(DEFAULT_CLIENT_NAME.to_string()),
            client_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            shutdown_grace_ms: Some(DEFAULT_SHUTDOWN_GRACE_MS),
            javascript_runtime: None,
            python_runtime: None,
            path_extra: None,
        }
    }

    /// Load settings from `FOCUSDESK_*` process environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let settings = Self {
            client_name: get(ENV_CLIENT_NAME),
            client_version: get(ENV_CLIENT_VERSION),
            request_timeout_secs: get(ENV_REQUEST_TIMEOUT)
                .map(|value| parse_u64(ENV_REQUEST_TIMEOUT, &value))
                .transpose()?,
            shutdown_grace_ms: get(ENV_SHUTDOWN_GRACE)
                .map(|value| parse_u64(ENV_SHUTDOWN_GRACE, &value))
                .transpose()?,
            javascript_runtime: get(ENV_JAVASCRIPT_RUNTIME),
            python_runtime: get(ENV_PYTHON_RUNTIME),
            path_extra: get(ENV_PATH_EXTRA),
        };

        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Get the effective client name (with default fallback).
    pub fn effective_client_name(&self) -> &str {
        self.client_name.as_deref().unwrap_or(DEFAULT_CLIENT_NAME)
    }

    /// Get the effective client version (with default fallback).
    pub fn effective_client_version(&self) -> &str {
        self.client_version
            .as_deref()
            .unwrap_or(env!("CARGO_PKG_VERSION"))
    }

    /// Get the effective per-request timeout.
    pub fn effective_request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Get the effective shutdown grace period.
    pub fn effective_shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms.unwrap_or(DEFAULT_SHUTDOWN_GRACE_MS))
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// Validate settings values.
pub fn validate_settings(settings: &ClientSettings) -> Result<(), SettingsError> {
    if let Some(timeout) = settings.request_timeout_secs {
        if timeout == 0 || timeout > MAX_REQUEST_TIMEOUT_SECS {
            return Err(SettingsError::Validation(format!(
                "request_timeout_secs must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}, got {timeout}"
            )));
        }
    }

    if let Some(ref name) = settings.client_name {
        if name.trim().is_empty() {
            return Err(SettingsError::Validation(
                "client_name cannot be empty".to_string(),
            ));
        }
    }

    for (field, runtime) in [
        ("javascript_runtime", &settings.javascript_runtime),
        ("python_runtime", &settings.python_runtime),
    ] {
        if let Some(runtime) = runtime {
            if runtime.trim().is_empty() {
                return Err(SettingsError::Validation(format!(
                    "{field} cannot be empty"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = ClientSettings::default();
        assert_eq!(settings.effective_client_name(), DEFAULT_CLIENT_NAME);
        assert_eq!(
            settings.effective_request_timeout(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert_eq!(
            settings.effective_shutdown_grace(),
            Duration::from_millis(DEFAULT_SHUTDOWN_GRACE_MS)
        );
        assert!(validate_settings(&ClientSettings::with_defaults()).is_ok());
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let settings = ClientSettings::from_lookup(lookup(&[
            ("FOCUSDESK_CLIENT_NAME", "focus-admin"),
            ("FOCUSDESK_REQUEST_TIMEOUT_SECS", " 5 "),
            ("FOCUSDESK_PYTHON_RUNTIME", "/usr/local/bin/python3.12"),
            ("FOCUSDESK_PATH_EXTRA", ""),
        ]))
        .unwrap();

        assert_eq!(settings.effective_client_name(), "focus-admin");
        assert_eq!(settings.effective_request_timeout(), Duration::from_secs(5));
        assert_eq!(
            settings.python_runtime.as_deref(),
            Some("/usr/local/bin/python3.12")
        );
        assert_eq!(settings.path_extra, None);
    }

    #[test]
    fn test_from_lookup_rejects_bad_number() {
        let err = ClientSettings::from_lookup(lookup(&[("FOCUSDESK_SHUTDOWN_GRACE_MS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidValue {
                key: "FOCUSDESK_SHUTDOWN_GRACE_MS".to_string(),
                value: "soon".to_string(),
            }
        );
    }

    #[test]
    fn test_validate_timeout_range() {
        let mut settings = ClientSettings::with_defaults();
        settings.request_timeout_secs = Some(0);
        assert!(validate_settings(&settings).is_err());

        settings.request_timeout_secs = Some(601);
        assert!(validate_settings(&settings).is_err());

        settings.request_timeout_secs = Some(600);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_validate_blank_runtime() {
        let settings = ClientSettings {
            javascript_runtime: Some("  ".to_string()),
            ..ClientSettings::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::Validation(msg)) if msg.contains("javascript_runtime")
        ));
    }
}
