//! CLI bootstrap - the composition root.
//!
//! Settings are read from `FOCUSDESK_*` variables (after `.env` is loaded
//! by `main`) and flag overrides are applied last.

use focusdesk_core::{ClientSettings, validate_settings};
use focusdesk_mcp::ToolServerClient;

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Client settings handed to the tool-server client.
    pub settings: ClientSettings,
}

impl CliConfig {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, CliError> {
        Ok(Self {
            settings: ClientSettings::from_env()?,
        })
    }

    /// Apply the `--timeout` flag on top of the loaded settings.
    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Result<Self, CliError> {
        if let Some(secs) = timeout_secs {
            self.settings.request_timeout_secs = Some(secs);
            validate_settings(&self.settings)?;
        }
        Ok(self)
    }
}

/// Everything a command handler needs.
pub struct CliContext {
    pub client: ToolServerClient,
}

/// Wire the tool-server client from configuration.
pub fn bootstrap(config: CliConfig) -> CliContext {
    tracing::debug!(settings = ?config.settings, "Bootstrapping CLI context");
    CliContext {
        client: ToolServerClient::new(config.settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_override_applies() {
        let config = CliConfig::default().with_timeout(Some(5)).unwrap();
        assert_eq!(config.settings.request_timeout_secs, Some(5));
    }

    #[test]
    fn test_no_override_keeps_settings() {
        let base = CliConfig {
            settings: ClientSettings {
                request_timeout_secs: Some(12),
                ..ClientSettings::default()
            },
        };
        let config = base.with_timeout(None).unwrap();
        assert_eq!(config.settings.request_timeout_secs, Some(12));
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let err = CliConfig::default().with_timeout(Some(0)).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_bootstrap_starts_disconnected() {
        let ctx = bootstrap(CliConfig::default());
        assert_eq!(
            ctx.client.state(),
            focusdesk_core::ConnectionState::Disconnected
        );
        assert!(ctx.client.get_tools().is_empty());
    }
}
