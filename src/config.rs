//! Startup configuration.
//!
//! All process-wide state is gathered here once, at construction time, and
//! is immutable afterwards. A missing or unusable `STORYBOOK_URL` is fatal
//! and must fail before any network or browser activity; a bad
//! `CUSTOM_TOOLS` value degrades to zero custom tools instead.

use url::Url;

use crate::custom::{self, CustomToolDefinition};
use crate::error::{Error, Result};

/// Environment variable carrying the Storybook index URL.
pub const STORYBOOK_URL_VAR: &str = "STORYBOOK_URL";

/// Environment variable carrying the custom tool definitions.
pub const CUSTOM_TOOLS_VAR: &str = "CUSTOM_TOOLS";

/// Immutable server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Absolute URL of the Storybook index document.
    pub storybook_url: Url,
    /// Valid operator-supplied custom tools, in configuration order.
    pub custom_tools: Vec<CustomToolDefinition>,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let storybook_url = std::env::var(STORYBOOK_URL_VAR).ok();
        let custom_tools = std::env::var(CUSTOM_TOOLS_VAR).ok();
        Self::from_values(storybook_url.as_deref(), custom_tools.as_deref())
    }

    /// Build configuration from raw values.
    ///
    /// Kept separate from [`Self::from_env`] so construction-time validation
    /// can be tested without touching the process environment.
    pub fn from_values(storybook_url: Option<&str>, custom_tools: Option<&str>) -> Result<Self> {
        let raw = storybook_url
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{STORYBOOK_URL_VAR} environment variable is required"))
            })?;

        let storybook_url = Url::parse(raw).map_err(|e| {
            Error::Config(format!("{STORYBOOK_URL_VAR} is not an absolute URL ({raw}): {e}"))
        })?;

        Ok(Self {
            storybook_url,
            custom_tools: custom::load(custom_tools),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_storybook_url_is_fatal() {
        let err = ServerConfig::from_values(None, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("STORYBOOK_URL"));
    }

    #[test]
    fn empty_storybook_url_is_fatal() {
        assert!(ServerConfig::from_values(Some(""), None).is_err());
        assert!(ServerConfig::from_values(Some("   "), None).is_err());
    }

    #[test]
    fn relative_storybook_url_is_fatal() {
        assert!(ServerConfig::from_values(Some("storybook/index.json"), None).is_err());
    }

    #[test]
    fn valid_url_constructs() {
        let config =
            ServerConfig::from_values(Some("http://localhost:6006/index.json"), None).unwrap();
        assert_eq!(config.storybook_url.as_str(), "http://localhost:6006/index.json");
        assert!(config.custom_tools.is_empty());
    }

    #[test]
    fn malformed_custom_tools_never_blocks_startup() {
        let config = ServerConfig::from_values(
            Some("http://localhost:6006/index.json"),
            Some("invalid json"),
        )
        .unwrap();
        assert!(config.custom_tools.is_empty());
    }
}
