//! Configuration types for the Phantom Banking SDK.
//!
//! This module provides the configuration used to initialize the SDK for API
//! communication with the Phantom Banking backend.
//!
//! # Overview
//!
//! - [`ClientConfig`]: The main configuration struct holding all SDK settings
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`BaseUrl`]: A validated API base URL
//!
//! # Example
//!
//! ```rust
//! use phantom_banking::{BaseUrl, ClientConfig};
//! use std::time::Duration;
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com/api/v1").unwrap())
//!     .timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.base_url().as_ref(), "https://api.example.com/api/v1");
//! ```

mod newtypes;

pub use newtypes::BaseUrl;

use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for the Phantom Banking SDK.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: BaseUrl,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the per-request timeout, if configured.
    ///
    /// When unset, the transport default applies.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// `base_url` is required. Everything else is optional.
///
/// # Defaults
///
/// - `user_agent_prefix`: `None`
/// - `timeout`: `None` (transport default)
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<BaseUrl>,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL (required).
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the [`ClientConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `base_url` is not set,
    /// or [`ConfigError::InvalidUserAgentPrefix`] if the prefix cannot be
    /// sent as a header value.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or(ConfigError::MissingRequiredField { field: "base_url" })?;

        if let Some(prefix) = &self.user_agent_prefix {
            if !prefix.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
                return Err(ConfigError::InvalidUserAgentPrefix {
                    prefix: prefix.clone(),
                });
            }
        }

        Ok(ClientConfig {
            base_url,
            user_agent_prefix: self.user_agent_prefix,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let result = ClientConfigBuilder::new().build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "base_url" })
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = ClientConfig::builder()
            .base_url(BaseUrl::local_default())
            .build()
            .unwrap();

        assert_eq!(config.base_url().as_ref(), BaseUrl::LOCAL_DEFAULT);
        assert!(config.user_agent_prefix().is_none());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_builder_with_all_optional_fields() {
        let config = ClientConfig::builder()
            .base_url(BaseUrl::new("https://bank.example.com/api/v1").unwrap())
            .user_agent_prefix("MerchantPortal/2.1")
            .timeout(Duration::from_millis(1500))
            .build()
            .unwrap();

        assert_eq!(config.user_agent_prefix(), Some("MerchantPortal/2.1"));
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_builder_rejects_control_characters_in_prefix() {
        let result = ClientConfig::builder()
            .base_url(BaseUrl::local_default())
            .user_agent_prefix("bad\nprefix")
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidUserAgentPrefix { .. })
        ));
    }

    #[test]
    fn test_config_is_clone_and_debug() {
        let config = ClientConfig::builder()
            .base_url(BaseUrl::local_default())
            .build()
            .unwrap();

        let cloned = config.clone();
        assert_eq!(cloned.base_url(), config.base_url());

        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("ClientConfig"));
    }
}
