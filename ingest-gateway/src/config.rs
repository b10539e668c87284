use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Registry auth token cannot be empty")]
    EmptyRegistryToken,

    #[error("Analytics token cannot be empty")]
    EmptyAnalyticsToken,
}

/// Gateway configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for incoming telemetry batches
    pub listener: Listener,
    /// Per-record delivery target for the legacy path
    pub ingest: IngestConfig,
    /// System-of-record lookup for the v1 path
    pub registry: RegistryConfig,
    /// Batch ingestion backend for the v1 path
    pub analytics: AnalyticsConfig,
}

impl Config {
    /// Validates the gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;

        if self.registry.auth_token.is_empty() {
            return Err(ValidationError::EmptyRegistryToken);
        }

        if self.analytics.token.is_empty() {
            return Err(ValidationError::EmptyAnalyticsToken);
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Legacy ingestion endpoint configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct IngestConfig {
    /// URL each enriched record is posted to, one call per record
    ///
    /// Note: Uses the `url::Url` type so invalid URLs are rejected during
    /// config deserialization.
    pub endpoint: Url,
}

/// System-of-record configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RegistryConfig {
    /// Base URL of the application registry API
    pub url: Url,
    /// Bearer token presented on lookups
    pub auth_token: String,
}

/// Analytics backend configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AnalyticsConfig {
    /// Batch ingestion URL (one call per v1 batch)
    pub url: Url,
    /// Bearer token presented on ingestion calls
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_yaml() -> &'static str {
        r#"
listener:
    host: "0.0.0.0"
    port: 3000
ingest:
    endpoint: "https://ingest.example.com/webvitals"
registry:
    url: "https://registry.example.com"
    auth_token: "registry-token"
analytics:
    url: "https://analytics.example.com/v0/events"
    token: "analytics-token"
"#
    }

    #[test]
    fn test_parse_valid_config() {
        let config: Config = serde_yaml::from_str(base_yaml()).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.ingest.endpoint.host_str(), Some("ingest.example.com"));
        assert_eq!(config.registry.auth_token, "registry-token");
        assert_eq!(config.analytics.token, "analytics-token");
    }

    #[test]
    fn test_validation_errors() {
        let base: Config = serde_yaml::from_str(base_yaml()).unwrap();

        let mut config = base.clone();
        config.listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));

        let mut config = base.clone();
        config.registry.auth_token = String::new();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyRegistryToken
        ));

        let mut config = base;
        config.analytics.token = String::new();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyAnalyticsToken
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid URL
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0", port: 3000}
ingest: {endpoint: "not-a-url"}
registry: {url: "https://registry.example.com", auth_token: "t"}
analytics: {url: "https://analytics.example.com", token: "t"}
"#
            )
            .is_err()
        );

        // Invalid port type
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0", port: "not_a_number"}
"#
            )
            .is_err()
        );

        // Missing required section
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0", port: 3000}
"#
            )
            .is_err()
        );
    }
}
