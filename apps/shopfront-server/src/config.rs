//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! Store-level settings (theme, currency, footer...) live in the database, not here.

use serde::{Deserialize, Serialize};
use std::env;

/// PayPal sandbox REST endpoint.
pub const PAYPAL_SANDBOX_BASE: &str = "https://api-m.sandbox.paypal.com";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite database file
    pub db_path: String,

    /// Upper bound of the SQLite pool
    pub db_max_connections: u32,

    /// PayPal REST base URL (sandbox or live)
    pub paypal_api_base: String,

    /// PayPal REST app client id
    pub paypal_client_id: String,

    /// PayPal REST app secret
    #[serde(skip_serializing)]
    pub paypal_client_secret: String,

    /// Public URL of the storefront, used for the provider's return/cancel links
    pub public_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            port: env::var("SHOPFRONT_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SHOPFRONT_PORT".to_string()))?,

            db_path: env::var("SHOPFRONT_DB_PATH").unwrap_or_else(|_| "./shopfront.db".to_string()),

            db_max_connections: env::var("SHOPFRONT_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SHOPFRONT_DB_MAX_CONNECTIONS".to_string()))?,

            paypal_api_base: env::var("PAYPAL_API_BASE")
                .unwrap_or_else(|_| PAYPAL_SANDBOX_BASE.to_string()),

            paypal_client_id: env::var("PAYPAL_CLIENT_ID").unwrap_or_default(),

            paypal_client_secret: env::var("PAYPAL_CLIENT_SECRET").unwrap_or_default(),

            public_url: env::var("SHOPFRONT_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "SHOPFRONT_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if !is_http_url(&self.paypal_api_base) {
            return Err(ConfigError::InvalidValue("PAYPAL_API_BASE".to_string()));
        }
        if !is_http_url(&self.public_url) {
            return Err(ConfigError::InvalidValue("SHOPFRONT_PUBLIC_URL".to_string()));
        }
        Ok(())
    }

    /// Whether PayPal credentials were provided.
    pub fn paypal_configured(&self) -> bool {
        !self.paypal_client_id.is_empty() && !self.paypal_client_secret.is_empty()
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 3000,
            db_path: "./shopfront.db".to_string(),
            db_max_connections: 5,
            paypal_api_base: PAYPAL_SANDBOX_BASE.to_string(),
            paypal_client_id: String::new(),
            paypal_client_secret: String::new(),
            public_url: "http://localhost:3000".to_string(),
        }
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.paypal_configured());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_rejects_bad_urls_and_pool_size() {
        let mut config = ServerConfig {
            public_url: "localhost:3000".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(key)) if key == "SHOPFRONT_PUBLIC_URL"
        ));

        config.public_url = "http://localhost:3000".to_string();
        config.db_max_connections = 0;
        assert!(config.validate().is_err());
    }
}
