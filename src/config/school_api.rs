//! School fee API configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// School fee-status API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchoolApiConfig {
    /// API root, e.g. `https://school.example/api`
    pub base_url: String,

    /// Bearer token
    pub api_key: Option<SecretString>,

    /// Per-lookup timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl SchoolApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed base URL
    pub fn url(&self) -> Result<reqwest::Url, ValidationError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|_| ValidationError::InvalidBaseUrl)?;
        match url.scheme() {
            "http" | "https" if !url.cannot_be_a_base() => Ok(url),
            _ => Err(ValidationError::InvalidBaseUrl),
        }
    }

    /// The API key, empty when not configured
    pub fn api_key(&self) -> &str {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .unwrap_or_default()
    }

    /// Validate school API configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("school_api.base_url"));
        }
        let url = self.url()?;
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("school_api.timeout_secs"));
        }
        if *environment == Environment::Production {
            if url.scheme() != "https" {
                return Err(ValidationError::BaseUrlMustBeHttps);
            }
            if self.api_key().is_empty() {
                return Err(ValidationError::MissingApiKey);
            }
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    6
}
