//! HTTP fee-status client.
//!
//! Implements `FeeStatusClient` against the school API:
//!
//! ```text
//! GET {base_url}/students/{subject_id}/fees
//! Authorization: Bearer {api_key}
//! ```
//!
//! A 200 response is decoded as a fee status. Anything else is a failure:
//! non-success statuses map to `FeeLookupError::Api`, network problems and
//! the client timeout to the transport variants, and an unreadable 200 body
//! to `FeeLookupError::InvalidBody`. There are no retries.
//!
//! # Configuration
//!
//! ```ignore
//! let config = SchoolApiClientConfig::new(base_url).with_api_key(key);
//! let client = HttpFeeStatusClient::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::domain::attendance::{FeeLookupError, FeeStatus, UNKNOWN_NAME};
use crate::ports::FeeStatusClient;

/// Configuration for the school API client.
#[derive(Clone)]
pub struct SchoolApiClientConfig {
    /// Root of the school API, e.g. `https://school.example/api`.
    pub base_url: Url,
    /// Bearer token. Omitted from requests when not set.
    api_key: Option<Secret<String>>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SchoolApiClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            timeout: Duration::from_secs(6),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then(|| Secret::new(api_key));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }
}

impl std::fmt::Debug for SchoolApiClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchoolApiClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Success body of the fee endpoint. Only `paid` is mandatory.
#[derive(Debug, Deserialize)]
struct FeeStatusBody {
    paid: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    photo_url: Option<String>,
}

impl FeeStatusBody {
    fn into_status(self, subject_id: &str) -> FeeStatus {
        let display_name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        // Unusable photo references are dropped rather than failing the lookup.
        let photo_ref = self.photo_url.filter(|raw| match Url::parse(raw) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(subject_id, photo_url = %raw, error = %e, "Ignoring invalid photo_url");
                false
            }
        });

        FeeStatus {
            subject_id: subject_id.to_string(),
            paid: self.paid,
            details: self.details.unwrap_or_default(),
            display_name,
            amount: self.amount,
            photo_ref,
        }
    }
}

/// reqwest-backed fee-status client.
pub struct HttpFeeStatusClient {
    config: SchoolApiClientConfig,
    client: Client,
}

impl HttpFeeStatusClient {
    /// Builds the client. Fails only if the TLS backend cannot initialize.
    pub fn new(config: SchoolApiClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// `{base_url}/students/{subject_id}/fees`, with the id percent-encoded
    /// as a single path segment.
    fn fees_url(&self, subject_id: &str) -> Result<Url, FeeLookupError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FeeLookupError::Transport(format!(
                    "base url cannot carry a path: {}",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .push("students")
            .push(subject_id)
            .push("fees");
        Ok(url)
    }

    fn map_send_error(&self, e: reqwest::Error) -> FeeLookupError {
        if e.is_timeout() {
            FeeLookupError::Timeout(self.config.timeout)
        } else if e.is_connect() {
            FeeLookupError::Transport(format!("Connection failed: {}", e))
        } else {
            FeeLookupError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl FeeStatusClient for HttpFeeStatusClient {
    async fn query_status(&self, subject_id: &str) -> Result<FeeStatus, FeeLookupError> {
        let url = self.fees_url(subject_id)?;

        let mut request = self.client.get(url);
        if let Some(key) = self.config.api_key() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeeLookupError::Api {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        let parsed: FeeStatusBody = serde_json::from_slice(&body)
            .map_err(|e| FeeLookupError::InvalidBody(e.to_string()))?;

        Ok(parsed.into_status(subject_id))
    }
}
