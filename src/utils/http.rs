//! HTTP client utilities.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Longest upstream error body kept in an [`SourceError::Http`] message
const MAX_ERROR_BODY: usize = 512;

/// Shared HTTP client with a bounded per-request timeout
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent and timeouts
    pub fn new() -> Result<Self, SourceError> {
        Self::with_config(&HttpConfig::default(), default_user_agent())
    }

    /// Create a client from configuration with a custom user agent
    pub fn with_config(config: &HttpConfig, user_agent: &str) -> Result<Self, SourceError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            timeout,
        })
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The timeout applied to every request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// User agent sent when none is configured
pub fn default_user_agent() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
}

/// Send a request and return the status and raw body without judging the status.
pub async fn fetch_text(request: RequestBuilder) -> Result<(StatusCode, String), SourceError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    Ok((status, body))
}

/// Send a request and decode a JSON body.
///
/// Non-2xx statuses become [`SourceError::Http`], bodies that do not match `T`
/// become [`SourceError::Shape`].
pub async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SourceError> {
    let (status, body) = fetch_text(request).await?;

    if !status.is_success() {
        return Err(SourceError::Http {
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| SourceError::Shape(e.to_string()))
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let cut: String = body.chars().take(MAX_ERROR_BODY).collect();
    format!("{}...", cut)
}
