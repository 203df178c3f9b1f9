//! Upstream provider adapters.
//!
//! Two providers are supported:
//!
//! - [`HiAnimeSource`]: community HiAnime REST API (scraped data, no auth)
//! - [`MalSource`]: official MyAnimeList v2 API, authenticated per call with a
//!   client id or a bearer token supplied by the caller
//!
//! [`mal_auth`] holds the stateless OAuth2 PKCE helpers for MAL.
//!
//! Both adapters implement [`AnimeSearch`], the seam used by the combined
//! search to fan out to each provider independently.

mod combined;
mod hianime;
mod mal;
pub mod mal_auth;
pub mod mock;
mod registry;

pub use combined::{combined_search, AggregateError};
pub use hianime::HiAnimeSource;
pub use mal::{MalCredentials, MalSearch, MalSource};
pub use mock::MockSource;
pub use registry::{SetupError, SourceRegistry};

use async_trait::async_trait;

use crate::models::{AnimeSummary, ErrorDescriptor, ErrorKind, Provider};

/// Keyword search against a single provider.
///
/// Results come back in the provider's native ranking, truncated to `limit`.
#[async_trait]
pub trait AnimeSearch: Send + Sync + std::fmt::Debug {
    /// The provider behind this search
    fn provider(&self) -> Provider;

    /// Search for anime matching `keyword`
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<AnimeSummary>, SourceError>;
}

/// Errors that can occur when interacting with a provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// No response within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Non-2xx response
    #[error("Upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response JSON missing expected fields or reporting failure
    #[error("Unexpected upstream response: {0}")]
    Shape(String),

    /// Connection failed before any response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream answered but the requested item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// MAL rejected the authorization code exchange; `body` is MAL's error verbatim
    #[error("Token exchange failed with HTTP {status}: {body}")]
    AuthExchange { status: u16, body: String },
}

impl SourceError {
    /// Stable category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::Timeout(_) => ErrorKind::Timeout,
            SourceError::Http { .. } => ErrorKind::UpstreamHttp,
            SourceError::Shape(_) => ErrorKind::UpstreamShape,
            SourceError::Network(_) => ErrorKind::Network,
            SourceError::NotFound(_) => ErrorKind::NotFound,
            SourceError::AuthExchange { .. } => ErrorKind::AuthExchange,
        }
    }

    /// HTTP status, for errors that carry one
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Http { status, .. } | SourceError::AuthExchange { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Reduce to a serializable descriptor
    pub fn descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor {
            kind: self.kind(),
            message: self.to_string(),
            status: self.status(),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest includes the URL in its messages; MAL URLs never carry
        // credentials, which travel in headers or form bodies.
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_decode() {
            SourceError::Shape(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Shape(format!("JSON: {}", err))
    }
}
