//! Registry holding the configured provider adapters.

use std::sync::Arc;

use crate::config::Config;
use crate::sources::mal_auth::MalAuth;
use crate::sources::{HiAnimeSource, MalSource, SourceError};

/// Errors building the registry from configuration
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Invalid URL for {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// The provider adapters every tool dispatches to
///
/// Adapters are immutable after construction and hold no credentials, so the
/// registry is shared across concurrent tool calls without locking.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    hianime: Arc<HiAnimeSource>,
    mal: Arc<MalSource>,
    mal_auth: Arc<MalAuth>,
}

impl SourceRegistry {
    /// Create a registry from explicit adapters
    pub fn new(hianime: HiAnimeSource, mal: MalSource, mal_auth: MalAuth) -> Self {
        Self {
            hianime: Arc::new(hianime),
            mal: Arc::new(mal),
            mal_auth: Arc::new(mal_auth),
        }
    }

    /// Create a registry with every adapter built from configuration
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        url::Url::parse(&config.hianime.base_url).map_err(|source| SetupError::InvalidUrl {
            name: "hianime.base_url",
            source,
        })?;
        url::Url::parse(&config.mal.api_base).map_err(|source| SetupError::InvalidUrl {
            name: "mal.api_base",
            source,
        })?;

        Ok(Self::new(
            HiAnimeSource::from_config(config)?,
            MalSource::from_config(config)?,
            MalAuth::from_config(config)?,
        ))
    }

    /// The HiAnime adapter
    pub fn hianime(&self) -> &Arc<HiAnimeSource> {
        &self.hianime
    }

    /// The MAL adapter
    pub fn mal(&self) -> &Arc<MalSource> {
        &self.mal
    }

    /// The MAL OAuth2 helper
    pub fn mal_auth(&self) -> &Arc<MalAuth> {
        &self.mal_auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let registry = SourceRegistry::from_config(&Config::default());
        assert!(registry.is_ok());
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let mut config = Config::default();
        config.hianime.base_url = "not a url".to_string();

        match SourceRegistry::from_config(&config) {
            Err(SetupError::InvalidUrl { name, .. }) => assert_eq!(name, "hianime.base_url"),
            other => panic!("expected InvalidUrl, got {:?}", other.map(|_| ())),
        }
    }
}
