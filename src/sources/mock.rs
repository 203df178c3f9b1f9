//! Mock search source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{AnimeSummary, Provider};
use crate::sources::{AnimeSearch, SourceError};

/// A mock provider that returns a predefined outcome, optionally after a delay.
#[derive(Debug)]
pub struct MockSource {
    provider: Provider,
    response: Mutex<Result<Vec<AnimeSummary>, SourceError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a mock that returns no results.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            response: Mutex::new(Ok(Vec::new())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the results to return.
    pub fn set_results(&self, results: Vec<AnimeSummary>) {
        *self.response.lock().unwrap_or_else(|e| e.into_inner()) = Ok(results);
    }

    /// Make every call fail with `error`.
    pub fn set_error(&self, error: SourceError) {
        *self.response.lock().unwrap_or_else(|e| e.into_inner()) = Err(error);
    }

    /// Number of searches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnimeSearch for MockSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn search(&self, _keyword: &str, limit: usize) -> Result<Vec<AnimeSummary>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .response
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        response.map(|mut items| {
            items.truncate(limit);
            items
        })
    }
}

/// Helper function to create `count` numbered anime for a provider.
pub fn make_anime(provider: Provider, count: usize) -> Vec<AnimeSummary> {
    (1..=count)
        .map(|i| AnimeSummary::new(format!("{}-{}", provider.id(), i), format!("Anime {}", i), provider))
        .collect()
}
