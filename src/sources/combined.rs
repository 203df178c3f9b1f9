//! Concurrent search across both providers.

use crate::models::{AnimeSummary, BranchOutcome, CombinedResult, ErrorDescriptor};
use crate::sources::{AnimeSearch, SourceError};

/// Both providers failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Both providers failed (hianime: {}; mal: {})", .hianime.message, .mal.message)]
pub struct AggregateError {
    pub hianime: ErrorDescriptor,
    pub mal: ErrorDescriptor,
}

/// Search both providers at once and report them side by side.
///
/// Each branch keeps its provider's ordering and is truncated to `limit` on
/// its own. A failing branch is reported in place of its results; only when
/// both fail is the whole call an error.
pub async fn combined_search(
    hianime: &dyn AnimeSearch,
    mal: &dyn AnimeSearch,
    query: &str,
    limit: usize,
) -> Result<CombinedResult, AggregateError> {
    tracing::info!("Combined search for '{}' (limit {})", query, limit);

    let (hianime_result, mal_result) =
        tokio::join!(hianime.search(query, limit), mal.search(query, limit));

    let hianime_outcome = branch(hianime, hianime_result);
    let mal_outcome = branch(mal, mal_result);

    match (hianime_outcome, mal_outcome) {
        (BranchOutcome::Failed { error: hianime }, BranchOutcome::Failed { error: mal }) => {
            Err(AggregateError { hianime, mal })
        }
        (hianime, mal) => Ok(CombinedResult {
            query: query.to_string(),
            limit,
            hianime,
            mal,
        }),
    }
}

fn branch(source: &dyn AnimeSearch, result: Result<Vec<AnimeSummary>, SourceError>) -> BranchOutcome {
    match result {
        Ok(items) => {
            tracing::debug!("{} returned {} results", source.provider(), items.len());
            BranchOutcome::Results(items)
        }
        Err(e) => {
            tracing::warn!("{} search failed: {}", source.provider(), e);
            BranchOutcome::Failed {
                error: e.descriptor(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorKind, Provider};
    use crate::sources::mock::{make_anime, MockSource};
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_both_succeed() {
        let hianime = MockSource::new(Provider::HiAnime);
        hianime.set_results(make_anime(Provider::HiAnime, 8));
        let mal = MockSource::new(Provider::Mal);
        mal.set_results(make_anime(Provider::Mal, 2));

        let result = combined_search(&hianime, &mal, "naruto", 5).await.unwrap();

        assert_eq!(result.query, "naruto");
        assert_eq!(result.hianime.results().unwrap().len(), 5);
        assert_eq!(result.mal.results().unwrap().len(), 2);
        assert_eq!(result.hianime.results().unwrap()[0].id, "hianime-1");
    }

    #[tokio::test]
    async fn test_one_branch_times_out() {
        let hianime = MockSource::new(Provider::HiAnime);
        hianime.set_error(SourceError::Timeout("no response after 30s".to_string()));
        let mal = MockSource::new(Provider::Mal);
        mal.set_results(make_anime(Provider::Mal, 3));

        let result = combined_search(&hianime, &mal, "naruto", 3).await.unwrap();

        let error = result.hianime.error().unwrap();
        assert_eq!(error.kind, ErrorKind::Timeout);
        assert_eq!(result.mal.results().unwrap().len(), 3);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["hianime"]["error"]["kind"], "timeout");
        assert!(json["mal"].is_array());
    }

    #[tokio::test]
    async fn test_both_fail() {
        let hianime = MockSource::new(Provider::HiAnime);
        hianime.set_error(SourceError::Http {
            status: 500,
            body: "boom".to_string(),
        });
        let mal = MockSource::new(Provider::Mal);
        mal.set_error(SourceError::Network("connection refused".to_string()));

        let err = combined_search(&hianime, &mal, "naruto", 5)
            .await
            .unwrap_err();

        assert_eq!(err.hianime.kind, ErrorKind::UpstreamHttp);
        assert_eq!(err.hianime.status, Some(500));
        assert_eq!(err.mal.kind, ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_branches_run_concurrently() {
        let hianime = MockSource::new(Provider::HiAnime).with_delay(Duration::from_millis(300));
        let mal = MockSource::new(Provider::Mal).with_delay(Duration::from_millis(300));

        let start = Instant::now();
        combined_search(&hianime, &mal, "naruto", 5).await.unwrap();

        assert!(start.elapsed() < Duration::from_millis(550));
        assert_eq!(hianime.calls(), 1);
        assert_eq!(mal.calls(), 1);
    }
}
