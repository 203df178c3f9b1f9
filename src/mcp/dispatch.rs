//! Routes a validated tool call to its adapter.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::Category;
use crate::normalize::{self, catalog::FILTERS, Args};
use crate::sources::{combined_search, MalCredentials, MalSearch, SourceError, SourceRegistry};

use super::error::ToolError;
use super::tools::ToolKind;

fn to_json<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| SourceError::from(e).into())
}

/// Validate `args` for `kind` and run it.
///
/// Arguments are fully normalized before any request is made, so a
/// validation failure never reaches an upstream.
pub async fn dispatch(
    sources: &SourceRegistry,
    kind: ToolKind,
    args: &Value,
) -> Result<Value, ToolError> {
    dispatch_on(sources, kind, args, Utc::now().date_naive()).await
}

pub(crate) async fn dispatch_on(
    sources: &SourceRegistry,
    kind: ToolKind,
    args: &Value,
    today: NaiveDate,
) -> Result<Value, ToolError> {
    let args = Args::new(args)?;
    let hianime = sources.hianime();
    let mal = sources.mal();

    match kind {
        ToolKind::SearchAnime => {
            let query = normalize::search(&args)?;
            to_json(&hianime.search(&query).await?)
        }
        ToolKind::GetPopularAnime => list(sources, normalize::listing(&args, Category::Popular)?).await,
        ToolKind::GetTopAiringAnime => {
            list(sources, normalize::listing(&args, Category::TopAiring)?).await
        }
        ToolKind::GetRecentlyUpdatedAnime => {
            list(sources, normalize::listing(&args, Category::RecentlyUpdated)?).await
        }
        ToolKind::GetCompletedAnime => {
            list(sources, normalize::listing(&args, Category::Completed)?).await
        }
        ToolKind::GetSubbedAnime => list(sources, normalize::listing(&args, Category::Subbed)?).await,
        ToolKind::GetDubbedAnime => list(sources, normalize::listing(&args, Category::Dubbed)?).await,
        ToolKind::GetAnimeByGenre => list(sources, normalize::genre(&args)?).await,
        ToolKind::GetAnimeByType => list(sources, normalize::anime_type(&args)?).await,
        ToolKind::GetAnimeByProducer => list(sources, normalize::producer(&args)?).await,
        ToolKind::GetAnimeAzList => list(sources, normalize::az_list(&args)?).await,
        ToolKind::GetAnimeDetails => {
            let slug = normalize::slug(&args)?;
            to_json(&hianime.details(&slug).await?)
        }
        ToolKind::GetAnimeEpisodes => {
            let slug = normalize::slug(&args)?;
            let episodes = hianime.episodes(&slug).await?;
            Ok(json!({
                "slug": slug,
                "total_episodes": episodes.len(),
                "episodes": to_json(&episodes)?,
            }))
        }
        ToolKind::GetEpisodeInfo => {
            let (slug, number) = normalize::episode(&args)?;
            to_json(&hianime.episode(&slug, number).await?)
        }
        ToolKind::FilterAnime => {
            let query = normalize::filter(&args)?;
            to_json(&hianime.filter(&query).await?)
        }
        ToolKind::CheckApiHealth => {
            let mut status = json!({ "base_url": hianime.base_url() });
            match hianime.health().await {
                Ok(()) => status["healthy"] = json!(true),
                Err(e) => {
                    tracing::warn!("HiAnime health check failed: {}", e);
                    status["healthy"] = json!(false);
                    status["error"] = json!(e.descriptor());
                }
            }
            Ok(status)
        }
        ToolKind::GetAvailableFilters => to_json(&FILTERS),
        ToolKind::MalSearchAnime => {
            let query = normalize::mal_search(&args)?;
            let credentials = normalize::mal_client_id(&args)?;
            to_json(&mal.search(&credentials, &query).await?)
        }
        ToolKind::MalGetAnimeDetails => {
            let anime_id = normalize::mal_anime_id(&args)?;
            let credentials = normalize::mal_client_id(&args)?;
            to_json(&mal.details(&credentials, anime_id).await?)
        }
        ToolKind::MalGetAnimeRanking => {
            let query = normalize::mal_ranking(&args)?;
            let credentials = normalize::mal_client_id(&args)?;
            to_json(&mal.ranking(&credentials, &query).await?)
        }
        ToolKind::MalGetSeasonalAnime => {
            let query = normalize::mal_seasonal(&args, today)?;
            let credentials = normalize::mal_client_id(&args)?;
            let page = mal.seasonal(&credentials, &query).await?;
            Ok(json!({
                "year": query.year,
                "season": query.season,
                "items": to_json(&page.items)?,
                "pagination": to_json(&page.pagination)?,
            }))
        }
        ToolKind::MalGetAuthUrl => {
            let request = normalize::auth_url(&args)?;
            let artifact = sources.mal_auth().authorization_url(&request);
            tracing::info!("Issued MAL authorization URL");
            to_json(&artifact)
        }
        ToolKind::MalExchangeToken => {
            let request = normalize::token_request(&args)?;
            to_json(&sources.mal_auth().exchange_token(&request).await?)
        }
        ToolKind::MalGetUserAnimeList => {
            let query = normalize::mal_user_list(&args)?;
            let credentials = normalize::mal_access_token(&args)?;
            to_json(&mal.user_anime_list(&credentials, &query).await?)
        }
        ToolKind::MalGetUserProfile => {
            let credentials = normalize::mal_access_token(&args)?;
            to_json(&mal.user_profile(&credentials).await?)
        }
        ToolKind::CombinedSearch => {
            let query = normalize::combined(&args)?;
            let mal_search = MalSearch::new(
                mal.as_ref().clone(),
                MalCredentials::ClientId(query.client_id.clone()),
            );
            let result =
                combined_search(hianime.as_ref(), &mal_search, &query.query, query.limit).await?;
            to_json(&result)
        }
    }
}

async fn list(sources: &SourceRegistry, query: crate::models::ListQuery) -> Result<Value, ToolError> {
    to_json(&sources.hianime().list(&query).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn registry() -> SourceRegistry {
        // Unroutable bases: any request made would fail as a network error
        let mut config = Config::default();
        config.hianime.base_url = "http://127.0.0.1:9".to_string();
        config.mal.api_base = "http://127.0.0.1:9/v2".to_string();
        config.mal.oauth_base = "http://127.0.0.1:9/v1/oauth2".to_string();
        SourceRegistry::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_validation_happens_before_requests() {
        let err = dispatch(
            &registry(),
            ToolKind::GetAnimeByGenre,
            &json!({ "genre": "cooking" }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ToolError::Validation(_)));
        assert_eq!(err.field(), Some("genre"));
    }

    #[tokio::test]
    async fn test_available_filters_match_validation_lists() {
        let filters = dispatch(&registry(), ToolKind::GetAvailableFilters, &Value::Null)
            .await
            .unwrap();

        let genres: Vec<&str> = filters["genres"]
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g.as_str().unwrap())
            .collect();
        assert_eq!(genres, crate::normalize::catalog::GENRES);

        for genre in genres {
            let args = json!({ "genre": genre });
            assert!(normalize::genre(&Args::new(&args).unwrap()).is_ok());
        }

        use crate::normalize::catalog::{RATINGS, SEASONS, SORT_OPTIONS, STATUSES, TYPES};
        let filter_lists = [
            ("types", "anime_type", TYPES),
            ("statuses", "status", STATUSES),
            ("ratings", "rated", RATINGS),
            ("seasons", "season", SEASONS),
            ("sort_options", "sort", SORT_OPTIONS),
        ];
        for (key, argument, expected) in filter_lists {
            let listed: Vec<&str> = filters[key]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap())
                .collect();
            assert_eq!(listed, expected, "{}", key);

            for value in listed {
                let args = json!({ argument: value });
                assert!(
                    normalize::filter(&Args::new(&args).unwrap()).is_ok(),
                    "{}={}",
                    argument,
                    value
                );
            }
        }
    }

    #[tokio::test]
    async fn test_auth_url_needs_no_network() {
        let result = dispatch(
            &registry(),
            ToolKind::MalGetAuthUrl,
            &json!({ "client_id": "abc" }),
        )
        .await
        .unwrap();

        let verifier = result["code_verifier"].as_str().unwrap();
        assert_eq!(verifier.len(), 128);
        assert!(result["authorization_url"]
            .as_str()
            .unwrap()
            .contains("code_challenge_method=plain"));
    }

    #[tokio::test]
    async fn test_health_never_fails() {
        let result = dispatch(&registry(), ToolKind::CheckApiHealth, &json!({}))
            .await
            .unwrap();

        assert_eq!(result["healthy"], false);
        assert_eq!(result["base_url"], "http://127.0.0.1:9");
        assert!(result["error"]["kind"].is_string());
    }

    #[tokio::test]
    async fn test_arguments_must_be_an_object() {
        let err = dispatch(&registry(), ToolKind::SearchAnime, &json!(["naruto"]))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("arguments"));
    }
}
