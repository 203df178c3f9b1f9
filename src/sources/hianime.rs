//! HiAnime REST API adapter.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::models::{
    AnimeDetails, AnimeSummary, Episode, FilterQuery, ListQuery, Page, Provider, SearchQuery,
};
use crate::sources::{AnimeSearch, SourceError};
use crate::utils::{fetch_json, fetch_text, HttpClient};

/// HiAnime source
///
/// Every listing endpoint answers `{success, data: [...], page, totalPages, ...}`.
#[derive(Debug, Clone)]
pub struct HiAnimeSource {
    http: HttpClient,
    base_url: String,
}

impl HiAnimeSource {
    /// Create a source against `base_url` (trailing slashes are ignored)
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Create a source from configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let http = HttpClient::with_config(&config.http, &config.hianime.user_agent)?;
        Ok(Self::new(http, config.hianime.base_url.clone()))
    }

    /// The API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);
        self.http
            .client()
            .get(url)
            .header(ACCEPT, "application/json")
    }

    async fn fetch_page(
        &self,
        path: &str,
        params: &[(&str, String)],
        requested_page: u32,
    ) -> Result<Page<AnimeSummary>, SourceError> {
        let response: HaListResponse<HaItem> = fetch_json(self.get(path).query(params)).await?;
        let (items, meta) = response.into_parts()?;

        let items = items
            .into_iter()
            .map(parse_item)
            .collect::<Result<Vec<_>, _>>()?;

        let current_page = meta.current_page.unwrap_or(requested_page);
        let has_next_page = meta
            .has_next_page
            .or_else(|| meta.total_pages.map(|total| current_page < total))
            .unwrap_or(false);

        Ok(Page::new(items, current_page, meta.total_pages, has_next_page))
    }

    /// Keyword search
    pub async fn search(&self, query: &SearchQuery) -> Result<Page<AnimeSummary>, SourceError> {
        let params = [
            ("keyword", query.keyword.clone()),
            ("page", query.page.to_string()),
        ];
        self.fetch_page("/api/search", &params, query.page).await
    }

    /// Any listing endpoint: category, genre, type, producer or A-Z letter
    pub async fn list(&self, query: &ListQuery) -> Result<Page<AnimeSummary>, SourceError> {
        let params = [("page", query.page.to_string())];
        self.fetch_page(&query.category.path(), &params, query.page)
            .await
    }

    /// Advanced filter; issues exactly one request
    pub async fn filter(&self, query: &FilterQuery) -> Result<Page<AnimeSummary>, SourceError> {
        self.fetch_page("/api/filter", &query.to_params(), query.page)
            .await
    }

    /// Full details for one anime
    pub async fn details(&self, slug: &str) -> Result<AnimeDetails, SourceError> {
        let path = format!("/api/anime/{}", urlencoding::encode(slug));
        let response: HaEnvelope = fetch_json(self.get(&path)).await?;
        let data = response.into_data()?;

        // Some deployments nest the record under `anime`.
        let info = match data {
            Value::Object(mut map) => match map.remove("anime") {
                Some(anime @ Value::Object(_)) => anime,
                _ => Value::Object(map),
            },
            other => {
                return Err(SourceError::Shape(format!(
                    "expected an object for anime details, got {}",
                    json_type(&other)
                )))
            }
        };

        let details: HaDetails = serde_json::from_value(info)?;
        Ok(parse_details(details, slug))
    }

    /// Every episode of an anime, in upstream order
    pub async fn episodes(&self, slug: &str) -> Result<Vec<Episode>, SourceError> {
        let path = format!("/api/episodes/{}", urlencoding::encode(slug));
        let response: HaListResponse<HaEpisode> = fetch_json(self.get(&path)).await?;
        let (episodes, _) = response.into_parts()?;

        episodes.into_iter().map(parse_episode).collect()
    }

    /// A single episode by number
    pub async fn episode(&self, slug: &str, number: u32) -> Result<Episode, SourceError> {
        let episodes = self.episodes(slug).await?;
        let total = episodes.len();

        episodes
            .into_iter()
            .find(|ep| ep.number == number)
            .ok_or_else(|| {
                SourceError::NotFound(format!(
                    "Episode {} not found for '{}'. This anime has {} episodes (1-{}).",
                    number, slug, total, total
                ))
            })
    }

    /// Probe the API root; any 2xx counts as healthy
    pub async fn health(&self) -> Result<(), SourceError> {
        let (status, body) = fetch_text(self.get("/")).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(SourceError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl AnimeSearch for HiAnimeSource {
    fn provider(&self) -> Provider {
        Provider::HiAnime
    }

    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<AnimeSummary>, SourceError> {
        let page = HiAnimeSource::search(self, &SearchQuery::new(keyword)).await?;
        let mut items = page.items;
        items.truncate(limit);
        Ok(items)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Numbers arrive as either JSON numbers or numeric strings
fn value_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Page URL without its `?ref=` style query
fn clean_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Prefer `slug`, then the last path segment of `url`, then `id`
fn derive_slug(slug: Option<&str>, url: Option<&str>, id: Option<&Value>) -> Option<String> {
    if let Some(slug) = slug.map(str::trim).filter(|s| !s.is_empty()) {
        return Some(slug.to_string());
    }
    if let Some(segment) = url
        .map(clean_url)
        .and_then(|u| u.trim_end_matches('/').rsplit('/').next())
        .filter(|s| !s.is_empty())
    {
        return Some(segment.to_string());
    }
    id.and_then(value_string)
}

/// Split the `episodes` field, which is either `{sub, dub}` or a bare count
fn episode_counts(item_episodes: Option<&Value>) -> (Option<u32>, Option<u32>, Option<u32>) {
    match item_episodes {
        Some(Value::Object(map)) => (
            None,
            map.get("sub").and_then(value_u32),
            map.get("dub").and_then(value_u32),
        ),
        Some(other) => (value_u32(other), None, None),
        None => (None, None, None),
    }
}

fn parse_item(item: HaItem) -> Result<AnimeSummary, SourceError> {
    let id = derive_slug(item.slug.as_deref(), item.url.as_deref(), item.id.as_ref())
        .ok_or_else(|| {
            SourceError::Shape(format!("anime '{}' has no slug, url or id", item.title))
        })?;

    let (total, sub, dub) = episode_counts(item.episodes.as_ref());
    let episodes_sub = item.episodes_sub.as_ref().and_then(value_u32).or(sub);
    let episodes_dub = item.episodes_dub.as_ref().and_then(value_u32).or(dub);

    let mut summary = AnimeSummary::new(id, item.title, Provider::HiAnime);
    summary.kind = item.kind;
    summary.status = item.status;
    summary.score = item.score.as_ref().and_then(value_f64);
    summary.genres = item.genres.unwrap_or_default();
    summary.episode_count = total.or(episodes_sub);
    summary.url = item.url.as_deref().map(clean_url).map(str::to_string);
    summary.episodes_sub = episodes_sub;
    summary.episodes_dub = episodes_dub;
    summary.duration = item.duration;
    Ok(summary)
}

fn parse_details(details: HaDetails, requested_slug: &str) -> AnimeDetails {
    let id = derive_slug(details.slug.as_deref(), details.url.as_deref(), details.id.as_ref())
        .unwrap_or_else(|| requested_slug.to_string());

    let (total, sub, dub) = episode_counts(details.episodes.as_ref());

    let mut summary = AnimeSummary::new(id, details.title, Provider::HiAnime);
    summary.kind = details.kind;
    summary.status = details.status;
    summary.score = details.score.as_ref().and_then(value_f64);
    summary.genres = details.genres.unwrap_or_default();
    summary.episode_count = total
        .or(details.total_episodes.as_ref().and_then(value_u32))
        .or(sub);
    summary.url = details.url.as_deref().map(clean_url).map(str::to_string);
    summary.episodes_sub = sub;
    summary.episodes_dub = dub;
    summary.duration = details.duration;

    AnimeDetails {
        summary,
        japanese_title: details.japanese_title,
        synopsis: details.synopsis,
        aired: details.aired,
        season: details.season,
        rating: details.rating,
        studios: details.studios.unwrap_or_default(),
        producers: details.producers.unwrap_or_default(),
    }
}

fn parse_episode(episode: HaEpisode) -> Result<Episode, SourceError> {
    let number = value_u32(&episode.number).ok_or_else(|| {
        SourceError::Shape(format!("episode number {} is not a number", episode.number))
    })?;

    Ok(Episode {
        number,
        title: episode.title,
        japanese_title: episode.japanese_title.filter(|t| !t.is_empty()),
        id: episode.id.as_ref().and_then(value_string),
        url: episode.url,
        is_filler: episode.is_filler.unwrap_or(false),
    })
}

// ===== HiAnime API Types =====

#[derive(Debug, Deserialize)]
struct HaEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<Value>,
}

impl HaEnvelope {
    fn into_data(self) -> Result<Value, SourceError> {
        if !self.success {
            return Err(SourceError::Shape(
                "HiAnime API reported an unsuccessful response".to_string(),
            ));
        }
        self.data
            .ok_or_else(|| SourceError::Shape("response has no 'data' field".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct HaListResponse<T> {
    #[serde(default)]
    success: bool,
    data: Option<Vec<T>>,
    #[serde(default)]
    page: Option<Value>,
    #[serde(default, rename = "currentPage")]
    current_page_camel: Option<Value>,
    #[serde(default)]
    current_page: Option<Value>,
    #[serde(default, rename = "totalPages")]
    total_pages_camel: Option<Value>,
    #[serde(default)]
    total_pages: Option<Value>,
    #[serde(default, rename = "hasNextPage")]
    has_next_page_camel: Option<bool>,
    #[serde(default)]
    has_next_page: Option<bool>,
}

struct PageMeta {
    current_page: Option<u32>,
    total_pages: Option<u32>,
    has_next_page: Option<bool>,
}

impl<T> HaListResponse<T> {
    fn into_parts(self) -> Result<(Vec<T>, PageMeta), SourceError> {
        if !self.success {
            return Err(SourceError::Shape(
                "HiAnime API reported an unsuccessful response".to_string(),
            ));
        }
        let data = self
            .data
            .ok_or_else(|| SourceError::Shape("response has no 'data' list".to_string()))?;
        let meta = PageMeta {
            current_page: [&self.page, &self.current_page_camel, &self.current_page]
                .into_iter()
                .find_map(|v| v.as_ref())
                .and_then(value_u32)
                .filter(|p| *p >= 1),
            total_pages: self
                .total_pages_camel
                .or(self.total_pages)
                .as_ref()
                .and_then(value_u32),
            has_next_page: self.has_next_page_camel.or(self.has_next_page),
        };
        Ok((data, meta))
    }
}

#[derive(Debug, Deserialize)]
struct HaItem {
    title: String,
    slug: Option<String>,
    id: Option<Value>,
    url: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
    score: Option<Value>,
    genres: Option<Vec<String>>,
    episodes: Option<Value>,
    episodes_sub: Option<Value>,
    episodes_dub: Option<Value>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HaDetails {
    title: String,
    slug: Option<String>,
    id: Option<Value>,
    url: Option<String>,
    #[serde(alias = "japaneseTitle")]
    japanese_title: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
    episodes: Option<Value>,
    #[serde(alias = "totalEpisodes")]
    total_episodes: Option<Value>,
    duration: Option<String>,
    aired: Option<String>,
    season: Option<String>,
    rating: Option<String>,
    #[serde(alias = "malscore", alias = "mal_score")]
    score: Option<Value>,
    #[serde(alias = "description")]
    synopsis: Option<String>,
    genres: Option<Vec<String>>,
    studios: Option<Vec<String>>,
    producers: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct HaEpisode {
    #[serde(alias = "episodeNum")]
    number: Value,
    #[serde(alias = "name")]
    title: Option<String>,
    #[serde(alias = "japaneseTitle")]
    japanese_title: Option<String>,
    id: Option<Value>,
    url: Option<String>,
    #[serde(alias = "isFiller")]
    is_filler: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> HaItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_slug_from_url_when_missing() {
        let summary = parse_item(item(json!({
            "title": "Naruto",
            "id": 677,
            "url": "https://hianime.to/naruto-677?ref=search",
            "type": "TV",
            "episodes": {"sub": 220, "dub": "220"}
        })))
        .unwrap();

        assert_eq!(summary.id, "naruto-677");
        assert_eq!(summary.url.as_deref(), Some("https://hianime.to/naruto-677"));
        assert_eq!(summary.episodes_sub, Some(220));
        assert_eq!(summary.episodes_dub, Some(220));
        assert_eq!(summary.episode_count, Some(220));
        assert_eq!(summary.kind.as_deref(), Some("TV"));
    }

    #[test]
    fn test_slug_falls_back_to_id() {
        let summary = parse_item(item(json!({"title": "X", "id": "x-1"}))).unwrap();
        assert_eq!(summary.id, "x-1");
    }

    #[test]
    fn test_item_without_identifier_is_shape_error() {
        let err = parse_item(item(json!({"title": "Nameless"}))).unwrap_err();
        assert!(matches!(err, SourceError::Shape(_)));
    }

    #[test]
    fn test_unsuccessful_response_is_shape_error() {
        let response: HaListResponse<HaItem> =
            serde_json::from_value(json!({"success": false, "data": []})).unwrap();
        assert!(matches!(response.into_parts(), Err(SourceError::Shape(_))));
    }

    #[test]
    fn test_page_keys_may_appear_together() {
        let response: HaListResponse<HaItem> = serde_json::from_value(json!({
            "success": true,
            "data": [],
            "page": 2,
            "currentPage": 2,
            "totalPages": 5,
            "total_pages": 5,
            "hasNextPage": true,
            "has_next_page": true
        }))
        .unwrap();
        let (_, meta) = response.into_parts().unwrap();
        assert_eq!(meta.current_page, Some(2));
        assert_eq!(meta.total_pages, Some(5));
        assert_eq!(meta.has_next_page, Some(true));

        let response: HaListResponse<HaItem> =
            serde_json::from_value(json!({"success": true, "data": [], "current_page": "3"}))
                .unwrap();
        assert_eq!(response.into_parts().unwrap().1.current_page, Some(3));
    }

    #[test]
    fn test_episode_number_from_string() {
        let episode: HaEpisode = serde_json::from_value(json!({
            "episodeNum": "3",
            "name": "Sasuke",
            "isFiller": true
        }))
        .unwrap();
        let episode = parse_episode(episode).unwrap();
        assert_eq!(episode.number, 3);
        assert_eq!(episode.title.as_deref(), Some("Sasuke"));
        assert!(episode.is_filler);
    }

    #[test]
    fn test_details_field_aliases() {
        let details: HaDetails = serde_json::from_value(json!({
            "title": "Frieren",
            "japaneseTitle": "Sousou no Frieren",
            "totalEpisodes": 28,
            "malscore": "9.3",
            "description": "An elf mage...",
            "genres": ["Adventure", "Drama"]
        }))
        .unwrap();
        let details = parse_details(details, "frieren-18542");

        assert_eq!(details.summary.id, "frieren-18542");
        assert_eq!(details.summary.episode_count, Some(28));
        assert_eq!(details.summary.score, Some(9.3));
        assert_eq!(details.japanese_title.as_deref(), Some("Sousou no Frieren"));
        assert_eq!(details.synopsis.as_deref(), Some("An elf mage..."));
    }
}
