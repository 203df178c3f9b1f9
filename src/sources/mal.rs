//! MyAnimeList v2 API adapter.
//!
//! The adapter holds no credentials. Every call takes [`MalCredentials`]
//! supplied by the caller for that invocation only.

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Deserialize;

use crate::config::Config;
use crate::models::{
    AnimeDetails, AnimeSummary, ListStatus, MalListQuery, MalRankingQuery, MalSearchQuery,
    MalSeasonalQuery, Page, Provider, UserListEntry, UserProfile,
};
use crate::sources::{AnimeSearch, SourceError};
use crate::utils::{default_user_agent, fetch_json, HttpClient};

const LIST_FIELDS: &str = "id,title,main_picture,mean,rank,media_type,status,genres,num_episodes";
const DETAIL_FIELDS: &str = "id,title,main_picture,alternative_titles,start_date,end_date,\
synopsis,mean,rank,media_type,status,genres,num_episodes,start_season,rating,studios";

/// Per-call MAL authentication
#[derive(Clone, PartialEq, Eq)]
pub enum MalCredentials {
    /// `X-MAL-CLIENT-ID` header for public endpoints
    ClientId(String),
    /// `Authorization: Bearer` for user-scoped endpoints
    Bearer(String),
}

impl MalCredentials {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            MalCredentials::ClientId(id) => request.header("X-MAL-CLIENT-ID", id),
            MalCredentials::Bearer(token) => request.bearer_auth(token),
        }
    }
}

impl std::fmt::Debug for MalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalCredentials::ClientId(_) => f.write_str("ClientId(<redacted>)"),
            MalCredentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// MyAnimeList source
#[derive(Debug, Clone)]
pub struct MalSource {
    http: HttpClient,
    api_base: String,
}

impl MalSource {
    /// Create a source against `api_base`, e.g. `https://api.myanimelist.net/v2`
    pub fn new(http: HttpClient, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self { http, api_base }
    }

    /// Create a source from configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let http = HttpClient::with_config(&config.http, default_user_agent())?;
        Ok(Self::new(http, config.mal.api_base.clone()))
    }

    fn get(&self, credentials: &MalCredentials, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_base, path);
        tracing::debug!("GET {}", url);
        credentials.apply(self.http.client().get(url))
    }

    async fn fetch_nodes(
        &self,
        request: RequestBuilder,
        limit: u32,
        offset: u32,
    ) -> Result<Page<AnimeSummary>, SourceError> {
        let response: MalListResponse = fetch_json(request).await?;
        let has_next_page = response.paging.next.is_some();
        let items = response
            .data
            .into_iter()
            .map(|entry| {
                let mut summary = parse_node(entry.node);
                if let Some(ranking) = entry.ranking {
                    summary.rank = Some(ranking.rank);
                }
                summary
            })
            .collect();

        Ok(Page::new(items, page_number(limit, offset), None, has_next_page))
    }

    /// Keyword search
    pub async fn search(
        &self,
        credentials: &MalCredentials,
        query: &MalSearchQuery,
    ) -> Result<Page<AnimeSummary>, SourceError> {
        let request = self.get(credentials, "/anime").query(&[
            ("q", query.query.clone()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ]);
        self.fetch_nodes(request, query.limit, query.offset).await
    }

    /// Full details for one anime
    pub async fn details(
        &self,
        credentials: &MalCredentials,
        anime_id: u64,
    ) -> Result<AnimeDetails, SourceError> {
        let request = self
            .get(credentials, &format!("/anime/{}", anime_id))
            .query(&[("fields", DETAIL_FIELDS)]);
        let node: MalNode = fetch_json(request).await?;
        Ok(parse_details(node))
    }

    /// Top anime by ranking type
    pub async fn ranking(
        &self,
        credentials: &MalCredentials,
        query: &MalRankingQuery,
    ) -> Result<Page<AnimeSummary>, SourceError> {
        let request = self.get(credentials, "/anime/ranking").query(&[
            ("ranking_type", query.ranking_type.to_string()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ]);
        self.fetch_nodes(request, query.limit, query.offset).await
    }

    /// Anime of one broadcast season
    pub async fn seasonal(
        &self,
        credentials: &MalCredentials,
        query: &MalSeasonalQuery,
    ) -> Result<Page<AnimeSummary>, SourceError> {
        let path = format!("/anime/season/{}/{}", query.year, query.season);
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ];
        if let Some(sort) = query.sort {
            params.push(("sort", sort.to_string()));
        }

        let request = self.get(credentials, &path).query(&params);
        self.fetch_nodes(request, query.limit, query.offset).await
    }

    /// A user's anime list; needs a bearer token
    pub async fn user_anime_list(
        &self,
        credentials: &MalCredentials,
        query: &MalListQuery,
    ) -> Result<Page<UserListEntry>, SourceError> {
        let path = format!("/users/{}/animelist", user_segment(&query.user_name));
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
            ("fields", format!("list_status,{}", LIST_FIELDS)),
        ];
        if let Some(status) = query.status {
            params.push(("status", status.to_string()));
        }
        if let Some(sort) = query.sort {
            params.push(("sort", sort.to_string()));
        }

        let response: MalListResponse =
            fetch_json(self.get(credentials, &path).query(&params)).await?;
        let has_next_page = response.paging.next.is_some();
        let entries = response
            .data
            .into_iter()
            .map(|entry| UserListEntry {
                anime: parse_node(entry.node),
                list_status: entry.list_status.map(|s| ListStatus {
                    status: s.status,
                    score: s.score,
                    num_episodes_watched: s.num_episodes_watched,
                    updated_at: s.updated_at,
                }),
            })
            .collect();

        Ok(Page::new(
            entries,
            page_number(query.limit, query.offset),
            None,
            has_next_page,
        ))
    }

    /// Profile of the token owner
    pub async fn user_profile(
        &self,
        credentials: &MalCredentials,
    ) -> Result<UserProfile, SourceError> {
        let request = self
            .get(credentials, "/users/@me")
            .query(&[("fields", "anime_statistics")]);
        let user: MalUser = fetch_json(request).await?;

        Ok(UserProfile {
            id: user.id,
            name: user.name,
            joined_at: user.joined_at,
            location: user.location.filter(|l| !l.is_empty()),
            anime_statistics: user.anime_statistics,
        })
    }
}

/// A [`MalSource`] bound to one call's credentials, for use as an [`AnimeSearch`]
#[derive(Debug, Clone)]
pub struct MalSearch {
    source: MalSource,
    credentials: MalCredentials,
}

impl MalSearch {
    pub fn new(source: MalSource, credentials: MalCredentials) -> Self {
        Self {
            source,
            credentials,
        }
    }
}

#[async_trait]
impl AnimeSearch for MalSearch {
    fn provider(&self) -> Provider {
        Provider::Mal
    }

    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<AnimeSummary>, SourceError> {
        let query = MalSearchQuery {
            query: keyword.to_string(),
            limit: u32::try_from(limit).unwrap_or(u32::MAX),
            offset: 0,
        };
        let mut items = self.source.search(&self.credentials, &query).await?.items;
        items.truncate(limit);
        Ok(items)
    }
}

/// 1-based page number for an offset-paged request
/// `@me` is MAL's alias for the token owner and stays literal in the path
fn user_segment(user_name: &str) -> std::borrow::Cow<'_, str> {
    if user_name == "@me" {
        std::borrow::Cow::Borrowed(user_name)
    } else {
        urlencoding::encode(user_name)
    }
}

fn page_number(limit: u32, offset: u32) -> u32 {
    if limit == 0 {
        return 1;
    }
    offset / limit + 1
}

/// Map MAL's status vocabulary onto the shared one
fn normalize_status(status: &str) -> String {
    match status {
        "finished_airing" => "finished".to_string(),
        "currently_airing" => "airing".to_string(),
        "not_yet_aired" => "upcoming".to_string(),
        other => other.to_string(),
    }
}

fn parse_node(node: MalNode) -> AnimeSummary {
    let mut summary = AnimeSummary::new(node.id.to_string(), node.title, Provider::Mal);
    summary.kind = node.media_type;
    summary.status = node.status.as_deref().map(normalize_status);
    summary.score = node.mean;
    summary.genres = node.genres.into_iter().map(|g| g.name).collect();
    summary.episode_count = node.num_episodes.filter(|n| *n > 0);
    summary.url = Some(format!("https://myanimelist.net/anime/{}", node.id));
    summary.rank = node.rank;
    summary.image_url = node.main_picture.and_then(|p| p.large.or(p.medium));
    summary
}

fn parse_details(mut node: MalNode) -> AnimeDetails {
    let japanese_title = node
        .alternative_titles
        .take()
        .and_then(|t| t.ja)
        .filter(|t| !t.is_empty());
    let synopsis = node.synopsis.take();
    let aired = match (node.start_date.take(), node.end_date.take()) {
        (Some(start), Some(end)) => Some(format!("{} to {}", start, end)),
        (Some(start), None) => Some(format!("{} to ?", start)),
        _ => None,
    };
    let season = node
        .start_season
        .take()
        .map(|s| format!("{} {}", s.season, s.year));
    let rating = node.rating.take().map(|r| r.replace('_', "-"));
    let studios = std::mem::take(&mut node.studios)
        .into_iter()
        .map(|s| s.name)
        .collect();

    AnimeDetails {
        summary: parse_node(node),
        japanese_title,
        synopsis,
        aired,
        season,
        rating,
        studios,
        producers: Vec::new(),
    }
}

// ===== MAL API Types =====

#[derive(Debug, Deserialize)]
struct MalListResponse {
    data: Vec<MalEntry>,
    #[serde(default)]
    paging: MalPaging,
}

#[derive(Debug, Default, Deserialize)]
struct MalPaging {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MalEntry {
    node: MalNode,
    ranking: Option<MalRanking>,
    list_status: Option<MalListStatus>,
}

#[derive(Debug, Deserialize)]
struct MalRanking {
    rank: u32,
}

#[derive(Debug, Deserialize)]
struct MalNode {
    id: u64,
    title: String,
    main_picture: Option<MalPicture>,
    alternative_titles: Option<MalAlternativeTitles>,
    start_date: Option<String>,
    end_date: Option<String>,
    synopsis: Option<String>,
    mean: Option<f64>,
    rank: Option<u32>,
    media_type: Option<String>,
    status: Option<String>,
    #[serde(default)]
    genres: Vec<MalNamed>,
    num_episodes: Option<u32>,
    start_season: Option<MalSeason>,
    rating: Option<String>,
    #[serde(default)]
    studios: Vec<MalNamed>,
}

#[derive(Debug, Deserialize)]
struct MalPicture {
    medium: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MalAlternativeTitles {
    ja: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MalNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MalSeason {
    year: i32,
    season: String,
}

#[derive(Debug, Deserialize)]
struct MalListStatus {
    status: Option<String>,
    score: Option<u32>,
    num_episodes_watched: Option<u32>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MalUser {
    id: u64,
    name: String,
    joined_at: Option<String>,
    location: Option<String>,
    anime_statistics: Option<serde_json::Value>,
}
