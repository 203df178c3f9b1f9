//! Tool registry for MCP tools.

use serde::Serialize;
use serde_json::{json, Value};

use crate::normalize::catalog::{
    GENRES, LANGUAGES, MAL_LIST_SORTS, MAL_LIST_STATUSES, MAL_RANKING_TYPES, MAL_SEASON_SORTS,
    RATINGS, SEASONS, SORT_OPTIONS, STATUSES, TYPES,
};
use crate::sources::SourceRegistry;

use super::dispatch::dispatch;
use super::error::ToolError;

/// The closed set of tools this server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    SearchAnime,
    GetPopularAnime,
    GetTopAiringAnime,
    GetRecentlyUpdatedAnime,
    GetCompletedAnime,
    GetSubbedAnime,
    GetDubbedAnime,
    GetAnimeByGenre,
    GetAnimeByType,
    GetAnimeDetails,
    GetAnimeEpisodes,
    GetEpisodeInfo,
    GetAnimeAzList,
    GetAnimeByProducer,
    FilterAnime,
    CheckApiHealth,
    GetAvailableFilters,
    MalSearchAnime,
    MalGetAnimeDetails,
    MalGetAnimeRanking,
    MalGetSeasonalAnime,
    MalGetAuthUrl,
    MalExchangeToken,
    MalGetUserAnimeList,
    MalGetUserProfile,
    CombinedSearch,
}

impl ToolKind {
    /// Every tool, in listing order
    pub const ALL: [ToolKind; 26] = [
        ToolKind::SearchAnime,
        ToolKind::GetPopularAnime,
        ToolKind::GetTopAiringAnime,
        ToolKind::GetRecentlyUpdatedAnime,
        ToolKind::GetCompletedAnime,
        ToolKind::GetSubbedAnime,
        ToolKind::GetDubbedAnime,
        ToolKind::GetAnimeByGenre,
        ToolKind::GetAnimeByType,
        ToolKind::GetAnimeDetails,
        ToolKind::GetAnimeEpisodes,
        ToolKind::GetEpisodeInfo,
        ToolKind::GetAnimeAzList,
        ToolKind::GetAnimeByProducer,
        ToolKind::FilterAnime,
        ToolKind::CheckApiHealth,
        ToolKind::GetAvailableFilters,
        ToolKind::MalSearchAnime,
        ToolKind::MalGetAnimeDetails,
        ToolKind::MalGetAnimeRanking,
        ToolKind::MalGetSeasonalAnime,
        ToolKind::MalGetAuthUrl,
        ToolKind::MalExchangeToken,
        ToolKind::MalGetUserAnimeList,
        ToolKind::MalGetUserProfile,
        ToolKind::CombinedSearch,
    ];

    /// Wire name of the tool
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::SearchAnime => "search_anime",
            ToolKind::GetPopularAnime => "get_popular_anime",
            ToolKind::GetTopAiringAnime => "get_top_airing_anime",
            ToolKind::GetRecentlyUpdatedAnime => "get_recently_updated_anime",
            ToolKind::GetCompletedAnime => "get_completed_anime",
            ToolKind::GetSubbedAnime => "get_subbed_anime",
            ToolKind::GetDubbedAnime => "get_dubbed_anime",
            ToolKind::GetAnimeByGenre => "get_anime_by_genre",
            ToolKind::GetAnimeByType => "get_anime_by_type",
            ToolKind::GetAnimeDetails => "get_anime_details",
            ToolKind::GetAnimeEpisodes => "get_anime_episodes",
            ToolKind::GetEpisodeInfo => "get_episode_info",
            ToolKind::GetAnimeAzList => "get_anime_az_list",
            ToolKind::GetAnimeByProducer => "get_anime_by_producer",
            ToolKind::FilterAnime => "filter_anime",
            ToolKind::CheckApiHealth => "check_api_health",
            ToolKind::GetAvailableFilters => "get_available_filters",
            ToolKind::MalSearchAnime => "mal_search_anime",
            ToolKind::MalGetAnimeDetails => "mal_get_anime_details",
            ToolKind::MalGetAnimeRanking => "mal_get_anime_ranking",
            ToolKind::MalGetSeasonalAnime => "mal_get_seasonal_anime",
            ToolKind::MalGetAuthUrl => "mal_get_auth_url",
            ToolKind::MalExchangeToken => "mal_exchange_token",
            ToolKind::MalGetUserAnimeList => "mal_get_user_anime_list",
            ToolKind::MalGetUserProfile => "mal_get_user_profile",
            ToolKind::CombinedSearch => "combined_search",
        }
    }

    /// Look a tool up by wire name
    pub fn from_name(name: &str) -> Option<ToolKind> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Human-readable description shown to clients
    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::SearchAnime => "Search HiAnime by keyword",
            ToolKind::GetPopularAnime => "Most popular anime on HiAnime",
            ToolKind::GetTopAiringAnime => "Top anime currently airing",
            ToolKind::GetRecentlyUpdatedAnime => "Anime with recently released episodes",
            ToolKind::GetCompletedAnime => "Anime that have finished airing",
            ToolKind::GetSubbedAnime => "Anime available with subtitles",
            ToolKind::GetDubbedAnime => "Anime available with an English dub",
            ToolKind::GetAnimeByGenre => "Browse anime of one genre (see get_available_filters)",
            ToolKind::GetAnimeByType => "Browse anime of one type: movie, tv, ova, ona, special or music",
            ToolKind::GetAnimeDetails => "Full details for one anime by its HiAnime slug",
            ToolKind::GetAnimeEpisodes => "Episode list for an anime by its HiAnime slug",
            ToolKind::GetEpisodeInfo => "Details of a single episode by slug and episode number",
            ToolKind::GetAnimeAzList => "Anime titles starting with a letter, or 'other' for non-alphabetic titles",
            ToolKind::GetAnimeByProducer => "Anime from a producer or studio, by producer slug (e.g. 'toei-animation')",
            ToolKind::FilterAnime => "Advanced filter combining type, status, rating, minimum score, season, language, genres and sort order",
            ToolKind::CheckApiHealth => "Check whether the HiAnime API is reachable",
            ToolKind::GetAvailableFilters => "Every value accepted by the enum-valued arguments of the other tools",
            ToolKind::MalSearchAnime => "Search MyAnimeList by title (requires a MAL client id)",
            ToolKind::MalGetAnimeDetails => "Full MyAnimeList record for one anime id",
            ToolKind::MalGetAnimeRanking => "MyAnimeList top anime by ranking type",
            ToolKind::MalGetSeasonalAnime => "MyAnimeList anime of one broadcast season; defaults to the current season",
            ToolKind::MalGetAuthUrl => "Start the MyAnimeList OAuth2 PKCE flow. Returns the authorization URL and the code verifier, which must be passed back to mal_exchange_token",
            ToolKind::MalExchangeToken => "Exchange a MyAnimeList authorization code and its code verifier for an access token",
            ToolKind::MalGetUserAnimeList => "A user's MyAnimeList anime list (requires an access token)",
            ToolKind::MalGetUserProfile => "Profile and anime statistics of the access token's owner",
            ToolKind::CombinedSearch => "Search HiAnime and MyAnimeList concurrently and return both result lists side by side",
        }
    }

    /// JSON Schema of the tool's arguments
    pub fn input_schema(&self) -> Value {
        match self {
            ToolKind::SearchAnime => object(
                json!({
                    "keyword": string("Search keyword, e.g. 'naruto'"),
                    "page": page(),
                }),
                &["keyword"],
            ),
            ToolKind::GetPopularAnime
            | ToolKind::GetTopAiringAnime
            | ToolKind::GetRecentlyUpdatedAnime
            | ToolKind::GetCompletedAnime
            | ToolKind::GetSubbedAnime
            | ToolKind::GetDubbedAnime => object(json!({ "page": page() }), &[]),
            ToolKind::GetAnimeByGenre => object(
                json!({
                    "genre": one_of("Genre", GENRES),
                    "page": page(),
                }),
                &["genre"],
            ),
            ToolKind::GetAnimeByType => object(
                json!({
                    "anime_type": one_of("Anime type", TYPES),
                    "page": page(),
                }),
                &["anime_type"],
            ),
            ToolKind::GetAnimeDetails | ToolKind::GetAnimeEpisodes => object(
                json!({ "slug": string("HiAnime slug, e.g. 'one-piece-100'") }),
                &["slug"],
            ),
            ToolKind::GetEpisodeInfo => object(
                json!({
                    "slug": string("HiAnime slug, e.g. 'one-piece-100'"),
                    "episode_number": integer("Episode number, starting at 1", Some(1), None),
                }),
                &["slug", "episode_number"],
            ),
            ToolKind::GetAnimeAzList => object(
                json!({
                    "letter": string("A single letter A-Z, or 'other' for titles starting with a digit or symbol"),
                    "page": page(),
                }),
                &["letter"],
            ),
            ToolKind::GetAnimeByProducer => object(
                json!({
                    "producer_slug": string("Producer slug, e.g. 'toei-animation'"),
                    "page": page(),
                }),
                &["producer_slug"],
            ),
            ToolKind::FilterAnime => object(
                json!({
                    "anime_type": one_of("Type filter", TYPES),
                    "status": one_of("Status filter", STATUSES),
                    "rated": one_of("Age rating filter", RATINGS),
                    "score": integer("Minimum score", Some(1), Some(10)),
                    "season": one_of("Season filter", SEASONS),
                    "language": one_of("Language filter", LANGUAGES),
                    "genres": string("Comma-separated genres, e.g. 'action,adventure,fantasy'"),
                    "sort": one_of("Sort order", SORT_OPTIONS),
                    "page": page(),
                }),
                &[],
            ),
            ToolKind::CheckApiHealth | ToolKind::GetAvailableFilters => object(json!({}), &[]),
            ToolKind::MalSearchAnime => object(
                json!({
                    "query": string("Title to search for"),
                    "client_id": client_id(),
                    "limit": integer("Maximum results (default 10)", Some(1), Some(100)),
                    "offset": offset(),
                }),
                &["query", "client_id"],
            ),
            ToolKind::MalGetAnimeDetails => object(
                json!({
                    "anime_id": integer("MyAnimeList anime id", Some(1), None),
                    "client_id": client_id(),
                }),
                &["anime_id", "client_id"],
            ),
            ToolKind::MalGetAnimeRanking => object(
                json!({
                    "ranking_type": one_of("Ranking type (default 'all')", MAL_RANKING_TYPES),
                    "client_id": client_id(),
                    "limit": integer("Maximum results (default 10)", Some(1), Some(500)),
                    "offset": offset(),
                }),
                &["client_id"],
            ),
            ToolKind::MalGetSeasonalAnime => object(
                json!({
                    "year": integer("Year (default: current year)", Some(1917), None),
                    "season": one_of("Season (default: current season)", SEASONS),
                    "sort": one_of("Sort order", MAL_SEASON_SORTS),
                    "client_id": client_id(),
                    "limit": integer("Maximum results (default 10)", Some(1), Some(500)),
                    "offset": offset(),
                }),
                &["client_id"],
            ),
            ToolKind::MalGetAuthUrl => object(
                json!({
                    "client_id": client_id(),
                    "redirect_uri": string("Redirect URI registered for the MAL application"),
                    "client_secret": string("Client secret, for confidential MAL applications"),
                }),
                &["client_id"],
            ),
            ToolKind::MalExchangeToken => object(
                json!({
                    "client_id": client_id(),
                    "code": string("Authorization code from the redirect"),
                    "code_verifier": string("The code_verifier returned by mal_get_auth_url"),
                    "redirect_uri": string("Redirect URI used in the authorization request"),
                    "client_secret": string("Client secret, for confidential MAL applications"),
                }),
                &["client_id", "code", "code_verifier"],
            ),
            ToolKind::MalGetUserAnimeList => object(
                json!({
                    "access_token": access_token(),
                    "user_name": string("MAL user name (default '@me')"),
                    "status": one_of("List status filter", MAL_LIST_STATUSES),
                    "sort": one_of("Sort order", MAL_LIST_SORTS),
                    "limit": integer("Maximum results (default 10)", Some(1), Some(1000)),
                    "offset": offset(),
                }),
                &["access_token"],
            ),
            ToolKind::MalGetUserProfile => {
                object(json!({ "access_token": access_token() }), &["access_token"])
            }
            ToolKind::CombinedSearch => object(
                json!({
                    "query": string("Title to search for"),
                    "client_id": client_id(),
                    "limit": integer("Maximum results per provider (default 5)", Some(1), Some(100)),
                }),
                &["query", "client_id"],
            ),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn integer(description: &str, minimum: Option<i64>, maximum: Option<i64>) -> Value {
    let mut schema = json!({ "type": "integer", "description": description });
    if let Some(min) = minimum {
        schema["minimum"] = json!(min);
    }
    if let Some(max) = maximum {
        schema["maximum"] = json!(max);
    }
    schema
}

fn one_of(description: &str, values: &[&str]) -> Value {
    json!({ "type": "string", "description": description, "enum": values })
}

fn page() -> Value {
    json!({
        "type": "integer",
        "description": "Page number for pagination",
        "minimum": 1,
        "default": 1
    })
}

fn offset() -> Value {
    integer("Offset into the result list (default 0)", Some(0), None)
}

fn client_id() -> Value {
    string("MyAnimeList API client id")
}

fn access_token() -> Value {
    string("MyAnimeList OAuth2 access token from mal_exchange_token")
}

/// Description of an MCP tool as advertised to clients
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Tool name (e.g., "search_anime")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl From<ToolKind> for Tool {
    fn from(kind: ToolKind) -> Self {
        Tool {
            name: kind.name().to_string(),
            description: kind.description().to_string(),
            input_schema: kind.input_schema(),
        }
    }
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    sources: SourceRegistry,
}

impl ToolRegistry {
    /// Create a tool registry dispatching to the given sources
    pub fn from_sources(sources: SourceRegistry) -> Self {
        Self { sources }
    }

    /// The sources tools dispatch to
    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Get all tools
    pub fn all(&self) -> Vec<Tool> {
        ToolKind::ALL.iter().copied().map(Tool::from).collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Tool> {
        ToolKind::from_name(name).map(Tool::from)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let kind = ToolKind::from_name(name).ok_or_else(|| {
            tracing::warn!("Unknown tool requested: {}", name);
            ToolError::UnknownTool(name.to_string())
        })?;
        self.execute_kind(kind, args).await
    }

    /// Execute a known tool
    pub async fn execute_kind(&self, kind: ToolKind, args: Value) -> Result<Value, ToolError> {
        tracing::info!("Executing tool: {}", kind);
        let result = dispatch(&self.sources, kind, &args).await;
        if let Err(e) = &result {
            tracing::warn!("Tool {} failed ({}): {}", kind, e.kind(), e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique_and_round_trip() {
        let names: HashSet<_> = ToolKind::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), 26);

        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("search_manga"), None);
    }

    #[test]
    fn test_schemas_are_objects() {
        for kind in ToolKind::ALL {
            let schema = kind.input_schema();
            assert_eq!(schema["type"], "object", "{}", kind);

            let properties = schema["properties"].as_object().unwrap();
            for required in schema["required"].as_array().unwrap() {
                let field = required.as_str().unwrap();
                assert!(properties.contains_key(field), "{} requires {}", kind, field);
            }
        }
    }

    #[test]
    fn test_genre_schema_lists_every_genre() {
        let schema = ToolKind::GetAnimeByGenre.input_schema();
        let values = schema["properties"]["genre"]["enum"].as_array().unwrap();
        assert_eq!(values.len(), GENRES.len());
    }

    #[test]
    fn test_tool_serializes_with_input_schema() {
        let tool = Tool::from(ToolKind::CheckApiHealth);
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["name"], "check_api_health");
        assert!(json.get("inputSchema").is_some());
    }
}
