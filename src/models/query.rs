//! Normalized, validated queries produced from raw tool arguments.
//!
//! Every enum-valued field holds a `&'static str` borrowed from the allow-lists
//! in [`crate::normalize::catalog`], so a query that exists has already passed
//! validation.

use serde::Serialize;
use std::collections::BTreeSet;

/// Keyword search (HiAnime)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub keyword: String,
    pub page: u32,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            page: 1,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// First-letter bucket of the A-Z listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AzLetter {
    /// An uppercase ASCII letter
    Letter(char),
    /// Titles starting with a digit or symbol
    Other,
}

impl AzLetter {
    /// Path segment used by the HiAnime API
    pub fn path_segment(&self) -> String {
        match self {
            AzLetter::Letter(c) => c.to_string(),
            AzLetter::Other => "other".to_string(),
        }
    }
}

/// A HiAnime listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "category", content = "value", rename_all = "snake_case")]
pub enum Category {
    Popular,
    TopAiring,
    RecentlyUpdated,
    Completed,
    Subbed,
    Dubbed,
    Genre(&'static str),
    Type(&'static str),
    Producer(String),
    Az(AzLetter),
}

impl Category {
    /// Endpoint path relative to the API base
    pub fn path(&self) -> String {
        match self {
            Category::Popular => "/api/popular".to_string(),
            Category::TopAiring => "/api/top-airing".to_string(),
            Category::RecentlyUpdated => "/api/recently-updated".to_string(),
            Category::Completed => "/api/completed".to_string(),
            Category::Subbed => "/api/subbed".to_string(),
            Category::Dubbed => "/api/dubbed".to_string(),
            Category::Genre(genre) => format!("/api/genre/{}", genre),
            Category::Type(kind) => format!("/api/type/{}", kind),
            Category::Producer(slug) => format!("/api/producer/{}", urlencoding::encode(slug)),
            Category::Az(letter) => format!("/api/az/{}", letter.path_segment()),
        }
    }
}

/// A paged HiAnime listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub category: Category,
    pub page: u32,
}

/// Advanced HiAnime filter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterQuery {
    #[serde(rename = "type")]
    pub kind: Option<&'static str>,
    pub status: Option<&'static str>,
    pub rated: Option<&'static str>,
    pub score: Option<u8>,
    pub season: Option<&'static str>,
    pub language: Option<&'static str>,
    pub genres: BTreeSet<&'static str>,
    pub sort: Option<&'static str>,
    pub page: u32,
}

impl FilterQuery {
    /// Query-string parameters for `/api/filter`, omitting unset filters
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string())];

        let optional = [
            ("type", self.kind),
            ("status", self.status),
            ("rated", self.rated),
            ("season", self.season),
            ("language", self.language),
            ("sort", self.sort),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.push((key, value.to_string()));
            }
        }

        if let Some(score) = self.score {
            params.push(("score", score.to_string()));
        }
        if !self.genres.is_empty() {
            let genres: Vec<&str> = self.genres.iter().copied().collect();
            params.push(("genres", genres.join(",")));
        }

        params
    }
}

/// MAL keyword search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalSearchQuery {
    pub query: String,
    pub limit: u32,
    pub offset: u32,
}

/// MAL ranking listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalRankingQuery {
    pub ranking_type: &'static str,
    pub limit: u32,
    pub offset: u32,
}

/// MAL seasonal listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalSeasonalQuery {
    pub year: i32,
    pub season: &'static str,
    pub sort: Option<&'static str>,
    pub limit: u32,
    pub offset: u32,
}

/// A MAL user's anime list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalListQuery {
    /// User name, or `@me` for the token owner
    pub user_name: String,
    pub status: Option<&'static str>,
    pub sort: Option<&'static str>,
    pub limit: u32,
    pub offset: u32,
}

/// Search both providers side by side
#[derive(Clone, PartialEq, Eq)]
pub struct CombinedQuery {
    pub query: String,
    pub limit: usize,
    pub client_id: String,
}

impl std::fmt::Debug for CombinedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedQuery")
            .field("query", &self.query)
            .field("limit", &self.limit)
            .field("client_id", &"<redacted>")
            .finish()
    }
}

/// Inputs for building a MAL authorization URL
#[derive(Clone, PartialEq, Eq)]
pub struct AuthUrlRequest {
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for AuthUrlRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthUrlRequest")
            .field("client_id", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Inputs for exchanging an authorization code for tokens
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub client_id: String,
    pub code: String,
    pub code_verifier: String,
    pub redirect_uri: Option<String>,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("client_id", &"<redacted>")
            .field("code", &"<redacted>")
            .field("code_verifier", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_az_path_segments() {
        assert_eq!(Category::Az(AzLetter::Letter('A')).path(), "/api/az/A");
        assert_eq!(Category::Az(AzLetter::Other).path(), "/api/az/other");
    }

    #[test]
    fn test_producer_path_is_encoded() {
        let category = Category::Producer("studio pierrot".to_string());
        assert_eq!(category.path(), "/api/producer/studio%20pierrot");
    }

    #[test]
    fn test_filter_params_skip_unset_fields() {
        let query = FilterQuery {
            score: Some(8),
            genres: ["fantasy", "action"].into_iter().collect(),
            page: 2,
            ..Default::default()
        };

        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("page", "2".to_string()),
                ("score", "8".to_string()),
                ("genres", "action,fantasy".to_string()),
            ]
        );
    }

    #[test]
    fn test_token_request_debug_redacts_secrets() {
        let request = TokenRequest {
            client_id: "client".to_string(),
            code: "secret-code".to_string(),
            code_verifier: "secret-verifier".to_string(),
            redirect_uri: None,
            client_secret: Some("shh".to_string()),
        };
        let debug = format!("{:?}", request);
        assert!(!debug.contains("secret-code"));
        assert!(!debug.contains("secret-verifier"));
        assert!(!debug.contains("shh"));
    }
}
