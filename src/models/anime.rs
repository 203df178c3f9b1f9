//! Normalized anime records shared by both providers.

use serde::{Deserialize, Serialize};

/// The upstream provider a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    HiAnime,
    Mal,
}

impl Provider {
    /// Returns the display name of the provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::HiAnime => "HiAnime",
            Provider::Mal => "MyAnimeList",
        }
    }

    /// Returns the provider identifier
    pub fn id(&self) -> &'static str {
        match self {
            Provider::HiAnime => "hianime",
            Provider::Mal => "mal",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A provider-agnostic anime record
///
/// HiAnime records are identified by slug, MAL records by their numeric id
/// rendered as a string. The two id spaces never overlap or cross-reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeSummary {
    /// Slug (HiAnime) or numeric id (MAL)
    pub id: String,

    /// Display title
    pub title: String,

    /// Media type (tv, movie, ova, ...)
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Airing status
    pub status: Option<String>,

    /// Mean score, when the provider reports one
    pub score: Option<f64>,

    /// Genres in provider order
    #[serde(default)]
    pub genres: Vec<String>,

    /// Total episode count, when known
    pub episode_count: Option<u32>,

    /// Which provider produced this record
    pub source: Provider,

    /// Canonical page for the anime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Subbed episodes available (HiAnime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes_sub: Option<u32>,

    /// Dubbed episodes available (HiAnime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes_dub: Option<u32>,

    /// Episode duration as reported upstream (HiAnime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    /// Ranking position (MAL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,

    /// Cover image (MAL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl AnimeSummary {
    /// Create a summary with only the required fields set
    pub fn new(id: impl Into<String>, title: impl Into<String>, source: Provider) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: None,
            status: None,
            score: None,
            genres: Vec::new(),
            episode_count: None,
            source,
            url: None,
            episodes_sub: None,
            episodes_dub: None,
            duration: None,
            rank: None,
            image_url: None,
        }
    }
}

/// Full details for a single anime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeDetails {
    #[serde(flatten)]
    pub summary: AnimeSummary,

    pub japanese_title: Option<String>,

    pub synopsis: Option<String>,

    pub aired: Option<String>,

    pub season: Option<String>,

    /// Age rating (g, pg-13, ...)
    pub rating: Option<String>,

    #[serde(default)]
    pub studios: Vec<String>,

    #[serde(default)]
    pub producers: Vec<String>,
}

/// One episode of an anime (HiAnime)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub number: u32,
    pub title: Option<String>,
    pub japanese_title: Option<String>,
    pub id: Option<String>,
    pub url: Option<String>,
    pub is_filler: bool,
}

/// Pagination metadata so callers can request the next page deterministically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number of this response
    pub current_page: u32,

    /// Total pages, when the provider reports it
    pub total_pages: Option<u32>,

    /// Whether another page can be requested
    pub has_next_page: bool,

    /// Number of items on this page
    pub count: usize,
}

/// A page of results with its pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Build a page, deriving `count` from the items
    pub fn new(items: Vec<T>, current_page: u32, total_pages: Option<u32>, has_next_page: bool) -> Self {
        let count = items.len();
        Self {
            items,
            pagination: Pagination {
                current_page,
                total_pages,
                has_next_page,
                count,
            },
        }
    }
}

/// A user's list state for one anime (MAL)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListStatus {
    pub status: Option<String>,
    pub score: Option<u32>,
    pub num_episodes_watched: Option<u32>,
    pub updated_at: Option<String>,
}

/// An entry of a MAL user's anime list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserListEntry {
    pub anime: AnimeSummary,
    pub list_status: Option<ListStatus>,
}

/// A MAL user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub joined_at: Option<String>,
    pub location: Option<String>,
    pub anime_statistics: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_type_field() {
        let mut summary = AnimeSummary::new("naruto-677", "Naruto", Provider::HiAnime);
        summary.kind = Some("TV".to_string());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "TV");
        assert_eq!(json["source"], "hianime");
        assert!(json.get("rank").is_none());
    }

    #[test]
    fn test_page_counts_items() {
        let page = Page::new(vec![1, 2, 3], 2, Some(5), true);
        assert_eq!(page.pagination.count, 3);
        assert_eq!(page.pagination.current_page, 2);
        assert!(page.pagination.has_next_page);
    }
}
