//! Closed allow-lists for every enum-valued tool argument.
//!
//! These tables are the single source of truth: the normalizer validates
//! against them and `get_available_filters` returns them verbatim.

use serde::Serialize;

pub const GENRES: &[&str] = &[
    "action",
    "adventure",
    "cars",
    "comedy",
    "dementia",
    "demons",
    "drama",
    "ecchi",
    "fantasy",
    "game",
    "harem",
    "historical",
    "horror",
    "isekai",
    "josei",
    "kids",
    "magic",
    "martial-arts",
    "mecha",
    "military",
    "music",
    "mystery",
    "parody",
    "police",
    "psychological",
    "romance",
    "samurai",
    "school",
    "sci-fi",
    "seinen",
    "shoujo",
    "shoujo-ai",
    "shounen",
    "shounen-ai",
    "slice-of-life",
    "space",
    "sports",
    "super-power",
    "supernatural",
    "thriller",
    "vampire",
];

pub const TYPES: &[&str] = &["movie", "tv", "ova", "ona", "special", "music"];

pub const STATUSES: &[&str] = &["finished", "airing", "upcoming"];

pub const RATINGS: &[&str] = &["g", "pg", "pg-13", "r", "r+", "rx"];

pub const SEASONS: &[&str] = &["spring", "summer", "fall", "winter"];

pub const SORT_OPTIONS: &[&str] = &[
    "default",
    "recently_added",
    "recently_updated",
    "score",
    "name_az",
    "released_date",
    "most_watched",
];

pub const LANGUAGES: &[&str] = &["sub", "dub"];

pub const MAL_RANKING_TYPES: &[&str] = &[
    "all",
    "airing",
    "upcoming",
    "tv",
    "ova",
    "movie",
    "special",
    "bypopularity",
    "favorite",
];

pub const MAL_LIST_STATUSES: &[&str] = &[
    "watching",
    "completed",
    "on_hold",
    "dropped",
    "plan_to_watch",
];

pub const MAL_SEASON_SORTS: &[&str] = &["anime_score", "anime_num_list_users"];

pub const MAL_LIST_SORTS: &[&str] = &[
    "list_score",
    "list_updated_at",
    "anime_title",
    "anime_start_date",
];

/// Every allow-list, grouped for discovery by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterCatalog {
    pub genres: &'static [&'static str],
    pub types: &'static [&'static str],
    pub statuses: &'static [&'static str],
    pub ratings: &'static [&'static str],
    pub seasons: &'static [&'static str],
    pub sort_options: &'static [&'static str],
    pub languages: &'static [&'static str],
    pub mal_ranking_types: &'static [&'static str],
    pub mal_list_statuses: &'static [&'static str],
    pub mal_season_sorts: &'static [&'static str],
    pub mal_list_sorts: &'static [&'static str],
}

pub static FILTERS: FilterCatalog = FilterCatalog {
    genres: GENRES,
    types: TYPES,
    statuses: STATUSES,
    ratings: RATINGS,
    seasons: SEASONS,
    sort_options: SORT_OPTIONS,
    languages: LANGUAGES,
    mal_ranking_types: MAL_RANKING_TYPES,
    mal_list_statuses: MAL_LIST_STATUSES,
    mal_season_sorts: MAL_SEASON_SORTS,
    mal_list_sorts: MAL_LIST_SORTS,
};

/// Case-insensitive lookup returning the canonical `'static` entry
pub fn lookup(allowed: &'static [&'static str], value: &str) -> Option<&'static str> {
    let value = value.trim();
    allowed
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(value))
}
