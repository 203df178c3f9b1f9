//! Argument validation and coercion for every tool.
//!
//! Each function here takes the raw JSON arguments of one tool and returns a
//! typed query, or a [`ValidationError`] naming the offending field. Nothing
//! in this module performs I/O, so a rejected call never reaches an upstream.

pub mod catalog;

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{
    AuthUrlRequest, AzLetter, Category, CombinedQuery, FilterQuery, ListQuery, MalListQuery,
    MalRankingQuery, MalSearchQuery, MalSeasonalQuery, SearchQuery, TokenRequest,
};
use crate::sources::MalCredentials;
use catalog::{
    GENRES, LANGUAGES, MAL_LIST_SORTS, MAL_LIST_STATUSES, MAL_RANKING_TYPES, MAL_SEASON_SORTS,
    RATINGS, SEASONS, SORT_OPTIONS, STATUSES, TYPES,
};

/// Largest `limit` accepted by MAL's search endpoint
pub const MAL_SEARCH_MAX_LIMIT: u32 = 100;
/// Largest `limit` accepted by MAL's ranking and seasonal endpoints
pub const MAL_LISTING_MAX_LIMIT: u32 = 500;
/// Largest `limit` accepted by MAL's user anime list endpoint
pub const MAL_USER_LIST_MAX_LIMIT: u32 = 1000;

/// First year MAL has seasonal data for
const MAL_FIRST_SEASON_YEAR: i32 = 1917;

/// Validation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required argument '{field}'")]
    Missing { field: &'static str },

    #[error("Argument '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Invalid {field} '{value}'. Available: {}", .allowed.join(", "))]
    NotAllowed {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("Argument '{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    /// The argument that failed validation
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing { field }
            | ValidationError::WrongType { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::Invalid { field, .. } => field,
        }
    }
}

/// Read-only view over a tool's raw argument object
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Args<'a> {
    /// Wrap raw arguments; `null` is treated as an empty argument object
    pub fn new(value: &'a Value) -> Result<Self, ValidationError> {
        match value {
            Value::Null => Ok(Self { map: None }),
            Value::Object(map) => Ok(Self { map: Some(map) }),
            _ => Err(ValidationError::WrongType {
                field: "arguments",
                expected: "an object",
            }),
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map
            .and_then(|map| map.get(field))
            .filter(|v| !v.is_null())
    }

    /// Optional string, trimmed; blank strings count as absent
    pub fn str(&self, field: &'static str) -> Result<Option<&'a str>, ValidationError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => {
                let s = s.trim();
                Ok((!s.is_empty()).then_some(s))
            }
            Some(_) => Err(ValidationError::WrongType {
                field,
                expected: "a string",
            }),
        }
    }

    /// Required non-blank string, trimmed
    pub fn required_str(&self, field: &'static str) -> Result<&'a str, ValidationError> {
        self.str(field)?.ok_or(ValidationError::Missing { field })
    }

    /// Optional integer; accepts JSON integers, integral floats and integer strings
    pub fn int(&self, field: &'static str) -> Result<Option<i64>, ValidationError> {
        let wrong_type = ValidationError::WrongType {
            field,
            expected: "an integer",
        };

        match self.get(field) {
            None => Ok(None),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Ok(Some(i))
                } else {
                    match n.as_f64() {
                        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                            Ok(Some(f as i64))
                        }
                        _ => Err(wrong_type),
                    }
                }
            }
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| wrong_type),
            Some(_) => Err(wrong_type),
        }
    }

    /// Integer with a default, checked against `min..=max`
    pub fn bounded(
        &self,
        field: &'static str,
        default: i64,
        min: i64,
        max: i64,
    ) -> Result<i64, ValidationError> {
        let value = self.int(field)?.unwrap_or(default);
        if value < min || value > max {
            return Err(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
        Ok(value)
    }

    /// Optional member of an allow-list
    pub fn enum_value(
        &self,
        field: &'static str,
        allowed: &'static [&'static str],
    ) -> Result<Option<&'static str>, ValidationError> {
        match self.str(field)? {
            None => Ok(None),
            Some(value) => catalog::lookup(allowed, value).map(Some).ok_or_else(|| {
                ValidationError::NotAllowed {
                    field,
                    value: value.to_string(),
                    allowed,
                }
            }),
        }
    }

    /// Required member of an allow-list
    pub fn required_enum(
        &self,
        field: &'static str,
        allowed: &'static [&'static str],
    ) -> Result<&'static str, ValidationError> {
        self.enum_value(field, allowed)?
            .ok_or(ValidationError::Missing { field })
    }

    /// 1-based page number, default 1
    pub fn page(&self) -> Result<u32, ValidationError> {
        self.bounded("page", 1, 1, u32::MAX as i64).map(|p| p as u32)
    }
}

/// Reject identifiers that would escape their path segment
fn identifier(field: &'static str, value: &str) -> Result<String, ValidationError> {
    if value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '?' | '#'))
    {
        return Err(ValidationError::Invalid {
            field,
            reason: format!("'{}' contains characters not allowed in an identifier", value),
        });
    }
    if value == "." || value == ".." {
        return Err(ValidationError::Invalid {
            field,
            reason: format!("'{}' is not a valid identifier", value),
        });
    }
    Ok(value.to_string())
}

/// `search_anime`
pub fn search(args: &Args<'_>) -> Result<SearchQuery, ValidationError> {
    let keyword = args.required_str("keyword")?;
    Ok(SearchQuery::new(keyword).page(args.page()?))
}

/// Listing tools that only take a page (popular, top airing, ...)
pub fn listing(args: &Args<'_>, category: Category) -> Result<ListQuery, ValidationError> {
    Ok(ListQuery {
        category,
        page: args.page()?,
    })
}

/// `get_anime_by_genre`
pub fn genre(args: &Args<'_>) -> Result<ListQuery, ValidationError> {
    let genre = args.required_enum("genre", GENRES)?;
    listing(args, Category::Genre(genre))
}

/// `get_anime_by_type`
pub fn anime_type(args: &Args<'_>) -> Result<ListQuery, ValidationError> {
    let kind = args.required_enum("anime_type", TYPES)?;
    listing(args, Category::Type(kind))
}

/// `get_anime_by_producer`
pub fn producer(args: &Args<'_>) -> Result<ListQuery, ValidationError> {
    let slug = identifier("producer_slug", args.required_str("producer_slug")?)?;
    listing(args, Category::Producer(slug))
}

/// `get_anime_az_list`
///
/// A single letter maps to its uppercase bucket; `other` or any single
/// non-alphabetic character maps to the non-alphabetic bucket.
pub fn az_list(args: &Args<'_>) -> Result<ListQuery, ValidationError> {
    let raw = args.required_str("letter")?;
    let letter = parse_letter(raw)?;
    listing(args, Category::Az(letter))
}

fn parse_letter(raw: &str) -> Result<AzLetter, ValidationError> {
    if raw.eq_ignore_ascii_case("other") {
        return Ok(AzLetter::Other);
    }

    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(AzLetter::Letter(c.to_ascii_uppercase())),
        (Some(c), None) if !c.is_alphabetic() => Ok(AzLetter::Other),
        _ => Err(ValidationError::Invalid {
            field: "letter",
            reason: format!(
                "'{}' is not a single letter A-Z or 'other' for non-alphabetic titles",
                raw
            ),
        }),
    }
}

/// `get_anime_details` and `get_anime_episodes`
pub fn slug(args: &Args<'_>) -> Result<String, ValidationError> {
    identifier("slug", args.required_str("slug")?)
}

/// `get_episode_info`
pub fn episode(args: &Args<'_>) -> Result<(String, u32), ValidationError> {
    let slug = slug(args)?;
    let number = args
        .int("episode_number")?
        .ok_or(ValidationError::Missing {
            field: "episode_number",
        })?;
    if number < 1 || number > u32::MAX as i64 {
        return Err(ValidationError::OutOfRange {
            field: "episode_number",
            value: number,
            min: 1,
            max: u32::MAX as i64,
        });
    }
    Ok((slug, number as u32))
}

/// `filter_anime`
pub fn filter(args: &Args<'_>) -> Result<FilterQuery, ValidationError> {
    let score = match args.int("score")? {
        None => None,
        Some(value) if (1..=10).contains(&value) => Some(value as u8),
        Some(value) => {
            return Err(ValidationError::OutOfRange {
                field: "score",
                value,
                min: 1,
                max: 10,
            })
        }
    };

    let mut genres = std::collections::BTreeSet::new();
    if let Some(raw) = args.str("genres")? {
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let genre =
                catalog::lookup(GENRES, part).ok_or_else(|| ValidationError::NotAllowed {
                    field: "genres",
                    value: part.to_string(),
                    allowed: GENRES,
                })?;
            genres.insert(genre);
        }
    }

    Ok(FilterQuery {
        kind: args.enum_value("anime_type", TYPES)?,
        status: args.enum_value("status", STATUSES)?,
        rated: args.enum_value("rated", RATINGS)?,
        score,
        season: args.enum_value("season", SEASONS)?,
        language: args.enum_value("language", LANGUAGES)?,
        genres,
        sort: args.enum_value("sort", SORT_OPTIONS)?,
        page: args.page()?,
    })
}

/// Public MAL calls authenticate with the caller's client id
pub fn mal_client_id(args: &Args<'_>) -> Result<MalCredentials, ValidationError> {
    Ok(MalCredentials::ClientId(
        args.required_str("client_id")?.to_string(),
    ))
}

/// User-scoped MAL calls authenticate with the caller's access token
pub fn mal_access_token(args: &Args<'_>) -> Result<MalCredentials, ValidationError> {
    Ok(MalCredentials::Bearer(
        args.required_str("access_token")?.to_string(),
    ))
}

fn limit(args: &Args<'_>, default: u32, max: u32) -> Result<u32, ValidationError> {
    args.bounded("limit", default as i64, 1, max as i64)
        .map(|v| v as u32)
}

fn offset(args: &Args<'_>) -> Result<u32, ValidationError> {
    args.bounded("offset", 0, 0, u32::MAX as i64).map(|v| v as u32)
}

/// `mal_search_anime`
pub fn mal_search(args: &Args<'_>) -> Result<MalSearchQuery, ValidationError> {
    Ok(MalSearchQuery {
        query: args.required_str("query")?.to_string(),
        limit: limit(args, 10, MAL_SEARCH_MAX_LIMIT)?,
        offset: offset(args)?,
    })
}

/// `mal_get_anime_details`
pub fn mal_anime_id(args: &Args<'_>) -> Result<u64, ValidationError> {
    let id = args.int("anime_id")?.ok_or(ValidationError::Missing {
        field: "anime_id",
    })?;
    if id < 1 {
        return Err(ValidationError::OutOfRange {
            field: "anime_id",
            value: id,
            min: 1,
            max: i64::MAX,
        });
    }
    Ok(id as u64)
}

/// `mal_get_anime_ranking`
pub fn mal_ranking(args: &Args<'_>) -> Result<MalRankingQuery, ValidationError> {
    Ok(MalRankingQuery {
        ranking_type: args
            .enum_value("ranking_type", MAL_RANKING_TYPES)?
            .unwrap_or("all"),
        limit: limit(args, 10, MAL_LISTING_MAX_LIMIT)?,
        offset: offset(args)?,
    })
}

/// Season containing `date`, using MAL's quarter boundaries
pub fn season_of(date: NaiveDate) -> &'static str {
    match date.month() {
        1..=3 => "winter",
        4..=6 => "spring",
        7..=9 => "summer",
        _ => "fall",
    }
}

/// `mal_get_seasonal_anime`; `year` and `season` default to those of `today`
pub fn mal_seasonal(args: &Args<'_>, today: NaiveDate) -> Result<MalSeasonalQuery, ValidationError> {
    let this_year = today.year();
    let year = args.bounded(
        "year",
        this_year as i64,
        MAL_FIRST_SEASON_YEAR as i64,
        this_year as i64 + 1,
    )? as i32;

    Ok(MalSeasonalQuery {
        year,
        season: args
            .enum_value("season", SEASONS)?
            .unwrap_or_else(|| season_of(today)),
        sort: args.enum_value("sort", MAL_SEASON_SORTS)?,
        limit: limit(args, 10, MAL_LISTING_MAX_LIMIT)?,
        offset: offset(args)?,
    })
}

/// `mal_get_user_anime_list`
pub fn mal_user_list(args: &Args<'_>) -> Result<MalListQuery, ValidationError> {
    let user_name = match args.str("user_name")? {
        Some(name) => identifier("user_name", name)?,
        None => "@me".to_string(),
    };

    Ok(MalListQuery {
        user_name,
        status: args.enum_value("status", MAL_LIST_STATUSES)?,
        sort: args.enum_value("sort", MAL_LIST_SORTS)?,
        limit: limit(args, 10, MAL_USER_LIST_MAX_LIMIT)?,
        offset: offset(args)?,
    })
}

fn redirect_uri(args: &Args<'_>) -> Result<Option<String>, ValidationError> {
    match args.str("redirect_uri")? {
        None => Ok(None),
        Some(raw) => url::Url::parse(raw)
            .map(|_| Some(raw.to_string()))
            .map_err(|e| ValidationError::Invalid {
                field: "redirect_uri",
                reason: e.to_string(),
            }),
    }
}

/// `mal_get_auth_url`
pub fn auth_url(args: &Args<'_>) -> Result<AuthUrlRequest, ValidationError> {
    Ok(AuthUrlRequest {
        client_id: args.required_str("client_id")?.to_string(),
        redirect_uri: redirect_uri(args)?,
        client_secret: args.str("client_secret")?.map(str::to_string),
    })
}

/// `mal_exchange_token`
///
/// The verifier is passed through as given; whether it matches the
/// authorization request is for MAL to decide.
pub fn token_request(args: &Args<'_>) -> Result<TokenRequest, ValidationError> {
    let code_verifier = args.required_str("code_verifier")?;

    Ok(TokenRequest {
        client_id: args.required_str("client_id")?.to_string(),
        code: args.required_str("code")?.to_string(),
        code_verifier: code_verifier.to_string(),
        redirect_uri: redirect_uri(args)?,
        client_secret: args.str("client_secret")?.map(str::to_string),
    })
}

/// `combined_search`
pub fn combined(args: &Args<'_>) -> Result<CombinedQuery, ValidationError> {
    Ok(CombinedQuery {
        query: args.required_str("query")?.to_string(),
        limit: limit(args, 5, MAL_SEARCH_MAX_LIMIT)? as usize,
        client_id: args.required_str("client_id")?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with<T>(
        value: Value,
        f: impl FnOnce(&Args<'_>) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        let args = Args::new(&value)?;
        f(&args)
    }

    #[test]
    fn test_search_defaults_page() {
        let query = with(json!({"keyword": "  naruto "}), search).unwrap();
        assert_eq!(query.keyword, "naruto");
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_search_requires_keyword() {
        let err = with(json!({"keyword": "   "}), search).unwrap_err();
        assert_eq!(err, ValidationError::Missing { field: "keyword" });
    }

    #[test]
    fn test_page_must_be_positive() {
        let err = with(json!({"keyword": "x", "page": 0}), search).unwrap_err();
        assert_eq!(err.field(), "page");
    }

    #[test]
    fn test_page_accepts_numeric_string() {
        let query = with(json!({"keyword": "x", "page": "3"}), search).unwrap();
        assert_eq!(query.page, 3);
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let err = Args::new(&json!([1, 2])).unwrap_err();
        assert_eq!(err.field(), "arguments");
    }

    #[test]
    fn test_unknown_genre_rejected() {
        let err = with(json!({"genre": "not-a-genre"}), genre).unwrap_err();
        assert_eq!(err.field(), "genre");
        assert!(err.to_string().contains("martial-arts"));
    }

    #[test]
    fn test_genre_normalized_to_canonical_case() {
        let query = with(json!({"genre": "Slice-Of-Life"}), genre).unwrap();
        assert_eq!(query.category, Category::Genre("slice-of-life"));
    }

    #[test]
    fn test_anime_type_rejected() {
        let err = with(json!({"anime_type": "manga"}), anime_type).unwrap_err();
        assert_eq!(err.field(), "anime_type");
    }

    #[test]
    fn test_letter_buckets() {
        let letter = with(json!({"letter": "a"}), az_list).unwrap();
        assert_eq!(letter.category, Category::Az(AzLetter::Letter('A')));

        let digit = with(json!({"letter": "1"}), az_list).unwrap();
        assert_eq!(digit.category, Category::Az(AzLetter::Other));

        let other = with(json!({"letter": "OTHER"}), az_list).unwrap();
        assert_eq!(other.category, Category::Az(AzLetter::Other));
    }

    #[test]
    fn test_letter_rejects_words() {
        let err = with(json!({"letter": "ab"}), az_list).unwrap_err();
        assert_eq!(err.field(), "letter");
    }

    #[test]
    fn test_slug_rejects_path_separators() {
        let err = with(json!({"slug": "../admin"}), slug).unwrap_err();
        assert_eq!(err.field(), "slug");
    }

    #[test]
    fn test_episode_number_required() {
        let err = with(json!({"slug": "naruto-677"}), episode).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Missing {
                field: "episode_number"
            }
        );
    }

    #[test]
    fn test_filter_score_out_of_range() {
        let err = with(json!({"score": 11}), filter).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "score",
                value: 11,
                min: 1,
                max: 10
            }
        );
    }

    #[test]
    fn test_filter_genres_become_set() {
        let query = with(
            json!({"score": 8, "genres": "action, Fantasy,action"}),
            filter,
        )
        .unwrap();
        assert_eq!(query.score, Some(8));
        assert_eq!(
            query.genres.into_iter().collect::<Vec<_>>(),
            vec!["action", "fantasy"]
        );
    }

    #[test]
    fn test_filter_rejects_unknown_genre_in_list() {
        let err = with(json!({"genres": "action,cooking"}), filter).unwrap_err();
        assert_eq!(err.field(), "genres");
    }

    #[test]
    fn test_filter_blank_enum_is_absent() {
        let query = with(json!({"status": "", "language": "DUB"}), filter).unwrap();
        assert_eq!(query.status, None);
        assert_eq!(query.language, Some("dub"));
    }

    #[test]
    fn test_mal_search_limit_bounds() {
        let err = with(json!({"query": "naruto", "limit": 0}), mal_search).unwrap_err();
        assert_eq!(err.field(), "limit");

        let err = with(json!({"query": "naruto", "limit": 101}), mal_search).unwrap_err();
        assert_eq!(err.field(), "limit");
    }

    #[test]
    fn test_mal_ranking_defaults_to_all() {
        let query = with(json!({}), mal_ranking).unwrap();
        assert_eq!(query.ranking_type, "all");
        assert_eq!(query.limit, 10);
    }

    #[test]
    fn test_mal_seasonal_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        let query = mal_seasonal(&Args::new(&json!({})).unwrap(), today).unwrap();
        assert_eq!(query.year, 2024);
        assert_eq!(query.season, "summer");
    }

    #[test]
    fn test_mal_seasonal_rejects_far_future() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = mal_seasonal(&Args::new(&json!({"year": 2030})).unwrap(), today).unwrap_err();
        assert_eq!(err.field(), "year");
    }

    #[test]
    fn test_user_list_defaults_to_token_owner() {
        let query = with(json!({"status": "Plan_To_Watch"}), mal_user_list).unwrap();
        assert_eq!(query.user_name, "@me");
        assert_eq!(query.status, Some("plan_to_watch"));
    }

    #[test]
    fn test_token_request_passes_any_verifier_through() {
        let request = with(
            json!({"client_id": "x", "code": "c", "code_verifier": " wrong "}),
            token_request,
        )
        .unwrap();
        assert_eq!(request.code_verifier, "wrong");

        let err = with(
            json!({"client_id": "x", "code": "c", "code_verifier": "  "}),
            token_request,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::Missing { field: "code_verifier" });
    }

    #[test]
    fn test_auth_url_rejects_bad_redirect() {
        let err = with(
            json!({"client_id": "x", "redirect_uri": "not a url"}),
            auth_url,
        )
        .unwrap_err();
        assert_eq!(err.field(), "redirect_uri");
    }

    #[test]
    fn test_combined_defaults_limit() {
        let query = with(json!({"query": "naruto", "client_id": "abc"}), combined).unwrap();
        assert_eq!(query.limit, 5);
    }
}
