//! Core data models for anime records, queries and tool outcomes.

mod anime;
mod auth;
mod outcome;
mod query;

pub use anime::{
    AnimeDetails, AnimeSummary, Episode, ListStatus, Page, Pagination, Provider, UserListEntry,
    UserProfile,
};
pub use auth::{AuthArtifact, TokenArtifact};
pub use outcome::{BranchOutcome, CombinedResult, ErrorDescriptor, ErrorKind};
pub use query::{
    AuthUrlRequest, AzLetter, Category, CombinedQuery, FilterQuery, ListQuery, MalListQuery,
    MalRankingQuery, MalSearchQuery, MalSeasonalQuery, SearchQuery, TokenRequest,
};
