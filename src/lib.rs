//! # HiAnime MCP
//!
//! A Model Context Protocol (MCP) server for anime search and discovery over
//! the HiAnime REST API and the MyAnimeList v2 API.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (AnimeSummary, queries, error descriptors)
//! - [`normalize`]: Argument validation against the fixed allow-lists
//! - [`sources`]: Provider adapters, MAL OAuth2 helpers and the combined search
//! - [`mcp`]: Tool registry, dispatcher and MCP server
//! - [`utils`]: HTTP client and request helpers
//! - [`config`]: Configuration management

pub mod config;
pub mod mcp;
pub mod models;
pub mod normalize;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use mcp::{McpServer, ToolError, ToolRegistry};
pub use models::AnimeSummary;
pub use sources::SourceRegistry;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
