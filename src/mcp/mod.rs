//! MCP (Model Context Protocol) implementation.
//!
//! [`ToolRegistry`] owns the closed set of tools and routes each call through
//! argument validation to an adapter; [`McpServer`] exposes it over pmcp.

mod dispatch;
mod error;
pub mod server;
mod tools;

pub use dispatch::dispatch;
pub use error::ToolError;
pub use server::McpServer;
pub use tools::{Tool, ToolKind, ToolRegistry};
