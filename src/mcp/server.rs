//! MCP server implementation using pmcp (Pragmatic AI's rust-mcp-sdk).
//!
//! This module provides the MCP server implementation using the pmcp crate
//! for proper JSON-RPC handling over stdio and streamable HTTP.

use crate::mcp::error::ToolError;
use crate::mcp::tools::{ToolKind, ToolRegistry};
use crate::sources::SourceRegistry;
use async_trait::async_trait;
use pmcp::{
    server::streamable_http_server::StreamableHttpServer, Error, RequestHandlerExtra, Server,
    ServerCapabilities, ToolHandler, ToolInfo,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Server name advertised during initialization
pub const SERVER_NAME: &str = "hianime-mcp";

/// The MCP server for HiAnime and MyAnimeList
#[derive(Debug, Clone)]
pub struct McpServer {
    server: Arc<Mutex<Server>>,
    tools: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with the given source registry
    pub fn new(sources: SourceRegistry) -> Result<Self, pmcp::Error> {
        let tools = Arc::new(ToolRegistry::from_sources(sources));
        let server = Self::build_server_impl(&tools)?;
        Ok(Self {
            server: Arc::new(Mutex::new(server)),
            tools,
        })
    }

    /// Get the tool registry
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Build the MCP server with one handler per tool
    fn build_server_impl(tools: &Arc<ToolRegistry>) -> Result<Server, pmcp::Error> {
        let mut builder = Server::builder()
            .name(SERVER_NAME)
            .version(env!("CARGO_PKG_VERSION"))
            .capabilities(ServerCapabilities::default());

        for kind in ToolKind::ALL {
            let tool_handler = ToolWrapper {
                kind,
                tools: tools.clone(),
            };
            builder = builder.tool(kind.name().to_string(), tool_handler);
        }

        builder.build()
    }

    /// Run the server in stdio mode (for Claude Desktop and other MCP clients)
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!("Starting MCP server in stdio mode");

        // run_stdio() takes ownership of the Server
        let server = Arc::try_unwrap(self.server)
            .map_err(|_| Error::internal("Cannot unwrap Arc - multiple references exist"))?
            .into_inner();

        tracing::info!("MCP server initialized with {} tools", ToolKind::ALL.len());

        server.run_stdio().await
    }

    /// Run the server in streamable HTTP mode
    pub async fn run_http(&self, addr: &str) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        tracing::info!("Starting MCP server in HTTP mode on {}", addr);

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::invalid_params(format!("Invalid address: {}", e)))?;

        let http_server = StreamableHttpServer::new(socket_addr, self.server.clone());
        http_server.start().await
    }
}

/// Adapts one [`ToolKind`] to pmcp's ToolHandler
#[derive(Debug, Clone)]
struct ToolWrapper {
    kind: ToolKind,
    tools: Arc<ToolRegistry>,
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> Result<Value, Error> {
        self.tools
            .execute_kind(self.kind, args)
            .await
            .map_err(|e| to_protocol_error(&e))
    }

    fn metadata(&self) -> Option<ToolInfo> {
        Some(ToolInfo::new(
            self.kind.name().to_string(),
            Some(self.kind.description().to_string()),
            self.kind.input_schema(),
        ))
    }
}

/// The envelope travels as the error message, serialized as JSON
fn to_protocol_error(err: &ToolError) -> Error {
    let envelope = err.envelope().to_string();
    match err {
        ToolError::Validation(_) => Error::invalid_params(envelope),
        _ => Error::internal(envelope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_server_builds_with_every_tool() {
        let sources = SourceRegistry::from_config(&Config::default()).unwrap();
        let server = McpServer::new(sources).unwrap();
        assert_eq!(server.tools().all().len(), 26);
    }

    #[test]
    fn test_metadata_matches_kind() {
        let sources = SourceRegistry::from_config(&Config::default()).unwrap();
        let wrapper = ToolWrapper {
            kind: ToolKind::FilterAnime,
            tools: Arc::new(ToolRegistry::from_sources(sources)),
        };
        let info = wrapper.metadata().unwrap();
        assert_eq!(info.name, "filter_anime");
        assert_eq!(info.input_schema["type"], "object");
    }
}
