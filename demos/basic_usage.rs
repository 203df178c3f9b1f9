//! Basic usage example for the HiAnime MCP library.
//!
//! This example calls a few tools directly through the tool registry, without
//! running an MCP server. Pass a MAL client id as the first argument to
//! include MyAnimeList in a combined search:
//!
//! ```text
//! cargo run --example basic_usage -- <client-id>
//! ```

use hianime_mcp::config::get_config;
use hianime_mcp::mcp::ToolRegistry;
use hianime_mcp::sources::SourceRegistry;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = get_config()?;
    let tools = ToolRegistry::from_sources(SourceRegistry::from_config(&config)?);

    println!("{} tools available", tools.all().len());

    let health = tools.execute("check_api_health", json!({})).await?;
    println!("HiAnime API healthy: {}\n", health["healthy"]);

    match tools
        .execute("search_anime", json!({ "keyword": "frieren" }))
        .await
    {
        Ok(page) => {
            for (i, anime) in page["items"].as_array().into_iter().flatten().take(5).enumerate() {
                println!("{}. {} ({})", i + 1, anime["title"], anime["id"]);
            }
        }
        Err(e) => eprintln!("Search failed: {}", e.envelope()),
    }

    if let Some(client_id) = std::env::args().nth(1) {
        let combined = tools
            .execute(
                "combined_search",
                json!({ "query": "frieren", "client_id": client_id, "limit": 3 }),
            )
            .await;
        match combined {
            Ok(result) => println!("\n{}", serde_json::to_string_pretty(&result)?),
            Err(e) => eprintln!("Combined search failed: {}", e.envelope()),
        }
    }

    Ok(())
}
