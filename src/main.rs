use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use hianime_mcp::config::{find_config_file, get_config, load_config, Config};
use hianime_mcp::mcp::{McpServer, Tool, ToolRegistry};
use hianime_mcp::normalize::catalog::FILTERS;
use hianime_mcp::sources::SourceRegistry;
use is_terminal::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// HiAnime MCP - Anime discovery over the HiAnime and MyAnimeList APIs
#[derive(Parser, Debug)]
#[command(name = "hianime-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server for anime search and discovery via HiAnime and MyAnimeList", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the configuration)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> OutputFormat {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (for Claude Desktop and other MCP clients)
    Serve {
        /// Run in stdio mode (for MCP clients like Claude Desktop)
        #[arg(long, default_value_t = true)]
        stdio: bool,

        /// Run in streamable HTTP mode (overrides --stdio)
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// List the available tools
    Tools,

    /// Show the values accepted by enum-valued tool arguments
    Filters,

    /// Call a single tool and print its result
    Call {
        /// Tool name, e.g. search_anime
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, short, default_value = "{}")]
        args: String,
    },
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        get_config()?
    };

    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    // Logs go to stderr; stdout carries the stdio transport
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("hianime_mcp={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = resolve_config(&cli)?;
    tracing::debug!(
        "HiAnime base {}, MAL base {}, timeout {}s",
        config.hianime.base_url,
        config.mal.api_base,
        config.http.timeout_secs
    );

    let sources = SourceRegistry::from_config(&config)?;
    let format = cli.output.resolve();

    match cli.command {
        Some(Commands::Serve {
            stdio,
            http,
            port,
            host,
        }) => {
            let server = McpServer::new(sources)?;

            // Use HTTP mode if --http flag is provided, otherwise use --stdio flag
            let use_http = http || !stdio;

            if use_http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                server.run().await?;
            }
        }

        Some(Commands::Tools) => {
            let tools = ToolRegistry::from_sources(sources).all();
            output_tools(&tools, format)?;
        }

        Some(Commands::Filters) => {
            println!("{}", serde_json::to_string_pretty(&FILTERS)?);
        }

        Some(Commands::Call { tool, args }) => {
            let args: serde_json::Value = serde_json::from_str(&args)
                .map_err(|e| anyhow::anyhow!("--args is not valid JSON: {}", e))?;

            let registry = ToolRegistry::from_sources(sources);
            match registry.execute(&tool, args).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(e) => {
                    println!("{}", serde_json::to_string_pretty(&e.envelope())?);
                    std::process::exit(1);
                }
            }
        }

        None => {
            println!("No command provided. Use --help for usage information.");
            println!("Common commands:");
            println!("  serve               - Run the MCP server over stdio");
            println!("  serve --http        - Run the MCP server over HTTP");
            println!("  tools               - List available tools");
            println!("  filters             - Show accepted filter values");
            println!("  call <tool> --args  - Call one tool");
        }
    }

    Ok(())
}

fn output_tools(tools: &[Tool], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Tool", "Required", "Description"]);

            for tool in tools {
                let required = tool.input_schema["required"]
                    .as_array()
                    .map(|fields| {
                        fields
                            .iter()
                            .filter_map(|f| f.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();

                table.add_row(vec![
                    Cell::new(&tool.name).add_attribute(Attribute::Bold),
                    Cell::new(required),
                    Cell::new(&tool.description),
                ]);
            }
            println!("{table}");
        }
        _ => println!("{}", serde_json::to_string_pretty(tools)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["hianime-mcp"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert_eq!(cli.timeout, None);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["hianime-mcp", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["hianime-mcp", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_timeout_overrides_config() {
        let cli = Cli::parse_from(["hianime-mcp", "--timeout", "5", "tools"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.http.timeout_secs, 5);
    }

    #[test]
    fn test_cli_zero_timeout_rejected() {
        let result = Cli::try_parse_from(["hianime-mcp", "--timeout", "0", "tools"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["hianime-mcp", "serve"]);
        match &cli.command {
            Some(Commands::Serve {
                stdio,
                http,
                port,
                host,
            }) => {
                assert!(*stdio);
                assert!(!*http);
                assert_eq!(*port, 3000);
                assert_eq!(host, "127.0.0.1");
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_call_command() {
        let cli = Cli::parse_from([
            "hianime-mcp",
            "call",
            "search_anime",
            "--args",
            r#"{"keyword":"naruto"}"#,
        ]);
        match cli.command {
            Some(Commands::Call { tool, args }) => {
                assert_eq!(tool, "search_anime");
                assert_eq!(args, r#"{"keyword":"naruto"}"#);
            }
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_cli_call_defaults_to_empty_args() {
        let cli = Cli::parse_from(["hianime-mcp", "call", "check_api_health"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Call { ref args, .. }) if args == "{}"
        ));
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["hianime-mcp", "-o", "json", "tools"]);
        assert_eq!(cli.output.resolve(), OutputFormat::Json);
    }
}
