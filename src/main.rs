//! Teradata MCP Server
//!
//! A Model Context Protocol (MCP) server for Teradata. Provides tools for
//! querying, administration, data quality, security, and RAG workflows
//! against a Teradata system.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use teradata_mcp_server::config::{parse_mcp_path, Config, Transport};
use teradata_mcp_server::error::Result;
use teradata_mcp_server::mcp::http;
use teradata_mcp_server::mcp::server::McpServer;
use teradata_mcp_server::td::client::TdClient;
use teradata_mcp_server::td::custom::CustomDefinitions;

/// Teradata MCP Server
#[derive(Parser)]
#[command(name = "teradata-mcp-server")]
#[command(author, version, about = "Teradata MCP Server - A Model Context Protocol server for Teradata")]
struct Cli {
    /// Transport to use: stdio or streamable-http (overrides MCP_TRANSPORT)
    #[arg(long)]
    transport: Option<String>,

    /// Bind address for the HTTP transport (overrides MCP_HOST)
    #[arg(long)]
    host: Option<std::net::IpAddr>,

    /// Bind port for the HTTP transport (overrides MCP_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Request path for the HTTP transport (overrides MCP_PATH)
    #[arg(long)]
    mcp_path: Option<String>,

    /// Directory scanned for *_tools.toml files (overrides TD_CUSTOM_TOOL_DIR)
    #[arg(long)]
    custom_tool_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout is reserved for the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(transport) = cli.transport.as_deref() {
        config.transport = Transport::parse(transport)?;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(mcp_path) = cli.mcp_path.as_deref() {
        config.mcp_path = parse_mcp_path(mcp_path)?;
    }
    if let Some(dir) = cli.custom_tool_dir {
        config.custom_tool_dir = dir;
    }

    run_server(config).await
}

async fn run_server(config: Config) -> Result<()> {
    let custom = CustomDefinitions::load_dir(&config.custom_tool_dir)?;
    if !custom.tools.is_empty() || !custom.prompts.is_empty() {
        tracing::info!(
            tools = custom.tools.len(),
            prompts = custom.prompts.len(),
            "Loaded custom definitions from {}",
            config.custom_tool_dir
        );
    }

    let client = Arc::new(TdClient::new(config.database.clone()));
    let server = Arc::new(McpServer::new(client, custom));

    match config.transport {
        Transport::Stdio => server.run_stdio().await,
        Transport::StreamableHttp => {
            let addr = SocketAddr::new(config.host, config.port);
            http::serve(server, addr, &config.mcp_path).await
        }
    }
}
