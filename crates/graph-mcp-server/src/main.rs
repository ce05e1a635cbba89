//! Entry point for the MCP gateway binary.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use graph_mcp_server::config::Config;
use graph_mcp_server::server::McpServer;
use graph_mcp_server::storage::memory::InMemoryStorage;
use graph_mcp_server::storage::StorageClient;

/// Multi-tenant MCP gateway over a knowledge-graph storage engine.
#[derive(Debug, Parser)]
#[command(name = "graph-mcp-server", version, about)]
struct Cli {
    /// Address the HTTP listener binds to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: SocketAddr,

    /// Base URL announced in the legacy SSE `endpoint` event.
    #[arg(long, env = "MCP_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).json().init();

    let cli = Cli::parse();
    let config = Config::new(cli.bind_addr, cli.base_url);

    // The real graph/storage engine is an external collaborator; this binary ships the
    // in-memory implementation that backs the crate's tests. Swap in a real
    // `StorageClient` impl to point the gateway at it.
    let storage: Arc<dyn StorageClient> = Arc::new(InMemoryStorage::new());

    McpServer::new(storage, config).run_http().await
}
