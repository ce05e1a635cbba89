//! MCP server wiring: builds the session registry, tool registry, schema-version cache, and
//! dispatcher, then serves them over the HTTP surface.

pub mod http;

use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::schema_version::SchemaVersionCache;
use crate::session::SessionRegistry;
use crate::storage::StorageClient;
use crate::tools::delegate::{AgentToolHandler, ExternalRegistryToolHandler};
use crate::tools::ToolRegistry;
use http::AppState;

/// Builds a [`McpServer`] in two phases so delegated tool handlers can be attached after the
/// tool registry exists but before it is wrapped in the `Arc` the dispatcher shares with
/// every request. The agent and external-registry subsystems depend on storage/graph
/// services that themselves depend on this crate's types, so they attach via setter
/// injection rather than at construction.
pub struct McpServerBuilder {
    tools: ToolRegistry,
    storage: Arc<dyn StorageClient>,
    config: Config,
}

impl McpServerBuilder {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageClient>, config: Config) -> Self {
        Self { tools: ToolRegistry::new(), storage, config }
    }

    pub fn set_agent_handler(&mut self, handler: Arc<dyn AgentToolHandler>) -> &mut Self {
        self.tools.set_agent_handler(handler);
        self
    }

    pub fn set_external_registry_handler(&mut self, handler: Arc<dyn ExternalRegistryToolHandler>) -> &mut Self {
        self.tools.set_external_registry_handler(handler);
        self
    }

    #[must_use]
    pub fn build(self) -> McpServer {
        let config = Arc::new(self.config);
        let tools = Arc::new(self.tools);
        let schema_version = Arc::new(SchemaVersionCache::new(Arc::clone(&self.storage), config.schema_version_cache_ttl));
        let dispatcher = Dispatcher::new(tools, Arc::clone(&self.storage), schema_version, Arc::clone(&config));

        let state = Arc::new(AppState {
            sessions: SessionRegistry::new(config.event_window),
            legacy_sessions: SessionRegistry::new(config.event_window),
            dispatcher,
            config,
        });

        McpServer { state }
    }
}

/// Assembles every process-wide structure the gateway owns: the
/// session registry, stream registries nested within each session, the event store nested
/// within each session, and the schema-version cache. References the storage collaborator
/// without owning it.
pub struct McpServer {
    state: Arc<AppState>,
}

impl McpServer {
    /// Build a server around a storage collaborator and configuration, with no delegated
    /// tool handlers attached. Use [`McpServerBuilder`] directly when an agent or external
    /// registry handler needs to be wired in first.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageClient>, config: Config) -> Self {
        McpServerBuilder::new(storage, config).build()
    }

    /// Run the HTTP surface: the unified endpoint plus both legacy transports.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server fails while running.
    pub async fn run_http(self) -> anyhow::Result<()> {
        let addr = self.state.config.bind_addr;
        let router = self.into_router();

        tracing::info!(%addr, "MCP gateway listening");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
        tracing::info!("MCP gateway shut down");
        Ok(())
    }

    /// Build the axum [`Router`] directly, without binding a listener. Exposed so integration
    /// tests can drive the HTTP surface with `tower::ServiceExt::oneshot`.
    #[must_use]
    pub fn into_router(self) -> axum::Router {
        http::create_router(self.state)
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to install CTRL+C handler");
    tracing::info!("received shutdown signal");
}
