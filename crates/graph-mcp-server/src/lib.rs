//! Multi-tenant MCP gateway over a knowledge-graph storage engine.
//!
//! A Model Context Protocol server: a JSON-RPC 2.0 method router, a Streamable HTTP
//! transport (plus two legacy transports), a tool-invocation engine dispatching onto a
//! shared, row-level-isolated storage collaborator, and a cached schema-version digest.
//!
//! # Example
//!
//! ```no_run
//! use graph_mcp_server::config::Config;
//! use graph_mcp_server::server::McpServer;
//! use graph_mcp_server::storage::memory::InMemoryStorage;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let storage = Arc::new(InMemoryStorage::new());
//!     McpServer::new(storage, config).run_http().await
//! }
//! ```

pub mod auth;
pub mod config;
pub mod cursor;
pub mod dispatch;
pub mod error;
pub mod prompts;
pub mod resources;
pub mod rpc;
pub mod schema_version;
pub mod server;
pub mod session;
pub mod storage;
pub mod tools;

pub use config::Config;
pub use error::{RpcError, ToolError};
pub use server::McpServer;
