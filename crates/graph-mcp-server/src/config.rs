//! Configuration for the MCP gateway.

use std::time::Duration;

/// Protocol and transport constants.
pub mod api {
    use std::time::Duration;

    /// Supported `MCP-Protocol-Version` values, oldest first. The last entry is
    /// the version assumed when the header is absent from a request.
    pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] =
        &["2025-03-26", "2025-06-18", "2025-11-25"];

    /// Protocol version assumed when `MCP-Protocol-Version` is absent.
    pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

    /// Maximum events retained per session in the event store.
    pub const EVENT_WINDOW: usize = 100;

    /// Interval between spec-compliant keep-alive comment lines on the unified
    /// SSE stream. Long cadence by design: a comment line is only needed to
    /// keep intermediaries from timing out, not to carry data.
    pub const SSE_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);

    /// Ping interval for the legacy project-scoped SSE transport.
    pub const LEGACY_SSE_PING_INTERVAL: Duration = Duration::from_secs(30);

    /// TTL for the cached schema-version fingerprint.
    pub const SCHEMA_VERSION_CACHE_TTL: Duration = Duration::from_secs(60);

    /// Client-facing cache-hint TTL returned alongside the `schema_version` tool result.
    pub const SCHEMA_VERSION_CLIENT_TTL_SECS: u64 = 300;

    /// Maximum elements accepted by a single batch-create call.
    pub const MAX_BATCH_SIZE: usize = 100;

    /// Clamp bounds for paginated list/search tools.
    pub const PAGE_LIMIT_MIN: i64 = 1;
    pub const PAGE_LIMIT_MAX: i64 = 50;
    pub const PAGE_LIMIT_DEFAULT: i64 = 20;
}

/// Tool names that require an effective project id.
pub const PROJECT_REQUIRED_TOOLS: &[&str] = &[
    "list_entity_types",
    "query_entities",
    "search_entities",
    "get_entity_edges",
    "get_available_templates",
    "get_installed_templates",
    "assign_template_pack",
    "update_template_assignment",
    "uninstall_template_pack",
    "create_entity",
    "create_relationship",
    "update_entity",
    "delete_entity",
    "restore_entity",
    "hybrid_search",
    "semantic_search",
    "find_similar",
    "traverse_graph",
    "list_relationships",
    "update_relationship",
    "delete_relationship",
    "list_tags",
    "batch_create_entities",
    "batch_create_relationships",
    "preview_schema_migration",
    "list_migration_archives",
    "get_migration_archive",
];

/// Gateway configuration, assembled once at startup and shared read-only thereafter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to.
    pub bind_addr: std::net::SocketAddr,

    /// Base URL used when announcing the legacy SSE `endpoint` event.
    pub base_url: String,

    /// Maximum events retained per session.
    pub event_window: usize,

    /// TTL for the schema-version fingerprint cache.
    pub schema_version_cache_ttl: Duration,

    /// Supported MCP protocol versions, in ascending order.
    pub supported_protocol_versions: Vec<String>,
}

impl Config {
    /// Build a configuration with the gateway's production defaults.
    #[must_use]
    pub fn new(bind_addr: std::net::SocketAddr, base_url: impl Into<String>) -> Self {
        Self {
            bind_addr,
            base_url: base_url.into(),
            event_window: api::EVENT_WINDOW,
            schema_version_cache_ttl: api::SCHEMA_VERSION_CACHE_TTL,
            supported_protocol_versions: api::SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Build configuration from environment variables, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `BIND_ADDR` is set but fails to parse as a socket address.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()?;
        let base_url =
            std::env::var("MCP_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        Ok(Self::new(bind_addr, base_url))
    }

    /// Build a configuration tuned for fast, deterministic tests: short TTLs,
    /// a small event window so ring-buffer pruning is easy to exercise.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            base_url: "http://localhost".to_string(),
            event_window: 5,
            schema_version_cache_ttl: Duration::from_secs(60),
            supported_protocol_versions: api::SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    #[must_use]
    pub fn supports_protocol_version(&self, version: &str) -> bool {
        self.supported_protocol_versions.iter().any(|v| v == version)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(([0, 0, 0, 0], 8080).into(), "http://localhost:8080")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_supports_baseline_protocol_versions() {
        let config = Config::default();
        assert!(config.supports_protocol_version("2025-03-26"));
        assert!(config.supports_protocol_version("2025-06-18"));
        assert!(config.supports_protocol_version("2025-11-25"));
        assert!(!config.supports_protocol_version("2099-01-01"));
    }

    #[test]
    fn testing_config_uses_a_small_event_window() {
        let config = Config::for_testing();
        assert_eq!(config.event_window, 5);
    }
}
