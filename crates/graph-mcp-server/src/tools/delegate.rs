//! Delegation seams for out-of-core tool handlers.
//!
//! Two handlers — agent tools and external-registry tools — depend on subsystems that
//! themselves depend on this crate's types, which would make direct construction circular.
//! Both are installed via setter injection onto [`super::ToolRegistry`] after construction;
//! until installed, their tool names are simply absent from the catalog.

use serde_json::{Map, Value};

use super::{ToolContext, ToolDefinition, ToolResult};
use crate::error::ToolOutcome;

/// Contributes tools backed by an agent-execution subsystem (e.g. running a sub-agent
/// against the graph on the caller's behalf). Not implemented in this crate — the real
/// agent subsystem is an external collaborator; this trait is the seam it would plug into.
#[async_trait::async_trait]
pub trait AgentToolHandler: Send + Sync {
    fn get_definitions(&self) -> Vec<ToolDefinition>;

    /// Returns `None` if `name` does not belong to this handler, so the registry can keep
    /// falling through to the next delegate.
    async fn try_execute(
        &self,
        name: &str,
        ctx: &ToolContext,
        arguments: &Map<String, Value>,
    ) -> Option<ToolOutcome<ToolResult>>;
}

/// Contributes tools backed by an external, dynamically configured tool registry (e.g.
/// project-specific tools installed outside this process). Same non-goal as
/// [`AgentToolHandler`]: only the seam is implemented here.
#[async_trait::async_trait]
pub trait ExternalRegistryToolHandler: Send + Sync {
    fn get_definitions(&self) -> Vec<ToolDefinition>;

    async fn try_execute(
        &self,
        name: &str,
        ctx: &ToolContext,
        arguments: &Map<String, Value>,
    ) -> Option<ToolOutcome<ToolResult>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedCaller, TokenKind};
    use crate::schema_version::SchemaVersionCache;
    use crate::storage::memory::InMemoryStorage;
    use crate::tools::ToolRegistry;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    struct EchoAgentHandler;

    #[async_trait::async_trait]
    impl AgentToolHandler for EchoAgentHandler {
        fn get_definitions(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition {
                name: "agent_echo".to_string(),
                description: "echoes its arguments".to_string(),
                input_schema: serde_json::json!({ "type": "object" }),
            }]
        }

        async fn try_execute(
            &self,
            name: &str,
            _ctx: &ToolContext,
            arguments: &Map<String, Value>,
        ) -> Option<ToolOutcome<ToolResult>> {
            if name != "agent_echo" {
                return None;
            }
            Some(Ok(ToolResult::ok(&Value::Object(arguments.clone()))))
        }
    }

    fn test_context() -> ToolContext {
        let storage: Arc<dyn crate::storage::StorageClient> = Arc::new(InMemoryStorage::new());
        ToolContext {
            schema_version: Arc::new(SchemaVersionCache::new(Arc::clone(&storage), Duration::from_secs(60))),
            storage,
            project_id: Some(Uuid::new_v4()),
            caller: AuthenticatedCaller {
                user_id: Uuid::new_v4(),
                organization_id: Uuid::new_v4(),
                project_id: None,
                token_kind: TokenKind::Bearer,
            },
        }
    }

    #[tokio::test]
    async fn unset_delegate_is_absent_from_catalog() {
        let registry = ToolRegistry::new();
        assert!(!registry.catalog().iter().any(|t| t.name == "agent_echo"));
    }

    #[tokio::test]
    async fn attached_delegate_contributes_definitions_and_dispatch() {
        let mut registry = ToolRegistry::new();
        registry.set_agent_handler(Arc::new(EchoAgentHandler));
        assert!(registry.catalog().iter().any(|t| t.name == "agent_echo"));

        let ctx = test_context();
        let args: Map<String, Value> = serde_json::json!({ "hello": "world" }).as_object().unwrap().clone();
        let result = registry.dispatch("agent_echo", &ctx, &args).await.unwrap();
        assert!(!result.is_error);
    }
}
