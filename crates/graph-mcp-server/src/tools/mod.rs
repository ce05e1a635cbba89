//! Tool registry and dispatcher.
//!
//! Each tool is a [`McpTool`] implementation: a stable name, a human description, a
//! JSON-Schema input description, and an `execute` method that receives already-parsed
//! `arguments` and a [`ToolContext`]. The catalog is assembled at call time by concatenating
//! the in-core set with whatever delegated handlers ([`delegate`]) have been attached.

pub mod args;
pub mod delegate;
pub mod entities;
pub mod migration;
pub mod mutations;
pub mod search;
pub mod templates;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::AuthenticatedCaller;
use crate::error::{RpcError, ToolError, ToolOutcome};
use crate::schema_version::SchemaVersionCache;
use crate::storage::StorageClient;
use delegate::{AgentToolHandler, ExternalRegistryToolHandler};

/// One content block in a tool result. The gateway only ever emits `"text"` blocks, each
/// carrying the pretty-printed JSON encoding of the handler's logical result.
#[derive(Debug, Clone, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: &'static str,
    pub text: String,
}

/// Uniform result envelope every tool handler returns.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Serialize `value` as pretty JSON and wrap it as a successful result.
    ///
    /// # Panics
    ///
    /// Panics if `value` cannot be serialized, which would indicate a handler bug (every
    /// logical result type here is plain-data and always serializes).
    #[must_use]
    pub fn ok(value: &impl Serialize) -> Self {
        let text = serde_json::to_string_pretty(value).expect("tool result is always serializable");
        Self { content: vec![ContentBlock { block_type: "text", text }], is_error: false }
    }

    /// An in-band error the agent should see as a message, not a JSON-RPC error
    /// reported as a transport- or protocol-level error.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self { content: vec![ContentBlock { block_type: "text", text: message.into() }], is_error: true }
    }
}

/// Declarative tool catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Everything a tool handler needs: the storage collaborator, the schema-version cache, the
/// effective project id already resolved by the dispatcher, and the authenticated caller.
pub struct ToolContext {
    pub storage: Arc<dyn StorageClient>,
    pub schema_version: Arc<SchemaVersionCache>,
    pub project_id: Option<Uuid>,
    pub caller: AuthenticatedCaller,
}

impl ToolContext {
    /// The effective project id, or a validation error naming the tool if the tool requires
    /// one and none was resolved.
    pub fn require_project_id(&self, tool_name: &str) -> Result<Uuid, ToolError> {
        self.project_id.ok_or_else(|| {
            ToolError::validation(
                "project_id",
                format!("tool `{tool_name}` requires a project id (set one on the session or caller)"),
            )
        })
    }
}

/// Implemented by every in-core tool handler.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;
    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult>;
}

/// Assembles the in-core tool set plus whatever delegated handlers have been attached via
/// setter injection after the registry, storage, and other subsystems all exist.
pub struct ToolRegistry {
    tools: HashMap<&'static str, Box<dyn McpTool>>,
    agent_handler: Option<Arc<dyn AgentToolHandler>>,
    external_registry_handler: Option<Arc<dyn ExternalRegistryToolHandler>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut tools: HashMap<&'static str, Box<dyn McpTool>> = HashMap::new();
        for tool in in_core_tools() {
            tools.insert(tool.name(), tool);
        }
        Self { tools, agent_handler: None, external_registry_handler: None }
    }

    /// Attach the agent-tool delegate. Installed post-construction to break the init cycle
    /// between this registry and the agent subsystem.
    pub fn set_agent_handler(&mut self, handler: Arc<dyn AgentToolHandler>) {
        self.agent_handler = Some(handler);
    }

    pub fn set_external_registry_handler(&mut self, handler: Arc<dyn ExternalRegistryToolHandler>) {
        self.external_registry_handler = Some(handler);
    }

    /// The full catalog: in-core definitions plus whichever delegates are attached. Absent
    /// delegates simply contribute nothing.
    #[must_use]
    pub fn catalog(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect();
        if let Some(agent) = &self.agent_handler {
            defs.extend(agent.get_definitions());
        }
        if let Some(registry) = &self.external_registry_handler {
            defs.extend(registry.get_definitions());
        }
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Dispatch a `tools/call` invocation by name. Unknown names fall through to the
    /// delegates in turn, then finally a method-not-found-shaped `RpcError`.
    pub async fn dispatch(
        &self,
        name: &str,
        ctx: &ToolContext,
        arguments: &Map<String, Value>,
    ) -> Result<ToolResult, RpcError> {
        if let Some(tool) = self.tools.get(name) {
            return tool.execute(ctx, arguments).await.map_err(RpcError::from);
        }
        if let Some(agent) = &self.agent_handler {
            if let Some(result) = agent.try_execute(name, ctx, arguments).await {
                return result.map_err(RpcError::from);
            }
        }
        if let Some(registry) = &self.external_registry_handler {
            if let Some(result) = registry.try_execute(name, ctx, arguments).await {
                return result.map_err(RpcError::from);
            }
        }
        let mut supported: Vec<&str> = self.tools.keys().copied().collect();
        supported.sort_unstable();
        Err(RpcError::invalid_params(format!("unknown tool: {name}"))
            .with_data(serde_json::json!({ "supported_methods": supported })))
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn in_core_tools() -> Vec<Box<dyn McpTool>> {
    vec![
        Box::new(entities::ListEntityTypesTool),
        Box::new(entities::QueryEntitiesTool),
        Box::new(entities::SearchEntitiesTool),
        Box::new(entities::GetEntityEdgesTool),
        Box::new(search::HybridSearchTool),
        Box::new(search::SemanticSearchTool),
        Box::new(search::FindSimilarTool),
        Box::new(search::TraverseGraphTool),
        Box::new(search::ListRelationshipsTool),
        Box::new(search::UpdateRelationshipTool),
        Box::new(search::DeleteRelationshipTool),
        Box::new(search::ListTagsTool),
        Box::new(mutations::CreateEntityTool),
        Box::new(mutations::UpdateEntityTool),
        Box::new(mutations::DeleteEntityTool),
        Box::new(mutations::RestoreEntityTool),
        Box::new(mutations::CreateRelationshipTool),
        Box::new(mutations::BatchCreateEntitiesTool),
        Box::new(mutations::BatchCreateRelationshipsTool),
        Box::new(templates::SchemaVersionTool),
        Box::new(templates::ListTemplatePacksTool),
        Box::new(templates::GetTemplatePackTool),
        Box::new(templates::CreateTemplatePackTool),
        Box::new(templates::DeleteTemplatePackTool),
        Box::new(templates::GetAvailableTemplatesTool),
        Box::new(templates::GetInstalledTemplatesTool),
        Box::new(templates::AssignTemplatePackTool),
        Box::new(templates::UpdateTemplateAssignmentTool),
        Box::new(templates::UninstallTemplatePackTool),
        Box::new(migration::PreviewSchemaMigrationTool),
        Box::new(migration::ListMigrationArchivesTool),
        Box::new(migration::GetMigrationArchiveTool),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_sorted_and_non_empty() {
        let registry = ToolRegistry::new();
        let catalog = registry.catalog();
        assert!(!catalog.is_empty());
        let mut sorted = catalog.clone();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(catalog.iter().map(|t| &t.name).collect::<Vec<_>>(), sorted.iter().map(|t| &t.name).collect::<Vec<_>>());
    }

    #[test]
    fn catalog_includes_schema_version() {
        let registry = ToolRegistry::new();
        assert!(registry.catalog().iter().any(|t| t.name == "schema_version"));
    }

    #[test]
    fn catalog_names_match_the_fixed_in_core_set() {
        let registry = ToolRegistry::new();
        let names: Vec<&str> = registry.catalog().iter().map(|t| t.name.as_str()).collect();
        insta::assert_snapshot!(names.join("\n"), @r"
        assign_template_pack
        batch_create_entities
        batch_create_relationships
        create_entity
        create_relationship
        create_template_pack
        delete_entity
        delete_relationship
        delete_template_pack
        find_similar
        get_available_templates
        get_entity_edges
        get_installed_templates
        get_migration_archive
        get_template_pack
        hybrid_search
        list_entity_types
        list_migration_archives
        list_relationships
        list_tags
        list_template_packs
        preview_schema_migration
        query_entities
        restore_entity
        schema_version
        search_entities
        semantic_search
        traverse_graph
        uninstall_template_pack
        update_entity
        update_relationship
        update_template_assignment
        ");
    }
}
