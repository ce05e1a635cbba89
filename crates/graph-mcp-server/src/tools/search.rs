//! Search, traversal, and relationship adapter tools: thin adapters over the graph
//! collaborator's matching calls.

use serde_json::{json, Map, Value};

use super::args::{clamp_i64, coerce_uuid_array, object_or_empty, offset_or_zero, optional_string, require_string, require_uuid};
use super::{McpTool, ToolContext, ToolResult};
use crate::config::api;
use crate::error::{ToolError, ToolOutcome};
use crate::storage::TraversalDirection;

pub struct HybridSearchTool;

#[async_trait::async_trait]
impl McpTool for HybridSearchTool {
    fn name(&self) -> &'static str {
        "hybrid_search"
    }

    fn description(&self) -> &'static str {
        "Combined lexical/vector search over entities, with an optional type filter."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "type_name": { "type": "string" },
                "limit": { "type": "integer", "minimum": 1, "maximum": 50, "default": 20 }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let query = require_string(arguments, "query")?;
        let entity_type = optional_string(arguments, "type_name");
        let limit = clamp_i64(arguments, "limit", api::PAGE_LIMIT_MIN, api::PAGE_LIMIT_MAX, api::PAGE_LIMIT_DEFAULT);
        let entities = ctx
            .storage
            .hybrid_search(project_id, &query, entity_type.as_deref(), limit)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "entities": entities })))
    }
}

pub struct SemanticSearchTool;

#[async_trait::async_trait]
impl McpTool for SemanticSearchTool {
    fn name(&self) -> &'static str {
        "semantic_search"
    }

    fn description(&self) -> &'static str {
        "Vector-similarity search over entities."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "limit": { "type": "integer", "minimum": 1, "maximum": 50, "default": 20 }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let query = require_string(arguments, "query")?;
        let limit = clamp_i64(arguments, "limit", api::PAGE_LIMIT_MIN, api::PAGE_LIMIT_MAX, api::PAGE_LIMIT_DEFAULT);
        let entities =
            ctx.storage.semantic_search(project_id, &query, limit).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "entities": entities })))
    }
}

pub struct FindSimilarTool;

#[async_trait::async_trait]
impl McpTool for FindSimilarTool {
    fn name(&self) -> &'static str {
        "find_similar"
    }

    fn description(&self) -> &'static str {
        "Find entities similar to a reference entity."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "entity_id": { "type": "string" },
                "limit": { "type": "integer", "minimum": 1, "maximum": 50, "default": 20 }
            },
            "required": ["entity_id"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let entity_id = require_uuid(arguments, "entity_id")?;
        let limit = clamp_i64(arguments, "limit", api::PAGE_LIMIT_MIN, api::PAGE_LIMIT_MAX, api::PAGE_LIMIT_DEFAULT);
        let entities =
            ctx.storage.find_similar(project_id, entity_id, limit).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "entities": entities })))
    }
}

pub struct TraverseGraphTool;

#[async_trait::async_trait]
impl McpTool for TraverseGraphTool {
    fn name(&self) -> &'static str {
        "traverse_graph"
    }

    fn description(&self) -> &'static str {
        "Multi-hop graph traversal from one or more root entities."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "start_entity_id": { "type": "string" },
                "start_entity_ids": { "type": "array", "items": { "type": "string" } },
                "max_depth": { "type": "integer", "minimum": 1, "maximum": 10, "default": 2 },
                "direction": { "type": "string", "enum": ["outgoing", "incoming", "both"], "default": "outgoing" },
                "relationship_type": { "type": "string" }
            },
            "required": ["start_entity_id"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let mut start_ids = coerce_uuid_array(arguments, "start_entity_ids");
        if start_ids.is_empty() {
            start_ids.push(require_uuid(arguments, "start_entity_id")?);
        }
        let max_depth = clamp_i64(arguments, "max_depth", 1, 10, 2) as u32;
        let direction = match arguments.get("direction").and_then(Value::as_str) {
            Some("incoming") => TraversalDirection::Incoming,
            Some("both") => TraversalDirection::Both,
            _ => TraversalDirection::Outgoing,
        };
        let relationship_type = optional_string(arguments, "relationship_type");

        let entities = ctx
            .storage
            .traverse_graph(project_id, start_ids, max_depth, direction, relationship_type.as_deref())
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "entities": entities })))
    }
}

pub struct ListRelationshipsTool;

#[async_trait::async_trait]
impl McpTool for ListRelationshipsTool {
    fn name(&self) -> &'static str {
        "list_relationships"
    }

    fn description(&self) -> &'static str {
        "Paginated, type-filtered list of relationships."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "relationship_type": { "type": "string" },
                "limit": { "type": "integer", "minimum": 1, "maximum": 50, "default": 20 },
                "offset": { "type": "integer", "minimum": 0, "default": 0 }
            },
            "required": []
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let relationship_type = optional_string(arguments, "relationship_type");
        let limit = clamp_i64(arguments, "limit", api::PAGE_LIMIT_MIN, api::PAGE_LIMIT_MAX, api::PAGE_LIMIT_DEFAULT);
        let offset = offset_or_zero(arguments, "offset");

        let page = ctx
            .storage
            .list_relationships(project_id, relationship_type.as_deref(), limit, offset)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({
            "relationships": page.items,
            "pagination": { "total": page.total, "limit": limit, "offset": offset, "has_more": page.has_more }
        })))
    }
}

pub struct UpdateRelationshipTool;

#[async_trait::async_trait]
impl McpTool for UpdateRelationshipTool {
    fn name(&self) -> &'static str {
        "update_relationship"
    }

    fn description(&self) -> &'static str {
        "Merge properties into a relationship (null removes a key)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "relationship_id": { "type": "string" },
                "properties": { "type": "object", "default": {} }
            },
            "required": ["relationship_id"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let relationship_id = require_uuid(arguments, "relationship_id")?;
        let properties_patch = object_or_empty(arguments, "properties");
        let relationship = ctx
            .storage
            .update_relationship(project_id, relationship_id, properties_patch)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(
            &json!({ "success": true, "relationship": relationship, "message": "relationship updated" }),
        ))
    }
}

pub struct DeleteRelationshipTool;

#[async_trait::async_trait]
impl McpTool for DeleteRelationshipTool {
    fn name(&self) -> &'static str {
        "delete_relationship"
    }

    fn description(&self) -> &'static str {
        "Soft-delete a relationship."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "relationship_id": { "type": "string" } },
            "required": ["relationship_id"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let relationship_id = require_uuid(arguments, "relationship_id")?;
        ctx.storage.delete_relationship(project_id, relationship_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "success": true, "message": "relationship deleted" })))
    }
}

pub struct ListTagsTool;

#[async_trait::async_trait]
impl McpTool for ListTagsTool {
    fn name(&self) -> &'static str {
        "list_tags"
    }

    fn description(&self) -> &'static str {
        "Aggregate entity labels in the project by frequency."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, ctx: &ToolContext, _arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let tags = ctx.storage.list_tags(project_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "tags": tags })))
    }
}
