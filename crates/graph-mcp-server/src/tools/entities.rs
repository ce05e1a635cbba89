//! Entity listing/query/search/edge tools.

use serde_json::{json, Map, Value};

use super::args::{clamp_i64, offset_or_zero, optional_string, require_uuid};
use super::{McpTool, ToolContext, ToolResult};
use crate::config::api;
use crate::error::{ToolError, ToolOutcome};
use crate::storage::{SortKey, SortOrder};

pub struct ListEntityTypesTool;

#[async_trait::async_trait]
impl McpTool for ListEntityTypesTool {
    fn name(&self) -> &'static str {
        "list_entity_types"
    }

    fn description(&self) -> &'static str {
        "List every entity type registered for the project, with live object counts and \
         relationship-type aggregates."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, ctx: &ToolContext, _arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let summaries = ctx.storage.list_entity_types(project_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&summaries))
    }
}

pub struct QueryEntitiesTool;

#[async_trait::async_trait]
impl McpTool for QueryEntitiesTool {
    fn name(&self) -> &'static str {
        "query_entities"
    }

    fn description(&self) -> &'static str {
        "Paginated, type-filtered list of entities, sortable by created_at/updated_at/name."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "type_name": { "type": "string", "description": "Entity type filter" },
                "sort_key": { "type": "string", "enum": ["created_at", "updated_at", "name"], "default": "created_at" },
                "sort_order": { "type": "string", "enum": ["asc", "desc"], "default": "desc" },
                "limit": { "type": "integer", "minimum": 1, "maximum": 50, "default": 20 },
                "offset": { "type": "integer", "minimum": 0, "default": 0 }
            },
            "required": ["type_name"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let entity_type = optional_string(arguments, "type_name");
        let sort_key = SortKey::parse(arguments.get("sort_key").and_then(Value::as_str).unwrap_or("created_at"));
        let sort_order = SortOrder::parse(arguments.get("sort_order").and_then(Value::as_str).unwrap_or("desc"));
        let limit = clamp_i64(arguments, "limit", api::PAGE_LIMIT_MIN, api::PAGE_LIMIT_MAX, api::PAGE_LIMIT_DEFAULT);
        let offset = offset_or_zero(arguments, "offset");

        let page = ctx
            .storage
            .list_entities(project_id, entity_type.as_deref(), sort_key, sort_order, limit, offset)
            .await
            .map_err(ToolError::storage)?;

        Ok(ToolResult::ok(&json!({
            "entities": page.items,
            "pagination": { "total": page.total, "limit": limit, "offset": offset, "has_more": page.has_more }
        })))
    }
}

pub struct SearchEntitiesTool;

#[async_trait::async_trait]
impl McpTool for SearchEntitiesTool {
    fn name(&self) -> &'static str {
        "search_entities"
    }

    fn description(&self) -> &'static str {
        "Case-insensitive substring search over entity key, name, and description."
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
        let query = super::args::require_string(arguments, "query")?;
        let entity_type = optional_string(arguments, "type_name");
        let limit = clamp_i64(arguments, "limit", api::PAGE_LIMIT_MIN, api::PAGE_LIMIT_MAX, api::PAGE_LIMIT_DEFAULT);

        let entities = ctx
            .storage
            .search_entities(project_id, &query, entity_type.as_deref(), limit)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "entities": entities })))
    }
}

pub struct GetEntityEdgesTool;

#[async_trait::async_trait]
impl McpTool for GetEntityEdgesTool {
    fn name(&self) -> &'static str {
        "get_entity_edges"
    }

    fn description(&self) -> &'static str {
        "Return the incoming and outgoing non-deleted relationships for an entity, with \
         counterpart entities summarized."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "entity_id": { "type": "string", "description": "UUID of the entity" } },
            "required": ["entity_id"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let entity_id = require_uuid(arguments, "entity_id")?;
        let edges = ctx.storage.get_entity_edges(project_id, entity_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&edges))
    }
}
