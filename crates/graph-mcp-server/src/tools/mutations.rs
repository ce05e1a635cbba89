//! Entity/relationship mutation tools, including partial-failure batch operations.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::args::{coerce_string_array, object_or_empty, optional_string, require_string, require_uuid};
use super::{McpTool, ToolContext, ToolResult};
use crate::config::api;
use crate::error::{ToolError, ToolOutcome};

fn entity_key(properties: &Map<String, Value>) -> String {
    properties
        .get("key")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub struct CreateEntityTool;

#[async_trait::async_trait]
impl McpTool for CreateEntityTool {
    fn name(&self) -> &'static str {
        "create_entity"
    }

    fn description(&self) -> &'static str {
        "Create a new entity of the given type with the supplied properties and labels."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "type": { "type": "string" },
                "properties": { "type": "object", "default": {} },
                "labels": { "type": "array", "items": { "type": "string" }, "default": [] }
            },
            "required": ["type"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let entity_type = require_string(arguments, "type")?;
        let properties = object_or_empty(arguments, "properties");
        let labels = coerce_string_array(arguments, "labels");
        let key = entity_key(&properties);

        let entity = ctx
            .storage
            .create_entity(project_id, entity_type, key, properties, labels)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "success": true, "entity": entity, "message": "entity created" })))
    }
}

pub struct UpdateEntityTool;

#[async_trait::async_trait]
impl McpTool for UpdateEntityTool {
    fn name(&self) -> &'static str {
        "update_entity"
    }

    fn description(&self) -> &'static str {
        "Merge properties into an entity (null removes a key); optionally replace its label set."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "entity_id": { "type": "string" },
                "properties": { "type": "object", "default": {} },
                "labels": { "type": "array", "items": { "type": "string" } },
                "replace_labels": { "type": "boolean", "default": false }
            },
            "required": ["entity_id"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let entity_id = require_uuid(arguments, "entity_id")?;
        let properties_patch = object_or_empty(arguments, "properties");
        let replace_labels = arguments.get("replace_labels").and_then(Value::as_bool).unwrap_or(false);
        let labels = replace_labels.then(|| coerce_string_array(arguments, "labels"));

        let entity = ctx
            .storage
            .update_entity(project_id, entity_id, properties_patch, labels)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "success": true, "entity": entity, "message": "entity updated" })))
    }
}

pub struct DeleteEntityTool;

#[async_trait::async_trait]
impl McpTool for DeleteEntityTool {
    fn name(&self) -> &'static str {
        "delete_entity"
    }

    fn description(&self) -> &'static str {
        "Soft-delete an entity."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "entity_id": { "type": "string" } }, "required": ["entity_id"] })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let entity_id = require_uuid(arguments, "entity_id")?;
        ctx.storage.delete_entity(project_id, entity_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "success": true, "message": "entity deleted" })))
    }
}

pub struct RestoreEntityTool;

#[async_trait::async_trait]
impl McpTool for RestoreEntityTool {
    fn name(&self) -> &'static str {
        "restore_entity"
    }

    fn description(&self) -> &'static str {
        "Restore a soft-deleted entity."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "entity_id": { "type": "string" } }, "required": ["entity_id"] })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let entity_id = require_uuid(arguments, "entity_id")?;
        let entity = ctx.storage.restore_entity(project_id, entity_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "success": true, "entity": entity, "message": "entity restored" })))
    }
}

pub struct CreateRelationshipTool;

#[async_trait::async_trait]
impl McpTool for CreateRelationshipTool {
    fn name(&self) -> &'static str {
        "create_relationship"
    }

    fn description(&self) -> &'static str {
        "Create a relationship between two entities."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "type": { "type": "string" },
                "source_id": { "type": "string" },
                "target_id": { "type": "string" },
                "properties": { "type": "object", "default": {} }
            },
            "required": ["type", "source_id", "target_id"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let relationship_type = require_string(arguments, "type")?;
        let source_id = require_uuid(arguments, "source_id")?;
        let target_id = require_uuid(arguments, "target_id")?;
        let properties = object_or_empty(arguments, "properties");

        let relationship = ctx
            .storage
            .create_relationship(project_id, relationship_type, source_id, target_id, properties)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(
            &json!({ "success": true, "relationship": relationship, "message": "relationship created" }),
        ))
    }
}

pub struct BatchCreateEntitiesTool;

#[async_trait::async_trait]
impl McpTool for BatchCreateEntitiesTool {
    fn name(&self) -> &'static str {
        "batch_create_entities"
    }

    fn description(&self) -> &'static str {
        "Create up to 100 entities in one call; a single failed element does not abort the batch."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "entities": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": { "type": "string" },
                            "properties": { "type": "object" },
                            "labels": { "type": "array", "items": { "type": "string" } }
                        }
                    }
                }
            },
            "required": ["entities"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let elements = arguments
            .get("entities")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| ToolError::validation("entities", "required and must be a non-empty array"))?;

        if elements.is_empty() {
            return Err(ToolError::validation("entities", "must contain at least one element"));
        }
        if elements.len() > api::MAX_BATCH_SIZE {
            return Err(ToolError::validation(
                "entities",
                format!("batch size {} exceeds maximum of {}", elements.len(), api::MAX_BATCH_SIZE),
            ));
        }

        let mut results = Vec::with_capacity(elements.len());
        let mut success = 0usize;
        let mut failed = 0usize;

        for (index, element) in elements.iter().enumerate() {
            let obj = element.as_object().cloned().unwrap_or_default();
            match create_one_entity(ctx, project_id, &obj).await {
                Ok(entity) => {
                    success += 1;
                    results.push(json!({ "success": true, "index": index, "entity": entity }));
                }
                Err(message) => {
                    failed += 1;
                    results.push(json!({ "success": false, "index": index, "error": message }));
                }
            }
        }

        Ok(ToolResult::ok(&json!({
            "success": success,
            "failed": failed,
            "total": elements.len(),
            "results": results
        })))
    }
}

async fn create_one_entity(
    ctx: &ToolContext,
    project_id: Uuid,
    element: &Map<String, Value>,
) -> Result<Value, String> {
    let entity_type = optional_string(element, "type").ok_or_else(|| "missing entity type".to_string())?;
    let properties = object_or_empty(element, "properties");
    let labels = coerce_string_array(element, "labels");
    let key = entity_key(&properties);
    ctx.storage
        .create_entity(project_id, entity_type, key, properties, labels)
        .await
        .map(|e| serde_json::to_value(e).unwrap_or(Value::Null))
}

pub struct BatchCreateRelationshipsTool;

#[async_trait::async_trait]
impl McpTool for BatchCreateRelationshipsTool {
    fn name(&self) -> &'static str {
        "batch_create_relationships"
    }

    fn description(&self) -> &'static str {
        "Create up to 100 relationships in one call; a single failed element does not abort the batch."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "relationships": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": { "type": "string" },
                            "source_id": { "type": "string" },
                            "target_id": { "type": "string" },
                            "properties": { "type": "object" }
                        }
                    }
                }
            },
            "required": ["relationships"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let elements = arguments
            .get("relationships")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| ToolError::validation("relationships", "required and must be a non-empty array"))?;

        if elements.is_empty() {
            return Err(ToolError::validation("relationships", "must contain at least one element"));
        }
        if elements.len() > api::MAX_BATCH_SIZE {
            return Err(ToolError::validation(
                "relationships",
                format!("batch size {} exceeds maximum of {}", elements.len(), api::MAX_BATCH_SIZE),
            ));
        }

        let mut results = Vec::with_capacity(elements.len());
        let mut success = 0usize;
        let mut failed = 0usize;

        for (index, element) in elements.iter().enumerate() {
            let obj = element.as_object().cloned().unwrap_or_default();
            match create_one_relationship(ctx, project_id, &obj).await {
                Ok(relationship) => {
                    success += 1;
                    results.push(json!({ "success": true, "index": index, "relationship": relationship }));
                }
                Err(message) => {
                    failed += 1;
                    results.push(json!({ "success": false, "index": index, "error": message }));
                }
            }
        }

        Ok(ToolResult::ok(&json!({
            "success": success,
            "failed": failed,
            "total": elements.len(),
            "results": results
        })))
    }
}

async fn create_one_relationship(
    ctx: &ToolContext,
    project_id: Uuid,
    element: &Map<String, Value>,
) -> Result<Value, String> {
    let relationship_type =
        optional_string(element, "type").ok_or_else(|| "missing relationship type".to_string())?;
    let source_id = element
        .get("source_id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| "missing or malformed source_id".to_string())?;
    let target_id = element
        .get("target_id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| "missing or malformed target_id".to_string())?;
    let properties = object_or_empty(element, "properties");

    ctx.storage
        .create_relationship(project_id, relationship_type, source_id, target_id, properties)
        .await
        .map(|r| serde_json::to_value(r).unwrap_or(Value::Null))
}
