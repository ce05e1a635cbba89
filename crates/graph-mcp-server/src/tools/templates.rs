//! Template-pack tools and the schema-version tool: the only two categories of in-core
//! tools that are not project-scoped.

use chrono::Utc;
use serde_json::{json, Map, Value};

use super::args::{clamp_i64, coerce_string_array, offset_or_zero, optional_string, require_string, require_uuid};
use super::{McpTool, ToolContext, ToolResult};
use crate::config::api;
use crate::error::{ToolError, ToolOutcome};

pub struct SchemaVersionTool;

#[async_trait::async_trait]
impl McpTool for SchemaVersionTool {
    fn name(&self) -> &'static str {
        "schema_version"
    }

    fn description(&self) -> &'static str {
        "Return the cached schema-version fingerprint over installed template packs."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, ctx: &ToolContext, _arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let fingerprint = ctx.schema_version.get().await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({
            "fingerprint": fingerprint,
            "computed_at": Utc::now(),
            "cache_ttl_seconds": api::SCHEMA_VERSION_CLIENT_TTL_SECS
        })))
    }
}

pub struct ListTemplatePacksTool;

#[async_trait::async_trait]
impl McpTool for ListTemplatePacksTool {
    fn name(&self) -> &'static str {
        "list_template_packs"
    }

    fn description(&self) -> &'static str {
        "Paginated, search-filtered list of non-draft, non-deprecated template packs."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "search": { "type": "string" },
                "limit": { "type": "integer", "minimum": 1, "maximum": 50, "default": 20 },
                "offset": { "type": "integer", "minimum": 0, "default": 0 }
            },
            "required": []
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let search = optional_string(arguments, "search");
        let limit = clamp_i64(arguments, "limit", api::PAGE_LIMIT_MIN, api::PAGE_LIMIT_MAX, api::PAGE_LIMIT_DEFAULT);
        let offset = offset_or_zero(arguments, "offset");
        let page = ctx.storage.list_template_packs(search.as_deref(), limit, offset).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({
            "template_packs": page.items,
            "pagination": { "total": page.total, "limit": limit, "offset": offset, "has_more": page.has_more }
        })))
    }
}

pub struct GetTemplatePackTool;

#[async_trait::async_trait]
impl McpTool for GetTemplatePackTool {
    fn name(&self) -> &'static str {
        "get_template_pack"
    }

    fn description(&self) -> &'static str {
        "Fetch a template pack by id."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "pack_id": { "type": "string" } }, "required": ["pack_id"] })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let pack_id = require_uuid(arguments, "pack_id")?;
        let pack = ctx
            .storage
            .get_template_pack(pack_id)
            .await
            .map_err(|e| ToolError::validation("pack_id", e))?;
        Ok(ToolResult::ok(&pack))
    }
}

pub struct CreateTemplatePackTool;

#[async_trait::async_trait]
impl McpTool for CreateTemplatePackTool {
    fn name(&self) -> &'static str {
        "create_template_pack"
    }

    fn description(&self) -> &'static str {
        "Create a manually authored template pack from a name, version, and object-type schema bundle."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "version": { "type": "string" },
                "object_type_schemas": { "type": "object" }
            },
            "required": ["name", "version", "object_type_schemas"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let name = require_string(arguments, "name")?;
        let version = require_string(arguments, "version")?;
        let object_type_schemas = arguments
            .get("object_type_schemas")
            .cloned()
            .filter(Value::is_object)
            .ok_or_else(|| ToolError::validation("object_type_schemas", "required and must be an object"))?;

        let pack = ctx
            .storage
            .create_template_pack(name, version, object_type_schemas)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "success": true, "template_pack": pack })))
    }
}

pub struct DeleteTemplatePackTool;

#[async_trait::async_trait]
impl McpTool for DeleteTemplatePackTool {
    fn name(&self) -> &'static str {
        "delete_template_pack"
    }

    fn description(&self) -> &'static str {
        "Delete a manually authored template pack not currently installed anywhere."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "pack_id": { "type": "string" } }, "required": ["pack_id"] })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let pack_id = require_uuid(arguments, "pack_id")?;
        ctx.storage.delete_template_pack(pack_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "success": true, "message": "template pack deleted" })))
    }
}

pub struct GetAvailableTemplatesTool;

#[async_trait::async_trait]
impl McpTool for GetAvailableTemplatesTool {
    fn name(&self) -> &'static str {
        "get_available_templates"
    }

    fn description(&self) -> &'static str {
        "List template packs available to install into the project (not already installed)."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, ctx: &ToolContext, _arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let packs = ctx.storage.get_available_templates(project_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "template_packs": packs })))
    }
}

pub struct GetInstalledTemplatesTool;

#[async_trait::async_trait]
impl McpTool for GetInstalledTemplatesTool {
    fn name(&self) -> &'static str {
        "get_installed_templates"
    }

    fn description(&self) -> &'static str {
        "List template-pack assignments installed into the project."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, ctx: &ToolContext, _arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let assignments = ctx.storage.get_installed_templates(project_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "assignments": assignments })))
    }
}

pub struct AssignTemplatePackTool;

#[async_trait::async_trait]
impl McpTool for AssignTemplatePackTool {
    fn name(&self) -> &'static str {
        "assign_template_pack"
    }

    fn description(&self) -> &'static str {
        "Install a template pack into the project, skipping any type that conflicts with an \
         existing registry entry."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "template_pack_id": { "type": "string" },
                "disabled_types": { "type": "array", "items": { "type": "string" }, "default": [] }
            },
            "required": ["template_pack_id"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let template_pack_id = require_uuid(arguments, "template_pack_id")?;
        let disabled_types = coerce_string_array(arguments, "disabled_types");

        let outcome = ctx
            .storage
            .assign_template_pack(project_id, template_pack_id, disabled_types)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&outcome))
    }
}

pub struct UpdateTemplateAssignmentTool;

#[async_trait::async_trait]
impl McpTool for UpdateTemplateAssignmentTool {
    fn name(&self) -> &'static str {
        "update_template_assignment"
    }

    fn description(&self) -> &'static str {
        "Toggle a template-pack assignment's active flag."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "assignment_id": { "type": "string" },
                "active": { "type": "boolean", "default": true }
            },
            "required": ["assignment_id"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let assignment_id = require_uuid(arguments, "assignment_id")?;
        let active = arguments.get("active").and_then(Value::as_bool).unwrap_or(true);

        let assignment = ctx
            .storage
            .update_template_assignment(project_id, assignment_id, active)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&assignment))
    }
}

pub struct UninstallTemplatePackTool;

#[async_trait::async_trait]
impl McpTool for UninstallTemplatePackTool {
    fn name(&self) -> &'static str {
        "uninstall_template_pack"
    }

    fn description(&self) -> &'static str {
        "Uninstall a template-pack assignment; refuses if any live object still uses one of its types."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "assignment_id": { "type": "string" } },
            "required": ["assignment_id"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let assignment_id = require_uuid(arguments, "assignment_id")?;
        ctx.storage
            .uninstall_template_pack(project_id, assignment_id)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "success": true, "message": "template pack uninstalled" })))
    }
}
