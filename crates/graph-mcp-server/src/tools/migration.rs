//! Schema-migration preview/archive tools.
//!
//! None of these mutate data — `preview_schema_migration` only samples objects to describe
//! what a real migration would touch.

use serde_json::{json, Map, Value};

use super::args::require_string;
use super::args::require_uuid;
use super::{McpTool, ToolContext, ToolResult};
use crate::error::{ToolError, ToolOutcome};

pub struct PreviewSchemaMigrationTool;

#[async_trait::async_trait]
impl McpTool for PreviewSchemaMigrationTool {
    fn name(&self) -> &'static str {
        "preview_schema_migration"
    }

    fn description(&self) -> &'static str {
        "Preview up to 50 objects that would migrate between two schema versions, without mutating data."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "from_version": { "type": "string" },
                "to_version": { "type": "string" }
            },
            "required": ["from_version", "to_version"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let from_version = require_string(arguments, "from_version")?;
        let to_version = require_string(arguments, "to_version")?;
        let preview = ctx
            .storage
            .preview_schema_migration(project_id, &from_version, &to_version)
            .await
            .map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&preview))
    }
}

pub struct ListMigrationArchivesTool;

#[async_trait::async_trait]
impl McpTool for ListMigrationArchivesTool {
    fn name(&self) -> &'static str {
        "list_migration_archives"
    }

    fn description(&self) -> &'static str {
        "List objects that carry a non-empty migration archive."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, ctx: &ToolContext, _arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let objects = ctx.storage.list_migration_archives(project_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "objects": objects })))
    }
}

pub struct GetMigrationArchiveTool;

#[async_trait::async_trait]
impl McpTool for GetMigrationArchiveTool {
    fn name(&self) -> &'static str {
        "get_migration_archive"
    }

    fn description(&self) -> &'static str {
        "Return per-object migration archive entries with from/to version, timestamp, and rollback hints."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "object_id": { "type": "string" } }, "required": ["object_id"] })
    }

    async fn execute(&self, ctx: &ToolContext, arguments: &Map<String, Value>) -> ToolOutcome<ToolResult> {
        let project_id = ctx.require_project_id(self.name())?;
        let object_id = require_uuid(arguments, "object_id")?;
        let entries =
            ctx.storage.get_migration_archive(project_id, object_id).await.map_err(ToolError::storage)?;
        Ok(ToolResult::ok(&json!({ "entries": entries })))
    }
}
