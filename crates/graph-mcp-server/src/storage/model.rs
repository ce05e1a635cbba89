//! Value types exchanged with the storage collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub project_id: Uuid,
    pub entity_type: String,
    pub key: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(|v| v.as_str())
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.properties.get("description").and_then(|v| v.as_str())
    }
}

/// A compact counterpart summary embedded in `get_entity_edges` results.
#[derive(Debug, Clone, Serialize)]
pub struct EntitySummary {
    pub id: Uuid,
    pub entity_type: String,
    pub key: String,
    pub name: Option<String>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl From<&Entity> for EntitySummary {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id,
            entity_type: e.entity_type.clone(),
            key: e.key.clone(),
            name: e.name().map(str::to_string),
            properties: e.properties.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeView {
    pub relationship: Relationship,
    pub counterpart: EntitySummary,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct EntityEdges {
    pub incoming: Vec<EdgeView>,
    pub outgoing: Vec<EdgeView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: Uuid,
    pub project_id: Uuid,
    pub relationship_type: String,
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityTypeSummary {
    pub entity_type: String,
    pub object_count: i64,
    pub relationship_aggregates: Vec<RelationshipTypeAggregate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipTypeAggregate {
    pub relationship_type: String,
    pub source_type: String,
    pub destination_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagAggregate {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplatePackSource {
    System,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatePack {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub source: TemplatePackSource,
    pub object_type_schemas: serde_json::Value,
    pub checksum: String,
    pub draft: bool,
    pub deprecated: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateAssignment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub template_pack_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of `assign_template_pack`: the set of types actually installed, and any that
/// conflicted with an existing registry entry and were skipped.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcome {
    pub assignment: TemplateAssignment,
    pub installed_types: Vec<String>,
    pub conflicts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationPreview {
    pub objects_previewed: usize,
    pub summary: String,
    pub recommended_cli: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationArchiveEntry {
    pub object_id: Uuid,
    pub from_version: String,
    pub to_version: String,
    pub migrated_at: DateTime<Utc>,
    pub dropped_fields: serde_json::Map<String, serde_json::Value>,
    pub rollback_cli: String,
}
