//! The storage/graph collaborator interface.
//!
//! The real engine — relational tables, row-level tenant isolation, vector/hybrid search,
//! transactional cascades — lives outside this crate. This module defines the narrow
//! surface the MCP core consumes, modeled as the [`StorageClient`] trait, plus a single
//! [`memory::InMemoryStorage`] implementation that backs unit and integration tests.
//! Swapping in a real database means providing another `StorageClient` impl; no dispatcher
//! or tool-handler code changes.

pub mod memory;
pub mod model;

use async_trait::async_trait;
use uuid::Uuid;

pub use model::*;

/// Direction filter for graph traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalDirection {
    Outgoing,
    Incoming,
    Both,
}

/// Sort key whitelist for `query_entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    Name,
}

impl SortKey {
    /// Anything outside the whitelist silently falls back to `created_at`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "updated_at" => Self::UpdatedAt,
            "name" => Self::Name,
            _ => Self::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "asc" => Self::Asc,
            _ => Self::Desc,
        }
    }
}

/// A page of rows plus whether more rows exist beyond it.
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub has_more: bool,
}

/// The narrow collaborator interface the MCP core consumes. Every operation takes a
/// `project_id` first: the real engine sets a row-level-security context scalar to this
/// value at transaction open so each call only ever sees that tenant's rows.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn list_entities(
        &self,
        project_id: Uuid,
        entity_type: Option<&str>,
        sort_key: SortKey,
        sort_order: SortOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Entity>, String>;

    async fn search_entities(
        &self,
        project_id: Uuid,
        query: &str,
        entity_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Entity>, String>;

    async fn get_entity(&self, project_id: Uuid, entity_id: Uuid) -> Result<Entity, String>;

    async fn create_entity(
        &self,
        project_id: Uuid,
        entity_type: String,
        key: String,
        properties: serde_json::Map<String, serde_json::Value>,
        labels: Vec<String>,
    ) -> Result<Entity, String>;

    async fn update_entity(
        &self,
        project_id: Uuid,
        entity_id: Uuid,
        properties_patch: serde_json::Map<String, serde_json::Value>,
        replace_labels: Option<Vec<String>>,
    ) -> Result<Entity, String>;

    async fn delete_entity(&self, project_id: Uuid, entity_id: Uuid) -> Result<(), String>;

    async fn restore_entity(&self, project_id: Uuid, entity_id: Uuid) -> Result<Entity, String>;

    async fn get_entity_edges(
        &self,
        project_id: Uuid,
        entity_id: Uuid,
    ) -> Result<EntityEdges, String>;

    async fn list_relationships(
        &self,
        project_id: Uuid,
        relationship_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Relationship>, String>;

    async fn create_relationship(
        &self,
        project_id: Uuid,
        relationship_type: String,
        source_id: Uuid,
        target_id: Uuid,
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Relationship, String>;

    async fn update_relationship(
        &self,
        project_id: Uuid,
        relationship_id: Uuid,
        properties_patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Relationship, String>;

    async fn delete_relationship(&self, project_id: Uuid, relationship_id: Uuid) -> Result<(), String>;

    async fn hybrid_search(
        &self,
        project_id: Uuid,
        query: &str,
        entity_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Entity>, String>;

    async fn semantic_search(
        &self,
        project_id: Uuid,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Entity>, String>;

    async fn find_similar(
        &self,
        project_id: Uuid,
        entity_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Entity>, String>;

    async fn traverse_graph(
        &self,
        project_id: Uuid,
        start_entity_ids: Vec<Uuid>,
        max_depth: u32,
        direction: TraversalDirection,
        relationship_type: Option<&str>,
    ) -> Result<Vec<Entity>, String>;

    async fn list_tags(&self, project_id: Uuid) -> Result<Vec<TagAggregate>, String>;

    async fn list_entity_types(&self, project_id: Uuid) -> Result<Vec<EntityTypeSummary>, String>;

    // Template packs (global, not project-scoped)

    async fn list_template_packs(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<TemplatePack>, String>;

    async fn get_template_pack(&self, pack_id: Uuid) -> Result<TemplatePack, String>;

    async fn create_template_pack(
        &self,
        name: String,
        version: String,
        object_type_schemas: serde_json::Value,
    ) -> Result<TemplatePack, String>;

    async fn delete_template_pack(&self, pack_id: Uuid) -> Result<(), String>;

    async fn get_available_templates(&self, project_id: Uuid) -> Result<Vec<TemplatePack>, String>;

    async fn get_installed_templates(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<TemplateAssignment>, String>;

    async fn assign_template_pack(
        &self,
        project_id: Uuid,
        template_pack_id: Uuid,
        disabled_types: Vec<String>,
    ) -> Result<AssignmentOutcome, String>;

    async fn update_template_assignment(
        &self,
        project_id: Uuid,
        assignment_id: Uuid,
        active: bool,
    ) -> Result<TemplateAssignment, String>;

    async fn uninstall_template_pack(
        &self,
        project_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<(), String>;

    // Migration

    async fn preview_schema_migration(
        &self,
        project_id: Uuid,
        from_version: &str,
        to_version: &str,
    ) -> Result<MigrationPreview, String>;

    async fn list_migration_archives(&self, project_id: Uuid) -> Result<Vec<Entity>, String>;

    async fn get_migration_archive(
        &self,
        project_id: Uuid,
        object_id: Uuid,
    ) -> Result<Vec<MigrationArchiveEntry>, String>;

    /// Ordered `(pack_id, updated_at_unix)` pairs for every installed template pack,
    /// consumed by the schema-version fingerprint cache.
    async fn schema_fingerprint_inputs(&self) -> Result<Vec<(Uuid, i64)>, String>;
}
