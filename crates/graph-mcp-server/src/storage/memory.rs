//! In-memory reference implementation of [`StorageClient`].
//!
//! Backs unit and integration tests. Mirrors the row-level-isolation contract of the real
//! engine by filtering every read/write on `project_id`, even though there is no actual SQL
//! transaction or RLS predicate underneath.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::model::*;
use super::{Page, SortKey, SortOrder, StorageClient, TraversalDirection};

#[derive(Default)]
struct State {
    entities: HashMap<Uuid, Entity>,
    relationships: HashMap<Uuid, Relationship>,
    template_packs: HashMap<Uuid, TemplatePack>,
    assignments: HashMap<Uuid, TemplateAssignment>,
    /// (project_id, entity_type) -> template_pack_id that installed it.
    type_registry: HashMap<(Uuid, String), Uuid>,
}

/// In-memory storage collaborator. Cheap to construct; intended for tests and as the
/// gateway's only shipped `StorageClient` implementation. The real graph engine this
/// stands in for is an external, unimplemented collaborator.
pub struct InMemoryStorage {
    state: Mutex<State>,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()) }
    }

    /// Seed a system template pack directly, bypassing `create_template_pack`'s
    /// "manual" source tag. Useful for tests that need a pre-installed pack.
    pub fn seed_template_pack(&self, pack: TemplatePack) {
        let mut state = self.state.lock().unwrap();
        state.template_packs.insert(pack.id, pack);
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(what: &str, id: Uuid) -> String {
    format!("{what} not found: {id}")
}

fn matches_project(e: &Entity, project_id: Uuid) -> bool {
    e.project_id == project_id && e.deleted_at.is_none()
}

#[async_trait]
impl StorageClient for InMemoryStorage {
    async fn list_entities(
        &self,
        project_id: Uuid,
        entity_type: Option<&str>,
        sort_key: SortKey,
        sort_order: SortOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Entity>, String> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<Entity> = state
            .entities
            .values()
            .filter(|e| matches_project(e, project_id))
            .filter(|e| entity_type.is_none_or(|t| e.entity_type == t))
            .cloned()
            .collect();

        items.sort_by(|a, b| {
            let ord = match sort_key {
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortKey::Name => a.name().unwrap_or_default().cmp(b.name().unwrap_or_default()),
            };
            if sort_order == SortOrder::Desc { ord.reverse() } else { ord }
        });

        let total = items.len() as i64;
        let page: Vec<Entity> = items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        let has_more = offset + limit < total;
        Ok(Page { items: page, total, has_more })
    }

    async fn search_entities(
        &self,
        project_id: Uuid,
        query: &str,
        entity_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Entity>, String> {
        let needle = query.to_lowercase();
        let state = self.state.lock().unwrap();
        let mut items: Vec<Entity> = state
            .entities
            .values()
            .filter(|e| matches_project(e, project_id))
            .filter(|e| entity_type.is_none_or(|t| e.entity_type == t))
            .filter(|e| {
                e.key.to_lowercase().contains(&needle)
                    || e.name().is_some_and(|n| n.to_lowercase().contains(&needle))
                    || e.description().is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }

    async fn get_entity(&self, project_id: Uuid, entity_id: Uuid) -> Result<Entity, String> {
        let state = self.state.lock().unwrap();
        state
            .entities
            .get(&entity_id)
            .filter(|e| e.project_id == project_id)
            .cloned()
            .ok_or_else(|| not_found("entity", entity_id))
    }

    async fn create_entity(
        &self,
        project_id: Uuid,
        entity_type: String,
        key: String,
        properties: serde_json::Map<String, serde_json::Value>,
        labels: Vec<String>,
    ) -> Result<Entity, String> {
        let now = Utc::now();
        let entity = Entity {
            id: Uuid::new_v4(),
            project_id,
            entity_type,
            key,
            properties,
            labels,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let mut state = self.state.lock().unwrap();
        state.entities.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update_entity(
        &self,
        project_id: Uuid,
        entity_id: Uuid,
        properties_patch: serde_json::Map<String, serde_json::Value>,
        replace_labels: Option<Vec<String>>,
    ) -> Result<Entity, String> {
        let mut state = self.state.lock().unwrap();
        let entity = state
            .entities
            .get_mut(&entity_id)
            .filter(|e| e.project_id == project_id)
            .ok_or_else(|| not_found("entity", entity_id))?;

        for (k, v) in properties_patch {
            if v.is_null() {
                entity.properties.remove(&k);
            } else {
                entity.properties.insert(k, v);
            }
        }
        if let Some(labels) = replace_labels {
            entity.labels = labels;
        }
        entity.updated_at = Utc::now();
        Ok(entity.clone())
    }

    async fn delete_entity(&self, project_id: Uuid, entity_id: Uuid) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        let entity = state
            .entities
            .get_mut(&entity_id)
            .filter(|e| e.project_id == project_id)
            .ok_or_else(|| not_found("entity", entity_id))?;
        entity.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn restore_entity(&self, project_id: Uuid, entity_id: Uuid) -> Result<Entity, String> {
        let mut state = self.state.lock().unwrap();
        let entity = state
            .entities
            .get_mut(&entity_id)
            .filter(|e| e.project_id == project_id)
            .ok_or_else(|| not_found("entity", entity_id))?;
        entity.deleted_at = None;
        entity.updated_at = Utc::now();
        Ok(entity.clone())
    }

    async fn get_entity_edges(
        &self,
        project_id: Uuid,
        entity_id: Uuid,
    ) -> Result<EntityEdges, String> {
        let state = self.state.lock().unwrap();
        state
            .entities
            .get(&entity_id)
            .filter(|e| e.project_id == project_id)
            .ok_or_else(|| not_found("entity", entity_id))?;

        let mut edges = EntityEdges::default();
        for rel in state.relationships.values() {
            if rel.project_id != project_id || rel.deleted_at.is_some() {
                continue;
            }
            if rel.target_id == entity_id {
                if let Some(src) = state.entities.get(&rel.source_id).filter(|e| e.deleted_at.is_none()) {
                    edges.incoming.push(EdgeView { relationship: rel.clone(), counterpart: src.into() });
                }
            }
            if rel.source_id == entity_id {
                if let Some(dst) = state.entities.get(&rel.target_id).filter(|e| e.deleted_at.is_none()) {
                    edges.outgoing.push(EdgeView { relationship: rel.clone(), counterpart: dst.into() });
                }
            }
        }
        Ok(edges)
    }

    async fn list_relationships(
        &self,
        project_id: Uuid,
        relationship_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Relationship>, String> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<Relationship> = state
            .relationships
            .values()
            .filter(|r| r.project_id == project_id && r.deleted_at.is_none())
            .filter(|r| relationship_type.is_none_or(|t| r.relationship_type == t))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = items.len() as i64;
        let page: Vec<Relationship> =
            items.into_iter().skip(offset.max(0) as usize).take(limit.max(0) as usize).collect();
        let has_more = offset + limit < total;
        Ok(Page { items: page, total, has_more })
    }

    async fn create_relationship(
        &self,
        project_id: Uuid,
        relationship_type: String,
        source_id: Uuid,
        target_id: Uuid,
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Relationship, String> {
        let now = Utc::now();
        let rel = Relationship {
            id: Uuid::new_v4(),
            project_id,
            relationship_type,
            source_id,
            target_id,
            properties,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let mut state = self.state.lock().unwrap();
        state.relationships.insert(rel.id, rel.clone());
        Ok(rel)
    }

    async fn update_relationship(
        &self,
        project_id: Uuid,
        relationship_id: Uuid,
        properties_patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Relationship, String> {
        let mut state = self.state.lock().unwrap();
        let rel = state
            .relationships
            .get_mut(&relationship_id)
            .filter(|r| r.project_id == project_id)
            .ok_or_else(|| not_found("relationship", relationship_id))?;
        for (k, v) in properties_patch {
            if v.is_null() {
                rel.properties.remove(&k);
            } else {
                rel.properties.insert(k, v);
            }
        }
        rel.updated_at = Utc::now();
        Ok(rel.clone())
    }

    async fn delete_relationship(&self, project_id: Uuid, relationship_id: Uuid) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        let rel = state
            .relationships
            .get_mut(&relationship_id)
            .filter(|r| r.project_id == project_id)
            .ok_or_else(|| not_found("relationship", relationship_id))?;
        rel.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn hybrid_search(
        &self,
        project_id: Uuid,
        query: &str,
        entity_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Entity>, String> {
        self.search_entities(project_id, query, entity_type, limit).await
    }

    async fn semantic_search(
        &self,
        project_id: Uuid,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Entity>, String> {
        self.search_entities(project_id, query, None, limit).await
    }

    async fn find_similar(
        &self,
        project_id: Uuid,
        entity_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Entity>, String> {
        let state = self.state.lock().unwrap();
        let reference = state
            .entities
            .get(&entity_id)
            .filter(|e| e.project_id == project_id)
            .ok_or_else(|| not_found("entity", entity_id))?;
        let mut items: Vec<Entity> = state
            .entities
            .values()
            .filter(|e| matches_project(e, project_id) && e.id != entity_id)
            .filter(|e| e.entity_type == reference.entity_type)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }

    async fn traverse_graph(
        &self,
        project_id: Uuid,
        start_entity_ids: Vec<Uuid>,
        max_depth: u32,
        direction: TraversalDirection,
        relationship_type: Option<&str>,
    ) -> Result<Vec<Entity>, String> {
        let state = self.state.lock().unwrap();
        let mut visited: std::collections::HashSet<Uuid> = start_entity_ids.iter().copied().collect();
        let mut frontier = start_entity_ids;
        let mut collected = Vec::new();

        for _ in 0..max_depth.max(1) {
            let mut next_frontier = Vec::new();
            for id in &frontier {
                for rel in state.relationships.values() {
                    if rel.project_id != project_id || rel.deleted_at.is_some() {
                        continue;
                    }
                    if let Some(t) = relationship_type {
                        if rel.relationship_type != t {
                            continue;
                        }
                    }
                    let neighbor = match direction {
                        TraversalDirection::Outgoing if rel.source_id == *id => Some(rel.target_id),
                        TraversalDirection::Incoming if rel.target_id == *id => Some(rel.source_id),
                        TraversalDirection::Both if rel.source_id == *id => Some(rel.target_id),
                        TraversalDirection::Both if rel.target_id == *id => Some(rel.source_id),
                        _ => None,
                    };
                    if let Some(n) = neighbor {
                        if visited.insert(n) {
                            next_frontier.push(n);
                        }
                    }
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        for id in visited {
            if let Some(e) = state.entities.get(&id).filter(|e| e.deleted_at.is_none()) {
                collected.push(e.clone());
            }
        }
        Ok(collected)
    }

    async fn list_tags(&self, project_id: Uuid) -> Result<Vec<TagAggregate>, String> {
        let state = self.state.lock().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for e in state.entities.values().filter(|e| matches_project(e, project_id)) {
            for label in &e.labels {
                *counts.entry(label.clone()).or_default() += 1;
            }
        }
        let mut tags: Vec<TagAggregate> =
            counts.into_iter().map(|(tag, count)| TagAggregate { tag, count }).collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then(a.tag.cmp(&b.tag)));
        Ok(tags)
    }

    async fn list_entity_types(&self, project_id: Uuid) -> Result<Vec<EntityTypeSummary>, String> {
        let state = self.state.lock().unwrap();
        let mut by_type: HashMap<String, i64> = HashMap::new();
        for e in state.entities.values().filter(|e| matches_project(e, project_id)) {
            *by_type.entry(e.entity_type.clone()).or_default() += 1;
        }

        let mut rel_agg: HashMap<(String, String, String), i64> = HashMap::new();
        for rel in state.relationships.values().filter(|r| r.project_id == project_id && r.deleted_at.is_none()) {
            let (Some(src), Some(dst)) =
                (state.entities.get(&rel.source_id), state.entities.get(&rel.target_id))
            else {
                continue;
            };
            let key = (rel.relationship_type.clone(), src.entity_type.clone(), dst.entity_type.clone());
            *rel_agg.entry(key).or_default() += 1;
        }

        let mut summaries: Vec<EntityTypeSummary> = by_type
            .into_iter()
            .map(|(entity_type, object_count)| {
                let relationship_aggregates = rel_agg
                    .iter()
                    .filter(|((_, src, _), _)| *src == entity_type)
                    .map(|((rel_type, source_type, destination_type), count)| RelationshipTypeAggregate {
                        relationship_type: rel_type.clone(),
                        source_type: source_type.clone(),
                        destination_type: destination_type.clone(),
                        count: *count,
                    })
                    .collect();
                EntityTypeSummary { entity_type, object_count, relationship_aggregates }
            })
            .collect();
        summaries.sort_by(|a, b| a.entity_type.cmp(&b.entity_type));
        Ok(summaries)
    }

    async fn list_template_packs(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<TemplatePack>, String> {
        let state = self.state.lock().unwrap();
        let needle = search.map(str::to_lowercase);
        let mut items: Vec<TemplatePack> = state
            .template_packs
            .values()
            .filter(|p| !p.draft && !p.deprecated)
            .filter(|p| needle.as_deref().is_none_or(|n| p.name.to_lowercase().contains(n)))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        let total = items.len() as i64;
        let page: Vec<TemplatePack> =
            items.into_iter().skip(offset.max(0) as usize).take(limit.max(0) as usize).collect();
        let has_more = offset + limit < total;
        Ok(Page { items: page, total, has_more })
    }

    async fn get_template_pack(&self, pack_id: Uuid) -> Result<TemplatePack, String> {
        let state = self.state.lock().unwrap();
        state.template_packs.get(&pack_id).cloned().ok_or_else(|| not_found("template pack", pack_id))
    }

    async fn create_template_pack(
        &self,
        name: String,
        version: String,
        object_type_schemas: serde_json::Value,
    ) -> Result<TemplatePack, String> {
        let canonical = serde_json::to_string(&object_type_schemas)
            .map_err(|e| format!("cannot canonicalize schema bundle: {e}"))?;
        let checksum = format!("{:x}", md5::compute(canonical.as_bytes()));
        let pack = TemplatePack {
            id: Uuid::new_v4(),
            name,
            version,
            source: TemplatePackSource::Manual,
            object_type_schemas,
            checksum,
            draft: false,
            deprecated: false,
            updated_at: Utc::now(),
        };
        let mut state = self.state.lock().unwrap();
        state.template_packs.insert(pack.id, pack.clone());
        Ok(pack)
    }

    async fn delete_template_pack(&self, pack_id: Uuid) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        let pack = state
            .template_packs
            .get(&pack_id)
            .cloned()
            .ok_or_else(|| not_found("template pack", pack_id))?;
        if pack.source == TemplatePackSource::System {
            return Err("cannot delete a system template pack".to_string());
        }
        if state.assignments.values().any(|a| a.template_pack_id == pack_id) {
            return Err("cannot delete: template pack is installed in at least one project".to_string());
        }
        state.template_packs.remove(&pack_id);
        Ok(())
    }

    async fn get_available_templates(&self, project_id: Uuid) -> Result<Vec<TemplatePack>, String> {
        let state = self.state.lock().unwrap();
        let installed: std::collections::HashSet<Uuid> = state
            .assignments
            .values()
            .filter(|a| a.project_id == project_id)
            .map(|a| a.template_pack_id)
            .collect();
        Ok(state
            .template_packs
            .values()
            .filter(|p| !p.draft && !p.deprecated && !installed.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn get_installed_templates(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<TemplateAssignment>, String> {
        let state = self.state.lock().unwrap();
        Ok(state.assignments.values().filter(|a| a.project_id == project_id).cloned().collect())
    }

    async fn assign_template_pack(
        &self,
        project_id: Uuid,
        template_pack_id: Uuid,
        disabled_types: Vec<String>,
    ) -> Result<AssignmentOutcome, String> {
        let mut state = self.state.lock().unwrap();
        if state
            .assignments
            .values()
            .any(|a| a.project_id == project_id && a.template_pack_id == template_pack_id)
        {
            return Err("template pack is already assigned to this project".to_string());
        }
        let pack = state
            .template_packs
            .get(&template_pack_id)
            .cloned()
            .ok_or_else(|| not_found("template pack", template_pack_id))?;

        let all_types: Vec<String> = pack
            .object_type_schemas
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        let mut installed_types = Vec::new();
        let mut conflicts = Vec::new();
        for type_name in all_types {
            if disabled_types.contains(&type_name) {
                continue;
            }
            if state.type_registry.contains_key(&(project_id, type_name.clone())) {
                conflicts.push(type_name);
                continue;
            }
            state.type_registry.insert((project_id, type_name.clone()), template_pack_id);
            installed_types.push(type_name);
        }

        let assignment = TemplateAssignment {
            id: Uuid::new_v4(),
            project_id,
            template_pack_id,
            active: true,
            created_at: Utc::now(),
        };
        state.assignments.insert(assignment.id, assignment.clone());

        Ok(AssignmentOutcome { assignment, installed_types, conflicts })
    }

    async fn update_template_assignment(
        &self,
        project_id: Uuid,
        assignment_id: Uuid,
        active: bool,
    ) -> Result<TemplateAssignment, String> {
        let mut state = self.state.lock().unwrap();
        let assignment = state
            .assignments
            .get_mut(&assignment_id)
            .filter(|a| a.project_id == project_id)
            .ok_or_else(|| not_found("template assignment", assignment_id))?;
        assignment.active = active;
        Ok(assignment.clone())
    }

    async fn uninstall_template_pack(
        &self,
        project_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        let assignment = state
            .assignments
            .get(&assignment_id)
            .filter(|a| a.project_id == project_id)
            .cloned()
            .ok_or_else(|| not_found("template assignment", assignment_id))?;

        let installed_types: Vec<String> = state
            .type_registry
            .iter()
            .filter(|((pid, _), pack_id)| *pid == project_id && **pack_id == assignment.template_pack_id)
            .map(|((_, t), _)| t.clone())
            .collect();

        let live_count = state
            .entities
            .values()
            .filter(|e| matches_project(e, project_id) && installed_types.contains(&e.entity_type))
            .count();
        if live_count > 0 {
            return Err(format!(
                "cannot uninstall: {live_count} objects still exist using types from this template pack"
            ));
        }

        for type_name in installed_types {
            state.type_registry.remove(&(project_id, type_name));
        }
        state.assignments.remove(&assignment_id);
        Ok(())
    }

    async fn preview_schema_migration(
        &self,
        project_id: Uuid,
        from_version: &str,
        to_version: &str,
    ) -> Result<MigrationPreview, String> {
        let state = self.state.lock().unwrap();
        let candidates: Vec<&Entity> = state
            .entities
            .values()
            .filter(|e| matches_project(e, project_id))
            .take(50)
            .collect();
        Ok(MigrationPreview {
            objects_previewed: candidates.len(),
            summary: format!(
                "{} objects would migrate from {from_version} to {to_version}",
                candidates.len()
            ),
            recommended_cli: vec![format!(
                "graph-mcp-server migrate --project {project_id} --from {from_version} --to {to_version}"
            )],
        })
    }

    async fn list_migration_archives(&self, project_id: Uuid) -> Result<Vec<Entity>, String> {
        let state = self.state.lock().unwrap();
        Ok(state
            .entities
            .values()
            .filter(|e| matches_project(e, project_id))
            .filter(|e| e.properties.get("migration_archive").is_some_and(|v| !v.is_null()))
            .cloned()
            .collect())
    }

    async fn get_migration_archive(
        &self,
        project_id: Uuid,
        object_id: Uuid,
    ) -> Result<Vec<MigrationArchiveEntry>, String> {
        let state = self.state.lock().unwrap();
        let entity = state
            .entities
            .get(&object_id)
            .filter(|e| e.project_id == project_id)
            .ok_or_else(|| not_found("entity", object_id))?;

        let Some(archive) = entity.properties.get("migration_archive").and_then(|v| v.as_array())
        else {
            return Ok(Vec::new());
        };

        Ok(archive
            .iter()
            .filter_map(|entry| {
                let from_version = entry.get("from_version")?.as_str()?.to_string();
                let to_version = entry.get("to_version")?.as_str()?.to_string();
                Some(MigrationArchiveEntry {
                    object_id,
                    rollback_cli: format!(
                        "graph-mcp-server migrate --project {project_id} --object {object_id} --from {to_version} --to {from_version}"
                    ),
                    from_version,
                    to_version,
                    migrated_at: entity.updated_at,
                    dropped_fields: entry
                        .get("dropped_fields")
                        .and_then(|v| v.as_object())
                        .cloned()
                        .unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn schema_fingerprint_inputs(&self) -> Result<Vec<(Uuid, i64)>, String> {
        let state = self.state.lock().unwrap();
        let mut pairs: Vec<(Uuid, i64)> =
            state.template_packs.values().map(|p| (p.id, p.updated_at.timestamp())).collect();
        pairs.sort_by_key(|(id, _)| *id);
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> Uuid {
        Uuid::new_v4()
    }

    #[tokio::test]
    async fn create_then_get_entity_edges_is_empty() {
        let storage = InMemoryStorage::new();
        let project = pid();
        let entity = storage
            .create_entity(project, "Person".to_string(), "alice".to_string(), serde_json::Map::new(), vec![])
            .await
            .unwrap();
        let edges = storage.get_entity_edges(project, entity.id).await.unwrap();
        assert!(edges.incoming.is_empty());
        assert!(edges.outgoing.is_empty());
    }

    #[tokio::test]
    async fn uninstall_refuses_when_live_objects_exist() {
        let storage = InMemoryStorage::new();
        let project = pid();
        let pack = storage
            .create_template_pack(
                "People".to_string(),
                "1.0".to_string(),
                serde_json::json!({ "Person": {} }),
            )
            .await
            .unwrap();
        let outcome = storage.assign_template_pack(project, pack.id, vec![]).await.unwrap();
        storage
            .create_entity(project, "Person".to_string(), "alice".to_string(), serde_json::Map::new(), vec![])
            .await
            .unwrap();

        let err = storage
            .uninstall_template_pack(project, outcome.assignment.id)
            .await
            .unwrap_err();
        assert!(err.contains("1 objects still exist"));
    }

    #[tokio::test]
    async fn assign_then_uninstall_with_no_objects_clears_registry() {
        let storage = InMemoryStorage::new();
        let project = pid();
        let pack = storage
            .create_template_pack(
                "People".to_string(),
                "1.0".to_string(),
                serde_json::json!({ "Person": {} }),
            )
            .await
            .unwrap();
        let outcome = storage.assign_template_pack(project, pack.id, vec![]).await.unwrap();
        assert_eq!(outcome.installed_types, vec!["Person".to_string()]);

        storage.uninstall_template_pack(project, outcome.assignment.id).await.unwrap();
        let installed = storage.get_installed_templates(project).await.unwrap();
        assert!(installed.is_empty());
    }
}
