//! Resource catalog and `resources/read` dispatch.
//!
//! Resources are declarative, read-only views identified by an `emergent://` URI. The
//! catalog is fixed — six entries — and `read` pattern-matches on the URI prefix, reusing
//! the same storage collaborator calls the tool surface uses.

use std::sync::Arc;
use uuid::Uuid;

use serde::Serialize;
use serde_json::json;

use crate::error::RpcError;
use crate::storage::StorageClient;

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDefinition {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

/// The fixed six-entry catalog. Project-scoped entries are templates: the
/// literal `{projectId}` segment is filled in by the caller when reading.
#[must_use]
pub fn catalog() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: "emergent://schema/entity-types",
            name: "Entity type schema",
            description: "JSON Schema for every registered entity type.",
            mime_type: "application/json",
        },
        ResourceDefinition {
            uri: "emergent://schema/relationships",
            name: "Relationship schema",
            description: "JSON Schema for registered relationship types.",
            mime_type: "application/json",
        },
        ResourceDefinition {
            uri: "emergent://templates/catalog",
            name: "Template pack catalog",
            description: "All non-draft, non-deprecated template packs.",
            mime_type: "application/json",
        },
        ResourceDefinition {
            uri: "emergent://projects/{projectId}/metadata",
            name: "Project metadata",
            description: "Entity-type summary for one project.",
            mime_type: "application/json",
        },
        ResourceDefinition {
            uri: "emergent://projects/{projectId}/recent-entities",
            name: "Recent entities",
            description: "The most recently created entities in one project.",
            mime_type: "application/json",
        },
        ResourceDefinition {
            uri: "emergent://projects/{projectId}/installed-templates",
            name: "Installed templates",
            description: "Template-pack assignments installed into one project.",
            mime_type: "application/json",
        },
    ]
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceContents {
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
    pub text: String,
}

/// Read one resource by URI, enforcing that a project-scoped URI's project segment matches
/// the caller's binding.
pub async fn read(
    storage: &Arc<dyn StorageClient>,
    uri: &str,
    caller_project_id: Option<Uuid>,
) -> Result<ResourceContents, RpcError> {
    match uri {
        "emergent://schema/entity-types" => {
            let project_id = caller_project_id
                .ok_or_else(|| RpcError::invalid_params("reading entity-type schema requires a bound project"))?;
            let summaries = storage
                .list_entity_types(project_id)
                .await
                .map_err(|e| RpcError::internal(format!("storage error: {e}")))?;
            ok(uri, &summaries)
        }
        "emergent://schema/relationships" => {
            let project_id = caller_project_id
                .ok_or_else(|| RpcError::invalid_params("reading relationship schema requires a bound project"))?;
            let page = storage
                .list_relationships(project_id, None, 50, 0)
                .await
                .map_err(|e| RpcError::internal(format!("storage error: {e}")))?;
            ok(uri, &page.items)
        }
        "emergent://templates/catalog" => {
            let page = storage
                .list_template_packs(None, 50, 0)
                .await
                .map_err(|e| RpcError::internal(format!("storage error: {e}")))?;
            ok(uri, &page.items)
        }
        _ => read_project_scoped(storage, uri, caller_project_id).await,
    }
}

async fn read_project_scoped(
    storage: &Arc<dyn StorageClient>,
    uri: &str,
    caller_project_id: Option<Uuid>,
) -> Result<ResourceContents, RpcError> {
    let Some(rest) = uri.strip_prefix("emergent://projects/") else {
        return Err(RpcError::not_found(format!("unknown resource uri: {uri}")));
    };
    let mut parts = rest.splitn(2, '/');
    let project_segment = parts.next().unwrap_or_default();
    let view = parts.next().unwrap_or_default();

    let project_id = Uuid::parse_str(project_segment)
        .map_err(|_| RpcError::invalid_params(format!("malformed project id in resource uri: {uri}")))?;
    if caller_project_id != Some(project_id) {
        return Err(RpcError::forbidden("resource project does not match the caller's project binding"));
    }

    match view {
        "metadata" => {
            let summaries = storage
                .list_entity_types(project_id)
                .await
                .map_err(|e| RpcError::internal(format!("storage error: {e}")))?;
            ok(uri, &json!({ "project_id": project_id, "entity_types": summaries }))
        }
        "recent-entities" => {
            let page = storage
                .list_entities(project_id, None, crate::storage::SortKey::CreatedAt, crate::storage::SortOrder::Desc, 20, 0)
                .await
                .map_err(|e| RpcError::internal(format!("storage error: {e}")))?;
            ok(uri, &page.items)
        }
        "installed-templates" => {
            let assignments = storage
                .get_installed_templates(project_id)
                .await
                .map_err(|e| RpcError::internal(format!("storage error: {e}")))?;
            ok(uri, &assignments)
        }
        _ => Err(RpcError::not_found(format!("unknown resource uri: {uri}"))),
    }
}

fn ok(uri: &str, value: &impl Serialize) -> Result<ResourceContents, RpcError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| RpcError::internal(format!("failed to encode resource: {e}")))?;
    Ok(ResourceContents { uri: uri.to_string(), mime_type: "application/json", text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryStorage;

    #[tokio::test]
    async fn unknown_uri_is_not_found() {
        let storage: Arc<dyn StorageClient> = Arc::new(InMemoryStorage::new());
        let err = read(&storage, "emergent://nope", None).await.unwrap_err();
        assert_eq!(err.code, crate::error::codes::NOT_FOUND);
    }

    #[tokio::test]
    async fn project_scoped_uri_rejects_mismatched_caller() {
        let storage: Arc<dyn StorageClient> = Arc::new(InMemoryStorage::new());
        let uri_project = Uuid::new_v4();
        let caller_project = Uuid::new_v4();
        let uri = format!("emergent://projects/{uri_project}/metadata");
        let err = read(&storage, &uri, Some(caller_project)).await.unwrap_err();
        assert_eq!(err.code, crate::error::codes::FORBIDDEN);
    }

    #[tokio::test]
    async fn catalog_has_six_entries() {
        assert_eq!(catalog().len(), 6);
    }
}
