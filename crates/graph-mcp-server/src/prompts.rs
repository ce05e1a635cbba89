//! Prompt catalog and `prompts/get` dispatch.
//!
//! Each prompt validates its required arguments and composes a multi-line instruction
//! string naming the tools an agent should call next; it does not itself touch storage.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::RpcError;

#[derive(Debug, Clone, Serialize)]
pub struct PromptDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: &'static str,
    pub content: PromptContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptGetResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

fn message(text: String) -> PromptMessage {
    PromptMessage { role: "user", content: PromptContent { content_type: "text", text } }
}

#[must_use]
pub fn catalog() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition {
            name: "explore_entity_type",
            description: "Explore every object of a given entity type.",
            arguments: json!({ "type_name": { "required": true } }),
        },
        PromptDefinition {
            name: "create_from_template",
            description: "Install a template pack and create a first object from one of its types.",
            arguments: json!({ "template_pack_id": { "required": true } }),
        },
        PromptDefinition {
            name: "analyze_relationships",
            description: "Analyze the relationship graph around one entity.",
            arguments: json!({ "entity_id": { "required": true } }),
        },
        PromptDefinition {
            name: "setup_research_project",
            description: "Scaffold a new research project: pick template packs, then seed entities.",
            arguments: json!({ "project_name": { "required": true } }),
        },
        PromptDefinition {
            name: "find_related_entities",
            description: "Find entities related to a reference entity via search and traversal.",
            arguments: json!({ "entity_id": { "required": true } }),
        },
    ]
}

fn required_arg(args: &Map<String, Value>, field: &str) -> Result<String, RpcError> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RpcError::invalid_params(format!("prompt argument `{field}` is required")))
}

/// Compose the named prompt's result, or an error if the name is unknown or a required
/// argument is missing.
pub fn get(name: &str, args: &Map<String, Value>) -> Result<PromptGetResult, RpcError> {
    match name {
        "explore_entity_type" => {
            let type_name = required_arg(args, "type_name")?;
            Ok(PromptGetResult {
                description: format!("Explore every object of type `{type_name}`"),
                messages: vec![message(format!(
                    "Explore entity type `{type_name}`. Call `list_entity_types` to see counts, \
                     then `query_entities` with `type_name=\"{type_name}\"` to page through objects. \
                     Use `get_entity_edges` on any interesting object to see its relationships."
                ))],
            })
        }
        "create_from_template" => {
            let template_pack_id = required_arg(args, "template_pack_id")?;
            Ok(PromptGetResult {
                description: format!("Install template pack `{template_pack_id}` and create a first object"),
                messages: vec![message(format!(
                    "Call `assign_template_pack` with `template_pack_id=\"{template_pack_id}\"`. Once \
                     installed, call `list_entity_types` to see the newly registered types, then \
                     `create_entity` to create a first object of one of them."
                ))],
            })
        }
        "analyze_relationships" => {
            let entity_id = required_arg(args, "entity_id")?;
            Ok(PromptGetResult {
                description: format!("Analyze the relationship graph around entity `{entity_id}`"),
                messages: vec![message(format!(
                    "Call `get_entity_edges` with `entity_id=\"{entity_id}\"` to see its direct \
                     relationships, then `traverse_graph` with `start_entity_id=\"{entity_id}\"` and \
                     `max_depth=2` to explore further out."
                ))],
            })
        }
        "setup_research_project" => {
            let project_name = required_arg(args, "project_name")?;
            Ok(PromptGetResult {
                description: format!("Scaffold research project `{project_name}`"),
                messages: vec![message(format!(
                    "Set up project `{project_name}`. Call `get_available_templates` to see installable \
                     template packs, `assign_template_pack` for each relevant one, then `create_entity` \
                     to seed the first objects."
                ))],
            })
        }
        "find_related_entities" => {
            let entity_id = required_arg(args, "entity_id")?;
            Ok(PromptGetResult {
                description: format!("Find entities related to `{entity_id}`"),
                messages: vec![message(format!(
                    "Call `find_similar` with `entity_id=\"{entity_id}\"` for entities of the same type, \
                     and `traverse_graph` with `start_entity_id=\"{entity_id}\"` for connected entities \
                     of any type."
                ))],
            })
        }
        other => Err(RpcError::not_found(format!("unknown prompt: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_prompt_name_fails() {
        let args = Map::new();
        assert!(get("does_not_exist", &args).is_err());
    }

    #[test]
    fn missing_required_argument_fails() {
        let args = Map::new();
        let err = get("explore_entity_type", &args).unwrap_err();
        assert_eq!(err.code, crate::error::codes::INVALID_PARAMS);
    }

    #[test]
    fn catalog_has_five_entries() {
        assert_eq!(catalog().len(), 5);
    }

    #[test]
    fn valid_call_names_the_recommended_tools() {
        let mut args = Map::new();
        args.insert("entity_id".to_string(), json!("11111111-1111-1111-1111-111111111111"));
        let result = get("analyze_relationships", &args).unwrap();
        assert!(result.messages[0].content.text.contains("get_entity_edges"));
    }
}
