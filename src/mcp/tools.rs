use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::HashMap;

use super::types::McpTool;
use crate::api::ToolSpec;

/// Tools advertised by the connected server, in discovery order, with their
/// input schemas compiled once for argument validation.
#[derive(Default)]
pub struct ToolCatalog {
    tools: Vec<McpTool>,
    validators: HashMap<String, JSONSchema>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<McpTool>) -> Self {
        let mut validators = HashMap::new();
        for tool in &tools {
            match JSONSchema::compile(&tool.input_schema) {
                Ok(schema) => {
                    validators.insert(tool.name.clone(), schema);
                }
                Err(e) => {
                    tracing::warn!(tool = %tool.name, error = %e, "tool schema does not compile, calls will not be validated");
                }
            }
        }
        Self { tools, validators }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn tools(&self) -> &[McpTool] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&McpTool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Check `arguments` against the tool's input schema. Unknown tools and
    /// tools without a usable schema pass.
    pub fn validate(&self, name: &str, arguments: &Value) -> Result<(), String> {
        let Some(schema) = self.validators.get(name) else {
            return Ok(());
        };

        if let Err(errors) = schema.validate(arguments) {
            let messages: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect();
            return Err(format!(
                "Tool '{}' argument validation failed: {}",
                name,
                messages.join("; ")
            ));
        }

        Ok(())
    }

    /// Tool definitions for the language model.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|tool| ToolSpec {
                name: tool.name.clone(),
                description: tool.description.clone().unwrap_or_default(),
                input_schema: tool.input_schema.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn count_tool() -> McpTool {
        McpTool {
            name: "count".to_string(),
            description: Some("Count documents in a collection".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "database": { "type": "string" },
                    "collection": { "type": "string" },
                    "query": { "type": "object" }
                },
                "required": ["database", "collection"]
            }),
        }
    }

    #[test]
    fn test_validate_accepts_matching_arguments() {
        let catalog = ToolCatalog::new(vec![count_tool()]);
        let args = json!({ "database": "sample_mflix", "collection": "movies" });
        assert!(catalog.validate("count", &args).is_ok());
    }

    #[test]
    fn test_validate_reports_missing_required_field() {
        let catalog = ToolCatalog::new(vec![count_tool()]);
        let err = catalog
            .validate("count", &json!({ "database": "sample_mflix" }))
            .unwrap_err();
        assert!(err.contains("Tool 'count' argument validation failed"));
        assert!(err.contains("collection"));
    }

    #[test]
    fn test_unknown_tool_is_not_validated() {
        let catalog = ToolCatalog::new(vec![count_tool()]);
        assert!(catalog.validate("drop-database", &json!(42)).is_ok());
    }

    #[test]
    fn test_specs_keep_discovery_order() {
        let mut bare = count_tool();
        bare.name = "list-databases".to_string();
        bare.description = None;
        let catalog = ToolCatalog::new(vec![count_tool(), bare]);

        let specs = catalog.specs();
        assert_eq!(specs[0].name, "count");
        assert_eq!(specs[0].input_schema["required"][1], "collection");
        assert_eq!(specs[1].description, "");
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("list-databases").is_some());
    }
}
