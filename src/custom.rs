//! Operator-supplied custom tool definitions.
//!
//! Custom tools are configured through the `CUSTOM_TOOLS` environment
//! variable as a JSON array. Each definition names a page to open and a
//! script body to evaluate in that page's context. The configuration is
//! parsed once at startup; a broken value can cost individual tools (or all
//! of them) but never prevents the server from starting.

use serde_json::{Map, Value};
use url::Url;

use crate::error::{Error, Result};

/// A validated custom tool definition.
#[derive(Debug, Clone)]
pub struct CustomToolDefinition {
    /// Tool name as exposed over the protocol.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Declared parameters: name to JSON-schema-like descriptor.
    pub parameters: Map<String, Value>,
    /// Page the tool navigates to before running its handler.
    pub page: Url,
    /// Script body evaluated in the page context. Runs with the full
    /// capability of the page; this is a trusted-operator feature.
    pub handler: String,
}

impl CustomToolDefinition {
    /// The MCP input schema for this tool. Every declared parameter is
    /// required.
    pub fn input_schema(&self) -> Value {
        let required: Vec<&String> = self.parameters.keys().collect();
        serde_json::json!({
            "type": "object",
            "properties": self.parameters,
            "required": required,
        })
    }

    /// Check call arguments against the declared parameter descriptors.
    ///
    /// Enforces presence of every declared parameter and, where a descriptor
    /// carries a `type` keyword, the matching JSON type. Mismatches are
    /// reported, never coerced.
    pub fn validate_arguments(&self, arguments: &Value) -> Result<()> {
        if self.parameters.is_empty() {
            return Ok(());
        }
        let supplied = arguments.as_object().ok_or_else(|| {
            Error::InvalidParams(format!("tool \"{}\" expects an object of arguments", self.name))
        })?;

        for (param, descriptor) in &self.parameters {
            let value = supplied.get(param).ok_or_else(|| {
                Error::InvalidParams(format!("missing required parameter \"{param}\""))
            })?;
            if let Some(expected) = descriptor.get("type").and_then(Value::as_str) {
                if !type_matches(expected, value) {
                    return Err(Error::InvalidParams(format!(
                        "parameter \"{param}\" must be of type {expected}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// True when `value` conforms to the JSON-schema `type` keyword.
fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // Unknown type keywords are not enforced.
        _ => true,
    }
}

/// Parse custom tool definitions from the raw configuration value.
///
/// Absent or empty input yields no tools. Malformed JSON, or a JSON value
/// that is not an array, yields no tools with a diagnostic. Array elements
/// are validated independently: invalid ones are dropped with a diagnostic
/// naming the failing field, valid ones are kept in input order. Duplicate
/// names are kept as-is; dispatch finds the first match, so duplicates are a
/// configuration hazard rather than a load error.
pub fn load(raw: Option<&str>) -> Vec<CustomToolDefinition> {
    let raw = match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => raw,
        None => return Vec::new(),
    };

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("ignoring CUSTOM_TOOLS: not valid JSON: {e}");
            return Vec::new();
        }
    };

    let items = match parsed.as_array() {
        Some(items) => items,
        None => {
            tracing::warn!("ignoring CUSTOM_TOOLS: expected a JSON array");
            return Vec::new();
        }
    };

    let mut tools: Vec<CustomToolDefinition> = Vec::new();
    for (position, item) in items.iter().enumerate() {
        match validate_definition(item) {
            Ok(tool) => {
                if tools.iter().any(|existing| existing.name == tool.name) {
                    tracing::warn!(
                        name = %tool.name,
                        "duplicate custom tool name; dispatch will use the first definition"
                    );
                }
                tracing::debug!(name = %tool.name, "loaded custom tool");
                tools.push(tool);
            }
            Err(reason) => {
                tracing::warn!("dropping custom tool at index {position}: {reason}");
            }
        }
    }
    tools
}

/// Validate one raw definition, reporting which field failed.
fn validate_definition(value: &Value) -> std::result::Result<CustomToolDefinition, String> {
    let object = value.as_object().ok_or("definition is not an object")?;

    let name = required_string(object, "name")?;
    let description = required_string(object, "description")?;
    let handler = required_string(object, "handler")?;

    let page = required_string(object, "page")?;
    let page = Url::parse(&page).map_err(|_| format!("\"page\" is not an absolute URL: {page}"))?;

    let parameters = match object.get("parameters") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err("\"parameters\" must be an object".into()),
    };

    Ok(CustomToolDefinition {
        name,
        description,
        parameters,
        page,
        handler,
    })
}

fn required_string(object: &Map<String, Value>, field: &str) -> std::result::Result<String, String> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| format!("\"{field}\" must be a non-empty string"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_definition() -> Value {
        json!({
            "name": "getIconList",
            "description": "Get all icons from the icon page",
            "parameters": {},
            "page": "https://example.com/storybook/?path=/docs/icon--docs",
            "handler": "Array.from(document.querySelectorAll('.icon-name')).map(i => i.textContent)"
        })
    }

    #[test]
    fn absent_and_empty_input_yield_no_tools() {
        assert!(load(None).is_empty());
        assert!(load(Some("")).is_empty());
        assert!(load(Some("   ")).is_empty());
    }

    #[test]
    fn malformed_json_yields_no_tools() {
        assert!(load(Some("invalid json")).is_empty());
    }

    #[test]
    fn non_array_json_yields_no_tools() {
        assert!(load(Some(r#"{"name": "tool"}"#)).is_empty());
    }

    #[test]
    fn valid_definition_loads() {
        let tools = load(Some(&json!([valid_definition()]).to_string()));
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "getIconList");
        assert_eq!(tools[0].page.host_str(), Some("example.com"));
    }

    #[test]
    fn invalid_entries_are_dropped_individually() {
        let config = json!([
            valid_definition(),
            { "name": "missingEverything" },
            {
                "name": "badPage",
                "description": "valid description",
                "page": "not-a-url",
                "handler": "document.title"
            }
        ]);
        let tools = load(Some(&config.to_string()));
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "getIconList");
    }

    #[test]
    fn input_order_is_preserved() {
        let mut second = valid_definition();
        second["name"] = json!("secondTool");
        let config = json!([valid_definition(), second]);
        let tools = load(Some(&config.to_string()));
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["getIconList", "secondTool"]);
    }

    #[test]
    fn duplicate_names_are_kept_for_first_match_dispatch() {
        let config = json!([valid_definition(), valid_definition()]);
        let tools = load(Some(&config.to_string()));
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, tools[1].name);
    }

    #[test]
    fn empty_required_fields_fail_validation() {
        let mut definition = valid_definition();
        definition["handler"] = json!("");
        assert!(load(Some(&json!([definition]).to_string())).is_empty());
    }

    #[test]
    fn non_object_parameters_fail_validation() {
        let mut definition = valid_definition();
        definition["parameters"] = json!(["componentName"]);
        assert!(load(Some(&json!([definition]).to_string())).is_empty());
    }

    #[test]
    fn input_schema_requires_every_declared_parameter() {
        let mut definition = valid_definition();
        definition["parameters"] = json!({
            "query": { "type": "string", "description": "search text" }
        });
        let tools = load(Some(&json!([definition]).to_string()));
        let schema = tools[0].input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["query"]));
        assert_eq!(schema["properties"]["query"]["type"], "string");
    }

    #[test]
    fn argument_validation_checks_presence_and_type() {
        let mut definition = valid_definition();
        definition["parameters"] = json!({
            "query": { "type": "string" },
            "limit": { "type": "integer" }
        });
        let tool = &load(Some(&json!([definition]).to_string()))[0];

        assert!(tool
            .validate_arguments(&json!({ "query": "icons", "limit": 3 }))
            .is_ok());
        assert!(tool.validate_arguments(&json!({ "query": "icons" })).is_err());
        assert!(tool
            .validate_arguments(&json!({ "query": 1, "limit": 3 }))
            .is_err());
        assert!(tool.validate_arguments(&json!("not an object")).is_err());
    }

    #[test]
    fn parameterless_tool_accepts_any_arguments() {
        let tool = &load(Some(&json!([valid_definition()]).to_string()))[0];
        assert!(tool.validate_arguments(&json!({})).is_ok());
        assert!(tool.validate_arguments(&Value::Null).is_ok());
    }
}
