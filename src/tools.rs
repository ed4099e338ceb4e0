//! Tool definitions, catalog, and dispatch for the MCP server.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::browser;
use crate::config::ServerConfig;
use crate::custom::CustomToolDefinition;
use crate::error::{Error, Result};
use crate::fetch::IndexFetcher;
use crate::protocol::{ToolCallResult, ToolDefinition};

/// Tool trait for implementing MCP tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolCallResult>;
}

/// Context passed to tools during execution.
pub struct ToolContext {
    /// Fetcher bound to the configured Storybook index URL.
    pub fetcher: IndexFetcher,
}

/// The merged catalog of built-in and custom tools.
///
/// Dispatch order is fixed: built-in names match first, then the custom
/// registry is searched by exact name, first match winning. A custom tool
/// can therefore never shadow a built-in.
pub struct ToolCatalog {
    builtins: Vec<Box<dyn Tool>>,
    custom: Vec<CustomTool>,
    context: ToolContext,
}

/// `getComponentPropsType` is the single-component tool's pre-batch name,
/// kept as an alias for older clients.
const PROPS_TOOL_ALIAS: &str = "getComponentPropsType";

impl ToolCatalog {
    /// Build the catalog from startup configuration.
    pub fn new(config: ServerConfig) -> Self {
        let context = ToolContext {
            fetcher: IndexFetcher::new(config.storybook_url),
        };
        let builtins: Vec<Box<dyn Tool>> = vec![
            Box::new(GetComponentListTool),
            Box::new(GetComponentPropsTool),
            Box::new(GetComponentsPropsTool),
        ];
        let custom = config
            .custom_tools
            .into_iter()
            .map(|definition| CustomTool { definition })
            .collect();
        Self {
            builtins,
            custom,
            context,
        }
    }

    /// Tool descriptors for `tools/list`: built-ins first, then valid custom
    /// tools in configuration order.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.builtins
            .iter()
            .map(|tool| tool.definition())
            .chain(self.custom.iter().map(|tool| tool.definition()))
            .collect()
    }

    /// Dispatch a tool call, wrapping every outcome into a result envelope.
    ///
    /// Any failure (unknown tool, argument shape mismatch, or an error
    /// inside the handler) becomes an `Error: <message>` text payload; the
    /// protocol call itself always succeeds.
    pub async fn dispatch(&self, name: &str, arguments: serde_json::Value) -> ToolCallResult {
        match self.try_dispatch(name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("tool {name} failed: {e}");
                ToolCallResult::error_text(e)
            }
        }
    }

    async fn try_dispatch(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolCallResult> {
        let builtin_name = if name == PROPS_TOOL_ALIAS {
            "getComponentProps"
        } else {
            name
        };
        if let Some(tool) = self
            .builtins
            .iter()
            .find(|tool| tool.definition().name == builtin_name)
        {
            return tool.execute(arguments, &self.context).await;
        }
        if let Some(tool) = self.custom.iter().find(|tool| tool.definition.name == name) {
            return tool.execute(arguments, &self.context).await;
        }
        Err(Error::ToolNotFound(name.to_string()))
    }
}

/// Render the batch lookup outcome: one `### <name>` section per requested
/// component, in request order, carrying either the extracted markup or the
/// recorded error. This is the sole place batch output is assembled.
fn render_batch_sections(outcomes: &[(String, Result<String>)]) -> String {
    outcomes
        .iter()
        .map(|(name, outcome)| match outcome {
            Ok(markup) => format!("### {name}\n\n{markup}"),
            Err(e) => format!("### {name}\n\nError: {e}"),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ============================================================================
// Built-in Tools
// ============================================================================

/// Tool for listing all documented components.
struct GetComponentListTool;

#[async_trait]
impl Tool for GetComponentListTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "getComponentList".into(),
            description: "Get a list of all components from the configured Storybook".into(),
            input_schema: json!({
                "type": "object",
                "properties": {},
            }),
        }
    }

    async fn execute(
        &self,
        _arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolCallResult> {
        let index = context.fetcher.fetch().await?;
        let components = index.component_list();
        Ok(ToolCallResult::text(format!(
            "Available components:\n{}",
            components.join("\n")
        )))
    }
}

/// Tool for extracting one component's props table.
struct GetComponentPropsTool;

#[derive(Debug, Deserialize)]
struct ComponentPropsArgs {
    /// The component to look up.
    #[serde(rename = "componentName")]
    component_name: String,
}

#[async_trait]
impl Tool for GetComponentPropsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "getComponentProps".into(),
            description: "Get props type information for a specific component".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "componentName": {
                        "type": "string",
                        "description": "The name of the component to get props information for"
                    }
                },
                "required": ["componentName"]
            }),
        }
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolCallResult> {
        let args: ComponentPropsArgs =
            serde_json::from_value(arguments).map_err(|e| Error::InvalidParams(e.to_string()))?;

        let index = context.fetcher.fetch().await?;
        let doc_url = index.resolve_doc_url(&args.component_name, context.fetcher.url())?;
        let markup = browser::fetch_props_table(&doc_url).await?;

        Ok(ToolCallResult::text(format!(
            "Props information for component \"{}\":\n\n{}",
            args.component_name, markup
        )))
    }
}

/// Tool for extracting props tables for several components in one call.
struct GetComponentsPropsTool;

#[derive(Debug, Deserialize)]
struct ComponentsPropsArgs {
    /// The components to look up, in output order.
    #[serde(rename = "componentNames")]
    component_names: Vec<String>,
}

#[async_trait]
impl Tool for GetComponentsPropsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "getComponentsProps".into(),
            description: "Get props type information for multiple components in a single call"
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "componentNames": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "The names of the components to get props information for"
                    }
                },
                "required": ["componentNames"]
            }),
        }
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolCallResult> {
        let args: ComponentsPropsArgs =
            serde_json::from_value(arguments).map_err(|e| Error::InvalidParams(e.to_string()))?;

        let index = context.fetcher.fetch().await?;
        let targets = args
            .component_names
            .iter()
            .map(|name| {
                (
                    name.clone(),
                    index.resolve_doc_url(name, context.fetcher.url()),
                )
            })
            .collect();

        let outcomes = browser::fetch_props_tables(targets).await?;
        Ok(ToolCallResult::text(render_batch_sections(&outcomes)))
    }
}

/// An operator-configured tool: navigate to its page, run its handler.
struct CustomTool {
    definition: CustomToolDefinition,
}

#[async_trait]
impl Tool for CustomTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.definition.name.clone(),
            description: self.definition.description.clone(),
            input_schema: self.definition.input_schema(),
        }
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _context: &ToolContext,
    ) -> Result<ToolCallResult> {
        self.definition.validate_arguments(&arguments)?;
        let value = browser::run_page_script(&self.definition.page, &self.definition.handler).await?;
        Ok(ToolCallResult::text(browser::format_script_result(&value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ContentItem;
    use serde_json::json;

    fn catalog_with(custom_tools: Option<&str>) -> ToolCatalog {
        // Port 9 is not listening, so index fetches fail fast and locally.
        let config =
            ServerConfig::from_values(Some("http://127.0.0.1:9/index.json"), custom_tools).unwrap();
        ToolCatalog::new(config)
    }

    fn payload(result: &ToolCallResult) -> &str {
        let ContentItem::Text { text } = &result.content[0];
        text
    }

    #[test]
    fn catalog_lists_builtins_then_customs() {
        let custom = json!([{
            "name": "getIconList",
            "description": "List icons",
            "page": "https://example.com/icons",
            "handler": "document.title"
        }]);
        let catalog = catalog_with(Some(&custom.to_string()));
        let names: Vec<String> = catalog.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            [
                "getComponentList",
                "getComponentProps",
                "getComponentsProps",
                "getIconList"
            ]
        );
    }

    #[test]
    fn invalid_custom_tools_are_absent_from_catalog() {
        let custom = json!([
            {
                "name": "valid",
                "description": "ok",
                "page": "https://example.com/",
                "handler": "1 + 1"
            },
            { "name": "invalid" }
        ]);
        let catalog = catalog_with(Some(&custom.to_string()));
        let names: Vec<String> = catalog.list_tools().into_iter().map(|t| t.name).collect();
        assert!(names.contains(&"valid".to_string()));
        assert!(!names.contains(&"invalid".to_string()));
        assert_eq!(names.len(), 4);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_envelope() {
        let catalog = catalog_with(None);
        let result = catalog.dispatch("nonexistent", json!({})).await;
        assert!(result.is_error);
        assert_eq!(payload(&result), "Error: unknown tool: nonexistent");
    }

    #[tokio::test]
    async fn shape_mismatch_becomes_error_envelope() {
        let catalog = catalog_with(None);
        // componentName is missing; validation fails before any I/O.
        let result = catalog.dispatch("getComponentProps", json!({})).await;
        assert!(result.is_error);
        assert!(payload(&result).starts_with("Error: invalid parameters"));

        let result = catalog
            .dispatch("getComponentsProps", json!({ "componentNames": "Button" }))
            .await;
        assert!(result.is_error);
        assert!(payload(&result).starts_with("Error: invalid parameters"));
    }

    #[tokio::test]
    async fn props_tool_alias_resolves_to_builtin() {
        let catalog = catalog_with(None);
        let result = catalog.dispatch(PROPS_TOOL_ALIAS, json!({})).await;
        // The alias reaches the single-component tool, whose argument
        // validation rejects the empty object; an unknown tool would say so.
        assert!(payload(&result).starts_with("Error: invalid parameters"));
    }

    #[tokio::test]
    async fn unreachable_index_becomes_error_envelope() {
        let catalog = catalog_with(None);
        let result = catalog.dispatch("getComponentList", json!({})).await;
        assert!(result.is_error);
        assert!(payload(&result).starts_with("Error: failed to fetch Storybook data"));
    }

    #[tokio::test]
    async fn custom_tool_argument_mismatch_is_reported_before_browser_use() {
        let custom = json!([{
            "name": "search",
            "description": "Search the page",
            "parameters": { "query": { "type": "string" } },
            "page": "https://example.com/",
            "handler": "document.title"
        }]);
        let catalog = catalog_with(Some(&custom.to_string()));
        let result = catalog.dispatch("search", json!({})).await;
        assert!(result.is_error);
        assert!(payload(&result).contains("missing required parameter \"query\""));
    }

    #[test]
    fn batch_sections_interleave_markup_and_errors_in_request_order() {
        let outcomes = vec![
            ("Button".to_string(), Ok("<tr><td>prop</td></tr>".to_string())),
            (
                "Input".to_string(),
                Err(Error::NotFound("Input".to_string())),
            ),
        ];
        let text = render_batch_sections(&outcomes);
        let button_at = text.find("### Button").unwrap();
        let input_at = text.find("### Input").unwrap();
        assert!(button_at < input_at);
        assert!(text.contains("<tr><td>prop</td></tr>"));
        assert!(text.contains("Error: component \"Input\" not found in Storybook"));
    }
}
