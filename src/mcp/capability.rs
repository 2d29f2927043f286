//! Tools and prompts advertised by a provider.

use serde_json::{Map, Value, json};

/// The part of a tool's JSON schema that function calling needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    /// Parameter name to type constraint.
    pub properties: Map<String, Value>,
    /// Names of required parameters.
    pub required: Vec<String>,
}

impl InputSchema {
    /// Extract `properties` and `required` from a JSON schema object.
    ///
    /// Absent or ill-typed keys yield empty collections.
    #[must_use]
    pub fn from_json_object(schema: &Map<String, Value>) -> Self {
        let properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            properties,
            required,
        }
    }

    /// The schema in `{type: object, properties, required}` form.
    #[must_use]
    pub fn to_parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
        })
    }
}

/// An invokable tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
    /// Schema exactly as the server sent it, for display.
    pub raw_schema: Value,
}

impl ToolSpec {
    /// Declaration in the chat-completions `functions` format.
    #[must_use]
    pub fn function_declaration(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.input_schema.to_parameters(),
        })
    }
}

impl From<rmcp::model::Tool> for ToolSpec {
    fn from(tool: rmcp::model::Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.as_deref().unwrap_or_default().to_string(),
            input_schema: InputSchema::from_json_object(&tool.input_schema),
            raw_schema: Value::Object((*tool.input_schema).clone()),
        }
    }
}

/// A declared prompt argument.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptArgumentSpec {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
}

/// A templated prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgumentSpec>,
}

impl From<rmcp::model::Prompt> for PromptSpec {
    fn from(prompt: rmcp::model::Prompt) -> Self {
        Self {
            name: prompt.name,
            description: prompt.description.unwrap_or_default(),
            arguments: prompt
                .arguments
                .unwrap_or_default()
                .into_iter()
                .map(|arg| PromptArgumentSpec {
                    name: arg.name,
                    description: arg.description,
                    required: arg.required.unwrap_or(false),
                })
                .collect(),
        }
    }
}

/// Anything a provider advertises.
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    Tool(ToolSpec),
    Prompt(PromptSpec),
}

impl Capability {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Tool(tool) => &tool.name,
            Self::Prompt(prompt) => &prompt.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_tool() -> rmcp::model::Tool {
        serde_json::from_value(json!({
            "name": "search",
            "description": "Search the web",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "q": { "type": "string" },
                    "limit": { "type": "integer" }
                },
                "required": ["q"]
            }
        }))
        .unwrap()
    }

    #[test]
    fn tool_converts_from_rmcp() {
        let tool = ToolSpec::from(search_tool());
        assert_eq!(tool.name, "search");
        assert_eq!(tool.description, "Search the web");
        assert_eq!(tool.input_schema.required, vec!["q"]);
        assert!(tool.input_schema.properties.contains_key("limit"));
        assert_eq!(tool.raw_schema["type"], "object");
    }

    #[test]
    fn function_declaration_shape() {
        let decl = ToolSpec::from(search_tool()).function_declaration();
        assert_eq!(
            decl,
            json!({
                "name": "search",
                "description": "Search the web",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "q": { "type": "string" },
                        "limit": { "type": "integer" }
                    },
                    "required": ["q"]
                }
            })
        );
    }

    #[test]
    fn schema_without_keys_defaults_to_empty() {
        let schema = InputSchema::from_json_object(&Map::new());
        assert!(schema.properties.is_empty());
        assert!(schema.required.is_empty());
        assert_eq!(schema.to_parameters()["required"], json!([]));
    }

    #[test]
    fn prompt_converts_from_rmcp() {
        let prompt: rmcp::model::Prompt = serde_json::from_value(json!({
            "name": "summarize",
            "arguments": [
                { "name": "text", "description": "Input", "required": true },
                { "name": "style" }
            ]
        }))
        .unwrap();

        let prompt = PromptSpec::from(prompt);
        assert_eq!(prompt.name, "summarize");
        assert_eq!(prompt.description, "");
        assert_eq!(prompt.arguments.len(), 2);
        assert!(prompt.arguments[0].required);
        assert!(!prompt.arguments[1].required);

        let cap = Capability::Prompt(prompt);
        assert_eq!(cap.name(), "summarize");
    }
}
