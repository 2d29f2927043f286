use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// What the model decided to do with a query.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchDecision {
    /// Invoke one tool with the given arguments.
    ToolCall {
        tool_name: String,
        arguments: Map<String, Value>,
    },
    /// Show the model's text to the user.
    DirectAnswer { text: String },
}

impl DispatchDecision {
    /// Build a tool call from the model's JSON-encoded arguments.
    ///
    /// Blank input means "no arguments". Anything that is not a JSON object
    /// is rejected.
    pub fn tool_call(name: impl Into<String>, raw_arguments: &str) -> Result<Self> {
        let tool_name = name.into();
        let arguments = if raw_arguments.trim().is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(raw_arguments) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(Error::MalformedArguments {
                        name: tool_name,
                        message: format!("expected a JSON object, got {other}"),
                    });
                }
                Err(e) => {
                    return Err(Error::MalformedArguments {
                        name: tool_name,
                        message: e.to_string(),
                    });
                }
            }
        };
        Ok(Self::ToolCall {
            tool_name,
            arguments,
        })
    }

    pub fn direct(text: impl Into<String>) -> Self {
        Self::DirectAnswer { text: text.into() }
    }

    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::ToolCall { tool_name, .. } => Some(tool_name),
            Self::DirectAnswer { .. } => None,
        }
    }

    pub fn arguments(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::ToolCall { arguments, .. } => Some(arguments),
            Self::DirectAnswer { .. } => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::DirectAnswer { text } => Some(text),
            Self::ToolCall { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_call_parses_object_arguments() {
        let decision = DispatchDecision::tool_call("search", r#"{"q":"weather"}"#).unwrap();
        assert_eq!(decision.tool_name(), Some("search"));
        assert_eq!(decision.arguments().unwrap()["q"], json!("weather"));
        assert_eq!(decision.content(), None);
    }

    #[test]
    fn blank_arguments_mean_empty_object() {
        let decision = DispatchDecision::tool_call("now", "  ").unwrap();
        assert!(decision.arguments().unwrap().is_empty());
    }

    #[test]
    fn non_object_arguments_are_malformed() {
        for raw in ["[1,2]", "\"q\"", "{\"q\":"] {
            let err = DispatchDecision::tool_call("search", raw).unwrap_err();
            assert!(
                matches!(err, Error::MalformedArguments { ref name, .. } if name == "search"),
                "{raw}"
            );
        }
    }

    #[test]
    fn direct_answer_has_only_content() {
        let decision = DispatchDecision::direct("It is sunny.");
        assert_eq!(decision.content(), Some("It is sunny."));
        assert_eq!(decision.tool_name(), None);
        assert_eq!(decision.arguments(), None);
    }
}
