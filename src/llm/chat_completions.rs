//! OpenAI Chat Completions function-calling dispatcher.
//!
//! Sends one non-streaming request per query to `/v1/chat/completions` with
//! the session's tools declared as `functions`, and turns the first choice
//! into a [`DispatchDecision`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::dispatch::{DispatchDecision, Dispatcher};
use crate::error::{Error, Result};
use crate::mcp::capability::ToolSpec;

use super::{LlmSettings, Message};

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Dispatcher backed by the `OpenAI` Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDispatcher {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDispatcher")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDispatcher {
    /// Create a dispatcher whose HTTP client enforces `settings.request_timeout`.
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    /// Request body for one query.
    ///
    /// `functions` and `function_call` are omitted when there are no tools.
    pub fn build_request(&self, query: &str, tools: &[ToolSpec]) -> Value {
        let messages = vec![
            Message::system(self.settings.system_prompt.clone()),
            Message::user(query),
        ];
        let mut body = serde_json::json!({
            "model": self.settings.model,
            "messages": messages,
        });
        if !tools.is_empty() {
            let functions: Vec<Value> = tools.iter().map(ToolSpec::function_declaration).collect();
            body["functions"] = Value::Array(functions);
            body["function_call"] = Value::String("auto".to_string());
        }
        body
    }
}

/// Interpret a raw completion body.
pub fn parse_decision(body: &Value) -> Result<DispatchDecision> {
    let response = ChatCompletionResponse::deserialize(body)?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(Error::EmptyCompletion)?;

    let wants_call = choice.finish_reason.as_deref() == Some("function_call");
    match choice.message.function_call {
        Some(call) => DispatchDecision::tool_call(call.name, &call.arguments),
        None if wants_call => Err(Error::MalformedArguments {
            name: String::new(),
            message: "finish_reason is function_call but no function_call was returned"
                .to_string(),
        }),
        None => Ok(DispatchDecision::direct(
            choice.message.content.unwrap_or_default(),
        )),
    }
}

#[async_trait]
impl Dispatcher for ChatCompletionsDispatcher {
    async fn decide(&self, query: &str, tools: &[ToolSpec]) -> Result<DispatchDecision> {
        let url = self
            .settings
            .provider
            .build_chat_url(&self.settings.base_url);
        let body = self.build_request(query, tools);

        tracing::debug!(
            url = %url,
            model = %self.settings.model,
            tool_count = tools.len(),
            "Sending chat completion request"
        );

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = resp.json().await?;
        parse_decision(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;
    use crate::mcp::capability::InputSchema;
    use serde_json::json;
    use std::time::Duration;

    fn dispatcher() -> ChatCompletionsDispatcher {
        ChatCompletionsDispatcher::new(LlmSettings {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o-mini-2024-07-18".to_string(),
            provider: Provider::OpenAI,
            request_timeout: Duration::from_secs(5),
            system_prompt: "use tools only when necessary".to_string(),
        })
        .unwrap()
    }

    fn search_tool() -> ToolSpec {
        let schema = json!({
            "type": "object",
            "properties": { "q": { "type": "string" } },
            "required": ["q"]
        });
        ToolSpec {
            name: "search".to_string(),
            description: "Search".to_string(),
            input_schema: InputSchema::from_json_object(schema.as_object().unwrap()),
            raw_schema: schema,
        }
    }

    #[test]
    fn request_declares_functions() {
        let body = dispatcher().build_request("weather?", &[search_tool()]);
        assert_eq!(body["model"], "gpt-4o-mini-2024-07-18");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "use tools only when necessary");
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "weather?"}));
        assert_eq!(body["function_call"], "auto");
        assert_eq!(body["functions"][0]["name"], "search");
        assert_eq!(body["functions"][0]["parameters"]["required"], json!(["q"]));
    }

    #[test]
    fn request_without_tools_omits_functions() {
        let body = dispatcher().build_request("hello", &[]);
        assert!(body.get("functions").is_none());
        assert!(body.get("function_call").is_none());
    }

    #[test]
    fn function_call_becomes_tool_call() {
        let decision = parse_decision(&json!({
            "choices": [{
                "finish_reason": "function_call",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": { "name": "search", "arguments": "{\"q\":\"weather\"}" }
                }
            }]
        }))
        .unwrap();
        assert_eq!(
            decision,
            DispatchDecision::tool_call("search", r#"{"q":"weather"}"#).unwrap()
        );
    }

    #[test]
    fn text_becomes_direct_answer() {
        let decision = parse_decision(&json!({
            "choices": [{
                "finish_reason": "stop",
                "message": { "role": "assistant", "content": "Hi there" }
            }]
        }))
        .unwrap();
        assert_eq!(decision, DispatchDecision::direct("Hi there"));
    }

    #[test]
    fn bad_arguments_are_an_error() {
        let err = parse_decision(&json!({
            "choices": [{
                "finish_reason": "function_call",
                "message": { "function_call": { "name": "search", "arguments": "{q:" } }
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MalformedArguments { .. }));
    }

    #[test]
    fn no_choices_is_an_error() {
        let err = parse_decision(&json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, Error::EmptyCompletion));
    }
}
