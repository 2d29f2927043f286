//! Hosted model backend.
//!
//! This module talks to an `OpenAI`-compatible Chat Completions endpoint
//! using legacy function calling (`functions` + `function_call: "auto"`).
//!
//! # Drivers
//!
//! - [`ChatCompletionsDispatcher`]: implements [`crate::dispatch::Dispatcher`]
//!   with one non-streaming request per query.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_dispatch::llm::{ChatCompletionsDispatcher, LlmSettings, Provider};
//!
//! let settings = LlmSettings {
//!     base_url: "https://api.openai.com".to_string(),
//!     api_key: Some("sk-...".to_string()),
//!     model: "gpt-4o-mini-2024-07-18".to_string(),
//!     provider: Provider::OpenAI,
//!     request_timeout: std::time::Duration::from_secs(60),
//!     system_prompt: mcp_dispatch::llm::DEFAULT_SYSTEM_PROMPT.to_string(),
//! };
//! let dispatcher = ChatCompletionsDispatcher::new(settings)?;
//! ```

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsDispatcher;
pub use provider::Provider;

use std::time::Duration;

/// Instruction sent ahead of every query.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.
You can use tools to help the user.
You must only use tools that are available.
Don't use tools if you don't need to.";

/// LLM connection and model settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Bearer credential.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `gpt-4o-mini`).
    pub model: String,
    /// Provider type (auto-detected from `base_url` if not specified).
    pub provider: Provider,
    /// Upper bound for one completion request.
    pub request_timeout: Duration,
    pub system_prompt: String,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// A message in the request conversation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
}
