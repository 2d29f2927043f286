//! Provider-specific endpoint shapes.
//!
//! Providers differ in where the chat-completions endpoint lives; everything
//! else about the request is shared.

/// API version used for Azure when none is configured.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";

/// Supported LLM providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// Azure `OpenAI` Service
    AzureOpenAI {
        /// Deployment name (required for Azure)
        deployment_name: String,
        /// API version (e.g., "2024-08-01-preview")
        api_version: String,
    },
    /// `OpenRouter` (openrouter.ai)
    OpenRouter,
    /// Groq (groq.com)
    Groq,
    /// Generic OpenAI-compatible provider
    Generic,
}

impl Provider {
    /// Detect provider from base URL.
    ///
    /// Azure deployment details are filled from `AZURE_DEPLOYMENT_NAME` and
    /// `AZURE_API_VERSION` by the caller, see [`Provider::with_azure_deployment`].
    #[must_use]
    pub fn detect_from_url(base_url: &str) -> Self {
        let lower = base_url.to_lowercase();

        if lower.contains("openai.azure.com") || lower.contains("azure.com") {
            Self::AzureOpenAI {
                deployment_name: String::new(),
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            }
        } else if lower.contains("openrouter.ai") {
            Self::OpenRouter
        } else if lower.contains("groq.com") {
            Self::Groq
        } else if lower.contains("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Attach deployment details when this is an Azure provider.
    #[must_use]
    pub fn with_azure_deployment(
        self,
        deployment_name: Option<String>,
        api_version: Option<String>,
    ) -> Self {
        match self {
            Self::AzureOpenAI {
                deployment_name: current_name,
                api_version: current_version,
            } => Self::AzureOpenAI {
                deployment_name: deployment_name.unwrap_or(current_name),
                api_version: api_version.unwrap_or(current_version),
            },
            other => other,
        }
    }

    /// Build the chat completions URL for this provider.
    ///
    /// Groq and `OpenRouter` expose the `OpenAI` path under their own prefix,
    /// which callers include in `base_url`.
    #[must_use]
    pub fn build_chat_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        match self {
            Self::AzureOpenAI {
                deployment_name,
                api_version,
            } => format!(
                "{base}/openai/deployments/{deployment_name}/chat/completions?api-version={api_version}"
            ),
            _ if base.ends_with("/v1") => format!("{base}/chat/completions"),
            _ => format!("{base}/v1/chat/completions"),
        }
    }
}
