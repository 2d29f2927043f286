use crate::llm::{DEFAULT_SYSTEM_PROMPT, LlmSettings, Provider};
use clap::Parser;
use config::{Config, Environment};
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-2024-07-18";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// MCP server configuration file
    #[arg(short, long, env = "MCP_CONFIG", default_value = "mcp-config.json")]
    pub config: PathBuf,

    /// Name of the server entry to connect to
    #[arg(short, long, env = "MCP_SERVER", default_value = "mcp-server")]
    pub server: String,

    /// Model identifier
    #[arg(long, env = "LLM_MODEL")]
    pub model: Option<String>,

    /// Base URL of the chat completions API
    #[arg(long, env = "LLM_BASE_URL")]
    pub base_url: Option<String>,

    /// Bearer credential for the model API
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Seconds allowed for the MCP handshake and each capability listing
    #[arg(long)]
    pub handshake_timeout: Option<u64>,

    /// Seconds allowed for one model request
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Seconds allowed for one tool call
    #[arg(long)]
    pub tool_timeout: Option<u64>,

    /// List the server's tools and prompts, then exit
    #[arg(long)]
    pub list: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Deserialize, Clone)]
struct Layered {
    llm: LlmSection,
    timeouts: TimeoutSection,
}

#[derive(Debug, Deserialize, Clone)]
struct LlmSection {
    base_url: String,
    model: String,
    system_prompt: String,
}

#[derive(Debug, Deserialize, Clone)]
struct TimeoutSection {
    handshake_secs: u64,
    request_secs: u64,
    tool_secs: u64,
}

/// Resolved timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub handshake: Duration,
    pub request: Duration,
    pub tool: Duration,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mcp_config: PathBuf,
    pub server: String,
    pub list_only: bool,
    pub log_json: bool,
    pub llm: LlmSettings,
    pub timeouts: Timeouts,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_cli(Cli::parse())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(cli)
    }

    /// Layer defaults, `MCPD_` environment and CLI flags.
    ///
    /// Priority: CLI flag (or its env var) > `MCPD_*` env > defaults.
    pub fn from_cli(cli: Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("llm.base_url", DEFAULT_BASE_URL)?
            .set_default("llm.model", DEFAULT_MODEL)?
            .set_default("llm.system_prompt", DEFAULT_SYSTEM_PROMPT)?
            .set_default("timeouts.handshake_secs", 30)?
            .set_default("timeouts.request_secs", 60)?
            .set_default("timeouts.tool_secs", 120)?;

        // E.g. MCPD_LLM__MODEL=gpt-4o, MCPD_TIMEOUTS__REQUEST_SECS=10
        builder = builder.add_source(
            Environment::with_prefix("MCPD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(base_url) = &cli.base_url {
            builder = builder.set_override("llm.base_url", base_url.as_str())?;
        }
        if let Some(model) = &cli.model {
            builder = builder.set_override("llm.model", model.as_str())?;
        }
        if let Some(secs) = cli.handshake_timeout {
            builder = builder.set_override("timeouts.handshake_secs", secs)?;
        }
        if let Some(secs) = cli.request_timeout {
            builder = builder.set_override("timeouts.request_secs", secs)?;
        }
        if let Some(secs) = cli.tool_timeout {
            builder = builder.set_override("timeouts.tool_secs", secs)?;
        }

        let layered: Layered = builder.build()?.try_deserialize()?;

        let base_url = layered.llm.base_url.trim().to_string();
        url::Url::parse(&base_url).map_err(|e| {
            config::ConfigError::Message(format!("invalid LLM base URL '{base_url}': {e}"))
        })?;
        if layered.llm.model.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "LLM model cannot be empty".to_string(),
            ));
        }

        let provider = Provider::detect_from_url(&base_url).with_azure_deployment(
            std::env::var("AZURE_DEPLOYMENT_NAME").ok(),
            std::env::var("AZURE_API_VERSION").ok(),
        );

        let timeouts = Timeouts {
            handshake: Duration::from_secs(layered.timeouts.handshake_secs),
            request: Duration::from_secs(layered.timeouts.request_secs),
            tool: Duration::from_secs(layered.timeouts.tool_secs),
        };

        Ok(Self {
            mcp_config: cli.config,
            server: cli.server,
            list_only: cli.list,
            log_json: cli.log_json,
            llm: LlmSettings {
                base_url,
                api_key: cli.api_key.filter(|k| !k.trim().is_empty()),
                model: layered.llm.model,
                provider,
                request_timeout: timeouts.request,
                system_prompt: layered.llm.system_prompt,
            },
            timeouts,
        })
    }
}
