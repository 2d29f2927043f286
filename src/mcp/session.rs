//! Connection lifecycle for a single provider.
//!
//! A [`Session`] moves through
//! `Uninitialized -> Connecting -> Connected -> Closed`. A failed connect
//! goes straight to `Closed` after releasing whatever it acquired, and a
//! closed session is never reused.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::dispatch::ToolInvoker;
use crate::error::{Error, Result};
use crate::mcp::capability::{Capability, PromptSpec, ToolSpec};
use crate::mcp::config::{McpConfig, ServerParams};
use crate::mcp::transport::{Launcher, ProviderConnection, ToolOutput};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Connecting,
    Connected,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Owns the connection to one provider and the capabilities it advertised.
pub struct Session {
    config: McpConfig,
    launcher: Arc<dyn Launcher>,
    state: SessionState,
    server: Option<String>,
    connection: Option<Box<dyn ProviderConnection>>,
    tools: Vec<ToolSpec>,
    prompts: Vec<PromptSpec>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("server", &self.server)
            .field("tool_count", &self.tools.len())
            .field("prompt_count", &self.prompts.len())
            .finish()
    }
}

impl Session {
    #[must_use]
    pub fn new(config: McpConfig, launcher: Arc<dyn Launcher>) -> Self {
        Self {
            config,
            launcher,
            state: SessionState::Uninitialized,
            server: None,
            connection: None,
            tools: Vec::new(),
            prompts: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn server_name(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn prompts(&self) -> &[PromptSpec] {
        &self.prompts
    }

    /// Tools followed by prompts.
    pub fn capabilities(&self) -> Vec<Capability> {
        self.tools
            .iter()
            .cloned()
            .map(Capability::Tool)
            .chain(self.prompts.iter().cloned().map(Capability::Prompt))
            .collect()
    }

    /// Connect to a server named in the configuration.
    ///
    /// Launch parameters are resolved before anything is spawned.
    pub async fn connect(&mut self, server_name: &str) -> Result<()> {
        self.ensure_fresh()?;
        let params = match self.config.server_params(server_name) {
            Ok(params) => params,
            Err(e) => {
                self.state = SessionState::Closed;
                return Err(e);
            }
        };
        self.connect_params(params).await
    }

    /// Connect with already-resolved launch parameters.
    pub async fn connect_params(&mut self, params: ServerParams) -> Result<()> {
        self.ensure_fresh()?;
        self.state = SessionState::Connecting;
        self.server = Some(params.server.clone());

        match self.establish(&params).await {
            Ok(()) => {
                self.state = SessionState::Connected;
                tracing::info!(
                    name: "mcp.session.connected",
                    server = %params.server,
                    tools = self.tools.len(),
                    prompts = self.prompts.len(),
                    "MCP session connected"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    name: "mcp.session.connect_failed",
                    server = %params.server,
                    error = %e,
                    "MCP session failed to connect"
                );
                if let Err(cleanup_err) = self.cleanup().await {
                    tracing::warn!(error = %cleanup_err, "Cleanup after failed connect also failed");
                }
                Err(e)
            }
        }
    }

    async fn establish(&mut self, params: &ServerParams) -> Result<()> {
        let connection = self.connection.insert(self.launcher.launch(params).await?);

        let tools = connection.list_tools().await?;
        for tool in &tools {
            tracing::info!(name: "mcp.tool.discovered", tool = %tool.name, "MCP tool discovered");
        }
        let prompts = connection.list_prompts().await?;
        for prompt in &prompts {
            tracing::info!(name: "mcp.prompt.discovered", prompt = %prompt.name, "MCP prompt discovered");
        }

        self.tools = tools;
        self.prompts = prompts;
        Ok(())
    }

    fn ensure_fresh(&self) -> Result<()> {
        if self.state == SessionState::Uninitialized {
            Ok(())
        } else {
            Err(Error::SessionClosed(self.state))
        }
    }

    /// Release everything acquired by `connect`. Safe to call in any state.
    pub async fn cleanup(&mut self) -> Result<()> {
        let previous = self.state;
        self.state = SessionState::Closed;
        self.tools.clear();
        self.prompts.clear();

        let Some(connection) = self.connection.take() else {
            return Ok(());
        };
        connection.shutdown().await?;
        tracing::info!(
            name: "mcp.session.closed",
            server = ?self.server,
            previous = %previous,
            "MCP session closed"
        );
        Ok(())
    }

    /// Invoke a tool on the connected provider.
    pub async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolOutput> {
        let connection = match (&self.connection, self.state) {
            (Some(connection), SessionState::Connected) => connection,
            _ => return Err(Error::NotConnected(self.state)),
        };
        tracing::info!(name: "mcp.tool.call", tool = %name, "Calling MCP tool");
        connection.call_tool(name, arguments).await
    }
}

#[async_trait]
impl ToolInvoker for Session {
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolOutput> {
        Session::call_tool(self, name, arguments).await
    }
}
