//! Provider process transport.
//!
//! [`Launcher`] starts a provider and performs the `initialize` handshake;
//! the returned [`ProviderConnection`] answers capability queries and tool
//! calls until it is shut down. [`StdioLauncher`] is the production
//! implementation on top of `rmcp`'s child-process transport.

use std::time::Duration;

use async_trait::async_trait;
use rmcp::{
    model::CallToolRequestParam,
    service::{RoleClient, RunningService, ServiceExt},
    transport::TokioChildProcess,
};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::mcp::capability::{PromptSpec, ToolSpec};
use crate::mcp::config::ServerParams;

/// Result of a `tools/call` request.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Whether the server flagged the result as a tool error.
    pub is_error: bool,
    /// Text parts of the result content, in order.
    pub text: Vec<String>,
    /// Full result as returned by the server.
    pub raw: Value,
}

impl ToolOutput {
    /// Build from a serialized `CallToolResult`.
    #[must_use]
    pub fn from_result_json(raw: Value) -> Self {
        let text = raw
            .get("content")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let is_error = raw.get("isError").and_then(Value::as_bool).unwrap_or(false);
        Self {
            is_error,
            text,
            raw,
        }
    }
}

/// A live, initialized connection to one provider.
#[async_trait]
pub trait ProviderConnection: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>>;

    async fn list_prompts(&self) -> Result<Vec<PromptSpec>>;

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolOutput>;

    /// Close the transport and stop the provider process.
    async fn shutdown(self: Box<Self>) -> Result<()>;
}

/// Starts providers.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Spawn the process described by `params` and complete the handshake.
    async fn launch(&self, params: &ServerParams) -> Result<Box<dyn ProviderConnection>>;
}

/// Bound `fut` by `limit`, mapping expiry to [`Error::Timeout`].
pub(crate) async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_elapsed| Error::Timeout { operation, limit })?
}

/// Launches providers as child processes speaking MCP over stdio.
#[derive(Debug, Clone)]
pub struct StdioLauncher {
    handshake_timeout: Duration,
    tool_timeout: Duration,
}

impl StdioLauncher {
    /// `handshake_timeout` bounds `initialize` and each capability listing;
    /// `tool_timeout` bounds tool calls.
    #[must_use]
    pub fn new(handshake_timeout: Duration, tool_timeout: Duration) -> Self {
        Self {
            handshake_timeout,
            tool_timeout,
        }
    }
}

#[async_trait]
impl Launcher for StdioLauncher {
    async fn launch(&self, params: &ServerParams) -> Result<Box<dyn ProviderConnection>> {
        let server = params.server.clone();

        tracing::info!(
            name: "mcp.server.spawning",
            server = %server,
            command = %params.command_line(),
            cwd = ?params.cwd,
            "Spawning MCP server"
        );

        let transport = TokioChildProcess::new(params.to_command()).map_err(|source| {
            Error::Spawn {
                server: server.clone(),
                source,
            }
        })?;

        // Dropping the transport on timeout kills the child.
        let service = bounded("initialize", self.handshake_timeout, async {
            ().serve(transport).await.map_err(|e| Error::Handshake {
                server: server.clone(),
                message: e.to_string(),
            })
        })
        .await?;

        if let Some(info) = service.peer_info() {
            tracing::info!(
                name: "mcp.server.initialized",
                server = %server,
                peer = %info.server_info.name,
                version = %info.server_info.version,
                protocol = ?info.protocol_version,
                "MCP handshake complete"
            );
        }

        Ok(Box::new(RmcpConnection {
            server,
            service,
            listing_timeout: self.handshake_timeout,
            tool_timeout: self.tool_timeout,
        }))
    }
}

struct RmcpConnection {
    server: String,
    service: RunningService<RoleClient, ()>,
    listing_timeout: Duration,
    tool_timeout: Duration,
}

impl RmcpConnection {
    fn advertises_prompts(&self) -> bool {
        self.service
            .peer_info()
            .is_none_or(|info| info.capabilities.prompts.is_some())
    }
}

#[async_trait]
impl ProviderConnection for RmcpConnection {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>> {
        let tools = bounded("tools/list", self.listing_timeout, async {
            self.service
                .list_all_tools()
                .await
                .map_err(|e| Error::Protocol {
                    method: "tools/list",
                    message: e.to_string(),
                })
        })
        .await?;
        Ok(tools.into_iter().map(ToolSpec::from).collect())
    }

    async fn list_prompts(&self) -> Result<Vec<PromptSpec>> {
        if !self.advertises_prompts() {
            tracing::debug!(
                server = %self.server,
                "Server does not advertise prompts; skipping prompts/list"
            );
            return Ok(Vec::new());
        }
        let prompts = bounded("prompts/list", self.listing_timeout, async {
            self.service
                .list_all_prompts()
                .await
                .map_err(|e| Error::Protocol {
                    method: "prompts/list",
                    message: e.to_string(),
                })
        })
        .await?;
        Ok(prompts.into_iter().map(PromptSpec::from).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolOutput> {
        let res = bounded("tools/call", self.tool_timeout, async {
            self.service
                .call_tool(CallToolRequestParam {
                    name: name.to_string().into(),
                    arguments: Some(arguments),
                })
                .await
                .map_err(|e| Error::Protocol {
                    method: "tools/call",
                    message: e.to_string(),
                })
        })
        .await?;
        Ok(ToolOutput::from_result_json(serde_json::to_value(res)?))
    }

    async fn shutdown(self: Box<Self>) -> Result<()> {
        let Self {
            server, service, ..
        } = *self;
        let reason = service.cancel().await.map_err(|e| Error::Shutdown {
            server: server.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!(server = %server, reason = ?reason, "MCP service stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_output_collects_text_parts() {
        let out = ToolOutput::from_result_json(json!({
            "content": [
                { "type": "text", "text": "sunny" },
                { "type": "image", "data": "AAAA", "mimeType": "image/png" },
                { "type": "text", "text": "21C" }
            ]
        }));
        assert!(!out.is_error);
        assert_eq!(out.text, vec!["sunny", "21C"]);
    }

    #[test]
    fn tool_output_reads_error_flag() {
        let out = ToolOutput::from_result_json(json!({
            "content": [{ "type": "text", "text": "bad input" }],
            "isError": true
        }));
        assert!(out.is_error);
    }

    #[tokio::test]
    async fn bounded_maps_expiry_to_timeout() {
        let res: Result<()> = bounded("initialize", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(
            res,
            Err(Error::Timeout {
                operation: "initialize",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let launcher = StdioLauncher::new(Duration::from_secs(2), Duration::from_secs(2));
        let params = ServerParams {
            server: "ghost".to_string(),
            program: "mcp-dispatch-no-such-binary".to_string(),
            args: Vec::new(),
            cwd: None,
            env: Default::default(),
        };
        let err = launcher.launch(&params).await.err().unwrap();
        assert!(matches!(err, Error::Spawn { ref server, .. } if server == "ghost"));
    }
}
