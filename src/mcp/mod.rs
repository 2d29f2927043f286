//! Model Context Protocol (MCP) client session.
//!
//! This module starts one MCP server as a child process, performs the
//! handshake over stdio and records the tools and prompts it advertises.
//!
//! # Configuration
//!
//! Servers are configured via `mcp-config.json`:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "mcp-server": {
//!       "command": ["python", "server.py"],
//!       "args": ["--verbose"],
//!       "cwd": "/opt/tools",
//!       "env": { "API_TOKEN": "${API_TOKEN}" }
//!     }
//!   }
//! }
//! ```
//!
//! `command` is either an executable name or an argv whose tail is prepended
//! to `args`.

pub mod capability;
pub mod config;
pub mod session;
pub mod transport;

pub use capability::{Capability, InputSchema, PromptSpec, ToolSpec};
pub use config::{McpConfig, ServerDescriptor, ServerParams};
pub use session::{Session, SessionState};
pub use transport::{Launcher, ProviderConnection, StdioLauncher, ToolOutput};
