//! Single-turn tool dispatch.
//!
//! A [`Dispatcher`] asks a model whether a query should be answered directly
//! or by calling one of the session's tools. [`DispatchLoop`] drives that
//! decision interactively: it reads queries, shows the decision, asks for
//! confirmation before any tool runs, and executes the call through a
//! [`ToolInvoker`].
//!
//! The loop only borrows the capability list and the invoker; it never owns
//! or mutates the session.

mod decision;
mod repl;

pub use decision::DispatchDecision;
pub use repl::{DispatchLoop, LoopExit, TurnOutcome, is_exit_command, is_affirmative};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::mcp::capability::ToolSpec;
use crate::mcp::transport::ToolOutput;

/// Model backend that turns a query into a [`DispatchDecision`].
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn decide(&self, query: &str, tools: &[ToolSpec]) -> Result<DispatchDecision>;
}

/// Handle used to execute a tool the model asked for.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolOutput>;
}
