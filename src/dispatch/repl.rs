use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;
use uuid::Uuid;

use crate::console;
use crate::error::Result;
use crate::mcp::capability::ToolSpec;
use crate::mcp::transport::ToolOutput;

use super::{DispatchDecision, Dispatcher, ToolInvoker};

const QUERY_PROMPT: &str = "Enter a query: ";
const CONFIRM_PROMPT: &str = "Execute this tool? (y/n) ";

/// Result of one query.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model answered in text.
    Answered(String),
    /// The user confirmed and the tool ran.
    Executed(ToolOutput),
    /// The user declined the tool call.
    Declined,
    /// A recoverable error ended the turn; the message was shown.
    Failed(String),
}

/// Why [`DispatchLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    EndOfInput,
    ExitCommand,
}

/// Inputs that end the loop.
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    ["exit", "quit", ":q"]
        .iter()
        .any(|cmd| line.eq_ignore_ascii_case(cmd))
}

/// Answers that confirm a tool call.
pub fn is_affirmative(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("y") || line.eq_ignore_ascii_case("yes")
}

/// Interactive query loop over a line-oriented console.
pub struct DispatchLoop<'a, R, W> {
    dispatcher: &'a dyn Dispatcher,
    tools: &'a [ToolSpec],
    invoker: &'a dyn ToolInvoker,
    input: R,
    output: W,
}

impl<R, W> std::fmt::Debug for DispatchLoop<'_, R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchLoop")
            .field("tool_count", &self.tools.len())
            .finish()
    }
}

impl<'a, R, W> DispatchLoop<'a, R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(
        dispatcher: &'a dyn Dispatcher,
        tools: &'a [ToolSpec],
        invoker: &'a dyn ToolInvoker,
        input: R,
        output: W,
    ) -> Self {
        Self {
            dispatcher,
            tools,
            invoker,
            input,
            output,
        }
    }

    /// Read and handle queries until end of input or an exit command.
    pub async fn run(&mut self) -> Result<LoopExit> {
        loop {
            self.write(QUERY_PROMPT).await?;
            let Some(line) = self.read_line().await? else {
                self.write("\n").await?;
                return Ok(LoopExit::EndOfInput);
            };
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if is_exit_command(query) {
                return Ok(LoopExit::ExitCommand);
            }
            self.run_turn(query).await?;
        }
    }

    /// Decide on one query and act on the decision.
    ///
    /// Recoverable failures are printed and reported as
    /// [`TurnOutcome::Failed`]; anything else is returned as an error.
    pub async fn run_turn(&mut self, query: &str) -> Result<TurnOutcome> {
        let span = tracing::info_span!("dispatch.turn", turn_id = %Uuid::new_v4());
        async move {
            let decision = match self.dispatcher.decide(query, self.tools).await {
                Ok(decision) => decision,
                Err(e) if e.is_recoverable() => return self.report(&e).await,
                Err(e) => return Err(e),
            };
            tracing::info!(
                name: "llm.decision",
                tool = decision.tool_name().unwrap_or("-"),
                "Model decision received"
            );
            self.confirm_and_execute(decision).await
        }
        .instrument(span)
        .await
    }

    /// Show a decision and, for tool calls, run the tool only after the user
    /// confirms.
    pub async fn confirm_and_execute(&mut self, decision: DispatchDecision) -> Result<TurnOutcome> {
        match decision {
            DispatchDecision::DirectAnswer { text } => {
                self.write(&format!("{text}\n")).await?;
                Ok(TurnOutcome::Answered(text))
            }
            DispatchDecision::ToolCall {
                tool_name,
                arguments,
            } => {
                self.write(&console::render_tool_call(&tool_name, &arguments))
                    .await?;
                self.write(CONFIRM_PROMPT).await?;
                let confirmed = self
                    .read_line()
                    .await?
                    .is_some_and(|answer| is_affirmative(&answer));
                if !confirmed {
                    tracing::info!(name: "mcp.tool.declined", tool = %tool_name, "Tool call declined");
                    self.write("Skipped.\n").await?;
                    return Ok(TurnOutcome::Declined);
                }

                match self.invoker.call_tool(&tool_name, arguments).await {
                    Ok(output) => {
                        self.write(&console::render_tool_output(&output)).await?;
                        Ok(TurnOutcome::Executed(output))
                    }
                    Err(e) if e.is_recoverable() => self.report(&e).await,
                    Err(e) => Err(e),
                }
            }
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    async fn report(&mut self, err: &crate::error::Error) -> Result<TurnOutcome> {
        tracing::warn!(name: "dispatch.turn.failed", error = %err, "Turn failed");
        let message = err.to_string();
        self.write(&format!("Error: {message}\n")).await?;
        Ok(TurnOutcome::Failed(message))
    }

    // Undecodable bytes become U+FFFD instead of failing the session.
    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}
