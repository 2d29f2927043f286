//! MCP Dispatch CLI
//!
//! Entry point: connect to one MCP server, list its capabilities, then answer
//! queries from stdin until `exit`, end of input or Ctrl-C.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mcp_dispatch::config::AppConfig;
use mcp_dispatch::console;
use mcp_dispatch::dispatch::DispatchLoop;
use mcp_dispatch::llm::ChatCompletionsDispatcher;
use mcp_dispatch::mcp::{McpConfig, Session, StdioLauncher};

#[tokio::main]
async fn main() {
    // Load .env (if present) before clap reads env fallbacks
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log_json);

    info!(
        name: "llm.config.loaded",
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        "LLM configuration loaded"
    );

    if let Err(e) = run(config).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    // After Ctrl-C a stdin read is still parked on the blocking pool, and
    // dropping the runtime would wait for it.
    let _ = std::io::Write::flush(&mut std::io::stdout());
    std::process::exit(0);
}

// Logs go to stderr so they never interleave with the interactive console.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let mcp = McpConfig::load_or_empty(&config.mcp_config);
    if let Err(e) = mcp.validate() {
        eprintln!("{e} ({})", config.mcp_config.display());
        std::process::exit(1);
    }

    let params = mcp.server_params(&config.server)?;
    print!("{}", console::render_server_params(&params));

    let launcher = Arc::new(StdioLauncher::new(
        config.timeouts.handshake,
        config.timeouts.tool,
    ));
    let mut session = Session::new(mcp, launcher);
    session
        .connect_params(params)
        .await
        .with_context(|| format!("failed to connect to MCP server '{}'", config.server))?;

    println!("Connected to MCP server '{}'", config.server);
    info!(
        name: "mcp.capabilities.listed",
        server = session.server_name().unwrap_or_default(),
        count = session.capabilities().len(),
        "Capabilities listed"
    );
    print!("{}", console::render_tools(session.tools()));
    print!("{}", console::render_prompts(session.prompts()));

    let outcome = if config.list_only {
        Ok(())
    } else {
        interact(&config, &session).await
    };

    session
        .cleanup()
        .await
        .context("failed to shut down MCP server")?;
    outcome
}

async fn interact(config: &AppConfig, session: &Session) -> anyhow::Result<()> {
    if config.llm.api_key.is_none() {
        warn!("No API key configured (OPENAI_API_KEY); requests are sent unauthenticated");
    }
    let dispatcher = ChatCompletionsDispatcher::new(config.llm.clone())?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut repl = DispatchLoop::new(
        &dispatcher,
        session.tools(),
        session,
        stdin,
        tokio::io::stdout(),
    );

    println!("\nType 'exit' or press Ctrl-C to quit.");
    tokio::select! {
        exit = repl.run() => {
            let exit = exit?;
            info!(name: "dispatch.loop.finished", reason = ?exit, "Dispatch loop finished");
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            info!(name: "dispatch.loop.interrupted", "Interrupted");
        }
    }
    Ok(())
}
