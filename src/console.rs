//! Human-readable console output.
//!
//! Everything here returns a `String`; callers decide where it is written.

use serde_json::{Map, Value};

use crate::mcp::capability::{Capability, PromptSpec, ToolSpec};
use crate::mcp::config::ServerParams;
use crate::mcp::transport::ToolOutput;

pub fn render_server_params(params: &ServerParams) -> String {
    let cwd = params
        .cwd
        .as_ref()
        .map_or_else(|| "(inherited)".to_string(), |p| p.display().to_string());
    format!(
        "Command: {}\nWorking directory: {cwd}\n",
        params.command_line()
    )
}

pub fn render_capability(capability: &Capability) -> String {
    match capability {
        Capability::Tool(tool) => format!(
            "\nTool: {}\nDescription: {}\nInput schema: {}\n",
            tool.name, tool.description, tool.raw_schema
        ),
        Capability::Prompt(prompt) => format!(
            "\nPrompt: {}\nDescription: {}\nArguments: {}\n",
            prompt.name,
            prompt.description,
            render_prompt_arguments(prompt)
        ),
    }
}

fn render_prompt_arguments(prompt: &PromptSpec) -> String {
    if prompt.arguments.is_empty() {
        return "none".to_string();
    }
    prompt
        .arguments
        .iter()
        .map(|arg| {
            if arg.required {
                format!("{}*", arg.name)
            } else {
                arg.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_tools(tools: &[ToolSpec]) -> String {
    let mut out = String::from("\n=== Available tools ===\n");
    for tool in tools {
        out.push_str(&render_capability(&Capability::Tool(tool.clone())));
    }
    out
}

pub fn render_prompts(prompts: &[PromptSpec]) -> String {
    let mut out = String::from("\n=== Available prompts ===\n");
    for prompt in prompts {
        out.push_str(&render_capability(&Capability::Prompt(prompt.clone())));
    }
    out
}

pub fn render_tool_call(name: &str, arguments: &Map<String, Value>) -> String {
    format!(
        "Tool name: {name}, Tool args: {}\n",
        Value::Object(arguments.clone())
    )
}

pub fn render_tool_output(output: &ToolOutput) -> String {
    let label = if output.is_error {
        "Tool error"
    } else {
        "Tool result"
    };
    let body = if output.text.is_empty() {
        output.raw.to_string()
    } else {
        output.text.join("\n")
    };
    format!("{label}: {body}\n")
}
