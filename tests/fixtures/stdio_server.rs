//! Minimal MCP server over stdio, used by the integration tests.
//!
//! Speaks newline-delimited JSON-RPC: `initialize`, `tools/list`,
//! `tools/call` and, when started with `--with-prompts`, `prompts/list`.
//! Tools: `echo` returns its `text` argument, `pid` returns the process id.

use serde_json::{Value, json};
use std::io::{BufRead, Write};

fn main() {
    let with_prompts = std::env::args().any(|arg| arg == "--with-prompts");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let Ok(request) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        // Notifications carry no id and get no reply.
        let Some(id) = request.get("id").cloned() else {
            continue;
        };
        let method = request["method"].as_str().unwrap_or_default();
        let params = &request["params"];

        let reply = match handle(method, params, with_prompts) {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(message) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": message }
            }),
        };
        if writeln!(stdout, "{reply}").and_then(|()| stdout.flush()).is_err() {
            break;
        }
    }
}

fn handle(method: &str, params: &Value, with_prompts: bool) -> Result<Value, String> {
    match method {
        "initialize" => {
            let mut capabilities = json!({ "tools": {} });
            if with_prompts {
                capabilities["prompts"] = json!({});
            }
            Ok(json!({
                "protocolVersion": params["protocolVersion"].as_str().unwrap_or("2024-11-05"),
                "capabilities": capabilities,
                "serverInfo": { "name": "fixture", "version": "0.1.0" }
            }))
        }
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({
            "tools": [
                {
                    "name": "echo",
                    "description": "Echo the given text",
                    "inputSchema": {
                        "type": "object",
                        "properties": { "text": { "type": "string" } },
                        "required": ["text"]
                    }
                },
                {
                    "name": "pid",
                    "description": "Report the server process id",
                    "inputSchema": { "type": "object", "properties": {} }
                }
            ]
        })),
        "tools/call" => match params["name"].as_str() {
            Some("echo") => {
                let text = params["arguments"]["text"].as_str().unwrap_or_default();
                Ok(json!({ "content": [{ "type": "text", "text": text }], "isError": false }))
            }
            Some("pid") => Ok(json!({
                "content": [{ "type": "text", "text": std::process::id().to_string() }],
                "isError": false
            })),
            _ => Ok(json!({
                "content": [{ "type": "text", "text": "unknown tool" }],
                "isError": true
            })),
        },
        "prompts/list" if with_prompts => Ok(json!({
            "prompts": [{
                "name": "summarize",
                "description": "Summarize a document",
                "arguments": [{ "name": "text", "required": true }]
            }]
        })),
        other => Err(format!("method not found: {other}")),
    }
}
