//! MCP Dispatch
//!
//! A minimal Model Context Protocol client that launches one tool-provider
//! process, discovers its tools and prompts, and lets a hosted model decide
//! per query whether to answer directly or call one of those tools.
//!
//! # Architecture
//!
//! - **Session**: spawns the provider over stdio, performs the handshake,
//!   lists capabilities and guarantees teardown
//! - **Dispatch**: asks the model for a decision and executes confirmed tool
//!   calls against the session
//! - **LLM**: `OpenAI`-compatible Chat Completions backend using function calling
//!
//! # Modules
//!
//! - [`mcp`]: server configuration, capabilities, transport and session
//! - [`dispatch`]: decisions and the interactive loop
//! - [`llm`]: model settings and the chat-completions dispatcher
//! - [`console`]: console rendering
//! - [`config`]: CLI and layered settings

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod llm;
pub mod mcp;

pub use error::{Error, Result};
