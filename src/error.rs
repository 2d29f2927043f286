//! Error types for the client.

use std::time::Duration;

use thiserror::Error;

use crate::mcp::session::SessionState;

/// Client error type.
#[derive(Error, Debug)]
pub enum Error {
    /// The MCP configuration has no usable server section.
    #[error("no valid MCP server configuration: {0}")]
    InvalidConfig(String),

    /// The requested server is not present in the configuration.
    #[error("MCP server '{0}' is not defined in the configuration")]
    UnknownServer(String),

    /// The server entry does not name an executable.
    #[error("no executable command configured for MCP server '{0}'")]
    MissingCommand(String),

    /// The provider process could not be started.
    #[error("failed to spawn MCP server '{server}': {source}")]
    Spawn {
        /// Server name from the configuration.
        server: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The `initialize` exchange failed.
    #[error("handshake with MCP server '{server}' failed: {message}")]
    Handshake {
        /// Server name from the configuration.
        server: String,
        /// Failure reported by the transport.
        message: String,
    },

    /// An MCP request on a live session failed.
    #[error("MCP request '{method}' failed: {message}")]
    Protocol {
        /// Protocol method, e.g. `tools/list`.
        method: &'static str,
        /// Failure reported by the transport.
        message: String,
    },

    /// A bounded operation did not finish in time.
    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        /// What was being waited on.
        operation: &'static str,
        /// The configured bound.
        limit: Duration,
    },

    /// The session is not in the `Connected` state.
    #[error("MCP session is not connected (state: {0})")]
    NotConnected(SessionState),

    /// `connect` was called on a session that has already been used.
    #[error("MCP session cannot be reconnected (state: {0}); create a new session")]
    SessionClosed(SessionState),

    /// Tearing down the provider failed.
    #[error("failed to shut down MCP server '{server}': {message}")]
    Shutdown {
        /// Server name from the configuration.
        server: String,
        /// Failure reported by the transport.
        message: String,
    },

    /// HTTP request to the model API failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the API.
        message: String,
    },

    /// The model API answered without any choice.
    #[error("model returned no choices")]
    EmptyCompletion,

    /// The model's function-call arguments are not a JSON object.
    #[error("malformed arguments for function '{name}': {message}")]
    MalformedArguments {
        /// Function the model asked for.
        name: String,
        /// Why decoding failed.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Console or file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a dispatch turn that failed with this error can be reported
    /// and skipped without ending the session.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Api { .. }
                | Self::EmptyCompletion
                | Self::MalformedArguments { .. }
                | Self::Timeout { .. }
                | Self::Protocol { .. }
                | Self::Json(_)
        )
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
