//! Structured errors for the shellcache server.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use shellcache_core::ConfigError;

/// Errors raised by the tool layer itself rather than the worker.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool output could not be encoded.
    #[error("OUTPUT_FAILED: {0}")]
    Output(String),

    /// Configuration rejected a tool argument (e.g. an empty release).
    #[error("INVALID_INPUT: {0}")]
    Config(#[from] ConfigError),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::Output(_) => -32000,
            ToolError::Config(_) => -32602,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
