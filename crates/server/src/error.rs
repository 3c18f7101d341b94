//! Structured errors for tool parameter handling.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Errors raised by the tool layer before the controller is involved.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be serialized.
    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(String),
}

impl From<ServerError> for McpError {
    fn from(err: ServerError) -> Self {
        let (code, message) = match &err {
            ServerError::InvalidInput(msg) => (-32602, msg.clone()),
            ServerError::Serialize(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

/// Render a tool output as pretty JSON text content.
pub fn json_result<T: serde::Serialize>(output: &T) -> Result<rmcp::model::CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ServerError::Serialize(e.to_string()))?;
    Ok(rmcp::model::CallToolResult::success(vec![rmcp::model::Content::text(json)]))
}
