//! sw_message tool implementation.
//!
//! Posts a control message to the controller, as a page would.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use wird_client::{ControlMessage, ControlReply, Registration};

use crate::error::{ServerError, json_result};

/// Input parameters for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message type: "SKIP_WAITING", "GET_CACHE_SIZE" or "CLEAR_CACHE".
    #[serde(rename = "type")]
    pub kind: String,
}

/// Output structure for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwMessageOutput {
    /// The message that was delivered.
    pub message: ControlMessage,
    /// Reply posted back, if the message has one.
    pub reply: Option<ControlReply>,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(registration: &Registration, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let message = parse_message(&params.kind)?;
    tracing::debug!(?message, "delivering control message");

    let reply = registration.post_message(message).await?;
    json_result(&SwMessageOutput { message, reply })
}

fn parse_message(kind: &str) -> Result<ControlMessage, ServerError> {
    let tagged = serde_json::json!({ "type": kind.trim() });
    serde_json::from_value(tagged).map_err(|_| ServerError::InvalidInput(format!("unknown message type: {kind}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::testing::{StubNetwork, output, registration};

    #[test]
    fn test_parse_message() {
        assert_eq!(parse_message("SKIP_WAITING").unwrap(), ControlMessage::SkipWaiting);
        assert_eq!(parse_message(" CLEAR_CACHE ").unwrap(), ControlMessage::ClearCache);
        assert!(parse_message("skip_waiting").is_err());
        assert!(parse_message("PING").is_err());
    }

    #[tokio::test]
    async fn test_cache_size_then_clear() {
        let network = Arc::new(StubNetwork::with_pages(&[("/", "<html>shell</html>")]));
        let registration = registration(network).await;

        let result = message_impl(&registration, SwMessageParams { kind: "GET_CACHE_SIZE".into() }).await.unwrap();
        let out: SwMessageOutput = output(&result);
        assert_eq!(out.reply, Some(ControlReply::CacheSize { size: 18 }));

        let result = message_impl(&registration, SwMessageParams { kind: "CLEAR_CACHE".into() }).await.unwrap();
        let out: SwMessageOutput = output(&result);
        assert_eq!(out.reply, Some(ControlReply::CacheCleared));

        let result = message_impl(&registration, SwMessageParams { kind: "GET_CACHE_SIZE".into() }).await.unwrap();
        let out: SwMessageOutput = output(&result);
        assert_eq!(out.reply, Some(ControlReply::CacheSize { size: 0 }));
    }

    #[tokio::test]
    async fn test_unknown_message_is_invalid_input() {
        let registration = registration(Arc::new(StubNetwork::default())).await;
        let err = message_impl(&registration, SwMessageParams { kind: "PING".into() }).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
