//! sw_status tool implementation.

use rmcp::{ErrorData as McpError, model::*};
use wird_client::Registration;

use crate::error::json_result;

/// Report the active and waiting generations and the partitions in storage.
pub async fn status_impl(registration: &Registration) -> Result<CallToolResult, McpError> {
    let status = registration.status().await?;
    json_result(&status)
}
