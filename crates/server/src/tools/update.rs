//! sw_update and sw_activate_waiting tool implementations.
//!
//! A release ships a controller with new version tags. It installs next to the
//! active one and waits, unless it asks to skip waiting or nothing is active.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use wird_client::{ActivationReport, ControllerConfig, LifecycleState, Registration};

use crate::error::{ServerError, json_result};

/// Input parameters for sw_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwUpdateParams {
    /// New static partition version tag.
    #[serde(default)]
    pub static_version: Option<String>,

    /// New dynamic partition version tag.
    #[serde(default)]
    pub dynamic_version: Option<String>,

    /// Activate as soon as install completes instead of waiting.
    #[serde(default)]
    pub skip_waiting: Option<bool>,
}

/// Output structure for sw_update tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwUpdateOutput {
    pub generation: u64,
    pub state: LifecycleState,
    pub static_partition: String,
    pub dynamic_partition: String,
}

/// Output structure for sw_activate_waiting tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwActivateOutput {
    /// False when there was no waiting generation.
    pub activated: bool,
    pub report: Option<ActivationReport>,
}

/// Implementation of the sw_update tool.
pub async fn update_impl(
    registration: &Registration, base: &ControllerConfig, params: SwUpdateParams,
) -> Result<CallToolResult, McpError> {
    let static_version = non_empty("static_version", params.static_version.as_deref())?;
    let dynamic_version = non_empty("dynamic_version", params.dynamic_version.as_deref())?;
    if static_version.is_none() && dynamic_version.is_none() {
        return Err(ServerError::InvalidInput("static_version or dynamic_version is required".into()).into());
    }

    let current = match registration.active().await {
        Some(controller) => controller.config().clone(),
        None => base.clone(),
    };
    let mut next = current.with_versions(static_version, dynamic_version);
    if let Some(skip) = params.skip_waiting {
        next.skip_waiting_on_install = skip;
    }

    tracing::info!(
        static_partition = %next.static_partition(),
        dynamic_partition = %next.dynamic_partition(),
        "registering updated controller"
    );
    let controller = registration.register(next).await?;

    json_result(&SwUpdateOutput {
        generation: controller.generation(),
        state: controller.state().await,
        static_partition: controller.config().static_partition(),
        dynamic_partition: controller.config().dynamic_partition(),
    })
}

/// Implementation of the sw_activate_waiting tool.
///
/// Stands in for the moment every controlled page has closed.
pub async fn activate_waiting_impl(registration: &Registration) -> Result<CallToolResult, McpError> {
    let report = registration.clients_closed().await?;
    json_result(&SwActivateOutput { activated: report.is_some(), report })
}

fn non_empty<'a>(field: &str, value: Option<&'a str>) -> Result<Option<&'a str>, ServerError> {
    match value.map(str::trim) {
        Some("") => Err(ServerError::InvalidInput(format!("{field} cannot be empty"))),
        other => Ok(other),
    }
}
