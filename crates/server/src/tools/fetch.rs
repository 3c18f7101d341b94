//! sw_fetch tool implementation.
//!
//! Issues one page request through the registration, the way a browser
//! routes a request from a controlled page.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use wird_client::fetch::resolve;
use wird_client::{ControllerConfig, FetchOutcome, Registration};
use wird_core::{Destination, Error, Request, Response, ResponseSource};

use crate::error::json_result;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination. Inferred from the URL and Accept header when omitted.
    #[serde(default)]
    pub destination: Option<Destination>,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    /// Whether the active controller answered the request.
    pub intercepted: bool,
    /// Strategy that answered: "cache_first", "network_first" or "passthrough".
    pub strategy: String,
    pub status: u16,
    pub status_text: String,
    pub source: ResponseSource,
    pub content_type: Option<String>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
}

impl SwFetchOutput {
    fn new(url: &str, strategy: &str, intercepted: bool, response: &Response) -> Self {
        Self {
            url: url.to_string(),
            intercepted,
            strategy: strategy.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            source: response.source,
            content_type: response.content_type().map(str::to_string),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len(),
        }
    }
}

/// Implementation of the sw_fetch tool.
///
/// Requests the controller does not intercept go straight to the network and
/// are never cached.
pub async fn fetch_impl(
    registration: &Registration, base: &ControllerConfig, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let request = build_request(registration, base, &params).await?;
    let url = request.url.to_string();

    match registration.fetch(&request).await {
        FetchOutcome::Responded { route, response } => {
            json_result(&SwFetchOutput::new(&url, route.as_str(), true, &response))
        }
        FetchOutcome::Passthrough => {
            tracing::debug!(url = %url, "request not intercepted, fetching natively");
            let response = registration.network().fetch(&request).await?;
            json_result(&SwFetchOutput::new(&url, "passthrough", false, &response))
        }
    }
}

async fn build_request(
    registration: &Registration, base: &ControllerConfig, params: &SwFetchParams,
) -> Result<Request, Error> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()));
    }

    let origin = match registration.active().await {
        Some(controller) => controller.config().origin.clone(),
        None => base.origin.clone(),
    };
    let url = resolve(&origin, &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let destination = params
        .destination
        .unwrap_or_else(|| Destination::infer(&url, params.accept.as_deref()));

    Ok(Request { method: params.method.trim().to_ascii_uppercase(), url, destination, accept: params.accept.clone() })
}
