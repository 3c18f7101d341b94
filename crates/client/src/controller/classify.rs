//! Request routing: exclusion filter and static/dynamic classification.

use serde::Serialize;
use wird_core::{Destination, Request};

use crate::fetch::is_http;

/// How the controller handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Not intercepted; the host fetches it natively and nothing is cached.
    Passthrough,
    /// Static-class: cache-first into the static partition.
    CacheFirst,
    /// Dynamic-class: network-first into the dynamic partition.
    NetworkFirst,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Passthrough => "passthrough",
            Route::CacheFirst => "cache_first",
            Route::NetworkFirst => "network_first",
        }
    }
}

/// Decides the route for each request from the exclusion list and static markers.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    exclude: Vec<String>,
    static_markers: Vec<String>,
}

impl RequestClassifier {
    pub fn new(exclude: Vec<String>, static_markers: Vec<String>) -> Self {
        Self { exclude, static_markers }
    }

    /// URL contains an excluded substring.
    pub fn is_excluded(&self, request: &Request) -> bool {
        let url = request.url.as_str();
        self.exclude.iter().any(|pattern| url.contains(pattern.as_str()))
    }

    /// Stylesheets, scripts, images, and anything under a static marker.
    pub fn is_static(&self, request: &Request) -> bool {
        if matches!(request.destination, Destination::Style | Destination::Script | Destination::Image) {
            return true;
        }
        let url = request.url.as_str();
        self.static_markers.iter().any(|marker| url.contains(marker.as_str()))
    }

    pub fn route(&self, request: &Request) -> Route {
        if self.is_excluded(request) || !is_http(&request.url) {
            Route::Passthrough
        } else if self.is_static(request) {
            Route::CacheFirst
        } else {
            Route::NetworkFirst
        }
    }
}
