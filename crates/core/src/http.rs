//! Request and response values passed between the controller, the cache and the network.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::hash::compute_cache_key;

/// What kind of resource the page asked for.
///
/// Mirrors the `destination` values a page attaches to its outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Font,
    Manifest,
    #[default]
    Empty,
}

impl Destination {
    /// Infer a destination when the caller did not supply one.
    ///
    /// An `Accept` header naming `text/html` wins; otherwise the path extension decides,
    /// and extension-less paths are treated as documents (app routes like `/search`).
    pub fn infer(url: &Url, accept: Option<&str>) -> Self {
        if accept.is_some_and(|a| a.contains("text/html")) {
            return Destination::Document;
        }

        let path = url.path();
        let last = path.rsplit('/').next().unwrap_or_default();
        let Some((_, ext)) = last.rsplit_once('.') else {
            return if accept.is_some() { Destination::Empty } else { Destination::Document };
        };

        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Destination::Document,
            "css" => Destination::Style,
            "js" | "mjs" => Destination::Script,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" | "avif" => Destination::Image,
            "woff" | "woff2" | "ttf" | "otf" => Destination::Font,
            "webmanifest" => Destination::Manifest,
            _ => Destination::Empty,
        }
    }
}

/// An outbound request from a page under the controller's scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
    pub accept: Option<String>,
}

impl Request {
    /// A GET request with an explicit destination.
    pub fn get(url: Url, destination: Destination) -> Self {
        Self { method: "GET".into(), url, destination, accept: None }
    }

    /// Whether this is a full-page navigation.
    pub fn is_document(&self) -> bool {
        self.destination == Destination::Document
    }

    /// Cache key for this request (method + URL, fragment ignored).
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        compute_cache_key(&self.method, url.as_str())
    }
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    Synthetic,
}

/// An HTTP-like response.
///
/// Cloning is cheap: the body is reference-counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl Response {
    /// A successful status (200-299). Only these are ever written to a partition.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// A response generated by the controller itself.
    pub fn synthetic(status: u16, status_text: &str, body: &str, content_type: Option<&str>) -> Self {
        let headers = content_type
            .map(|ct| vec![("content-type".to_string(), ct.to_string())])
            .unwrap_or_default();
        Self {
            status,
            status_text: status_text.to_string(),
            headers,
            body: Bytes::copy_from_slice(body.as_bytes()),
            source: ResponseSource::Synthetic,
        }
    }

    /// 503 page for a navigation with no network and no cached page or shell.
    pub fn offline_page() -> Self {
        Self::synthetic(
            503,
            "Service Unavailable",
            "<!doctype html><meta charset=\"utf-8\"><title>Offline</title>\
             <p>This page is not available offline.</p>",
            Some("text/html; charset=utf-8"),
        )
    }

    /// 503 for a non-navigation request with no network and no cached copy.
    pub fn content_unavailable() -> Self {
        Self::synthetic(503, "Service Unavailable", "Content unavailable offline", None)
    }

    /// 500 for a request whose handling failed and had no cached copy.
    pub fn internal_error() -> Self {
        Self::synthetic(500, "Internal Server Error", "Offline cache controller error", None)
    }
}
