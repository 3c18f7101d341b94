//! Cache-first and network-first strategies with their fallback chains.
//!
//! Fallback order per request class:
//! - static:  cache → network (→ request boundary)
//! - dynamic: network → cache → shell document (navigations only) → 503

use wird_core::{Destination, Error, Request, Response};

use super::OfflineController;

impl OfflineController {
    /// Cache-first for static-class requests.
    ///
    /// A rejected network attempt on a miss propagates to the request boundary.
    pub(crate) async fn cache_first(&self, request: &Request) -> Result<Response, Error> {
        match self.storage.match_any(request).await {
            Ok(Some(cached)) => {
                tracing::debug!(url = %request.url, "serving from cache");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed, going to network"),
        }

        let response = self.fetch_network(request).await?;
        if is_cacheable(request, &response) {
            self.store(&self.config.static_partition(), request, &response).await;
        }
        Ok(response)
    }

    /// Network-first for dynamic-class requests.
    pub(crate) async fn network_first(&self, request: &Request) -> Result<Response, Error> {
        match self.fetch_network(request).await {
            Ok(response) => {
                if is_cacheable(request, &response) {
                    self.store(&self.config.dynamic_partition(), request, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                tracing::info!(url = %request.url, error = %e, "network failed, trying cache");
                self.offline_fallback(request).await
            }
        }
    }

    async fn offline_fallback(&self, request: &Request) -> Result<Response, Error> {
        if let Some(cached) = self.storage.match_any(request).await? {
            tracing::debug!(url = %request.url, "serving from cache (offline)");
            return Ok(cached);
        }

        if !request.is_document() {
            return Ok(Response::content_unavailable());
        }

        let shell = Request::get(self.config.root_url(), Destination::Document);
        match self.storage.match_any(&shell).await? {
            Some(cached) => {
                tracing::debug!(url = %request.url, "serving shell document (offline)");
                Ok(cached)
            }
            None => Ok(Response::offline_page()),
        }
    }

    /// Boundary fallback once a strategy failed: whatever the cache has, else 500.
    pub(crate) async fn last_resort(&self, request: &Request) -> Response {
        match self.storage.match_any(request).await {
            Ok(Some(cached)) => cached,
            Ok(None) => Response::internal_error(),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "last-resort cache lookup failed");
                Response::internal_error()
            }
        }
    }

    /// One network attempt, bounded by the configured timeout.
    pub(crate) async fn fetch_network(&self, request: &Request) -> Result<Response, Error> {
        let timeout = self.config.fetch_timeout;
        match tokio::time::timeout(timeout, self.network.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::FetchTimeout(format!("{} after {}ms", request.url, timeout.as_millis()))),
        }
    }

    /// Best-effort write; a failed write never fails the request.
    async fn store(&self, partition: &str, request: &Request, response: &Response) {
        match self.storage.put(partition, request, response).await {
            Ok(()) => tracing::debug!(url = %request.url, partition, "cached response"),
            Err(e) => tracing::warn!(url = %request.url, partition, error = %e, "failed to cache response"),
        }
    }
}

/// Only successful GET responses are written.
fn is_cacheable(request: &Request, response: &Response) -> bool {
    response.is_ok() && request.method.eq_ignore_ascii_case("GET")
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(path: &str) -> Request {
        Request::get(Url::parse("http://localhost:3000").unwrap().join(path).unwrap(), Destination::Document)
    }

    #[test]
    fn test_is_cacheable() {
        let ok = Response::synthetic(200, "OK", "", None);
        let missing = Response::synthetic(404, "Not Found", "", None);
        assert!(is_cacheable(&get("/"), &ok));
        assert!(!is_cacheable(&get("/"), &missing));

        let mut post = get("/");
        post.method = "POST".into();
        assert!(!is_cacheable(&post, &ok));
    }
}
