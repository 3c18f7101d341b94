//! Offline cache controller.
//!
//! One `OfflineController` is one generation of the installable worker. It is
//! built from an explicit [`ControllerConfig`] and two injected backends:
//!
//! - [`CacheStorage`] for the `static-<tag>` and `dynamic-<tag>` partitions
//! - [`Network`] for the single network attempt each request gets
//!
//! ### Request handling
//! - Excluded URLs and non-http schemes are not intercepted.
//! - Static-class requests (styles, scripts, images, shell assets) are cache-first.
//! - Everything else is network-first with cache, shell-document and 503 fallbacks.
//! - Only 2xx GET responses are written; writes are best-effort.
//!
//! ### Lifecycle
//! `install` pre-caches the shell, `activate` deletes partitions from other
//! generations. [`Registration`] decides when a generation activates.

pub mod classify;
pub mod config;
pub mod lifecycle;
pub mod message;
pub mod registration;
mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use wird_core::{CacheStorage, Destination, Error, PrecacheMode, Request, Response};

pub use classify::{RequestClassifier, Route};
pub use config::ControllerConfig;
pub use lifecycle::LifecycleState;
pub use message::{ControlMessage, ControlReply};
pub use registration::{ControllerInfo, PartitionInfo, Registration, RegistrationStatus};

use crate::fetch::{Network, resolve};

/// What the controller did with a request.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Not intercepted: the host should fetch it natively without caching.
    Passthrough,
    /// Intercepted and answered.
    Responded { route: Route, response: Response },
}

/// Result of the install-time pre-cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallReport {
    pub partition: String,
    pub cached: Vec<String>,
    pub failed: Vec<String>,
}

/// Result of activation cleanup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivationReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
}

/// One generation of the offline cache controller.
pub struct OfflineController {
    generation: u64,
    config: ControllerConfig,
    classifier: RequestClassifier,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: RwLock<LifecycleState>,
    skip_waiting: AtomicBool,
    created_at: DateTime<Utc>,
}

impl OfflineController {
    pub fn new(
        generation: u64, config: ControllerConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
    ) -> Self {
        let classifier = RequestClassifier::new(config.exclude.clone(), config.static_markers.clone());
        Self {
            generation,
            config,
            classifier,
            storage,
            network,
            state: RwLock::new(LifecycleState::Parsed),
            skip_waiting: AtomicBool::new(false),
            created_at: Utc::now(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Whether this generation asked to activate without waiting.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Open the static partition and pre-cache the shell.
    ///
    /// In `best_effort` mode failing URLs are logged and skipped. In `atomic`
    /// mode one failure stores nothing and the controller becomes redundant.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.state.write().await.advance(LifecycleState::Installing)?;
        tracing::info!(generation = self.generation, "installing controller");

        let result = self.precache().await;

        let mut state = self.state.write().await;
        match result {
            Ok(report) => {
                state.advance(LifecycleState::Installed)?;
                if self.config.skip_waiting_on_install {
                    self.skip_waiting.store(true, Ordering::SeqCst);
                }
                tracing::info!(
                    generation = self.generation,
                    cached = report.cached.len(),
                    failed = report.failed.len(),
                    "controller installed"
                );
                Ok(report)
            }
            Err(e) => {
                state.advance(LifecycleState::Redundant)?;
                tracing::warn!(generation = self.generation, error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<InstallReport, Error> {
        let partition = self.config.static_partition();
        self.storage.open(&partition).await?;

        let requests = self
            .config
            .precache
            .iter()
            .map(|path| {
                let url = resolve(&self.config.origin, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
                let destination = Destination::infer(&url, None);
                Ok(Request::get(url, destination))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let results = join_all(requests.iter().map(|req| self.fetch_for_precache(req))).await;

        let mut report = InstallReport { partition: partition.clone(), ..Default::default() };

        match self.config.precache_mode {
            PrecacheMode::Atomic => {
                let mut entries = Vec::with_capacity(requests.len());
                for (request, result) in requests.into_iter().zip(results) {
                    match result {
                        Ok(response) => entries.push((request, response)),
                        Err(e) => {
                            return Err(Error::InstallFailed(format!("pre-cache of {} failed: {e}", request.url)));
                        }
                    }
                }
                self.storage.put_batch(&partition, &entries).await?;
                report.cached = entries.iter().map(|(req, _)| req.url.to_string()).collect();
            }
            PrecacheMode::BestEffort => {
                for (request, result) in requests.into_iter().zip(results) {
                    let stored = match result {
                        Ok(response) => self.storage.put(&partition, &request, &response).await,
                        Err(e) => Err(e),
                    };
                    match stored {
                        Ok(()) => report.cached.push(request.url.to_string()),
                        Err(e) => {
                            tracing::warn!(url = %request.url, error = %e, "skipping shell asset");
                            report.failed.push(request.url.to_string());
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    /// A pre-cache fetch succeeds only with a 2xx response.
    async fn fetch_for_precache(&self, request: &Request) -> Result<Response, Error> {
        let response = self.fetch_network(request).await?;
        if !response.is_ok() {
            return Err(Error::InstallFailed(format!("{} returned {}", request.url, response.status)));
        }
        Ok(response)
    }

    /// Delete partitions from other generations and take control.
    ///
    /// Cleanup failures are logged; activation still completes.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        self.state.write().await.advance(LifecycleState::Activating)?;

        let keep = [self.config.static_partition(), self.config.dynamic_partition()];
        let mut report = ActivationReport::default();

        match self.storage.keys().await {
            Ok(names) => {
                let (kept, stale): (Vec<String>, Vec<String>) = names.into_iter().partition(|n| keep.contains(n));
                report.kept = kept;

                let results = join_all(stale.iter().map(|name| self.storage.delete(name))).await;
                for (name, result) in stale.into_iter().zip(results) {
                    match result {
                        Ok(_) => {
                            tracing::info!(partition = %name, "deleted old cache partition");
                            report.deleted.push(name);
                        }
                        Err(e) => tracing::warn!(partition = %name, error = %e, "failed to delete old partition"),
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not list partitions during activation"),
        }

        self.state.write().await.advance(LifecycleState::Activated)?;
        tracing::info!(generation = self.generation, deleted = report.deleted.len(), "controller activated");

        Ok(report)
    }

    /// A newer generation took over, or install failed.
    pub async fn mark_redundant(&self) {
        let mut state = self.state.write().await;
        if state.advance(LifecycleState::Redundant).is_ok() {
            tracing::info!(generation = self.generation, "controller is redundant");
        }
    }

    /// Handle one outbound request from a page.
    ///
    /// Never fails: every intercepted request ends in a response, synthetic if need be.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        let route = self.classifier.route(request);
        let result = match route {
            Route::Passthrough => {
                tracing::trace!(url = %request.url, "not intercepted");
                return FetchOutcome::Passthrough;
            }
            Route::CacheFirst => self.cache_first(request).await,
            Route::NetworkFirst => self.network_first(request).await,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %request.url, route = route.as_str(), error = %e, "request handling failed");
                self.last_resort(request).await
            }
        };

        FetchOutcome::Responded { route, response }
    }

    /// Handle a control message. `SKIP_WAITING` has no reply.
    pub async fn handle_message(&self, message: ControlMessage) -> Result<Option<ControlReply>, Error> {
        tracing::debug!(generation = self.generation, ?message, "control message");
        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting.store(true, Ordering::SeqCst);
                Ok(None)
            }
            ControlMessage::GetCacheSize => Ok(Some(ControlReply::CacheSize { size: self.cache_size().await? })),
            ControlMessage::ClearCache => {
                self.clear_all().await?;
                Ok(Some(ControlReply::CacheCleared))
            }
        }
    }

    /// Sum of stored body bytes across every partition.
    pub async fn cache_size(&self) -> Result<u64, Error> {
        let mut total = 0;
        for name in self.storage.keys().await? {
            total += self.storage.partition_size(&name).await?;
        }
        Ok(total)
    }

    /// Delete every partition, whichever generation owns it.
    pub async fn clear_all(&self) -> Result<usize, Error> {
        let names = self.storage.keys().await?;
        let results = join_all(names.iter().map(|name| self.storage.delete(name))).await;
        let mut deleted = 0;
        for result in results {
            if result? {
                deleted += 1;
            }
        }
        tracing::info!(deleted, "all cache partitions cleared");
        Ok(deleted)
    }
}
