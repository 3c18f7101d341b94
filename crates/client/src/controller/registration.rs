//! Registration: which controller generation is active, and which is waiting.
//!
//! A freshly installed generation activates at once when nothing is active yet.
//! Otherwise it waits until a page sends `SKIP_WAITING` or every page closes,
//! and the generation it replaces becomes redundant.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;
use wird_core::{CacheStorage, Error, Request};

use super::{
    ActivationReport, ControlMessage, ControlReply, ControllerConfig, FetchOutcome, LifecycleState, OfflineController,
};
use crate::fetch::Network;

/// Snapshot of one controller generation.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerInfo {
    pub generation: u64,
    pub state: LifecycleState,
    pub static_partition: String,
    pub dynamic_partition: String,
    pub created_at: String,
}

/// A partition that currently exists in storage.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionInfo {
    pub name: String,
    pub entries: usize,
    pub bytes: u64,
}

/// Snapshot of the registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationStatus {
    pub active: Option<ControllerInfo>,
    pub waiting: Option<ControllerInfo>,
    pub partitions: Vec<PartitionInfo>,
}

#[derive(Default)]
struct Slots {
    active: Option<Arc<OfflineController>>,
    waiting: Option<Arc<OfflineController>>,
}

/// Owns the controller generations sharing one storage and one network.
pub struct Registration {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    slots: RwLock<Slots>,
    next_generation: AtomicU64,
}

impl Registration {
    pub fn new(storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self { storage, network, slots: RwLock::new(Slots::default()), next_generation: AtomicU64::new(1) }
    }

    /// The network the host uses for requests the controller does not intercept.
    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub async fn active(&self) -> Option<Arc<OfflineController>> {
        self.slots.read().await.active.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<OfflineController>> {
        self.slots.read().await.waiting.clone()
    }

    /// Install a new generation and activate it or leave it waiting.
    ///
    /// # Errors
    ///
    /// Returns the install error; the failed generation is redundant and the
    /// current active controller keeps serving.
    pub async fn register(&self, config: ControllerConfig) -> Result<Arc<OfflineController>, Error> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let controller =
            Arc::new(OfflineController::new(generation, config, self.storage.clone(), self.network.clone()));

        controller.install().await?;

        let mut slots = self.slots.write().await;
        if slots.active.is_none() || controller.skip_waiting_requested() {
            promote(&mut slots, controller.clone()).await?;
        } else {
            if let Some(previous) = slots.waiting.replace(controller.clone()) {
                previous.mark_redundant().await;
            }
            tracing::info!(generation, "controller installed, waiting for pages to release the old one");
        }

        Ok(controller)
    }

    /// Activate the waiting generation, if any.
    ///
    /// Used both for `SKIP_WAITING` and for the moment every page has closed.
    pub async fn activate_waiting(&self) -> Result<Option<ActivationReport>, Error> {
        let mut slots = self.slots.write().await;
        let Some(waiting) = slots.waiting.take() else {
            return Ok(None);
        };
        promote(&mut slots, waiting).await.map(Some)
    }

    /// Every page under the scope closed.
    pub async fn clients_closed(&self) -> Result<Option<ActivationReport>, Error> {
        tracing::debug!("all clients closed");
        self.activate_waiting().await
    }

    /// Route a page request to the active controller.
    ///
    /// With no active controller nothing is intercepted.
    pub async fn fetch(&self, request: &Request) -> FetchOutcome {
        match self.active().await {
            Some(controller) => controller.handle_fetch(request).await,
            None => FetchOutcome::Passthrough,
        }
    }

    /// Deliver a page message.
    ///
    /// `SKIP_WAITING` goes to the waiting generation and activates it; the
    /// other messages go to the active generation, or the waiting one if
    /// nothing is active.
    pub async fn post_message(&self, message: ControlMessage) -> Result<Option<ControlReply>, Error> {
        if message == ControlMessage::SkipWaiting {
            let Some(waiting) = self.waiting().await else {
                tracing::debug!("SKIP_WAITING with no waiting controller");
                return Ok(None);
            };
            waiting.handle_message(message).await?;
            if waiting.skip_waiting_requested() {
                self.activate_waiting().await?;
            }
            return Ok(None);
        }

        let target = {
            let slots = self.slots.read().await;
            slots.active.clone().or_else(|| slots.waiting.clone())
        };
        let controller = target.ok_or_else(|| Error::NoController(format!("no controller for {message:?}")))?;
        controller.handle_message(message).await
    }

    pub async fn status(&self) -> Result<RegistrationStatus, Error> {
        let (active, waiting) = {
            let slots = self.slots.read().await;
            (slots.active.clone(), slots.waiting.clone())
        };

        let mut partitions = Vec::new();
        for name in self.storage.keys().await? {
            let entries = self.storage.entry_urls(&name).await?.len();
            let bytes = self.storage.partition_size(&name).await?;
            partitions.push(PartitionInfo { name, entries, bytes });
        }

        Ok(RegistrationStatus {
            active: match active {
                Some(c) => Some(info(&c).await),
                None => None,
            },
            waiting: match waiting {
                Some(c) => Some(info(&c).await),
                None => None,
            },
            partitions,
        })
    }
}

async fn promote(slots: &mut Slots, controller: Arc<OfflineController>) -> Result<ActivationReport, Error> {
    if slots.waiting.as_ref().is_some_and(|w| Arc::ptr_eq(w, &controller)) {
        slots.waiting = None;
    }

    let report = controller.activate().await?;
    if let Some(previous) = slots.active.replace(controller) {
        previous.mark_redundant().await;
    }
    Ok(report)
}

async fn info(controller: &OfflineController) -> ControllerInfo {
    ControllerInfo {
        generation: controller.generation(),
        state: controller.state().await,
        static_partition: controller.config().static_partition(),
        dynamic_partition: controller.config().dynamic_partition(),
        created_at: controller.created_at().to_rfc3339(),
    }
}
