//! Client code for wird-offline.
//!
//! This crate provides the offline cache controller and the network tier it
//! fetches through, shared by the server binary.

pub mod controller;
pub mod fetch;

pub use controller::{
    ActivationReport, ControlMessage, ControlReply, ControllerConfig, FetchOutcome, InstallReport, LifecycleState,
    OfflineController, Registration, RegistrationStatus, Route,
};

pub use fetch::{FetchClient, FetchConfig, Network};
