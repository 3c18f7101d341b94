//! Core types and shared functionality for wird-offline.
//!
//! This crate provides:
//! - Partitioned response cache with SQLite backend
//! - Request/response values shared by the controller and its backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CacheStorage};
pub use config::{AppConfig, ConfigError, PrecacheMode};
pub use error::Error;
pub use http::{Destination, Request, Response, ResponseSource};
