//! Partitioned response cache backed by SQLite.
//!
//! This module provides the storage the offline controller serves from:
//!
//! - Named partitions (`static-v2`, `dynamic-v2`, ...) holding request/response entries
//! - Lookups scoped to one partition or across all of them in creation order
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod partitions;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use storage::CacheStorage;
