//! Storage seam between the offline controller and its backing cache.
//!
//! The controller only ever talks to `dyn CacheStorage`, so tests can swap in a
//! failing or instrumented store without touching SQLite.

use async_trait::async_trait;

use crate::Error;
use crate::http::{Request, Response};

/// A set of named partitions holding request/response entries.
///
/// Semantics follow the browser Cache Storage API: `put` creates its partition
/// on demand, `match_any` searches every partition in creation order, and
/// deleting a partition drops all of its entries.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the partition if it does not exist.
    async fn open(&self, partition: &str) -> Result<(), Error>;

    /// Whether a partition with this name exists.
    async fn has(&self, partition: &str) -> Result<bool, Error>;

    /// Names of all partitions, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a partition and its entries. Returns false if it did not exist.
    async fn delete(&self, partition: &str) -> Result<bool, Error>;

    /// Store a response for a request, replacing any previous entry for the same key.
    async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store several entries in one transaction: either all are written or none are.
    async fn put_batch(&self, partition: &str, entries: &[(Request, Response)]) -> Result<(), Error>;

    /// Look up a request in one partition.
    async fn match_in(&self, partition: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Look up a request across all partitions, oldest partition first.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// URLs stored in a partition.
    async fn entry_urls(&self, partition: &str) -> Result<Vec<String>, Error>;

    /// Total body bytes stored in a partition.
    async fn partition_size(&self, partition: &str) -> Result<u64, Error>;
}
