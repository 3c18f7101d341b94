//! MCP tool implementations.
//!
//! Each tool drives one operation of the offline cache controller.

pub mod fetch;
pub mod message;
pub mod status;
pub mod update;

pub use fetch::SwFetchParams;
pub use message::SwMessageParams;
pub use update::SwUpdateParams;
