//! Record sources: the live UEX client and an offline snapshot.

pub mod cache;
pub mod memory;
pub mod uex;

pub use cache::{CacheKey, ResponseCache};
pub use memory::{InMemorySource, Query, Snapshot, SnapshotError};
pub use uex::{UexClient, UexClientError};
