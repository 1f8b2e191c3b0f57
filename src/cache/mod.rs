//! Stale-while-revalidate content cache.
//!
//! This module provides a small, resource-keyed caching mechanism that:
//! - Stores versioned, timestamped, TTL-tagged entries in a key/value medium
//! - Wipes its whole namespace when the cache version changes
//! - Serves cached data immediately while it is fresh
//! - Falls back to stale data (or an empty collection) when the network fails
//! - Forces one revalidation of every resource per hard reload

mod layer;
mod policy;
mod storage;
mod store;
mod traits;

pub use layer::CacheLayer;
pub use policy::{ForceRefresh, SessionMarker};
pub use storage::{KeyValueStorage, MemoryStorage, NoopStorage, SqliteStorage};
pub use store::{EntryStatus, EntryStore, Namespace};

#[cfg(test)]
pub use storage::FailingStorage;
#[cfg(test)]
pub use traits::ManualClock;
