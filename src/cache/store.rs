//! Versioned, TTL-tagged entry store over a key/value storage medium.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::policy::is_expired;
use super::storage::KeyValueStorage;
use super::traits::{Clock, SystemClock};

/// Bump when the serialized shape of any cached collection changes.
pub const CACHE_VERSION: &str = "1.1";

/// A single cached value with its write time and lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
  pub data: T,
  /// Write time, milliseconds since the epoch
  pub timestamp: i64,
  /// Lifetime in milliseconds
  pub ttl: u64,
}

impl<T> CacheEntry<T> {
  pub fn is_expired(&self, now_ms: i64) -> bool {
    is_expired(now_ms, self.timestamp, self.ttl)
  }
}

/// Where the store keeps its entries inside the shared storage medium.
#[derive(Debug, Clone)]
pub struct Namespace {
  /// Prefix for every entry key
  pub prefix: String,
  /// Key holding the cache version string
  pub version_key: String,
  /// Version the running code expects
  pub version: String,
}

impl Default for Namespace {
  fn default() -> Self {
    Self {
      prefix: "portfolio_cache_".to_string(),
      version_key: "portfolio_cache_version".to_string(),
      version: CACHE_VERSION.to_string(),
    }
  }
}

impl Namespace {
  /// Namespace with a custom prefix; the version key follows the prefix.
  #[cfg(test)]
  pub fn with_prefix(prefix: &str) -> Self {
    Self {
      prefix: prefix.to_string(),
      version_key: format!("{}version", prefix),
      version: CACHE_VERSION.to_string(),
    }
  }

  fn entry_key(&self, key: &str) -> String {
    format!("{}{}", self.prefix, key)
  }
}

/// Freshness summary of one entry, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
  pub key: String,
  pub present: bool,
  /// Milliseconds since the entry was written
  pub age_ms: Option<i64>,
  pub ttl_ms: Option<u64>,
  pub stale: bool,
}

/// Persistent entry store.
///
/// Reads are stale-while-revalidate: `get` hands back whatever is stored and
/// leaves the freshness decision to the caller. No method returns an error;
/// every storage failure degrades to a cache miss or a skipped write.
pub struct EntryStore<S: KeyValueStorage> {
  storage: S,
  namespace: Namespace,
  clock: Arc<dyn Clock>,
}

impl<S: KeyValueStorage> EntryStore<S> {
  /// Create a store over `storage` using the system clock.
  pub fn new(storage: S, namespace: Namespace) -> Self {
    Self {
      storage,
      namespace,
      clock: Arc::new(SystemClock),
    }
  }

  /// Replace the clock used for timestamps and expiry checks.
  #[cfg(test)]
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Read the stored value for `key`, regardless of staleness.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    self.entry(key).map(|entry| entry.data)
  }

  /// Read the full entry for `key`, regardless of staleness.
  ///
  /// Returns `None` when the entry is missing or corrupt. A version mismatch
  /// wipes the whole namespace before returning `None`.
  pub fn entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
    let version = match self.storage.get_item(&self.namespace.version_key) {
      Ok(version) => version,
      Err(e) => {
        debug!(key, error = %e, "Cache version unreadable, treating as miss");
        return None;
      }
    };

    match version.as_deref() {
      Some(found) if found == self.namespace.version => {}
      Some(found) => {
        info!(
          found,
          expected = %self.namespace.version,
          "Cache version changed, discarding all entries"
        );
        self.clear_all();
        return None;
      }
      // Nothing stamped yet: a new or disabled medium
      None => {
        debug!(key, "Cache version missing, resetting namespace");
        self.clear_all();
        return None;
      }
    }

    let raw = match self.storage.get_item(&self.namespace.entry_key(key)) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        debug!(key, error = %e, "Cache read failed, treating as miss");
        return None;
      }
    };

    match serde_json::from_str(&raw) {
      Ok(entry) => Some(entry),
      Err(e) => {
        debug!(key, error = %e, "Corrupt cache entry, treating as miss");
        None
      }
    }
  }

  /// Whether `key` is missing or past its TTL.
  pub fn is_stale(&self, key: &str) -> bool {
    match self.raw_entry(key) {
      Some(entry) => entry.is_expired(self.clock.now_ms()),
      None => true,
    }
  }

  /// Write `value` under `key` with a fresh timestamp.
  ///
  /// Persistence is best-effort: a full or disabled medium skips the write.
  pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
    let entry = CacheEntry {
      data: value,
      timestamp: self.clock.now_ms(),
      ttl: ttl.as_millis() as u64,
    };

    let raw = match serde_json::to_string(&entry) {
      Ok(raw) => raw,
      Err(e) => {
        debug!(key, error = %e, "Failed to serialize cache entry");
        return;
      }
    };

    let result = self
      .storage
      .set_item(&self.namespace.version_key, &self.namespace.version)
      .and_then(|_| self.storage.set_item(&self.namespace.entry_key(key), &raw));

    if let Err(e) = result {
      debug!(key, error = %e, "Cache write skipped");
    }
  }

  /// Evict a single entry.
  pub fn remove(&self, key: &str) {
    if let Err(e) = self.storage.remove_item(&self.namespace.entry_key(key)) {
      debug!(key, error = %e, "Cache remove failed");
    }
  }

  /// Evict every entry under this store's prefix and re-stamp the version.
  ///
  /// Keys outside the prefix are left alone.
  pub fn clear_all(&self) {
    match self.storage.keys() {
      Ok(keys) => {
        for key in keys
          .iter()
          .filter(|k| k.starts_with(&self.namespace.prefix))
        {
          if let Err(e) = self.storage.remove_item(key) {
            debug!(key = %key, error = %e, "Cache remove failed");
          }
        }
      }
      Err(e) => debug!(error = %e, "Failed to list cache keys"),
    }

    if let Err(e) = self
      .storage
      .set_item(&self.namespace.version_key, &self.namespace.version)
    {
      debug!(error = %e, "Failed to stamp cache version");
    }
  }

  /// Report presence, age and freshness for each of `keys`.
  pub fn status<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Vec<EntryStatus> {
    let now = self.clock.now_ms();

    keys
      .into_iter()
      .map(|key| match self.raw_entry(key) {
        Some(entry) => EntryStatus {
          key: key.to_string(),
          present: true,
          age_ms: Some(now - entry.timestamp),
          ttl_ms: Some(entry.ttl),
          stale: entry.is_expired(now),
        },
        None => EntryStatus {
          key: key.to_string(),
          present: false,
          age_ms: None,
          ttl_ms: None,
          stale: true,
        },
      })
      .collect()
  }

  /// Entry metadata without the version check, for freshness decisions.
  fn raw_entry(&self, key: &str) -> Option<CacheEntry<serde::de::IgnoredAny>> {
    let raw = self
      .storage
      .get_item(&self.namespace.entry_key(key))
      .ok()
      .flatten()?;
    serde_json::from_str(&raw).ok()
  }
}
