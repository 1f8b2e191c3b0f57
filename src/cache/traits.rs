//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};

/// Source of wall-clock time for entry timestamps and TTL checks.
pub trait Clock: Send + Sync {
  /// Milliseconds since the Unix epoch.
  fn now_ms(&self) -> i64;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_ms(&self) -> i64 {
    Utc::now().timestamp_millis()
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from a cache entry that is still fresh.
  pub fn from_cache(data: T, timestamp_ms: i64) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: DateTime::from_timestamp_millis(timestamp_ms),
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(data: T, timestamp_ms: i64) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: DateTime::from_timestamp_millis(timestamp_ms),
    }
  }
}

impl<T: Default> CacheResult<T> {
  /// Network failed and nothing was cached.
  pub fn unavailable() -> Self {
    Self {
      data: T::default(),
      source: CacheSource::Unavailable,
      cached_at: None,
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Offline mode - network unavailable, serving last-known-good data
  Offline,
  /// Network unavailable and no cached data; an empty collection was served
  Unavailable,
}

#[cfg(test)]
pub use self::testing::ManualClock;

#[cfg(test)]
mod testing {
  use super::Clock;
  use std::sync::atomic::{AtomicI64, Ordering};
  use std::time::Duration;

  /// Clock that only moves when told to.
  #[derive(Debug)]
  pub struct ManualClock {
    now: AtomicI64,
  }

  impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
      Self {
        now: AtomicI64::new(start_ms),
      }
    }

    pub fn advance(&self, by: Duration) {
      self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
  }

  impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
      self.now.load(Ordering::SeqCst)
    }
  }
}
