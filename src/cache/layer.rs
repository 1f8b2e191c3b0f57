//! Cache layer that orchestrates caching logic with network fetching.

use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::policy::ForceRefresh;
use super::storage::KeyValueStorage;
use super::store::EntryStore;
use super::traits::CacheResult;

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the data provider and the content source,
/// providing transparent caching with offline support. It never fails: a
/// fetch error yields the last-known-good data, or an empty collection.
pub struct CacheLayer<S: KeyValueStorage> {
  store: Arc<EntryStore<S>>,
  force_refresh: ForceRefresh,
}

impl<S: KeyValueStorage> CacheLayer<S> {
  /// Create a new cache layer over `store`.
  ///
  /// `force_refresh` is the once-per-session decision; when set, every fetch
  /// goes to the network regardless of entry freshness.
  pub fn new(store: EntryStore<S>, force_refresh: ForceRefresh) -> Self {
    Self {
      store: Arc::new(store),
      force_refresh,
    }
  }

  #[cfg(test)]
  pub fn store(&self) -> &EntryStore<S> {
    &self.store
  }

  pub fn force_refresh(&self) -> ForceRefresh {
    self.force_refresh
  }

  /// Data to show before any fetch has run.
  ///
  /// Empty when this session forces a refresh, so a hard reload never flashes
  /// stale content.
  pub fn initial<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
    if self.force_refresh.is_forced() {
      return Vec::new();
    }
    self.store.get(key).unwrap_or_default()
  }

  /// Fetch a collection with a cache-first strategy.
  ///
  /// 1. Check cache - if fresh and not forcing a refresh, return immediately
  /// 2. Otherwise fetch from network and update the cache
  /// 3. On network failure, return the cached data or an empty collection
  pub async fn fetch_with_cache<T, F, Fut>(
    &self,
    key: &str,
    fetcher: F,
    ttl: Duration,
  ) -> CacheResult<Vec<T>>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    let cached = match self.store.entry::<Vec<T>>(key) {
      Some(entry) if !self.force_refresh.is_forced() && !self.store.is_stale(key) => {
        debug!(resource = key, "Serving fresh cache entry");
        return CacheResult::from_cache(entry.data, entry.timestamp);
      }
      other => other,
    };

    match fetcher().await {
      Ok(data) => {
        self.store.set(key, &data, ttl);
        debug!(resource = key, count = data.len(), "Fetched from network");
        CacheResult::from_network(data)
      }
      Err(e) => {
        warn!(resource = key, error = %e, "Fetch failed");
        match cached {
          Some(entry) => CacheResult::offline(entry.data, entry.timestamp),
          None => CacheResult::unavailable(),
        }
      }
    }
  }
}

impl<S: KeyValueStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      force_refresh: self.force_refresh,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::MemoryStorage;
  use crate::cache::store::Namespace;
  use crate::cache::traits::{CacheSource, ManualClock};
  use color_eyre::eyre::eyre;
  use serde::Deserialize;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Item {
    title: String,
  }

  fn item(title: &str) -> Item {
    Item {
      title: title.to_string(),
    }
  }

  fn layer(force: ForceRefresh) -> (CacheLayer<MemoryStorage>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let store = EntryStore::new(MemoryStorage::new(), Namespace::default()).with_clock(clock.clone());
    (CacheLayer::new(store, force), clock)
  }

  const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);

  #[tokio::test]
  async fn test_fresh_entry_skips_fetcher() {
    let (layer, clock) = layer(ForceRefresh::no());
    let calls = AtomicUsize::new(0);

    let first = layer
      .fetch_with_cache(
        "projects",
        || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(vec![item("A")])
        },
        FIVE_MINUTES,
      )
      .await;
    assert_eq!(first.data, vec![item("A")]);
    assert_eq!(first.source, CacheSource::Network);

    clock.advance(Duration::from_secs(4 * 60));

    let second = layer
      .fetch_with_cache(
        "projects",
        || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(vec![item("B")])
        },
        FIVE_MINUTES,
      )
      .await;
    assert_eq!(second.data, vec![item("A")]);
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert!(second.cached_at.is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_expired_entry_refetches() {
    let (layer, clock) = layer(ForceRefresh::no());
    layer.store().set("projects", &vec![item("A")], FIVE_MINUTES);
    clock.advance(FIVE_MINUTES + Duration::from_millis(1));

    let result = layer
      .fetch_with_cache("projects", || async { Ok(vec![item("B")]) }, FIVE_MINUTES)
      .await;
    assert_eq!(result.data, vec![item("B")]);
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(layer.store().get::<Vec<Item>>("projects"), Some(vec![item("B")]));
  }

  #[tokio::test]
  async fn test_expired_entry_served_when_fetch_fails() {
    let (layer, clock) = layer(ForceRefresh::no());
    layer
      .store()
      .set("hero", &vec![item("Old")], Duration::from_secs(600));
    clock.advance(Duration::from_secs(601));

    let result = layer
      .fetch_with_cache::<Item, _, _>(
        "hero",
        || async { Err(eyre!("connection refused")) },
        Duration::from_secs(600),
      )
      .await;
    assert_eq!(result.data, vec![item("Old")]);
    assert_eq!(result.source, CacheSource::Offline);
  }

  #[tokio::test]
  async fn test_failure_without_cache_is_empty() {
    let (layer, _) = layer(ForceRefresh::no());

    let result = layer
      .fetch_with_cache::<Item, _, _>(
        "services",
        || async { Err(eyre!("500 Internal Server Error")) },
        Duration::from_secs(60),
      )
      .await;
    assert!(result.data.is_empty());
    assert_eq!(result.source, CacheSource::Unavailable);
    assert_eq!(layer.store().get::<Vec<Item>>("services"), None);
  }

  #[tokio::test]
  async fn test_forced_refresh_ignores_fresh_entry() {
    let (layer, _) = layer(ForceRefresh::yes());
    layer
      .store()
      .set("skills", &vec![item("cached")], Duration::from_secs(600));

    let result = layer
      .fetch_with_cache("skills", || async { Ok(vec![item("fresh")]) }, Duration::from_secs(600))
      .await;
    assert_eq!(result.data, vec![item("fresh")]);
    assert_eq!(result.source, CacheSource::Network);
  }

  #[tokio::test]
  async fn test_forced_refresh_still_falls_back() {
    let (layer, _) = layer(ForceRefresh::yes());
    layer
      .store()
      .set("skills", &vec![item("cached")], Duration::from_secs(600));

    let result = layer
      .fetch_with_cache::<Item, _, _>(
        "skills",
        || async { Err(eyre!("offline")) },
        Duration::from_secs(600),
      )
      .await;
    assert_eq!(result.data, vec![item("cached")]);
    assert_eq!(result.source, CacheSource::Offline);
  }

  #[test]
  fn test_initial_data_respects_force_refresh() {
    let (normal, _) = layer(ForceRefresh::no());
    normal
      .store()
      .set("about", &vec![item("cached")], Duration::from_secs(1));
    assert_eq!(normal.initial::<Item>("about"), vec![item("cached")]);
    assert!(normal.initial::<Item>("hero").is_empty());

    let (forced, _) = layer(ForceRefresh::yes());
    forced
      .store()
      .set("about", &vec![item("cached")], Duration::from_secs(1));
    assert!(forced.initial::<Item>("about").is_empty());
  }
}
