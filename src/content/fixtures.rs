//! In-memory content source for tests.

use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use super::{ContentItem, ContentSource, ResourceKey};

/// Serves canned JSON documents per collection and counts calls.
#[derive(Default)]
pub struct StaticSource {
  responses: Mutex<HashMap<ResourceKey, Value>>,
  failing: Mutex<HashSet<ResourceKey>>,
  calls: Mutex<HashMap<ResourceKey, usize>>,
  delay: Mutex<Duration>,
}

impl StaticSource {
  pub fn new() -> Self {
    Self::default()
  }

  /// Serve `documents` (a JSON array) for `key`.
  pub fn with(self, key: ResourceKey, documents: Value) -> Self {
    self.set(key, documents);
    self
  }

  /// Delay every response by `delay`.
  pub fn with_delay(self, delay: Duration) -> Self {
    self.set_delay(delay);
    self
  }

  /// Change the delay for fetches started from now on.
  pub fn set_delay(&self, delay: Duration) {
    *self.delay.lock().unwrap() = delay;
  }

  pub fn set(&self, key: ResourceKey, documents: Value) {
    self.responses.lock().unwrap().insert(key, documents);
  }

  /// Make every fetch of `key` fail.
  pub fn fail(&self, key: ResourceKey) {
    self.failing.lock().unwrap().insert(key);
  }

  /// How many times `key` was fetched.
  pub fn calls(&self, key: ResourceKey) -> usize {
    self.calls.lock().unwrap().get(&key).copied().unwrap_or(0)
  }

  fn respond<T: ContentItem>(&self, key: ResourceKey) -> Result<Vec<T>> {
    *self.calls.lock().unwrap().entry(key).or_default() += 1;

    if self.failing.lock().unwrap().contains(&key) {
      return Err(eyre!("{} unavailable", key));
    }

    let documents = self
      .responses
      .lock()
      .unwrap()
      .get(&key)
      .cloned()
      .unwrap_or_else(|| Value::Array(Vec::new()));
    serde_json::from_value(documents).map_err(|e| eyre!("Bad fixture for {}: {}", key, e))
  }
}

impl ContentSource for StaticSource {
  fn fetch_collection<T: ContentItem>(&self) -> impl Future<Output = Result<Vec<T>>> + Send {
    let outcome = self.respond::<T>(T::resource());
    let delay = *self.delay.lock().unwrap();

    async move {
      if !delay.is_zero() {
        tokio::time::sleep(delay).await;
      }
      outcome
    }
  }
}
