//! Staged content loading.
//!
//! The provider owns the in-memory copy of every content collection and moves
//! through a fixed sequence of phases:
//!
//! ```text
//! Init -> PriorityLoading -> PriorityReady -> SecondaryLoading -> FullyReady
//! ```
//!
//! The loading screen starts the priority phase. When the priority commit
//! flips `is_prefetched` for the first time, a `PhaseEvent` goes to a driver
//! task, which runs the secondary phase exactly once. `refresh_all` is the only
//! way back to `PriorityLoading`, and it supersedes any phase still in flight.
//!
//! Consumers observe state through a `watch` channel and read collections
//! through the views on `DataState`.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheLayer, KeyValueStorage};
use crate::config::TtlConfig;
use crate::content::{
  AboutContent, ContentItem, ContentSource, Experience, HeroContent, Project, Service, Skill,
  SocialLink,
};

/// Where the provider is in its loading sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
  Init,
  PriorityLoading,
  PriorityReady,
  SecondaryLoading,
  FullyReady,
}

/// Everything the UI renders from.
#[derive(Debug, Clone, Serialize)]
pub struct DataState {
  pub hero: Vec<HeroContent>,
  pub about: Vec<AboutContent>,
  pub skills: Vec<Skill>,
  pub projects: Vec<Project>,
  pub experience: Vec<Experience>,
  pub services: Vec<Service>,
  pub social_links: Vec<SocialLink>,
  pub is_loading: bool,
  pub is_prefetched: bool,
  pub phase: LoadPhase,
}

impl DataState {
  /// Initial state, seeded from whatever the cache holds.
  fn seeded<S: KeyValueStorage>(layer: &CacheLayer<S>) -> Self {
    Self {
      hero: initial(layer),
      about: initial(layer),
      skills: initial(layer),
      projects: initial(layer),
      experience: initial(layer),
      services: initial(layer),
      social_links: initial(layer),
      is_loading: true,
      is_prefetched: false,
      phase: LoadPhase::Init,
    }
  }

  /// Move to `to` only when currently in `from`.
  fn advance(&mut self, from: LoadPhase, to: LoadPhase) {
    if self.phase == from {
      self.phase = to;
    }
  }

  fn priority<'a, T>(&self, data: &'a [T]) -> PriorityView<'a, T> {
    PriorityView {
      data,
      is_loading: self.is_loading,
    }
  }

  pub fn hero(&self) -> PriorityView<'_, HeroContent> {
    self.priority(&self.hero)
  }

  pub fn about(&self) -> PriorityView<'_, AboutContent> {
    self.priority(&self.about)
  }

  pub fn skills(&self) -> PriorityView<'_, Skill> {
    self.priority(&self.skills)
  }

  pub fn projects(&self) -> SecondaryView<'_, Project> {
    SecondaryView { data: &self.projects }
  }

  pub fn experience(&self) -> SecondaryView<'_, Experience> {
    SecondaryView {
      data: &self.experience,
    }
  }

  pub fn services(&self) -> SecondaryView<'_, Service> {
    SecondaryView { data: &self.services }
  }

  pub fn social_links(&self) -> SecondaryView<'_, SocialLink> {
    SecondaryView {
      data: &self.social_links,
    }
  }
}

fn initial<T: ContentItem, S: KeyValueStorage>(layer: &CacheLayer<S>) -> Vec<T> {
  layer.initial(T::resource().as_str())
}

/// A priority collection together with the global loading flag.
#[derive(Debug, PartialEq)]
pub struct PriorityView<'a, T> {
  pub data: &'a [T],
  pub is_loading: bool,
}

/// A secondary collection; never blocks rendering.
#[derive(Debug, PartialEq)]
pub struct SecondaryView<'a, T> {
  pub data: &'a [T],
}

/// Phase completion notifications consumed by the driver task.
#[derive(Debug)]
enum PhaseEvent {
  /// Priority data was committed; `first` when `is_prefetched` just flipped
  PriorityCommitted { first: bool },
}

struct Shared<S: KeyValueStorage, C: ContentSource> {
  layer: CacheLayer<S>,
  source: C,
  ttls: TtlConfig,
  state: watch::Sender<DataState>,
  events: mpsc::UnboundedSender<PhaseEvent>,
  alive: AtomicBool,
  /// Bumped by `refresh_all`; phases started under an older value are dropped
  generation: AtomicU64,
  driver: Mutex<Option<JoinHandle<()>>>,
}

impl<S, C> Shared<S, C>
where
  S: KeyValueStorage + 'static,
  C: ContentSource,
{
  async fn load<T: ContentItem>(&self) -> Vec<T> {
    let key = T::resource();
    let result = self
      .layer
      .fetch_with_cache(
        key.as_str(),
        || self.source.fetch_collection::<T>(),
        self.ttls.ttl_for(key),
      )
      .await;

    debug!(
      resource = %key,
      source = ?result.source,
      cached_at = ?result.cached_at,
      count = result.data.len(),
      "Collection loaded"
    );
    result.data
  }

  /// Apply `update` to the published state unless the provider is unmounted.
  fn commit(&self, update: impl FnOnce(&mut DataState)) -> bool {
    if !self.alive.load(Ordering::SeqCst) {
      debug!("Provider unmounted, dropping state update");
      return false;
    }
    self.state.send_modify(update);
    true
  }

  /// Like `commit`, but only while no refresh has started since `generation`.
  fn commit_results(&self, generation: u64, update: impl FnOnce(&mut DataState)) -> bool {
    if self.generation.load(Ordering::SeqCst) != generation {
      debug!(generation, "Superseded by a refresh, dropping results");
      return false;
    }
    self.commit(update)
  }

  async fn prefetch_priority(&self) {
    let generation = self.generation.load(Ordering::SeqCst);
    self.commit(|state| state.advance(LoadPhase::Init, LoadPhase::PriorityLoading));

    let (hero, about, skills) = futures::join!(
      self.load::<HeroContent>(),
      self.load::<AboutContent>(),
      self.load::<Skill>(),
    );

    let mut first = false;
    let committed = self.commit_results(generation, |state| {
      state.hero = hero;
      state.about = about;
      state.skills = skills;
      state.is_loading = false;
      first = !state.is_prefetched;
      state.is_prefetched = true;
      state.advance(LoadPhase::PriorityLoading, LoadPhase::PriorityReady);
    });

    if committed {
      info!(first, "Priority content ready");
      let _ = self.events.send(PhaseEvent::PriorityCommitted { first });
    }
  }

  async fn fetch_secondary(&self) {
    let generation = self.generation.load(Ordering::SeqCst);
    self.commit(|state| state.advance(LoadPhase::PriorityReady, LoadPhase::SecondaryLoading));

    let (projects, experience, services, social_links) = futures::join!(
      self.load::<Project>(),
      self.load::<Experience>(),
      self.load::<Service>(),
      self.load::<SocialLink>(),
    );

    if self.commit_results(generation, |state| {
      state.projects = projects;
      state.experience = experience;
      state.services = services;
      state.social_links = social_links;
      state.advance(LoadPhase::SecondaryLoading, LoadPhase::FullyReady);
    }) {
      info!("Secondary content ready");
    }
  }
}

/// Runs the secondary phase after the first priority commit.
async fn drive<S, C>(shared: Weak<Shared<S, C>>, mut events: mpsc::UnboundedReceiver<PhaseEvent>)
where
  S: KeyValueStorage + 'static,
  C: ContentSource,
{
  let mut secondary_started = false;

  while let Some(event) = events.recv().await {
    match event {
      PhaseEvent::PriorityCommitted { first } => {
        if !first || secondary_started {
          continue;
        }
        secondary_started = true;

        let Some(shared) = shared.upgrade() else {
          break;
        };
        DataProvider { shared }.fetch_secondary().await;
      }
    }
  }
}

/// Holds all content collections and runs the staged fetches.
pub struct DataProvider<S: KeyValueStorage, C: ContentSource> {
  shared: Arc<Shared<S, C>>,
}

impl<S, C> DataProvider<S, C>
where
  S: KeyValueStorage + 'static,
  C: ContentSource,
{
  /// Create the provider and start its phase driver.
  ///
  /// State is seeded synchronously from the cache before any network
  /// activity. Must be called from within a Tokio runtime.
  pub fn mount(layer: CacheLayer<S>, source: C, ttls: TtlConfig) -> Self {
    info!(
      forced = layer.force_refresh().is_forced(),
      "Mounting content provider"
    );
    let (state, _) = watch::channel(DataState::seeded(&layer));
    let (events, events_rx) = mpsc::unbounded_channel();

    let shared = Arc::new(Shared {
      layer,
      source,
      ttls,
      state,
      events,
      alive: AtomicBool::new(true),
      generation: AtomicU64::new(0),
      driver: Mutex::new(None),
    });

    let driver = tokio::spawn(drive(Arc::downgrade(&shared), events_rx));
    if let Ok(mut slot) = shared.driver.lock() {
      *slot = Some(driver);
    }

    Self { shared }
  }

  /// Fetch hero, about and skills concurrently, then mark priority content
  /// ready. The first completion also kicks off the secondary phase.
  pub async fn prefetch_priority(&self) {
    self.shared.prefetch_priority().await;
  }

  /// Fetch projects, experience, services and social links concurrently.
  pub async fn fetch_secondary(&self) {
    self.shared.fetch_secondary().await;
  }

  /// Re-run both phases in order. Results of phases started earlier and
  /// still in flight are discarded.
  pub async fn refresh_all(&self) {
    self.shared.generation.fetch_add(1, Ordering::SeqCst);
    self.shared.commit(|state| {
      state.is_loading = true;
      state.phase = LoadPhase::PriorityLoading;
    });
    self.shared.prefetch_priority().await;
    self.shared.fetch_secondary().await;
  }

  /// Stop publishing state. Fetches still in flight finish as no-ops.
  pub fn unmount(&self) {
    self.shared.alive.store(false, Ordering::SeqCst);
    if let Ok(mut slot) = self.shared.driver.lock() {
      if let Some(driver) = slot.take() {
        driver.abort();
      }
    }
  }

  pub fn subscribe(&self) -> watch::Receiver<DataState> {
    self.shared.state.subscribe()
  }

  pub fn snapshot(&self) -> DataState {
    self.shared.state.borrow().clone()
  }

  #[cfg(test)]
  pub fn layer(&self) -> &CacheLayer<S> {
    &self.shared.layer
  }
}

impl<S: KeyValueStorage, C: ContentSource> Clone for DataProvider<S, C> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{EntryStore, ForceRefresh, MemoryStorage, Namespace};
  use crate::content::fixtures::StaticSource;
  use crate::content::ResourceKey;
  use serde_json::json;
  use std::time::Duration;

  type TestProvider = DataProvider<Arc<MemoryStorage>, Arc<StaticSource>>;

  fn full_source() -> StaticSource {
    StaticSource::new()
      .with(ResourceKey::Hero, json!([{"$id": "h1", "title": "Hello"}]))
      .with(ResourceKey::About, json!([{"$id": "a1", "title": "About me"}]))
      .with(ResourceKey::Skills, json!([{"$id": "s1", "name": "Rust"}]))
      .with(ResourceKey::Projects, json!([{"$id": "p1", "title": "Atlas"}]))
      .with(ResourceKey::Experience, json!([{"$id": "e1", "role": "Engineer"}]))
      .with(ResourceKey::Services, json!([{"$id": "v1", "title": "Consulting"}]))
      .with(ResourceKey::SocialLinks, json!([{"$id": "l1", "platform": "github"}]))
  }

  fn mount(
    source: Arc<StaticSource>,
    storage: Arc<MemoryStorage>,
    force: ForceRefresh,
    ttls: TtlConfig,
  ) -> TestProvider {
    let store = EntryStore::new(storage, Namespace::default());
    DataProvider::mount(CacheLayer::new(store, force), source, ttls)
  }

  async fn wait_for_phase(provider: &TestProvider, phase: LoadPhase) {
    let mut rx = provider.subscribe();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.phase == phase))
      .await
      .expect("timed out waiting for phase")
      .expect("provider dropped");
  }

  /// Record every distinct `(phase, is_loading)` the provider publishes.
  fn record_transitions(provider: &TestProvider) -> Arc<Mutex<Vec<(LoadPhase, bool)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut rx = provider.subscribe();
    {
      let state = rx.borrow_and_update();
      seen.lock().unwrap().push((state.phase, state.is_loading));
    }

    let recorded = seen.clone();
    tokio::spawn(async move {
      while rx.changed().await.is_ok() {
        let current = {
          let state = rx.borrow_and_update();
          (state.phase, state.is_loading)
        };
        let mut recorded = recorded.lock().unwrap();
        if recorded.last() != Some(&current) {
          recorded.push(current);
        }
      }
    });
    seen
  }

  #[tokio::test]
  async fn test_initial_state_seeded_from_cache() {
    let storage = Arc::new(MemoryStorage::new());
    let warm = EntryStore::new(storage.clone(), Namespace::default());
    warm.set(
      "projects",
      &json!([{"$id": "p0", "title": "Cached"}]),
      Duration::from_secs(300),
    );

    let provider = mount(
      Arc::new(full_source()),
      storage,
      ForceRefresh::no(),
      TtlConfig::default(),
    );
    let state = provider.snapshot();
    assert_eq!(state.phase, LoadPhase::Init);
    assert!(state.is_loading);
    assert!(!state.is_prefetched);
    assert_eq!(state.projects.len(), 1);
    assert_eq!(state.projects[0].title, "Cached");
    assert!(state.hero.is_empty());
  }

  #[tokio::test]
  async fn test_hard_refresh_starts_empty() {
    let storage = Arc::new(MemoryStorage::new());
    let warm = EntryStore::new(storage.clone(), Namespace::default());
    warm.set(
      "hero",
      &json!([{"$id": "h0", "title": "Stale"}]),
      Duration::from_secs(600),
    );

    let provider = mount(
      Arc::new(full_source()),
      storage,
      ForceRefresh::yes(),
      TtlConfig::default(),
    );
    let state = provider.snapshot();
    assert!(state.hero().data.is_empty());
    assert!(state.hero().is_loading);
  }

  #[tokio::test]
  async fn test_priority_commit_triggers_secondary_once() {
    let source = Arc::new(full_source());
    let provider = mount(
      source.clone(),
      Arc::new(MemoryStorage::new()),
      ForceRefresh::yes(),
      TtlConfig::default(),
    );

    provider.prefetch_priority().await;

    let state = provider.snapshot();
    let hero = state.hero();
    assert!(!hero.is_loading);
    assert_eq!(hero.data[0].title, "Hello");
    assert_eq!(state.skills().data[0].name, "Rust");
    assert!(state.is_prefetched);

    wait_for_phase(&provider, LoadPhase::FullyReady).await;
    let state = provider.snapshot();
    assert_eq!(state.projects().data[0].title, "Atlas");
    assert_eq!(state.experience().data[0].role, "Engineer");
    assert_eq!(state.services().data[0].title, "Consulting");
    assert_eq!(state.social_links().data[0].platform, "github");
    assert_eq!(source.calls(ResourceKey::Projects), 1);

    // Later priority commits do not trigger another secondary phase
    provider.prefetch_priority().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls(ResourceKey::Hero), 2);
    assert_eq!(source.calls(ResourceKey::Projects), 1);
    assert_eq!(provider.snapshot().phase, LoadPhase::FullyReady);
  }

  #[tokio::test]
  async fn test_secondary_leaves_loading_flags_alone() {
    let provider = mount(
      Arc::new(full_source()),
      Arc::new(MemoryStorage::new()),
      ForceRefresh::no(),
      TtlConfig::default(),
    );

    provider.fetch_secondary().await;

    let state = provider.snapshot();
    assert!(state.is_loading);
    assert!(!state.is_prefetched);
    assert_eq!(state.projects.len(), 1);
    assert!(state.hero.is_empty());
  }

  #[tokio::test]
  async fn test_fetch_failures_still_complete_phases() {
    let storage = Arc::new(MemoryStorage::new());
    let warm = EntryStore::new(storage.clone(), Namespace::default());
    warm.set(
      "about",
      &json!([{"$id": "a0", "title": "Last known"}]),
      Duration::from_secs(600),
    );

    let source = Arc::new(full_source());
    source.fail(ResourceKey::About);
    source.fail(ResourceKey::Hero);
    source.fail(ResourceKey::Services);

    let provider = mount(source, storage, ForceRefresh::yes(), TtlConfig::default());
    provider.prefetch_priority().await;
    wait_for_phase(&provider, LoadPhase::FullyReady).await;

    let state = provider.snapshot();
    assert!(state.is_prefetched);
    assert!(state.hero.is_empty());
    assert_eq!(state.about[0].title, "Last known");
    assert_eq!(state.skills.len(), 1);
    assert!(state.services.is_empty());
    assert_eq!(state.projects.len(), 1);
  }

  #[tokio::test]
  async fn test_fresh_cache_avoids_network() {
    let storage = Arc::new(MemoryStorage::new());
    let source = Arc::new(full_source());

    let first = mount(
      source.clone(),
      storage.clone(),
      ForceRefresh::yes(),
      TtlConfig::default(),
    );
    first.prefetch_priority().await;
    wait_for_phase(&first, LoadPhase::FullyReady).await;
    first.unmount();

    // Same session, no forced refresh: everything is still fresh
    let second = mount(source.clone(), storage, ForceRefresh::no(), TtlConfig::default());
    assert_eq!(second.snapshot().hero().data[0].title, "Hello");
    second.prefetch_priority().await;
    wait_for_phase(&second, LoadPhase::FullyReady).await;

    for key in ResourceKey::ALL {
      assert_eq!(source.calls(key), 1, "{} fetched again", key);
    }
  }

  #[tokio::test]
  async fn test_refresh_all_reenters_loading() {
    let source = Arc::new(full_source().with_delay(Duration::from_millis(50)));
    let provider = mount(
      source.clone(),
      Arc::new(MemoryStorage::new()),
      ForceRefresh::yes(),
      TtlConfig::default(),
    );
    provider.prefetch_priority().await;
    wait_for_phase(&provider, LoadPhase::FullyReady).await;
    assert!(!provider.snapshot().is_loading);

    source.set(ResourceKey::Hero, json!([{"$id": "h2", "title": "Updated"}]));

    let mut rx = provider.subscribe();
    let refreshing = provider.clone();
    let refresh = tokio::spawn(async move { refreshing.refresh_all().await });

    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.is_loading))
      .await
      .expect("refresh never set is_loading")
      .expect("provider dropped");

    refresh.await.unwrap();
    let state = provider.snapshot();
    assert!(!state.is_loading);
    assert_eq!(state.phase, LoadPhase::FullyReady);
    assert_eq!(state.hero[0].title, "Updated");
    assert_eq!(source.calls(ResourceKey::Hero), 2);
    assert_eq!(source.calls(ResourceKey::Projects), 2);
  }

  #[tokio::test]
  async fn test_phase_sequence() {
    let source = Arc::new(full_source().with_delay(Duration::from_millis(30)));
    let provider = mount(
      source,
      Arc::new(MemoryStorage::new()),
      ForceRefresh::yes(),
      TtlConfig::default(),
    );
    let seen = record_transitions(&provider);

    provider.prefetch_priority().await;
    wait_for_phase(&provider, LoadPhase::FullyReady).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(
      *seen.lock().unwrap(),
      vec![
        (LoadPhase::Init, true),
        (LoadPhase::PriorityLoading, true),
        (LoadPhase::PriorityReady, false),
        (LoadPhase::SecondaryLoading, false),
        (LoadPhase::FullyReady, false),
      ]
    );

    let before_refresh = seen.lock().unwrap().len();
    provider.refresh_all().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let seen = seen.lock().unwrap();
    let refresh = &seen[before_refresh..];
    assert_eq!(refresh.first(), Some(&(LoadPhase::PriorityLoading, true)));
    assert_eq!(refresh.last(), Some(&(LoadPhase::FullyReady, false)));
    assert!(refresh.windows(2).all(|w| w[0].0 <= w[1].0));
  }

  #[tokio::test]
  async fn test_refresh_supersedes_older_secondary() {
    let source = Arc::new(full_source());
    let provider = mount(
      source.clone(),
      Arc::new(MemoryStorage::new()),
      ForceRefresh::yes(),
      TtlConfig::default(),
    );
    provider.prefetch_priority().await;
    wait_for_phase(&provider, LoadPhase::FullyReady).await;

    // A slow secondary fetch picks up the old projects
    source.set(ResourceKey::Projects, json!([{"$id": "p1", "title": "Old"}]));
    source.set_delay(Duration::from_millis(200));
    let slow = provider.clone();
    let slow = tokio::spawn(async move { slow.fetch_secondary().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // A refresh starts later and finishes first
    source.set(ResourceKey::Projects, json!([{"$id": "p1", "title": "New"}]));
    source.set_delay(Duration::from_millis(10));
    provider.refresh_all().await;
    assert_eq!(provider.snapshot().projects[0].title, "New");

    slow.await.unwrap();
    let state = provider.snapshot();
    assert_eq!(state.projects().data[0].title, "New");
    assert_eq!(state.phase, LoadPhase::FullyReady);
    assert!(!state.is_loading);
  }

  #[tokio::test]
  async fn test_updates_after_unmount_are_dropped() {
    let source = Arc::new(full_source().with_delay(Duration::from_millis(30)));
    let provider = mount(
      source,
      Arc::new(MemoryStorage::new()),
      ForceRefresh::yes(),
      TtlConfig::default(),
    );

    let loading = provider.clone();
    let prefetch = tokio::spawn(async move { loading.prefetch_priority().await });
    tokio::time::sleep(Duration::from_millis(5)).await;
    provider.unmount();
    prefetch.await.unwrap();

    let state = provider.snapshot();
    assert!(!state.is_prefetched);
    assert!(state.hero.is_empty());
  }

  #[tokio::test]
  async fn test_configured_ttls_are_written() {
    let storage = Arc::new(MemoryStorage::new());
    let ttls = TtlConfig {
      projects: Some(1_234),
      ..TtlConfig::default()
    };
    let provider = mount(
      Arc::new(full_source()),
      storage,
      ForceRefresh::yes(),
      ttls,
    );
    provider.prefetch_priority().await;
    wait_for_phase(&provider, LoadPhase::FullyReady).await;

    let status = provider.layer().store().status(["projects", "hero"]);
    assert_eq!(status[0].ttl_ms, Some(1_234));
    assert_eq!(status[1].ttl_ms, Some(600_000));
  }
}
