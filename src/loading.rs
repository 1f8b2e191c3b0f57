//! Timing of the loading screen reveal.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::LoadingConfig;
use crate::provider::DataState;

/// Why the loading screen went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealReason {
  /// Priority content arrived
  Prefetched,
  /// The ceiling elapsed first
  TimedOut,
}

/// Decides when the loading screen may reveal the content.
///
/// The screen stays up for at least `min_display` so the branded animation is
/// not cut short, and never longer than `max_wait` even if the priority phase
/// has not finished.
#[derive(Debug, Clone, Copy)]
pub struct LoadingGate {
  min_display: Duration,
  max_wait: Duration,
}

impl LoadingGate {
  pub fn new(min_display: Duration, max_wait: Duration) -> Self {
    Self {
      min_display,
      max_wait,
    }
  }

  pub fn from_config(config: &LoadingConfig) -> Self {
    Self::new(
      Duration::from_millis(config.min_display_ms),
      Duration::from_millis(config.max_wait_ms),
    )
  }

  /// Wait until the content may be revealed. `started` is when the loading
  /// screen first appeared.
  pub async fn wait(&self, mut state: watch::Receiver<DataState>, started: Instant) -> RevealReason {
    let deadline = started + self.max_wait;

    let prefetched = tokio::time::timeout_at(deadline, async {
      state.wait_for(|s| s.is_prefetched).await.is_ok()
    })
    .await;

    match prefetched {
      Ok(true) => {
        tokio::time::sleep_until(started + self.min_display).await;
        info!(elapsed_ms = started.elapsed().as_millis() as u64, "Revealing content");
        RevealReason::Prefetched
      }
      // The provider went away; nothing will ever arrive
      Ok(false) => {
        tokio::time::sleep_until(deadline).await;
        RevealReason::TimedOut
      }
      Err(_) => {
        warn!(
          max_wait_ms = self.max_wait.as_millis() as u64,
          "Priority content not ready, revealing anyway"
        );
        RevealReason::TimedOut
      }
    }
  }
}
