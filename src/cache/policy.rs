//! Staleness rules and once-per-session hard refresh detection.

use tracing::debug;

use super::storage::KeyValueStorage;

/// Session storage key holding the last claimed load timestamp.
pub const PAGE_LOAD_KEY: &str = "portfolio_page_load_ts";

/// An entry written at `timestamp` with lifetime `ttl_ms` is expired once
/// strictly more than `ttl_ms` has elapsed.
pub fn is_expired(now_ms: i64, timestamp: i64, ttl_ms: u64) -> bool {
  now_ms.saturating_sub(timestamp) > ttl_ms.min(i64::MAX as u64) as i64
}

/// Session-scoped marker recording which load last claimed the session.
pub struct SessionMarker<S: KeyValueStorage> {
  storage: S,
  key: String,
}

impl<S: KeyValueStorage> SessionMarker<S> {
  pub fn new(storage: S) -> Self {
    Self {
      storage,
      key: PAGE_LOAD_KEY.to_string(),
    }
  }

  /// Decide whether the load stamped `load_ts` must bypass cache freshness.
  ///
  /// The first call for a newer load claims the session and returns true;
  /// later calls with the same timestamp return false. Storage errors return
  /// true.
  pub fn should_force_refresh(&self, load_ts: i64) -> bool {
    let stored = match self.storage.get_item(&self.key) {
      Ok(stored) => stored,
      Err(e) => {
        debug!(error = %e, "Session marker unreadable, forcing refresh");
        return true;
      }
    };

    let claim = match stored.as_deref().map(str::parse::<i64>) {
      Some(Ok(stored)) => load_ts > stored,
      Some(Err(_)) | None => true,
    };

    if claim {
      if let Err(e) = self.storage.set_item(&self.key, &load_ts.to_string()) {
        debug!(error = %e, "Failed to write session marker");
      }
    }

    claim
  }

  /// Forget the marker so the next load is treated as a hard refresh.
  #[cfg(test)]
  pub fn clear(&self) {
    if let Err(e) = self.storage.remove_item(&self.key) {
      debug!(error = %e, "Failed to clear session marker");
    }
  }
}

/// Whether this session bypasses cache freshness.
///
/// Computed once at startup and passed to everything that needs it, so that a
/// hard reload forces each resource to revalidate exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForceRefresh(bool);

impl ForceRefresh {
  /// Consult the session marker for the load stamped `load_ts`.
  pub fn detect<S: KeyValueStorage>(marker: &SessionMarker<S>, load_ts: i64) -> Self {
    Self(marker.should_force_refresh(load_ts))
  }

  #[cfg(test)]
  pub const fn yes() -> Self {
    Self(true)
  }

  pub const fn no() -> Self {
    Self(false)
  }

  pub fn is_forced(self) -> bool {
    self.0
  }
}
