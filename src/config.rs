use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::content::ResourceKey;

/// Environment variable overriding `api.base_url`.
pub const API_BASE_URL_ENV: &str = "FOLIO_API_BASE_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Title shown on the loading screen and in the header
  pub title: Option<String>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub loading: LoadingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL the `get-content` and `submit-contact` functions live under
  pub base_url: String,
  /// Per-request timeout of the HTTP client
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  15
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Disable to always go to the network (nothing is persisted)
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Database location (defaults to $XDG_DATA_HOME/folio/cache.db)
  pub path: Option<PathBuf>,
  /// Per-resource TTL overrides in milliseconds
  #[serde(default)]
  pub ttl_ms: TtlConfig,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
      ttl_ms: TtlConfig::default(),
    }
  }
}

fn default_true() -> bool {
  true
}

/// TTL overrides; unset resources use their built-in TTL class.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TtlConfig {
  pub hero: Option<u64>,
  pub about: Option<u64>,
  pub skills: Option<u64>,
  pub projects: Option<u64>,
  pub experience: Option<u64>,
  pub services: Option<u64>,
  pub social_links: Option<u64>,
}

impl TtlConfig {
  /// Effective TTL for `key`.
  pub fn ttl_for(&self, key: ResourceKey) -> Duration {
    let configured = match key {
      ResourceKey::Hero => self.hero,
      ResourceKey::About => self.about,
      ResourceKey::Skills => self.skills,
      ResourceKey::Projects => self.projects,
      ResourceKey::Experience => self.experience,
      ResourceKey::Services => self.services,
      ResourceKey::SocialLinks => self.social_links,
    };

    configured
      .map(Duration::from_millis)
      .unwrap_or_else(|| key.default_ttl())
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadingConfig {
  /// Shortest time the loading screen stays up
  #[serde(default = "default_min_display_ms")]
  pub min_display_ms: u64,
  /// Longest time the loading screen waits for priority content
  #[serde(default = "default_max_wait_ms")]
  pub max_wait_ms: u64,
}

impl Default for LoadingConfig {
  fn default() -> Self {
    Self {
      min_display_ms: default_min_display_ms(),
      max_wait_ms: default_max_wait_ms(),
    }
  }
}

fn default_min_display_ms() -> u64 {
  1500
}

fn default_max_wait_ms() -> u64 {
  8000
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./folio.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/folio/config.yaml
  ///
  /// Without a file, defaults are used and the API base URL must come from
  /// FOLIO_API_BASE_URL. The variable also overrides a configured URL.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let env_base_url = std::env::var(API_BASE_URL_ENV).ok();

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => match &env_base_url {
        Some(base_url) => Self::with_base_url(base_url),
        None => {
          return Err(eyre!(
            "No configuration file found. Create one at ~/.config/folio/config.yaml\n\
             or set {} to the content API base URL.",
            API_BASE_URL_ENV
          ))
        }
      },
    };

    if let Some(base_url) = env_base_url {
      config.api.base_url = base_url;
    }

    config.validate()?;
    Ok(config)
  }

  /// Default configuration pointing at `base_url`.
  pub fn with_base_url(base_url: &str) -> Self {
    Self {
      api: ApiConfig {
        base_url: base_url.to_string(),
        timeout_secs: default_timeout_secs(),
      },
      title: None,
      cache: CacheConfig::default(),
      loading: LoadingConfig::default(),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("folio.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("folio").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  fn validate(&self) -> Result<()> {
    if self.api.base_url.trim().is_empty() {
      return Err(eyre!("api.base_url must not be empty"));
    }
    if self.loading.min_display_ms > self.loading.max_wait_ms {
      return Err(eyre!(
        "loading.min_display_ms ({}) exceeds loading.max_wait_ms ({})",
        self.loading.min_display_ms,
        self.loading.max_wait_ms
      ));
    }
    Ok(())
  }

  /// Title for the loading screen and header.
  pub fn display_title(&self) -> &str {
    self.title.as_deref().unwrap_or("Portfolio")
  }
}
