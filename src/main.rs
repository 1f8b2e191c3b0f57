mod app;
mod cache;
mod config;
mod content;
mod event;
mod loading;
mod provider;
mod ui;

use cache::{
  CacheLayer, EntryStatus, EntryStore, ForceRefresh, KeyValueStorage, MemoryStorage, Namespace,
  NoopStorage, SessionMarker, SqliteStorage,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use config::{CacheConfig, Config};
use content::{ContactSubmission, HttpContentClient, LoadStage, ResourceKey};
use provider::{DataProvider, LoadPhase};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "A terminal portfolio viewer with an offline-first content cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/folio/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Log file for the terminal UI (default: $XDG_DATA_HOME/folio/folio.log)
  #[arg(long, global = true)]
  log_file: Option<PathBuf>,

  /// Serve fresh cache entries instead of refetching everything on start
  #[arg(long, global = true)]
  prefer_cache: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
  /// Browse the portfolio in the terminal (default)
  View,
  /// Load all content and print it as JSON
  Fetch {
    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
  },
  /// Inspect or clear the local content cache
  Cache {
    #[command(subcommand)]
    action: CacheAction,
  },
  /// Send a message through the contact form
  Contact {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    message: String,
  },
}

#[derive(Subcommand, Debug, Clone)]
enum CacheAction {
  /// Show presence, age and freshness of each cached resource
  Status,
  /// Remove every cached resource
  Clear,
  /// Remove one cached resource
  Remove {
    #[arg(value_enum)]
    resource: ResourceKey,
  },
}

type Provider = DataProvider<Arc<dyn KeyValueStorage>, HttpContentClient>;

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let command = args.command.clone().unwrap_or(Command::View);

  // The TUI owns the terminal, so its logs go to a file
  let _guard = init_logging(matches!(command, Command::View), args.log_file.as_deref())?;

  let config = Config::load(args.config.as_deref())?;

  match command {
    Command::View => {
      let provider = mount(&config, args.prefer_cache)?;
      app::run(config, provider).await
    }
    Command::Fetch { pretty } => fetch(mount(&config, args.prefer_cache)?, pretty).await,
    Command::Cache { action } => {
      let store = EntryStore::new(open_storage(&config.cache)?, Namespace::default());
      cache_command(&store, action);
      Ok(())
    }
    Command::Contact {
      name,
      email,
      subject,
      message,
    } => {
      let submission = ContactSubmission {
        name,
        email,
        subject,
        message,
      };
      send_contact(&config, &submission).await
    }
  }
}

/// Set up the tracing subscriber. Returns the guard that flushes the file
/// writer; it must live until exit.
fn init_logging(to_file: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio=info"));

  if !to_file {
    tracing_subscriber::registry()
      .with(filter)
      .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
      .try_init()
      .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;
    return Ok(None);
  }

  let path = match log_file {
    Some(p) => p.to_path_buf(),
    None => default_log_path()?,
  };
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .map_err(|e| eyre!("Failed to create log directory: {}", e))?;
  }
  let file = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(&path)
    .map_err(|e| eyre!("Failed to open log file {}: {}", path.display(), e))?;

  let (writer, guard) = tracing_appender::non_blocking(file);
  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(Some(guard))
}

fn default_log_path() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("folio").join("folio.log"))
}

/// Open the persistent cache, or a no-op store when caching is disabled.
fn open_storage(config: &CacheConfig) -> Result<Arc<dyn KeyValueStorage>> {
  if !config.enabled {
    info!("Cache disabled, content will not be persisted");
    return Ok(Arc::new(NoopStorage));
  }

  let storage = match &config.path {
    Some(path) => SqliteStorage::open_at(path)?,
    None => SqliteStorage::open()?,
  };
  Ok(Arc::new(storage))
}

/// Open the cache, decide on a forced refresh for this run, and mount the
/// provider.
fn mount(config: &Config, prefer_cache: bool) -> Result<Provider> {
  let force_refresh = if prefer_cache {
    ForceRefresh::no()
  } else {
    // A process run is one page load; its session scope starts empty
    let marker = SessionMarker::new(MemoryStorage::new());
    ForceRefresh::detect(&marker, Utc::now().timestamp_millis())
  };

  let store = EntryStore::new(open_storage(&config.cache)?, Namespace::default());
  let layer = CacheLayer::new(store, force_refresh);
  let client = HttpContentClient::new(&config.api)?;

  Ok(DataProvider::mount(layer, client, config.cache.ttl_ms.clone()))
}

/// Run both phases headless and print the final state.
async fn fetch(provider: Provider, pretty: bool) -> Result<()> {
  provider.prefetch_priority().await;

  let state = provider
    .subscribe()
    .wait_for(|s| s.phase == LoadPhase::FullyReady)
    .await
    .map_err(|_| eyre!("Content provider stopped before loading finished"))?
    .clone();
  provider.unmount();

  let json = if pretty {
    serde_json::to_string_pretty(&state)?
  } else {
    serde_json::to_string(&state)?
  };
  println!("{}", json);

  Ok(())
}

fn cache_command<S: KeyValueStorage>(store: &EntryStore<S>, action: CacheAction) {
  match action {
    CacheAction::Status => {
      let statuses = store.status(ResourceKey::ALL.iter().map(|k| k.as_str()));
      println!(
        "{:<14} {:<10} {:>8} {:>10} {:>10}  STATE",
        "RESOURCE", "STAGE", "PRESENT", "AGE", "TTL"
      );
      for (key, status) in ResourceKey::ALL.into_iter().zip(&statuses) {
        println!("{}", status_row(key.stage(), status));
      }
    }
    CacheAction::Clear => {
      store.clear_all();
      println!("Cleared all cached content.");
    }
    CacheAction::Remove { resource } => {
      store.remove(resource.as_str());
      println!("Removed cached {}.", resource);
    }
  }
}

fn status_row(stage: LoadStage, status: &EntryStatus) -> String {
  let stage = match stage {
    LoadStage::Priority => "priority",
    LoadStage::Secondary => "secondary",
  };
  let state = match (status.present, status.stale) {
    (false, _) => "missing",
    (true, true) => "stale",
    (true, false) => "fresh",
  };
  format!(
    "{:<14} {:<10} {:>8} {:>10} {:>10}  {}",
    status.key,
    stage,
    if status.present { "yes" } else { "no" },
    status.age_ms.map(format_ms).unwrap_or_else(|| "-".into()),
    status
      .ttl_ms
      .map(|t| format_ms(t as i64))
      .unwrap_or_else(|| "-".into()),
    state
  )
}

/// Compact human duration, e.g. "4m12s"
fn format_ms(ms: i64) -> String {
  let secs = ms.max(0) / 1000;
  match secs {
    s if s < 60 => format!("{}s", s),
    s if s < 3600 => format!("{}m{:02}s", s / 60, s % 60),
    s => format!("{}h{:02}m", s / 3600, (s % 3600) / 60),
  }
}

async fn send_contact(config: &Config, submission: &ContactSubmission) -> Result<()> {
  let client = HttpContentClient::new(&config.api)?;
  let response = client.submit_contact(submission).await?;

  if response.success {
    println!("Message sent. Thanks, {}!", submission.name.trim());
    Ok(())
  } else {
    Err(eyre!(
      "Contact form rejected the message: {}",
      response.error.as_deref().unwrap_or("unknown error")
    ))
  }
}
