use crate::cache::KeyValueStorage;
use crate::config::Config;
use crate::content::ContentSource;
use crate::event::{Event, EventHandler};
use crate::loading::LoadingGate;
use crate::provider::{DataProvider, DataState};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// What fills the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Loading,
  Content,
}

/// Content sections, in page order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
  Hero,
  About,
  Experience,
  Services,
  Work,
  Contact,
}

impl Section {
  pub const ALL: [Section; 6] = [
    Section::Hero,
    Section::About,
    Section::Experience,
    Section::Services,
    Section::Work,
    Section::Contact,
  ];

  pub fn title(self) -> &'static str {
    match self {
      Section::Hero => "Home",
      Section::About => "About",
      Section::Experience => "Experience",
      Section::Services => "Services",
      Section::Work => "Work",
      Section::Contact => "Contact",
    }
  }

  pub fn index(self) -> usize {
    Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
  }

  pub fn next(self) -> Self {
    Self::ALL[(self.index() + 1) % Self::ALL.len()]
  }

  pub fn prev(self) -> Self {
    Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
  }
}

/// Main application state
pub struct App<S: KeyValueStorage, C: ContentSource> {
  /// Content collections and the staged loader
  provider: DataProvider<S, C>,

  /// Latest published provider state
  state: DataState,

  /// Application configuration
  config: Config,

  screen: Screen,
  section: Section,
  scroll: u16,

  /// Tick counter driving the loading animation
  ticks: u64,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl<S, C> App<S, C>
where
  S: KeyValueStorage + 'static,
  C: ContentSource,
{
  pub fn new(config: Config, provider: DataProvider<S, C>) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();
    let state = provider.snapshot();

    Self {
      provider,
      state,
      config,
      screen: Screen::Loading,
      section: Section::Hero,
      scroll: 0,
      ticks: 0,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(120));
    self.event_tx = events.sender();

    self.start_loading();

    // Main loop
    let result = async {
      while !self.should_quit {
        // Draw UI
        terminal.draw(|frame| ui::draw(frame, self))?;

        // Handle events
        if let Some(event) = events.next().await {
          self.handle_event(event);
        }
      }
      Ok::<_, color_eyre::Report>(())
    }
    .await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    self.provider.unmount();

    result
  }

  /// Start the priority phase behind the loading screen and schedule the
  /// reveal.
  fn start_loading(&self) {
    let started = tokio::time::Instant::now();

    // Forward provider state changes to the event loop
    let mut changes = self.provider.subscribe();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      while changes.changed().await.is_ok() {
        if tx.send(Event::DataChanged).is_err() {
          break;
        }
      }
    });

    let provider = self.provider.clone();
    tokio::spawn(async move { provider.prefetch_priority().await });

    let gate = LoadingGate::from_config(&self.config.loading);
    let state = self.provider.subscribe();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let reason = gate.wait(state, started).await;
      let _ = tx.send(Event::Reveal(reason));
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.ticks = self.ticks.wrapping_add(1),
      Event::DataChanged => self.state = self.provider.snapshot(),
      Event::Reveal(reason) => {
        info!(?reason, "Loading screen done");
        self.screen = Screen::Content;
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match (self.screen, key.code) {
      (_, KeyCode::Char('q')) => self.should_quit = true,
      (Screen::Loading, _) => {}

      (Screen::Content, KeyCode::Tab | KeyCode::Right | KeyCode::Char('l')) => {
        self.select(self.section.next())
      }
      (Screen::Content, KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h')) => {
        self.select(self.section.prev())
      }
      (Screen::Content, KeyCode::Down | KeyCode::Char('j')) => {
        self.scroll = self.scroll.saturating_add(1)
      }
      (Screen::Content, KeyCode::Up | KeyCode::Char('k')) => {
        self.scroll = self.scroll.saturating_sub(1)
      }
      (Screen::Content, KeyCode::Char('r')) => self.refresh(),
      _ => {}
    }
  }

  fn select(&mut self, section: Section) {
    self.section = section;
    self.scroll = 0;
  }

  fn refresh(&self) {
    let provider = self.provider.clone();
    tokio::spawn(async move { provider.refresh_all().await });
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn state(&self) -> &DataState {
    &self.state
  }

  pub fn screen(&self) -> Screen {
    self.screen
  }

  pub fn section(&self) -> Section {
    self.section
  }

  pub fn scroll(&self) -> u16 {
    self.scroll
  }

  pub fn ticks(&self) -> u64 {
    self.ticks
  }
}

/// Run the terminal UI until the user quits.
pub async fn run<S, C>(config: Config, provider: DataProvider<S, C>) -> Result<()>
where
  S: KeyValueStorage + 'static,
  C: ContentSource,
{
  let mut app = App::new(config, provider);
  app.run().await
}
