mod loading;
mod renderfns;
mod sections;

use crate::app::{App, Screen};
use crate::cache::KeyValueStorage;
use crate::content::ContentSource;
use crate::provider::LoadPhase;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use renderfns::utils::{CHARCOAL, OLIVE, TERRACOTTA};

/// Main draw function
pub fn draw<S: KeyValueStorage + 'static, C: ContentSource>(frame: &mut Frame, app: &App<S, C>) {
  let config = app.config();

  if app.screen() == Screen::Loading {
    loading::draw_loading(
      frame,
      frame.area(),
      config.display_title(),
      app.state(),
      app.ticks(),
    );
    return;
  }

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Section content
      Constraint::Length(1), // Section tabs
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  renderfns::draw_header(frame, chunks[0], config.display_title(), &config.api.base_url);
  draw_section(frame, chunks[1], app);
  renderfns::draw_footer(frame, chunks[2], app.section());
  draw_status_bar(frame, chunks[3], app.state().phase);
}

fn draw_section<S, C>(frame: &mut Frame, area: Rect, app: &App<S, C>)
where
  S: KeyValueStorage + 'static,
  C: ContentSource,
{
  let section = app.section();

  let block = Block::default()
    .title(format!(" {} ", section.title()))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(TERRACOTTA))
    .style(Style::default().bg(CHARCOAL));

  let paragraph = Paragraph::new(sections::lines(section, app.state()))
    .block(block)
    .wrap(Wrap { trim: true })
    .scroll((app.scroll(), 0));
  frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, phase: LoadPhase) {
  let color = match phase {
    LoadPhase::FullyReady => OLIVE,
    _ => Color::DarkGray,
  };

  let paragraph =
    Paragraph::new(format!(" {}", phase_label(phase))).style(Style::default().fg(color));
  frame.render_widget(paragraph, area);
}

/// Human readable loading phase
pub(crate) fn phase_label(phase: LoadPhase) -> &'static str {
  match phase {
    LoadPhase::Init => "Starting",
    LoadPhase::PriorityLoading => "Loading highlights",
    LoadPhase::PriorityReady => "Highlights ready",
    LoadPhase::SecondaryLoading => "Loading the rest",
    LoadPhase::FullyReady => "All content loaded",
  }
}
