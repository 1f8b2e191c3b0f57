use super::renderfns::utils::{CHARCOAL, CREAM, OLIVE, TERRACOTTA};
use super::phase_label;
use crate::provider::{DataState, LoadPhase};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Paragraph};

/// Branded loading screen shown until the reveal.
pub fn draw_loading(frame: &mut Frame, area: Rect, title: &str, state: &DataState, ticks: u64) {
  frame.render_widget(Block::default().style(Style::default().bg(CHARCOAL)), area);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Fill(1),
      Constraint::Length(6),
      Constraint::Fill(1),
    ])
    .split(area);

  let paragraph = Paragraph::new(loading_lines(title, state, ticks))
    .alignment(Alignment::Center)
    .style(Style::default().bg(CHARCOAL));
  frame.render_widget(paragraph, rows[1]);
}

fn loading_lines(title: &str, state: &DataState, ticks: u64) -> Vec<Line<'static>> {
  let status = if state.is_prefetched {
    Span::styled("READY", Style::default().fg(OLIVE).bold())
  } else {
    let dots = ".".repeat((ticks % 4) as usize);
    Span::styled(
      format!("LOADING EXPERIENCE{:<3}", dots),
      Style::default().fg(TERRACOTTA),
    )
  };

  vec![
    Line::from(Span::styled(title.to_string(), Style::default().fg(CREAM).bold())),
    Line::default(),
    Line::from(status),
    Line::default(),
    Line::from(Span::styled(progress_bar(state.phase), Style::default().fg(TERRACOTTA))),
    Line::from(Span::styled(
      phase_label(state.phase),
      Style::default().fg(Color::DarkGray),
    )),
  ]
}

const BAR_WIDTH: usize = 24;

/// Fixed-width bar filled according to how far loading has come
fn progress_bar(phase: LoadPhase) -> String {
  let filled = match phase {
    LoadPhase::Init => 0,
    LoadPhase::PriorityLoading => BAR_WIDTH / 4,
    LoadPhase::PriorityReady => BAR_WIDTH / 2,
    LoadPhase::SecondaryLoading => BAR_WIDTH * 3 / 4,
    LoadPhase::FullyReady => BAR_WIDTH,
  };
  format!("{}{}", "━".repeat(filled), "─".repeat(BAR_WIDTH - filled))
}
