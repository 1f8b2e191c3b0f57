use super::utils::{CHARCOAL, CREAM, TERRACOTTA};
use crate::app::Section;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the section tabs, highlighting the current one
pub fn draw_footer(frame: &mut Frame, area: Rect, current: Section) {
  let mut spans = vec![Span::raw(" ")];

  for (i, section) in Section::ALL.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" · ", Style::default().fg(Color::DarkGray)));
    }

    let style = if *section == current {
      Style::default().fg(TERRACOTTA).bold()
    } else {
      Style::default().fg(CREAM)
    };

    spans.push(Span::styled(section.title(), style));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(CHARCOAL));
  frame.render_widget(paragraph, area);
}
