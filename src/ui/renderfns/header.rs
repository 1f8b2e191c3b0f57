use super::utils::{CHARCOAL, CREAM, TERRACOTTA};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with title, content host, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, base_url: &str) {
  let domain = extract_domain(base_url);

  let header = Line::from(vec![
    Span::styled(format!(" {} ", title), Style::default().fg(TERRACOTTA).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", domain), Style::default().fg(CREAM)),
    Span::raw("  "),
    // Keys highlighted, descriptions dimmed
    Span::styled("<tab>", Style::default().fg(TERRACOTTA)),
    Span::styled(" section", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<j/k>", Style::default().fg(TERRACOTTA)),
    Span::styled(" scroll", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<r>", Style::default().fg(TERRACOTTA)),
    Span::styled(" refresh", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<q>", Style::default().fg(TERRACOTTA)),
    Span::styled(" quit", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(CHARCOAL));

  frame.render_widget(paragraph, area);
}

/// Host part of the content API URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
