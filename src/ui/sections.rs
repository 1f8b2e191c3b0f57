//! Text for each content section, built from the views on the provider state.

use super::renderfns::utils::{CREAM, OLIVE, TERRACOTTA};
use super::renderfns::{date_range, group_by_category, truncate};
use crate::app::Section;
use crate::provider::{DataState, LoadPhase};
use ratatui::prelude::*;

const LINK_WIDTH: usize = 60;

/// Lines for `section`.
pub fn lines(section: Section, state: &DataState) -> Vec<Line<'static>> {
  match section {
    Section::Hero => hero(state),
    Section::About => about(state),
    Section::Experience => experience(state),
    Section::Services => services(state),
    Section::Work => work(state),
    Section::Contact => contact(state),
  }
}

fn heading(text: &str) -> Line<'static> {
  Line::from(Span::styled(
    text.to_string(),
    Style::default().fg(TERRACOTTA).bold(),
  ))
}

fn muted(text: impl Into<String>) -> Line<'static> {
  Line::from(Span::styled(text.into(), Style::default().fg(Color::DarkGray)))
}

fn body(text: &str) -> Line<'static> {
  Line::from(Span::styled(text.to_string(), Style::default().fg(CREAM)))
}

/// Placeholder for a collection that has nothing to show yet
fn placeholder(pending: bool) -> Vec<Line<'static>> {
  if pending {
    vec![muted("Loading...")]
  } else {
    vec![muted("Nothing here yet.")]
  }
}

fn secondary_pending(state: &DataState) -> bool {
  state.phase != LoadPhase::FullyReady
}

fn hero(state: &DataState) -> Vec<Line<'static>> {
  let view = state.hero();
  let Some(hero) = view.data.first() else {
    return placeholder(view.is_loading);
  };

  let mut lines = vec![
    heading(&hero.title),
    Line::from(Span::styled(hero.subtitle.clone(), Style::default().fg(OLIVE).italic())),
    Line::default(),
    body(&hero.description),
  ];

  if !hero.cta_text.is_empty() {
    lines.push(Line::default());
    lines.push(Line::from(vec![
      Span::styled(format!("[ {} ]", hero.cta_text), Style::default().fg(TERRACOTTA)),
      Span::styled(format!("  {}", hero.cta_link), Style::default().fg(Color::DarkGray)),
    ]));
  }

  lines
}

fn about(state: &DataState) -> Vec<Line<'static>> {
  let mut lines = Vec::new();

  let view = state.about();
  match view.data.first() {
    Some(about) => {
      lines.push(heading(&about.title));
      lines.push(Line::default());
      lines.push(body(&about.description));
    }
    None => lines.extend(placeholder(view.is_loading)),
  }

  let skills = state.skills().data;
  if skills.is_empty() {
    return lines;
  }

  lines.push(Line::default());
  lines.push(heading("Skills"));
  for (category, skills) in group_by_category(skills, |s| s.category.as_str()) {
    let names: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();
    lines.push(Line::from(vec![
      Span::styled(format!("{}: ", category), Style::default().fg(OLIVE).bold()),
      Span::styled(names.join(", "), Style::default().fg(CREAM)),
    ]));
  }

  lines
}

fn experience(state: &DataState) -> Vec<Line<'static>> {
  let jobs = state.experience().data;
  if jobs.is_empty() {
    return placeholder(secondary_pending(state));
  }

  let mut lines = Vec::new();
  for job in jobs {
    lines.push(Line::from(vec![
      Span::styled(job.role.clone(), Style::default().fg(TERRACOTTA).bold()),
      Span::styled(format!(" @ {}", job.company), Style::default().fg(CREAM)),
    ]));
    lines.push(muted(date_range(&job.start_date, &job.end_date)));
    lines.push(body(&job.description));
    lines.push(Line::default());
  }
  lines
}

fn services(state: &DataState) -> Vec<Line<'static>> {
  let services = state.services().data;
  if services.is_empty() {
    return placeholder(secondary_pending(state));
  }

  let mut lines = Vec::new();
  for service in services {
    lines.push(heading(&service.title));
    lines.push(body(&service.description));
    lines.push(Line::default());
  }
  lines
}

fn work(state: &DataState) -> Vec<Line<'static>> {
  let projects = state.projects().data;
  if projects.is_empty() {
    return placeholder(secondary_pending(state));
  }

  let mut lines = Vec::new();
  for project in projects {
    lines.push(heading(&project.title));
    let meta = [project.category.as_str(), project.year.as_str()]
      .into_iter()
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join(" · ");
    if !meta.is_empty() {
      lines.push(Line::from(Span::styled(meta, Style::default().fg(OLIVE))));
    }
    lines.push(body(&project.description));
    if !project.link.is_empty() {
      lines.push(muted(truncate(&project.link, LINK_WIDTH)));
    }
    lines.push(Line::default());
  }
  lines
}

fn contact(state: &DataState) -> Vec<Line<'static>> {
  let mut lines = vec![
    heading("Get in touch"),
    muted("Send a message with `folio contact --name .. --email .. --message ..`"),
    Line::default(),
  ];

  let links = state.social_links().data;
  if links.is_empty() {
    lines.extend(placeholder(secondary_pending(state)));
    return lines;
  }

  for link in links {
    lines.push(Line::from(vec![
      Span::styled(format!("{:<12}", link.platform), Style::default().fg(TERRACOTTA)),
      Span::styled(truncate(&link.url, LINK_WIDTH), Style::default().fg(CREAM)),
    ]));
  }
  lines
}
