use ratatui::prelude::Color;

pub const CHARCOAL: Color = Color::Rgb(26, 26, 26);
pub const TERRACOTTA: Color = Color::Rgb(156, 92, 69);
pub const CREAM: Color = Color::Rgb(249, 249, 247);
pub const OLIVE: Color = Color::Rgb(58, 77, 57);

/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Group items by a category label, keeping first-seen category order.
/// Blank categories land under "Other".
pub fn group_by_category<'a, T>(
  items: &'a [T],
  category: impl Fn(&T) -> &str,
) -> Vec<(String, Vec<&'a T>)> {
  let mut groups: Vec<(String, Vec<&T>)> = Vec::new();

  for item in items {
    let label = match category(item).trim() {
      "" => "Other",
      c => c,
    };
    match groups.iter_mut().find(|(name, _)| name == label) {
      Some((_, members)) => members.push(item),
      None => groups.push((label.to_string(), vec![item])),
    }
  }

  groups
}

/// "start - end", with an open end shown as "Present"
pub fn date_range(start: &str, end: &str) -> String {
  let end = if end.trim().is_empty() { "Present" } else { end };
  match start.trim() {
    "" => end.to_string(),
    start => format!("{} - {}", start, end),
  }
}
