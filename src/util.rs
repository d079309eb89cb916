//! Small utility helpers used across modules.

/// Trimmed text, or `None` when the value is absent, empty or whitespace-only.
pub fn clean_text(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

/// Drop trailing placeholder slots from a list.
/// Editors keep one empty input at the end for "add more"; it never counts.
pub fn drop_trailing<T>(mut items: Vec<T>, is_placeholder: impl Fn(&T) -> bool) -> Vec<T> {
  while items.last().is_some_and(|last| is_placeholder(last)) {
    items.pop();
  }
  items
}

/// Trim every entry, then drop trailing empty ones. Interior empties stay
/// so the caller can report their positions.
pub fn trimmed_list(values: &[String]) -> Vec<String> {
  drop_trailing(
    values.iter().map(|s| s.trim().to_string()).collect(),
    String::is_empty,
  )
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clean_text_treats_whitespace_as_missing() {
    assert_eq!(clean_text(None), None);
    assert_eq!(clean_text(Some("")), None);
    assert_eq!(clean_text(Some("  \t\n")), None);
    assert_eq!(clean_text(Some("  hi ")), Some("hi".to_string()));
  }

  #[test]
  fn only_trailing_placeholders_are_dropped() {
    let list = trimmed_list(&["a".into(), " ".into(), "b".into(), "".into(), "  ".into()]);
    assert_eq!(list, vec!["a".to_string(), String::new(), "b".to_string()]);
    assert!(trimmed_list(&["".into()]).is_empty());
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let s = "今天天气很好";
    let t = trunc_for_log(s, 4);
    assert!(t.starts_with("今"));
    assert_eq!(trunc_for_log("short", 10), "short");
  }
}
