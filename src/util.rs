//! Small utility helpers used across modules.

/// Round to `places` decimal places (half away from zero).
pub fn round_to(x: f64, places: u32) -> f64 {
  let scale = 10f64.powi(places as i32);
  (x * scale).round() / scale
}

/// Log-safe truncation for large strings, on a char boundary.
/// Avoids spamming logs with whole submissions.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  match s.char_indices().nth(max_chars) {
    None => s.to_string(),
    Some((cut, _)) => format!("{}… ({} bytes total)", &s[..cut], s.len()),
  }
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub fn csv_field(s: &str) -> String {
  if s.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", s.replace('"', "\"\""))
  } else {
    s.to_string()
  }
}

/// Empty string for `None`, plain number otherwise.
pub fn csv_opt(v: Option<f64>) -> String {
  v.map(|x| x.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rounding() {
    assert_eq!(round_to(0.123456, 4), 0.1235);
    assert_eq!(round_to(12.0, 4), 12.0);
    assert_eq!(round_to(2.675, 0), 3.0);
  }

  #[test]
  fn log_truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    assert_eq!(trunc_for_log("héllo wörld", 2), "hé… (13 bytes total)");
  }

  #[test]
  fn csv_quoting() {
    assert_eq!(csv_field("plain"), "plain");
    assert_eq!(csv_field("a, b"), "\"a, b\"");
    assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    assert_eq!(csv_opt(None), "");
    assert_eq!(csv_opt(Some(61.5)), "61.5");
  }
}
