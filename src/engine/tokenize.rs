//! Whitespace tokenizer. Tokens are the unit the aligner works on.
//!
//! No case folding, punctuation splitting or Unicode normalization happens
//! here: "Hello," and "hello" are different tokens.

/// Split `text` on runs of whitespace. `None` behaves like an empty string.
pub fn tokenize(text: Option<&str>) -> Vec<&str> {
  text.unwrap_or_default().split_whitespace().collect()
}

/// Single-space join, used for example snippets and highlight segments.
pub fn join(tokens: &[&str]) -> String {
  tokens.join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn none_and_blank_are_empty() {
    assert!(tokenize(None).is_empty());
    assert!(tokenize(Some("")).is_empty());
    assert!(tokenize(Some(" \t\n ")).is_empty());
  }

  #[test]
  fn splits_on_whitespace_runs_without_normalizing() {
    let toks = tokenize(Some("  The cat,\tsat\n\nON  the mat. "));
    assert_eq!(toks, vec!["The", "cat,", "sat", "ON", "the", "mat."]);
  }

  #[test]
  fn join_uses_single_spaces() {
    assert_eq!(join(&["a", "b", "c"]), "a b c");
    assert_eq!(join(&[]), "");
  }
}
