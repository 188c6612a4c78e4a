//! Edit classification: per-category counts, example snippets and the
//! highlighted rendering of a hypothesis against its reference.

use serde::{Deserialize, Serialize};

use crate::engine::align::{EditKind, EditSpan};
use crate::engine::tokenize::join;

pub const DEFAULT_MAX_EXAMPLES: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditCounts {
  pub inserts: usize,
  pub deletes: usize,
  pub replaces: usize,
  pub edit_ops: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditExamples {
  pub insert: Vec<String>,
  pub delete: Vec<String>,
  /// (reference text, hypothesis text)
  pub replace: Vec<(String, String)>,
}

impl EditExamples {
  pub fn is_empty(&self) -> bool {
    self.insert.is_empty() && self.delete.is_empty() && self.replace.is_empty()
  }
}

pub fn classify(spans: &[EditSpan]) -> EditCounts {
  let mut counts = EditCounts::default();
  for span in spans {
    match span.kind {
      EditKind::Equal => {}
      EditKind::Insert => counts.inserts += span.hyp_len(),
      EditKind::Delete => counts.deletes += span.ref_len(),
      EditKind::Replace => counts.replaces += span.ref_len().max(span.hyp_len()),
    }
  }
  counts.edit_ops = counts.inserts + counts.deletes + counts.replaces;
  counts
}

/// Joined text of every non-equal span, keeping the first `max_examples`
/// of each category in span order.
pub fn examples(spans: &[EditSpan], ref_tokens: &[&str], hyp_tokens: &[&str], max_examples: usize) -> EditExamples {
  let mut out = EditExamples::default();
  for span in spans {
    let ref_text = || join(&ref_tokens[span.ref_range.clone()]);
    let hyp_text = || join(&hyp_tokens[span.hyp_range.clone()]);
    match span.kind {
      EditKind::Equal => {}
      EditKind::Insert if out.insert.len() < max_examples => out.insert.push(hyp_text()),
      EditKind::Delete if out.delete.len() < max_examples => out.delete.push(ref_text()),
      EditKind::Replace if out.replace.len() < max_examples => out.replace.push((ref_text(), hyp_text())),
      _ => {}
    }
  }
  out
}

/// One rendered piece of the highlight, in span order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSegment {
  pub kind: EditKind,
  /// Hypothesis text, or the missing reference text for `Delete`.
  pub text: String,
  /// Reference text a `Replace` segment stands in for.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reference: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Highlight {
  pub segments: Vec<HighlightSegment>,
}

pub fn render_highlight(ref_tokens: &[&str], hyp_tokens: &[&str], spans: &[EditSpan]) -> Highlight {
  let segments = spans
    .iter()
    .map(|span| {
      let ref_text = join(&ref_tokens[span.ref_range.clone()]);
      let hyp_text = join(&hyp_tokens[span.hyp_range.clone()]);
      match span.kind {
        EditKind::Equal | EditKind::Insert => HighlightSegment { kind: span.kind, text: hyp_text, reference: None },
        EditKind::Replace => HighlightSegment { kind: span.kind, text: hyp_text, reference: Some(ref_text) },
        EditKind::Delete => HighlightSegment { kind: span.kind, text: ref_text, reference: None },
      }
    })
    .collect();
  Highlight { segments }
}

impl Highlight {
  /// HTML fragment; non-equal segments become `<span>`s with a class and title.
  pub fn to_html(&self) -> String {
    self
      .segments
      .iter()
      .map(|seg| {
        let text = escape_html(&seg.text);
        match seg.kind {
          EditKind::Equal => text,
          EditKind::Insert => format!("<span class='edit-insert' title='Insertion'>{text}</span>"),
          EditKind::Delete => {
            format!("<span class='edit-delete' title='Missing (should be present): {text}'>{text}</span>")
          }
          EditKind::Replace => {
            let reference = escape_html(seg.reference.as_deref().unwrap_or_default());
            format!("<span class='edit-replace' title='Replace: {reference} → {text}'>{text}</span>")
          }
        }
      })
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// Plain-text markers: `[+]inserted`, `[-]missing`, `[ref→hyp]`.
  pub fn to_marked_text(&self) -> String {
    self
      .segments
      .iter()
      .map(|seg| match seg.kind {
        EditKind::Equal => seg.text.clone(),
        EditKind::Insert => format!("[+]{}", seg.text),
        EditKind::Delete => format!("[-]{}", seg.text),
        EditKind::Replace => format!("[{}→{}]", seg.reference.as_deref().unwrap_or_default(), seg.text),
      })
      .collect::<Vec<_>>()
      .join(" ")
  }
}

fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}

/// Index-by-index word comparison, no alignment. Only positions present in
/// both sequences are compared.
pub fn positional_mismatches(hyp_tokens: &[&str], ref_tokens: &[&str]) -> Vec<String> {
  hyp_tokens
    .iter()
    .zip(ref_tokens)
    .filter(|(h, r)| h != r)
    .map(|(h, r)| format!("Word mismatch: '{h}' vs '{r}'"))
    .collect()
}
