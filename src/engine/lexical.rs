//! In-process lexical metrics: BLEU, chrF and TER providers plus the
//! character-level sequence ratio used as the always-available fallback.
//!
//! Scores are on a 0-100 scale except `sequence_ratio` (0-1).

use std::collections::HashMap;
use std::hash::Hash;

use crate::engine::align::SequenceMatcher;
use crate::engine::metrics::{Capability, MetricProvider, ProviderError, ProviderFuture};

const BLEU_MAX_ORDER: usize = 4;
const CHRF_CHAR_ORDER: usize = 6;
const CHRF_BETA: f64 = 2.0;
const CHRF_EPS: f64 = 1e-16;

/// Character-level similarity in `[0, 1]`; two empty strings score 1.0.
pub fn sequence_ratio(reference: &str, hypothesis: &str) -> f64 {
  let a: Vec<char> = reference.chars().collect();
  let b: Vec<char> = hypothesis.chars().collect();
  SequenceMatcher::new(&a, &b).ratio()
}

fn ready(result: Result<f64, ProviderError>) -> ProviderFuture<'static> {
  Box::pin(std::future::ready(result))
}

fn ngram_counts<T: Eq + Hash>(items: &[T], n: usize) -> HashMap<&[T], usize> {
  let mut counts = HashMap::new();
  if n == 0 {
    return counts;
  }
  for gram in items.windows(n) {
    *counts.entry(gram).or_insert(0) += 1;
  }
  counts
}

/// Clipped matches: each hypothesis n-gram counts at most as often as it
/// appears in the reference.
fn clipped_matches<T: Eq + Hash>(hyp: &HashMap<&[T], usize>, reference: &HashMap<&[T], usize>) -> usize {
  hyp.iter().map(|(gram, &count)| count.min(reference.get(gram).copied().unwrap_or(0))).sum()
}

// ---------------- BLEU ----------------

/// Corpus-style BLEU over a single segment.
pub struct Bleu;

impl MetricProvider for Bleu {
  fn capability(&self) -> Capability { Capability::NgramPrecision }

  fn compute<'a>(&'a self, hypothesis: &'a str, reference: &'a str) -> ProviderFuture<'a> {
    ready(bleu(hypothesis, reference))
  }
}

/// mteval-13a style tokenization: most punctuation becomes its own token;
/// `.` and `,` stay attached between digits, `-` is split after a digit.
pub fn tokenize_13a(line: &str) -> Vec<String> {
  let chars: Vec<char> = line.replace('\n', " ").chars().collect();
  let mut out = String::with_capacity(line.len() * 2);
  for (idx, &ch) in chars.iter().enumerate() {
    let prev = idx.checked_sub(1).and_then(|p| chars.get(p)).copied();
    let next = chars.get(idx + 1).copied();
    let digit = |c: Option<char>| c.map_or(false, |c| c.is_ascii_digit());
    let split = match ch {
      '.' | ',' => !(digit(prev) && digit(next)),
      '-' => digit(prev),
      '\'' => false,
      c if c.is_ascii_punctuation() => true,
      _ => false,
    };
    if split {
      out.push(' ');
      out.push(ch);
      out.push(' ');
    } else {
      out.push(ch);
    }
  }
  out.split_whitespace().map(str::to_string).collect()
}

pub fn bleu(hypothesis: &str, reference: &str) -> Result<f64, ProviderError> {
  let ref_tokens = tokenize_13a(reference);
  if ref_tokens.is_empty() {
    return Err(ProviderError::EmptyInput);
  }
  let hyp_tokens = tokenize_13a(hypothesis);
  let (sys_len, ref_len) = (hyp_tokens.len(), ref_tokens.len());
  if sys_len == 0 {
    return Ok(0.0);
  }

  let mut precisions = [0.0f64; BLEU_MAX_ORDER];
  let mut smooth = 1.0f64;
  for n in 1..=BLEU_MAX_ORDER {
    let total = (sys_len + 1).saturating_sub(n);
    if total == 0 {
      break;
    }
    let correct = clipped_matches(&ngram_counts(&hyp_tokens, n), &ngram_counts(&ref_tokens, n));
    precisions[n - 1] = if correct == 0 {
      smooth *= 2.0;
      100.0 / (smooth * total as f64)
    } else {
      100.0 * correct as f64 / total as f64
    };
  }

  // An order with no n-grams at all zeroes the geometric mean.
  if precisions.iter().any(|&p| p == 0.0) {
    return Ok(0.0);
  }
  let brevity = if sys_len < ref_len { (1.0 - ref_len as f64 / sys_len as f64).exp() } else { 1.0 };
  let mean_log = precisions.iter().map(|p| p.ln()).sum::<f64>() / BLEU_MAX_ORDER as f64;
  Ok(brevity * mean_log.exp())
}

// ---------------- chrF ----------------

/// Character n-gram F-score (orders 1-6, beta 2, whitespace ignored).
pub struct ChrF;

impl MetricProvider for ChrF {
  fn capability(&self) -> Capability { Capability::CharNgram }

  fn compute<'a>(&'a self, hypothesis: &'a str, reference: &'a str) -> ProviderFuture<'a> {
    ready(chrf(hypothesis, reference))
  }
}

pub fn chrf(hypothesis: &str, reference: &str) -> Result<f64, ProviderError> {
  let ref_chars: Vec<char> = reference.chars().filter(|c| !c.is_whitespace()).collect();
  if ref_chars.is_empty() {
    return Err(ProviderError::EmptyInput);
  }
  let hyp_chars: Vec<char> = hypothesis.chars().filter(|c| !c.is_whitespace()).collect();

  let factor = CHRF_BETA * CHRF_BETA;
  let (mut sum_prec, mut sum_rec) = (0.0, 0.0);
  let mut effective_order = 0usize;
  for n in 1..=CHRF_CHAR_ORDER {
    let hyp_grams = ngram_counts(&hyp_chars, n);
    let ref_grams = ngram_counts(&ref_chars, n);
    let n_hyp: usize = hyp_grams.values().sum();
    let n_ref: usize = ref_grams.values().sum();
    let n_match = clipped_matches(&hyp_grams, &ref_grams);

    sum_prec += if n_hyp > 0 { n_match as f64 / n_hyp as f64 } else { CHRF_EPS };
    sum_rec += if n_ref > 0 { n_match as f64 / n_ref as f64 } else { CHRF_EPS };
    if n_hyp > 0 && n_ref > 0 {
      effective_order += 1;
    }
  }

  // Precision and recall are averaged over the effective orders first,
  // then combined into a single F-beta.
  if effective_order == 0 {
    return Ok(0.0);
  }
  let prec = sum_prec / effective_order as f64;
  let rec = sum_rec / effective_order as f64;
  if prec + rec == 0.0 {
    return Ok(0.0);
  }
  Ok(100.0 * (1.0 + factor) * prec * rec / (factor * prec + rec))
}

// ---------------- TER ----------------

/// Word edit rate: insertions, deletions and substitutions per reference word.
/// Case-insensitive.
pub struct Ter;

impl MetricProvider for Ter {
  fn capability(&self) -> Capability { Capability::EditRate }

  fn compute<'a>(&'a self, hypothesis: &'a str, reference: &'a str) -> ProviderFuture<'a> {
    ready(ter(hypothesis, reference))
  }
}

pub fn ter(hypothesis: &str, reference: &str) -> Result<f64, ProviderError> {
  let ref_tokens: Vec<String> = reference.split_whitespace().map(str::to_lowercase).collect();
  if ref_tokens.is_empty() {
    return Err(ProviderError::EmptyInput);
  }
  let hyp_tokens: Vec<String> = hypothesis.split_whitespace().map(str::to_lowercase).collect();
  let edits = levenshtein(&hyp_tokens, &ref_tokens);
  Ok(100.0 * edits as f64 / ref_tokens.len() as f64)
}

fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
  if a.is_empty() {
    return b.len();
  }
  if b.is_empty() {
    return a.len();
  }
  let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
  let mut prev: Vec<usize> = (0..=short.len()).collect();
  let mut curr = vec![0usize; short.len() + 1];
  for i in 1..=long.len() {
    curr[0] = i;
    for j in 1..=short.len() {
      let cost = usize::from(long[i - 1] != short[j - 1]);
      curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
    }
    std::mem::swap(&mut prev, &mut curr);
  }
  prev[short.len()]
}

#[cfg(test)]
mod tests {
  use super::*;

  fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-6 }

  #[test]
  fn tokenize_13a_splits_punctuation_but_not_numbers() {
    assert_eq!(tokenize_13a("Hello, world!"), vec!["Hello", ",", "world", "!"]);
    assert_eq!(tokenize_13a("It costs 3.50 (approx.)"), vec!["It", "costs", "3.50", "(", "approx", ".", ")"]);
    assert_eq!(tokenize_13a("don't 1990-2000"), vec!["don't", "1990", "-", "2000"]);
  }

  #[test]
  fn bleu_bounds() {
    let r = "the quick brown fox jumps over the lazy dog";
    assert!(close(bleu(r, r).unwrap(), 100.0));
    assert_eq!(bleu("", r).unwrap(), 0.0);
    assert_eq!(bleu("fox", r).unwrap(), 0.0);
    assert_eq!(bleu(r, "  "), Err(ProviderError::EmptyInput));

    let partial = bleu("the quick brown fox jumped over a lazy dog", r).unwrap();
    assert!(partial > 0.0 && partial < 100.0, "partial={partial}");
  }

  #[test]
  fn bleu_smooths_orders_without_matches() {
    // unigram and bigram matches only; higher orders are smoothed, not zeroed
    let score = bleu("a b x c d y", "a b z c d w").unwrap();
    assert!(score > 0.0 && score < 50.0, "score={score}");
  }

  #[test]
  fn chrf_bounds() {
    assert!(close(chrf("kitten", "kitten").unwrap(), 100.0));
    assert!(close(chrf("a b c", "abc").unwrap(), 100.0));
    assert_eq!(chrf("", "abc").unwrap(), 0.0);
    assert_eq!(chrf("abc", ""), Err(ProviderError::EmptyInput));
    let partial = chrf("sitting", "kitten").unwrap();
    assert!(partial > 0.0 && partial < 100.0);
  }

  #[test]
  fn chrf_averages_precision_and_recall_before_f_score() {
    assert!((chrf("abc", "abcdefgh").unwrap() - 32.2506).abs() < 1e-3);
    assert!((chrf("sitting", "kitten").unwrap() - 21.1337).abs() < 1e-3);
  }

  #[test]
  fn ter_counts_word_edits_per_reference_word() {
    assert_eq!(ter("a b c d", "a b c d").unwrap(), 0.0);
    assert_eq!(ter("a x c d", "a b c d").unwrap(), 25.0);
    assert_eq!(ter("", "a b").unwrap(), 100.0);
    assert_eq!(ter("a b c d", "a b").unwrap(), 100.0);
    assert_eq!(ter("a", ""), Err(ProviderError::EmptyInput));
  }

  #[test]
  fn ter_ignores_case() {
    assert_eq!(ter("The cat sat", "the cat sat").unwrap(), 0.0);
    assert!(close(ter("THE DOG sat", "the cat sat").unwrap(), 100.0 / 3.0));
  }

  #[test]
  fn sequence_ratio_is_character_level() {
    assert_eq!(sequence_ratio("", ""), 1.0);
    assert_eq!(sequence_ratio("abc", ""), 0.0);
    assert!(close(sequence_ratio("abcd", "bcde"), 0.75));
  }
}
