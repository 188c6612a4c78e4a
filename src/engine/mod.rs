//! Scoring engine: tokenize → align → classify, metric scoring, points.
//!
//! Everything here is a pure function of its inputs apart from the metric
//! providers, which may call out to a remote service. Elapsed time is always
//! passed in by the caller.

pub mod align;
pub mod classify;
pub mod lexical;
pub mod metrics;
pub mod points;
pub mod tokenize;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use self::align::align;
use self::classify::{classify, examples, render_highlight, EditCounts, EditExamples, Highlight, DEFAULT_MAX_EXAMPLES};
use self::metrics::{MetricAdapter, MetricScores};
use self::points::{points, PointsWeights};
use self::tokenize::tokenize;

/// Token-level comparison of a hypothesis against its reference.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
  pub counts: EditCounts,
  pub examples: EditExamples,
  pub highlight: Highlight,
}

/// Everything computed for one submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReport {
  pub counts: EditCounts,
  pub examples: EditExamples,
  pub highlight: Highlight,
  pub metrics: MetricScores,
  pub points: u32,
}

pub struct Engine {
  pub adapter: MetricAdapter,
  pub weights: PointsWeights,
  pub max_examples: usize,
}

impl Default for Engine {
  fn default() -> Self {
    Self::new(MetricAdapter::lexical(), PointsWeights::default(), DEFAULT_MAX_EXAMPLES)
  }
}

impl Engine {
  pub fn new(adapter: MetricAdapter, weights: PointsWeights, max_examples: usize) -> Self {
    Self { adapter, weights, max_examples }
  }

  /// Alignment, counts, examples and highlight. No metrics.
  pub fn diff(&self, reference: Option<&str>, hypothesis: Option<&str>) -> DiffReport {
    let ref_tokens = tokenize(reference);
    let hyp_tokens = tokenize(hypothesis);
    let spans = align(&ref_tokens, &hyp_tokens);
    DiffReport {
      counts: classify(&spans),
      examples: examples(&spans, &ref_tokens, &hyp_tokens, self.max_examples),
      highlight: render_highlight(&ref_tokens, &hyp_tokens, &spans),
    }
  }

  #[instrument(level = "debug", skip(self, reference, hypothesis), fields(
    ref_len = reference.map_or(0, str::len),
    hyp_len = hypothesis.map_or(0, str::len),
  ))]
  pub async fn analyze(&self, reference: Option<&str>, hypothesis: Option<&str>, time_spent_seconds: f64) -> SubmissionReport {
    let DiffReport { counts, examples, highlight } = self.diff(reference, hypothesis);
    let metrics = self
      .adapter
      .score(hypothesis.unwrap_or_default(), reference.unwrap_or_default())
      .await;
    let points = points(&metrics, time_spent_seconds, counts.edit_ops, &self.weights);
    debug!(target: "scoring", edit_ops = counts.edit_ops, clean = examples.is_empty(), points, "Submission analyzed");
    SubmissionReport { counts, examples, highlight, metrics, points }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn identical_text_scores_clean() {
    let engine = Engine::default();
    let text = "the cat sat on the mat";
    let report = engine.analyze(Some(text), Some(text), 0.0).await;
    assert_eq!(report.counts.edit_ops, 0);
    assert_eq!(report.metrics.bleu, Some(100.0));
    assert_eq!(report.metrics.ter, Some(0.0));
    assert_eq!(report.metrics.similarity, Some(1.0));
    // 10 + 20 (BLEU) + 5 (similarity)
    assert_eq!(report.points, 35);
  }

  #[tokio::test]
  async fn missing_reference_still_aligns_and_scores() {
    let engine = Engine::default();
    let report = engine.analyze(None, Some("a student wrote this"), 0.0).await;
    assert_eq!(report.counts.inserts, 4);
    assert_eq!(report.counts.edit_ops, 4);
    assert_eq!(report.examples.insert, vec!["a student wrote this"]);
    assert_eq!(report.metrics.bleu, None);
    assert_eq!(report.metrics.similarity, Some(0.0));
    assert_eq!(report.points, 8);
  }

  #[tokio::test]
  async fn both_missing_is_all_zero() {
    let report = Engine::default().analyze(None, None, 0.0).await;
    assert_eq!(report.counts, EditCounts::default());
    assert!(report.highlight.segments.is_empty());
    assert_eq!(report.metrics.similarity, Some(1.0));
    assert_eq!(report.points, 15);
  }

  #[test]
  fn diff_honours_max_examples() {
    let engine = Engine::new(MetricAdapter::empty(), PointsWeights::default(), 1);
    let report = engine.diff(Some("a b c d e"), Some("x b y d z"));
    assert_eq!(report.counts.replaces, 3);
    assert_eq!(report.examples.replace, vec![("a".to_string(), "x".to_string())]);
  }
}
