//! Points awarded per submission.
//!
//! pts = base
//!     + trunc(BLEU * w_bleu) + trunc(BERT_F1 * w_bert) + trunc(similarity * w_sim)
//!     - trunc(time_spent / seconds_per_point) - trunc(edit_ops * w_edit)
//!
//! Missing metrics count as zero and the result is clamped at zero.

use serde::{Deserialize, Serialize};

use crate::engine::metrics::{Metric, MetricScores};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsWeights {
  pub base: i64,
  pub bleu: f64,
  pub bert_f1: f64,
  pub similarity: f64,
  /// One point is lost for every this many seconds spent.
  pub seconds_per_point: f64,
  pub edit_op: f64,
}

impl Default for PointsWeights {
  fn default() -> Self {
    Self { base: 10, bleu: 0.2, bert_f1: 0.4, similarity: 5.0, seconds_per_point: 10.0, edit_op: 0.5 }
  }
}

fn term(x: f64) -> i64 {
  if x.is_finite() { x.trunc() as i64 } else { 0 }
}

pub fn points(metrics: &MetricScores, time_spent_seconds: f64, edit_ops: usize, weights: &PointsWeights) -> u32 {
  let time_spent = if time_spent_seconds.is_finite() { time_spent_seconds.max(0.0) } else { 0.0 };
  let time_penalty = if weights.seconds_per_point > 0.0 { term(time_spent / weights.seconds_per_point) } else { 0 };

  let mut pts = weights.base;
  for (metric, weight) in [(Metric::Bleu, weights.bleu), (Metric::BertF1, weights.bert_f1), (Metric::Similarity, weights.similarity)] {
    pts += term(metrics.get(metric).unwrap_or(0.0) * weight);
  }
  pts -= time_penalty;
  pts -= term(edit_ops as f64 * weights.edit_op);

  u32::try_from(pts.max(0)).unwrap_or(u32::MAX)
}
