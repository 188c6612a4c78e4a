//! Metric adapter: runs whichever metric providers are registered and
//! collects their scores into a `MetricScores` set.
//!
//! A provider failure only blanks its own metric. The character-level
//! `similarity` fallback is computed for every submission, even when the
//! reference is empty.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::engine::lexical::{sequence_ratio, Bleu, ChrF, Ter};
use crate::util::round_to;

/// Decimal places kept for every metric value.
pub const METRIC_DECIMALS: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
  #[serde(rename = "BLEU")]
  Bleu,
  #[serde(rename = "chrF")]
  ChrF,
  #[serde(rename = "TER")]
  Ter,
  #[serde(rename = "BERT_F1")]
  BertF1,
  #[serde(rename = "similarity")]
  Similarity,
}

impl Metric {
  pub fn name(self) -> &'static str {
    match self {
      Metric::Bleu => "BLEU",
      Metric::ChrF => "chrF",
      Metric::Ter => "TER",
      Metric::BertF1 => "BERT_F1",
      Metric::Similarity => "similarity",
    }
  }
}

impl fmt::Display for Metric {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// What a provider can measure. Each capability backs exactly one metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
  NgramPrecision,
  CharNgram,
  EditRate,
  EmbeddingSimilarity,
}

impl Capability {
  pub const ALL: [Capability; 4] = [
    Capability::NgramPrecision,
    Capability::CharNgram,
    Capability::EditRate,
    Capability::EmbeddingSimilarity,
  ];

  pub fn metric(self) -> Metric {
    match self {
      Capability::NgramPrecision => Metric::Bleu,
      Capability::CharNgram => Metric::ChrF,
      Capability::EditRate => Metric::Ter,
      Capability::EmbeddingSimilarity => Metric::BertF1,
    }
  }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
  #[error("empty input")]
  EmptyInput,
  #[error("computation failed: {0}")]
  Computation(String),
  #[error("remote provider error: {0}")]
  Remote(String),
}

pub type ProviderFuture<'a> = Pin<Box<dyn Future<Output = Result<f64, ProviderError>> + Send + 'a>>;

/// A pluggable scorer for one capability.
pub trait MetricProvider: Send + Sync {
  fn capability(&self) -> Capability;

  /// Score `hypothesis` against a non-blank `reference`.
  fn compute<'a>(&'a self, hypothesis: &'a str, reference: &'a str) -> ProviderFuture<'a>;
}

/// Scores keyed by their display names (`BLEU`, `chrF`, `TER`, `BERT_F1`,
/// `similarity`). `None` means the metric could not be computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricScores {
  #[serde(rename = "BLEU")]
  pub bleu: Option<f64>,
  #[serde(rename = "chrF")]
  pub chrf: Option<f64>,
  #[serde(rename = "TER")]
  pub ter: Option<f64>,
  #[serde(rename = "BERT_F1")]
  pub bert_f1: Option<f64>,
  pub similarity: Option<f64>,
}

impl MetricScores {
  pub fn get(&self, metric: Metric) -> Option<f64> {
    match metric {
      Metric::Bleu => self.bleu,
      Metric::ChrF => self.chrf,
      Metric::Ter => self.ter,
      Metric::BertF1 => self.bert_f1,
      Metric::Similarity => self.similarity,
    }
  }

  pub fn set(&mut self, metric: Metric, value: Option<f64>) {
    let slot = match metric {
      Metric::Bleu => &mut self.bleu,
      Metric::ChrF => &mut self.chrf,
      Metric::Ter => &mut self.ter,
      Metric::BertF1 => &mut self.bert_f1,
      Metric::Similarity => &mut self.similarity,
    };
    *slot = value;
  }
}

/// Registry of metric providers, at most one per capability.
#[derive(Default)]
pub struct MetricAdapter {
  providers: Vec<Box<dyn MetricProvider>>,
}

impl MetricAdapter {
  /// No providers: only `similarity` will ever be filled in.
  pub fn empty() -> Self {
    Self::default()
  }

  /// BLEU, chrF and TER, all computed in-process.
  pub fn lexical() -> Self {
    Self::empty().with_provider(Bleu).with_provider(ChrF).with_provider(Ter)
  }

  pub fn with_provider(mut self, provider: impl MetricProvider + 'static) -> Self {
    self.register(Box::new(provider));
    self
  }

  /// Register `provider`, replacing any provider with the same capability.
  pub fn register(&mut self, provider: Box<dyn MetricProvider>) {
    let cap = provider.capability();
    self.providers.retain(|p| p.capability() != cap);
    self.providers.push(provider);
  }

  pub fn unregister(&mut self, capability: Capability) {
    self.providers.retain(|p| p.capability() != capability);
  }

  pub fn capabilities(&self) -> Vec<Capability> {
    Capability::ALL.into_iter().filter(|c| self.providers.iter().any(|p| p.capability() == *c)).collect()
  }

  pub async fn score(&self, hypothesis: &str, reference: &str) -> MetricScores {
    let mut scores = MetricScores::default();

    if reference.trim().is_empty() {
      debug!(target: "scoring", "Blank reference; provider-backed metrics skipped");
    } else {
      for provider in &self.providers {
        let metric = provider.capability().metric();
        match provider.compute(hypothesis, reference).await {
          Ok(value) if value.is_finite() => scores.set(metric, Some(round_to(value, METRIC_DECIMALS))),
          Ok(value) => {
            warn!(target: "scoring", %metric, value, "Provider returned a non-finite score; dropping it");
          }
          Err(e) => {
            warn!(target: "scoring", %metric, error = %e, "Metric provider failed; metric left empty");
          }
        }
      }
    }

    scores.similarity = Some(round_to(sequence_ratio(reference, hypothesis), METRIC_DECIMALS));
    scores
  }
}
