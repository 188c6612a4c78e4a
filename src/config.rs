//! Loading trainer configuration (scoring weights, metric toggles and an
//! optional exercise bank) from TOML.
//!
//! See `TrainerConfig` for the expected schema:
//!
//! ```toml
//! [scoring]
//! max_examples = 5
//! [scoring.weights]
//! base = 10
//! bleu = 0.2
//!
//! [metrics]
//! ter = false
//!
//! [[exercises]]
//! title = "Greetings"
//! source = "Bonjour à tous."
//! mt_output = "Hello to all."
//! reference = "Hello everyone."
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::engine::classify::DEFAULT_MAX_EXAMPLES;
use crate::engine::points::PointsWeights;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TrainerConfig {
  #[serde(default)]
  pub scoring: ScoringCfg,
  #[serde(default)]
  pub metrics: MetricsCfg,
  #[serde(default)]
  pub exercises: Vec<ExerciseCfg>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScoringCfg {
  pub max_examples: usize,
  pub weights: PointsWeights,
}
impl Default for ScoringCfg {
  fn default() -> Self {
    Self { max_examples: DEFAULT_MAX_EXAMPLES, weights: PointsWeights::default() }
  }
}

/// Which metric providers to register. Embedding similarity additionally
/// needs an API key in the environment.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MetricsCfg {
  pub bleu: bool,
  pub chrf: bool,
  pub ter: bool,
  pub embedding: bool,
}
impl Default for MetricsCfg {
  fn default() -> Self {
    Self { bleu: true, chrf: true, ter: true, embedding: true }
  }
}

/// Exercise entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ExerciseCfg {
  #[serde(default)] pub id: Option<String>,
  #[serde(default)] pub title: String,
  pub source: String,
  #[serde(default)] pub mt_output: String,
  #[serde(default)] pub reference: String,
  #[serde(default)] pub created_by: String,
}

pub fn parse_config(s: &str) -> Result<TrainerConfig, toml::de::Error> {
  toml::from_str::<TrainerConfig>(s)
}

/// Attempt to load `TrainerConfig` from TRAINER_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<TrainerConfig> {
  let path = std::env::var("TRAINER_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "postedit", %path, exercises = cfg.exercises.len(), "Loaded trainer config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "postedit", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "postedit", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse_config("").unwrap();
    assert_eq!(cfg.scoring.max_examples, DEFAULT_MAX_EXAMPLES);
    assert_eq!(cfg.scoring.weights, PointsWeights::default());
    assert!(cfg.metrics.bleu && cfg.metrics.chrf && cfg.metrics.ter && cfg.metrics.embedding);
    assert!(cfg.exercises.is_empty());
  }

  #[test]
  fn partial_sections_merge_with_defaults() {
    let cfg = parse_config(
      r#"
      [scoring]
      max_examples = 3
      [scoring.weights]
      bleu = 0.5

      [metrics]
      ter = false

      [[exercises]]
      id = "ex-1"
      title = "Greetings"
      source = "Bonjour à tous."
      reference = "Hello everyone."
      "#,
    )
    .unwrap();
    assert_eq!(cfg.scoring.max_examples, 3);
    assert_eq!(cfg.scoring.weights.bleu, 0.5);
    assert_eq!(cfg.scoring.weights.base, 10);
    assert!(!cfg.metrics.ter && cfg.metrics.bleu);
    assert_eq!(cfg.exercises.len(), 1);
    assert_eq!(cfg.exercises[0].id.as_deref(), Some("ex-1"));
    assert!(cfg.exercises[0].mt_output.is_empty());
  }

  #[test]
  fn exercise_without_source_is_rejected() {
    assert!(parse_config("[[exercises]]\ntitle = \"x\"\n").is_err());
  }
}
