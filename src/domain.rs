//! Domain models: exercises posted by instructors, student submissions and
//! leaderboard rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::classify::EditCounts;
use crate::engine::metrics::MetricScores;

/// How the student produced the submitted text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
  /// Post-edited the exercise's machine translation.
  EditMt,
  /// Wrote a translation from scratch.
  NewTranslation,
}
impl Default for SubmissionKind {
  fn default() -> Self { SubmissionKind::NewTranslation }
}

/// Where did the exercise come from?
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseSource {
  Seed,       // built-in demo content
  LocalBank,  // from the TOML config
  Instructor, // created through the API
}

/// A source text to translate, with an optional MT draft and a reference
/// that is never shown to students.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
  pub id: String,
  pub title: String,
  pub source: String,
  #[serde(default)] pub mt_output: String,
  #[serde(default)] pub reference: String,
  #[serde(default)] pub created_by: String,
  pub origin: ExerciseSource,
  pub created_at: DateTime<Utc>,
}

impl Exercise {
  /// Build a new exercise; a blank title becomes `Ex <timestamp>`.
  pub fn new(title: &str, source: &str, mt_output: &str, reference: &str, created_by: &str, origin: ExerciseSource) -> Self {
    let created_at = Utc::now();
    let title = match title.trim() {
      "" => format!("Ex {}", created_at.format("%Y-%m-%dT%H:%M:%S")),
      t => t.to_string(),
    };
    Self {
      id: Uuid::new_v4().to_string(),
      title,
      source: source.to_string(),
      mt_output: mt_output.to_string(),
      reference: reference.to_string(),
      created_by: created_by.to_string(),
      origin,
      created_at,
    }
  }

  pub fn has_reference(&self) -> bool {
    !self.reference.trim().is_empty()
  }
}

/// One scored attempt. Never mutated after it is stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
  pub id: String,
  pub exercise_id: String,
  pub student_name: String,
  pub kind: SubmissionKind,
  pub text: String,
  pub keystrokes: usize,
  pub time_spent: f64,
  pub counts: EditCounts,
  pub metrics: MetricScores,
  pub points: u32,
  pub submitted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
  pub rank: usize,
  pub student_name: String,
  pub total_points: u64,
  pub submissions: usize,
}
