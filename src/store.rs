//! In-memory persistence for exercises and submissions.
//!
//! Submissions are append-only; the only mutation after insert is deletion
//! by an instructor. Each write takes the lock once.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::domain::{Exercise, LeaderboardEntry, Submission, SubmissionKind};
use crate::util::{csv_field, csv_opt};

pub const CSV_HEADER: &str = "id,exercise_id,student_name,submission_type,student_text,keystrokes,time_spent,\
inserts,deletes,replaces,edit_ops,bleu,chrf,ter,bert_f1,similarity,points,submitted_at";

#[derive(Clone, Default)]
pub struct Store {
  exercises: Arc<RwLock<Vec<Exercise>>>,
  submissions: Arc<RwLock<Vec<Submission>>>,
}

impl Store {
  /// Preloaded store; later duplicates of an id are dropped.
  pub fn with_exercises(exercises: Vec<Exercise>) -> Self {
    let mut unique: Vec<Exercise> = Vec::with_capacity(exercises.len());
    for ex in exercises {
      if !unique.iter().any(|e| e.id == ex.id) {
        unique.push(ex);
      }
    }
    Self { exercises: Arc::new(RwLock::new(unique)), submissions: Arc::default() }
  }

  /// Insert unless an exercise with the same id exists. Returns whether it was added.
  #[instrument(level = "debug", skip(self, ex), fields(id = %ex.id))]
  pub async fn insert_exercise(&self, ex: Exercise) -> bool {
    let mut exercises = self.exercises.write().await;
    if exercises.iter().any(|e| e.id == ex.id) {
      debug!(target: "store", id = %ex.id, "Exercise id already present; keeping existing");
      return false;
    }
    exercises.push(ex);
    true
  }

  pub async fn get_exercise(&self, id: &str) -> Option<Exercise> {
    self.exercises.read().await.iter().find(|e| e.id == id).cloned()
  }

  /// Newest first.
  pub async fn list_exercises(&self) -> Vec<Exercise> {
    self.exercises.read().await.iter().rev().cloned().collect()
  }

  #[instrument(level = "debug", skip(self, sub), fields(id = %sub.id, exercise_id = %sub.exercise_id))]
  pub async fn append_submission(&self, sub: Submission) {
    let mut subs = self.submissions.write().await;
    info!(target: "store", id = %sub.id, student = %sub.student_name, points = sub.points, "Submission stored");
    subs.push(sub);
  }

  pub async fn get_submission(&self, id: &str) -> Option<Submission> {
    self.submissions.read().await.iter().find(|s| s.id == id).cloned()
  }

  /// Newest first, optionally restricted to one exercise.
  pub async fn list_submissions(&self, exercise_id: Option<&str>) -> Vec<Submission> {
    self
      .submissions
      .read()
      .await
      .iter()
      .rev()
      .filter(|s| exercise_id.map_or(true, |id| s.exercise_id == id))
      .cloned()
      .collect()
  }

  /// Returns whether a submission was removed.
  #[instrument(level = "debug", skip(self))]
  pub async fn delete_submission(&self, id: &str) -> bool {
    let mut subs = self.submissions.write().await;
    let before = subs.len();
    subs.retain(|s| s.id != id);
    let removed = subs.len() != before;
    if removed {
      info!(target: "store", %id, "Submission deleted");
    }
    removed
  }

  /// Total points and submission count per student, best first; ties by name.
  pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<String, (u64, usize)> = HashMap::new();
    for sub in self.submissions.read().await.iter() {
      let entry = totals.entry(sub.student_name.clone()).or_insert((0, 0));
      entry.0 += u64::from(sub.points);
      entry.1 += 1;
    }

    let mut rows: Vec<(String, u64, usize)> = totals.into_iter().map(|(name, (pts, n))| (name, pts, n)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
      .into_iter()
      .enumerate()
      .map(|(i, (student_name, total_points, submissions))| LeaderboardEntry {
        rank: i + 1,
        student_name,
        total_points,
        submissions,
      })
      .collect()
  }

  /// Every submission in insertion order as CSV with a header row.
  pub async fn export_csv(&self) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for s in self.submissions.read().await.iter() {
      let kind = match s.kind {
        SubmissionKind::EditMt => "edit_mt",
        SubmissionKind::NewTranslation => "new_translation",
      };
      let row = [
        csv_field(&s.id),
        csv_field(&s.exercise_id),
        csv_field(&s.student_name),
        kind.to_string(),
        csv_field(&s.text),
        s.keystrokes.to_string(),
        s.time_spent.to_string(),
        s.counts.inserts.to_string(),
        s.counts.deletes.to_string(),
        s.counts.replaces.to_string(),
        s.counts.edit_ops.to_string(),
        csv_opt(s.metrics.bleu),
        csv_opt(s.metrics.chrf),
        csv_opt(s.metrics.ter),
        csv_opt(s.metrics.bert_f1),
        csv_opt(s.metrics.similarity),
        s.points.to_string(),
        s.submitted_at.to_rfc3339(),
      ];
      out.push_str(&row.join(","));
      out.push('\n');
    }
    out
  }
}
