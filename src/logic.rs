//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Stateless scoring of a (reference, hypothesis) pair
//!   - Creating and listing exercises (reference hidden from students)
//!   - Scoring, storing and reporting student submissions
//!   - Instructor views: submission detail, deletion, leaderboard, CSV export

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Exercise, ExerciseSource, Submission, SubmissionKind};
use crate::engine::classify::positional_mismatches;
use crate::engine::tokenize::tokenize;
use crate::error::ApiError;
use crate::practice::build_drills;
use crate::protocol::{to_out, ExerciseIn, ExerciseOut, ReportOut, SubmissionDetail, SubmitOut};
use crate::state::AppState;

/// What the transport knows about the attempt beyond the text itself.
#[derive(Debug, Clone)]
pub struct Attempt {
  pub student_name: String,
  pub kind: SubmissionKind,
  pub text: String,
  pub time_spent: f64,
  pub keystrokes: usize,
}

#[instrument(level = "info", skip(state, reference, hypothesis), fields(
  ref_len = reference.map_or(0, str::len),
  hyp_len = hypothesis.map_or(0, str::len),
))]
pub async fn score_text(state: &AppState, reference: Option<&str>, hypothesis: Option<&str>, time_spent: f64) -> ReportOut {
  state.engine.analyze(reference, hypothesis, time_spent).await.into()
}

#[instrument(level = "info", skip(state, body), fields(source_len = body.source.len()))]
pub async fn create_exercise(state: &AppState, body: ExerciseIn) -> Result<Exercise, ApiError> {
  if body.source.trim().is_empty() {
    return Err(ApiError::InvalidInput("Provide a source text.".into()));
  }
  let ex = Exercise::new(&body.title, &body.source, &body.mt_output, &body.reference, &body.created_by, ExerciseSource::Instructor);
  state.store.insert_exercise(ex.clone()).await;
  info!(target: "postedit", id = %ex.id, title = %ex.title, has_reference = ex.has_reference(), "Exercise created");
  Ok(ex)
}

pub async fn list_exercises(state: &AppState) -> Vec<ExerciseOut> {
  state.store.list_exercises().await.iter().map(to_out).collect()
}

pub async fn get_exercise(state: &AppState, id: &str) -> Result<ExerciseOut, ApiError> {
  state
    .store
    .get_exercise(id)
    .await
    .map(|ex| to_out(&ex))
    .ok_or_else(|| ApiError::ExerciseNotFound(id.to_string()))
}

/// Score `attempt` against the exercise's hidden reference and store it.
#[instrument(level = "info", skip(state, attempt), fields(text_len = attempt.text.len(), time_spent = attempt.time_spent))]
pub async fn submit(state: &AppState, exercise_id: &str, attempt: Attempt) -> Result<SubmitOut, ApiError> {
  let student_name = attempt.student_name.trim().to_string();
  if student_name.is_empty() {
    return Err(ApiError::InvalidInput("Please enter your name before submitting.".into()));
  }
  let ex = state
    .store
    .get_exercise(exercise_id)
    .await
    .ok_or_else(|| ApiError::ExerciseNotFound(exercise_id.to_string()))?;
  if !ex.has_reference() {
    warn!(target: "scoring", %exercise_id, "Exercise has no reference; lexical metrics will be empty");
  }

  let time_spent = if attempt.time_spent.is_finite() { attempt.time_spent.max(0.0) } else { 0.0 };
  let report = state.engine.analyze(Some(&ex.reference), Some(&attempt.text), time_spent).await;

  let submission = Submission {
    id: Uuid::new_v4().to_string(),
    exercise_id: ex.id.clone(),
    student_name,
    kind: attempt.kind,
    text: attempt.text.clone(),
    keystrokes: attempt.keystrokes,
    time_spent,
    counts: report.counts,
    metrics: report.metrics,
    points: report.points,
    submitted_at: Utc::now(),
  };
  let submission_id = submission.id.clone();
  state.store.append_submission(submission).await;

  let drills = {
    let mut rng = rand::thread_rng();
    build_drills(&report.examples, &attempt.text, &mut rng)
  };

  Ok(SubmitOut {
    submission_id,
    points: report.points,
    time_spent,
    keystrokes: attempt.keystrokes,
    report: report.into(),
    drills,
    warning: None,
  })
}

#[instrument(level = "info", skip(state))]
pub async fn submission_detail(state: &AppState, id: &str) -> Result<SubmissionDetail, ApiError> {
  let submission = state
    .store
    .get_submission(id)
    .await
    .ok_or_else(|| ApiError::SubmissionNotFound(id.to_string()))?;
  let exercise = state.store.get_exercise(&submission.exercise_id).await;
  let reference = exercise.as_ref().map(|e| e.reference.as_str());

  let diff = state.engine.diff(reference, Some(&submission.text));
  let word_mismatches = positional_mismatches(&tokenize(Some(&submission.text)), &tokenize(reference));
  let highlight_html = diff.highlight.to_html();

  Ok(SubmissionDetail {
    counts: submission.counts,
    submission,
    exercise,
    examples: diff.examples,
    highlight: diff.highlight,
    highlight_html,
    word_mismatches,
  })
}

pub async fn delete_submission(state: &AppState, id: &str) -> Result<(), ApiError> {
  if state.store.delete_submission(id).await {
    Ok(())
  } else {
    Err(ApiError::SubmissionNotFound(id.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TrainerConfig;

  fn state() -> AppState {
    AppState::from_parts(TrainerConfig::default(), None)
  }

  fn attempt(name: &str, text: &str, time_spent: f64) -> Attempt {
    Attempt { student_name: name.into(), kind: SubmissionKind::EditMt, text: text.into(), time_spent, keystrokes: 7 }
  }

  #[tokio::test]
  async fn student_views_hide_the_reference() {
    let state = state();
    let listed = list_exercises(&state).await;
    assert!(!listed.is_empty());
    let json = serde_json::to_string(&listed).unwrap();
    assert!(!json.contains("The weather is very nice today"));
    assert!(listed.iter().all(|e| e.has_reference));
  }

  #[tokio::test]
  async fn create_requires_source() {
    let state = state();
    let body = ExerciseIn { title: "t".into(), source: "  ".into(), mt_output: String::new(), reference: String::new(), created_by: String::new() };
    assert!(matches!(create_exercise(&state, body).await, Err(ApiError::InvalidInput(_))));

    let body = ExerciseIn { title: String::new(), source: "Hola".into(), mt_output: String::new(), reference: "Hello".into(), created_by: "prof".into() };
    let ex = create_exercise(&state, body).await.unwrap();
    assert_eq!(get_exercise(&state, &ex.id).await.unwrap().title, ex.title);
  }

  #[tokio::test]
  async fn submit_scores_and_stores() {
    let state = state();
    let out = submit(&state, "ex-weather", attempt("ana", "The weather is very nice today, but it will rain tomorrow.", 0.0))
      .await
      .unwrap();
    assert_eq!(out.report.report.counts.edit_ops, 0);
    assert_eq!(out.report.report.metrics.bleu, Some(100.0));
    assert_eq!(out.points, 35);

    let stored = state.store.get_submission(&out.submission_id).await.unwrap();
    assert_eq!(stored.points, 35);
    assert_eq!(stored.keystrokes, 7);
    assert_eq!(state.store.leaderboard().await[0].student_name, "ana");
  }

  #[tokio::test]
  async fn submit_validates_name_and_exercise() {
    let state = state();
    assert!(matches!(submit(&state, "ex-weather", attempt("  ", "x", 0.0)).await, Err(ApiError::InvalidInput(_))));
    assert!(matches!(submit(&state, "nope", attempt("ana", "x", 0.0)).await, Err(ApiError::ExerciseNotFound(_))));
    assert!(state.store.list_submissions(None).await.is_empty());
  }

  #[tokio::test]
  async fn submit_feedback_reveals_reference_edits_but_drills_do_not() {
    let state = state();
    let out = submit(&state, "ex-weather", attempt("cleo", "It makes very beautiful today, but it will rain tomorrow.", 0.0))
      .await
      .unwrap();
    assert!(out.report.report.examples.replace.contains(&("nice".to_string(), "beautiful".to_string())));
    assert!(out.report.highlight_html.contains("nice"));
    assert!(out.drills.exercises.iter().all(|d| !d.contains("nice")));

    let listed = serde_json::to_string(&list_exercises(&state).await).unwrap();
    assert!(!listed.contains("nice"));
  }

  #[tokio::test]
  async fn detail_rerenders_diff_and_delete_removes() {
    let state = state();
    let out = submit(&state, "ex-weather", attempt("ben", "It makes very beautiful today, but it will rain tomorrow.", 40.0))
      .await
      .unwrap();
    let detail = submission_detail(&state, &out.submission_id).await.unwrap();
    assert_eq!(detail.counts, out.report.report.counts);
    assert!(detail.counts.replaces > 0);
    assert!(detail.highlight_html.contains("edit-replace"));
    assert!(!detail.word_mismatches.is_empty());

    delete_submission(&state, &out.submission_id).await.unwrap();
    assert!(matches!(submission_detail(&state, &out.submission_id).await, Err(ApiError::SubmissionNotFound(_))));
    assert!(matches!(delete_submission(&state, &out.submission_id).await, Err(ApiError::SubmissionNotFound(_))));
  }
}
