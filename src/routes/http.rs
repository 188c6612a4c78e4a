//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::header,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::domain::{Exercise, LeaderboardEntry, Submission};
use crate::error::ApiError;
use crate::logic::{self, Attempt};
use crate::protocol::*;
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, metrics: state.engine.adapter.capabilities() })
}

#[instrument(level = "info", skip(state, body), fields(time_spent = body.time_spent))]
pub async fn http_post_score(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ScoreIn>,
) -> impl IntoResponse {
  let report = logic::score_text(&state, body.reference.as_deref(), body.hypothesis.as_deref(), body.time_spent).await;
  info!(target: "scoring", points = report.report.points, edit_ops = report.report.counts.edit_ops, "HTTP score computed");
  Json(report)
}

pub async fn http_list_exercises(State(state): State<Arc<AppState>>) -> Json<Vec<ExerciseOut>> {
  Json(logic::list_exercises(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_exercise(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<ExerciseOut>, ApiError> {
  logic::get_exercise(&state, &id).await.map(Json)
}

#[instrument(level = "info", skip(state, body), fields(title = %trunc_for_log(&body.title, 40)))]
pub async fn http_post_exercise(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExerciseIn>,
) -> Result<Json<Exercise>, ApiError> {
  logic::create_exercise(&state, body).await.map(Json)
}

#[instrument(level = "info", skip(state, body), fields(student = %trunc_for_log(&body.student_name, 32), text_len = body.text.len()))]
pub async fn http_post_submission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SubmitOut>, ApiError> {
  let keystrokes = body.keystrokes.unwrap_or_else(|| body.text.chars().count());
  let attempt = Attempt {
    student_name: body.student_name,
    kind: body.kind,
    text: body.text,
    time_spent: body.time_spent,
    keystrokes,
  };
  let out = logic::submit(&state, &id, attempt).await?;
  info!(target: "postedit", exercise_id = %id, submission_id = %out.submission_id, points = out.points, "HTTP submission scored");
  Ok(Json(out))
}

pub async fn http_list_submissions(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SubmissionQuery>,
) -> Json<Vec<Submission>> {
  Json(state.store.list_submissions(q.exercise_id.as_deref()).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_submission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SubmissionDetail>, ApiError> {
  logic::submission_detail(&state, &id).await.map(Json)
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_submission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<DeletedOut>, ApiError> {
  logic::delete_submission(&state, &id).await?;
  Ok(Json(DeletedOut { deleted: true }))
}

pub async fn http_leaderboard(State(state): State<Arc<AppState>>) -> Json<Vec<LeaderboardEntry>> {
  Json(state.store.leaderboard().await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_export_csv(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let csv = state.store.export_csv().await;
  (
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
      (header::CONTENT_DISPOSITION, "attachment; filename=\"submissions.csv\""),
    ],
    csv,
  )
}
