//! Errors surfaced by the HTTP/WebSocket layer.
//!
//! The scoring engine itself never fails; these cover bad requests and
//! lookups of exercises or submissions that do not exist.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Exercise not found: {0}")]
  ExerciseNotFound(String),

  #[error("Submission not found: {0}")]
  SubmissionNotFound(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
      ApiError::ExerciseNotFound(_) | ApiError::SubmissionNotFound(_) => StatusCode::NOT_FOUND,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
  }
}
