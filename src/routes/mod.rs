//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/score", post(http::http_post_score))
        .route("/api/v1/exercises", get(http::http_list_exercises).post(http::http_post_exercise))
        .route("/api/v1/exercises/:id", get(http::http_get_exercise))
        .route("/api/v1/exercises/:id/submissions", post(http::http_post_submission))
        .route("/api/v1/submissions", get(http::http_list_submissions))
        .route(
            "/api/v1/submissions/:id",
            get(http::http_get_submission).delete(http::http_delete_submission),
        )
        .route("/api/v1/leaderboard", get(http::http_leaderboard))
        .route("/api/v1/export.csv", get(http::http_export_csv))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::TrainerConfig;

    fn app() -> Router {
        build_router(Arc::new(AppState::from_parts(TrainerConfig::default(), None)))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_lists_lexical_metrics() {
        let (status, body) = send(&app(), Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["metrics"], json!(["ngram_precision", "char_ngram", "edit_rate"]));
    }

    #[tokio::test]
    async fn score_endpoint_returns_report() {
        let app = app();
        let payload = json!({ "reference": "the cat sat", "hypothesis": "the dog sat", "timeSpent": 0 });
        let (status, body) = send(&app, Method::POST, "/api/v1/score", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["counts"]["replaces"], 1);
        assert_eq!(body["examples"]["replace"], json!([["cat", "dog"]]));
        assert!(body["highlight_text"].as_str().unwrap().contains("[cat→dog]"));
    }

    #[tokio::test]
    async fn exercise_and_submission_lifecycle() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/api/v1/exercises/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/exercises",
            Some(json!({ "title": "Greeting", "source": "Hola mundo", "reference": "Hello world" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ex_id = created["id"].as_str().unwrap().to_string();

        let (_, listed) = send(&app, Method::GET, "/api/v1/exercises", None).await;
        assert!(listed.as_array().unwrap().iter().all(|e| e.get("reference").is_none()));

        let uri = format!("/api/v1/exercises/{}/submissions", ex_id);
        let (status, _) = send(&app, Method::POST, &uri, Some(json!({ "studentName": "", "text": "Hello" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, out) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "studentName": "ana", "kind": "new_translation", "text": "Hello world", "timeSpent": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let sub_id = out["submission_id"].as_str().unwrap().to_string();

        let (_, subs) = send(&app, Method::GET, &format!("/api/v1/submissions?exerciseId={}", ex_id), None).await;
        assert_eq!(subs.as_array().unwrap().len(), 1);

        let (_, board) = send(&app, Method::GET, "/api/v1/leaderboard", None).await;
        assert_eq!(board[0]["student_name"], "ana");
        assert_eq!(board[0]["rank"], 1);

        let detail_uri = format!("/api/v1/submissions/{}", sub_id);
        let (status, detail) = send(&app, Method::GET, &detail_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["counts"]["edit_ops"], 0);

        let (status, deleted) = send(&app, Method::DELETE, &detail_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["deleted"], true);
        let (status, _) = send(&app, Method::DELETE, &detail_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn csv_export_has_header_and_content_type() {
        let app = app();
        let res = app
            .oneshot(Request::builder().uri("/api/v1/export.csv").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8(bytes.to_vec()).unwrap().starts_with(crate::store::CSV_HEADER));
    }
}
