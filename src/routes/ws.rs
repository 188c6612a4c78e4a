//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.
//!
//! Every connection owns a `SessionBook`, so timers and keystroke counters
//! live exactly as long as the student's socket.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic::{self, Attempt};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::{PracticeSession, SessionBook};
use crate::state::AppState;

const TIMER_NOT_STARTED: &str = "Timer not started. Submission recorded with zero time.";

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "postedit", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "postedit", "WebSocket connected");
  let mut book = SessionBook::default();
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "postedit", bytes = txt.len(), "WS message received");
            handle_client_ws(incoming, &state, &mut book).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "postedit", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "postedit", "WebSocket disconnected");
}

async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, book: &mut SessionBook) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartTimer { exercise_id, initial_text } => {
      let session = book.entry(&exercise_id);
      *session = PracticeSession::with_text(initial_text.as_deref().unwrap_or(""));
      session.start_timer();
      debug!(target: "postedit", id = %exercise_id, "WS timer started");
      ServerWsMessage::TimerStarted { exercise_id }
    }

    ClientWsMessage::ResetTimer { exercise_id } => {
      book.entry(&exercise_id).reset();
      ServerWsMessage::TimerReset { exercise_id }
    }

    ClientWsMessage::TextChanged { exercise_id, text } => {
      let keystrokes = book.entry(&exercise_id).record_text(&text);
      ServerWsMessage::Keystrokes { exercise_id, keystrokes }
    }

    ClientWsMessage::Submit { exercise_id, student_name, kind, text } => {
      let (time_spent, keystrokes, warning) = match book.get(&exercise_id) {
        Some(s) if s.timer_running() => (s.elapsed_seconds(), s.keystrokes_or(&text), None),
        Some(s) => (0.0, s.keystrokes_or(&text), Some(TIMER_NOT_STARTED.to_string())),
        None => (0.0, text.chars().count(), Some(TIMER_NOT_STARTED.to_string())),
      };
      let attempt = Attempt { student_name, kind, text, time_spent, keystrokes };
      match logic::submit(state, &exercise_id, attempt).await {
        Ok(mut result) => {
          book.take(&exercise_id);
          result.warning = warning;
          info!(target: "postedit", id = %exercise_id, points = result.points, time_spent, "WS submission scored");
          ServerWsMessage::Submitted { result }
        }
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::Score { reference, hypothesis, time_spent } => {
      let result = logic::score_text(state, reference.as_deref(), hypothesis.as_deref(), time_spent).await;
      ServerWsMessage::Score { result }
    }

    ClientWsMessage::Leaderboard => ServerWsMessage::Leaderboard { entries: state.store.leaderboard().await },
  }
}
