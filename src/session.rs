//! Per-connection practice bookkeeping: a timer and an approximate
//! keystroke counter for each exercise the student has open.
//!
//! Owned by the transport (one `SessionBook` per WebSocket connection).
//! The scoring engine only ever sees the elapsed seconds handed to it.

use std::collections::HashMap;
use std::time::Instant;

use crate::util::round_to;

#[derive(Clone, Debug, Default)]
pub struct PracticeSession {
  started_at: Option<Instant>,
  keystrokes: usize,
  last_text: String,
}

impl PracticeSession {
  /// Start with `initial_text` already in the editor (e.g. the MT draft),
  /// so that loading it is not counted as typing.
  pub fn with_text(initial_text: &str) -> Self {
    Self { last_text: initial_text.to_string(), ..Self::default() }
  }

  pub fn start_timer(&mut self) {
    self.started_at = Some(Instant::now());
  }

  pub fn timer_running(&self) -> bool {
    self.started_at.is_some()
  }

  /// Stop the timer and zero the keystroke counter.
  pub fn reset(&mut self) {
    self.started_at = None;
    self.keystrokes = 0;
  }

  /// Record the editor's current content. Adds the change in length
  /// (in chars) since the previous snapshot to the keystroke count.
  pub fn record_text(&mut self, text: &str) -> usize {
    let prev = self.last_text.chars().count();
    let cur = text.chars().count();
    self.keystrokes += prev.abs_diff(cur);
    self.last_text = text.to_string();
    self.keystrokes
  }

  pub fn keystrokes(&self) -> usize {
    self.keystrokes
  }

  /// Recorded keystrokes, or the text's length when nothing was recorded.
  pub fn keystrokes_or(&self, text: &str) -> usize {
    if self.keystrokes() > 0 { self.keystrokes() } else { text.chars().count() }
  }

  /// Seconds since `start_timer`, rounded to 2 decimals; 0 when never started.
  pub fn elapsed_seconds(&self) -> f64 {
    self.elapsed_since(Instant::now())
  }

  fn elapsed_since(&self, now: Instant) -> f64 {
    match self.started_at {
      Some(start) => round_to(now.saturating_duration_since(start).as_secs_f64(), 2),
      None => 0.0,
    }
  }
}

/// Sessions keyed by exercise id.
#[derive(Debug, Default)]
pub struct SessionBook {
  sessions: HashMap<String, PracticeSession>,
}

impl SessionBook {
  pub fn entry(&mut self, exercise_id: &str) -> &mut PracticeSession {
    self.sessions.entry(exercise_id.to_string()).or_default()
  }

  pub fn get(&self, exercise_id: &str) -> Option<&PracticeSession> {
    self.sessions.get(exercise_id)
  }

  /// Remove and return the session, leaving a fresh one behind on next use.
  pub fn take(&mut self, exercise_id: &str) -> PracticeSession {
    self.sessions.remove(exercise_id).unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[test]
  fn keystrokes_accumulate_length_deltas() {
    let mut s = PracticeSession::with_text("hello");
    assert_eq!(s.record_text("hello world"), 6);
    assert_eq!(s.record_text("hello"), 12);
    assert_eq!(s.record_text("héllo"), 12);
    assert_eq!(s.keystrokes_or("anything"), 12);
  }

  #[test]
  fn keystrokes_fall_back_to_text_length() {
    let s = PracticeSession::default();
    assert_eq!(s.keystrokes_or("añb"), 3);
  }

  #[test]
  fn timer_reports_elapsed_and_resets() {
    let mut s = PracticeSession::default();
    assert_eq!(s.elapsed_seconds(), 0.0);

    s.start_timer();
    assert!(s.timer_running());
    let start = s.started_at.unwrap();
    assert_eq!(s.elapsed_since(start + Duration::from_millis(12_250)), 12.25);

    s.record_text("abc");
    s.reset();
    assert!(!s.timer_running());
    assert_eq!(s.keystrokes(), 0);
    assert_eq!(s.elapsed_seconds(), 0.0);
  }

  #[test]
  fn book_tracks_sessions_per_exercise() {
    let mut book = SessionBook::default();
    book.entry("e1").record_text("abcd");
    book.entry("e2").record_text("xy");
    assert_eq!(book.get("e1").map(|s| s.keystrokes()), Some(4));

    let taken = book.take("e1");
    assert_eq!(taken.keystrokes(), 4);
    assert!(book.get("e1").is_none());
    assert_eq!(book.take("missing").keystrokes(), 0);
  }
}
