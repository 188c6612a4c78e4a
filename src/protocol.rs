//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Exercise, LeaderboardEntry, Submission, SubmissionKind};
use crate::engine::classify::{EditCounts, EditExamples, Highlight};
use crate::engine::SubmissionReport;
use crate::practice::Drills;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartTimer {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
        /// Text already in the editor (e.g. the MT draft); not counted as typing.
        #[serde(default, rename = "initialText")]
        initial_text: Option<String>,
    },
    ResetTimer {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
    },
    TextChanged {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
        text: String,
    },
    Submit {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
        #[serde(rename = "studentName")]
        student_name: String,
        #[serde(default)]
        kind: SubmissionKind,
        text: String,
    },
    Score {
        #[serde(default)]
        reference: Option<String>,
        #[serde(default)]
        hypothesis: Option<String>,
        #[serde(default, rename = "timeSpent")]
        time_spent: f64,
    },
    Leaderboard,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    TimerStarted {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
    },
    TimerReset {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
    },
    Keystrokes {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
        keystrokes: usize,
    },
    Submitted {
        result: SubmitOut,
    },
    Score {
        result: ReportOut,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    Error {
        message: String,
    },
}

/// Student-facing view of an exercise: the reference is never included.
#[derive(Debug, Serialize)]
pub struct ExerciseOut {
    pub id: String,
    pub title: String,
    pub source: String,
    pub mt_output: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub has_reference: bool,
}

/// Convert full `Exercise` (internal) to the public DTO.
pub fn to_out(e: &Exercise) -> ExerciseOut {
    ExerciseOut {
        id: e.id.clone(),
        title: e.title.clone(),
        source: e.source.clone(),
        mt_output: e.mt_output.clone(),
        created_by: e.created_by.clone(),
        created_at: e.created_at,
        has_reference: e.has_reference(),
    }
}

/// A scoring report plus ready-to-render highlight strings.
#[derive(Debug, Serialize)]
pub struct ReportOut {
    #[serde(flatten)]
    pub report: SubmissionReport,
    pub highlight_html: String,
    pub highlight_text: String,
}

impl From<SubmissionReport> for ReportOut {
    fn from(report: SubmissionReport) -> Self {
        let highlight_html = report.highlight.to_html();
        let highlight_text = report.highlight.to_marked_text();
        Self { report, highlight_html, highlight_text }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreIn {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub hypothesis: Option<String>,
    #[serde(default)]
    pub time_spent: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseIn {
    #[serde(default)]
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub mt_output: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIn {
    pub student_name: String,
    #[serde(default)]
    pub kind: SubmissionKind,
    pub text: String,
    #[serde(default)]
    pub time_spent: f64,
    #[serde(default)]
    pub keystrokes: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SubmitOut {
    pub submission_id: String,
    pub points: u32,
    pub time_spent: f64,
    pub keystrokes: usize,
    pub report: ReportOut,
    pub drills: Drills,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionQuery {
    #[serde(rename = "exerciseId")]
    pub exercise_id: Option<String>,
}

/// Instructor view of one stored submission, with the diff re-rendered
/// against the exercise's reference.
#[derive(Debug, Serialize)]
pub struct SubmissionDetail {
    pub submission: Submission,
    pub exercise: Option<Exercise>,
    pub counts: EditCounts,
    pub examples: EditExamples,
    pub highlight: Highlight,
    pub highlight_html: String,
    pub word_mismatches: Vec<String>,
}

#[derive(Serialize)]
pub struct DeletedOut {
    pub deleted: bool,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub metrics: Vec<crate::engine::metrics::Capability>,
}
