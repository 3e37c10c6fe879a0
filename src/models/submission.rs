// src/models/submission.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One answer slot value. Untagged on the wire: a number is a selected
/// option index, a string is long-answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choice(usize),
    Text(String),
}

/// A submission document: one finished (or terminated) exam attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub exam_title: String,

    pub student_name: String,
    pub student_class: Option<String>,
    pub student_id: Option<String>,

    /// One slot per exam question, in question order. `None` is unanswered.
    pub answers: Vec<Option<AnswerValue>>,

    /// Number of focus-loss warnings accumulated during the attempt.
    pub warnings: u32,

    /// False when the attempt was force-terminated by the proctor.
    pub completed: bool,

    pub submitted_at: chrono::DateTime<chrono::Utc>,

    // Grading fields, filled in from the dashboard.
    pub graded: bool,
    pub grades: Option<Vec<u32>>,
    pub comments: Option<Vec<String>>,
    pub total_score: Option<u32>,
    pub max_score: Option<u32>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Listing row for an exam's submissions on the dashboard.
#[derive(Debug, Serialize)]
pub struct SubmissionSummary {
    pub id: Uuid,
    pub student_name: String,
    pub student_class: Option<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub warnings: u32,
    pub completed: bool,
    pub graded: bool,
    pub total_score: Option<u32>,
}

impl From<&Submission> for SubmissionSummary {
    fn from(s: &Submission) -> Self {
        Self {
            id: s.id,
            student_name: s.student_name.clone(),
            student_class: s.student_class.clone(),
            submitted_at: s.submitted_at,
            warnings: s.warnings,
            completed: s.completed,
            graded: s.graded,
            total_score: s.total_score,
        }
    }
}

/// DTO for saving grades on a submission.
#[derive(Debug, Deserialize, Validate)]
pub struct GradeRequest {
    /// One score per question; values above the question's points are clamped.
    #[validate(length(min = 1))]
    pub grades: Vec<u32>,
    /// Optional per-question comments, same length as `grades` when present.
    pub comments: Option<Vec<String>>,
}
