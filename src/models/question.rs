// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Question kind, matching the document format used by the authoring UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Multiple choice: answered with a selected option index.
    Mcq,
    /// Long answer: answered with free text, graded by hand.
    Long,
}

/// A single question inside a stored exam document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Mapped to `type` on the wire since `type` is a reserved keyword in Rust.
    #[serde(rename = "type")]
    pub kind: QuestionKind,

    pub text: String,

    /// Maximum score for this question, >= 1.
    pub points: u32,

    /// Options in display order (MCQ only, empty for long answer).
    #[serde(default)]
    pub options: Vec<String>,

    /// Index into `options` of the correct answer (MCQ only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<usize>,
}

/// DTO for sending a question to an exam taker (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub text: String,
    pub points: u32,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            kind: q.kind,
            text: q.text.clone(),
            points: q.points,
            options: q.options.clone(),
        }
    }
}

/// DTO for a question inside a create-exam request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_question))]
pub struct QuestionDraft {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    pub points: u32,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_option: Option<usize>,
}

fn validate_question(draft: &QuestionDraft) -> Result<(), validator::ValidationError> {
    if draft.points < 1 {
        return Err(validator::ValidationError::new("points_must_be_positive"));
    }
    match draft.kind {
        QuestionKind::Mcq => {
            if draft.options.len() < 2 {
                return Err(validator::ValidationError::new("mcq_needs_two_options"));
            }
            if draft.options.iter().any(|opt| opt.trim().is_empty()) {
                return Err(validator::ValidationError::new("option_cannot_be_empty"));
            }
            if draft.options.iter().any(|opt| opt.len() > 500) {
                return Err(validator::ValidationError::new("option_too_long"));
            }
            match draft.correct_option {
                Some(idx) if idx < draft.options.len() => {}
                _ => {
                    return Err(validator::ValidationError::new(
                        "correct_option_out_of_range",
                    ));
                }
            }
        }
        QuestionKind::Long => {
            if !draft.options.is_empty() {
                return Err(validator::ValidationError::new(
                    "long_answer_has_no_options",
                ));
            }
        }
    }
    Ok(())
}

impl From<QuestionDraft> for Question {
    fn from(draft: QuestionDraft) -> Self {
        let correct_option = match draft.kind {
            QuestionKind::Mcq => draft.correct_option,
            QuestionKind::Long => None,
        };
        Self {
            kind: draft.kind,
            text: draft.text,
            points: draft.points,
            options: draft.options,
            correct_option,
        }
    }
}
