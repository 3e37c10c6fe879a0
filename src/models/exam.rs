// src/models/exam.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::{PublicQuestion, Question, QuestionDraft};

/// An exam document in the exam store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Exam {
    /// Sum of every question's points, the maximum attainable score.
    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

/// DTO for creating a new exam from the dashboard.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionDraft>,
}

impl CreateExamRequest {
    pub fn into_exam(self) -> Exam {
        Exam {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            questions: self.questions.into_iter().map(Question::from).collect(),
            created_at: chrono::Utc::now(),
        }
    }
}

/// Dashboard listing row for an exam.
#[derive(Debug, Serialize)]
pub struct ExamSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub question_count: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Exam> for ExamSummary {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title.clone(),
            description: exam.description.clone(),
            question_count: exam.questions.len(),
            created_at: exam.created_at,
        }
    }
}

/// DTO for sending an exam to a taker (answer keys stripped).
#[derive(Debug, Serialize)]
pub struct PublicExam {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Exam> for PublicExam {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title.clone(),
            description: exam.description.clone(),
            questions: exam.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}
