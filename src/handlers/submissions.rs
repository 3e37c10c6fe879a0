// src/handlers/submissions.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::submission::{GradeRequest, SubmissionSummary},
    state::AppState,
};

/// Lists all submissions for one exam, newest first (dashboard table).
pub async fn list_for_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // Surface a 404 for a bogus exam id rather than an empty list.
    state
        .exams
        .get(exam_id)
        .await
        .map_err(|_| AppError::NotFound("Exam not found".to_string()))?;

    let submissions = state.submissions.list_for_exam(exam_id).await?;
    let summaries: Vec<SubmissionSummary> = submissions.iter().map(SubmissionSummary::from).collect();
    Ok(Json(summaries))
}

/// Retrieves a single submission with its answers and grading state.
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let submission = state
        .submissions
        .get(id)
        .await
        .map_err(|_| AppError::NotFound("Submission not found".to_string()))?;
    Ok(Json(submission))
}

/// Saves grades for a submission.
///
/// * One score per question, clamped to that question's points.
/// * Derives `total_score` and `max_score`, marks the submission graded.
pub async fn grade_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut submission = state
        .submissions
        .get(id)
        .await
        .map_err(|_| AppError::NotFound("Submission not found".to_string()))?;

    let exam = state.exams.get(submission.exam_id).await.map_err(|e| {
        tracing::error!("Exam missing for submission {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    if payload.grades.len() != exam.questions.len() {
        return Err(AppError::BadRequest(format!(
            "Expected {} grades, got {}",
            exam.questions.len(),
            payload.grades.len()
        )));
    }
    if let Some(comments) = &payload.comments {
        if comments.len() != exam.questions.len() {
            return Err(AppError::BadRequest(format!(
                "Expected {} comments, got {}",
                exam.questions.len(),
                comments.len()
            )));
        }
    }

    let grades: Vec<u32> = payload
        .grades
        .iter()
        .zip(&exam.questions)
        .map(|(&grade, question)| grade.min(question.points))
        .collect();
    let total_score: u32 = grades.iter().sum();
    let max_score = exam.max_score();

    submission.grades = Some(grades);
    submission.comments = payload.comments;
    submission.total_score = Some(total_score);
    submission.max_score = Some(max_score);
    submission.graded = true;
    submission.graded_at = Some(chrono::Utc::now());

    state.submissions.update(submission.clone()).await.map_err(|e| {
        tracing::error!("Failed to save grades for {}: {:?}", id, e);
        AppError::from(e)
    })?;
    tracing::info!(submission = %id, total_score, max_score, "grades saved");

    Ok(Json(submission))
}
