// src/handlers/exams.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::exam::{CreateExamRequest, ExamSummary},
    state::AppState,
};

/// Creates a new exam from the dashboard.
///
/// Validates title, question texts, points, and MCQ option/answer-key shape
/// before storing. Returns 201 Created with the full exam document.
pub async fn create_exam(
    State(state): State<AppState>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let exam = payload.into_exam();
    let id = state.exams.put(exam.clone()).await.map_err(|e| {
        tracing::error!("Failed to store exam: {:?}", e);
        AppError::from(e)
    })?;
    tracing::info!(exam = %id, "exam created");

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Lists all exams for the dashboard, newest first.
pub async fn list_exams(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let exams = state.exams.list().await?;
    let summaries: Vec<ExamSummary> = exams.iter().map(ExamSummary::from).collect();
    Ok(Json(summaries))
}

/// Retrieves a single exam by ID, including answer keys (dashboard side).
pub async fn get_exam(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exam = state
        .exams
        .get(id)
        .await
        .map_err(|_| AppError::NotFound("Exam not found".to_string()))?;
    Ok(Json(exam))
}
