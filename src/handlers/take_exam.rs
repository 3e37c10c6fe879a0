// src/handlers/take_exam.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    handoff::TransferPayload,
    models::{
        exam::{ExamSummary, PublicExam},
        student::RegisterRequest,
    },
    proctor::spawn_session,
    state::AppState,
};

/// Lists exams available to takers (no answer keys in the summaries).
pub async fn list_open_exams(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let exams = state.exams.list().await?;
    let summaries: Vec<ExamSummary> = exams.iter().map(ExamSummary::from).collect();
    Ok(Json(summaries))
}

/// Retrieves the taker-facing view of one exam, answer keys stripped.
pub async fn get_public_exam(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exam = state
        .exams
        .get(id)
        .await
        .map_err(|_| AppError::NotFound("Exam not found".to_string()))?;
    Ok(Json(PublicExam::from(&exam)))
}

/// Registers a student for an exam.
///
/// Validates the student info (name required), snapshots the exam, and
/// offers both through the one-shot handoff channel. The returned token is
/// claimable exactly once by the exam window.
pub async fn register(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let student = payload.into_student();
    if student.name.is_empty() {
        return Err(AppError::BadRequest("Please enter your name".to_string()));
    }

    let exam = state
        .exams
        .get(exam_id)
        .await
        .map_err(|_| AppError::NotFound("Exam not found".to_string()))?;

    let exam_title = exam.title.clone();
    let question_count = exam.questions.len();
    let token = state.handoff.offer(TransferPayload { exam, student });
    tracing::info!(exam = %exam_id, "student registered, handoff offered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "exam_title": exam_title,
            "question_count": question_count,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct OpenWindowRequest {
    pub token: Uuid,
}

#[derive(Debug, Serialize)]
pub struct OpenWindowResponse {
    pub session_id: Uuid,
    pub student_name: String,
    pub exam: PublicExam,
}

/// Opens the exam window: claims the handoff token, spawns the proctoring
/// session, and returns the session id plus the public exam.
///
/// A stale or reused token means the window was opened without a valid
/// handoff; that view is unrecoverable and gets 410 Gone.
pub async fn open_window(
    State(state): State<AppState>,
    Json(payload): Json<OpenWindowRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transfer = state.handoff.claim(payload.token).ok_or_else(|| {
        AppError::MissingTransferData(
            "No exam data for this window; close it and start again from registration"
                .to_string(),
        )
    })?;

    let public_exam = PublicExam::from(&transfer.exam);
    let student_name = transfer.student.name.clone();

    let handle = spawn_session(
        transfer.exam,
        transfer.student,
        state.config.proctor_policy(),
        state.submissions.clone(),
        &state.sessions,
    )
    .await;
    let session_id = handle.id;
    tracing::info!(session = %session_id, "proctoring session started");

    Ok((
        StatusCode::CREATED,
        Json(OpenWindowResponse {
            session_id,
            student_name,
            exam: public_exam,
        }),
    ))
}
