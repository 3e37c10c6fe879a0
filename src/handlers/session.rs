// src/handlers/session.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::submission::AnswerValue,
    proctor::{SessionEntry, SessionError, SessionEvent, SessionView, SubmitError},
    state::AppState,
};

/// Wire form of a session event posted by the exam window.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventRequest {
    /// The window lost focus.
    Blur,
    /// The window regained focus.
    Focus,
    /// The current question's answer changed.
    Answer { value: AnswerValue },
    /// The taker moved to another question.
    Navigate { question: usize },
}

impl From<EventRequest> for SessionEvent {
    fn from(req: EventRequest) -> Self {
        match req {
            EventRequest::Blur => SessionEvent::Blur,
            EventRequest::Focus => SessionEvent::Focus,
            EventRequest::Answer { value } => SessionEvent::Answer(value),
            EventRequest::Navigate { question } => SessionEvent::Navigate(question),
        }
    }
}

async fn lookup(state: &AppState, id: Uuid) -> Result<SessionEntry, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

fn closed_error(view: &SessionView) -> SessionError {
    if view.terminated {
        SessionError::Terminated
    } else {
        SessionError::Submitted
    }
}

fn map_submit_error(err: SubmitError) -> AppError {
    match err {
        SubmitError::Session(e) => AppError::from(e),
        SubmitError::Write(e) => AppError::from(e),
        SubmitError::Gone => AppError::Conflict("Session is no longer running".to_string()),
    }
}

/// Feeds one focus/blur/answer/navigate event to a session and returns the
/// updated snapshot.
pub async fn post_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = match lookup(&state, id).await? {
        SessionEntry::Live(handle) => handle
            .event(SessionEvent::from(payload))
            .await
            .map_err(map_submit_error)?,
        // The window keeps reporting focus changes for a moment after the
        // attempt ends; answer them with the final snapshot instead of an
        // error. Anything that would mutate the attempt is a conflict.
        SessionEntry::Finished(view) => match payload {
            EventRequest::Blur | EventRequest::Focus => view,
            EventRequest::Answer { .. } | EventRequest::Navigate { .. } => {
                return Err(AppError::from(closed_error(&view)));
            }
        },
    };
    Ok(Json(view))
}

/// Returns the live snapshot of a session (focus state, warnings, grace
/// countdown, terminal flags).
pub async fn snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = match lookup(&state, id).await? {
        SessionEntry::Live(handle) => handle.snapshot().await.map_err(map_submit_error)?,
        SessionEntry::Finished(view) => view,
    };
    Ok(Json(view))
}

/// Manual submission from the last question.
///
/// On a store write failure the session stays active and this endpoint can
/// simply be called again; no answer data is lost between attempts.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = match lookup(&state, id).await? {
        SessionEntry::Live(handle) => handle,
        SessionEntry::Finished(view) => return Err(AppError::from(closed_error(&view))),
    };
    let submission_id = handle.submit().await.map_err(|e| {
        if matches!(e, SubmitError::Write(_)) {
            tracing::warn!(session = %id, "submission write failed, client may retry");
        }
        map_submit_error(e)
    })?;

    Ok(Json(json!({
        "submission_id": submission_id,
        "message": "Exam submitted successfully",
    })))
}
