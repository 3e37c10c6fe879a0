// src/routes.rs

use axum::{
    Router, http::Method,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{exams, session, submissions, take_exam},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (exams, take-exam, sessions, submissions).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (stores, session registry, handoff channel).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Dashboard side: full exam documents and grading.
    let exam_routes = Router::new()
        .route("/", get(exams::list_exams).post(exams::create_exam))
        .route("/{id}", get(exams::get_exam))
        .route("/{id}/submissions", get(submissions::list_for_exam));

    // Taker side: public exam views, registration, window handoff.
    let take_exam_routes = Router::new()
        .route("/", get(take_exam::list_open_exams))
        .route("/window", post(take_exam::open_window))
        .route("/{id}", get(take_exam::get_public_exam))
        .route("/{id}/register", post(take_exam::register));

    // Live proctoring sessions.
    let session_routes = Router::new()
        .route("/{id}", get(session::snapshot))
        .route("/{id}/events", post(session::post_event))
        .route("/{id}/submit", post(session::submit));

    let submission_routes = Router::new()
        .route("/{id}", get(submissions::get_submission))
        .route("/{id}/grade", put(submissions::grade_submission));

    Router::new()
        .nest("/api/exams", exam_routes)
        .nest("/api/take-exam", take_exam_routes)
        .nest("/api/sessions", session_routes)
        .nest("/api/submissions", submission_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
