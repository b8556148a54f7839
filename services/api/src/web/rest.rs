//! services/api/src/web/rest.rs
//!
//! Contains the health-check handler and the master definition for the
//! OpenAPI specification.

use crate::web::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::error;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        crate::web::auth::register_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::student::weakness_topics_handler,
        crate::web::student::focus_session_questions_handler,
        crate::web::student::submit_focus_session_handler,
        crate::web::student::submit_assignment_handler,
        crate::web::activity::log_activity_handler,
        crate::web::teacher::roster_handler,
        crate::web::teacher::respond_doubt_handler,
        crate::web::teacher::create_assignment_handler,
        crate::web::teacher::question_effectiveness_handler,
    ),
    components(schemas(
        crate::web::auth::RegisterRequest,
        crate::web::auth::LoginRequest,
        crate::web::auth::AuthResponse,
        crate::web::student::ExamSummary,
        crate::web::student::WeaknessTopic,
        crate::web::student::FocusSubmission,
        crate::web::activity::LogActivityRequest,
        crate::web::teacher::RespondDoubtRequest,
        crate::web::teacher::CreateAssignmentRequest,
        crate::web::teacher::QuestionEffectivenessRequest,
        crate::web::teacher::GradeRequest,
    )),
    tags(
        (name = "LearnMatrix API", description = "API endpoints for the gamified exam-practice platform.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET /api/health - verifies database connectivity.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Store reachable"),
        (status = 500, description = "Store unreachable")
    )
)]
pub async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    match state.store.ping().await {
        Ok(()) => Ok(Json(serde_json::json!({ "status": "ok", "db": "reachable" }))),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "status": "error", "db": "unreachable" })),
            ))
        }
    }
}
