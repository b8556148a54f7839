//! services/api/src/web/activity.rs
//!
//! Activity logging. Every focus session, test start/submit, login, and
//! resource view lands here as one append-only row; the study-hour and
//! engagement metrics are all derived from this log.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use learnmatrix_core::domain::{ActivityKind, SessionUser};
use learnmatrix_core::ports::NewActivity;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::gamification::check_and_award_achievements;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct LogActivityRequest {
    pub activity_type: String,
    /// Seconds spent, where the activity has a duration.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub exam_id: Option<Uuid>,
    #[serde(default)]
    pub assignment_id: Option<Uuid>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// POST /api/activity
///
/// Appends one activity row and runs a best-effort achievement check.
#[utoipa::path(
    post,
    path = "/api/activity",
    request_body = LogActivityRequest,
    responses(
        (status = 201, description = "Activity logged"),
        (status = 400, description = "Unknown activity type"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn log_activity_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<LogActivityRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let activity_type = ActivityKind::parse(&req.activity_type).ok_or((
        StatusCode::BAD_REQUEST,
        format!("'{}' is not a valid activity_type", req.activity_type),
    ))?;

    state
        .store
        .insert_activity(NewActivity {
            user_id: user.user_id,
            activity_type,
            duration_secs: req.duration.unwrap_or(0),
            exam_id: req.exam_id,
            assignment_id: req.assignment_id,
            details: req.details.unwrap_or_else(|| serde_json::json!({})),
        })
        .await
        .map_err(|e| {
            error!("Failed to log activity: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to log activity".to_string(),
            )
        })?;

    // New activity can tip an unlock threshold; never fails the request.
    check_and_award_achievements(&state, user.user_id).await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Activity logged successfully" })),
    ))
}

/// GET /api/activity/recent - the caller's five newest activity rows, for
/// the floating recent-activity widget.
pub async fn recent_activity_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = state
        .store
        .recent_activity(user.user_id, 5)
        .await
        .map_err(|e| {
            error!("Failed to load recent activity: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load recent activity".to_string(),
            )
        })?;
    let activities: Vec<serde_json::Value> = entries
        .into_iter()
        .map(|a| {
            serde_json::json!({
                "activityType": a.activity_type.as_str(),
                "duration": a.duration_secs,
                "examId": a.exam_id,
                "assignmentId": a.assignment_id,
                "details": a.details,
                "timestamp": a.recorded_at.format("%Y-%m-%d %H:%M").to_string(),
            })
        })
        .collect();
    Ok(Json(serde_json::json!({ "activities": activities })))
}
