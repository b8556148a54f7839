//! services/api/src/web/downloads.rs
//!
//! Authorized download of stored uploads. Files are streamed rather than
//! buffered; authorization is checked against the owning row before any
//! disk access.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};
use learnmatrix_core::domain::{Role, SessionUser};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::error;
use uuid::Uuid;

use crate::web::state::AppState;

async fn stream_file(
    state: &Arc<AppState>,
    relative_path: &str,
    download_name: &str,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let absolute = state
        .files
        .resolve(relative_path)
        .map_err(|_| (StatusCode::NOT_FOUND, "File not found".to_string()))?;
    let file = tokio::fs::File::open(&absolute)
        .await
        .map_err(|_| (StatusCode::NOT_FOUND, "File not found".to_string()))?;

    let stream = ReaderStream::new(file);
    let disposition = format!("attachment; filename=\"{}\"", download_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(stream),
    ))
}

/// GET /uploads/doubts/{file}
///
/// A doubt image may be read by the student who raised the doubt or by a
/// teacher whose roster includes that student.
pub async fn download_doubt_image_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let relative = format!("doubts/{}", file);
    let doubt = state
        .store
        .doubt_for_image(&relative)
        .await
        .map_err(|e| {
            error!("Failed to look up doubt image: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error downloading file".to_string(),
            )
        })?
        .ok_or((StatusCode::NOT_FOUND, "File not found".to_string()))?;

    let mut allowed = doubt.student_id == user.user_id;
    if !allowed && user.role == Role::Teacher {
        allowed = state
            .store
            .doubt_belongs_to_roster(doubt.doubt_id, user.user_id)
            .await
            .map_err(|e| {
                error!("Failed to authorize doubt image: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error downloading file".to_string(),
                )
            })?;
    }
    if !allowed {
        return Err((StatusCode::FORBIDDEN, "Unauthorized".to_string()));
    }

    stream_file(&state, &relative, &file).await
}

/// GET /uploads/submissions/{assignment_id}/{file}
///
/// A submission may be read by the student who owns the assignment or by
/// the teacher who set it.
pub async fn download_submission_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path((assignment_id, file)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let allowed = state
        .store
        .can_access_assignment_files(assignment_id, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to authorize submission download: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error downloading file".to_string(),
            )
        })?;
    if !allowed {
        return Err((StatusCode::FORBIDDEN, "Unauthorized".to_string()));
    }

    let relative = format!("submissions/{}/{}", assignment_id, file);
    stream_file(&state, &relative, &file).await
}
