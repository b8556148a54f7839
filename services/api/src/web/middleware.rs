//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use learnmatrix_core::domain::{Role, SessionUser};
use std::sync::Arc;
use tracing::error;

use crate::web::state::AppState;

/// Pulls the opaque session id out of a Cookie header value.
pub fn session_id_from_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

/// Middleware that validates the auth session cookie and resolves the acting user.
///
/// If valid, inserts the `SessionUser` into request extensions for handlers to use.
/// If invalid, expired, or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract cookie header
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Parse session ID from cookie
    let auth_session_id =
        session_id_from_cookie(cookie_header).ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Validate auth session in database, resolve the user
    let session_user = state
        .store
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to validate auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    // 4. Insert the session user into request extensions
    req.extensions_mut().insert(session_user);

    // 5. Continue to the handler
    Ok(next.run(req).await)
}

/// Middleware for teacher-only routes. Must run after `require_auth`.
pub async fn require_teacher(req: Request, next: Next) -> Result<Response, StatusCode> {
    let session_user = req
        .extensions()
        .get::<SessionUser>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if session_user.role != Role::Teacher {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::session_id_from_cookie;

    #[test]
    fn finds_session_among_other_cookies() {
        let header = "theme=dark; session=abc-123; lang=en";
        assert_eq!(session_id_from_cookie(header), Some("abc-123"));
    }

    #[test]
    fn missing_or_empty_session_is_none() {
        assert_eq!(session_id_from_cookie("theme=dark"), None);
        assert_eq!(session_id_from_cookie("session="), None);
    }
}
