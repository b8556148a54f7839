//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration, login, and logout.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use learnmatrix_core::domain::{ActivityKind, Role};
use learnmatrix_core::ports::{NewActivity, NewUser, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::session_id_from_cookie;
use crate::web::state::AppState;

/// bcrypt work factor for password hashing.
const BCRYPT_COST: u32 = 12;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username or email; either field works.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully"),
        (status = 400, description = "Missing or invalid fields, or duplicate account"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Validate the submitted fields
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Missing required fields".to_string()));
    }
    if req.password.len() < 8 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters".to_string(),
        ));
    }
    let role = match req.role.as_deref() {
        None | Some("") => Role::Student,
        Some(raw) => Role::parse(raw).ok_or((
            StatusCode::BAD_REQUEST,
            format!("'{}' is not a valid role", raw),
        ))?,
    };

    // 2. Hash the password
    let password_hash = bcrypt::hash(&req.password, BCRYPT_COST).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to hash password".to_string(),
        )
    })?;

    // 3. Create the user in the database
    state
        .store
        .create_user(NewUser {
            username,
            email,
            password_hash,
            role,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
        })
        .await
        .map_err(|e| match e {
            PortError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            other => {
                error!("Failed to create user: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create user".to_string(),
                )
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Registration successful! Please login." })),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid username or password"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Accept either username or email as the identifier
    let identifier = req
        .username
        .as_deref()
        .or(req.email.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or((
            StatusCode::BAD_REQUEST,
            "Username/email and password required".to_string(),
        ))?;
    if req.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Username/email and password required".to_string(),
        ));
    }

    // 2. Look the account up
    let creds = state.store.get_credentials(identifier).await.map_err(|e| {
        if !matches!(e, PortError::NotFound(_)) {
            error!("Failed to fetch credentials: {:?}", e);
        }
        (
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".to_string(),
        )
    })?;

    // 3. Verify the password
    let valid = bcrypt::verify(&req.password, &creds.password_hash).map_err(|e| {
        error!("Failed to verify password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;
    if !valid {
        return Err((
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".to_string(),
        ));
    }

    // 4. Record the login
    if let Err(e) = state.store.touch_last_login(creds.user_id).await {
        warn!("Failed to update last login: {:?}", e);
    }
    if let Err(e) = state
        .store
        .insert_activity(NewActivity {
            user_id: creds.user_id,
            activity_type: ActivityKind::Login,
            duration_secs: 0,
            exam_id: None,
            assignment_id: None,
            details: serde_json::json!({}),
        })
        .await
    {
        warn!("Failed to log login activity: {:?}", e);
    }

    // 5. Create the auth session
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    let expires_at = Utc::now() + ttl;
    state
        .store
        .create_auth_session(&auth_session_id, creds.user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create session".to_string(),
            )
        })?;

    // 6. Create the session cookie
    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        ttl.num_seconds()
    );

    // 7. Return response with cookie
    let response = AuthResponse {
        user_id: creds.user_id,
        username: creds.username,
        role: creds.role.as_str().to_string(),
        first_name: creds.first_name,
        last_name: creds.last_name,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Extract session cookie
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    // 2. Parse session ID from cookie
    let auth_session_id = session_id_from_cookie(cookie_header)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    // 3. Delete auth session from database
    state
        .store
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to logout".to_string(),
            )
        })?;

    // 4. Clear cookie
    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}
