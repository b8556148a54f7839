//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::PgStore, files::LocalFileStorage},
    config::Config,
    error::ApiError,
    web::{
        activity::{log_activity_handler, recent_activity_handler},
        auth::{login_handler, logout_handler, register_handler},
        downloads::{download_doubt_image_handler, download_submission_handler},
        middleware::{require_auth, require_teacher},
        rest::{health_handler, ApiDoc},
        state::AppState,
        student, teacher,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool.clone()));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Upload Storage Adapter ---
    tokio::fs::create_dir_all(&config.upload_root).await?;
    let files = Arc::new(LocalFileStorage::new(config.upload_root.clone()));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        files,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/api/health", get(health_handler));

    // Routes for any authenticated user
    let protected_routes = Router::new()
        .route("/api/exams", get(student::list_exams_handler))
        .route("/api/student/assignments", get(student::student_assignments_handler))
        .route("/api/student/stats", get(student::student_stats_handler))
        .route("/api/student/analytics", get(student::student_analytics_handler))
        .route("/api/student/performance", get(student::student_performance_handler))
        .route("/api/student/weakness-topics", get(student::weakness_topics_handler))
        .route(
            "/api/student/focus-session/{exam_id}",
            get(student::focus_session_questions_handler),
        )
        .route(
            "/api/student/focus-session/submit",
            post(student::submit_focus_session_handler),
        )
        .route(
            "/api/student/doubts",
            get(student::student_doubts_handler).post(student::submit_doubt_handler),
        )
        .route(
            "/api/student/achievements",
            get(student::student_achievements_handler),
        )
        .route("/api/student/class-stats", get(student::class_stats_handler))
        .route(
            "/api/student/submissions",
            get(student::student_submissions_handler),
        )
        .route(
            "/api/student/submit-assignment",
            post(student::submit_assignment_handler),
        )
        .route("/api/activity", post(log_activity_handler))
        .route("/api/activity/recent", get(recent_activity_handler))
        .route("/uploads/doubts/{file}", get(download_doubt_image_handler))
        .route(
            "/uploads/submissions/{assignment_id}/{file}",
            get(download_submission_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Teacher-only routes; the auth layer runs first, then the role gate
    let teacher_routes = Router::new()
        .route("/api/teacher/roster", get(teacher::roster_handler))
        .route("/api/teacher/stats", get(teacher::teacher_stats_handler))
        .route("/api/teacher/students", get(teacher::all_students_handler))
        .route("/api/teacher/doubts", get(teacher::teacher_doubts_handler))
        .route(
            "/api/teacher/doubts/respond",
            post(teacher::respond_doubt_handler),
        )
        .route(
            "/api/teacher/doubts/frequency",
            get(teacher::doubts_frequency_handler),
        )
        .route(
            "/api/teacher/assignments",
            get(teacher::teacher_assignments_handler).post(teacher::create_assignment_handler),
        )
        .route(
            "/api/teacher/class-analytics",
            get(teacher::class_analytics_handler),
        )
        .route(
            "/api/teacher/analysis/question-effectiveness",
            post(teacher::question_effectiveness_handler),
        )
        .route(
            "/api/teacher/submissions/{assignment_id}",
            get(teacher::assignment_submissions_handler),
        )
        .route(
            "/api/grade-submission/{submission_id}",
            post(teacher::grade_submission_handler),
        )
        .layer(axum_middleware::from_fn(require_teacher))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(teacher_routes)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
