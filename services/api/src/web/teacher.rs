//! services/api/src/web/teacher.rs
//!
//! Axum handlers for the teacher-facing API: the engagement roster, class
//! statistics and analytics, doubt resolution, assignment management,
//! question-effectiveness analysis, and submission grading.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, NaiveDate, Utc};
use learnmatrix_core::analytics;
use learnmatrix_core::domain::SessionUser;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;
use crate::web::student::round2;

fn internal(context: &str, e: impl std::fmt::Debug) -> (StatusCode, String) {
    error!("{context}: {e:?}");
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Rosters smaller than this fall back to listing every student, which
/// keeps the page useful on sparsely seeded deployments.
const ROSTER_FALLBACK_THRESHOLD: usize = 5;

//=========================================================================================
// Engagement Roster
//=========================================================================================

/// GET /api/teacher/roster
///
/// Every assigned student with their engagement score
/// (`hours*0.3 + completionRate*0.004 + trophies*10`), highest first.
#[utoipa::path(
    get,
    path = "/api/teacher/roster",
    responses(
        (status = 200, description = "Students ranked by engagement score"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not a teacher"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn roster_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut students = state
        .store
        .assigned_students(user.user_id)
        .await
        .map_err(|e| internal("Failed to load roster", e))?;

    // With a near-empty roster, show the whole student body instead.
    let assigned_mode = students.len() >= ROSTER_FALLBACK_THRESHOLD;
    if !assigned_mode {
        students = state
            .store
            .all_students()
            .await
            .map_err(|e| internal("Failed to load roster", e))?;
    }

    let month_ago = Utc::now() - Duration::days(30);
    let mut roster = Vec::with_capacity(students.len());
    for student in students {
        let focus_secs = state
            .store
            .focus_seconds_since(student.user_id, month_ago)
            .await
            .map_err(|e| internal("Failed to load roster", e))?;
        let study_hours = focus_secs as f64 / 3600.0;

        let scope = assigned_mode.then_some(user.user_id);
        let counts = state
            .store
            .assignment_counts(student.user_id, scope)
            .await
            .map_err(|e| internal("Failed to load roster", e))?;
        let completion_rate = analytics::smoothed_completion_rate(counts.completed, counts.total);

        let trophy_count = state
            .store
            .trophy_count(student.user_id)
            .await
            .map_err(|e| internal("Failed to load roster", e))?;

        let engagement = analytics::engagement_score(study_hours, completion_rate, trophy_count);
        roster.push(serde_json::json!({
            "studentId": student.user_id,
            "name": student.full_name(),
            "username": student.username,
            "engagementScore": round2(engagement),
            "studyHours": round1(study_hours),
            "completionRate": round1(completion_rate),
            "trophyCount": trophy_count,
            "scoreLevel": analytics::score_level(engagement),
        }));
    }

    roster.sort_by(|a, b| {
        let score = |v: &serde_json::Value| v["engagementScore"].as_f64().unwrap_or(0.0);
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(Json(serde_json::json!({ "students": roster })))
}

/// GET /api/teacher/stats - headline numbers for the teacher dashboard.
pub async fn teacher_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let total_students = state
        .store
        .count_assigned_students(user.user_id)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;
    let focus_secs = state
        .store
        .roster_focus_seconds(user.user_id)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;
    let counts = state
        .store
        .assignment_counts_for_teacher(user.user_id)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;
    let completion_rate = analytics::smoothed_completion_rate(counts.completed, counts.total);
    let pending_doubts = state
        .store
        .pending_doubts_count(user.user_id)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;

    Ok(Json(serde_json::json!({
        "totalStudents": total_students,
        "totalStudyHours": round2(focus_secs as f64 / 3600.0),
        "completionRate": round1(completion_rate),
        "pendingDoubts": pending_doubts,
    })))
}

/// GET /api/teacher/students - every student in the system with their
/// performance metrics, best average first.
pub async fn all_students_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let students = state
        .store
        .all_students()
        .await
        .map_err(|e| internal("Failed to load students", e))?;

    let mut rows = Vec::with_capacity(students.len());
    for student in students {
        let study_secs = state
            .store
            .total_focus_seconds(student.user_id)
            .await
            .map_err(|e| internal("Failed to load students", e))?;
        let total_secs = state
            .store
            .total_activity_seconds(student.user_id)
            .await
            .map_err(|e| internal("Failed to load students", e))?;
        let avg_score = state
            .store
            .average_score(student.user_id)
            .await
            .map_err(|e| internal("Failed to load students", e))?
            .unwrap_or(0.0);
        let counts = state
            .store
            .assignment_counts(student.user_id, None)
            .await
            .map_err(|e| internal("Failed to load students", e))?;
        let achievements = state
            .store
            .trophy_count(student.user_id)
            .await
            .map_err(|e| internal("Failed to load students", e))?;

        rows.push(serde_json::json!({
            "studentId": student.user_id,
            "name": student.full_name(),
            "username": student.username,
            "studyHours": round2(study_secs as f64 / 3600.0),
            "totalTime": round2(total_secs as f64 / 3600.0),
            "avgScore": round2(avg_score),
            "completedAssignments": counts.completed,
            "achievements": achievements,
            "joinDate": student.created_at.format("%Y-%m-%d").to_string(),
            "performanceLevel": analytics::performance_level(avg_score),
        }));
    }

    rows.sort_by(|a, b| {
        let score = |v: &serde_json::Value| v["avgScore"].as_f64().unwrap_or(0.0);
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(Json(serde_json::json!({ "students": rows })))
}

//=========================================================================================
// Doubts
//=========================================================================================

/// GET /api/teacher/doubts - every doubt raised by the teacher's roster,
/// pending first, then in-progress, then cleared.
pub async fn teacher_doubts_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rows = state
        .store
        .doubts_for_roster(user.user_id)
        .await
        .map_err(|e| internal("Failed to load doubts", e))?;
    let doubts: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            serde_json::json!({
                "doubtId": r.doubt.doubt_id,
                "studentId": r.doubt.student_id,
                "studentName": r.student_name,
                "topic": r.doubt.topic,
                "doubtText": r.doubt.doubt_text,
                "priority": r.doubt.priority.as_str(),
                "status": r.doubt.status.as_str(),
                "resolution": r.doubt.resolution_text,
                "createdAt": r.doubt.created_at.format("%Y-%m-%d %H:%M").to_string(),
                "imagePath": r.doubt.image_path.unwrap_or_default(),
            })
        })
        .collect();
    Ok(Json(serde_json::json!({ "doubts": doubts })))
}

#[derive(Deserialize, ToSchema)]
pub struct RespondDoubtRequest {
    pub doubt_id: Uuid,
    pub resolution: String,
}

/// POST /api/teacher/doubts/respond
///
/// Sets the resolution text, claims the doubt for this teacher, and marks
/// it Cleared. 404 unless the doubt was raised by one of the teacher's
/// own students.
#[utoipa::path(
    post,
    path = "/api/teacher/doubts/respond",
    request_body = RespondDoubtRequest,
    responses(
        (status = 200, description = "Doubt resolved"),
        (status = 400, description = "Missing fields"),
        (status = 404, description = "Doubt not found or not this teacher's student"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn respond_doubt_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<RespondDoubtRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let resolution = req.resolution.trim();
    if resolution.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "doubt_id and resolution are required".to_string(),
        ));
    }

    let owned = state
        .store
        .doubt_belongs_to_roster(req.doubt_id, user.user_id)
        .await
        .map_err(|e| internal("Failed to resolve doubt", e))?;
    if !owned {
        return Err((
            StatusCode::NOT_FOUND,
            "Doubt not found or not authorized".to_string(),
        ));
    }

    state
        .store
        .resolve_doubt(req.doubt_id, user.user_id, resolution)
        .await
        .map_err(|e| internal("Failed to resolve doubt", e))?;

    Ok(Json(serde_json::json!({ "message": "Doubt resolved successfully" })))
}

/// GET /api/teacher/doubts/frequency - doubt counts per topic, most
/// doubted first.
pub async fn doubts_frequency_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rows = state
        .store
        .doubt_frequency(user.user_id)
        .await
        .map_err(|e| internal("Failed to load doubt frequency", e))?;
    let doubts: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| serde_json::json!({ "topic": r.topic, "count": r.count }))
        .collect();
    Ok(Json(serde_json::json!({ "doubtsByTopic": doubts })))
}

//=========================================================================================
// Assignments
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateAssignmentRequest {
    pub exam_id: Uuid,
    /// Explicit students; empty means "everyone I teach" (or every active
    /// student when the roster is still empty).
    #[serde(default)]
    pub student_ids: Vec<Uuid>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// POST /api/teacher/assignments
///
/// Assigns an exam to students; (teacher, student, exam) pairs that
/// already exist are skipped rather than duplicated.
#[utoipa::path(
    post,
    path = "/api/teacher/assignments",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignments created"),
        (status = 400, description = "Missing exam or students"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_assignment_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut student_ids = req.student_ids;
    if student_ids.is_empty() {
        student_ids = state
            .store
            .assigned_student_ids(user.user_id)
            .await
            .map_err(|e| internal("Failed to create assignments", e))?;
    }
    if student_ids.is_empty() {
        student_ids = state
            .store
            .all_students()
            .await
            .map_err(|e| internal("Failed to create assignments", e))?
            .into_iter()
            .map(|s| s.user_id)
            .collect();
    }
    if student_ids.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "exam_id and student_ids are required".to_string(),
        ));
    }

    let mut created_count = 0;
    for student_id in student_ids {
        let created = state
            .store
            .create_assignment_if_absent(user.user_id, student_id, req.exam_id, req.due_date)
            .await
            .map_err(|e| internal("Failed to create assignments", e))?;
        if created {
            created_count += 1;
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": format!("Assignment created and assigned to {} students", created_count),
            "studentCount": created_count,
        })),
    ))
}

/// GET /api/teacher/assignments - assignment batches with completion rates.
pub async fn teacher_assignments_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rows = state
        .store
        .teacher_assignment_rows(user.user_id)
        .await
        .map_err(|e| internal("Failed to load assignments", e))?;
    let assignments: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            let completion_rate = if r.student_count > 0 {
                r.completed_count as f64 / r.student_count as f64 * 100.0
            } else {
                0.0
            };
            serde_json::json!({
                "examId": r.exam_id,
                "title": r.exam_name,
                "dueDate": r.due_date.map(|d| d.to_string()).unwrap_or_else(|| "No deadline".to_string()),
                "studentCount": r.student_count,
                "completedCount": r.completed_count,
                "completionRate": round1(completion_rate),
            })
        })
        .collect();
    Ok(Json(serde_json::json!({ "assignments": assignments })))
}

//=========================================================================================
// Class Analytics & Question Effectiveness
//=========================================================================================

/// GET /api/teacher/class-analytics - score distribution, top students,
/// and the completion trend of recent assignment batches.
pub async fn class_analytics_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let buckets = state
        .store
        .score_distribution(user.user_id)
        .await
        .map_err(|e| internal("Failed to load class analytics", e))?;
    let top = state
        .store
        .top_students(user.user_id, 5)
        .await
        .map_err(|e| internal("Failed to load class analytics", e))?;
    let trend = state
        .store
        .assignment_completion_trend(user.user_id, 10)
        .await
        .map_err(|e| internal("Failed to load class analytics", e))?;

    let mut distribution = serde_json::Map::new();
    for bucket in buckets {
        distribution.insert(bucket.range, serde_json::json!(bucket.count));
    }

    Ok(Json(serde_json::json!({
        "performanceDistribution": distribution,
        "topStudents": top.iter().map(|s| serde_json::json!({
            "name": s.name,
            "avgScore": round2(s.avg_score),
        })).collect::<Vec<_>>(),
        "assignmentTrend": trend.iter().map(|r| {
            let completion_rate = if r.student_count > 0 {
                r.completed_count as f64 / r.student_count as f64 * 100.0
            } else {
                0.0
            };
            serde_json::json!({
                "title": r.exam_name,
                "completed": r.completed_count,
                "total": r.student_count,
                "completionRate": round1(completion_rate),
            })
        }).collect::<Vec<_>>(),
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct QuestionEffectivenessRequest {
    pub exam_id: Uuid,
}

/// POST /api/teacher/analysis/question-effectiveness
///
/// Success rate and average completion time per question of an exam,
/// scoped to this teacher's students, hardest question first.
#[utoipa::path(
    post,
    path = "/api/teacher/analysis/question-effectiveness",
    request_body = QuestionEffectivenessRequest,
    responses(
        (status = 200, description = "Questions ranked hardest first"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not a teacher"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn question_effectiveness_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<QuestionEffectivenessRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rows = state
        .store
        .question_attempts(req.exam_id, user.user_id)
        .await
        .map_err(|e| internal("Failed to analyze questions", e))?;

    let analysis: Vec<serde_json::Value> = analytics::analyze_question_effectiveness(rows)
        .into_iter()
        .map(|q| {
            serde_json::json!({
                "questionId": q.question_id,
                "questionText": truncate_text(&q.question_text, 100),
                "topic": q.topic,
                "subTopic": q.sub_topic,
                "avgCompletionTime": q.avg_completion_time_secs,
                "totalAttempts": q.attempts,
                "successRate": round2(q.success_rate),
                "difficulty": q.difficulty,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "analysis": analysis })))
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

//=========================================================================================
// Submissions & Grading
//=========================================================================================

/// GET /api/teacher/submissions/{assignment_id} - every submission for an
/// assignment this teacher owns.
pub async fn assignment_submissions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(assignment_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owned = state
        .store
        .assignment_belongs_to_teacher(assignment_id, user.user_id)
        .await
        .map_err(|e| internal("Failed to load submissions", e))?;
    if !owned {
        return Err((
            StatusCode::FORBIDDEN,
            "Assignment not found or does not belong to you".to_string(),
        ));
    }

    let rows = state
        .store
        .submissions_for_assignment(assignment_id)
        .await
        .map_err(|e| internal("Failed to load submissions", e))?;
    let submissions: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            serde_json::json!({
                "submissionId": r.submission.submission_id,
                "assignmentId": r.submission.assignment_id,
                "studentId": r.submission.student_id,
                "studentName": r.student_name,
                "studentUsername": r.student_username,
                "fileName": r.submission.file_name,
                "filePath": r.submission.file_path,
                "fileSize": r.submission.file_size,
                "submittedAt": r.submission.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
                "grade": r.submission.grade,
                "feedback": r.submission.teacher_feedback,
                "dueDate": r.due_date.map(|d| d.to_string()).unwrap_or_default(),
            })
        })
        .collect();
    Ok(Json(serde_json::json!({ "submissions": submissions })))
}

#[derive(Deserialize, ToSchema)]
pub struct GradeRequest {
    pub grade: String,
    #[serde(default)]
    pub feedback: String,
}

/// POST /api/teacher/submissions/{submission_id}/grade
pub async fn grade_submission_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(submission_id): Path<Uuid>,
    Json(req): Json<GradeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let grade = req.grade.trim();
    if grade.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Grade is required".to_string()));
    }

    let owned = state
        .store
        .submission_belongs_to_teacher(submission_id, user.user_id)
        .await
        .map_err(|e| internal("Failed to grade submission", e))?;
    if !owned {
        return Err((
            StatusCode::FORBIDDEN,
            "Submission not found or does not belong to you".to_string(),
        ));
    }

    state
        .store
        .grade_submission(submission_id, grade, req.feedback.trim())
        .await
        .map_err(|e| internal("Failed to grade submission", e))?;

    Ok(Json(serde_json::json!({
        "message": "Submission graded successfully",
        "grade": grade,
    })))
}
