//! services/api/src/web/student.rs
//!
//! Axum handlers for the student-facing API: assignments, stats and
//! analytics, weakness topics, focus-session drilling, doubts,
//! achievements, and assignment submissions.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use learnmatrix_core::analytics;
use learnmatrix_core::domain::{DoubtPriority, Question, SessionUser};
use learnmatrix_core::ports::{NewDoubt, NewResult};
use learnmatrix_core::uploads;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::gamification::check_and_award_achievements;
use crate::web::state::AppState;

/// Questions served per focus session.
const FOCUS_SESSION_SIZE: i64 = 10;
/// How many topics count as "weak".
const WEAK_TOPIC_LIMIT: usize = 2;

fn internal(context: &str, e: impl std::fmt::Debug) -> (StatusCode, String) {
    error!("{context}: {e:?}");
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

//=========================================================================================
// Exams
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    pub exam_id: Uuid,
    pub exam_name: String,
    pub total_questions: i32,
    pub total_time: i32,
}

/// GET /api/exams - every exam, for dropdown selection.
pub async fn list_exams_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let exams = state
        .store
        .list_exams()
        .await
        .map_err(|e| internal("Failed to list exams", e))?;
    let exams: Vec<ExamSummary> = exams
        .into_iter()
        .map(|e| ExamSummary {
            exam_id: e.exam_id,
            exam_name: e.exam_name,
            total_questions: e.total_questions,
            total_time: e.total_time_mins,
        })
        .collect();
    Ok(Json(serde_json::json!({ "exams": exams })))
}

//=========================================================================================
// Assignments & Stats
//=========================================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentEntry {
    assignment_id: Uuid,
    exam_id: Uuid,
    exam_name: String,
    total_questions: i32,
    due_date: String,
    status: String,
    score: Option<f64>,
}

/// GET /api/student/assignments - the caller's assignments with scores.
pub async fn student_assignments_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rows = state
        .store
        .student_assignments(user.user_id)
        .await
        .map_err(|e| internal("Failed to load assignments", e))?;
    let assignments: Vec<AssignmentEntry> = rows
        .into_iter()
        .map(|r| AssignmentEntry {
            assignment_id: r.assignment_id,
            exam_id: r.exam_id,
            exam_name: r.exam_name,
            total_questions: r.total_questions,
            due_date: r.due_date.map(|d| d.to_string()).unwrap_or_default(),
            status: r.status.as_str().to_string(),
            score: r.score,
        })
        .collect();
    Ok(Json(serde_json::json!({ "assignments": assignments })))
}

/// GET /api/student/stats - headline numbers for the dashboard widgets.
pub async fn student_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let total_secs = state
        .store
        .total_activity_seconds(user.user_id)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;
    let study_secs = state
        .store
        .total_focus_seconds(user.user_id)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;
    let avg_score = state
        .store
        .average_score(user.user_id)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;
    let counts = state
        .store
        .assignment_counts(user.user_id, None)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;
    let achievements = state
        .store
        .trophy_count(user.user_id)
        .await
        .map_err(|e| internal("Failed to load stats", e))?;

    Ok(Json(serde_json::json!({
        "totalTime": round2(total_secs as f64 / 3600.0),
        "studyTime": round2(study_secs as f64 / 3600.0),
        "avgScore": round2(avg_score.unwrap_or(0.0)),
        "totalAssignments": counts.total,
        "completedAssignments": counts.completed,
        "achievements": achievements,
    })))
}

/// GET /api/student/analytics - overall stats, per-topic performance, and
/// activity breakdown in one payload.
pub async fn student_analytics_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let stats = state
        .store
        .overall_stats(user.user_id)
        .await
        .map_err(|e| internal("Failed to load analytics", e))?;
    let mut topics = state
        .store
        .topic_aggregates(user.user_id)
        .await
        .map_err(|e| internal("Failed to load analytics", e))?;
    // Strongest first on the analytics page.
    topics.reverse();
    let activities = state
        .store
        .activity_breakdown(user.user_id)
        .await
        .map_err(|e| internal("Failed to load analytics", e))?;

    Ok(Json(serde_json::json!({
        "overallStats": {
            "totalTests": stats.total_tests,
            "avgScore": stats.avg_score.unwrap_or(0.0),
            "bestScore": stats.best_score.unwrap_or(0.0),
            "lowestScore": stats.lowest_score.unwrap_or(0.0),
        },
        "topicPerformance": topics.iter().map(|t| serde_json::json!({
            "topic": t.topic,
            "attemptCount": t.attempt_count,
            "avgScore": t.avg_percentage,
        })).collect::<Vec<_>>(),
        "activityStats": activities.iter().map(|a| serde_json::json!({
            "activityType": a.activity_type,
            "count": a.count,
            "totalHours": round2(a.total_secs as f64 / 3600.0),
        })).collect::<Vec<_>>(),
    })))
}

/// GET /api/student/performance - progression and per-topic breakdown for
/// chart rendering.
pub async fn student_performance_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let progression = state
        .store
        .daily_progression(user.user_id, 10)
        .await
        .map_err(|e| internal("Failed to load performance", e))?;
    let topics = state
        .store
        .topic_aggregates(user.user_id)
        .await
        .map_err(|e| internal("Failed to load performance", e))?;
    let week_ago = Utc::now() - Duration::days(7);
    let focus_secs = state
        .store
        .focus_seconds_since(user.user_id, week_ago)
        .await
        .map_err(|e| internal("Failed to load performance", e))?;

    Ok(Json(serde_json::json!({
        "progression": progression.iter().map(|p| serde_json::json!({
            "date": p.date.to_string(),
            "percentage": p.avg_percentage,
        })).collect::<Vec<_>>(),
        "topicBreakdown": topics.iter().map(|t| serde_json::json!({
            "topic": t.topic,
            "percentage": t.avg_percentage,
            "testCount": t.attempt_count,
        })).collect::<Vec<_>>(),
        "studyHoursThisWeek": focus_secs as f64 / 3600.0,
    })))
}

//=========================================================================================
// Weakness Topics & Focus Sessions
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeaknessTopic {
    pub topic: String,
    pub avg_percentage: f64,
    pub attempt_count: i64,
}

/// GET /api/student/weakness-topics
///
/// The student's two lowest-scoring topics, weakest first. A student with
/// no results gets an empty list and a message, not an error.
#[utoipa::path(
    get,
    path = "/api/student/weakness-topics",
    responses(
        (status = 200, description = "Weakest topics, ascending by mean score", body = [WeaknessTopic]),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn weakness_topics_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let aggregates = state
        .store
        .topic_aggregates(user.user_id)
        .await
        .map_err(|e| internal("Failed to load weakness topics", e))?;

    let weakest = analytics::weakest_topics(&aggregates, WEAK_TOPIC_LIMIT);
    if weakest.is_empty() {
        return Ok(Json(serde_json::json!({
            "weaknessTopics": [],
            "message": "No test data available yet",
        })));
    }

    let weakest: Vec<WeaknessTopic> = weakest
        .into_iter()
        .map(|t| WeaknessTopic {
            topic: t.topic,
            avg_percentage: t.avg_percentage,
            attempt_count: t.attempt_count,
        })
        .collect();
    Ok(Json(serde_json::json!({ "weaknessTopics": weakest })))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FocusQuestion {
    question_id: Uuid,
    topic: String,
    text: String,
    difficulty: String,
    options: Vec<String>,
}

impl From<Question> for FocusQuestion {
    fn from(q: Question) -> Self {
        FocusQuestion {
            question_id: q.question_id,
            topic: q.topic,
            text: q.question_text,
            difficulty: q.difficulty_level,
            options: q.options,
        }
    }
}

/// GET /api/student/focus-session/{exam_id}
///
/// Up to 10 questions preferring the student's weak topics. The fallback
/// chain is weak-topic match -> any question in the exam -> any question in
/// the system; each step fires only when the previous one came back empty.
#[utoipa::path(
    get,
    path = "/api/student/focus-session/{exam_id}",
    params(("exam_id" = Uuid, Path, description = "Exam to drill")),
    responses(
        (status = 200, description = "Selected questions and the focused topics"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn focus_session_questions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(exam_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let aggregates = state
        .store
        .topic_aggregates(user.user_id)
        .await
        .map_err(|e| internal("Failed to load focus session", e))?;
    let weak_topics: Vec<String> = analytics::weakest_topics(&aggregates, WEAK_TOPIC_LIMIT)
        .into_iter()
        .map(|t| t.topic)
        .collect();

    let mut questions = if weak_topics.is_empty() {
        Vec::new()
    } else {
        state
            .store
            .sample_questions_for_topics(exam_id, &weak_topics, FOCUS_SESSION_SIZE)
            .await
            .map_err(|e| internal("Failed to load focus session", e))?
    };
    if questions.is_empty() {
        questions = state
            .store
            .sample_questions_for_exam(exam_id, FOCUS_SESSION_SIZE)
            .await
            .map_err(|e| internal("Failed to load focus session", e))?;
    }
    if questions.is_empty() {
        questions = state
            .store
            .sample_questions_any(FOCUS_SESSION_SIZE)
            .await
            .map_err(|e| internal("Failed to load focus session", e))?;
    }

    let questions: Vec<FocusQuestion> = questions.into_iter().map(FocusQuestion::from).collect();
    Ok(Json(serde_json::json!({
        "focusTopics": weak_topics,
        "questions": questions,
        "totalQuestions": questions.len(),
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct FocusSubmission {
    #[serde(rename = "examID")]
    pub exam_id: Uuid,
    /// question id -> the chosen answer.
    #[serde(default)]
    pub answers: HashMap<Uuid, String>,
    /// Time spent on the drill, in seconds.
    #[serde(default)]
    pub duration: i64,
}

/// POST /api/student/focus-session/submit
///
/// Grades the submitted answers against the stored key, records the
/// result, and kicks off a best-effort achievement check.
#[utoipa::path(
    post,
    path = "/api/student/focus-session/submit",
    request_body = FocusSubmission,
    responses(
        (status = 200, description = "Scored and recorded"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn submit_focus_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<FocusSubmission>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Grade against the answer key
    let question_ids: Vec<Uuid> = req.answers.keys().copied().collect();
    let key = state
        .store
        .answer_key(&question_ids)
        .await
        .map_err(|e| internal("Failed to grade submission", e))?;

    let correct_count = key
        .iter()
        .filter(|entry| {
            req.answers
                .get(&entry.question_id)
                .is_some_and(|given| given == &entry.correct_answer)
        })
        .count();
    let total_questions = req.answers.len();
    let percentage = analytics::score_percentage(correct_count, total_questions);
    let topic = analytics::dominant_topic(key.iter().map(|e| e.topic.as_str()))
        .unwrap_or_else(|| "General".to_string());

    // 2. Record the attempt
    state
        .store
        .insert_result(NewResult {
            student_id: user.user_id,
            exam_id: req.exam_id,
            topic,
            percentage,
            answers_correct: correct_count as i32,
            completion_time_secs: req.duration as i32,
        })
        .await
        .map_err(|e| internal("Failed to record result", e))?;

    // 3. Best-effort trophy check; never fails the submission
    check_and_award_achievements(&state, user.user_id).await;

    Ok(Json(serde_json::json!({
        "success": true,
        "percentage": percentage,
        "correctAnswers": correct_count,
        "totalQuestions": total_questions,
    })))
}

//=========================================================================================
// Doubts
//=========================================================================================

/// GET /api/student/doubts - the caller's doubts, newest first.
pub async fn student_doubts_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rows = state
        .store
        .doubts_for_student(user.user_id)
        .await
        .map_err(|e| internal("Failed to load doubts", e))?;
    let doubts: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            serde_json::json!({
                "doubtId": r.doubt.doubt_id,
                "topic": r.doubt.topic,
                "text": r.doubt.doubt_text,
                "status": r.doubt.status.as_str(),
                "priority": r.doubt.priority.as_str(),
                "resolution": r.doubt.resolution_text,
                "createdAt": r.doubt.created_at.format("%Y-%m-%d %H:%M").to_string(),
                "teacherName": r.teacher_name.unwrap_or_else(|| "Pending".to_string()),
                "imagePath": r.doubt.image_path,
            })
        })
        .collect();
    Ok(Json(serde_json::json!({ "doubts": doubts })))
}

/// POST /api/student/doubts
///
/// Multipart form: `topic` and `doubt_text` required; `question_id`,
/// `priority`, and one `image` (jpg/jpeg/png/gif/webp) optional.
pub async fn submit_doubt_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut topic = String::new();
    let mut doubt_text = String::new();
    let mut question_id: Option<Uuid> = None;
    let mut priority = DoubtPriority::Medium;
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "topic" => topic = field.text().await.unwrap_or_default().trim().to_string(),
            "doubt_text" => {
                doubt_text = field.text().await.unwrap_or_default().trim().to_string()
            }
            "question_id" => {
                let raw = field.text().await.unwrap_or_default();
                if !raw.is_empty() {
                    question_id = Some(Uuid::parse_str(&raw).map_err(|_| {
                        (
                            StatusCode::BAD_REQUEST,
                            "Invalid question_id format".to_string(),
                        )
                    })?);
                }
            }
            "priority" => {
                priority = DoubtPriority::parse_or_default(&field.text().await.unwrap_or_default())
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() {
                    continue;
                }
                let bytes = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read image bytes: {}", e),
                    )
                })?;
                image = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    if topic.is_empty() || doubt_text.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Topic and doubt description are required".to_string(),
        ));
    }

    let mut image_path = None;
    if let Some((file_name, bytes)) = image {
        let stored_name = uploads::stored_doubt_image_name(Utc::now().timestamp(), &file_name)
            .ok_or((
                StatusCode::BAD_REQUEST,
                "File type not allowed. Allowed: JPG, JPEG, PNG, GIF, WEBP".to_string(),
            ))?;
        let path = state
            .files
            .save_doubt_image(&stored_name, &bytes)
            .await
            .map_err(|e| internal("File upload failed", e))?;
        image_path = Some(path);
    }

    let doubt_id = state
        .store
        .insert_doubt(NewDoubt {
            student_id: user.user_id,
            topic,
            doubt_text,
            question_id,
            priority,
            image_path,
        })
        .await
        .map_err(|e| internal("Failed to submit doubt", e))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Doubt submitted successfully",
            "doubtId": doubt_id,
        })),
    ))
}

//=========================================================================================
// Achievements & Class Stats
//=========================================================================================

/// GET /api/student/achievements - earned trophies plus the point total.
pub async fn student_achievements_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let achievements = state
        .store
        .achievements_for(user.user_id)
        .await
        .map_err(|e| internal("Failed to load achievements", e))?;
    let total_points: i32 = achievements.iter().map(|a| a.points).sum();
    let achievements: Vec<serde_json::Value> = achievements
        .into_iter()
        .map(|a| {
            serde_json::json!({
                "achievementId": a.achievement_id,
                "trophyName": a.trophy_name,
                "description": a.description,
                "badge": a.badge,
                "points": a.points,
                "dateEarned": a.earned_at.format("%Y-%m-%d").to_string(),
            })
        })
        .collect();
    Ok(Json(serde_json::json!({
        "achievements": achievements,
        "totalPoints": total_points,
    })))
}

/// GET /api/student/class-stats - class-wide numbers via the student's
/// teacher; all zeros when no teacher has assigned them anything yet.
pub async fn class_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(teacher_id) = state
        .store
        .teacher_of_student(user.user_id)
        .await
        .map_err(|e| internal("Failed to load class stats", e))?
    else {
        return Ok(Json(serde_json::json!({
            "totalStudents": 0,
            "totalAssignments": 0,
            "completedAssignments": 0,
            "totalExams": 0,
            "totalTestsTaken": 0,
            "averagePerformance": 0.0,
            "pendingDoubts": 0,
        })));
    };

    let total_students = state
        .store
        .count_assigned_students(teacher_id)
        .await
        .map_err(|e| internal("Failed to load class stats", e))?;
    let counts = state
        .store
        .assignment_counts_for_teacher(teacher_id)
        .await
        .map_err(|e| internal("Failed to load class stats", e))?;
    let total_exams = state
        .store
        .count_exams()
        .await
        .map_err(|e| internal("Failed to load class stats", e))?;
    let tests_taken = state
        .store
        .tests_taken_by_roster(teacher_id)
        .await
        .map_err(|e| internal("Failed to load class stats", e))?;
    let avg_performance = state
        .store
        .roster_average_performance(teacher_id)
        .await
        .map_err(|e| internal("Failed to load class stats", e))?;
    let pending_doubts = state
        .store
        .pending_doubts_count(teacher_id)
        .await
        .map_err(|e| internal("Failed to load class stats", e))?;

    Ok(Json(serde_json::json!({
        "totalStudents": total_students,
        "totalAssignments": counts.total,
        "completedAssignments": counts.completed,
        "totalExams": total_exams,
        "totalTestsTaken": tests_taken,
        "averagePerformance": round2(avg_performance.unwrap_or(0.0)),
        "pendingDoubts": pending_doubts,
    })))
}

//=========================================================================================
// Submissions
//=========================================================================================

/// GET /api/student/submissions - the caller's uploads with grades.
pub async fn student_submissions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rows = state
        .store
        .submissions_for_student(user.user_id)
        .await
        .map_err(|e| internal("Failed to load submissions", e))?;
    let submissions: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            serde_json::json!({
                "submissionId": r.submission.submission_id,
                "assignmentId": r.submission.assignment_id,
                "examId": r.exam_id,
                "examName": r.exam_name,
                "fileName": r.submission.file_name,
                "submittedAt": r.submission.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
                "grade": r.submission.grade,
                "feedback": r.submission.teacher_feedback,
                "status": r.status.as_str(),
                "dueDate": r.due_date.map(|d| d.to_string()).unwrap_or_default(),
            })
        })
        .collect();
    Ok(Json(serde_json::json!({ "submissions": submissions })))
}

/// POST /api/student/submit-assignment
///
/// Multipart form: `assignment_id` plus one `file`
/// (pdf/doc/docx/txt/jpg/jpeg/png/xls/xlsx/ppt/pptx). Re-submitting
/// replaces the previous upload; the assignment flips to Completed.
#[utoipa::path(
    post,
    path = "/api/student/submit-assignment",
    request_body(content_type = "multipart/form-data", description = "assignment_id and the file to submit"),
    responses(
        (status = 201, description = "Submission stored"),
        (status = 400, description = "Missing file or disallowed type"),
        (status = 403, description = "Assignment belongs to someone else"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn submit_assignment_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut assignment_id: Option<Uuid> = None;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "assignment_id" => {
                let raw = field.text().await.unwrap_or_default();
                assignment_id = Some(Uuid::parse_str(raw.trim()).map_err(|_| {
                    (
                        StatusCode::BAD_REQUEST,
                        "Invalid assignment_id format".to_string(),
                    )
                })?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() {
                    return Err((StatusCode::BAD_REQUEST, "No file selected".to_string()));
                }
                let bytes = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file bytes: {}", e),
                    )
                })?;
                upload = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let assignment_id = assignment_id.ok_or((
        StatusCode::BAD_REQUEST,
        "Assignment ID is required".to_string(),
    ))?;
    let (file_name, bytes) =
        upload.ok_or((StatusCode::BAD_REQUEST, "No file provided".to_string()))?;

    // Cross-tenant check: the assignment must be the caller's.
    let owned = state
        .store
        .assignment_belongs_to_student(assignment_id, user.user_id)
        .await
        .map_err(|e| internal("Failed to submit assignment", e))?;
    if !owned {
        return Err((
            StatusCode::FORBIDDEN,
            "Assignment not found or does not belong to you".to_string(),
        ));
    }

    let stored_name =
        uploads::stored_submission_name(user.user_id, Utc::now().timestamp(), &file_name).ok_or(
            (
                StatusCode::BAD_REQUEST,
                "File type not allowed. Allowed: PDF, DOC, DOCX, TXT, JPG, PNG, XLS, XLSX, PPT, PPTX"
                    .to_string(),
            ),
        )?;
    let display_name = uploads::sanitize_filename(&file_name);

    let (file_path, file_size) = state
        .files
        .save_submission(assignment_id, &stored_name, &bytes)
        .await
        .map_err(|e| internal("Failed to store submission", e))?;

    let created = state
        .store
        .upsert_submission(assignment_id, user.user_id, &file_path, &display_name, file_size)
        .await
        .map_err(|e| internal("Failed to record submission", e))?;

    state
        .store
        .mark_assignment_completed(assignment_id)
        .await
        .map_err(|e| internal("Failed to update assignment", e))?;

    let message = if created {
        "Assignment submitted successfully"
    } else {
        "Assignment updated successfully"
    };
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": message, "filename": display_name })),
    ))
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
