//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StoreService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use learnmatrix_core::achievements::StudentSnapshot;
use learnmatrix_core::analytics::{QuestionAttempts, TopicAggregate};
use learnmatrix_core::domain::{
    Achievement, ActivityEntry, ActivityKind, AssignmentStatus, Doubt, DoubtPriority, DoubtStatus,
    Exam, Question, Role, SessionUser, Submission, User, UserCredentials,
};
use learnmatrix_core::ports::{
    ActivityBreakdown, AnswerKeyEntry, CompletionCounts, DailyScore, NewActivity, NewDoubt,
    NewResult, NewUser, OverallStats, PortError, PortResult, ScoreBucket, StoreService,
    StudentAssignmentRow, StudentDoubtRow, StudentSubmissionRow, TeacherAssignmentRow,
    TeacherDoubtRow, TeacherSubmissionRow, TopStudent, TopicCount,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StoreService` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    username: String,
    email: String,
    role: String,
    first_name: String,
    last_name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            username: self.username,
            email: self.email,
            // The role column carries a CHECK constraint, so this only
            // defaults on a manually corrupted row.
            role: Role::parse(&self.role).unwrap_or(Role::Student),
            first_name: self.first_name,
            last_name: self.last_name,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    first_name: String,
    last_name: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            username: self.username,
            password_hash: self.password_hash,
            role: Role::parse(&self.role).unwrap_or(Role::Student),
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

#[derive(FromRow)]
struct SessionUserRecord {
    user_id: Uuid,
    username: String,
    role: String,
    first_name: String,
    last_name: String,
}
impl SessionUserRecord {
    fn to_domain(self) -> SessionUser {
        SessionUser {
            user_id: self.user_id,
            username: self.username,
            role: Role::parse(&self.role).unwrap_or(Role::Student),
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

#[derive(FromRow)]
struct ExamRecord {
    exam_id: Uuid,
    exam_name: String,
    total_questions: i32,
    total_time_mins: i32,
}
impl ExamRecord {
    fn to_domain(self) -> Exam {
        Exam {
            exam_id: self.exam_id,
            exam_name: self.exam_name,
            total_questions: self.total_questions,
            total_time_mins: self.total_time_mins,
        }
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    question_id: Uuid,
    exam_id: Uuid,
    topic: String,
    sub_topic: Option<String>,
    question_text: String,
    options: serde_json::Value,
    difficulty_level: String,
}
impl QuestionRecord {
    fn to_domain(self) -> Question {
        let options = self
            .options
            .as_array()
            .map(|opts| {
                opts.iter()
                    .filter_map(|o| o.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Question {
            question_id: self.question_id,
            exam_id: self.exam_id,
            topic: self.topic,
            sub_topic: self.sub_topic,
            question_text: self.question_text,
            options,
            difficulty_level: self.difficulty_level,
        }
    }
}

#[derive(FromRow)]
struct AchievementRecord {
    achievement_id: Uuid,
    student_id: Uuid,
    trophy_name: String,
    description: String,
    badge: String,
    points: i32,
    earned_at: DateTime<Utc>,
}
impl AchievementRecord {
    fn to_domain(self) -> Achievement {
        Achievement {
            achievement_id: self.achievement_id,
            student_id: self.student_id,
            trophy_name: self.trophy_name,
            description: self.description,
            badge: self.badge,
            points: self.points,
            earned_at: self.earned_at,
        }
    }
}

#[derive(FromRow)]
struct DoubtRecord {
    doubt_id: Uuid,
    student_id: Uuid,
    teacher_id: Option<Uuid>,
    question_id: Option<Uuid>,
    topic: String,
    doubt_text: String,
    priority: String,
    status: String,
    resolution_text: Option<String>,
    image_path: Option<String>,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}
impl DoubtRecord {
    fn to_domain(self) -> Doubt {
        Doubt {
            doubt_id: self.doubt_id,
            student_id: self.student_id,
            teacher_id: self.teacher_id,
            question_id: self.question_id,
            topic: self.topic,
            doubt_text: self.doubt_text,
            priority: DoubtPriority::parse_or_default(&self.priority),
            status: DoubtStatus::parse(&self.status).unwrap_or(DoubtStatus::Pending),
            resolution_text: self.resolution_text,
            image_path: self.image_path,
            created_at: self.created_at,
            resolved_at: self.resolved_at,
        }
    }
}

#[derive(FromRow)]
struct StudentDoubtRecord {
    #[sqlx(flatten)]
    doubt: DoubtRecord,
    teacher_name: Option<String>,
}

#[derive(FromRow)]
struct TeacherDoubtRecord {
    #[sqlx(flatten)]
    doubt: DoubtRecord,
    student_name: String,
}

#[derive(FromRow)]
struct SubmissionRecord {
    submission_id: Uuid,
    assignment_id: Uuid,
    student_id: Uuid,
    file_path: String,
    file_name: String,
    file_size: i64,
    submitted_at: DateTime<Utc>,
    grade: Option<String>,
    teacher_feedback: Option<String>,
    graded_at: Option<DateTime<Utc>>,
}
impl SubmissionRecord {
    fn to_domain(self) -> Submission {
        Submission {
            submission_id: self.submission_id,
            assignment_id: self.assignment_id,
            student_id: self.student_id,
            file_path: self.file_path,
            file_name: self.file_name,
            file_size: self.file_size,
            submitted_at: self.submitted_at,
            grade: self.grade,
            teacher_feedback: self.teacher_feedback,
            graded_at: self.graded_at,
        }
    }
}

#[derive(FromRow)]
struct StudentSubmissionRecord {
    #[sqlx(flatten)]
    submission: SubmissionRecord,
    exam_id: Uuid,
    exam_name: String,
    status: String,
    due_date: Option<NaiveDate>,
}

#[derive(FromRow)]
struct TeacherSubmissionRecord {
    #[sqlx(flatten)]
    submission: SubmissionRecord,
    student_name: String,
    student_username: String,
    due_date: Option<NaiveDate>,
}

#[derive(FromRow)]
struct TopicAggregateRecord {
    topic: String,
    avg_percentage: f64,
    attempt_count: i64,
}

#[derive(FromRow)]
struct QuestionAttemptsRecord {
    question_id: Uuid,
    question_text: String,
    topic: String,
    sub_topic: Option<String>,
    avg_completion_time_secs: Option<f64>,
    attempts: i64,
    success_count: i64,
}
impl QuestionAttemptsRecord {
    fn to_domain(self) -> QuestionAttempts {
        QuestionAttempts {
            question_id: self.question_id,
            question_text: self.question_text,
            topic: self.topic,
            sub_topic: self.sub_topic,
            avg_completion_time_secs: self.avg_completion_time_secs,
            attempts: self.attempts,
            success_count: self.success_count,
        }
    }
}

#[derive(FromRow)]
struct StudentAssignmentRecord {
    assignment_id: Uuid,
    exam_id: Uuid,
    exam_name: String,
    total_questions: i32,
    due_date: Option<NaiveDate>,
    status: String,
    score: Option<f64>,
}

#[derive(FromRow)]
struct TeacherAssignmentRecord {
    exam_id: Uuid,
    exam_name: String,
    due_date: Option<NaiveDate>,
    student_count: i64,
    completed_count: i64,
}

const DOUBT_COLUMNS: &str = "d.doubt_id, d.student_id, d.teacher_id, d.question_id, d.topic, \
     d.doubt_text, d.priority, d.status, d.resolution_text, d.image_path, d.created_at, \
     d.resolved_at";

const QUESTION_COLUMNS: &str =
    "question_id, exam_id, topic, sub_topic, question_text, options, difficulty_level";

const SUBMISSION_COLUMNS: &str = "sub.submission_id, sub.assignment_id, sub.student_id, \
     sub.file_path, sub.file_name, sub.file_size, sub.submitted_at, sub.grade, \
     sub.teacher_feedback, sub.graded_at";

//=========================================================================================
// `StoreService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoreService for PgStore {
    async fn ping(&self) -> PortResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Users & Auth ---

    async fn create_user(&self, user: NewUser) -> PortResult<Uuid> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        if taken {
            return Err(PortError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (username, email, password_hash, role, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING user_id",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Two registrations can race past the pre-check; the unique
            // indexes still hold the line.
            if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                PortError::Conflict("Username or email already exists".to_string())
            } else {
                unexpected(e)
            }
        })
    }

    async fn get_credentials(&self, identifier: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, username, password_hash, role, first_name, last_name \
             FROM users WHERE username = $1 OR email = $1",
        )
        .bind(identifier)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("User '{}' not found", identifier))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn touch_last_login(&self, user_id: Uuid) -> PortResult<()> {
        sqlx::query("UPDATE users SET last_login = now() WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<SessionUser> {
        let record = sqlx::query_as::<_, SessionUserRecord>(
            "SELECT u.user_id, u.username, u.role, u.first_name, u.last_name \
             FROM auth_sessions s JOIN users u ON s.user_id = u.user_id \
             WHERE s.id = $1 AND s.expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Exams & Questions ---

    async fn list_exams(&self) -> PortResult<Vec<Exam>> {
        let records = sqlx::query_as::<_, ExamRecord>(
            "SELECT exam_id, exam_name, total_questions, total_time_mins \
             FROM exams ORDER BY exam_name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_exams(&self) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exams")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn sample_questions_for_topics(
        &self,
        exam_id: Uuid,
        topics: &[String],
        limit: i64,
    ) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE exam_id = $1 AND topic = ANY($2) ORDER BY random() LIMIT $3"
        ))
        .bind(exam_id)
        .bind(topics)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn sample_questions_for_exam(
        &self,
        exam_id: Uuid,
        limit: i64,
    ) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE exam_id = $1 ORDER BY random() LIMIT $2"
        ))
        .bind(exam_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn sample_questions_any(&self, limit: i64) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY random() LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn answer_key(&self, question_ids: &[Uuid]) -> PortResult<Vec<AnswerKeyEntry>> {
        #[derive(FromRow)]
        struct KeyRecord {
            question_id: Uuid,
            correct_answer: String,
            topic: String,
        }
        let records = sqlx::query_as::<_, KeyRecord>(
            "SELECT question_id, correct_answer, topic FROM questions WHERE question_id = ANY($1)",
        )
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| AnswerKeyEntry {
                question_id: r.question_id,
                correct_answer: r.correct_answer,
                topic: r.topic,
            })
            .collect())
    }

    // --- Results ---

    async fn insert_result(&self, result: NewResult) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO results \
             (student_id, exam_id, topic, percentage, answers_correct, completion_time_secs) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(result.student_id)
        .bind(result.exam_id)
        .bind(&result.topic)
        .bind(result.percentage)
        .bind(result.answers_correct)
        .bind(result.completion_time_secs)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn topic_aggregates(&self, student_id: Uuid) -> PortResult<Vec<TopicAggregate>> {
        let records = sqlx::query_as::<_, TopicAggregateRecord>(
            "SELECT topic, AVG(percentage)::DOUBLE PRECISION AS avg_percentage, \
             COUNT(*) AS attempt_count \
             FROM results WHERE student_id = $1 \
             GROUP BY topic ORDER BY avg_percentage ASC, topic ASC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| TopicAggregate {
                topic: r.topic,
                avg_percentage: r.avg_percentage,
                attempt_count: r.attempt_count,
            })
            .collect())
    }

    async fn overall_stats(&self, student_id: Uuid) -> PortResult<OverallStats> {
        #[derive(FromRow)]
        struct StatsRecord {
            total_tests: i64,
            avg_score: Option<f64>,
            best_score: Option<f64>,
            lowest_score: Option<f64>,
        }
        let record = sqlx::query_as::<_, StatsRecord>(
            "SELECT COUNT(*) AS total_tests, \
             AVG(percentage)::DOUBLE PRECISION AS avg_score, \
             MAX(percentage) AS best_score, \
             MIN(percentage) AS lowest_score \
             FROM results WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(OverallStats {
            total_tests: record.total_tests,
            avg_score: record.avg_score,
            best_score: record.best_score,
            lowest_score: record.lowest_score,
        })
    }

    async fn daily_progression(&self, student_id: Uuid, days: i64) -> PortResult<Vec<DailyScore>> {
        #[derive(FromRow)]
        struct DayRecord {
            day: NaiveDate,
            avg_percentage: f64,
        }
        let records = sqlx::query_as::<_, DayRecord>(
            "SELECT recorded_at::date AS day, \
             AVG(percentage)::DOUBLE PRECISION AS avg_percentage \
             FROM results WHERE student_id = $1 \
             GROUP BY recorded_at::date ORDER BY day DESC LIMIT $2",
        )
        .bind(student_id)
        .bind(days)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| DailyScore {
                date: r.day,
                avg_percentage: r.avg_percentage,
            })
            .collect())
    }

    async fn average_score(&self, student_id: Uuid) -> PortResult<Option<f64>> {
        sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(percentage)::DOUBLE PRECISION FROM results WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    // --- Activity ---

    async fn insert_activity(&self, activity: NewActivity) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO activity_log \
             (user_id, activity_type, duration_secs, exam_id, assignment_id, details) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(activity.user_id)
        .bind(activity.activity_type.as_str())
        .bind(activity.duration_secs)
        .bind(activity.exam_id)
        .bind(activity.assignment_id)
        .bind(&activity.details)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn recent_activity(&self, user_id: Uuid, limit: i64) -> PortResult<Vec<ActivityEntry>> {
        #[derive(FromRow)]
        struct ActivityRecord {
            user_id: Uuid,
            activity_type: String,
            duration_secs: i64,
            exam_id: Option<Uuid>,
            assignment_id: Option<Uuid>,
            details: serde_json::Value,
            recorded_at: DateTime<Utc>,
        }
        let records = sqlx::query_as::<_, ActivityRecord>(
            "SELECT user_id, activity_type, duration_secs, exam_id, assignment_id, details, \
             recorded_at FROM activity_log WHERE user_id = $1 \
             ORDER BY recorded_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| ActivityEntry {
                user_id: r.user_id,
                activity_type: ActivityKind::parse(&r.activity_type)
                    .unwrap_or(ActivityKind::ViewedResources),
                duration_secs: r.duration_secs,
                exam_id: r.exam_id,
                assignment_id: r.assignment_id,
                details: r.details,
                recorded_at: r.recorded_at,
            })
            .collect())
    }

    async fn activity_breakdown(&self, user_id: Uuid) -> PortResult<Vec<ActivityBreakdown>> {
        #[derive(FromRow)]
        struct BreakdownRecord {
            activity_type: String,
            count: i64,
            total_secs: i64,
        }
        let records = sqlx::query_as::<_, BreakdownRecord>(
            "SELECT activity_type, COUNT(*) AS count, \
             COALESCE(SUM(duration_secs), 0)::BIGINT AS total_secs \
             FROM activity_log WHERE user_id = $1 GROUP BY activity_type",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| ActivityBreakdown {
                activity_type: r.activity_type,
                count: r.count,
                total_secs: r.total_secs,
            })
            .collect())
    }

    async fn total_activity_seconds(&self, user_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(duration_secs), 0)::BIGINT FROM activity_log WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn total_focus_seconds(&self, user_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(duration_secs), 0)::BIGINT FROM activity_log \
             WHERE user_id = $1 AND activity_type = 'FocusSession'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn focus_seconds_since(&self, user_id: Uuid, since: DateTime<Utc>) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(duration_secs), 0)::BIGINT FROM activity_log \
             WHERE user_id = $1 AND activity_type = 'FocusSession' AND recorded_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    // --- Assignments ---

    async fn student_assignments(
        &self,
        student_id: Uuid,
    ) -> PortResult<Vec<StudentAssignmentRow>> {
        let records = sqlx::query_as::<_, StudentAssignmentRecord>(
            "SELECT a.assignment_id, a.exam_id, e.exam_name, e.total_questions, a.due_date, \
             a.status, \
             (SELECT r.percentage FROM results r \
              WHERE r.exam_id = a.exam_id AND r.student_id = a.student_id \
              ORDER BY r.recorded_at DESC LIMIT 1) AS score \
             FROM assignments a JOIN exams e ON a.exam_id = e.exam_id \
             WHERE a.student_id = $1 ORDER BY a.due_date DESC NULLS LAST",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| StudentAssignmentRow {
                assignment_id: r.assignment_id,
                exam_id: r.exam_id,
                exam_name: r.exam_name,
                total_questions: r.total_questions,
                due_date: r.due_date,
                status: AssignmentStatus::parse(&r.status).unwrap_or(AssignmentStatus::Assigned),
                score: r.score,
            })
            .collect())
    }

    async fn assignment_counts(
        &self,
        student_id: Uuid,
        teacher_id: Option<Uuid>,
    ) -> PortResult<CompletionCounts> {
        #[derive(FromRow)]
        struct CountsRecord {
            completed: i64,
            total: i64,
        }
        let record = sqlx::query_as::<_, CountsRecord>(
            "SELECT COUNT(*) FILTER (WHERE status = 'Completed') AS completed, \
             COUNT(*) AS total FROM assignments \
             WHERE student_id = $1 AND ($2::uuid IS NULL OR teacher_id = $2)",
        )
        .bind(student_id)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(CompletionCounts {
            completed: record.completed,
            total: record.total,
        })
    }

    async fn assignment_counts_for_teacher(
        &self,
        teacher_id: Uuid,
    ) -> PortResult<CompletionCounts> {
        #[derive(FromRow)]
        struct CountsRecord {
            completed: i64,
            total: i64,
        }
        let record = sqlx::query_as::<_, CountsRecord>(
            "SELECT COUNT(*) FILTER (WHERE status = 'Completed') AS completed, \
             COUNT(*) AS total FROM assignments WHERE teacher_id = $1",
        )
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(CompletionCounts {
            completed: record.completed,
            total: record.total,
        })
    }

    async fn create_assignment_if_absent(
        &self,
        teacher_id: Uuid,
        student_id: Uuid,
        exam_id: Uuid,
        due_date: Option<NaiveDate>,
    ) -> PortResult<bool> {
        let done = sqlx::query(
            "INSERT INTO assignments (teacher_id, student_id, exam_id, due_date) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (teacher_id, student_id, exam_id) DO NOTHING",
        )
        .bind(teacher_id)
        .bind(student_id)
        .bind(exam_id)
        .bind(due_date)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(done.rows_affected() == 1)
    }

    async fn assignment_belongs_to_student(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
    ) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM assignments \
             WHERE assignment_id = $1 AND student_id = $2)",
        )
        .bind(assignment_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn assignment_belongs_to_teacher(
        &self,
        assignment_id: Uuid,
        teacher_id: Uuid,
    ) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM assignments \
             WHERE assignment_id = $1 AND teacher_id = $2)",
        )
        .bind(assignment_id)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn mark_assignment_completed(&self, assignment_id: Uuid) -> PortResult<()> {
        sqlx::query("UPDATE assignments SET status = 'Completed' WHERE assignment_id = $1")
            .bind(assignment_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn teacher_assignment_rows(
        &self,
        teacher_id: Uuid,
    ) -> PortResult<Vec<TeacherAssignmentRow>> {
        let records = sqlx::query_as::<_, TeacherAssignmentRecord>(
            "SELECT a.exam_id, e.exam_name, a.due_date, COUNT(*) AS student_count, \
             COUNT(*) FILTER (WHERE a.status = 'Completed') AS completed_count \
             FROM assignments a JOIN exams e ON a.exam_id = e.exam_id \
             WHERE a.teacher_id = $1 \
             GROUP BY a.exam_id, e.exam_name, a.due_date \
             ORDER BY a.due_date DESC NULLS LAST",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| TeacherAssignmentRow {
                exam_id: r.exam_id,
                exam_name: r.exam_name,
                due_date: r.due_date,
                student_count: r.student_count,
                completed_count: r.completed_count,
            })
            .collect())
    }

    async fn assigned_students(&self, teacher_id: Uuid) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT DISTINCT u.user_id, u.username, u.email, u.role, u.first_name, \
             u.last_name, u.is_active, u.created_at \
             FROM assignments a JOIN users u ON a.student_id = u.user_id \
             WHERE a.teacher_id = $1 ORDER BY u.first_name, u.last_name",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn assigned_student_ids(&self, teacher_id: Uuid) -> PortResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT student_id FROM assignments WHERE teacher_id = $1",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn all_students(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, username, email, role, first_name, last_name, is_active, \
             created_at FROM users WHERE role = 'Student' AND is_active \
             ORDER BY first_name, last_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn teacher_of_student(&self, student_id: Uuid) -> PortResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT teacher_id FROM assignments WHERE student_id = $1 LIMIT 1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn count_assigned_students(&self, teacher_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT student_id) FROM assignments WHERE teacher_id = $1",
        )
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn tests_taken_by_roster(&self, teacher_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM results r WHERE r.student_id IN \
             (SELECT DISTINCT student_id FROM assignments WHERE teacher_id = $1)",
        )
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn roster_average_performance(&self, teacher_id: Uuid) -> PortResult<Option<f64>> {
        sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(r.percentage)::DOUBLE PRECISION FROM results r WHERE r.student_id IN \
             (SELECT DISTINCT student_id FROM assignments WHERE teacher_id = $1)",
        )
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn roster_focus_seconds(&self, teacher_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(al.duration_secs), 0)::BIGINT FROM activity_log al \
             WHERE al.activity_type = 'FocusSession' AND al.user_id IN \
             (SELECT DISTINCT student_id FROM assignments WHERE teacher_id = $1)",
        )
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    // --- Class analytics ---

    async fn score_distribution(&self, teacher_id: Uuid) -> PortResult<Vec<ScoreBucket>> {
        #[derive(FromRow)]
        struct BucketRecord {
            score_range: String,
            count: i64,
        }
        let records = sqlx::query_as::<_, BucketRecord>(
            "SELECT CASE WHEN r.percentage >= 80 THEN '80-100%' \
                         WHEN r.percentage >= 60 THEN '60-80%' \
                         WHEN r.percentage >= 40 THEN '40-60%' \
                         ELSE 'Below 40%' END AS score_range, \
             COUNT(*) AS count \
             FROM results r WHERE r.student_id IN \
             (SELECT DISTINCT student_id FROM assignments WHERE teacher_id = $1) \
             GROUP BY score_range ORDER BY score_range DESC",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| ScoreBucket {
                range: r.score_range,
                count: r.count,
            })
            .collect())
    }

    async fn top_students(&self, teacher_id: Uuid, limit: i64) -> PortResult<Vec<TopStudent>> {
        #[derive(FromRow)]
        struct TopRecord {
            name: String,
            avg_score: f64,
        }
        let records = sqlx::query_as::<_, TopRecord>(
            "SELECT trim(u.first_name || ' ' || u.last_name) AS name, \
             AVG(r.percentage)::DOUBLE PRECISION AS avg_score \
             FROM results r JOIN users u ON r.student_id = u.user_id \
             WHERE r.student_id IN \
             (SELECT DISTINCT student_id FROM assignments WHERE teacher_id = $1) \
             GROUP BY r.student_id, u.first_name, u.last_name \
             ORDER BY avg_score DESC LIMIT $2",
        )
        .bind(teacher_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| TopStudent {
                name: r.name,
                avg_score: r.avg_score,
            })
            .collect())
    }

    async fn assignment_completion_trend(
        &self,
        teacher_id: Uuid,
        limit: i64,
    ) -> PortResult<Vec<TeacherAssignmentRow>> {
        let records = sqlx::query_as::<_, TeacherAssignmentRecord>(
            "SELECT a.exam_id, e.exam_name, a.due_date, COUNT(*) AS student_count, \
             COUNT(*) FILTER (WHERE a.status = 'Completed') AS completed_count \
             FROM assignments a JOIN exams e ON a.exam_id = e.exam_id \
             WHERE a.teacher_id = $1 \
             GROUP BY a.exam_id, e.exam_name, a.due_date \
             ORDER BY MAX(a.created_at) DESC LIMIT $2",
        )
        .bind(teacher_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| TeacherAssignmentRow {
                exam_id: r.exam_id,
                exam_name: r.exam_name,
                due_date: r.due_date,
                student_count: r.student_count,
                completed_count: r.completed_count,
            })
            .collect())
    }

    async fn question_attempts(
        &self,
        exam_id: Uuid,
        teacher_id: Uuid,
    ) -> PortResult<Vec<QuestionAttempts>> {
        // Results carry a topic, not a question id, so attempts are joined
        // per topic and scoped to students this teacher assigned the exam.
        let records = sqlx::query_as::<_, QuestionAttemptsRecord>(
            "SELECT q.question_id, q.question_text, q.topic, q.sub_topic, \
             AVG(r.completion_time_secs)::DOUBLE PRECISION AS avg_completion_time_secs, \
             COUNT(r.result_id) AS attempts, \
             COUNT(r.result_id) FILTER (WHERE r.percentage >= 50) AS success_count \
             FROM questions q \
             LEFT JOIN results r ON r.topic = q.topic AND r.student_id IN \
             (SELECT student_id FROM assignments WHERE teacher_id = $1 AND exam_id = $2) \
             WHERE q.exam_id = $2 \
             GROUP BY q.question_id, q.question_text, q.topic, q.sub_topic",
        )
        .bind(teacher_id)
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    // --- Achievements ---

    async fn achievements_for(&self, student_id: Uuid) -> PortResult<Vec<Achievement>> {
        let records = sqlx::query_as::<_, AchievementRecord>(
            "SELECT achievement_id, student_id, trophy_name, description, badge, points, \
             earned_at FROM achievements WHERE student_id = $1 ORDER BY earned_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn trophy_count(&self, student_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM achievements WHERE student_id = $1")
            .bind(student_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn earned_trophy_names(&self, student_id: Uuid) -> PortResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT trophy_name FROM achievements WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn student_snapshot(&self, student_id: Uuid) -> PortResult<StudentSnapshot> {
        let focus_secs_last_week = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(duration_secs), 0)::BIGINT FROM activity_log \
             WHERE user_id = $1 AND activity_type = 'FocusSession' \
             AND recorded_at >= now() - interval '7 days'",
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        let best_percentage = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT MAX(percentage) FROM results WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        let doubts_cleared = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM doubts WHERE student_id = $1 AND status = 'Cleared'",
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(StudentSnapshot {
            focus_secs_last_week,
            best_percentage,
            doubts_cleared,
        })
    }

    async fn grant_achievement(
        &self,
        student_id: Uuid,
        trophy_name: &str,
        description: &str,
        badge: &str,
        points: i32,
    ) -> PortResult<bool> {
        // The unique index on (student_id, trophy_name) makes this a single
        // atomic check-and-insert; concurrent calls cannot double-grant.
        let done = sqlx::query(
            "INSERT INTO achievements (student_id, trophy_name, description, badge, points) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (student_id, trophy_name) DO NOTHING",
        )
        .bind(student_id)
        .bind(trophy_name)
        .bind(description)
        .bind(badge)
        .bind(points)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(done.rows_affected() == 1)
    }

    // --- Doubts ---

    async fn insert_doubt(&self, doubt: NewDoubt) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO doubts (student_id, topic, doubt_text, question_id, priority, \
             image_path) VALUES ($1, $2, $3, $4, $5, $6) RETURNING doubt_id",
        )
        .bind(doubt.student_id)
        .bind(&doubt.topic)
        .bind(&doubt.doubt_text)
        .bind(doubt.question_id)
        .bind(doubt.priority.as_str())
        .bind(&doubt.image_path)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn doubts_for_student(&self, student_id: Uuid) -> PortResult<Vec<StudentDoubtRow>> {
        let records = sqlx::query_as::<_, StudentDoubtRecord>(&format!(
            "SELECT {DOUBT_COLUMNS}, \
             nullif(trim(u.first_name || ' ' || u.last_name), '') AS teacher_name \
             FROM doubts d LEFT JOIN users u ON d.teacher_id = u.user_id \
             WHERE d.student_id = $1 ORDER BY d.created_at DESC"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| StudentDoubtRow {
                doubt: r.doubt.to_domain(),
                teacher_name: r.teacher_name,
            })
            .collect())
    }

    async fn doubts_for_roster(&self, teacher_id: Uuid) -> PortResult<Vec<TeacherDoubtRow>> {
        let records = sqlx::query_as::<_, TeacherDoubtRecord>(&format!(
            "SELECT {DOUBT_COLUMNS}, \
             trim(u.first_name || ' ' || u.last_name) AS student_name \
             FROM doubts d JOIN users u ON d.student_id = u.user_id \
             WHERE d.student_id IN \
             (SELECT DISTINCT student_id FROM assignments WHERE teacher_id = $1) \
             ORDER BY CASE d.status WHEN 'Pending' THEN 0 \
                                    WHEN 'In_Progress' THEN 1 \
                                    WHEN 'Cleared' THEN 2 ELSE 3 END, \
                      d.created_at DESC"
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| TeacherDoubtRow {
                doubt: r.doubt.to_domain(),
                student_name: r.student_name,
            })
            .collect())
    }

    async fn doubt_belongs_to_roster(
        &self,
        doubt_id: Uuid,
        teacher_id: Uuid,
    ) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM doubts d \
             JOIN assignments a ON d.student_id = a.student_id \
             WHERE d.doubt_id = $1 AND a.teacher_id = $2)",
        )
        .bind(doubt_id)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn resolve_doubt(
        &self,
        doubt_id: Uuid,
        teacher_id: Uuid,
        resolution: &str,
    ) -> PortResult<()> {
        let done = sqlx::query(
            "UPDATE doubts SET teacher_id = $2, resolution_text = $3, status = 'Cleared', \
             resolved_at = now() WHERE doubt_id = $1",
        )
        .bind(doubt_id)
        .bind(teacher_id)
        .bind(resolution)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if done.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Doubt {} not found", doubt_id)));
        }
        Ok(())
    }

    async fn pending_doubts_count(&self, teacher_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM doubts d WHERE d.status = 'Pending' AND d.student_id IN \
             (SELECT DISTINCT student_id FROM assignments WHERE teacher_id = $1)",
        )
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn doubt_frequency(&self, teacher_id: Uuid) -> PortResult<Vec<TopicCount>> {
        #[derive(FromRow)]
        struct FrequencyRecord {
            topic: String,
            count: i64,
        }
        let records = sqlx::query_as::<_, FrequencyRecord>(
            "SELECT d.topic, COUNT(*) AS count FROM doubts d WHERE d.student_id IN \
             (SELECT DISTINCT student_id FROM assignments WHERE teacher_id = $1) \
             GROUP BY d.topic ORDER BY count DESC",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| TopicCount {
                topic: r.topic,
                count: r.count,
            })
            .collect())
    }

    async fn doubt_for_image(&self, image_path: &str) -> PortResult<Option<Doubt>> {
        let record = sqlx::query_as::<_, DoubtRecord>(&format!(
            "SELECT {DOUBT_COLUMNS} FROM doubts d WHERE d.image_path = $1"
        ))
        .bind(image_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    // --- Submissions ---

    async fn upsert_submission(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        file_path: &str,
        file_name: &str,
        file_size: i64,
    ) -> PortResult<bool> {
        // `xmax = 0` distinguishes a fresh insert from a conflict-update.
        sqlx::query_scalar::<_, bool>(
            "INSERT INTO assignment_submissions \
             (assignment_id, student_id, file_path, file_name, file_size) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (assignment_id, student_id) DO UPDATE SET \
             file_path = EXCLUDED.file_path, file_name = EXCLUDED.file_name, \
             file_size = EXCLUDED.file_size, submitted_at = now() \
             RETURNING (xmax = 0) AS inserted",
        )
        .bind(assignment_id)
        .bind(student_id)
        .bind(file_path)
        .bind(file_name)
        .bind(file_size)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn submissions_for_student(
        &self,
        student_id: Uuid,
    ) -> PortResult<Vec<StudentSubmissionRow>> {
        let records = sqlx::query_as::<_, StudentSubmissionRecord>(&format!(
            "SELECT {SUBMISSION_COLUMNS}, a.exam_id, e.exam_name, a.status, a.due_date \
             FROM assignment_submissions sub \
             JOIN assignments a ON sub.assignment_id = a.assignment_id \
             JOIN exams e ON a.exam_id = e.exam_id \
             WHERE sub.student_id = $1 ORDER BY sub.submitted_at DESC"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| StudentSubmissionRow {
                submission: r.submission.to_domain(),
                exam_id: r.exam_id,
                exam_name: r.exam_name,
                status: AssignmentStatus::parse(&r.status).unwrap_or(AssignmentStatus::Assigned),
                due_date: r.due_date,
            })
            .collect())
    }

    async fn submissions_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> PortResult<Vec<TeacherSubmissionRow>> {
        let records = sqlx::query_as::<_, TeacherSubmissionRecord>(&format!(
            "SELECT {SUBMISSION_COLUMNS}, \
             trim(u.first_name || ' ' || u.last_name) AS student_name, \
             u.username AS student_username, a.due_date \
             FROM assignment_submissions sub \
             JOIN assignments a ON sub.assignment_id = a.assignment_id \
             JOIN users u ON sub.student_id = u.user_id \
             WHERE sub.assignment_id = $1 ORDER BY sub.submitted_at DESC"
        ))
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| TeacherSubmissionRow {
                submission: r.submission.to_domain(),
                student_name: r.student_name,
                student_username: r.student_username,
                due_date: r.due_date,
            })
            .collect())
    }

    async fn submission_belongs_to_teacher(
        &self,
        submission_id: Uuid,
        teacher_id: Uuid,
    ) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM assignment_submissions sub \
             JOIN assignments a ON sub.assignment_id = a.assignment_id \
             WHERE sub.submission_id = $1 AND a.teacher_id = $2)",
        )
        .bind(submission_id)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn grade_submission(
        &self,
        submission_id: Uuid,
        grade: &str,
        feedback: &str,
    ) -> PortResult<()> {
        let done = sqlx::query(
            "UPDATE assignment_submissions SET grade = $2, teacher_feedback = $3, \
             graded_at = now() WHERE submission_id = $1",
        )
        .bind(submission_id)
        .bind(grade)
        .bind(feedback)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if done.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Submission {} not found",
                submission_id
            )));
        }
        Ok(())
    }

    async fn can_access_assignment_files(
        &self,
        assignment_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM assignments \
             WHERE assignment_id = $1 AND (student_id = $2 OR teacher_id = $2))",
        )
        .bind(assignment_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }
}
