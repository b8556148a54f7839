//! crates/learnmatrix_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or file
//! systems.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::achievements::StudentSnapshot;
use crate::analytics::{QuestionAttempts, TopicAggregate};
use crate::domain::{
    Achievement, ActivityEntry, ActivityKind, AssignmentStatus, Doubt, DoubtPriority, Exam,
    Question, Role, SessionUser, Submission, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, disk).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Row Shapes Crossing the Store Boundary
//=========================================================================================

/// A new user, pre-hashed, ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

/// A freshly scored attempt, ready to insert.
#[derive(Debug, Clone)]
pub struct NewResult {
    pub student_id: Uuid,
    pub exam_id: Uuid,
    pub topic: String,
    pub percentage: f64,
    pub answers_correct: i32,
    pub completion_time_secs: i32,
}

/// A new activity-log row.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub activity_type: ActivityKind,
    pub duration_secs: i64,
    pub exam_id: Option<Uuid>,
    pub assignment_id: Option<Uuid>,
    pub details: serde_json::Value,
}

/// A new doubt as submitted by a student.
#[derive(Debug, Clone)]
pub struct NewDoubt {
    pub student_id: Uuid,
    pub topic: String,
    pub doubt_text: String,
    pub question_id: Option<Uuid>,
    pub priority: DoubtPriority,
    pub image_path: Option<String>,
}

/// The grading key for a set of questions.
#[derive(Debug, Clone)]
pub struct AnswerKeyEntry {
    pub question_id: Uuid,
    pub correct_answer: String,
    pub topic: String,
}

/// Completed/total assignment counts for one student or teacher scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionCounts {
    pub completed: i64,
    pub total: i64,
}

/// One row of the student's assignment list, joined with its exam.
#[derive(Debug, Clone)]
pub struct StudentAssignmentRow {
    pub assignment_id: Uuid,
    pub exam_id: Uuid,
    pub exam_name: String,
    pub total_questions: i32,
    pub due_date: Option<NaiveDate>,
    pub status: AssignmentStatus,
    pub score: Option<f64>,
}

/// Overall result statistics for one student.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverallStats {
    pub total_tests: i64,
    pub avg_score: Option<f64>,
    pub best_score: Option<f64>,
    pub lowest_score: Option<f64>,
}

/// Mean percentage across a day's attempts.
#[derive(Debug, Clone)]
pub struct DailyScore {
    pub date: NaiveDate,
    pub avg_percentage: f64,
}

/// Count and accumulated seconds per activity type.
#[derive(Debug, Clone)]
pub struct ActivityBreakdown {
    pub activity_type: String,
    pub count: i64,
    pub total_secs: i64,
}

/// A doubt on the student's own list, with the resolving teacher's name.
#[derive(Debug, Clone)]
pub struct StudentDoubtRow {
    pub doubt: Doubt,
    pub teacher_name: Option<String>,
}

/// A doubt on the teacher's queue, with the raising student's name.
#[derive(Debug, Clone)]
pub struct TeacherDoubtRow {
    pub doubt: Doubt,
    pub student_name: String,
}

/// Doubt count per topic.
#[derive(Debug, Clone)]
pub struct TopicCount {
    pub topic: String,
    pub count: i64,
}

/// One batch row of the teacher's assignment overview.
#[derive(Debug, Clone)]
pub struct TeacherAssignmentRow {
    pub exam_id: Uuid,
    pub exam_name: String,
    pub due_date: Option<NaiveDate>,
    pub student_count: i64,
    pub completed_count: i64,
}

/// Number of results falling in one score range.
#[derive(Debug, Clone)]
pub struct ScoreBucket {
    pub range: String,
    pub count: i64,
}

/// A top-performing student on the class analytics panel.
#[derive(Debug, Clone)]
pub struct TopStudent {
    pub name: String,
    pub avg_score: f64,
}

/// A submission on the student's own list, joined with its assignment.
#[derive(Debug, Clone)]
pub struct StudentSubmissionRow {
    pub submission: Submission,
    pub exam_id: Uuid,
    pub exam_name: String,
    pub status: AssignmentStatus,
    pub due_date: Option<NaiveDate>,
}

/// A submission as the grading teacher sees it.
#[derive(Debug, Clone)]
pub struct TeacherSubmissionRow {
    pub submission: Submission,
    pub student_name: String,
    pub student_username: String,
    pub due_date: Option<NaiveDate>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait StoreService: Send + Sync {
    /// Cheap connectivity probe for the health endpoint.
    async fn ping(&self) -> PortResult<()>;

    // --- Users & Auth ---
    async fn create_user(&self, user: NewUser) -> PortResult<Uuid>;
    /// Looks the user up by username or email, for login.
    async fn get_credentials(&self, identifier: &str) -> PortResult<UserCredentials>;
    async fn touch_last_login(&self, user_id: Uuid) -> PortResult<()>;
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;
    /// Resolves a session cookie to the acting identity; expired or
    /// unknown sessions are `Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<SessionUser>;
    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Exams & Questions ---
    async fn list_exams(&self) -> PortResult<Vec<Exam>>;
    async fn count_exams(&self) -> PortResult<i64>;
    /// Random sample of exam questions restricted to the given topics.
    async fn sample_questions_for_topics(
        &self,
        exam_id: Uuid,
        topics: &[String],
        limit: i64,
    ) -> PortResult<Vec<Question>>;
    /// Random sample from one exam, any topic.
    async fn sample_questions_for_exam(&self, exam_id: Uuid, limit: i64)
        -> PortResult<Vec<Question>>;
    /// Random sample across every exam in the system.
    async fn sample_questions_any(&self, limit: i64) -> PortResult<Vec<Question>>;
    async fn answer_key(&self, question_ids: &[Uuid]) -> PortResult<Vec<AnswerKeyEntry>>;

    // --- Results ---
    async fn insert_result(&self, result: NewResult) -> PortResult<()>;
    async fn topic_aggregates(&self, student_id: Uuid) -> PortResult<Vec<TopicAggregate>>;
    async fn overall_stats(&self, student_id: Uuid) -> PortResult<OverallStats>;
    async fn daily_progression(&self, student_id: Uuid, days: i64) -> PortResult<Vec<DailyScore>>;
    async fn average_score(&self, student_id: Uuid) -> PortResult<Option<f64>>;

    // --- Activity ---
    async fn insert_activity(&self, activity: NewActivity) -> PortResult<()>;
    /// The newest activity rows, for the recent-activity widget.
    async fn recent_activity(&self, user_id: Uuid, limit: i64) -> PortResult<Vec<ActivityEntry>>;
    async fn activity_breakdown(&self, user_id: Uuid) -> PortResult<Vec<ActivityBreakdown>>;
    async fn total_activity_seconds(&self, user_id: Uuid) -> PortResult<i64>;
    async fn total_focus_seconds(&self, user_id: Uuid) -> PortResult<i64>;
    /// FocusSession seconds logged at or after `since`.
    async fn focus_seconds_since(&self, user_id: Uuid, since: DateTime<Utc>) -> PortResult<i64>;

    // --- Assignments ---
    async fn student_assignments(&self, student_id: Uuid) -> PortResult<Vec<StudentAssignmentRow>>;
    /// Completed/total for a student, optionally scoped to one teacher.
    async fn assignment_counts(
        &self,
        student_id: Uuid,
        teacher_id: Option<Uuid>,
    ) -> PortResult<CompletionCounts>;
    async fn assignment_counts_for_teacher(&self, teacher_id: Uuid)
        -> PortResult<CompletionCounts>;
    /// Creates the assignment unless the (teacher, student, exam) triple
    /// already exists; returns whether a row was written.
    async fn create_assignment_if_absent(
        &self,
        teacher_id: Uuid,
        student_id: Uuid,
        exam_id: Uuid,
        due_date: Option<NaiveDate>,
    ) -> PortResult<bool>;
    async fn assignment_belongs_to_student(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
    ) -> PortResult<bool>;
    async fn assignment_belongs_to_teacher(
        &self,
        assignment_id: Uuid,
        teacher_id: Uuid,
    ) -> PortResult<bool>;
    async fn mark_assignment_completed(&self, assignment_id: Uuid) -> PortResult<()>;
    async fn teacher_assignment_rows(&self, teacher_id: Uuid)
        -> PortResult<Vec<TeacherAssignmentRow>>;
    async fn assigned_students(&self, teacher_id: Uuid) -> PortResult<Vec<User>>;
    async fn assigned_student_ids(&self, teacher_id: Uuid) -> PortResult<Vec<Uuid>>;
    async fn all_students(&self) -> PortResult<Vec<User>>;
    /// A teacher of this student, taken from assignment history.
    async fn teacher_of_student(&self, student_id: Uuid) -> PortResult<Option<Uuid>>;
    async fn count_assigned_students(&self, teacher_id: Uuid) -> PortResult<i64>;
    async fn tests_taken_by_roster(&self, teacher_id: Uuid) -> PortResult<i64>;
    async fn roster_average_performance(&self, teacher_id: Uuid) -> PortResult<Option<f64>>;
    async fn roster_focus_seconds(&self, teacher_id: Uuid) -> PortResult<i64>;

    // --- Class analytics ---
    async fn score_distribution(&self, teacher_id: Uuid) -> PortResult<Vec<ScoreBucket>>;
    async fn top_students(&self, teacher_id: Uuid, limit: i64) -> PortResult<Vec<TopStudent>>;
    async fn assignment_completion_trend(
        &self,
        teacher_id: Uuid,
        limit: i64,
    ) -> PortResult<Vec<TeacherAssignmentRow>>;
    async fn question_attempts(
        &self,
        exam_id: Uuid,
        teacher_id: Uuid,
    ) -> PortResult<Vec<QuestionAttempts>>;

    // --- Achievements ---
    async fn achievements_for(&self, student_id: Uuid) -> PortResult<Vec<Achievement>>;
    async fn trophy_count(&self, student_id: Uuid) -> PortResult<i64>;
    async fn earned_trophy_names(&self, student_id: Uuid) -> PortResult<Vec<String>>;
    /// Gathers everything the unlock predicates need in one round trip.
    async fn student_snapshot(&self, student_id: Uuid) -> PortResult<StudentSnapshot>;
    /// Conditional insert keyed on (student, trophy name); returns whether
    /// a new trophy was actually granted.
    async fn grant_achievement(
        &self,
        student_id: Uuid,
        trophy_name: &str,
        description: &str,
        badge: &str,
        points: i32,
    ) -> PortResult<bool>;

    // --- Doubts ---
    async fn insert_doubt(&self, doubt: NewDoubt) -> PortResult<Uuid>;
    async fn doubts_for_student(&self, student_id: Uuid) -> PortResult<Vec<StudentDoubtRow>>;
    async fn doubts_for_roster(&self, teacher_id: Uuid) -> PortResult<Vec<TeacherDoubtRow>>;
    async fn doubt_belongs_to_roster(&self, doubt_id: Uuid, teacher_id: Uuid)
        -> PortResult<bool>;
    async fn resolve_doubt(
        &self,
        doubt_id: Uuid,
        teacher_id: Uuid,
        resolution: &str,
    ) -> PortResult<()>;
    async fn pending_doubts_count(&self, teacher_id: Uuid) -> PortResult<i64>;
    async fn doubt_frequency(&self, teacher_id: Uuid) -> PortResult<Vec<TopicCount>>;
    /// The doubt a stored image belongs to, for download authorization.
    async fn doubt_for_image(&self, image_path: &str) -> PortResult<Option<Doubt>>;

    // --- Submissions ---
    /// Insert-or-replace keyed on (assignment, student); returns true when
    /// this was the first submission.
    async fn upsert_submission(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        file_path: &str,
        file_name: &str,
        file_size: i64,
    ) -> PortResult<bool>;
    async fn submissions_for_student(
        &self,
        student_id: Uuid,
    ) -> PortResult<Vec<StudentSubmissionRow>>;
    async fn submissions_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> PortResult<Vec<TeacherSubmissionRow>>;
    async fn submission_belongs_to_teacher(
        &self,
        submission_id: Uuid,
        teacher_id: Uuid,
    ) -> PortResult<bool>;
    async fn grade_submission(
        &self,
        submission_id: Uuid,
        grade: &str,
        feedback: &str,
    ) -> PortResult<()>;
    /// Whether `user_id` may read files of this assignment (its student or
    /// its teacher).
    async fn can_access_assignment_files(
        &self,
        assignment_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<bool>;
}

#[async_trait]
pub trait FileStorageService: Send + Sync {
    /// Persists a doubt image under the doubts directory; returns the
    /// stored path relative to the upload root.
    async fn save_doubt_image(&self, stored_name: &str, bytes: &[u8]) -> PortResult<String>;

    /// Persists a submission under its assignment's directory; returns the
    /// stored relative path and the byte size written.
    async fn save_submission(
        &self,
        assignment_id: Uuid,
        stored_name: &str,
        bytes: &[u8],
    ) -> PortResult<(String, i64)>;

    /// Maps a stored relative path back to an absolute path for download,
    /// refusing anything that escapes the upload root.
    fn resolve(&self, relative_path: &str) -> PortResult<std::path::PathBuf>;
}
