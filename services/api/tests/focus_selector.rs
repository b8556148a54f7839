//! services/api/tests/focus_selector.rs
//!
//! Exercises the focus-session selector's fallback chain and the scoring
//! path through the real handlers, backed by an in-memory stub store.

use api_lib::config::Config;
use api_lib::web::state::AppState;
use api_lib::web::student::{
    focus_session_questions_handler, submit_focus_session_handler, weakness_topics_handler,
    FocusSubmission,
};
use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, NaiveDate, Utc};
use learnmatrix_core::achievements::StudentSnapshot;
use learnmatrix_core::analytics::{QuestionAttempts, TopicAggregate};
use learnmatrix_core::domain::{
    Achievement, ActivityEntry, Doubt, Exam, Question, Role, SessionUser, User, UserCredentials,
};
use learnmatrix_core::ports::{
    ActivityBreakdown, AnswerKeyEntry, CompletionCounts, DailyScore, FileStorageService,
    NewActivity, NewDoubt, NewResult, NewUser, OverallStats, PortError, PortResult, ScoreBucket,
    StoreService, StudentAssignmentRow, StudentDoubtRow, StudentSubmissionRow,
    TeacherAssignmentRow, TeacherDoubtRow, TeacherSubmissionRow, TopStudent, TopicCount,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn not_wired<T>() -> PortResult<T> {
    Err(PortError::Unexpected("not wired in this test".to_string()))
}

/// A stub store: the selector- and scoring-related methods are fed from
/// fields, everything else errors if touched.
#[derive(Default)]
struct StubStore {
    topic_rows: Vec<TopicAggregate>,
    topic_questions: Vec<Question>,
    exam_questions: Vec<Question>,
    any_questions: Vec<Question>,
    key: Vec<AnswerKeyEntry>,
    inserted_results: Mutex<Vec<NewResult>>,
}

#[async_trait]
impl StoreService for StubStore {
    async fn ping(&self) -> PortResult<()> {
        Ok(())
    }

    async fn create_user(&self, _user: NewUser) -> PortResult<Uuid> {
        not_wired()
    }
    async fn get_credentials(&self, _identifier: &str) -> PortResult<UserCredentials> {
        not_wired()
    }
    async fn touch_last_login(&self, _user_id: Uuid) -> PortResult<()> {
        not_wired()
    }
    async fn create_auth_session(
        &self,
        _session_id: &str,
        _user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        not_wired()
    }
    async fn validate_auth_session(&self, _session_id: &str) -> PortResult<SessionUser> {
        not_wired()
    }
    async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
        not_wired()
    }

    async fn list_exams(&self) -> PortResult<Vec<Exam>> {
        not_wired()
    }
    async fn count_exams(&self) -> PortResult<i64> {
        not_wired()
    }
    async fn sample_questions_for_topics(
        &self,
        _exam_id: Uuid,
        _topics: &[String],
        _limit: i64,
    ) -> PortResult<Vec<Question>> {
        Ok(self.topic_questions.clone())
    }
    async fn sample_questions_for_exam(
        &self,
        _exam_id: Uuid,
        _limit: i64,
    ) -> PortResult<Vec<Question>> {
        Ok(self.exam_questions.clone())
    }
    async fn sample_questions_any(&self, _limit: i64) -> PortResult<Vec<Question>> {
        Ok(self.any_questions.clone())
    }
    async fn answer_key(&self, _question_ids: &[Uuid]) -> PortResult<Vec<AnswerKeyEntry>> {
        Ok(self.key.clone())
    }

    async fn insert_result(&self, result: NewResult) -> PortResult<()> {
        self.inserted_results
            .lock()
            .expect("results mutex")
            .push(result);
        Ok(())
    }
    async fn topic_aggregates(&self, _student_id: Uuid) -> PortResult<Vec<TopicAggregate>> {
        Ok(self.topic_rows.clone())
    }
    async fn overall_stats(&self, _student_id: Uuid) -> PortResult<OverallStats> {
        not_wired()
    }
    async fn daily_progression(
        &self,
        _student_id: Uuid,
        _days: i64,
    ) -> PortResult<Vec<DailyScore>> {
        not_wired()
    }
    async fn average_score(&self, _student_id: Uuid) -> PortResult<Option<f64>> {
        not_wired()
    }

    async fn insert_activity(&self, _activity: NewActivity) -> PortResult<()> {
        Ok(())
    }
    async fn recent_activity(
        &self,
        _user_id: Uuid,
        _limit: i64,
    ) -> PortResult<Vec<ActivityEntry>> {
        not_wired()
    }
    async fn activity_breakdown(&self, _user_id: Uuid) -> PortResult<Vec<ActivityBreakdown>> {
        not_wired()
    }
    async fn total_activity_seconds(&self, _user_id: Uuid) -> PortResult<i64> {
        not_wired()
    }
    async fn total_focus_seconds(&self, _user_id: Uuid) -> PortResult<i64> {
        not_wired()
    }
    async fn focus_seconds_since(
        &self,
        _user_id: Uuid,
        _since: DateTime<Utc>,
    ) -> PortResult<i64> {
        not_wired()
    }

    async fn student_assignments(
        &self,
        _student_id: Uuid,
    ) -> PortResult<Vec<StudentAssignmentRow>> {
        not_wired()
    }
    async fn assignment_counts(
        &self,
        _student_id: Uuid,
        _teacher_id: Option<Uuid>,
    ) -> PortResult<CompletionCounts> {
        not_wired()
    }
    async fn assignment_counts_for_teacher(
        &self,
        _teacher_id: Uuid,
    ) -> PortResult<CompletionCounts> {
        not_wired()
    }
    async fn create_assignment_if_absent(
        &self,
        _teacher_id: Uuid,
        _student_id: Uuid,
        _exam_id: Uuid,
        _due_date: Option<NaiveDate>,
    ) -> PortResult<bool> {
        not_wired()
    }
    async fn assignment_belongs_to_student(
        &self,
        _assignment_id: Uuid,
        _student_id: Uuid,
    ) -> PortResult<bool> {
        not_wired()
    }
    async fn assignment_belongs_to_teacher(
        &self,
        _assignment_id: Uuid,
        _teacher_id: Uuid,
    ) -> PortResult<bool> {
        not_wired()
    }
    async fn mark_assignment_completed(&self, _assignment_id: Uuid) -> PortResult<()> {
        not_wired()
    }
    async fn teacher_assignment_rows(
        &self,
        _teacher_id: Uuid,
    ) -> PortResult<Vec<TeacherAssignmentRow>> {
        not_wired()
    }
    async fn assigned_students(&self, _teacher_id: Uuid) -> PortResult<Vec<User>> {
        not_wired()
    }
    async fn assigned_student_ids(&self, _teacher_id: Uuid) -> PortResult<Vec<Uuid>> {
        not_wired()
    }
    async fn all_students(&self) -> PortResult<Vec<User>> {
        not_wired()
    }
    async fn teacher_of_student(&self, _student_id: Uuid) -> PortResult<Option<Uuid>> {
        not_wired()
    }
    async fn count_assigned_students(&self, _teacher_id: Uuid) -> PortResult<i64> {
        not_wired()
    }
    async fn tests_taken_by_roster(&self, _teacher_id: Uuid) -> PortResult<i64> {
        not_wired()
    }
    async fn roster_average_performance(&self, _teacher_id: Uuid) -> PortResult<Option<f64>> {
        not_wired()
    }
    async fn roster_focus_seconds(&self, _teacher_id: Uuid) -> PortResult<i64> {
        not_wired()
    }

    async fn score_distribution(&self, _teacher_id: Uuid) -> PortResult<Vec<ScoreBucket>> {
        not_wired()
    }
    async fn top_students(&self, _teacher_id: Uuid, _limit: i64) -> PortResult<Vec<TopStudent>> {
        not_wired()
    }
    async fn assignment_completion_trend(
        &self,
        _teacher_id: Uuid,
        _limit: i64,
    ) -> PortResult<Vec<TeacherAssignmentRow>> {
        not_wired()
    }
    async fn question_attempts(
        &self,
        _exam_id: Uuid,
        _teacher_id: Uuid,
    ) -> PortResult<Vec<QuestionAttempts>> {
        not_wired()
    }

    async fn achievements_for(&self, _student_id: Uuid) -> PortResult<Vec<Achievement>> {
        not_wired()
    }
    async fn trophy_count(&self, _student_id: Uuid) -> PortResult<i64> {
        not_wired()
    }
    async fn earned_trophy_names(&self, _student_id: Uuid) -> PortResult<Vec<String>> {
        Ok(Vec::new())
    }
    async fn student_snapshot(&self, _student_id: Uuid) -> PortResult<StudentSnapshot> {
        Ok(StudentSnapshot::default())
    }
    async fn grant_achievement(
        &self,
        _student_id: Uuid,
        _trophy_name: &str,
        _description: &str,
        _badge: &str,
        _points: i32,
    ) -> PortResult<bool> {
        Ok(true)
    }

    async fn insert_doubt(&self, _doubt: NewDoubt) -> PortResult<Uuid> {
        not_wired()
    }
    async fn doubts_for_student(&self, _student_id: Uuid) -> PortResult<Vec<StudentDoubtRow>> {
        not_wired()
    }
    async fn doubts_for_roster(&self, _teacher_id: Uuid) -> PortResult<Vec<TeacherDoubtRow>> {
        not_wired()
    }
    async fn doubt_belongs_to_roster(
        &self,
        _doubt_id: Uuid,
        _teacher_id: Uuid,
    ) -> PortResult<bool> {
        not_wired()
    }
    async fn resolve_doubt(
        &self,
        _doubt_id: Uuid,
        _teacher_id: Uuid,
        _resolution: &str,
    ) -> PortResult<()> {
        not_wired()
    }
    async fn pending_doubts_count(&self, _teacher_id: Uuid) -> PortResult<i64> {
        not_wired()
    }
    async fn doubt_frequency(&self, _teacher_id: Uuid) -> PortResult<Vec<TopicCount>> {
        not_wired()
    }
    async fn doubt_for_image(&self, _image_path: &str) -> PortResult<Option<Doubt>> {
        not_wired()
    }

    async fn upsert_submission(
        &self,
        _assignment_id: Uuid,
        _student_id: Uuid,
        _file_path: &str,
        _file_name: &str,
        _file_size: i64,
    ) -> PortResult<bool> {
        not_wired()
    }
    async fn submissions_for_student(
        &self,
        _student_id: Uuid,
    ) -> PortResult<Vec<StudentSubmissionRow>> {
        not_wired()
    }
    async fn submissions_for_assignment(
        &self,
        _assignment_id: Uuid,
    ) -> PortResult<Vec<TeacherSubmissionRow>> {
        not_wired()
    }
    async fn submission_belongs_to_teacher(
        &self,
        _submission_id: Uuid,
        _teacher_id: Uuid,
    ) -> PortResult<bool> {
        not_wired()
    }
    async fn grade_submission(
        &self,
        _submission_id: Uuid,
        _grade: &str,
        _feedback: &str,
    ) -> PortResult<()> {
        not_wired()
    }
    async fn can_access_assignment_files(
        &self,
        _assignment_id: Uuid,
        _user_id: Uuid,
    ) -> PortResult<bool> {
        not_wired()
    }
}

struct StubFiles;

#[async_trait]
impl FileStorageService for StubFiles {
    async fn save_doubt_image(&self, _stored_name: &str, _bytes: &[u8]) -> PortResult<String> {
        not_wired()
    }
    async fn save_submission(
        &self,
        _assignment_id: Uuid,
        _stored_name: &str,
        _bytes: &[u8],
    ) -> PortResult<(String, i64)> {
        not_wired()
    }
    fn resolve(&self, _relative_path: &str) -> PortResult<std::path::PathBuf> {
        not_wired()
    }
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().expect("bind address"),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        upload_root: std::path::PathBuf::from("/tmp"),
        session_ttl_days: 7,
        max_upload_bytes: 16 * 1024 * 1024,
        cors_origin: "http://localhost:3000".to_string(),
    }
}

fn make_state(store: StubStore) -> Arc<AppState> {
    make_state_shared(Arc::new(store))
}

fn make_state_shared(store: Arc<StubStore>) -> Arc<AppState> {
    Arc::new(AppState {
        store,
        files: Arc::new(StubFiles),
        config: Arc::new(test_config()),
    })
}

fn student() -> SessionUser {
    SessionUser {
        user_id: Uuid::new_v4(),
        username: "priya".to_string(),
        role: Role::Student,
        first_name: "Priya".to_string(),
        last_name: "Nair".to_string(),
    }
}

fn question(topic: &str) -> Question {
    Question {
        question_id: Uuid::new_v4(),
        exam_id: Uuid::new_v4(),
        topic: topic.to_string(),
        sub_topic: None,
        question_text: format!("A {} question", topic),
        options: vec!["A".to_string(), "B".to_string()],
        difficulty_level: "Medium".to_string(),
    }
}

fn aggregate(topic: &str, avg: f64) -> TopicAggregate {
    TopicAggregate {
        topic: topic.to_string(),
        avg_percentage: avg,
        attempt_count: 3,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse body")
}

#[tokio::test]
async fn selector_prefers_weak_topic_questions() {
    let store = StubStore {
        topic_rows: vec![aggregate("Geometry", 35.0), aggregate("Algebra", 80.0)],
        topic_questions: vec![question("Geometry"), question("Geometry")],
        exam_questions: vec![question("History")],
        ..Default::default()
    };
    let response = focus_session_questions_handler(
        State(make_state(store)),
        Extension(student()),
        Path(Uuid::new_v4()),
    )
    .await
    .expect("handler ok")
    .into_response();

    let body = body_json(response).await;
    assert_eq!(body["totalQuestions"], 2);
    assert_eq!(body["questions"][0]["topic"], "Geometry");
    assert_eq!(body["focusTopics"][0], "Geometry");
}

#[tokio::test]
async fn selector_falls_back_to_exam_then_global_pool() {
    // Weak topics exist but match nothing in the exam.
    let store = StubStore {
        topic_rows: vec![aggregate("Geometry", 35.0)],
        exam_questions: vec![question("History")],
        ..Default::default()
    };
    let response = focus_session_questions_handler(
        State(make_state(store)),
        Extension(student()),
        Path(Uuid::new_v4()),
    )
    .await
    .expect("handler ok")
    .into_response();
    let body = body_json(response).await;
    assert_eq!(body["totalQuestions"], 1);
    assert_eq!(body["questions"][0]["topic"], "History");

    // The exam is empty too; the global pool is the last resort.
    let store = StubStore {
        topic_rows: vec![aggregate("Geometry", 35.0)],
        any_questions: vec![question("Physics")],
        ..Default::default()
    };
    let response = focus_session_questions_handler(
        State(make_state(store)),
        Extension(student()),
        Path(Uuid::new_v4()),
    )
    .await
    .expect("handler ok")
    .into_response();
    let body = body_json(response).await;
    assert_eq!(body["questions"][0]["topic"], "Physics");
}

#[tokio::test]
async fn selector_with_no_questions_anywhere_returns_empty_set() {
    let store = StubStore {
        topic_rows: vec![aggregate("Geometry", 35.0)],
        ..Default::default()
    };
    let response = focus_session_questions_handler(
        State(make_state(store)),
        Extension(student()),
        Path(Uuid::new_v4()),
    )
    .await
    .expect("handler ok")
    .into_response();
    let body = body_json(response).await;
    assert_eq!(body["totalQuestions"], 0);
}

#[tokio::test]
async fn weakness_endpoint_reports_no_data_without_results() {
    let response = weakness_topics_handler(
        State(make_state(StubStore::default())),
        Extension(student()),
    )
    .await
    .expect("handler ok")
    .into_response();
    let body = body_json(response).await;
    assert_eq!(body["weaknessTopics"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["message"], "No test data available yet");
}

#[tokio::test]
async fn seven_of_ten_correct_stores_seventy_percent() {
    let questions: Vec<Question> = (0..10).map(|_| question("Algebra")).collect();
    let key: Vec<AnswerKeyEntry> = questions
        .iter()
        .map(|q| AnswerKeyEntry {
            question_id: q.question_id,
            correct_answer: "A".to_string(),
            topic: q.topic.clone(),
        })
        .collect();

    // First 7 answered correctly, last 3 wrong.
    let mut answers = std::collections::HashMap::new();
    for (i, q) in questions.iter().enumerate() {
        let given = if i < 7 { "A" } else { "B" };
        answers.insert(q.question_id, given.to_string());
    }

    let stub = Arc::new(StubStore {
        key,
        ..Default::default()
    });
    let state = make_state_shared(stub.clone());
    let response = submit_focus_session_handler(
        State(state),
        Extension(student()),
        Json(FocusSubmission {
            exam_id: Uuid::new_v4(),
            answers,
            duration: 300,
        }),
    )
    .await
    .expect("handler ok")
    .into_response();

    let body = body_json(response).await;
    assert_eq!(body["percentage"], 70.0);
    assert_eq!(body["correctAnswers"], 7);
    assert_eq!(body["totalQuestions"], 10);

    // The stored row carries the same score and the dominant topic.
    let stored = stub.inserted_results.lock().expect("results mutex");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].percentage, 70.0);
    assert_eq!(stored[0].answers_correct, 7);
    assert_eq!(stored[0].topic, "Algebra");
}
