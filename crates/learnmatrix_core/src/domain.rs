//! crates/learnmatrix_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two account roles the platform knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "Student" => Some(Role::Student),
            "Teacher" => Some(Role::Teacher),
            _ => None,
        }
    }
}

// Represents a user - used throughout the app.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name used in rosters and doubt listings.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let trimmed = name.trim();
        if trimmed.is_empty() {
            self.username.clone()
        } else {
            trimmed.to_string()
        }
    }
}

// Only used internally for login - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

/// The identity a validated session cookie resolves to. Handlers read this
/// from request extensions after the auth middleware has run.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

/// An exam available for assignment and focus drilling.
#[derive(Debug, Clone)]
pub struct Exam {
    pub exam_id: Uuid,
    pub exam_name: String,
    pub total_questions: i32,
    pub total_time_mins: i32,
}

/// A single question belonging to an exam.
#[derive(Debug, Clone)]
pub struct Question {
    pub question_id: Uuid,
    pub exam_id: Uuid,
    pub topic: String,
    pub sub_topic: Option<String>,
    pub question_text: String,
    pub options: Vec<String>,
    pub difficulty_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Assigned,
    Started,
    Completed,
    Overdue,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "Assigned",
            AssignmentStatus::Started => "Started",
            AssignmentStatus::Completed => "Completed",
            AssignmentStatus::Overdue => "Overdue",
        }
    }

    pub fn parse(s: &str) -> Option<AssignmentStatus> {
        match s {
            "Assigned" => Some(AssignmentStatus::Assigned),
            "Started" => Some(AssignmentStatus::Started),
            "Completed" => Some(AssignmentStatus::Completed),
            "Overdue" => Some(AssignmentStatus::Overdue),
            _ => None,
        }
    }
}

/// The activity types the log distinguishes. Drives study-hour and
/// engagement metrics, so the set is closed rather than free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Login,
    TestStart,
    TestSubmit,
    FocusSession,
    ViewedResources,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Login => "Login",
            ActivityKind::TestStart => "TestStart",
            ActivityKind::TestSubmit => "TestSubmit",
            ActivityKind::FocusSession => "FocusSession",
            ActivityKind::ViewedResources => "ViewedResources",
        }
    }

    pub fn parse(s: &str) -> Option<ActivityKind> {
        match s {
            "Login" => Some(ActivityKind::Login),
            "TestStart" => Some(ActivityKind::TestStart),
            "TestSubmit" => Some(ActivityKind::TestSubmit),
            "FocusSession" => Some(ActivityKind::FocusSession),
            "ViewedResources" => Some(ActivityKind::ViewedResources),
            _ => None,
        }
    }
}

/// One append-only activity log row.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub user_id: Uuid,
    pub activity_type: ActivityKind,
    pub duration_secs: i64,
    pub exam_id: Option<Uuid>,
    pub assignment_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

/// A trophy granted to a student. At most one row per
/// (student, trophy name) - enforced by the store.
#[derive(Debug, Clone)]
pub struct Achievement {
    pub achievement_id: Uuid,
    pub student_id: Uuid,
    pub trophy_name: String,
    pub description: String,
    pub badge: String,
    pub points: i32,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoubtStatus {
    Pending,
    #[serde(rename = "In_Progress")]
    InProgress,
    Cleared,
}

impl DoubtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoubtStatus::Pending => "Pending",
            DoubtStatus::InProgress => "In_Progress",
            DoubtStatus::Cleared => "Cleared",
        }
    }

    pub fn parse(s: &str) -> Option<DoubtStatus> {
        match s {
            "Pending" => Some(DoubtStatus::Pending),
            "In_Progress" => Some(DoubtStatus::InProgress),
            "Cleared" => Some(DoubtStatus::Cleared),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoubtPriority {
    Low,
    Medium,
    High,
}

impl DoubtPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoubtPriority::Low => "Low",
            DoubtPriority::Medium => "Medium",
            DoubtPriority::High => "High",
        }
    }

    /// Unknown values fall back to Medium, mirroring the submit form.
    pub fn parse_or_default(s: &str) -> DoubtPriority {
        match s {
            "Low" => DoubtPriority::Low,
            "High" => DoubtPriority::High,
            _ => DoubtPriority::Medium,
        }
    }
}

/// A student question awaiting (or holding) teacher resolution.
/// Lifecycle: created Pending -> optionally In_Progress -> Cleared with
/// resolution text and timestamp.
#[derive(Debug, Clone)]
pub struct Doubt {
    pub doubt_id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Option<Uuid>,
    pub question_id: Option<Uuid>,
    pub topic: String,
    pub doubt_text: String,
    pub priority: DoubtPriority,
    pub status: DoubtStatus,
    pub resolution_text: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A student's uploaded file for an assignment. One row per
/// (assignment, student); re-submission replaces the file.
#[derive(Debug, Clone)]
pub struct Submission {
    pub submission_id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub submitted_at: DateTime<Utc>,
    pub grade: Option<String>,
    pub teacher_feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
}
