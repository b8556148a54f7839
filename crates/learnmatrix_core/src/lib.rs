pub mod achievements;
pub mod analytics;
pub mod domain;
pub mod ports;
pub mod uploads;

pub use domain::{
    Achievement, ActivityEntry, ActivityKind, AssignmentStatus, Doubt, DoubtPriority, DoubtStatus,
    Exam, Question, Role, SessionUser, Submission, User, UserCredentials,
};
pub use ports::{FileStorageService, PortError, PortResult, StoreService};
