pub mod activity;
pub mod auth;
pub mod downloads;
pub mod gamification;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod student;
pub mod teacher;

// Re-export the pieces the binary needs to build the web server router.
pub use middleware::{require_auth, require_teacher};
pub use rest::{health_handler, ApiDoc};
