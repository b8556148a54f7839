//! services/api/src/web/gamification.rs
//!
//! Best-effort achievement granting, invoked after scoring and
//! activity-logging events. Failures are logged and swallowed - a trophy
//! check must never fail the request that triggered it.

use learnmatrix_core::achievements;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::web::state::AppState;

/// Evaluates every unlock rule for the student and grants whatever is newly
/// due. The store insert is conditional on (student, trophy name), so
/// concurrent triggers can never double-grant.
pub async fn check_and_award_achievements(state: &Arc<AppState>, student_id: Uuid) {
    let snapshot = match state.store.student_snapshot(student_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Achievement check skipped, snapshot failed: {:?}", e);
            return;
        }
    };
    let earned = match state.store.earned_trophy_names(student_id).await {
        Ok(earned) => earned,
        Err(e) => {
            warn!("Achievement check skipped, earned list failed: {:?}", e);
            return;
        }
    };

    for rule in achievements::unlockable(&snapshot, &earned) {
        match state
            .store
            .grant_achievement(
                student_id,
                rule.trophy_name,
                rule.description,
                rule.badge,
                rule.points,
            )
            .await
        {
            Ok(true) => info!(student = %student_id, trophy = rule.trophy_name, "achievement granted"),
            // A concurrent request got there first; nothing to do.
            Ok(false) => {}
            Err(e) => warn!("Failed to grant '{}': {:?}", rule.trophy_name, e),
        }
    }
}
