//! crates/learnmatrix_core/src/achievements.rs
//!
//! Achievement-unlock rules. Each rule is an independent predicate over a
//! snapshot of the student's recent activity; evaluation order does not
//! matter and granting is monotonic - trophies are never taken back.

/// Five hours of focused study, in seconds.
pub const FOCUSED_LEARNER_TARGET_SECS: i64 = 18_000;
/// Minimum percentage that counts as a high score.
pub const HIGH_SCORER_THRESHOLD: f64 = 90.0;
/// Cleared doubts needed for Problem Solver.
pub const PROBLEM_SOLVER_TARGET: i64 = 5;

/// Everything the unlock predicates look at, gathered by the store in one
/// pass so the rules themselves stay pure.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentSnapshot {
    /// FocusSession seconds logged in the trailing 7 days.
    pub focus_secs_last_week: i64,
    /// Best result percentage ever recorded, if any.
    pub best_percentage: Option<f64>,
    /// Doubts this student raised that have been cleared.
    pub doubts_cleared: i64,
}

/// A single unlockable trophy.
pub struct AchievementRule {
    pub trophy_name: &'static str,
    pub description: &'static str,
    pub badge: &'static str,
    pub points: i32,
    pub unlocked: fn(&StudentSnapshot) -> bool,
}

fn focused_learner(s: &StudentSnapshot) -> bool {
    s.focus_secs_last_week >= FOCUSED_LEARNER_TARGET_SECS
}

fn high_scorer(s: &StudentSnapshot) -> bool {
    s.best_percentage.is_some_and(|p| p >= HIGH_SCORER_THRESHOLD)
}

fn problem_solver(s: &StudentSnapshot) -> bool {
    s.doubts_cleared >= PROBLEM_SOLVER_TARGET
}

/// The rule set. Extending the platform with a new trophy means adding a
/// row here and nothing else.
pub const RULES: &[AchievementRule] = &[
    AchievementRule {
        trophy_name: "Focused Learner",
        description: "Completed 5+ hours of focused study sessions",
        badge: "focus-badge",
        points: 50,
        unlocked: focused_learner,
    },
    AchievementRule {
        trophy_name: "High Scorer",
        description: "Scored 90% or higher on a test",
        badge: "star-badge",
        points: 100,
        unlocked: high_scorer,
    },
    AchievementRule {
        trophy_name: "Problem Solver",
        description: "Had 5 or more doubts resolved",
        badge: "solver-badge",
        points: 75,
        unlocked: problem_solver,
    },
];

/// Rules whose predicate holds and whose trophy the student does not
/// already hold. Pure, so calling it twice with the same inputs yields
/// the same grants - idempotence at the store comes from the conditional
/// insert on (student, trophy name).
pub fn unlockable<'a>(
    snapshot: &StudentSnapshot,
    already_earned: &[String],
) -> Vec<&'a AchievementRule> {
    RULES
        .iter()
        .filter(|rule| (rule.unlocked)(snapshot))
        .filter(|rule| !already_earned.iter().any(|t| t == rule.trophy_name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focused_learner_unlocks_at_five_hours() {
        let snapshot = StudentSnapshot {
            focus_secs_last_week: FOCUSED_LEARNER_TARGET_SECS,
            ..Default::default()
        };
        let grants = unlockable(&snapshot, &[]);
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].trophy_name, "Focused Learner");
    }

    #[test]
    fn just_under_five_hours_unlocks_nothing() {
        let snapshot = StudentSnapshot {
            focus_secs_last_week: FOCUSED_LEARNER_TARGET_SECS - 1,
            ..Default::default()
        };
        assert!(unlockable(&snapshot, &[]).is_empty());
    }

    #[test]
    fn high_scorer_requires_ninety_percent() {
        let below = StudentSnapshot {
            best_percentage: Some(89.9),
            ..Default::default()
        };
        assert!(unlockable(&below, &[]).is_empty());

        let at = StudentSnapshot {
            best_percentage: Some(90.0),
            ..Default::default()
        };
        let grants = unlockable(&at, &[]);
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].trophy_name, "High Scorer");
    }

    #[test]
    fn evaluation_is_idempotent_against_earned_set() {
        let snapshot = StudentSnapshot {
            best_percentage: Some(95.0),
            ..Default::default()
        };
        let first = unlockable(&snapshot, &[]);
        assert_eq!(first.len(), 1);

        // Second evaluation with the trophy now on record grants nothing.
        let earned = vec!["High Scorer".to_string()];
        assert!(unlockable(&snapshot, &earned).is_empty());
    }

    #[test]
    fn rules_are_independent() {
        let snapshot = StudentSnapshot {
            focus_secs_last_week: 20_000,
            best_percentage: Some(92.0),
            doubts_cleared: 6,
        };
        let grants = unlockable(&snapshot, &[]);
        assert_eq!(grants.len(), 3);
    }

    #[test]
    fn no_result_rows_never_unlocks_high_scorer() {
        let snapshot = StudentSnapshot::default();
        assert!(unlockable(&snapshot, &[]).is_empty());
    }
}
