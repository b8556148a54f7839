//! crates/learnmatrix_core/src/analytics.rs
//!
//! The performance-analytics computation layer: weakness-topic ranking,
//! engagement scoring with Bayesian smoothing, test scoring, and
//! question-effectiveness analysis.
//!
//! Everything here is a pure function over rows the store has already
//! fetched - no side effects, deterministic, unit-testable against
//! in-memory fixtures.

use serde::Serialize;

/// Prior assumed completion rate blended into small samples.
pub const COMPLETION_PRIOR_MEAN: f64 = 0.40;
/// Pseudo-observation count the prior is worth.
pub const COMPLETION_PRIOR_WEIGHT: f64 = 2.0;

/// Per-topic aggregate of a student's results, as fetched by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicAggregate {
    pub topic: String,
    pub avg_percentage: f64,
    pub attempt_count: i64,
}

/// Returns the student's weakest topics, ordered ascending by mean score,
/// at most `limit` of them. Zero input rows yield an empty vec - callers
/// surface that as "no data", not as an error.
///
/// Ties order ascending by topic name so the ranking is stable.
pub fn weakest_topics(rows: &[TopicAggregate], limit: usize) -> Vec<TopicAggregate> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| {
        a.avg_percentage
            .partial_cmp(&b.avg_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.topic.cmp(&b.topic))
    });
    ranked.truncate(limit);
    ranked
}

/// Assignment completion rate as a Bayesian-smoothed percentage:
/// `(completed + prior_mean * prior_weight) / (total + prior_weight) * 100`.
///
/// The smoothing keeps one-sample students from reading as 0% or 100%
/// (1 of 1 completed comes out at 60, not 100). A student with no
/// assignments at all rates 0.0, not the bare prior.
pub fn smoothed_completion_rate(completed: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 + COMPLETION_PRIOR_MEAN * COMPLETION_PRIOR_WEIGHT)
        / (total as f64 + COMPLETION_PRIOR_WEIGHT)
        * 100.0
}

/// Composite engagement metric used to rank students on the teacher roster.
pub fn engagement_score(study_hours: f64, completion_rate: f64, trophy_count: i64) -> f64 {
    study_hours * 0.3 + completion_rate * 0.004 + trophy_count as f64 * 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreLevel {
    Low,
    Medium,
    High,
}

/// Buckets an engagement score: <40 Low, 40-69 Medium, >=70 High.
pub fn score_level(score: f64) -> ScoreLevel {
    if score >= 70.0 {
        ScoreLevel::High
    } else if score >= 40.0 {
        ScoreLevel::Medium
    } else {
        ScoreLevel::Low
    }
}

/// Percentage scored on a test: `correct / total * 100`, 0.0 for an
/// empty answer sheet.
pub fn score_percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

/// Coarse label for an average score on the all-students table.
pub fn performance_level(avg_score: f64) -> &'static str {
    if avg_score >= 80.0 {
        "High"
    } else if avg_score >= 70.0 {
        "Good"
    } else if avg_score >= 60.0 {
        "Average"
    } else {
        "Below Average"
    }
}

/// The most frequent topic among the answered questions; ties break
/// ascending by name. Used to tag a result row with the topic it mostly
/// exercised.
pub fn dominant_topic<I, S>(topics: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for t in topics {
        *counts.entry(t.as_ref().to_string()).or_insert(0) += 1;
    }
    // On equal counts the comparator favours the alphabetically smaller
    // topic, so the result is deterministic.
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(topic, _)| topic)
}

//=========================================================================================
// Question Effectiveness
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    High,
    Medium,
    Low,
}

/// Difficulty from observed success rate: <30 High, <70 Medium, else Low.
pub fn classify_difficulty(success_rate: f64) -> Difficulty {
    if success_rate < 30.0 {
        Difficulty::High
    } else if success_rate < 70.0 {
        Difficulty::Medium
    } else {
        Difficulty::Low
    }
}

/// Per-question attempt aggregate, as fetched by the store for one exam
/// scoped to the requesting teacher's students.
#[derive(Debug, Clone)]
pub struct QuestionAttempts {
    pub question_id: uuid::Uuid,
    pub question_text: String,
    pub topic: String,
    pub sub_topic: Option<String>,
    pub avg_completion_time_secs: Option<f64>,
    pub attempts: i64,
    pub success_count: i64,
}

/// The analyzer's verdict on one question.
#[derive(Debug, Clone)]
pub struct QuestionEffectiveness {
    pub question_id: uuid::Uuid,
    pub question_text: String,
    pub topic: String,
    pub sub_topic: Option<String>,
    pub avg_completion_time_secs: f64,
    pub attempts: i64,
    pub success_rate: f64,
    pub difficulty: Difficulty,
}

/// Computes success rate and difficulty per question and ranks ascending
/// by success rate (hardest first). A question nobody attempted scores
/// 0.0 - never a division by zero.
pub fn analyze_question_effectiveness(rows: Vec<QuestionAttempts>) -> Vec<QuestionEffectiveness> {
    let mut analyzed: Vec<QuestionEffectiveness> = rows
        .into_iter()
        .map(|row| {
            let success_rate = if row.attempts > 0 {
                row.success_count as f64 / row.attempts as f64 * 100.0
            } else {
                0.0
            };
            QuestionEffectiveness {
                question_id: row.question_id,
                question_text: row.question_text,
                topic: row.topic,
                sub_topic: row.sub_topic,
                avg_completion_time_secs: row.avg_completion_time_secs.unwrap_or(0.0),
                attempts: row.attempts,
                success_rate,
                difficulty: classify_difficulty(success_rate),
            }
        })
        .collect();

    analyzed.sort_by(|a, b| {
        a.success_rate
            .partial_cmp(&b.success_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    analyzed
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(topic: &str, avg: f64, n: i64) -> TopicAggregate {
        TopicAggregate {
            topic: topic.to_string(),
            avg_percentage: avg,
            attempt_count: n,
        }
    }

    #[test]
    fn weakest_topics_returns_at_most_two_sorted_ascending() {
        let rows = vec![
            agg("Algebra", 72.0, 4),
            agg("Geometry", 38.5, 3),
            agg("Probability", 55.0, 2),
        ];
        let weakest = weakest_topics(&rows, 2);
        assert_eq!(weakest.len(), 2);
        assert_eq!(weakest[0].topic, "Geometry");
        assert_eq!(weakest[1].topic, "Probability");
        assert!(weakest[0].avg_percentage <= weakest[1].avg_percentage);
    }

    #[test]
    fn weakest_topics_empty_input_is_empty_not_error() {
        assert!(weakest_topics(&[], 2).is_empty());
    }

    #[test]
    fn weakest_topics_ties_break_by_topic_name() {
        let rows = vec![agg("Trigonometry", 50.0, 1), agg("Algebra", 50.0, 1)];
        let weakest = weakest_topics(&rows, 2);
        assert_eq!(weakest[0].topic, "Algebra");
        assert_eq!(weakest[1].topic, "Trigonometry");
    }

    #[test]
    fn completion_rate_smooths_single_sample() {
        // 1 of 1 completed must not read as 100%.
        let rate = smoothed_completion_rate(1, 1);
        assert!((rate - 60.0).abs() < 1e-9);
    }

    #[test]
    fn completion_rate_zero_over_zero_is_zero_not_nan() {
        let rate = smoothed_completion_rate(0, 0);
        assert_eq!(rate, 0.0);
        assert!(!rate.is_nan());
    }

    #[test]
    fn completion_rate_zero_of_many_stays_above_zero() {
        // The prior keeps a fresh 0-of-3 student off the floor.
        let rate = smoothed_completion_rate(0, 3);
        assert!(rate > 0.0 && rate < 40.0);
    }

    #[test]
    fn engagement_score_matches_formula() {
        let score = engagement_score(10.0, 60.0, 3);
        assert!((score - (10.0 * 0.3 + 60.0 * 0.004 + 30.0)).abs() < 1e-9);
    }

    #[test]
    fn engagement_score_is_monotone_in_each_input() {
        let base = engagement_score(5.0, 50.0, 2);
        assert!(engagement_score(6.0, 50.0, 2) > base);
        assert!(engagement_score(5.0, 60.0, 2) > base);
        assert!(engagement_score(5.0, 50.0, 3) > base);
    }

    #[test]
    fn score_levels_bucket_on_thresholds() {
        assert_eq!(score_level(39.9), ScoreLevel::Low);
        assert_eq!(score_level(40.0), ScoreLevel::Medium);
        assert_eq!(score_level(69.9), ScoreLevel::Medium);
        assert_eq!(score_level(70.0), ScoreLevel::High);
    }

    #[test]
    fn seven_of_ten_scores_seventy() {
        assert_eq!(score_percentage(7, 10), 70.0);
    }

    #[test]
    fn empty_answer_sheet_scores_zero() {
        assert_eq!(score_percentage(0, 0), 0.0);
    }

    #[test]
    fn dominant_topic_picks_most_frequent() {
        let topic = dominant_topic(["Algebra", "Geometry", "Algebra"]);
        assert_eq!(topic.as_deref(), Some("Algebra"));
        assert_eq!(dominant_topic(Vec::<&str>::new()), None);
    }

    fn attempts(n: i64, success: i64) -> QuestionAttempts {
        QuestionAttempts {
            question_id: uuid::Uuid::new_v4(),
            question_text: "q".to_string(),
            topic: "Algebra".to_string(),
            sub_topic: None,
            avg_completion_time_secs: Some(40.0),
            attempts: n,
            success_count: success,
        }
    }

    #[test]
    fn effectiveness_ranks_hardest_first_and_handles_zero_attempts() {
        let analyzed = analyze_question_effectiveness(vec![
            attempts(10, 9),
            attempts(0, 0),
            attempts(10, 2),
        ]);
        // The untouched question scores 0.0 (no NaN) and sorts hardest.
        assert_eq!(analyzed[0].success_rate, 0.0);
        assert_eq!(analyzed[1].success_rate, 20.0);
        assert_eq!(analyzed[2].success_rate, 90.0);
        assert_eq!(analyzed[0].difficulty, Difficulty::High);
        assert_eq!(analyzed[1].difficulty, Difficulty::High);
        assert_eq!(analyzed[2].difficulty, Difficulty::Low);
    }

    #[test]
    fn difficulty_thresholds() {
        assert_eq!(classify_difficulty(29.9), Difficulty::High);
        assert_eq!(classify_difficulty(30.0), Difficulty::Medium);
        assert_eq!(classify_difficulty(69.9), Difficulty::Medium);
        assert_eq!(classify_difficulty(70.0), Difficulty::Low);
    }
}
