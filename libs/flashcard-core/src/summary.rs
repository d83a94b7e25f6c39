//! End-of-session statistics.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::StudyAttempt;

/// A card that took more than one attempt to master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPracticeNote {
    pub card_id: i64,
    pub question: String,
    pub attempts: usize,
}

/// Aggregate statistics over a session's full attempt log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_unique_cards: usize,
    pub total_attempts: usize,
    pub success_count: usize,
    pub needs_practice_count: usize,
    pub success_rate: f64,
    pub cards_needing_extra: Vec<CardPracticeNote>,
}

impl SessionSummary {
    /// Build a summary from an ordered attempt log.
    ///
    /// `cards_needing_extra` lists cards in order of their first attempt.
    pub fn from_attempts(attempts: &[StudyAttempt]) -> Self {
        let success_count = attempts.iter().filter(|a| a.success).count();
        let total_attempts = attempts.len();

        let mut counts: HashMap<i64, usize> = HashMap::new();
        let mut first_seen: Vec<&StudyAttempt> = Vec::new();
        for attempt in attempts {
            let count = counts.entry(attempt.card_id).or_insert(0);
            if *count == 0 {
                first_seen.push(attempt);
            }
            *count += 1;
        }

        let cards_needing_extra = first_seen
            .iter()
            .filter_map(|a| {
                let n = counts[&a.card_id];
                (n > 1).then(|| CardPracticeNote {
                    card_id: a.card_id,
                    question: a.question.clone(),
                    attempts: n,
                })
            })
            .collect();

        Self {
            total_unique_cards: counts.len(),
            total_attempts,
            success_count,
            needs_practice_count: total_attempts - success_count,
            success_rate: success_rate(success_count, total_attempts),
            cards_needing_extra,
        }
    }

    /// Number of distinct cards answered correctly at least once.
    pub fn mastered_in(attempts: &[StudyAttempt]) -> usize {
        attempts
            .iter()
            .filter(|a| a.success)
            .map(|a| a.card_id)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Percentage of successful attempts, rounded to one decimal place.
///
/// Returns 100.0 when nothing was attempted.
pub fn success_rate(successes: usize, attempts: usize) -> f64 {
    if attempts == 0 {
        return 100.0;
    }
    let rate = successes as f64 / attempts as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}
