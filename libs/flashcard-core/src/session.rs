//! Study session state machine.
//!
//! A session walks one deck's cards in order. A card answered correctly is
//! mastered and leaves the queue; a missed card goes to the back of the queue
//! so the remaining cards are seen before it comes around again. The session
//! is complete once every card has been mastered.

use std::collections::{BTreeSet, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::summary::SessionSummary;
use crate::types::StudyAttempt;

/// A card as presented during study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCard {
    pub id: i64,
    pub question: String,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Complete,
    Cleared,
}

/// In-session spaced-repetition bookkeeping for one deck.
#[derive(Debug, Clone)]
pub struct StudySession {
    deck_id: i64,
    queue: VecDeque<SessionCard>,
    attempts: Vec<StudyAttempt>,
    mastered: BTreeSet<i64>,
    cleared: bool,
}

impl StudySession {
    /// Open a session over `cards` in the given order. Repeated ids are ignored.
    pub fn open(deck_id: i64, cards: impl IntoIterator<Item = SessionCard>) -> Self {
        let mut seen = HashSet::new();
        let queue = cards.into_iter().filter(|c| seen.insert(c.id)).collect();

        Self {
            deck_id,
            queue,
            attempts: Vec::new(),
            mastered: BTreeSet::new(),
            cleared: false,
        }
    }

    pub fn deck_id(&self) -> i64 {
        self.deck_id
    }

    pub fn status(&self) -> SessionStatus {
        if self.cleared {
            SessionStatus::Cleared
        } else if self.queue.is_empty() {
            SessionStatus::Complete
        } else {
            SessionStatus::Active
        }
    }

    /// The card that must be graded next.
    pub fn current_card(&self) -> Option<&SessionCard> {
        self.queue.front()
    }

    /// Cards not yet mastered.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn attempts(&self) -> &[StudyAttempt] {
        &self.attempts
    }

    pub fn mastered(&self) -> &BTreeSet<i64> {
        &self.mastered
    }

    fn check_deck(&self, deck_id: i64) -> Result<(), SessionError> {
        if self.cleared {
            return Err(SessionError::NoActiveSession);
        }
        if deck_id != self.deck_id {
            return Err(SessionError::SessionMismatch {
                expected: self.deck_id,
                actual: deck_id,
            });
        }
        Ok(())
    }

    /// Check that `card_id` may be graded now, without recording anything.
    pub fn check_grade(&self, deck_id: i64, card_id: i64) -> Result<(), SessionError> {
        self.check_deck(deck_id)?;

        let current = self.queue.front().ok_or(SessionError::AlreadyComplete)?;
        if current.id != card_id {
            return Err(SessionError::NotCurrentCard {
                expected: current.id,
                actual: card_id,
            });
        }
        Ok(())
    }

    /// Record a grade for the presented card.
    ///
    /// Nothing is mutated when the call is rejected.
    pub fn grade(
        &mut self,
        deck_id: i64,
        card_id: i64,
        success: bool,
    ) -> Result<&StudyAttempt, SessionError> {
        self.check_grade(deck_id, card_id)?;

        let Some(card) = self.queue.pop_front() else {
            return Err(SessionError::AlreadyComplete);
        };

        self.attempts.push(StudyAttempt {
            card_id,
            success,
            question: card.question.clone(),
        });

        if success {
            self.mastered.insert(card_id);
        } else {
            self.queue.push_back(card);
        }

        Ok(&self.attempts[self.attempts.len() - 1])
    }

    /// Produce the end-of-session summary and clear the session.
    pub fn summarize(&mut self, deck_id: i64) -> Result<SessionSummary, SessionError> {
        self.check_deck(deck_id)?;
        if !self.queue.is_empty() {
            return Err(SessionError::NotComplete {
                remaining: self.queue.len(),
            });
        }

        let summary = SessionSummary::from_attempts(&self.attempts);

        self.attempts.clear();
        self.mastered.clear();
        self.cleared = true;

        Ok(summary)
    }
}
