//! Keyed store of open study sessions.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use flashcard_core::{
    SessionCard, SessionError, SessionStatus, SessionSummary, StudyAttempt, StudySession,
};

/// Snapshot of a session returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub deck_id: i64,
    pub status: SessionStatus,
    pub current_card: Option<SessionCard>,
    pub remaining: usize,
    pub attempts: usize,
    pub mastered: usize,
}

impl SessionView {
    fn of(session_id: Uuid, session: &StudySession) -> Self {
        Self {
            session_id,
            deck_id: session.deck_id(),
            status: session.status(),
            current_card: session.current_card().cloned(),
            remaining: session.remaining(),
            attempts: session.attempts().len(),
            mastered: session.mastered().len(),
        }
    }
}

/// Sessions idle longer than this are dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

struct Entry {
    session: StudySession,
    last_touched: Instant,
}

/// In-memory session store. Each session is reachable only through its handle.
///
/// A session not touched for `ttl` is evicted; it then behaves like an
/// unknown handle.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Open a new session and return its view, handle included.
    pub async fn open(&self, deck_id: i64, cards: Vec<SessionCard>) -> SessionView {
        let session_id = Uuid::new_v4();
        let session = StudySession::open(deck_id, cards);
        let view = SessionView::of(session_id, &session);
        let now = Instant::now();

        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_touched) < self.ttl);
        if sessions.len() < before {
            tracing::debug!(evicted = before - sessions.len(), "Evicted idle study sessions");
        }
        sessions.insert(
            session_id,
            Entry {
                session,
                last_touched: now,
            },
        );
        drop(sessions);

        tracing::debug!(%session_id, deck_id, remaining = view.remaining, "Opened study session");
        view
    }

    pub async fn view(&self, session_id: Uuid, deck_id: i64) -> Result<SessionView, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = self.live(&mut sessions, session_id)?;
        if session.deck_id() != deck_id {
            return Err(SessionError::SessionMismatch {
                expected: session.deck_id(),
                actual: deck_id,
            });
        }
        Ok(SessionView::of(session_id, session))
    }

    /// Check that a grade would be accepted, leaving the session unchanged.
    pub async fn check_grade(
        &self,
        session_id: Uuid,
        deck_id: i64,
        card_id: i64,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        self.live(&mut sessions, session_id)?
            .check_grade(deck_id, card_id)
    }

    /// Grade the presented card; returns the recorded attempt and the new view.
    pub async fn grade(
        &self,
        session_id: Uuid,
        deck_id: i64,
        card_id: i64,
        success: bool,
    ) -> Result<(StudyAttempt, SessionView), SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = self.live(&mut sessions, session_id)?;

        let attempt = session.grade(deck_id, card_id, success)?.clone();
        Ok((attempt, SessionView::of(session_id, session)))
    }

    /// Summarize a completed session and drop it from the store.
    pub async fn summarize(
        &self,
        session_id: Uuid,
        deck_id: i64,
    ) -> Result<SessionSummary, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let summary = self.live(&mut sessions, session_id)?.summarize(deck_id)?;
        sessions.remove(&session_id);
        Ok(summary)
    }

    /// Abandon a session without summarizing it.
    pub async fn close(&self, session_id: Uuid, deck_id: i64) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = self.live(&mut sessions, session_id)?;
        if session.deck_id() != deck_id {
            return Err(SessionError::SessionMismatch {
                expected: session.deck_id(),
                actual: deck_id,
            });
        }
        sessions.remove(&session_id);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Look up an unexpired session and refresh its idle timer.
    fn live<'a>(
        &self,
        sessions: &'a mut HashMap<Uuid, Entry>,
        session_id: Uuid,
    ) -> Result<&'a mut StudySession, SessionError> {
        let now = Instant::now();
        let expired = match sessions.get(&session_id) {
            None => return Err(SessionError::NoActiveSession),
            Some(entry) => now.duration_since(entry.last_touched) >= self.ttl,
        };
        if expired {
            sessions.remove(&session_id);
            tracing::debug!(%session_id, "Study session expired");
            return Err(SessionError::NoActiveSession);
        }

        let entry = sessions
            .get_mut(&session_id)
            .ok_or(SessionError::NoActiveSession)?;
        entry.last_touched = now;
        Ok(&mut entry.session)
    }
}
