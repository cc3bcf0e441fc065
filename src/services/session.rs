//! Attendance session window tracking
//!
//! A `SessionWindow` is the single shared mutable slot of the engine:
//! one optional active session, guarded by a read-write lock. Starting
//! a session is the only write and unconditionally replaces any prior
//! session. Expiry is detected lazily whenever the window is queried;
//! there is no expiry notification.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::EngineError;

const MS_PER_MINUTE: i64 = 60_000;

/// An attendance window opened by an administrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Session {
    started_at: DateTime<Utc>,
    duration_ms: i64,
}

impl Session {
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    /// Instant after which check-ins are marked Absent
    pub fn deadline(&self) -> DateTime<Utc> {
        self.started_at + Duration::milliseconds(self.duration_ms)
    }

    /// True iff `now` falls within `[started_at, started_at + duration]`
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        (now - self.started_at).num_milliseconds() <= self.duration_ms
    }
}

/// Process-wide session slot, cheap to clone and share
///
/// Clones observe the same underlying slot.
#[derive(Debug, Clone, Default)]
pub struct SessionWindow {
    slot: Arc<RwLock<Option<Session>>>,
}

impl SessionWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session of `duration_minutes` starting at `now`
    ///
    /// Last writer wins: a session already running is replaced without
    /// error. Non-positive durations are rejected.
    pub fn start(
        &self,
        now: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Result<Session, EngineError> {
        if duration_minutes <= 0 {
            return Err(EngineError::InvalidDuration { minutes: duration_minutes });
        }

        let session = Session { started_at: now, duration_ms: duration_minutes * MS_PER_MINUTE };

        let previous = self.slot.write().replace(session);
        if let Some(prev) = previous {
            info!(
                prev_deadline = %prev.deadline(),
                new_deadline = %session.deadline(),
                "session_replaced"
            );
        }

        Ok(session)
    }

    /// The active session, if one has been started
    pub fn current(&self) -> Option<Session> {
        *self.slot.read()
    }

    /// Whether a check-in at `now` is eligible for evaluation
    ///
    /// False before any session has been started.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.current().is_some_and(|session| session.is_open(now))
    }

    /// Time elapsed since the session started
    pub fn elapsed_since(&self, now: DateTime<Utc>) -> Result<Duration, EngineError> {
        let session = self.current().ok_or(EngineError::NoActiveSession)?;
        Ok(now - session.started_at())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        "2025-03-14T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_closed_before_any_start() {
        let window = SessionWindow::new();
        assert!(!window.is_open(t0()));
        assert!(window.current().is_none());
    }

    #[test]
    fn test_elapsed_requires_session() {
        let window = SessionWindow::new();
        assert_eq!(window.elapsed_since(t0()).unwrap_err(), EngineError::NoActiveSession);
    }

    #[test]
    fn test_open_within_window_inclusive() {
        let window = SessionWindow::new();
        window.start(t0(), 5).unwrap();

        assert!(window.is_open(t0()));
        assert!(window.is_open(t0() + Duration::minutes(3)));
        // Deadline itself is still open
        assert!(window.is_open(t0() + Duration::minutes(5)));
        assert!(!window.is_open(t0() + Duration::minutes(5) + Duration::milliseconds(1)));
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let window = SessionWindow::new();
        assert_eq!(
            window.start(t0(), 0).unwrap_err(),
            EngineError::InvalidDuration { minutes: 0 }
        );
        assert_eq!(
            window.start(t0(), -5).unwrap_err(),
            EngineError::InvalidDuration { minutes: -5 }
        );
        assert!(window.current().is_none());
    }

    #[test]
    fn test_restart_replaces_silently() {
        let window = SessionWindow::new();
        window.start(t0(), 5).unwrap();

        let later = t0() + Duration::minutes(2);
        let session = window.start(later, 10).unwrap();

        assert_eq!(window.current(), Some(session));
        assert_eq!(session.started_at(), later);
        assert_eq!(session.duration_ms(), 10 * 60_000);
        // The old 5-minute window no longer bounds anything
        assert!(window.is_open(t0() + Duration::minutes(11)));
    }

    #[test]
    fn test_elapsed_since_start() {
        let window = SessionWindow::new();
        window.start(t0(), 5).unwrap();

        let elapsed = window.elapsed_since(t0() + Duration::seconds(90)).unwrap();
        assert_eq!(elapsed, Duration::seconds(90));
    }

    #[test]
    fn test_clones_share_the_slot() {
        let window = SessionWindow::new();
        let clone = window.clone();

        clone.start(t0(), 5).unwrap();

        assert!(window.is_open(t0() + Duration::minutes(1)));
    }
}
