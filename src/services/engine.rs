//! Attendance decision engine
//!
//! Orchestrates the session window and the geofence test for a single
//! check-in. The engine itself is stateless per call; the only mutable
//! state is the injected `SessionWindow`. Boundary lookup and the
//! server clock are capability traits supplied by the caller, so the
//! core stays ignorant of storage formats and real time.

use chrono::{DateTime, Timelike, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::errors::EngineError;
use crate::domain::types::{
    AttendanceOutcome, AttendanceStatus, BoundaryPolygon, CheckInEvent, ClassroomId, LocationFix,
};
use crate::services::geofence;
use crate::services::session::{Session, SessionWindow};

/// Boundary lookup capability, owned by the surrounding application
pub trait BoundaryRegistry: Send + Sync {
    /// Boundary for a classroom, or None when the id is unknown
    fn lookup(&self, classroom: &ClassroomId) -> Option<BoundaryPolygon>;
}

/// Registry backed by a prebuilt map, typically loaded from config
pub struct InMemoryRegistry {
    boundaries: HashMap<ClassroomId, BoundaryPolygon>,
}

impl InMemoryRegistry {
    pub fn new(boundaries: HashMap<ClassroomId, BoundaryPolygon>) -> Self {
        Self { boundaries }
    }
}

impl BoundaryRegistry for InMemoryRegistry {
    fn lookup(&self, classroom: &ClassroomId) -> Option<BoundaryPolygon> {
        self.boundaries.get(classroom).cloned()
    }
}

/// Server-observed time source
///
/// Decisions never trust device timestamps; both the window check and
/// the recorded date/time come from this clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and deterministic replays
pub struct ManualClock {
    now: parking_lot::RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: parking_lot::RwLock::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Outcome of a single check-in decision
///
/// `location` is the reported position to persist alongside the
/// outcome; `accepted` mirrors whether the student was marked Present.
#[derive(Debug, Clone)]
pub struct Decision {
    pub outcome: AttendanceOutcome,
    pub location: LocationFix,
    pub message: String,
    pub accepted: bool,
}

/// Decides Present/Absent for check-in events
pub struct AttendanceEngine {
    registry: Arc<dyn BoundaryRegistry>,
    clock: Arc<dyn Clock>,
    session: SessionWindow,
}

impl AttendanceEngine {
    pub fn new(
        registry: Arc<dyn BoundaryRegistry>,
        clock: Arc<dyn Clock>,
        session: SessionWindow,
    ) -> Self {
        Self { registry, clock, session }
    }

    /// The session slot this engine evaluates against
    pub fn session(&self) -> &SessionWindow {
        &self.session
    }

    /// Open an attendance window of `duration_minutes` starting now
    ///
    /// Replaces any running session without error.
    pub fn start_session(&self, duration_minutes: i64) -> Result<Session, EngineError> {
        let session = self.session.start(self.clock.now(), duration_minutes)?;
        info!(
            duration_minutes = %duration_minutes,
            deadline = %session.deadline(),
            "session_started"
        );
        Ok(session)
    }

    /// Decide a single check-in
    ///
    /// Late or never-started sessions yield a normal Absent outcome; an
    /// unknown classroom is a rejected request. The recorded date/time
    /// and the window comparison both use the server clock.
    pub fn decide(&self, event: &CheckInEvent) -> Result<Decision, EngineError> {
        let now = self.clock.now();
        let date = now.date_naive();
        let time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());

        if let Some(reported) = event.reported_at {
            let drift_ms = (now - reported).num_milliseconds();
            debug!(student_id = %event.student_id, drift_ms = %drift_ms, "client_clock_drift");
        }

        if !self.session.is_open(now) {
            let message = if self.session.current().is_some() {
                "Attendance session expired, marked as Absent"
            } else {
                "Attendance has not started, marked as Absent"
            };
            info!(
                student_id = %event.student_id,
                classroom = %event.classroom_id,
                "checkin_outside_window"
            );
            return Ok(Self::build(event, date, time, AttendanceStatus::Absent, message.to_string()));
        }

        let boundary = self
            .registry
            .lookup(&event.classroom_id)
            .ok_or_else(|| EngineError::UnknownClassroom(event.classroom_id.clone()))?;

        let inside = geofence::is_inside(&event.location, &boundary);
        let (status, message) = if inside {
            (
                AttendanceStatus::Present,
                "Attendance marked as Present (within allowed area)".to_string(),
            )
        } else {
            (
                AttendanceStatus::Absent,
                format!(
                    "You are outside the allowed area, marked as Absent. Your location: ({}, {})",
                    event.location.latitude, event.location.longitude
                ),
            )
        };

        info!(
            student_id = %event.student_id,
            classroom = %event.classroom_id,
            inside = %inside,
            status = %status,
            "checkin_decided"
        );

        Ok(Self::build(event, date, time, status, message))
    }

    fn build(
        event: &CheckInEvent,
        date: chrono::NaiveDate,
        time: chrono::NaiveTime,
        status: AttendanceStatus,
        message: String,
    ) -> Decision {
        Decision {
            outcome: AttendanceOutcome {
                student_id: event.student_id.clone(),
                date,
                time,
                status,
            },
            location: LocationFix {
                student_id: event.student_id.clone(),
                location: event.location,
                date,
                time,
            },
            message,
            accepted: status == AttendanceStatus::Present,
        }
    }
}
