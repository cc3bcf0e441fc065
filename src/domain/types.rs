//! Shared types for the attendance engine

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::EngineError;

/// Newtype wrapper for student registration numbers to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct StudentId(pub String);

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for classroom identifiers to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ClassroomId(pub String);

impl std::fmt::Display for ClassroomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic position reported by a check-in device (WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Registered geofence for a classroom
///
/// An ordered ring of at least 3 vertices describing a simple closed
/// region. Validated at construction; immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    vertices: Vec<Coordinate>,
}

impl BoundaryPolygon {
    /// Build a polygon, rejecting rings with fewer than 3 vertices
    pub fn new(vertices: Vec<Coordinate>) -> Result<Self, EngineError> {
        if vertices.len() < 3 {
            return Err(EngineError::InvalidBoundary { vertices: vertices.len() });
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }
}

/// A single check-in attempt, already parsed by the transport layer
///
/// `reported_at` is the device-submitted timestamp. It is carried for
/// diagnostics only; the decision window always uses the server clock.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInEvent {
    pub student_id: StudentId,
    pub classroom_id: ClassroomId,
    #[serde(flatten)]
    pub location: Coordinate,
    #[serde(default)]
    pub reported_at: Option<DateTime<Utc>>,
}

/// Attendance decision for a check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persistable artifact of a decision
///
/// Date and time are server-observed, truncated to whole seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceOutcome {
    pub student_id: StudentId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AttendanceStatus,
}

/// Durable attendance row read back for grouping and reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: StudentId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AttendanceStatus,
}

impl From<AttendanceOutcome> for AttendanceRecord {
    fn from(outcome: AttendanceOutcome) -> Self {
        Self {
            student_id: outcome.student_id,
            date: outcome.date,
            time: outcome.time,
            status: outcome.status,
        }
    }
}

/// Reported position stored alongside every decision
///
/// Kept for all check-ins regardless of status so the proxy audit can
/// see where a device claimed to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub student_id: StudentId,
    #[serde(flatten)]
    pub location: Coordinate,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Attendance row joined with a same-day location fix for one student
///
/// `time` is the fix time, `attendance_time` the decision time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceRow {
    pub student_id: StudentId,
    #[serde(flatten)]
    pub location: Coordinate,
    pub time: NaiveTime,
    pub attendance_time: NaiveTime,
}
