//! Domain errors returned by the decision core
//!
//! All failures are local and synchronous; the core performs no IO and
//! never retries. A late or out-of-bounds check-in is a normal Absent
//! outcome, not an error.

use thiserror::Error;

use crate::domain::types::ClassroomId;

#[derive(Error, Debug, PartialEq)]
pub enum EngineError {
    /// Boundary polygon is malformed (fewer than 3 vertices)
    #[error("boundary polygon must have at least 3 vertices, got {vertices}")]
    InvalidBoundary { vertices: usize },

    /// Window query before any session was started
    #[error("no attendance session has been started")]
    NoActiveSession,

    /// No boundary registered for the supplied classroom id
    #[error("no boundary registered for classroom {0}")]
    UnknownClassroom(ClassroomId),

    /// Non-positive session length requested
    #[error("session duration must be positive, got {minutes} minute(s)")]
    InvalidDuration { minutes: i64 },
}
