//! Services - business logic and state management
//!
//! This module contains the core business logic services:
//! - `engine` - attendance decision orchestration
//! - `geofence` - point-in-polygon boundary test
//! - `grouping` - temporal clustering for arrival waves and proxy audit
//! - `processor` - check-in pump feeding the engine
//! - `session` - the shared attendance session window

pub mod engine;
pub mod geofence;
pub mod grouping;
pub mod processor;
pub mod session;

// Re-export commonly used types
pub use engine::{
    AttendanceEngine, BoundaryRegistry, Clock, InMemoryRegistry, ManualClock, SystemClock,
};
pub use processor::Processor;
pub use session::{Session, SessionWindow};
