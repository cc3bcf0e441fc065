//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `ingest` - newline-delimited JSON check-in reader
//! - `egress` - decision output to file (JSONL format)

pub mod egress;
pub mod ingest;

// Re-export commonly used types
pub use egress::DecisionEgress;
pub use ingest::CheckInFeed;
