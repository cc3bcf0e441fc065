//! Decision egress - writes attendance decisions to file
//!
//! Decisions are written in JSONL format (one JSON object per line) to
//! the file specified in config. Each line carries both the attendance
//! row and the reported location, the two artifacts the surrounding
//! application persists.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, error, info};

use crate::domain::types::{AttendanceStatus, StudentId};
use crate::services::engine::Decision;

#[derive(Serialize)]
struct DecisionLine<'a> {
    student_id: &'a StudentId,
    date: NaiveDate,
    time: NaiveTime,
    status: AttendanceStatus,
    latitude: f64,
    longitude: f64,
    message: &'a str,
}

/// Egress writer for decisions
pub struct DecisionEgress {
    file_path: String,
}

impl DecisionEgress {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "egress_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Write a decision to the egress file
    /// Returns true if successful, false otherwise
    pub fn write_decision(&self, decision: &Decision) -> bool {
        let line = DecisionLine {
            student_id: &decision.outcome.student_id,
            date: decision.outcome.date,
            time: decision.outcome.time,
            status: decision.outcome.status,
            latitude: decision.location.location.latitude,
            longitude: decision.location.location.longitude,
            message: &decision.message,
        };

        let json = match serde_json::to_string(&line) {
            Ok(json) => json,
            Err(e) => {
                error!(student_id = %decision.outcome.student_id, error = %e, "decision_serialize_failed");
                return false;
            }
        };

        match self.append_line(&json) {
            Ok(()) => {
                debug!(
                    student_id = %decision.outcome.student_id,
                    status = %decision.outcome.status,
                    "decision_egressed"
                );
                true
            }
            Err(e) => {
                error!(
                    student_id = %decision.outcome.student_id,
                    error = %e,
                    "decision_egress_failed"
                );
                false
            }
        }
    }

    /// Append a line to the egress file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AttendanceOutcome, Coordinate, LocationFix};
    use std::fs;
    use tempfile::tempdir;

    fn decision(student: &str, status: AttendanceStatus) -> Decision {
        let student_id = StudentId(student.to_string());
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let time = "09:01:00".parse().unwrap();
        Decision {
            outcome: AttendanceOutcome { student_id: student_id.clone(), date, time, status },
            location: LocationFix {
                student_id,
                location: Coordinate { latitude: 12.9716, longitude: 77.5946 },
                date,
                time,
            },
            message: "Attendance marked as Present (within allowed area)".to_string(),
            accepted: status == AttendanceStatus::Present,
        }
    }

    #[test]
    fn test_egress_new() {
        let egress = DecisionEgress::new("test.jsonl");
        assert_eq!(egress.file_path, "test.jsonl");
    }

    #[test]
    fn test_write_decision() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("attendance.jsonl");
        let egress = DecisionEgress::new(file_path.to_str().unwrap());

        let result = egress.write_decision(&decision("S1", AttendanceStatus::Present));
        assert!(result);

        let content = fs::read_to_string(&file_path).unwrap();
        assert!(content.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["student_id"], "S1");
        assert_eq!(parsed["status"], "Present");
        assert_eq!(parsed["date"], "2025-03-14");
        assert_eq!(parsed["time"], "09:01:00");
        assert_eq!(parsed["latitude"], 12.9716);
    }

    #[test]
    fn test_append_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("attendance.jsonl");

        fs::write(&file_path, "{\"existing\":\"data\"}\n").unwrap();

        let egress = DecisionEgress::new(file_path.to_str().unwrap());
        egress.write_decision(&decision("S1", AttendanceStatus::Present));

        let content = fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("existing"));
        assert!(lines[1].contains("S1"));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested_path = dir.path().join("nested").join("dir").join("attendance.jsonl");
        let egress = DecisionEgress::new(nested_path.to_str().unwrap());

        let result = egress.write_decision(&decision("S1", AttendanceStatus::Absent));
        assert!(result);
        assert!(nested_path.exists());
    }
}
