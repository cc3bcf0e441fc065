//! Check-in processing loop
//!
//! Consumes parsed check-ins from a bounded channel until it closes,
//! applies the decision engine, meters each decision, and writes the
//! outcome to egress. The day's rows are retained in memory for the
//! end-of-run arrival-wave and proxy-audit reports.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::warn;

use crate::domain::types::{AttendanceRecord, CheckInEvent, PresenceRow};
use crate::infra::metrics::Metrics;
use crate::io::egress::DecisionEgress;
use crate::services::engine::{AttendanceEngine, Decision};
use crate::services::grouping::{arrival_waves, audit_cluster};

/// Applies the engine to a stream of check-ins
pub struct Processor {
    engine: AttendanceEngine,
    egress: DecisionEgress,
    metrics: Arc<Metrics>,
    /// Day's decided rows, in decision order
    records: Vec<AttendanceRecord>,
    /// Present rows joined with their reported location
    presence: Vec<PresenceRow>,
}

impl Processor {
    pub fn new(engine: AttendanceEngine, egress: DecisionEgress, metrics: Arc<Metrics>) -> Self {
        Self { engine, egress, metrics, records: Vec::new(), presence: Vec::new() }
    }

    /// Consume events until the channel closes
    pub async fn run(&mut self, mut event_rx: mpsc::Receiver<CheckInEvent>) {
        while let Some(event) = event_rx.recv().await {
            self.process_event(event);
        }
    }

    /// Decide a single check-in, record metrics, and egress the outcome
    pub fn process_event(&mut self, event: CheckInEvent) {
        let process_start = Instant::now();

        match self.engine.decide(&event) {
            Ok(decision) => {
                if decision.accepted {
                    self.metrics.record_present();
                } else {
                    self.metrics.record_absent();
                }
                self.egress.write_decision(&decision);
                self.remember(decision);
            }
            Err(e) => {
                self.metrics.record_rejected();
                warn!(
                    student_id = %event.student_id,
                    classroom = %event.classroom_id,
                    error = %e,
                    "checkin_rejected"
                );
            }
        }

        let latency_us = process_start.elapsed().as_micros() as u64;
        self.metrics.record_checkin_processed(latency_us);
    }

    fn remember(&mut self, decision: Decision) {
        if decision.accepted {
            self.presence.push(PresenceRow {
                student_id: decision.location.student_id.clone(),
                location: decision.location.location,
                time: decision.location.time,
                attendance_time: decision.outcome.time,
            });
        }
        self.records.push(decision.outcome.into());
    }

    /// Day's Present records clustered into arrival waves
    pub fn arrival_report(&self, interval_minutes: f64) -> Vec<Vec<AttendanceRecord>> {
        arrival_waves(&self.records, interval_minutes)
    }

    /// Latest-location view of one arrival wave for proxy review
    pub fn audit_report(&self, group: usize, interval_minutes: f64) -> Vec<PresenceRow> {
        audit_cluster(&self.presence, group, interval_minutes)
    }

    /// All decided rows so far
    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        AttendanceStatus, BoundaryPolygon, ClassroomId, Coordinate, StudentId,
    };
    use crate::services::engine::{InMemoryRegistry, ManualClock};
    use crate::services::session::SessionWindow;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate { latitude, longitude }
    }

    fn t0() -> DateTime<Utc> {
        "2025-03-14T09:00:00Z".parse().unwrap()
    }

    fn setup(egress_path: &str) -> (Processor, Arc<ManualClock>, Arc<Metrics>) {
        let polygon = BoundaryPolygon::new(vec![
            coord(12.9721, 77.5951),
            coord(12.9721, 77.5941),
            coord(12.9711, 77.5941),
            coord(12.9711, 77.5951),
        ])
        .unwrap();
        let mut boundaries = HashMap::new();
        boundaries.insert(ClassroomId("204b".to_string()), polygon);

        let clock = Arc::new(ManualClock::new(t0()));
        let metrics = Arc::new(Metrics::new());
        let engine = AttendanceEngine::new(
            Arc::new(InMemoryRegistry::new(boundaries)),
            clock.clone(),
            SessionWindow::new(),
        );
        let processor = Processor::new(engine, DecisionEgress::new(egress_path), metrics.clone());
        (processor, clock, metrics)
    }

    fn event(student: &str, classroom: &str, location: Coordinate) -> CheckInEvent {
        CheckInEvent {
            student_id: StudentId(student.to_string()),
            classroom_id: ClassroomId(classroom.to_string()),
            location,
            reported_at: None,
        }
    }

    #[test]
    fn test_process_and_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let (mut processor, clock, metrics) = setup(path.to_str().unwrap());

        processor.engine.start_session(5).unwrap();
        clock.advance(Duration::minutes(1));

        processor.process_event(event("S1", "204b", coord(12.9716, 77.5946)));
        processor.process_event(event("S2", "204b", coord(0.0, 0.0)));
        processor.process_event(event("S3", "bogus", coord(12.9716, 77.5946)));

        assert_eq!(processor.records().len(), 2);

        let waves = processor.arrival_report(2.0);
        assert_eq!(waves.len(), 1);
        assert_eq!(waves[0].len(), 1);
        assert_eq!(waves[0][0].student_id, StudentId("S1".to_string()));
        assert_eq!(waves[0][0].status, AttendanceStatus::Present);

        let audit = processor.audit_report(1, 2.0);
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].student_id, StudentId("S1".to_string()));

        let summary = metrics.report();
        assert_eq!(summary.checkins_total, 3);
        assert_eq!(summary.present_total, 1);
        assert_eq!(summary.absent_total, 1);
        assert_eq!(summary.rejected_total, 1);

        // Both decided check-ins were egressed; the rejected one was not
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_run_consumes_until_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let (mut processor, clock, _metrics) = setup(path.to_str().unwrap());

        processor.engine.start_session(5).unwrap();
        clock.advance(Duration::minutes(1));

        let (tx, rx) = mpsc::channel(8);
        tx.send(event("S1", "204b", coord(12.9716, 77.5946))).await.unwrap();
        tx.send(event("S2", "204b", coord(12.9716, 77.5946))).await.unwrap();
        drop(tx);

        processor.run(rx).await;

        assert_eq!(processor.records().len(), 2);
    }
}
