//! End-to-end decision scenario through the public API

use attendance_engine::domain::types::{
    AttendanceStatus, BoundaryPolygon, CheckInEvent, ClassroomId, Coordinate, StudentId,
};
use attendance_engine::services::{
    AttendanceEngine, InMemoryRegistry, ManualClock, SessionWindow,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

fn coord(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate { latitude, longitude }
}

fn check_in(student: &str, classroom: &str, location: Coordinate) -> CheckInEvent {
    CheckInEvent {
        student_id: StudentId(student.to_string()),
        classroom_id: ClassroomId(classroom.to_string()),
        location,
        reported_at: None,
    }
}

/// Classroom "204b": a 4-point square around (12.9716, 77.5946) ± 0.0005°
fn registry() -> Arc<InMemoryRegistry> {
    let square = BoundaryPolygon::new(vec![
        coord(12.9721, 77.5951),
        coord(12.9721, 77.5941),
        coord(12.9711, 77.5941),
        coord(12.9711, 77.5951),
    ])
    .unwrap();

    let mut boundaries = HashMap::new();
    boundaries.insert(ClassroomId("204b".to_string()), square);
    Arc::new(InMemoryRegistry::new(boundaries))
}

#[test]
fn test_session_lifecycle_end_to_end() {
    let t0: DateTime<Utc> = "2025-03-14T09:00:00Z".parse().unwrap();
    let clock = Arc::new(ManualClock::new(t0));
    let engine = AttendanceEngine::new(registry(), clock.clone(), SessionWindow::new());

    // Session started with a 5-minute limit at T0
    engine.start_session(5).unwrap();

    // T0+1min: S1 at the center -> Present
    clock.set(t0 + Duration::minutes(1));
    let decision = engine.decide(&check_in("S1", "204b", coord(12.9716, 77.5946))).unwrap();
    assert_eq!(decision.outcome.status, AttendanceStatus::Present);
    assert!(decision.accepted);
    assert_eq!(decision.outcome.date, t0.date_naive());
    assert_eq!(decision.outcome.time, "09:01:00".parse().unwrap());

    // T0+1min: S2 at (0, 0) -> Absent, outside allowed area
    let decision = engine.decide(&check_in("S2", "204b", coord(0.0, 0.0))).unwrap();
    assert_eq!(decision.outcome.status, AttendanceStatus::Absent);
    assert!(decision.message.contains("outside the allowed area"));

    // T0+10min: S1 at the center -> Absent, session expired
    clock.set(t0 + Duration::minutes(10));
    let decision = engine.decide(&check_in("S1", "204b", coord(12.9716, 77.5946))).unwrap();
    assert_eq!(decision.outcome.status, AttendanceStatus::Absent);
    assert!(decision.message.contains("session expired"));
}

#[test]
fn test_engine_is_shareable_across_threads() {
    let t0: DateTime<Utc> = "2025-03-14T09:00:00Z".parse().unwrap();
    let clock = Arc::new(ManualClock::new(t0 + Duration::minutes(1)));
    let engine = Arc::new(AttendanceEngine::new(registry(), clock, SessionWindow::new()));

    engine.session().start(t0, 5).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                let student = format!("S{}", i);
                engine.decide(&check_in(&student, "204b", coord(12.9716, 77.5946))).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let decision = handle.join().unwrap();
        assert_eq!(decision.outcome.status, AttendanceStatus::Present);
    }
}
