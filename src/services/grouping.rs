//! Temporal grouping of check-in records
//!
//! Partitions a day's time-ordered records into clusters of
//! near-simultaneous activity, one pass, no backtracking. A cluster
//! holds at most one record per student (first occurrence wins), but a
//! suppressed duplicate still advances the proximity baseline, so
//! duplicates never split an otherwise contiguous cluster.
//!
//! Clusters drive two views: the faculty arrival-wave display and the
//! proxy audit, which joins a cluster with each student's latest
//! reported location for the day.

use chrono::{NaiveTime, Timelike};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::domain::types::{AttendanceRecord, AttendanceStatus, PresenceRow, StudentId};

/// Proximity window between consecutive records within one cluster
pub const DEFAULT_INTERVAL_MINUTES: f64 = 2.0;

/// A record that can be clustered by student and time-of-day
pub trait TimeKeyed {
    fn student_id(&self) -> &StudentId;
    fn time_of_day(&self) -> NaiveTime;
}

impl TimeKeyed for AttendanceRecord {
    fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    fn time_of_day(&self) -> NaiveTime {
        self.time
    }
}

impl TimeKeyed for PresenceRow {
    fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    // Clustered on the fix time, matching the stored audit query
    fn time_of_day(&self) -> NaiveTime {
        self.time
    }
}

fn minutes_since_midnight(time: NaiveTime) -> f64 {
    f64::from(time.hour() * 60 + time.minute()) + f64::from(time.second()) / 60.0
}

/// Cluster `records` (pre-sorted ascending by time-of-day) into runs of
/// near-simultaneous activity
///
/// A record joins the current cluster when its student has not appeared
/// in it and the gap from the previously examined record is at most
/// `interval_minutes`; otherwise it opens a new cluster. O(n).
pub fn group_by_time<T: TimeKeyed + Clone>(records: &[T], interval_minutes: f64) -> Vec<Vec<T>> {
    let mut groups: Vec<Vec<T>> = Vec::new();
    let mut current: Vec<T> = Vec::new();
    let mut seen: FxHashSet<StudentId> = FxHashSet::default();
    let mut last_time: Option<f64> = None;

    for record in records {
        let total_minutes = minutes_since_midnight(record.time_of_day());

        if !seen.contains(record.student_id()) {
            let starts_new_cluster =
                last_time.is_some_and(|last| total_minutes - last > interval_minutes);

            if starts_new_cluster {
                groups.push(std::mem::take(&mut current));
                seen.clear();
            }

            current.push(record.clone());
            seen.insert(record.student_id().clone());
        }

        // Updated for every record examined, including suppressed
        // duplicates: they extend the cluster's proximity baseline.
        last_time = Some(total_minutes);
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Faculty view: the day's Present records clustered into arrival
/// waves, each wave sorted by student id
pub fn arrival_waves(
    records: &[AttendanceRecord],
    interval_minutes: f64,
) -> Vec<Vec<AttendanceRecord>> {
    let present: Vec<AttendanceRecord> = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .cloned()
        .collect();

    let mut waves = group_by_time(&present, interval_minutes);
    for wave in &mut waves {
        wave.sort_by(|a, b| a.student_id.cmp(&b.student_id));
    }
    waves
}

/// Collapse rows to one per student, keeping the latest fix time
///
/// Ties keep the first row seen. Output is sorted by student id for
/// deterministic display.
pub fn latest_locations(rows: &[PresenceRow]) -> Vec<PresenceRow> {
    let mut latest: FxHashMap<StudentId, PresenceRow> = FxHashMap::default();
    for row in rows {
        match latest.get(&row.student_id) {
            Some(existing) if existing.time >= row.time => {}
            _ => {
                latest.insert(row.student_id.clone(), row.clone());
            }
        }
    }

    let mut rows: Vec<PresenceRow> = latest.into_values().collect();
    rows.sort_by(|a, b| a.student_id.cmp(&b.student_id));
    rows
}

/// Proxy audit: select cluster `group` (1-based) of the day's rows and
/// collapse it to each student's latest reported location
///
/// Out-of-range indices, including 0, yield an empty set rather than an
/// error; the reviewer simply sees no locations.
pub fn audit_cluster(
    rows: &[PresenceRow],
    group: usize,
    interval_minutes: f64,
) -> Vec<PresenceRow> {
    if group == 0 {
        return Vec::new();
    }

    match group_by_time(rows, interval_minutes).into_iter().nth(group - 1) {
        Some(cluster) => latest_locations(&cluster),
        None => Vec::new(),
    }
}
