//! Attendance engine - geofenced classroom attendance decisions
//!
//! Replays a file of check-in events through the decision core: opens a
//! session window, decides Present/Absent per event against the
//! configured classroom boundaries, egresses the outcomes as JSONL, and
//! reports arrival waves plus an optional proxy-audit group.
//!
//! Module structure:
//! - `domain/` - Core business types (check-ins, outcomes, boundaries)
//! - `services/` - Business logic (Engine, SessionWindow, Grouping, Processor)
//! - `infra/` - Infrastructure (Config, Metrics)
//! - `io/` - External interfaces (Ingest, Egress)

use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

use attendance_engine::infra::{Config, Metrics};
use attendance_engine::io::{CheckInFeed, DecisionEgress};
use attendance_engine::services::{
    AttendanceEngine, InMemoryRegistry, Processor, SessionWindow, SystemClock,
};

/// Attendance engine - geofenced classroom attendance decisions
#[derive(Parser, Debug)]
#[command(name = "attendance-engine", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Newline-delimited JSON file of check-in events to replay
    #[arg(short, long)]
    input: String,

    /// Session length in minutes (overrides config)
    #[arg(long)]
    session_minutes: Option<i64>,

    /// Arrival wave to audit for proxy check-ins (1-based)
    #[arg(long)]
    audit_group: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("attendance-engine starting");

    let args = Args::parse();

    let config = Config::load_from_path(&args.config);
    info!(
        config_file = %config.config_file(),
        session_duration_minutes = %config.session_duration_minutes(),
        grouping_interval_minutes = %config.grouping_interval_minutes(),
        egress_file = %config.egress_file(),
        classrooms = %config.boundaries().len(),
        "config_loaded"
    );

    let metrics = Arc::new(Metrics::new());
    let registry = Arc::new(InMemoryRegistry::new(config.boundaries().clone()));
    let engine = AttendanceEngine::new(registry, Arc::new(SystemClock), SessionWindow::new());

    let duration_minutes = args.session_minutes.unwrap_or(config.session_duration_minutes());
    engine.start_session(duration_minutes)?;
    metrics.record_session_started();

    // Start metrics reporter (lock-free reads with full summary)
    let reporter_metrics = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            reporter_metrics.report().log();
        }
    });

    // Create event channel (bounded for backpressure)
    let (event_tx, event_rx) = mpsc::channel(1000);

    // Start the check-in feed
    let feed = CheckInFeed::new(&args.input);
    tokio::spawn(async move {
        if let Err(e) = feed.run(event_tx).await {
            tracing::error!(error = %e, "check-in feed error");
        }
    });

    // Run processor - consumes events until the feed closes the channel
    let egress = DecisionEgress::new(config.egress_file());
    let mut processor = Processor::new(engine, egress, metrics.clone());
    processor.run(event_rx).await;

    // Arrival-wave report (faculty view)
    let interval_minutes = config.grouping_interval_minutes();
    for (i, wave) in processor.arrival_report(interval_minutes).iter().enumerate() {
        let students: Vec<&str> = wave.iter().map(|r| r.student_id.0.as_str()).collect();
        info!(wave = %(i + 1), count = %wave.len(), students = %students.join(","), "arrival_wave");
    }

    // Proxy audit: latest location per student within the requested wave
    if let Some(group) = args.audit_group {
        for row in processor.audit_report(group, interval_minutes) {
            info!(
                student_id = %row.student_id,
                latitude = %row.location.latitude,
                longitude = %row.location.longitude,
                fix_time = %row.time,
                attendance_time = %row.attendance_time,
                "audit_location"
            );
        }
    }

    metrics.report().log();
    info!("attendance-engine shutdown complete");
    Ok(())
}
