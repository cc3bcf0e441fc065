//! Configuration loading from TOML files
//!
//! Config file is selected via the --config command line argument,
//! defaulting to config/dev.toml. The [boundaries] table is the
//! registered geofence per classroom; polygons are validated at load
//! so a malformed boundary fails fast instead of at decision time.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::domain::types::{BoundaryPolygon, ClassroomId, Coordinate};
use crate::services::grouping::DEFAULT_INTERVAL_MINUTES;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { duration_minutes: default_session_duration_minutes() }
    }
}

fn default_session_duration_minutes() -> i64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupingConfig {
    #[serde(default = "default_grouping_interval_minutes")]
    pub interval_minutes: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self { interval_minutes: default_grouping_interval_minutes() }
    }
}

fn default_grouping_interval_minutes() -> f64 {
    DEFAULT_INTERVAL_MINUTES
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for decision egress (JSONL format)
    #[serde(default = "default_egress_file")]
    pub file: String,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file() }
    }
}

fn default_egress_file() -> String {
    "attendance.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    10
}

/// One classroom boundary as written in TOML: a list of [lat, lng]
#[derive(Debug, Clone, Deserialize)]
pub struct BoundaryToml {
    pub vertices: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub boundaries: HashMap<String, BoundaryToml>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    session_duration_minutes: i64,
    grouping_interval_minutes: f64,
    egress_file: String,
    metrics_interval_secs: u64,
    config_file: String,
    boundaries: HashMap<ClassroomId, BoundaryPolygon>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_duration_minutes: default_session_duration_minutes(),
            grouping_interval_minutes: default_grouping_interval_minutes(),
            egress_file: default_egress_file(),
            metrics_interval_secs: default_metrics_interval_secs(),
            config_file: "default".to_string(),
            boundaries: Self::default_boundaries(),
        }
    }
}

impl Config {
    /// Reference classroom: a square around (12.9716, 77.5946) ± 0.0005°
    fn default_boundaries() -> HashMap<ClassroomId, BoundaryPolygon> {
        let square = BoundaryPolygon::new(vec![
            Coordinate { latitude: 12.9721, longitude: 77.5951 },
            Coordinate { latitude: 12.9721, longitude: 77.5941 },
            Coordinate { latitude: 12.9711, longitude: 77.5941 },
            Coordinate { latitude: 12.9711, longitude: 77.5951 },
        ])
        .expect("default boundary is a valid square");

        let mut boundaries = HashMap::new();
        boundaries.insert(ClassroomId("204b".to_string()), square);
        boundaries
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let mut boundaries = HashMap::new();
        for (classroom, boundary) in toml_config.boundaries {
            let vertices = boundary
                .vertices
                .into_iter()
                .map(|[latitude, longitude]| Coordinate { latitude, longitude })
                .collect();
            let polygon = BoundaryPolygon::new(vertices)
                .with_context(|| format!("Invalid boundary for classroom {}", classroom))?;
            boundaries.insert(ClassroomId(classroom), polygon);
        }

        Ok(Self {
            session_duration_minutes: toml_config.session.duration_minutes,
            grouping_interval_minutes: toml_config.grouping.interval_minutes,
            egress_file: toml_config.egress.file,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
            boundaries,
        })
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn session_duration_minutes(&self) -> i64 {
        self.session_duration_minutes
    }

    pub fn grouping_interval_minutes(&self) -> f64 {
        self.grouping_interval_minutes
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Registered boundary per classroom
    pub fn boundaries(&self) -> &HashMap<ClassroomId, BoundaryPolygon> {
        &self.boundaries
    }

    pub fn boundary(&self, classroom: &ClassroomId) -> Option<&BoundaryPolygon> {
        self.boundaries.get(classroom)
    }
}
