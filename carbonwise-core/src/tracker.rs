//! Local energy-tracking session.
//!
//! At most one session runs at a time. The tracker owns its state instead of
//! relying on process globals, so the tool layer shares it behind a mutex and
//! tests drive it with an explicit clock through the `*_at` methods.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::error::TrackerError;

/// Turns an elapsed duration into energy and emissions figures.
pub trait EmissionsEstimator: Send + Sync {
    /// Returns `(energy_kwh, emissions_kg_co2e)` for `elapsed_seconds` of work.
    fn estimate(&self, elapsed_seconds: f64) -> (f64, f64);
}

/// Assumes a constant power draw on a grid of fixed carbon intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantPowerEstimator {
    pub power_watts: f64,
    pub carbon_intensity_kg_per_kwh: f64,
}

impl ConstantPowerEstimator {
    pub fn new(power_watts: f64, carbon_intensity_kg_per_kwh: f64) -> Self {
        Self {
            power_watts,
            carbon_intensity_kg_per_kwh,
        }
    }
}

impl Default for ConstantPowerEstimator {
    fn default() -> Self {
        let config = TrackerConfig::default();
        Self::new(config.power_watts, config.carbon_intensity_kg_per_kwh)
    }
}

impl EmissionsEstimator for ConstantPowerEstimator {
    fn estimate(&self, elapsed_seconds: f64) -> (f64, f64) {
        let energy_kwh = self.power_watts * elapsed_seconds.max(0.0) / 3_600_000.0;
        (energy_kwh, energy_kwh * self.carbon_intensity_kg_per_kwh)
    }
}

/// A running tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSession {
    pub started_at: DateTime<Utc>,
    pub project_name: String,
    pub measure_power_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TrackerState {
    #[default]
    Idle,
    Tracking(TrackingSession),
}

/// Result of asking the tracker to start.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started(TrackingSession),
    /// A session was already running; it is left untouched.
    AlreadyRunning,
}

/// Final figures for a stopped session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopReport {
    pub duration_seconds: f64,
    pub energy_kwh: f64,
    pub emissions_kg_co2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrackerStatus {
    Tracking { start_time: String },
    NotTracking,
}

/// Elapsed-time snapshot of a running session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub start_time: String,
    pub current_time: String,
    pub duration_seconds: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Formats a timestamp the way session output reports it (RFC 3339).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

pub struct Tracker {
    state: TrackerState,
    project_name: String,
    estimator: Box<dyn EmissionsEstimator>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("state", &self.state)
            .field("project_name", &self.project_name)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    pub fn new(project_name: impl Into<String>, estimator: Box<dyn EmissionsEstimator>) -> Self {
        Self {
            state: TrackerState::Idle,
            project_name: project_name.into(),
            estimator,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(
            config.project_name.clone(),
            Box::new(ConstantPowerEstimator::new(
                config.power_watts,
                config.carbon_intensity_kg_per_kwh,
            )),
        )
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackerState::Tracking(_))
    }

    pub fn start(&mut self, measure_power_secs: u64) -> StartOutcome {
        self.start_at(measure_power_secs, Utc::now())
    }

    pub fn start_at(&mut self, measure_power_secs: u64, now: DateTime<Utc>) -> StartOutcome {
        if self.is_tracking() {
            debug!("Start requested while a session is running");
            return StartOutcome::AlreadyRunning;
        }

        let session = TrackingSession {
            started_at: now,
            project_name: self.project_name.clone(),
            measure_power_secs,
        };
        info!(
            project = %session.project_name,
            measure_power_secs,
            "Tracking session started"
        );
        self.state = TrackerState::Tracking(session.clone());
        StartOutcome::Started(session)
    }

    pub fn stop(&mut self) -> Result<StopReport, TrackerError> {
        self.stop_at(Utc::now())
    }

    pub fn stop_at(&mut self, now: DateTime<Utc>) -> Result<StopReport, TrackerError> {
        let session = match std::mem::take(&mut self.state) {
            TrackerState::Tracking(session) => session,
            TrackerState::Idle => return Err(TrackerError::NotTracking),
        };

        let elapsed = elapsed_seconds(session.started_at, now);
        let (energy_kwh, emissions_kg_co2) = self.estimator.estimate(elapsed);
        let report = StopReport {
            duration_seconds: round2(elapsed),
            energy_kwh,
            emissions_kg_co2,
        };
        info!(
            duration_seconds = report.duration_seconds,
            emissions_kg_co2 = report.emissions_kg_co2,
            "Tracking session stopped"
        );
        Ok(report)
    }

    pub fn status(&self) -> TrackerStatus {
        match &self.state {
            TrackerState::Tracking(session) => TrackerStatus::Tracking {
                start_time: format_timestamp(session.started_at),
            },
            TrackerState::Idle => TrackerStatus::NotTracking,
        }
    }

    pub fn current_metrics(&self) -> Result<MetricsSnapshot, TrackerError> {
        self.current_metrics_at(Utc::now())
    }

    pub fn current_metrics_at(&self, now: DateTime<Utc>) -> Result<MetricsSnapshot, TrackerError> {
        match &self.state {
            TrackerState::Tracking(session) => Ok(MetricsSnapshot {
                start_time: format_timestamp(session.started_at),
                current_time: format_timestamp(now),
                duration_seconds: round2(elapsed_seconds(session.started_at, now)),
            }),
            TrackerState::Idle => Err(TrackerError::NotTracking),
        }
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}
