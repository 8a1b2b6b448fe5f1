//! # Carbonwise Core
//!
//! Core library for Carbonwise. Provides the emissions analysis functions,
//! the CodeCarbon API client, credential and configuration loading, the local
//! tracking session, and the tool-facing types.

pub mod analysis;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod tracker;
pub mod types;

// Re-export commonly used types at the crate root.
pub use analysis::{
    Candidate, NameMatch, Report, RunRecord, RunTotals, Selection, aggregate_runs,
    extract_accuracy, extract_model_name, match_experiments_by_name, normalize_accuracy,
    select_lowest_consumption,
};
pub use client::{ApiAuth, ApiClient, DateWindow, Experiment, ExperimentSummary, NewExperiment};
pub use config::{ApiConfig, CarbonwiseConfig, TrackerConfig, load_config};
pub use error::{
    ApiError, CarbonwiseError, ConfigError, CredentialError, Result, ToolError, TrackerError,
};
pub use tracker::{
    ConstantPowerEstimator, EmissionsEstimator, MetricsSnapshot, StartOutcome, StopReport,
    Tracker, TrackerState, TrackerStatus, TrackingSession,
};
pub use types::{RiskLevel, ToolDefinition, ToolOutput};
