//! Report, run, and selection records exchanged with the analysis core.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message returned when no report survives the accuracy filter.
pub const NO_MATCH_MESSAGE: &str = "No experiment matches the requested minimum accuracy.";

/// Experiment-level summary as returned by `/projects/{id}/experiments/sums`.
///
/// Fields the API adds beyond these are ignored. Numeric fields that are
/// absent or `null` count as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub experiment_id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// kg CO2-equivalent.
    #[serde(default)]
    pub emissions: Option<f64>,
    /// kWh.
    #[serde(default)]
    pub energy_consumed: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Report {
    /// Text searched for an accuracy metric: name and description joined by
    /// a space, with missing fields rendered as empty strings.
    pub fn accuracy_text(&self) -> String {
        format!(
            "{} {}",
            self.name.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default()
        )
    }
}

/// Single-run measurement as returned by `/experiments/{id}/runs/sums`.
///
/// Every other field of the API object is kept in `extra` so runs can be
/// echoed back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(default)]
    pub emissions: Option<f64>,
    #[serde(default)]
    pub energy_consumed: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A report augmented with the accuracy and model parsed from its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub experiment_id: Option<Value>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub model: Option<String>,
    /// Normalized to a decimal in `[0, 1]` when the source was well-formed.
    pub accuracy: Option<f64>,
    pub emissions_kg_co2e: f64,
    pub energy_kwh: f64,
    pub duration_seconds: f64,
}

/// Summed resource usage over a set of runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub run_count: usize,
    pub emissions_kg_co2e: f64,
    pub energy_kwh: f64,
    pub duration_seconds: f64,
}

/// Outcome of [`select_lowest_consumption`](super::select_lowest_consumption).
///
/// `selected` is `None` only when no candidate passed the filter, in which
/// case `message` explains why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub selected: Option<Candidate>,
    pub min_accuracy: Option<f64>,
    pub candidate_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Selection {
    pub(crate) fn empty(min_accuracy: Option<f64>) -> Self {
        Self {
            selected: None,
            min_accuracy,
            candidate_count: 0,
            message: Some(NO_MATCH_MESSAGE.to_string()),
        }
    }
}
