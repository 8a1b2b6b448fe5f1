//! Run aggregation and lowest-consumption experiment selection.

use super::extract::{extract_accuracy, extract_model_name, normalize_accuracy};
use super::records::{Candidate, Report, RunRecord, RunTotals, Selection};
use tracing::debug;

/// Sum emissions, energy, and duration across `runs`.
///
/// A missing field contributes `0.0` for that run only; the run is still
/// counted.
pub fn aggregate_runs(runs: &[RunRecord]) -> RunTotals {
    runs.iter().fold(
        RunTotals {
            run_count: runs.len(),
            ..RunTotals::default()
        },
        |mut totals, run| {
            totals.emissions_kg_co2e += run.emissions.unwrap_or(0.0);
            totals.energy_kwh += run.energy_consumed.unwrap_or(0.0);
            totals.duration_seconds += run.duration.unwrap_or(0.0);
            totals
        },
    )
}

impl Candidate {
    /// Derive a candidate from a report, parsing accuracy and model from its text.
    pub fn from_report(report: &Report) -> Self {
        let accuracy_text = report.accuracy_text();
        Self {
            experiment_id: report.experiment_id.clone(),
            name: report.name.clone(),
            description: report.description.clone(),
            model: extract_model_name(report.name.as_deref(), report.description.as_deref()),
            accuracy: extract_accuracy(Some(&accuracy_text)),
            emissions_kg_co2e: report.emissions.unwrap_or(0.0),
            energy_kwh: report.energy_consumed.unwrap_or(0.0),
            duration_seconds: report.duration.unwrap_or(0.0),
        }
    }

    /// Whether this candidate satisfies `threshold` (already normalized).
    ///
    /// Without a threshold every candidate qualifies; with one, a candidate
    /// whose accuracy could not be parsed never does.
    pub fn meets(&self, threshold: Option<f64>) -> bool {
        match threshold {
            None => true,
            Some(min) => self.accuracy.is_some_and(|accuracy| accuracy >= min),
        }
    }

    fn ranking_key(&self) -> [f64; 3] {
        [self.emissions_kg_co2e, self.energy_kwh, self.duration_seconds]
    }

    /// Strict lexicographic "less than" on (emissions, energy, duration).
    ///
    /// The first pair of unequal components decides; an all-equal key is not
    /// less, so the earlier candidate keeps the win.
    fn ranks_before(&self, other: &Candidate) -> bool {
        self.ranking_key()
            .into_iter()
            .zip(other.ranking_key())
            .find(|(a, b)| a != b)
            .is_some_and(|(a, b)| a < b)
    }
}

/// Pick the lowest-emission experiment whose parsed accuracy meets
/// `min_accuracy`.
///
/// `min_accuracy` may be given as a percentage (`92.0`) or a decimal
/// (`0.92`); it is normalized once before filtering. Ties on emissions fall
/// back to energy, then duration, then input order.
pub fn select_lowest_consumption(reports: &[Report], min_accuracy: Option<f64>) -> Selection {
    let threshold = min_accuracy.map(normalize_accuracy);

    let candidates: Vec<Candidate> = reports
        .iter()
        .map(Candidate::from_report)
        .filter(|candidate| candidate.meets(threshold))
        .collect();

    debug!(
        reports = reports.len(),
        candidates = candidates.len(),
        threshold = ?threshold,
        "Filtered experiment candidates"
    );

    let candidate_count = candidates.len();
    let Some(selected) = candidates.into_iter().reduce(|best, candidate| {
        if candidate.ranks_before(&best) {
            candidate
        } else {
            best
        }
    }) else {
        return Selection::empty(threshold);
    };

    Selection {
        selected: Some(selected),
        min_accuracy: threshold,
        candidate_count,
        message: None,
    }
}
