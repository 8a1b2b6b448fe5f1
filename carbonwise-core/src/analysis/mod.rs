//! Experiment analysis: accuracy/model extraction, run aggregation, and
//! lowest-consumption selection.
//!
//! Everything here is a pure function over caller-owned records. Nothing
//! performs I/O or keeps state between calls, so the functions can be used
//! from any number of tasks at once.
//!
//! ```text
//! Vec<Report> --extract--> Candidate* --filter(threshold)--> argmin(emissions, energy, duration)
//! Vec<RunRecord> --aggregate--> RunTotals
//! ```

pub mod extract;
pub mod lookup;
pub mod records;
pub mod select;

pub use extract::{extract_accuracy, extract_model_name, normalize_accuracy};
pub use lookup::{NameMatch, match_experiments_by_name};
pub use records::{Candidate, NO_MATCH_MESSAGE, Report, RunRecord, RunTotals, Selection};
pub use select::{aggregate_runs, select_lowest_consumption};
