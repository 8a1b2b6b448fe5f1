//! Property-based tests for the analysis functions using proptest.

use proptest::prelude::*;

use carbonwise_core::{
    Report, RunRecord, aggregate_runs, extract_accuracy, extract_model_name, normalize_accuracy,
    select_lowest_consumption,
};
use serde_json::json;

fn report_strategy() -> impl Strategy<Value = Report> {
    (
        0u32..1000,
        prop::option::of(0u32..10_000),
        prop::option::of(0.0f64..100.0),
        prop::option::of(0.0f64..100.0),
        prop::option::of(0.0f64..10_000.0),
    )
        .prop_map(|(id, accuracy_bp, emissions, energy, duration)| Report {
            experiment_id: Some(json!(id)),
            name: Some(format!("exp-{id}")),
            description: accuracy_bp.map(|bp| format!("accuracy: {}.{:02}%", bp / 100, bp % 100)),
            emissions,
            energy_consumed: energy,
            duration,
        })
}

// --- Normalization properties ---

proptest! {
    #[test]
    fn normalize_is_identity_up_to_one(value in -1000.0f64..=1.0) {
        prop_assert_eq!(normalize_accuracy(value), value);
    }

    #[test]
    fn normalize_divides_percentages(value in 1.0001f64..10_000.0) {
        let normalized = normalize_accuracy(value);
        prop_assert!((normalized * 100.0 - value).abs() < 1e-9);
    }

    #[test]
    fn normalize_is_idempotent_up_to_hundred(value in -1000.0f64..=100.0) {
        let once = normalize_accuracy(value);
        prop_assert_eq!(normalize_accuracy(once), once);
    }

    #[test]
    fn normalize_maps_percent_range_into_unit(value in 0.0f64..=100.0) {
        let normalized = normalize_accuracy(value);
        prop_assert!((0.0..=1.0).contains(&normalized));
    }
}

// --- Extraction properties ---

proptest! {
    #[test]
    fn extract_accuracy_never_panics(text in ".{0,200}") {
        let _ = extract_accuracy(Some(&text));
    }

    #[test]
    fn extract_accuracy_reads_integer_percentages(pct in 2u32..=100, keyword in "(accuracy|acc|precision|f1|score)") {
        let text = format!("run {keyword}: {pct}%");
        let accuracy = extract_accuracy(Some(&text)).unwrap();
        prop_assert!((accuracy - f64::from(pct) / 100.0).abs() < 1e-12);
    }

    #[test]
    fn extract_model_name_falls_back_to_name(name in "[a-z]{1,12}") {
        prop_assume!(!name.starts_with("llama") && !name.starts_with("mistral"));
        prop_assert_eq!(extract_model_name(Some(&name), None), Some(name.clone()));
    }
}

// --- Aggregation and selection properties ---

proptest! {
    #[test]
    fn aggregate_counts_every_run(values in prop::collection::vec(prop::option::of(0.0f64..10.0), 0..50)) {
        let runs: Vec<RunRecord> = values
            .iter()
            .map(|v| RunRecord { emissions: *v, ..Default::default() })
            .collect();
        let totals = aggregate_runs(&runs);
        prop_assert_eq!(totals.run_count, runs.len());
        prop_assert!(totals.emissions_kg_co2e >= 0.0);
        prop_assert_eq!(totals.energy_kwh, 0.0);
    }

    #[test]
    fn selection_is_minimal(reports in prop::collection::vec(report_strategy(), 0..30)) {
        let selection = select_lowest_consumption(&reports, None);
        prop_assert_eq!(selection.candidate_count, reports.len());

        match selection.selected {
            None => prop_assert!(reports.is_empty()),
            Some(best) => {
                for report in &reports {
                    prop_assert!(best.emissions_kg_co2e <= report.emissions.unwrap_or(0.0));
                }
            }
        }
    }

    #[test]
    fn selection_respects_threshold(
        reports in prop::collection::vec(report_strategy(), 0..30),
        min_accuracy in 0.0f64..100.0,
    ) {
        let selection = select_lowest_consumption(&reports, Some(min_accuracy));
        let threshold = normalize_accuracy(min_accuracy);
        prop_assert_eq!(selection.min_accuracy, Some(threshold));

        match selection.selected {
            Some(best) => prop_assert!(best.accuracy.unwrap() >= threshold),
            None => {
                prop_assert_eq!(selection.candidate_count, 0);
                prop_assert!(selection.message.is_some());
            }
        }
    }
}
