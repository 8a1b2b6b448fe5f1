use criterion::{Criterion, black_box, criterion_group, criterion_main};
use carbonwise_core::{
    Report, RunRecord, aggregate_runs, extract_accuracy, extract_model_name,
    select_lowest_consumption,
};
use serde_json::json;

fn reports(count: usize) -> Vec<Report> {
    (0..count)
        .map(|i| Report {
            experiment_id: Some(json!(format!("e-{i}"))),
            name: Some(format!("llama-{}b run {i}", i % 70)),
            description: Some(format!("fine-tuned, accuracy: {}.{}%", 80 + i % 20, i % 10)),
            emissions: Some((i % 97) as f64 * 0.013),
            energy_consumed: Some((i % 31) as f64 * 0.2),
            duration: Some(i as f64),
        })
        .collect()
}

fn bench_extraction(c: &mut Criterion) {
    c.bench_function("extract_accuracy_prefix", |b| {
        b.iter(|| extract_accuracy(black_box(Some("bert base accuracy: 92.4%"))))
    });

    c.bench_function("extract_accuracy_suffix", |b| {
        b.iter(|| extract_accuracy(black_box(Some("distilled 91,5 % f1 on squad"))))
    });

    c.bench_function("extract_accuracy_none", |b| {
        b.iter(|| extract_accuracy(black_box(Some("baseline run on laptop"))))
    });

    c.bench_function("extract_model_name", |b| {
        b.iter(|| {
            extract_model_name(
                black_box(Some("nightly")),
                black_box(Some("model: mistral-7b-instruct")),
            )
        })
    });
}

fn bench_selection(c: &mut Criterion) {
    let small = reports(10);
    let large = reports(1000);

    c.bench_function("select_lowest_10", |b| {
        b.iter(|| select_lowest_consumption(black_box(&small), None))
    });

    c.bench_function("select_lowest_1000", |b| {
        b.iter(|| select_lowest_consumption(black_box(&large), None))
    });

    c.bench_function("select_lowest_1000_threshold", |b| {
        b.iter(|| select_lowest_consumption(black_box(&large), Some(92.0)))
    });
}

fn bench_aggregation(c: &mut Criterion) {
    let runs: Vec<RunRecord> = (0..1000)
        .map(|i| RunRecord {
            emissions: Some(i as f64 * 0.001),
            energy_consumed: Some(i as f64 * 0.01),
            duration: (i % 3 != 0).then_some(60.0),
            ..Default::default()
        })
        .collect();

    c.bench_function("aggregate_runs_1000", |b| {
        b.iter(|| aggregate_runs(black_box(&runs)))
    });
}

criterion_group!(benches, bench_extraction, bench_selection, bench_aggregation);
criterion_main!(benches);
