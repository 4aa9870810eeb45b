//! Benchmarks for the layout analysis pipeline.
//!
//! Synthetic pages only: the pipeline is pure computation, so these measure
//! the algorithms, not any I/O.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use docstrata::config::{GapConfig, LayoutConfig, MetricsConfig};
use docstrata::layout::{DocumentAnalyzer, DocumentMetrics, GapProfile, PositionedLine, Viewport};

/// A two-column page with paragraph breaks every six lines.
fn synthetic_page(lines_per_column: usize) -> Vec<PositionedLine> {
    let mut lines = Vec::new();
    for column in 0..2 {
        let x = if column == 0 { 50.0 } else { 330.0 };
        let mut y = 40.0;
        for i in 0..lines_per_column {
            if i > 0 && i % 6 == 0 {
                y += 30.0; // paragraph gap
            } else {
                y += 14.0;
            }
            lines.push(PositionedLine::new(
                0,
                x,
                y,
                230.0,
                "synthetic benchmark body text for one line",
                11.0,
            ));
        }
    }
    lines
}

fn bench_full_page_analysis(c: &mut Criterion) {
    let analyzer = DocumentAnalyzer::new();
    let viewports = [Viewport::default()];

    let mut group = c.benchmark_group("page_analysis");
    for &size in &[40usize, 200, 1000] {
        let lines = synthetic_page(size / 2);
        group.bench_function(format!("{}_lines", size), |b| {
            b.iter(|| analyzer.analyze(black_box(&lines), black_box(&viewports)))
        });
    }
    group.finish();
}

fn bench_gap_profile(c: &mut Criterion) {
    let metrics = DocumentMetrics::fallback(&MetricsConfig::default());
    let config = GapConfig::default();
    let gaps: Vec<f32> = (0..1000)
        .map(|i| if i % 6 == 0 { 30.0 } else { 14.0 })
        .collect();

    c.bench_function("gap_profile_1000", |b| {
        b.iter(|| GapProfile::from_gaps(black_box(gaps.clone()), &metrics, &config))
    });
}

fn bench_column_detection(c: &mut Criterion) {
    let lines = synthetic_page(100);
    let config = LayoutConfig::default();
    let metrics = DocumentMetrics::fallback(&MetricsConfig::default());

    c.bench_function("column_detection_200", |b| {
        b.iter(|| {
            docstrata::layout::detect_columns(
                black_box(&lines),
                Viewport::default(),
                &metrics,
                &config.columns,
                &config.strips,
            )
        })
    });
}

criterion_group!(
    benches,
    bench_full_page_analysis,
    bench_gap_profile,
    bench_column_detection
);
criterion_main!(benches);
