//! Crop Plan Benchmarks
//!
//! Measures the planning stages that run after detection on long clips.
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --package smartcrop-media --bench crop_plan
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use smartcrop_media::smart_crop::{compress, CropPlanSynthesizer};
use smartcrop_media::FilterScript;
use smartcrop_models::{CompositionMode, Point, TimelineEntry};

/// One entry per second with occasional speaker changes and drifting centers.
fn synthetic_timeline(len: usize) -> Vec<TimelineEntry> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut mode = CompositionMode::Center;
    let mut x = 960.0;

    (0..len)
        .map(|i| {
            if rng.random_bool(0.05) {
                mode = match mode {
                    CompositionMode::Center => CompositionMode::Split,
                    CompositionMode::Split => CompositionMode::Center,
                };
            }
            x = (x + rng.random_range(-15.0..15.0_f64)).clamp(200.0, 1720.0);
            let centers = match mode {
                CompositionMode::Center => vec![Point::new(x, 500.0)],
                CompositionMode::Split => {
                    vec![Point::new(x / 2.0, 500.0), Point::new(960.0 + x / 2.0, 500.0)]
                }
            };
            TimelineEntry::with_centers(i as f64, mode, centers)
        })
        .collect()
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    group.measurement_time(Duration::from_secs(5));

    for len in [600usize, 3_600, 14_400] {
        let timeline = synthetic_timeline(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &timeline, |b, timeline| {
            b.iter(|| compress(black_box(timeline), 2.0))
        });
    }

    group.finish();
}

fn bench_synthesize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize");
    group.measurement_time(Duration::from_secs(5));
    let synth = CropPlanSynthesizer::default();

    for len in [600usize, 3_600, 14_400] {
        let compressed = compress(&synthetic_timeline(len), 2.0);
        let duration = len as f64;
        group.throughput(Throughput::Elements(compressed.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(len),
            &compressed,
            |b, compressed| {
                b.iter(|| {
                    let plan = synth
                        .synthesize(black_box(compressed), duration, 1920, 1080)
                        .unwrap();
                    black_box(plan.to_filter_script())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compress, bench_synthesize);
criterion_main!(benches);
