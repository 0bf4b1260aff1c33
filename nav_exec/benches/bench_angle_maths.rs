//! # Angle Maths Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nav_lib::scan::policy::{aggregate, DetectionSample};
use util::maths::{circular_mean_deg, signed_delta_deg};

fn angle_maths_benchmark(c: &mut Criterion) {
    // ---- Samples of a full 20 degree sweep ----

    let samples: Vec<DetectionSample> = (1..=18)
        .map(|k| {
            let heading_deg = k as f64 * 20.0;
            let percentage = if k % 4 == 0 { 0.12 } else { 0.01 * k as f64 / 18.0 };
            DetectionSample::new(heading_deg, percentage)
        })
        .collect();

    let headings: Vec<f64> = samples.iter().map(|s| s.heading.deg()).collect();

    c.bench_function("signed_delta_deg", |b| {
        b.iter(|| signed_delta_deg(black_box(350.0), black_box(10.0)))
    });

    c.bench_function("circular_mean_deg", |b| {
        b.iter(|| circular_mean_deg(black_box(&headings)))
    });

    c.bench_function("aggregate sweep", |b| {
        b.iter(|| aggregate(black_box(&samples), 0.07, Some(0.40)))
    });
}

criterion_group!(benches, angle_maths_benchmark);
criterion_main!(benches);
