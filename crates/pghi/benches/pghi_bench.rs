//! Criterion benchmarks for phase reconstruction
//!
//! Run with: cargo bench -p pghi

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pghi::{estimate_gradient, integrate_phase};

/// Generate a strictly positive pseudo-random magnitude surface.
fn generate_surface(num_frames: usize, num_bins: usize) -> Vec<Vec<f32>> {
    let mut state = 0x12345678u32;
    (0..num_frames)
        .map(|_| {
            (0..num_bins)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    0.05 + (state >> 8) as f32 / (1u32 << 24) as f32
                })
                .collect()
        })
        .collect()
}

fn bench_estimate_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_gradient");

    // (frames, bins) pairs roughly matching 1-8 seconds of audio at a
    // 1024-sample window with 256-sample hop.
    let sizes = [(64, 513), (256, 513), (512, 1025)];

    for (frames, bins) in sizes {
        let surface = generate_surface(frames, bins);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{frames}x{bins}")),
            &surface,
            |b, surface| {
                b.iter(|| estimate_gradient(black_box(surface), 256, 1024, 1.0).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_integrate_phase(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrate_phase");

    let sizes = [(64, 513), (256, 513), (512, 1025)];

    for (frames, bins) in sizes {
        let surface = generate_surface(frames, bins);
        let gradient = estimate_gradient(&surface, 256, 1024, 1.0).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{frames}x{bins}")),
            &(surface, gradient),
            |b, (surface, gradient)| {
                b.iter(|| integrate_phase(black_box(surface), black_box(gradient), 1e-4).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_full_reconstruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_reconstruction");

    let surface = generate_surface(256, 513);
    group.bench_function("256x513", |b| {
        b.iter(|| {
            let gradient = estimate_gradient(black_box(&surface), 256, 1024, 1.0).unwrap();
            integrate_phase(black_box(&surface), &gradient, 1e-4).unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_estimate_gradient,
    bench_integrate_phase,
    bench_full_reconstruction
);
criterion_main!(benches);
