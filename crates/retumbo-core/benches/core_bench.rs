//! Benchmarks for retumbo-core primitives.
//!
//! Run with: cargo bench -p retumbo-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use retumbo_core::{
    AnalysisTap, Biquad, Ducker, SmoothedParam, boost_ceiling, lowpass_coefficients,
    release_tau_seconds,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| libm::sinf(2.0 * core::f32::consts::PI * 60.0 * i as f32 / SAMPLE_RATE) * 0.5)
        .collect()
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("biquad");

    for &size in BLOCK_SIZES {
        let signal = generate_test_signal(size);

        group.bench_with_input(BenchmarkId::new("boost_lowpass", size), &size, |b, _| {
            let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(60.0, 7.0, SAMPLE_RATE);
            let mut biquad = Biquad::new();
            biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
            b.iter(|| {
                let mut acc = 0.0f32;
                for &s in &signal {
                    acc += biquad.process(black_box(s));
                }
                black_box(acc)
            });
        });
    }

    group.bench_function("coefficient_calc", |b| {
        b.iter(|| {
            black_box(lowpass_coefficients(
                black_box(60.0),
                black_box(7.0),
                SAMPLE_RATE,
            ))
        });
    });

    group.finish();
}

fn bench_analysis_tap(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis_tap");

    for &size in BLOCK_SIZES {
        let signal = generate_test_signal(size);

        group.bench_with_input(BenchmarkId::new("push_block", size), &size, |b, _| {
            let mut tap = AnalysisTap::new();
            b.iter(|| {
                for &s in &signal {
                    tap.push(black_box(s));
                }
            });
        });
    }

    group.bench_function("window_rms", |b| {
        let mut tap = AnalysisTap::new();
        for &s in &generate_test_signal(1024) {
            tap.push(s);
        }
        b.iter(|| black_box(tap.rms()));
    });

    group.finish();
}

fn bench_ducker(c: &mut Criterion) {
    let mut group = c.benchmark_group("ducker");

    group.bench_function("step", |b| {
        let mut ducker = Ducker::new();
        let ceiling = boost_ceiling(50.0);
        let release = release_tau_seconds(50.0);
        b.iter(|| {
            black_box(ducker.step(black_box(0.05), ceiling, release, 1.0 / 60.0));
        });
    });

    group.finish();
}

fn bench_smoothed_param(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoothed_param");

    for &size in BLOCK_SIZES {
        group.bench_with_input(BenchmarkId::new("advance_block", size), &size, |b, &size| {
            let mut param = SmoothedParam::standard(0.0, SAMPLE_RATE);
            param.set_target(10.0);
            b.iter(|| {
                let mut acc = 0.0f32;
                for _ in 0..size {
                    acc += param.advance();
                }
                black_box(acc)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_biquad,
    bench_analysis_tap,
    bench_ducker,
    bench_smoothed_param
);
criterion_main!(benches);
