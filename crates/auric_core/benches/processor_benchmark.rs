//! Performance benchmarks for the engine layer
//!
//! Run with: cargo bench -p auric_core

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use auric_core::{EqParams, EqProcessor, ParamId};

fn benchmark_process_stereo(c: &mut Criterion) {
    let mut group = c.benchmark_group("processor");

    for size in [128, 512, 2048] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("process_stereo_{}_frames", size), |b| {
            let params = Arc::new(EqParams::new());
            params.set(ParamId::Peak1Gain, 6.0);
            params.set(ParamId::LowCutSlope, 3.0);
            let (mut processor, _taps) = EqProcessor::new(params, 48_000.0, size).unwrap();

            let mut left: Vec<f32> = (0..size).map(|i| (i as f32 * 0.001).sin()).collect();
            let mut right = left.clone();

            b.iter(|| {
                processor.process_stereo(black_box(&mut left), black_box(&mut right));
            });
        });
    }

    group.finish();
}

fn benchmark_param_set(c: &mut Criterion) {
    c.bench_function("param_set", |b| {
        let params = EqParams::new();
        let mut gain = 0.0f32;

        b.iter(|| {
            // Simulate a moving slider
            gain = (gain + 0.5) % 24.0;
            params.set(ParamId::Peak2Gain, black_box(gain));
        });
    });
}

criterion_group!(benches, benchmark_process_stereo, benchmark_param_set);

criterion_main!(benches);
