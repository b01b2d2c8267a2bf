//! Benchmarks for storage and viewport decimation
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use streamplot_rs::{
    AxisRange, ChunkedBuffer, DisplayMode, SeriesRegistry, Viewport, ViewportDownsampler,
};

const PIXEL_WIDTH: usize = 1920;

fn filled_registry(channels: usize, samples: usize) -> Arc<SeriesRegistry> {
    let registry = Arc::new(SeriesRegistry::new(0.001, 4096).unwrap());
    for c in 0..channels {
        registry.add_channel_auto(format!("ch{}", c)).unwrap();
    }
    let column: Vec<f64> = (0..samples).map(|i| (i as f64 * 0.01).sin()).collect();
    let columns: Vec<&[f64]> = (0..channels).map(|_| column.as_slice()).collect();
    registry.lock().append_columns(&columns).unwrap();
    registry
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    group.throughput(Throughput::Elements(1));
    group.bench_function("single_sample", |b| {
        let mut buffer = ChunkedBuffer::<f64>::new(4096);
        let mut i = 0u64;
        b.iter(|| {
            buffer.add(black_box(i as f64));
            i = i.wrapping_add(1);
        });
    });

    let batch: Vec<f64> = (0..1000).map(|i| i as f64).collect();
    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("range_1000", |b| {
        let mut buffer = ChunkedBuffer::<f64>::new(4096);
        b.iter(|| buffer.add_range(black_box(&batch)));
    });

    group.throughput(Throughput::Elements(8));
    group.bench_function("registry_frame_8ch", |b| {
        let registry = filled_registry(8, 0);
        let frame = [1.0; 8];
        b.iter(|| registry.append_frame(black_box(&frame)).unwrap());
    });

    group.finish();
}

fn bench_whole_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("whole_range_decimation");

    for samples in [10_000usize, 1_000_000, 10_000_000].iter() {
        let registry = filled_registry(4, *samples);
        let downsampler = ViewportDownsampler::new(registry);
        let whole = AxisRange::new(0.0, (*samples - 1) as f64 * 0.001);
        let viewport = Viewport::new(whole, whole, PIXEL_WIDTH);

        group.bench_with_input(BenchmarkId::new("4ch", samples), samples, |b, _| {
            b.iter(|| downsampler.recompute(Some(black_box(&viewport)), DisplayMode::WholeRange));
        });
    }

    group.finish();
}

fn bench_zoomed(c: &mut Criterion) {
    let mut group = c.benchmark_group("zoomed_decimation");

    let samples = 1_000_000;
    let registry = filled_registry(4, samples);
    let downsampler = ViewportDownsampler::new(registry);
    let whole = AxisRange::new(0.0, (samples - 1) as f64 * 0.001);

    for window in [1.0, 10.0, 100.0].iter() {
        let visible = AxisRange::new(500.0, 500.0 + window);
        let viewport = Viewport::new(visible, whole, PIXEL_WIDTH);

        group.bench_with_input(BenchmarkId::new("window_s", window), window, |b, _| {
            b.iter(|| downsampler.recompute(Some(black_box(&viewport)), DisplayMode::Zoomed));
        });
        group.bench_with_input(BenchmarkId::new("live_window_s", window), window, |b, _| {
            b.iter(|| downsampler.recompute(Some(black_box(&viewport)), DisplayMode::Live));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_append, bench_whole_range, bench_zoomed);
criterion_main!(benches);
