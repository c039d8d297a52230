//! Benchmark: range queries and appends on a full store
//!
//! Run with:
//! ```
//! cargo bench -p sensorstream-streaming --bench store_query
//! ```

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sensorstream_core::Sample;
use sensorstream_streaming::SampleStore;

const CAPACITY: usize = 1_000_000;
const CHANNELS: usize = 7;

/// Full store at 1 kHz with one wrap, so the ring is physically split
fn full_store() -> SampleStore {
    let mut store = SampleStore::new(CAPACITY);
    for t in 0..(CAPACITY + CAPACITY / 2) as i64 {
        store.append(Sample::new(t, vec![t as f64 * 1e-6; CHANNELS]));
    }
    store
}

fn bench_range_query(c: &mut Criterion) {
    let store = full_store();
    let reader = store.reader();
    let newest = reader.latest().map_or(0, |s| s.time);

    let mut group = c.benchmark_group("store_range_query");
    for window_ms in [100_i64, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("trailing_window", window_ms),
            &window_ms,
            |b, &window_ms| {
                b.iter(|| black_box(reader.query(Some(newest - window_ms), Some(newest))));
            },
        );
    }
    group.bench_function("latest", |b| b.iter(|| black_box(reader.latest())));
    group.finish();
}

fn bench_append_with_eviction(c: &mut Criterion) {
    let mut store = full_store();
    let mut t = (CAPACITY * 2) as i64;

    c.bench_function("store_append_full", |b| {
        b.iter(|| {
            t += 1;
            black_box(store.append(Sample::new(t, vec![0.0; CHANNELS])));
        });
    });
}

criterion_group!(benches, bench_range_query, bench_append_with_eviction);
criterion_main!(benches);
