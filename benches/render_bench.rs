//! Frame rendering benchmarks.
//!
//! The render unit spins as fast as the strip accepts frames, so the cost of
//! one frame bounds the animation rate.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench render_bench
//! ```

use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fingerlight_core::config::AnimationSettings;
use fingerlight_core::{Identity, Rgb};
use fingerlight_engine::{AnimationEngine, SharedState};
use fingerlight_hardware::mock::MockStrip;
use fingerlight_hardware::traits::LedStrip;
use fingerlight_hardware::types::StripConfig;

const STRIP_LENGTHS: [usize; 3] = [35, 144, 300];

fn engine(pixels: usize, shared: Arc<SharedState>) -> AnimationEngine<MockStrip> {
    let (mut strip, _handle) = MockStrip::new();
    strip.configure(&StripConfig::new(pixels)).unwrap();
    AnimationEngine::new(strip, shared, pixels, AnimationSettings::default()).unwrap()
}

/// Benchmark the idle rainbow.
fn bench_idle(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_idle");

    for pixels in STRIP_LENGTHS {
        group.throughput(Throughput::Elements(pixels as u64));
        let mut engine = engine(pixels, Arc::new(SharedState::new()));
        let start = Instant::now();
        let mut tick = 0u64;

        group.bench_with_input(BenchmarkId::from_parameter(pixels), &pixels, |b, _| {
            b.iter(|| {
                tick += 1;
                let now = start + Duration::from_millis(tick);
                black_box(engine.render_frame_at(black_box(now)));
            });
        });
    }

    group.finish();
}

/// Benchmark the comet for a matched identity.
fn bench_comet(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_comet");

    for pixels in STRIP_LENGTHS {
        group.throughput(Throughput::Elements(pixels as u64));
        let shared = Arc::new(SharedState::new());
        let id = Identity::new(7);
        shared.assign_color(id, Rgb { r: 255, g: 0, b: 128 });
        shared.publish(id);
        let mut engine = engine(pixels, shared);
        let start = Instant::now();
        let mut tick = 0u64;

        group.bench_with_input(BenchmarkId::from_parameter(pixels), &pixels, |b, _| {
            b.iter(|| {
                tick += 1;
                let now = start + Duration::from_millis(tick);
                black_box(engine.render_frame_at(black_box(now)));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_idle, bench_comet);
criterion_main!(benches);
