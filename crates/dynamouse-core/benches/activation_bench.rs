//! Criterion benchmarks for the activation-point policy.
//!
//! `resolve_activation_point` runs once per handoff, on the movement path of
//! the mouse that triggered it.
//!
//! Run with:
//! ```bash
//! cargo bench --package dynamouse-core --bench activation_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dynamouse_core::{resolve_activation_point, DisplayBounds, Point};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Creates `n` 1920×1080 displays arranged horizontally from the origin.
fn displays_in_a_row(n: usize) -> Vec<DisplayBounds> {
    (0..n)
        .map(|i| DisplayBounds::new(1920 * i as i32, 0, 1920, 1080))
        .collect()
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_resolve_precedence(c: &mut Criterion) {
    let bounds = DisplayBounds::new(0, 0, 1920, 1080);
    let mut group = c.benchmark_group("resolve_activation_point");

    group.bench_function("center_fallback", |b| {
        b.iter(|| resolve_activation_point(black_box(&bounds), black_box(None), black_box(None)))
    });

    group.bench_function("previous_inside", |b| {
        let previous = Some(Point::new(640, 480));
        b.iter(|| {
            resolve_activation_point(black_box(&bounds), black_box(None), black_box(previous))
        })
    });

    group.bench_function("own_after_previous_outside", |b| {
        let own = Some(Point::new(10, 10));
        let previous = Some(Point::new(4000, 10));
        b.iter(|| {
            resolve_activation_point(black_box(&bounds), black_box(own), black_box(previous))
        })
    });

    group.finish();
}

fn bench_contains_across_displays(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains_scan");

    for n in [2usize, 4, 8] {
        let displays = displays_in_a_row(n);
        let probe = Point::new(1920 * (n as i32 - 1) + 5, 500);
        group.bench_with_input(BenchmarkId::from_parameter(n), &displays, |b, displays| {
            b.iter(|| displays.iter().position(|d| d.contains(black_box(probe))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve_precedence, bench_contains_across_displays);
criterion_main!(benches);
