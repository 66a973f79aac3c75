/// Benchmarks for the virtual window calculator
///
/// Run with: cargo bench -p pdfchat-viewport
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pdfchat_viewport::{calculate_visible_range, compute_padding, ItemHeights, VisibleRange};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ITEM_COUNT: u32 = 10_000;
const ESTIMATE: f64 = 120.0;

/// A long transcript where roughly two thirds of the messages are measured
fn transcript() -> (Vec<u32>, ItemHeights<u32>) {
    let mut rng = StdRng::seed_from_u64(7);
    let items: Vec<u32> = (0..ITEM_COUNT).collect();
    let mut heights = ItemHeights::new();
    for &id in &items {
        if rng.gen_bool(0.66) {
            heights.record(id, rng.gen_range(32.0..900.0));
        }
    }
    (items, heights)
}

fn benchmark_visible_range(c: &mut Criterion) {
    let (items, heights) = transcript();
    let mut group = c.benchmark_group("visible_range");

    for offset in [0.0, 250_000.0, 1_000_000.0] {
        group.bench_with_input(BenchmarkId::from_parameter(offset), &offset, |b, &offset| {
            b.iter(|| {
                calculate_visible_range(
                    black_box(offset),
                    black_box(900.0),
                    Some(&items[..]),
                    &heights,
                    5,
                    ESTIMATE,
                )
            });
        });
    }

    group.finish();
}

fn benchmark_padding(c: &mut Criterion) {
    let (items, heights) = transcript();
    let mut group = c.benchmark_group("padding");

    for start in [0usize, 5_000, 9_980] {
        let range = VisibleRange::new(start, start + 20).clamp_to(items.len());
        group.bench_with_input(BenchmarkId::from_parameter(start), &range, |b, &range| {
            b.iter(|| compute_padding(Some(&items[..]), black_box(range), &heights, ESTIMATE));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_visible_range, benchmark_padding);
criterion_main!(benches);
