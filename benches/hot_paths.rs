//! Criterion benchmarks for the per-frame and per-click paths.
//!
//! Run with: cargo bench --bench hot_paths

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use seedmap::context::{LocationContext, ZoomLevel};
use seedmap::data::WardRecord;
use seedmap::environment::{MockEnvironmentalDataProvider, OverlayLayer};
use seedmap::geo::{centroid, polygon_area_hectares, LatLng};
use seedmap::map::{MapRenderer, SelectionOverlay, Viewport, WardIndex};

const KAPSABET: LatLng = LatLng::new(0.20, 35.10);

/// Square ward outline with `per_side` vertices along each edge
fn ward(name: String, south: f64, west: f64, size: f64, per_side: usize) -> WardRecord {
    let step = size / per_side as f64;
    let mut ring = Vec::with_capacity(per_side * 4);
    for i in 0..per_side {
        ring.push(LatLng::new(south, west + step * i as f64));
    }
    for i in 0..per_side {
        ring.push(LatLng::new(south + step * i as f64, west + size));
    }
    for i in 0..per_side {
        ring.push(LatLng::new(south + size, west + size - step * i as f64));
    }
    for i in 0..per_side {
        ring.push(LatLng::new(south + size - step * i as f64, west));
    }
    WardRecord {
        name,
        sub_county: None,
        population: None,
        elevation: None,
        center: LatLng::new(south + size / 2.0, west + size / 2.0),
        rings: vec![ring],
    }
}

/// 6 x 5 grid of wards roughly covering the county
fn county_wards() -> Vec<WardRecord> {
    (0..30)
        .map(|i| {
            let (row, col) = (i / 6, i % 6);
            ward(
                format!("Ward {i}"),
                -0.05 + row as f64 * 0.1,
                34.85 + col as f64 * 0.1,
                0.1,
                50,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Benchmark: polygon metrics for a drawn farm area
// ---------------------------------------------------------------------------

fn bench_polygon_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("polygon_metrics");
    let farm = ward("Farm".to_string(), 0.19, 35.09, 0.01, 8).rings.remove(0);

    group.bench_function("area_hectares_32", |b| {
        b.iter(|| black_box(polygon_area_hectares(black_box(&farm))));
    });
    group.bench_function("centroid_32", |b| {
        b.iter(|| black_box(centroid(black_box(&farm))));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: click to ward lookup
// ---------------------------------------------------------------------------

fn bench_ward_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("ward_lookup");
    let wards = county_wards();
    let index = WardIndex::build(&wards, 0.05);

    group.bench_function("indexed_hit", |b| {
        b.iter(|| black_box(index.lookup(&wards, black_box(KAPSABET))));
    });
    group.bench_function("indexed_miss", |b| {
        b.iter(|| black_box(index.lookup(&wards, black_box(LatLng::new(2.0, 37.0)))));
    });
    group.bench_function("linear_scan", |b| {
        b.iter(|| black_box(wards.iter().position(|w| w.contains(black_box(KAPSABET)))));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: full map frame
// ---------------------------------------------------------------------------

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_render");
    let mut renderer = MapRenderer::new();
    renderer.set_wards(county_wards());
    let provider = MockEnvironmentalDataProvider::default();
    let viewport = Viewport::at_level(KAPSABET, ZoomLevel::COUNTY, 240, 160);
    let context = LocationContext::county();
    let selection = SelectionOverlay {
        context: &context,
        draft: &[],
    };

    group.bench_function("wards_120x40", |b| {
        b.iter(|| black_box(renderer.render(120, 40, &viewport, &selection, &provider)));
    });

    renderer.settings.overlay = Some(OverlayLayer::ALL[0]);
    group.bench_function("wards_overlay_120x40", |b| {
        b.iter(|| black_box(renderer.render(120, 40, &viewport, &selection, &provider)));
    });

    group.finish();
}

criterion_group!(benches, bench_polygon_metrics, bench_ward_lookup, bench_render);
criterion_main!(benches);
