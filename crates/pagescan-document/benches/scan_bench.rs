// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the scan pipeline: page detection alone and the
// full detect + rectify pass, on a synthetic photo of a tilted sheet.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use pagescan_core::ScanConfig;
use pagescan_document::image::resize_to_height;
use pagescan_document::{ContourDetector, DocumentDetector, ReferenceBackend, Scanner};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 1200x1600 photo: dark desk with a light sheet tilted by a few degrees.
fn tilted_sheet() -> DynamicImage {
    let mut img = RgbImage::from_pixel(1200, 1600, Rgb([40, 45, 50]));
    let corners = [
        Point::new(210, 170),
        Point::new(1010, 230),
        Point::new(960, 1420),
        Point::new(150, 1360),
    ];
    draw_polygon_mut(&mut img, &corners, Rgb([235, 232, 225]));
    DynamicImage::ImageRgb8(img)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_detection(c: &mut Criterion) {
    let config = ScanConfig::default();
    let photo = tilted_sheet();
    let working = resize_to_height(&photo, config.detection_height);
    let detector = ContourDetector::from_config(&config);

    c.bench_function("detect page outline (500 px tall)", |b| {
        b.iter(|| black_box(detector.detect(black_box(&working))));
    });
}

fn bench_full_scan(c: &mut Criterion) {
    let config = ScanConfig::default();
    let photo = tilted_sheet();
    let fast = Scanner::new(config.clone()).expect("default config is valid");
    let reference = Scanner::with_parts(
        config.clone(),
        ContourDetector::from_config(&config),
        ReferenceBackend,
    )
    .expect("default config is valid");

    let mut group = c.benchmark_group("scan 1200x1600");
    group.sample_size(10);
    group.bench_function("imageproc backend", |b| {
        b.iter(|| black_box(fast.scan(black_box(&photo))))
    });
    group.bench_function("reference backend", |b| {
        b.iter(|| black_box(reference.scan(black_box(&photo))))
    });
    group.finish();
}

criterion_group!(benches, bench_detection, bench_full_scan);
criterion_main!(benches);
