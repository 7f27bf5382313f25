use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use wiretrace::prelude::*;
use wiretrace::{BoundingBox, ComponentType, LineSegmentExtractor};

/// A 600x400 page with a resistor ladder: three horizontal rungs and a
/// vertical return rail.
fn ladder() -> (GrayImage, Vec<DetectedComponent>) {
    let mut img = GrayImage::from_pixel(600, 400, Luma([255]));
    let mut components = Vec::new();
    for (row, y) in [80u32, 200, 320].into_iter().enumerate() {
        for x in 130..=270 {
            for dy in 0..3 {
                img.put_pixel(x, y - 1 + dy, Luma([0]));
            }
        }
        for (col, x0) in [30.0, 270.0].into_iter().enumerate() {
            components.push(
                DetectedComponent::new(
                    format!("R{}{}", row, col),
                    BoundingBox::new(x0, f64::from(y) - 10.0, x0 + 100.0, f64::from(y) + 10.0),
                    ComponentType::Resistor,
                )
                .with_value("10k"),
            );
        }
    }
    for y in 80..=320 {
        for dx in 0..3 {
            img.put_pixel(499 + dx, y, Luma([0]));
        }
    }
    (img, components)
}

fn bench_extract_segments(c: &mut Criterion) {
    let (img, _) = ladder();
    let config = DetectionConfig::default();
    c.bench_function("extract_segments", |b| {
        b.iter(|| LineSegmentExtractor::extract(black_box(&img), black_box(&config)));
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let (img, components) = ladder();
    c.bench_function("analyze_image", |b| {
        b.iter(|| {
            WiretraceCore::analyze_image(
                black_box(&img),
                black_box(&components),
                black_box(AnalysisOptions::default()),
            )
        });
    });
}

criterion_group!(benches, bench_extract_segments, bench_full_pipeline);
criterion_main!(benches);
