//! Benchmarks for the heavier pixellab filters
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pixellab::{
    composite, edges, equalize_local, BlendOperation, Compass, EdgeOperator, EdgeParams, RasterBuffer,
};

/// Generate a synthetic RGBA image with gradients and a hard diagonal edge
fn generate_test_image(width: usize, height: usize) -> RasterBuffer {
    let mut data = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let edge = if x > y { 200 } else { 40 };
            data.push(((x * 255) / width) as u8);
            data.push(((y * 255) / height) as u8);
            data.push(edge);
            data.push(255);
        }
    }
    RasterBuffer::from_raw(width, height, data).expect("valid synthetic image")
}

/// Benchmark edge operators, including smoothing
fn bench_edges(c: &mut Criterion) {
    let mut group = c.benchmark_group("edges");
    let params = EdgeParams::default();

    for size in [128usize, 512].iter() {
        let image = generate_test_image(*size, *size);
        group.throughput(Throughput::Elements((size * size) as u64));

        for op in [
            EdgeOperator::Sobel,
            EdgeOperator::LaplacianOfGaussian,
            EdgeOperator::Kompas(Compass::All),
        ] {
            group.bench_with_input(
                BenchmarkId::new(op.to_string(), format!("{}x{}", size, size)),
                &image,
                |b, img| b.iter(|| edges(black_box(img), op, black_box(&params))),
            );
        }
    }

    group.finish();
}

/// Benchmark local equalization for growing windows
fn bench_equalize_local(c: &mut Criterion) {
    let mut group = c.benchmark_group("equalize_local");
    let image = generate_test_image(256, 256);
    group.throughput(Throughput::Elements(256 * 256));

    for window in [3usize, 15, 31].iter() {
        group.bench_with_input(BenchmarkId::new("window", window), window, |b, &w| {
            b.iter(|| equalize_local(black_box(&image), w))
        });
    }

    group.finish();
}

/// Benchmark two-image compositing
fn bench_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite");
    let a = generate_test_image(1024, 1024);
    let b = generate_test_image(1024, 768);

    for op in [BlendOperation::Xor, BlendOperation::Division] {
        group.bench_function(op.tag(), |bench| {
            bench.iter(|| composite(black_box(&a), black_box(&b), op))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_edges, bench_equalize_local, bench_composite);
criterion_main!(benches);
