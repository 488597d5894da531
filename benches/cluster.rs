use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use nalgebra::{Point3, Vector3};

use brepmend::document::Document;
use brepmend::kernel::rect::{RectKernel, RectShape};
use brepmend::kernel::Kernel;
use brepmend::merge::glue_assembly;
use brepmend::overlap::{check_overlaps, OverlapConfig};

/// An n x n grid of abutting unit cubes
fn cube_grid(kernel: &RectKernel, n: usize) -> Vec<RectShape> {
    let mut out = vec![];
    for i in 0..n {
        for j in 0..n {
            out.push(kernel.make_box(
                Point3::new(i as f64, j as f64, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
            ));
        }
    }
    out
}

pub fn grid_glue(c: &mut Criterion) {
    let kernel = RectKernel::new();
    let mut group = c.benchmark_group("glue (cube grid)");
    for n in [2usize, 4, 6] {
        let compound = kernel.make_compound(&cube_grid(&kernel, n));
        group.bench_function(BenchmarkId::from_parameter(n * n), |b| {
            b.iter(|| black_box(glue_assembly(&kernel, &compound, 0.001).unwrap()))
        });
    }
}

pub fn grid_overlap_check(c: &mut Criterion) {
    let kernel = RectKernel::new();
    let mut group = c.benchmark_group("overlap check (cube grid)");
    for threads in [1usize, 4] {
        let doc = Document::from_solids(cube_grid(&kernel, 5));
        let config = OverlapConfig {
            workers: threads,
            ..OverlapConfig::default()
        };
        group.bench_function(BenchmarkId::new("threads", threads), |b| {
            b.iter(|| {
                black_box(
                    check_overlaps(&kernel, &doc, &config, &mut std::io::sink()).unwrap(),
                )
            })
        });
    }
}

criterion_group!(benches, grid_glue, grid_overlap_check);
criterion_main!(benches);
