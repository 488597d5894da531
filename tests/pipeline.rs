//! End-to-end run of the full pipeline against the rectilinear backend:
//! overlap check -> pair list -> imprint -> merge.
use std::io::Cursor;

use nalgebra::{Point3, Vector3};

use brepmend::document::Document;
use brepmend::imprint::imprint_document;
use brepmend::kernel::rect::RectKernel;
use brepmend::kernel::{Kernel, ShapeKind};
use brepmend::merge::merge_document;
use brepmend::overlap::{check_overlaps, OverlapConfig};
use brepmend::pairs::read_imprint_pairs;

fn cube_at(k: &RectKernel, x: f64, y: f64, z: f64, length: f64) -> brepmend::kernel::rect::RectShape {
    k.make_box(Point3::new(x, y, z), Vector3::new(length, length, length))
}

#[test]
fn overlap_imprint_merge_round_trip() {
    let kernel = RectKernel::new();

    // two overlapping cubes, one abutting neighbour, one far away
    let mut doc = Document::from_solids(vec![
        cube_at(&kernel, 0.0, 0.0, 0.0, 5.0),
        cube_at(&kernel, 4.0, 0.0, 0.0, 5.0),
        cube_at(&kernel, 9.0, 0.0, 0.0, 5.0),
        cube_at(&kernel, 100.0, 0.0, 0.0, 5.0),
    ]);
    let total_before: f64 = doc.solids().iter().map(|s| kernel.volume_raw(s)).sum();

    // stage 1: overlap checking
    let config = OverlapConfig {
        workers: 2,
        // a quarter of the smaller cube may overlap before we call the
        // geometry unfit
        max_common_ratio: 0.25,
        ..OverlapConfig::default()
    };
    let mut csv = vec![];
    let summary = check_overlaps(&kernel, &doc, &config, &mut csv).unwrap();

    assert_eq!(summary.bbox_tests, 6);
    assert_eq!(summary.overlaps, 1);
    assert_eq!(summary.touching, 1);
    assert_eq!(summary.failed, 0);
    assert!(!summary.has_errors());

    // stage 2: imprinting, driven by the CSV emitted above
    let mut pairs = read_imprint_pairs(Cursor::new(csv), &doc).unwrap();
    pairs.sort_unstable();
    assert_eq!(pairs, vec![(1, 0)]);

    let imprinted = imprint_document(&kernel, &mut doc, &pairs, 0.01).unwrap();
    assert_eq!(imprinted.modified, 1);
    assert_eq!(imprinted.failed, 0);

    // the overlapping volume is now owned by exactly one solid
    let total_after: f64 = doc.solids().iter().map(|s| kernel.volume_raw(s)).sum();
    let overlap_volume = 1.0 * 5.0 * 5.0;
    assert!((total_after - (total_before - overlap_volume)).abs() < 1e-9);

    // stage 3: merging
    let merged = merge_document(&kernel, &doc, 0.001).unwrap();
    assert_eq!(merged.len(), doc.len());

    let merged_total: f64 = merged.solids().iter().map(|s| kernel.volume_raw(s)).sum();
    assert!((merged_total - total_after).abs() < total_after * 0.001);

    // the abutting pair (1, 2) now shares topology
    let faces_1 = kernel.subshapes(merged.solid(1), ShapeKind::Face);
    let faces_2 = kernel.subshapes(merged.solid(2), ShapeKind::Face);
    assert!(faces_1.iter().any(|f| faces_2.contains(f)));
}

#[test]
fn stages_survive_a_file_round_trip() {
    let kernel = RectKernel::new();
    let doc = Document::from_solids(vec![
        cube_at(&kernel, 0.0, 0.0, 0.0, 2.0),
        cube_at(&kernel, 2.0, 0.0, 0.0, 2.0),
    ]);

    let dir = std::env::temp_dir().join("brepmend-pipeline");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("assembly.brep");
    doc.write(&kernel, &path).unwrap();

    let loaded = Document::load(&kernel, &path).unwrap();
    assert_eq!(loaded.len(), 2);

    let merged = merge_document(&kernel, &loaded, 0.001).unwrap();
    assert_eq!(
        kernel
            .subshapes(&kernel.make_compound(merged.solids()), ShapeKind::Face)
            .len(),
        11
    );
}
