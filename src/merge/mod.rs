//! Merging (gluing): collapse geometrically coincident sub-shapes across
//! an assembly into shared topology
//!
//! Runs in four stages on a single thread: vertex clustering, edge/face
//! group detection, topology rebuild, and a final same-parameter fix.
//! Detection finding nothing is not an error; the input comes back
//! unchanged. A structurally invalid rebuild is surfaced as a warning (a
//! caller that demands validity re-checks afterwards); a same-parameter
//! failure is fatal.
use log::{info, warn};

use crate::document::Document;
use crate::geom::vals_close;
use crate::kernel::{volume_of, Kernel, Shape};
use crate::Error;

mod detect;
mod origin;
mod rebuild;

pub use origin::Origin;

/// Fraction of a solid's volume that may drift through a merge before the
/// result is rejected
const VOLUME_DRIFT_LIMIT: f64 = 0.001;

/// Glues one assembly shape: coincident vertices, edges, and faces become
/// a single shared entity
pub fn glue_assembly<K: Kernel>(
    kernel: &K,
    shape: &K::Shape,
    tolerance: f64,
) -> Result<K::Shape, Error> {
    if tolerance < 0.0 {
        return Err(Error::NegativeTolerance(tolerance));
    }

    let origin = detect::detect(kernel, shape, tolerance)?;
    if origin.is_empty() {
        warn!("no shapes to glue detected");
        return Ok(shape.clone());
    }
    info!("detected {} coincidence clusters", origin.len());

    let rebuilt = rebuild::Rebuilder::new(kernel, &origin).perform(shape)?;
    info!("topology rebuild done");

    let fixed = kernel.fix_same_parameter(&rebuilt, tolerance)?;
    info!("same-parameter fix done");
    Ok(fixed)
}

/// Glues a whole document, preserving slot count and per-solid volume
///
/// Every document slot maps to the corresponding child of the glued
/// compound. Solids whose volume drifts by more than 0.1 % fail the merge
/// before any output is written.
pub fn merge_document<K: Kernel>(
    kernel: &K,
    doc: &Document<K>,
    tolerance: f64,
) -> Result<Document<K>, Error> {
    let merged = kernel.make_compound(doc.solids());
    let glued = glue_assembly(kernel, &merged, tolerance)?;
    let solids = glued.children();

    if solids.len() != doc.len() {
        return Err(Error::MergeCountChanged {
            before: doc.len(),
            after: solids.len(),
        });
    }

    let mut num_drifted = 0;
    for (i, (before, after)) in doc.solids().iter().zip(&solids).enumerate() {
        let v1 = volume_of(kernel, before)?;
        let v2 = volume_of(kernel, after)?;
        if !vals_close(v1, v2, VOLUME_DRIFT_LIMIT, f64::MIN_POSITIVE) {
            warn!("non-trivial change in volume of solid {i} during merge, {v1} => {v2}");
            num_drifted += 1;
        }
    }
    if num_drifted > 0 {
        return Err(Error::MergeVolumeDrift(num_drifted));
    }

    let out = Document::from_solids(solids);
    let invalid = out.count_invalid(kernel);
    if invalid > 0 {
        warn!("merge left {invalid} structurally invalid shapes");
    }
    Ok(out)
}
