//! Pair discovery and overlap checking across a whole document
//!
//! A cheap oriented-bounding-box pre-filter rejects the vast majority of
//! pairs; the survivors are classified on the worker pool and drained in
//! completion order by a single reporting loop that writes one CSV row per
//! non-distinct pair.
//!
//! The document is immutable for the duration of the check: workers read
//! shapes and write only into per-result values, so any completion order
//! yields the same multiset of results.
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use nalgebra::Point3;

use crate::classify::{classify_with_ladder, Intersection, IntersectStatus};
use crate::document::Document;
use crate::kernel::Kernel;
use crate::pairs::{PairRow, PairStatus};
use crate::pool::{default_workers, AsyncMap, Batch, ThreadPool};
use crate::{geom::Obb, Error};

/// How often the reporting loop logs progress
const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for one overlap-checking run
#[derive(Clone, Debug)]
pub struct OverlapConfig {
    /// Worker thread count (1 to [`ThreadPool::MAX_WORKERS`])
    pub workers: usize,

    /// Bounding boxes closer than this are checked for overlaps
    pub bbox_clearance: f64,

    /// Fuzzy-tolerance ladder for the classifier
    pub tolerances: Vec<f64>,

    /// Overlaps above this fraction of the smaller solid are reported as
    /// `bad_overlap`
    pub max_common_ratio: f64,

    /// Wall-clock budget for one pave step; `None` disables the timeout
    pub pair_timeout: Option<Duration>,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            bbox_clearance: 0.5,
            tolerances: vec![0.001, 0.0],
            max_common_ratio: 0.01,
            pair_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl OverlapConfig {
    /// Rejects impossible configurations before any work starts
    pub fn validate(&self) -> Result<(), Error> {
        if self.workers == 0 || self.workers > ThreadPool::MAX_WORKERS {
            return Err(Error::BadWorkerCount {
                count: self.workers,
                max: ThreadPool::MAX_WORKERS,
            });
        }
        for &tolerance in &self.tolerances {
            if tolerance < 0.0 {
                return Err(Error::NegativeTolerance(tolerance));
            }
            if self.bbox_clearance < tolerance {
                warn!(
                    "bounding-box clearance smaller than imprinting tolerance, \
                     {} < {tolerance}",
                    self.bbox_clearance
                );
            }
        }
        if !(self.max_common_ratio > 0.0 && self.max_common_ratio <= 1.0) {
            return Err(Error::BadVolumeRatio(self.max_common_ratio));
        }
        Ok(())
    }
}

/// End-of-stage totals for an overlap-checking run
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct OverlapSummary {
    pub bbox_tests: usize,
    pub checked: usize,
    pub touching: usize,
    pub overlaps: usize,
    pub bad_overlaps: usize,
    pub failed: usize,
}

impl OverlapSummary {
    /// Failed pairs and excessive overlaps both signal unfit geometry
    pub fn has_errors(&self) -> bool {
        self.failed > 0 || self.bad_overlaps > 0
    }
}

struct PairOutcome {
    hi: usize,
    lo: usize,
    result: Result<Intersection, Error>,
}

fn bboxes_disjoint(a: &Obb, b: &Obb, clearance: f64) -> bool {
    if clearance > 0.0 {
        a.enlarged(clearance).is_out(&b.enlarged(clearance))
    } else {
        a.is_out(b)
    }
}

/// Checks every nearby pair of document solids, writing CSV rows for the
/// non-distinct ones to `out`
pub fn check_overlaps<K: Kernel>(
    kernel: &K,
    doc: &Document<K>,
    config: &OverlapConfig,
    out: &mut impl Write,
) -> Result<OverlapSummary, Error> {
    config.validate()?;

    debug!("launching {} worker threads", config.workers);
    let pool = ThreadPool::new(config.workers)?;

    info!("calculating {} bounding boxes", doc.len());
    let (bounding_boxes, volumes) = precompute(kernel, doc, &pool)?;

    let mut summary = OverlapSummary::default();

    let state = Arc::new(WorkerState {
        kernel: kernel.clone(),
        shapes: doc.solids().to_vec(),
        tolerances: config.tolerances.clone(),
        pair_timeout: config.pair_timeout,
    });

    let map = AsyncMap::new();
    let mut num_to_process = 0usize;
    for hi in 1..doc.len() {
        for lo in 0..hi {
            summary.bbox_tests += 1;

            // most shapes are nowhere near each other, so check with the
            // coarse limit first
            if bboxes_disjoint(
                &bounding_boxes[hi],
                &bounding_boxes[lo],
                config.bbox_clearance,
            ) {
                continue;
            }

            let state = Arc::clone(&state);
            map.submit(&pool, move || state.classify(hi, lo));
            num_to_process += 1;
        }
    }

    info!("checking for overlaps between {num_to_process} pairs");
    let mut report_when = Instant::now() + REPORT_INTERVAL;

    while !map.empty() {
        let outcome = map.get();
        summary.checked += 1;

        if report_when < Instant::now() {
            info!(
                "processed {}% of pairs, {} remain",
                (summary.checked * 100) / num_to_process,
                num_to_process - summary.checked
            );
            report_when += REPORT_INTERVAL;
        }

        let (hi, lo) = (outcome.hi, outcome.lo);
        let result = outcome.result?;

        if result.pave_seconds > 1.0 {
            debug!("{hi:5}-{lo} took {:.1} seconds to pave", result.pave_seconds);
        }

        match result.status {
            IntersectStatus::Failed => {
                error!("{hi:5}-{lo} failed to classify overlap");
                summary.failed += 1;
            }
            IntersectStatus::Timeout => {
                error!(
                    "{hi:5}-{lo} failed to classify overlap, due to timeout after {:.0} seconds",
                    result.pave_seconds
                );
                summary.failed += 1;
            }
            IntersectStatus::Distinct => {
                debug!("{hi:5}-{lo} are distinct");
            }
            IntersectStatus::Touching => {
                writeln!(
                    out,
                    "{}",
                    PairRow {
                        hi,
                        lo,
                        status: PairStatus::Touch,
                        volumes: None,
                    }
                )?;
                summary.touching += 1;
            }
            IntersectStatus::Overlap { vol_common, .. } => {
                let min_vol = volumes[hi].min(volumes[lo]);
                let max_overlap = min_vol * config.max_common_ratio;

                let status = if vol_common > max_overlap {
                    error!(
                        "{hi:5}-{lo} overlap by more than {}%, {:.2}% of smaller shape. \
                         vol_{hi}={:.1}, vol_{lo}={:.1}, common={:.1}",
                        config.max_common_ratio * 100.0,
                        vol_common / min_vol * 100.0,
                        volumes[hi],
                        volumes[lo],
                        vol_common
                    );
                    summary.bad_overlaps += 1;
                    PairStatus::BadOverlap
                } else {
                    info!(
                        "{hi:5}-{lo} overlap by less than {}%, {:.2}% of smaller shape",
                        config.max_common_ratio * 100.0,
                        vol_common / min_vol * 100.0,
                    );
                    summary.overlaps += 1;
                    PairStatus::Overlap
                };
                writeln!(
                    out,
                    "{}",
                    PairRow {
                        hi,
                        lo,
                        status,
                        volumes: Some([vol_common, volumes[hi], volumes[lo]]),
                    }
                )?;
            }
        }
        out.flush()?;
    }

    info!(
        "processing summary: bbox tests={}, intersection tests={}, touching={}, \
         overlapping={}, bad overlaps={}, tests failed={}",
        summary.bbox_tests,
        summary.checked,
        summary.touching,
        summary.overlaps,
        summary.bad_overlaps,
        summary.failed
    );
    Ok(summary)
}

struct WorkerState<K: Kernel> {
    kernel: K,
    shapes: Vec<K::Shape>,
    tolerances: Vec<f64>,
    pair_timeout: Option<Duration>,
}

impl<K: Kernel> WorkerState<K> {
    fn classify(&self, hi: usize, lo: usize) -> PairOutcome {
        let result = classify_with_ladder(
            &self.kernel,
            &self.shapes[hi],
            &self.shapes[lo],
            &self.tolerances,
            self.pair_timeout,
        );
        if let Ok(r) = &result {
            if matches!(r.status, IntersectStatus::Failed) {
                warn!(
                    "{hi:5}-{lo} classification failed with ({} filler and {} common) warnings",
                    r.warnings.filler, r.warnings.common
                );
            }
        }
        PairOutcome { hi, lo, result }
    }
}

/// Computes every solid's bounding box and volume on the pool
fn precompute<K: Kernel>(
    kernel: &K,
    doc: &Document<K>,
    pool: &ThreadPool,
) -> Result<(Vec<Obb>, Vec<f64>), Error> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let batch = Batch::new();
    for (i, shape) in doc.solids().iter().enumerate() {
        let kernel = kernel.clone();
        let shape = shape.clone();
        let tx = tx.clone();
        batch.submit(pool, move || {
            let obb = kernel.oriented_bbox(&shape);
            let volume = crate::kernel::volume_of(&kernel, &shape);
            let _ = tx.send((i, obb, volume));
        });
    }
    batch.wait();
    drop(tx);

    let mut boxes = vec![Obb::axis_aligned(Point3::origin(), Point3::origin()); doc.len()];
    let mut volumes = vec![0.0; doc.len()];
    for (i, obb, volume) in rx {
        boxes[i] = obb;
        volumes[i] = volume?;
    }
    Ok((boxes, volumes))
}
