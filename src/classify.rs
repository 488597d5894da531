//! Pairwise intersection classification
//!
//! Decides, for two solids, whether they are distinct, touching, or
//! overlapping (and by how much), on top of one shared pave step. Kernel
//! failures surface as data ([`IntersectStatus::Failed`] /
//! [`IntersectStatus::Timeout`]) so a caller can retry with a different
//! fuzzy value or aggregate the failure into its stage summary.
use std::time::Duration;

use log::info;

use crate::boolean::{Deadline, Paving};
use crate::kernel::{BoolOp, Kernel, PaveError, ShapeKind};
use crate::Error;

/// Negative common volumes up to this fraction of the smaller cut volume
/// are reclassified as touching; anything larger fails the pair.
///
/// Kernels occasionally report a small negative COMMON volume when two
/// solids have non-trivial faces inside the fuzzy band. The value is
/// empirical; the `negative_common_*` tests pin it so a change here is a
/// deliberate one.
pub const NEGATIVE_COMMON_LIMIT: f64 = 0.1;

/// Outcome of classifying one pair (all subject to the fuzzy value)
#[derive(Clone, Debug, PartialEq)]
pub enum IntersectStatus {
    /// Something failed inside the kernel; a different fuzzy value might
    /// help
    Failed,

    /// The pave step overran its deadline; retrying is pointless
    Timeout,

    /// Null intersection
    Distinct,

    /// At least one vertex, edge, or face touches
    Touching,

    /// Some volume overlaps; all three volumes are non-negative
    Overlap {
        vol_common: f64,
        vol_cut: f64,
        vol_cut21: f64,
    },
}

/// Warning counts per boolean phase
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct OpWarnings {
    pub filler: u32,
    pub common: u32,
    pub section: u32,
}

/// Full classification record for one pair
#[derive(Clone, Debug)]
pub struct Intersection {
    pub status: IntersectStatus,

    /// Fuzzy value the kernel actually used
    pub fuzzy_value: f64,

    pub warnings: OpWarnings,

    /// How long the pave step took
    pub pave_seconds: f64,
}

/// Classifies the intersection of two solids at one fuzzy value
///
/// A deadline, when given, bounds the pave step only. Returns `Err` solely
/// for fatal anomalies (a negative CUT volume means the kernel is being
/// misused); everything recoverable lands in the status.
pub fn classify_intersection<K: Kernel>(
    kernel: &K,
    shape: &K::Shape,
    tool: &K::Shape,
    fuzzy: f64,
    deadline: Option<&Deadline>,
) -> Result<Intersection, Error> {
    let mut warnings = OpWarnings::default();

    let paving = match Paving::new(kernel, shape, tool, fuzzy, deadline) {
        Ok(paving) => paving,
        Err(PaveError::Timeout { elapsed, warnings: w }) => {
            return Ok(Intersection {
                status: IntersectStatus::Timeout,
                fuzzy_value: fuzzy,
                warnings: OpWarnings {
                    filler: w,
                    ..warnings
                },
                pave_seconds: elapsed.as_secs_f64(),
            })
        }
        Err(PaveError::Failed { warnings: w }) => {
            return Ok(Intersection {
                status: IntersectStatus::Failed,
                fuzzy_value: fuzzy,
                warnings: OpWarnings {
                    filler: w,
                    ..warnings
                },
                pave_seconds: 0.0,
            })
        }
    };
    warnings.filler = paving.filler_warnings;

    let failed = |warnings: OpWarnings| Intersection {
        status: IntersectStatus::Failed,
        fuzzy_value: paving.fuzzy_value,
        warnings,
        pave_seconds: paving.pave_seconds,
    };

    let common = match paving.run(BoolOp::Common) {
        Ok(ok) => {
            warnings.common = ok.warnings;
            ok.shape
        }
        Err(e) => {
            warnings.common = e.warnings;
            return Ok(failed(warnings));
        }
    };

    let status = if !kernel.subshapes(&common, ShapeKind::Solid).is_empty() {
        // kernels can come back with a slightly negative volume here when
        // the two solids have near-coincident faces inside the fuzzy band
        let vol_common = kernel.volume_raw(&common);

        let vol_cut = match paving.run(BoolOp::Cut) {
            Ok(ok) => crate::kernel::volume_of(kernel, &ok.shape)?,
            Err(_) => return Ok(failed(warnings)),
        };
        let vol_cut21 = match paving.run(BoolOp::Cut21) {
            Ok(ok) => crate::kernel::volume_of(kernel, &ok.shape)?,
            Err(_) => return Ok(failed(warnings)),
        };

        if vol_common < 0.0 {
            // only acceptable along the boundary of the shapes; recording
            // the pair as touching keeps it visible to the merge step
            let limit = vol_cut.min(vol_cut21) * NEGATIVE_COMMON_LIMIT;
            if -vol_common > limit {
                return Ok(failed(warnings));
            }
            IntersectStatus::Touching
        } else {
            IntersectStatus::Overlap {
                vol_common,
                vol_cut,
                vol_cut21,
            }
        }
    } else {
        match paving.run(BoolOp::Section) {
            Ok(ok) => {
                warnings.section = ok.warnings;
                if kernel.subshapes(&ok.shape, ShapeKind::Vertex).is_empty() {
                    IntersectStatus::Distinct
                } else {
                    IntersectStatus::Touching
                }
            }
            Err(e) => {
                warnings.section = e.warnings;
                return Ok(failed(warnings));
            }
        }
    };

    Ok(Intersection {
        status,
        fuzzy_value: paving.fuzzy_value,
        warnings,
        pave_seconds: paving.pave_seconds,
    })
}

/// Classifies a pair through a ladder of fuzzy values
///
/// The values are tried in order; the first attempt that does not fail
/// determines the outcome. Every retry re-paves from scratch. A timeout is
/// terminal; paving will not get faster at a different tolerance.
pub fn classify_with_ladder<K: Kernel>(
    kernel: &K,
    shape: &K::Shape,
    tool: &K::Shape,
    ladder: &[f64],
    pair_timeout: Option<Duration>,
) -> Result<Intersection, Error> {
    let ladder = if ladder.is_empty() { &[0.0] } else { ladder };

    let mut result: Option<Intersection> = None;
    for (attempt, &fuzzy) in ladder.iter().enumerate() {
        if let Some(prev) = &result {
            info!(
                "classification failed with ({} filler and {} common) warnings, \
                 retrying with tolerance={fuzzy} (attempt {})",
                prev.warnings.filler,
                prev.warnings.common,
                attempt + 1,
            );
        }

        let deadline = pair_timeout.map(Deadline::new);
        let r = classify_intersection(kernel, shape, tool, fuzzy, deadline.as_ref())?;

        let retry = matches!(r.status, IntersectStatus::Failed);
        let timed_out = matches!(r.status, IntersectStatus::Timeout);
        result = Some(r);
        if timed_out || !retry {
            break;
        }
    }
    // the ladder has at least one rung, so a result always exists
    Ok(result.expect("empty tolerance ladder"))
}
