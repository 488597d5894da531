//! Imprinting of overlapping solid pairs
//!
//! Rewrites a pair of overlapping solids so that their common region
//! becomes part of the *larger* solid: the pair is paved once, the common
//! and both cut shapes are extracted, and the common shape is fused back
//! into whichever side kept more volume. Inputs are never mutated; the
//! rewritten pair is returned by value and applied to the document by
//! [`imprint_document`].
use log::{debug, error, info};

use crate::boolean::Paving;
use crate::document::Document;
use crate::kernel::{volume_of, BoolOp, Kernel, ShapeKind};
use crate::Error;

/// How one pair was imprinted
#[derive(Clone, Debug)]
pub enum ImprintOutcome<S> {
    /// Something failed inside the kernel; the document must not be
    /// updated from this result
    Failed,

    /// No volume in common; nothing changes
    Distinct,

    /// The common volume was merged into the first solid; the payload is
    /// the replacement pair `(shape, tool)`
    MergeIntoShape(S, S),

    /// The common volume was merged into the second solid
    MergeIntoTool(S, S),
}

/// Warning counts per imprinting phase
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ImprintWarnings {
    pub filler: u32,
    pub common: u32,
    pub fuse: u32,
}

/// Full record of one imprint
///
/// The volumes are intermediate results (`-1` until computed) and are only
/// meaningful when the outcome is not [`ImprintOutcome::Failed`].
#[derive(Clone, Debug)]
pub struct Imprint<S> {
    pub outcome: ImprintOutcome<S>,
    pub fuzzy_value: f64,
    pub warnings: ImprintWarnings,
    pub vol_common: f64,
    pub vol_cut: f64,
    pub vol_cut21: f64,
}

impl<S> Imprint<S> {
    fn failed(fuzzy_value: f64, warnings: ImprintWarnings) -> Self {
        Self {
            outcome: ImprintOutcome::Failed,
            fuzzy_value,
            warnings,
            vol_common: -1.0,
            vol_cut: -1.0,
            vol_cut21: -1.0,
        }
    }
}

/// Imprints one pair of solids at the given fuzzy value
pub fn imprint_pair<K: Kernel>(
    kernel: &K,
    shape: &K::Shape,
    tool: &K::Shape,
    fuzzy: f64,
) -> Result<Imprint<K::Shape>, Error> {
    let mut warnings = ImprintWarnings::default();

    // imprinting has no deadline: by the time pairs reach this stage they
    // have already paved once inside the overlap check
    let paving = match Paving::new(kernel, shape, tool, fuzzy, None) {
        Ok(paving) => paving,
        Err(e) => {
            warnings.filler = match e {
                crate::kernel::PaveError::Timeout { warnings, .. } => warnings,
                crate::kernel::PaveError::Failed { warnings } => warnings,
            };
            return Ok(Imprint::failed(fuzzy, warnings));
        }
    };
    warnings.filler = paving.filler_warnings;

    let common = match paving.run(BoolOp::Common) {
        Ok(ok) => {
            warnings.common = ok.warnings;
            ok.shape
        }
        Err(e) => {
            warnings.common = e.warnings;
            return Ok(Imprint::failed(paving.fuzzy_value, warnings));
        }
    };
    let vol_common = volume_of(kernel, &common)?;

    let cut = match paving.run(BoolOp::Cut) {
        Ok(ok) => ok.shape,
        Err(_) => return Ok(Imprint::failed(paving.fuzzy_value, warnings)),
    };
    let vol_cut = volume_of(kernel, &cut)?;

    let cut21 = match paving.run(BoolOp::Cut21) {
        Ok(ok) => ok.shape,
        Err(_) => return Ok(Imprint::failed(paving.fuzzy_value, warnings)),
    };
    let vol_cut21 = volume_of(kernel, &cut21)?;

    let outcome = if kernel.subshapes(&common, ShapeKind::Vertex).is_empty() {
        ImprintOutcome::Distinct
    } else {
        // merge the common volume into the larger side; the cut shapes are
        // freshly built, so fusing needs no further fuzz
        let merge_into_shape = vol_cut >= vol_cut21;
        let base = if merge_into_shape { &cut } else { &cut21 };
        match kernel.fuse(base, &common) {
            Ok(ok) => {
                warnings.fuse = ok.warnings;
                if merge_into_shape {
                    ImprintOutcome::MergeIntoShape(ok.shape, cut21)
                } else {
                    ImprintOutcome::MergeIntoTool(cut, ok.shape)
                }
            }
            Err(e) => {
                warnings.fuse = e.warnings;
                return Ok(Imprint::failed(paving.fuzzy_value, warnings));
            }
        }
    };

    Ok(Imprint {
        outcome,
        fuzzy_value: paving.fuzzy_value,
        warnings,
        vol_common,
        vol_cut,
        vol_cut21,
    })
}

/// End-of-stage totals for an imprinting run
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ImprintSummary {
    pub modified: usize,
    pub distinct: usize,
    pub failed: usize,
}

/// Imprints a list of pairs into the document, in the order supplied
///
/// Processing order determines the final shape when three or more solids
/// overlap, so callers wanting reproducible output should sort the pair
/// list lexicographically. A pair that fails leaves both of its slots
/// untouched and is counted in the summary; callers must refuse to write
/// output when `failed` is non-zero.
pub fn imprint_document<K: Kernel>(
    kernel: &K,
    doc: &mut Document<K>,
    pairs: &[(usize, usize)],
    fuzzy: f64,
) -> Result<ImprintSummary, Error> {
    let mut summary = ImprintSummary::default();

    for &(first, second) in pairs {
        let res = imprint_pair(kernel, doc.solid(first), doc.solid(second), fuzzy)?;
        match res.outcome {
            ImprintOutcome::Failed => {
                error!("{first:5}-{second} failed to imprint");
                summary.failed += 1;
            }
            ImprintOutcome::Distinct => {
                debug!("{first:5}-{second} were mostly distinct");
                summary.distinct += 1;
            }
            ImprintOutcome::MergeIntoShape(shape, tool) => {
                info!(
                    "{first:5}-{second} were imprinted, a volume of {:.2} was merged into {first}",
                    res.vol_common,
                );
                doc.replace(first, shape);
                doc.replace(second, tool);
                summary.modified += 1;
            }
            ImprintOutcome::MergeIntoTool(shape, tool) => {
                info!(
                    "{first:5}-{second} were imprinted, a volume of {:.2} was merged into {second}",
                    res.vol_common,
                );
                doc.replace(first, shape);
                doc.replace(second, tool);
                summary.modified += 1;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernel::rect::RectKernel;
    use crate::testkit::{cube_at, FlakyKernel};

    fn approx(a: f64, b: f64) -> bool {
        crate::geom::vals_close(a, b, 1e-9, 1e-9)
    }

    #[test]
    fn identical_objects() {
        let k = RectKernel::new();
        let s1 = cube_at(0.0, 0.0, 0.0, 10.0);
        let s2 = cube_at(0.0, 0.0, 0.0, 10.0);
        let res = imprint_pair(&k, &s1, &s2, 0.5).unwrap();

        assert!(approx(res.vol_common, 1000.0));
        assert!(approx(res.vol_cut, 0.0));
        assert!(approx(res.vol_cut21, 0.0));
        match res.outcome {
            ImprintOutcome::MergeIntoShape(shape, tool) => {
                assert!(approx(k.volume_raw(&shape), 1000.0));
                assert!(approx(k.volume_raw(&tool), 0.0));
            }
            ImprintOutcome::MergeIntoTool(shape, tool) => {
                assert!(approx(k.volume_raw(&shape), 0.0));
                assert!(approx(k.volume_raw(&tool), 1000.0));
            }
            other => panic!("expected a merge, got {other:?}"),
        }
    }

    #[test]
    fn independent_objects() {
        let k = RectKernel::new();
        let s1 = cube_at(0.0, 0.0, 0.0, 4.0);
        let s2 = cube_at(5.0, 0.0, 0.0, 4.0);
        let res = imprint_pair(&k, &s1, &s2, 0.5).unwrap();

        assert!(matches!(res.outcome, ImprintOutcome::Distinct));
        assert!(approx(res.vol_common, 0.0));
        assert!(approx(res.vol_cut, 64.0));
        assert!(approx(res.vol_cut21, 64.0));
    }

    #[test]
    fn touching_objects() {
        let k = RectKernel::new();
        let s1 = cube_at(0.0, 0.0, 0.0, 5.0);
        let s2 = cube_at(5.0, 0.0, 0.0, 5.0);
        let res = imprint_pair(&k, &s1, &s2, 0.5).unwrap();

        assert!(matches!(res.outcome, ImprintOutcome::Distinct));
        assert!(approx(res.vol_common, 0.0));
        assert!(approx(res.vol_cut, 125.0));
        assert!(approx(res.vol_cut21, 125.0));
    }

    #[test]
    fn objects_overlapping_at_corner() {
        let k = RectKernel::new();
        let s1 = cube_at(0.0, 0.0, 0.0, 5.0);
        let s2 = cube_at(4.0, 4.0, 4.0, 2.0);
        let res = imprint_pair(&k, &s1, &s2, 0.1).unwrap();

        assert!(approx(res.vol_common, 1.0));
        assert!(approx(res.vol_cut, 124.0));
        assert!(approx(res.vol_cut21, 7.0));
        match res.outcome {
            ImprintOutcome::MergeIntoShape(shape, tool) => {
                assert!(approx(k.volume_raw(&shape), 125.0));
                assert!(approx(k.volume_raw(&tool), 7.0));
            }
            other => panic!("expected merge into shape, got {other:?}"),
        }
    }

    #[test]
    fn objects_overlapping_in_middle() {
        // s1 divides s2's edge region in half; the common half merges into
        // the larger tool
        let k = RectKernel::new();
        let s1 = cube_at(3.0, 1.0, 1.0, 2.0);
        let s2 = cube_at(0.0, 0.0, 0.0, 4.0);
        let res = imprint_pair(&k, &s1, &s2, 0.1).unwrap();

        let half_s1 = 4.0;
        assert!(approx(res.vol_common, half_s1));
        assert!(approx(res.vol_cut, half_s1));
        assert!(approx(res.vol_cut21, 64.0 - half_s1));
        match res.outcome {
            ImprintOutcome::MergeIntoTool(shape, tool) => {
                assert!(approx(k.volume_raw(&shape), half_s1));
                assert!(approx(k.volume_raw(&tool), 64.0));
            }
            other => panic!("expected merge into tool, got {other:?}"),
        }
    }

    #[test]
    fn pair_volume_is_conserved() {
        let k = RectKernel::new();
        let s1 = cube_at(0.0, 0.0, 0.0, 5.0);
        let s2 = cube_at(4.0, 0.0, 0.0, 5.0);
        let before = k.volume_raw(&s1) + k.volume_raw(&s2);
        let res = imprint_pair(&k, &s1, &s2, 0.01).unwrap();
        let (a, b) = match res.outcome {
            ImprintOutcome::MergeIntoShape(a, b) | ImprintOutcome::MergeIntoTool(a, b) => (a, b),
            other => panic!("expected a merge, got {other:?}"),
        };
        // the common volume is no longer double-counted
        let after = k.volume_raw(&a) + k.volume_raw(&b);
        assert!(approx(after, before - res.vol_common));
    }

    #[test]
    fn document_slots_are_rewritten_in_place() {
        let k = RectKernel::new();
        let mut doc = Document::from_solids(vec![
            cube_at(0.0, 0.0, 0.0, 5.0),
            cube_at(20.0, 0.0, 0.0, 5.0),
            cube_at(4.0, 4.0, 4.0, 2.0),
        ]);
        let summary = imprint_document(&k, &mut doc, &[(0, 2)], 0.1).unwrap();

        assert_eq!(
            summary,
            ImprintSummary {
                modified: 1,
                distinct: 0,
                failed: 0
            }
        );
        assert_eq!(doc.len(), 3);
        assert!(approx(k.volume_raw(doc.solid(0)), 125.0));
        assert!(approx(k.volume_raw(doc.solid(1)), 125.0));
        assert!(approx(k.volume_raw(doc.solid(2)), 7.0));
    }

    #[test]
    fn failed_pairs_leave_slots_untouched() {
        let k = FlakyKernel::failing_fuse();
        let s1 = cube_at(0.0, 0.0, 0.0, 5.0);
        let s2 = cube_at(4.0, 4.0, 4.0, 2.0);
        let mut doc = Document::from_solids(vec![s1.clone(), s2.clone()]);

        let summary = imprint_document(&k, &mut doc, &[(0, 1)], 0.1).unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.modified, 0);
        assert_eq!(doc.solid(0), &s1);
        assert_eq!(doc.solid(1), &s2);
    }
}
