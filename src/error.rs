//! Module containing the universal error type for the crate
use crate::kernel::ShapeKind;
use thiserror::Error;

/// Universal error type
///
/// Configuration, I/O, and structural errors abort a stage; kernel
/// operation failures and timeouts are *data* (see
/// [`IntersectStatus`](crate::classify::IntersectStatus)) and never appear
/// here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("fuzzy tolerance must not be negative, got {0}")]
    NegativeTolerance(f64),

    #[error("max common volume ratio must be within (0, 1], got {0}")]
    BadVolumeRatio(f64),

    #[error("worker count must be between 1 and {max}, got {count}")]
    BadWorkerCount { count: usize, max: usize },

    #[error("expected a COMPOUND or COMPSOLID at the top level, not {0}")]
    BadTopLevelShape(ShapeKind),

    #[error("expected document children to be SOLID or COMPSOLID, not {0}")]
    BadChildShape(ShapeKind),

    #[error("'{0}' is not a valid shape index for this document")]
    BadShapeIndex(String),

    #[error("row {0} of the pair list has fewer than three fields")]
    ShortPairRow(usize),

    #[error("row {row} of the pair list has unknown status '{status}'")]
    BadPairStatus { row: usize, status: String },

    #[error("volume of shape is negative ({0})")]
    NegativeVolume(f64),

    #[error("minimum-distance query failed")]
    DistanceFailed,

    #[error("failed to imprint {0} pairs")]
    ImprintFailed(usize),

    #[error("{0} is not a container shape that can be rebuilt")]
    BadContainer(ShapeKind),

    #[error("unable to fit a parameter curve while rebuilding a face")]
    PcurveFailed,

    #[error("same-parameter fix failed: {0}")]
    SameParameter(String),

    #[error("no representative point for a {0}")]
    NoPointOnShape(ShapeKind),

    #[error("solid volumes changed during merge ({0} solids drifted)")]
    MergeVolumeDrift(usize),

    #[error("number of shapes changed during merge, {before} => {after}")]
    MergeCountChanged { before: usize, after: usize },

    #[error("malformed assembly file: {0}")]
    MalformedAssembly(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
