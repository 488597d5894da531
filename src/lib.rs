//! Preprocessing for BREP assemblies headed into physics simulators
//!
//! Converted CAD geometry is rarely watertight: neighbouring solids
//! overlap slightly, and coincident faces are duplicated rather than
//! shared. This crate cleans an assembly in three stages, each of which is
//! also available as a standalone binary:
//!
//! 1. **Overlap checking** ([`overlap`]): find all solid pairs whose
//!    bounding volumes come within a clearance, classify each pair as
//!    distinct / touching / overlapping in parallel, and emit a CSV pair
//!    list.
//! 2. **Imprinting** ([`imprint`]): rewrite each overlapping pair so the
//!    shared region belongs to exactly one of the two solids.
//! 3. **Merging** ([`merge`]): detect geometrically coincident vertices,
//!    edges, and faces across the whole assembly and rebuild the topology
//!    so they are shared.
//!
//! The pipeline is generic over a CAD kernel via the traits in
//! [`kernel`]; the [`kernel::rect`] backend covers axis-aligned geometry
//! and keeps everything runnable without a native kernel.
//!
//! ```
//! use brepmend::classify::{classify_with_ladder, IntersectStatus};
//! use brepmend::kernel::rect::RectKernel;
//! use nalgebra::{Point3, Vector3};
//!
//! let kernel = RectKernel::new();
//! let a = kernel.make_box(Point3::origin(), Vector3::new(5.0, 5.0, 5.0));
//! let b = kernel.make_box(Point3::new(4.0, 0.0, 0.0), Vector3::new(5.0, 5.0, 5.0));
//!
//! let r = classify_with_ladder(&kernel, &a, &b, &[0.001, 0.0], None)?;
//! assert!(matches!(r.status, IntersectStatus::Overlap { .. }));
//! # Ok::<(), brepmend::Error>(())
//! ```
pub mod boolean;
pub mod classify;
pub mod document;
pub mod geom;
pub mod imprint;
pub mod kernel;
pub mod merge;
pub mod overlap;
pub mod pairs;
pub mod pool;

mod error;
pub use error::Error;

#[cfg(test)]
pub(crate) mod testkit;
