//! The binding surface between the pipeline and a CAD kernel
//!
//! Everything the engine needs from a kernel is expressed by the [`Kernel`]
//! and [`Shape`] traits: boolean operations over a shared pave step,
//! volume / distance / bounding-box queries, sub-shape exploration, and the
//! low-level topology helpers used while regluing an assembly.
//!
//! The engine itself never names a concrete kernel. One backend ships in
//! this crate ([`rect`], covering axis-aligned rectilinear geometry); a
//! production binding to a full B-rep kernel implements the same traits out
//! of tree.
use std::fmt;
use std::hash::Hash;
use std::path::Path;
use std::time::Duration;

use nalgebra::Point3;

use crate::{boolean::Deadline, geom::Obb, Error};

pub mod rect;

/// The standard B-rep hierarchy, plus the two aggregate containers
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ShapeKind {
    Vertex,
    Edge,
    Wire,
    Face,
    Shell,
    Solid,
    CompSolid,
    Compound,
}

/// Uppercase kernel-style name for a shape kind
pub fn shape_kind_name(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Vertex => "VERTEX",
        ShapeKind::Edge => "EDGE",
        ShapeKind::Wire => "WIRE",
        ShapeKind::Face => "FACE",
        ShapeKind::Shell => "SHELL",
        ShapeKind::Solid => "SOLID",
        ShapeKind::CompSolid => "COMPSOLID",
        ShapeKind::Compound => "COMPOUND",
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(shape_kind_name(*self))
    }
}

/// Orientation of a shape handle within its parent
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Orientation {
    Forward,
    Reversed,
}

impl Orientation {
    pub fn reversed(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reversed,
            Orientation::Reversed => Orientation::Forward,
        }
    }
}

/// Boolean operations that run on top of a shared pave step
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BoolOp {
    /// Material present in both inputs
    Common,
    /// First input minus second
    Cut,
    /// Second input minus first
    Cut21,
    /// Boundary intersection (vertices / edges only)
    Section,
}

/// A pave handle plus the bookkeeping the driver reports upward
pub struct Paved<P> {
    pub filler: P,
    /// Fuzzy value actually applied (kernels clamp very small requests)
    pub fuzzy_value: f64,
    pub warnings: u32,
    pub elapsed: Duration,
}

/// Why a pave step did not produce a usable filler
#[derive(Debug)]
pub enum PaveError {
    /// The deadline passed while paving; no retry is useful
    Timeout { elapsed: Duration, warnings: u32 },
    /// The kernel reported errors; a different fuzzy value may help
    Failed { warnings: u32 },
}

/// Successful boolean operation: result shape plus warning count
pub struct BoolOk<S> {
    pub shape: S,
    pub warnings: u32,
}

/// Failed boolean operation
#[derive(Debug)]
pub struct OpFailed {
    pub warnings: u32,
}

/// Opaque handle to a kernel shape
///
/// Handles are cheap to clone (reference counted by the kernel) and carry
/// an [`Orientation`]. Equality and hashing use *identity* semantics and
/// ignore orientation: two handles compare equal exactly when they refer to
/// the same underlying topological entity.
pub trait Shape:
    Clone + PartialEq + Eq + Hash + fmt::Debug + Send + Sync + 'static
{
    fn kind(&self) -> ShapeKind;
    fn orientation(&self) -> Orientation;

    /// Returns a handle to the same entity with the given orientation
    fn oriented(&self, orientation: Orientation) -> Self;

    /// Returns a handle to the same entity with the opposite orientation
    fn reversed(&self) -> Self;

    /// Direct children, in kernel order, with their stored orientations
    fn children(&self) -> Vec<Self>;
}

/// A CAD kernel
///
/// Kernel handles are cheap to clone and shareable across threads; any
/// process-wide kernel state (parallelism flags, progress hooks) must be
/// configured when the handle is constructed and treated as read-only
/// afterwards. No operation may mutate its input shapes: replacements are
/// returned by value.
pub trait Kernel: Clone + Send + Sync + 'static {
    type Shape: Shape;

    /// Pave-filler handle: the shared precomputation reused by the boolean
    /// operations of one pair
    type Pave: Send;

    ////////////////////////////////////////////////////////////////////////
    // Assembly I/O (kernel-native serialization)

    fn read_native(&self, path: &Path) -> Result<Self::Shape, Error>;
    fn write_native(&self, shape: &Self::Shape, path: &Path) -> Result<(), Error>;

    ////////////////////////////////////////////////////////////////////////
    // Builders

    fn make_compound(&self, children: &[Self::Shape]) -> Self::Shape;

    /// Builds an empty container of the same kind (and underlying geometry,
    /// where the kind carries any) as `original`
    fn empty_container_like(&self, original: &Self::Shape) -> Result<Self::Shape, Error>;

    /// Appends a child to a container built by [`Kernel::empty_container_like`]
    /// or [`Kernel::begin_face`]
    fn add_child(&self, parent: &Self::Shape, child: &Self::Shape);

    ////////////////////////////////////////////////////////////////////////
    // Measures and checks

    /// Volume property of a shape; may legitimately come back slightly
    /// negative for degenerate boolean results, so callers must normalise
    fn volume_raw(&self, shape: &Self::Shape) -> f64;

    fn oriented_bbox(&self, shape: &Self::Shape) -> Obb;

    /// Minimum surface distance; failure of the underlying query is fatal
    fn min_distance(&self, a: &Self::Shape, b: &Self::Shape) -> Result<f64, Error>;

    /// Names of the defects found by the kernel's shape analyzer; an empty
    /// list means the shape is valid
    fn validity_defects(&self, shape: &Self::Shape) -> Vec<String>;

    ////////////////////////////////////////////////////////////////////////
    // Boolean operations

    /// Runs the shared pave step for a pair of solids
    ///
    /// The deadline, if any, is consulted from the kernel's progress
    /// callback during paving only; later operations on the returned
    /// filler are not timed.
    fn pave(
        &self,
        a: &Self::Shape,
        b: &Self::Shape,
        fuzzy: f64,
        deadline: Option<&Deadline>,
    ) -> Result<Paved<Self::Pave>, PaveError>;

    /// Runs one boolean operation on a previously paved pair
    fn boolean(&self, pave: &Self::Pave, op: BoolOp) -> Result<BoolOk<Self::Shape>, OpFailed>;

    /// Fuses two distinct shapes without a shared pave step
    fn fuse(&self, a: &Self::Shape, b: &Self::Shape) -> Result<BoolOk<Self::Shape>, OpFailed>;

    ////////////////////////////////////////////////////////////////////////
    // Sub-shape exploration

    /// Every sub-shape of the given kind, unique by identity, in a stable
    /// traversal order
    fn subshapes(&self, shape: &Self::Shape, kind: ShapeKind) -> Vec<Self::Shape>;

    ////////////////////////////////////////////////////////////////////////
    // Topology helpers for the merger

    fn vertex_point(&self, vertex: &Self::Shape) -> Point3<f64>;
    fn vertex_tolerance(&self, vertex: &Self::Shape) -> f64;

    /// Builds a single vertex at the average position of `members`, with a
    /// tolerance covering all of them
    fn merged_vertex(&self, members: &[Self::Shape]) -> Self::Shape;

    fn is_degenerate(&self, edge: &Self::Shape) -> bool;

    /// A representative point on an edge or face (an intermediate
    /// parameter, or an intermediate `(u, v)`)
    fn point_on(&self, shape: &Self::Shape) -> Result<Point3<f64>, Error>;

    /// Projects a point onto an edge or face; `None` when the projection
    /// cannot be computed (degenerate edge, projector failure)
    fn project_point(&self, point: &Point3<f64>, shape: &Self::Shape) -> Option<Point3<f64>>;

    /// First (forward) and last (reversed) vertex of an edge
    fn edge_vertices(&self, edge: &Self::Shape) -> (Self::Shape, Self::Shape);

    /// Rebuilds an edge on the source geometry with replaced end vertices,
    /// preserving parameter ranges and the degenerate flag
    fn remake_edge(
        &self,
        edge: &Self::Shape,
        v1: &Self::Shape,
        v2: &Self::Shape,
    ) -> Result<Self::Shape, Error>;

    /// A face carrying the source face's surface, location, and tolerance,
    /// with no wires attached yet
    fn begin_face(&self, face: &Self::Shape) -> Self::Shape;

    fn has_pcurve(&self, edge: &Self::Shape, face: &Self::Shape) -> bool;

    /// Attempts to transplant the parameter curve of `from` onto `to`;
    /// returns `true` on success
    fn attach_pcurve(&self, from: &Self::Shape, to: &Self::Shape, face: &Self::Shape) -> bool;

    /// Builds a parameter curve for `edge` on the face's surface by
    /// projection; for closed edges on periodic surfaces this includes any
    /// translation of the 2-D curve by the surface period
    fn build_pcurve(&self, edge: &Self::Shape, face: &Self::Shape) -> Result<(), Error>;

    fn is_periodic_surface(&self, face: &Self::Shape) -> bool;

    /// `(u_min, u_max, v_min, v_max)` parameter bounds of the face
    fn uv_bounds(&self, face: &Self::Shape) -> (f64, f64, f64, f64);

    /// Whether the edge's pcurve midpoint lies within `[u_min, u_max]`;
    /// closed edges and edges without a pcurve report `true`
    fn pcurve_in_bounds(
        &self,
        edge: &Self::Shape,
        face: &Self::Shape,
        u_min: f64,
        u_max: f64,
    ) -> bool;

    /// Drops a stale pcurve so it can be rebuilt
    fn clear_pcurve(&self, edge: &Self::Shape, face: &Self::Shape);

    /// The kernel's split-reversal predicate: does `split` run opposite to
    /// `original`?
    fn is_split_reversed(&self, split: &Self::Shape, original: &Self::Shape) -> bool;

    /// Reconciles 3-D and 2-D curve representations across the whole shape
    fn fix_same_parameter(&self, shape: &Self::Shape, tolerance: f64)
        -> Result<Self::Shape, Error>;
}

/// Volume of a shape, rejecting negative results
///
/// The one caller allowed to see a negative volume is the intersection
/// classifier's COMMON phase, which goes through
/// [`Kernel::volume_raw`] directly and applies its own workaround.
pub fn volume_of<K: Kernel>(kernel: &K, shape: &K::Shape) -> Result<f64, Error> {
    let volume = kernel.volume_raw(shape);
    if volume < 0.0 {
        Err(Error::NegativeVolume(volume))
    } else {
        Ok(volume)
    }
}
