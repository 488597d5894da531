//! Shared helpers for kernel-driven tests
use std::path::Path;
use std::sync::{Arc, Mutex};

use nalgebra::{Point3, Vector3};

use crate::boolean::Deadline;
use crate::geom::Obb;
use crate::kernel::rect::{RectKernel, RectPave, RectShape};
use crate::kernel::{BoolOk, BoolOp, Kernel, OpFailed, PaveError, Paved, ShapeKind};
use crate::Error;

/// A cube of the given side length with its corner at `(x, y, z)`
pub fn cube_at(x: f64, y: f64, z: f64, length: f64) -> RectShape {
    RectKernel::new().make_box(
        Point3::new(x, y, z),
        Vector3::new(length, length, length),
    )
}

/// Rect kernel wrapper that injects failures on demand
///
/// Used to drive the recovery paths: tolerance-ladder retries, fuse
/// failures during imprinting, and the negative-common-volume workaround.
#[derive(Clone, Default)]
pub struct FlakyKernel {
    inner: RectKernel,

    /// Pave fails whenever the requested fuzzy value exceeds this
    fail_pave_above: Option<f64>,

    /// Every fuse reports a failure
    fail_fuse: bool,

    /// Report this volume for the most recent COMMON result
    neg_common: Option<f64>,
    last_common: Arc<Mutex<Option<RectShape>>>,
}

impl FlakyKernel {
    pub fn failing_pave_above(limit: f64) -> Self {
        Self {
            fail_pave_above: Some(limit),
            ..Self::default()
        }
    }

    pub fn failing_fuse() -> Self {
        Self {
            fail_fuse: true,
            ..Self::default()
        }
    }

    pub fn with_negative_common(volume: f64) -> Self {
        Self {
            neg_common: Some(volume),
            ..Self::default()
        }
    }
}

impl Kernel for FlakyKernel {
    type Shape = RectShape;
    type Pave = RectPave;

    fn read_native(&self, path: &Path) -> Result<RectShape, Error> {
        self.inner.read_native(path)
    }

    fn write_native(&self, shape: &RectShape, path: &Path) -> Result<(), Error> {
        self.inner.write_native(shape, path)
    }

    fn make_compound(&self, children: &[RectShape]) -> RectShape {
        self.inner.make_compound(children)
    }

    fn empty_container_like(&self, original: &RectShape) -> Result<RectShape, Error> {
        self.inner.empty_container_like(original)
    }

    fn add_child(&self, parent: &RectShape, child: &RectShape) {
        self.inner.add_child(parent, child)
    }

    fn volume_raw(&self, shape: &RectShape) -> f64 {
        if let Some(v) = self.neg_common {
            if self.last_common.lock().unwrap().as_ref() == Some(shape) {
                return v;
            }
        }
        self.inner.volume_raw(shape)
    }

    fn oriented_bbox(&self, shape: &RectShape) -> Obb {
        self.inner.oriented_bbox(shape)
    }

    fn min_distance(&self, a: &RectShape, b: &RectShape) -> Result<f64, Error> {
        self.inner.min_distance(a, b)
    }

    fn validity_defects(&self, shape: &RectShape) -> Vec<String> {
        self.inner.validity_defects(shape)
    }

    fn pave(
        &self,
        a: &RectShape,
        b: &RectShape,
        fuzzy: f64,
        deadline: Option<&Deadline>,
    ) -> Result<Paved<RectPave>, PaveError> {
        if let Some(limit) = self.fail_pave_above {
            if fuzzy > limit {
                return Err(PaveError::Failed { warnings: 3 });
            }
        }
        self.inner.pave(a, b, fuzzy, deadline)
    }

    fn boolean(&self, pave: &RectPave, op: BoolOp) -> Result<BoolOk<RectShape>, OpFailed> {
        let ok = self.inner.boolean(pave, op)?;
        if op == BoolOp::Common && self.neg_common.is_some() {
            *self.last_common.lock().unwrap() = Some(ok.shape.clone());
        }
        Ok(ok)
    }

    fn fuse(&self, a: &RectShape, b: &RectShape) -> Result<BoolOk<RectShape>, OpFailed> {
        if self.fail_fuse {
            return Err(OpFailed { warnings: 1 });
        }
        self.inner.fuse(a, b)
    }

    fn subshapes(&self, shape: &RectShape, kind: ShapeKind) -> Vec<RectShape> {
        self.inner.subshapes(shape, kind)
    }

    fn vertex_point(&self, vertex: &RectShape) -> Point3<f64> {
        self.inner.vertex_point(vertex)
    }

    fn vertex_tolerance(&self, vertex: &RectShape) -> f64 {
        self.inner.vertex_tolerance(vertex)
    }

    fn merged_vertex(&self, members: &[RectShape]) -> RectShape {
        self.inner.merged_vertex(members)
    }

    fn is_degenerate(&self, edge: &RectShape) -> bool {
        self.inner.is_degenerate(edge)
    }

    fn point_on(&self, shape: &RectShape) -> Result<Point3<f64>, Error> {
        self.inner.point_on(shape)
    }

    fn project_point(&self, point: &Point3<f64>, shape: &RectShape) -> Option<Point3<f64>> {
        self.inner.project_point(point, shape)
    }

    fn edge_vertices(&self, edge: &RectShape) -> (RectShape, RectShape) {
        self.inner.edge_vertices(edge)
    }

    fn remake_edge(
        &self,
        edge: &RectShape,
        v1: &RectShape,
        v2: &RectShape,
    ) -> Result<RectShape, Error> {
        self.inner.remake_edge(edge, v1, v2)
    }

    fn begin_face(&self, face: &RectShape) -> RectShape {
        self.inner.begin_face(face)
    }

    fn has_pcurve(&self, edge: &RectShape, face: &RectShape) -> bool {
        self.inner.has_pcurve(edge, face)
    }

    fn attach_pcurve(&self, from: &RectShape, to: &RectShape, face: &RectShape) -> bool {
        self.inner.attach_pcurve(from, to, face)
    }

    fn build_pcurve(&self, edge: &RectShape, face: &RectShape) -> Result<(), Error> {
        self.inner.build_pcurve(edge, face)
    }

    fn is_periodic_surface(&self, face: &RectShape) -> bool {
        self.inner.is_periodic_surface(face)
    }

    fn uv_bounds(&self, face: &RectShape) -> (f64, f64, f64, f64) {
        self.inner.uv_bounds(face)
    }

    fn pcurve_in_bounds(
        &self,
        edge: &RectShape,
        face: &RectShape,
        u_min: f64,
        u_max: f64,
    ) -> bool {
        self.inner.pcurve_in_bounds(edge, face, u_min, u_max)
    }

    fn clear_pcurve(&self, edge: &RectShape, face: &RectShape) {
        self.inner.clear_pcurve(edge, face)
    }

    fn is_split_reversed(&self, split: &RectShape, original: &RectShape) -> bool {
        self.inner.is_split_reversed(split, original)
    }

    fn fix_same_parameter(&self, shape: &RectShape, tolerance: f64) -> Result<RectShape, Error> {
        self.inner.fix_same_parameter(shape, tolerance)
    }
}
