//! Rectilinear reference backend
//!
//! A complete [`Kernel`] implementation for axis-aligned geometry: every
//! solid is a union of disjoint axis-aligned boxes ("cells"), boolean
//! operations are interval algebra with box splitting, and each cell
//! carries a generated B-rep hierarchy (vertices, edges, wires, faces,
//! shell) so the merger has real topology to reglue.
//!
//! The fuzzy value behaves like a full kernel's: an axis overlap depth
//! within `[-fuzzy, +fuzzy]` reads as *coincident*, so a sliver thinner
//! than the fuzzy band produces no common solid but still sections.
//!
//! This backend keeps the whole pipeline runnable and testable without a
//! native CAD kernel; production deployments bind a full B-rep kernel to
//! the same trait out of tree.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use nalgebra::{Point3, Vector3};

use crate::boolean::Deadline;
use crate::geom::Obb;
use crate::kernel::{
    BoolOk, BoolOp, Kernel, OpFailed, Orientation, PaveError, Paved, Shape, ShapeKind,
};
use crate::Error;

/// Smallest fuzzy value the backend distinguishes; requests below this are
/// clamped, and the clamped value is reported back
pub const MIN_FUZZY: f64 = 1e-9;

const VERTEX_TOL: f64 = 1e-7;

////////////////////////////////////////////////////////////////////////////
// Cells

/// An axis-aligned box with strictly positive extent
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        debug_assert!((0..3).all(|i| max[i] > min[i]));
        Self { min, max }
    }

    fn volume(&self) -> f64 {
        (0..3).map(|i| self.max[i] - self.min[i]).product()
    }

    /// Signed overlap depth per axis; negative values are gaps
    fn depths(&self, other: &Aabb) -> [f64; 3] {
        let mut d = [0.0; 3];
        for i in 0..3 {
            d[i] = self.max[i].min(other.max[i]) - self.min[i].max(other.min[i]);
        }
        d
    }

    /// Strictly positive-volume intersection
    fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let min = Point3::from([
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.min.z.max(other.min.z),
        ]);
        let max = Point3::from([
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
            self.max.z.min(other.max.z),
        ]);
        if (0..3).all(|i| max[i] > min[i]) {
            Some(Aabb::new(min, max))
        } else {
            None
        }
    }

    /// `self` minus `other`, as up to six disjoint boxes
    fn subtract(&self, other: &Aabb) -> Vec<Aabb> {
        if self.intersection(other).is_none() {
            return vec![*self];
        }
        let mut out = vec![];
        let mut rem = *self;
        for i in 0..3 {
            if other.min[i] > rem.min[i] {
                let mut slab = rem;
                slab.max[i] = other.min[i];
                out.push(slab);
                rem.min[i] = other.min[i];
            }
            if other.max[i] < rem.max[i] {
                let mut slab = rem;
                slab.min[i] = other.max[i];
                out.push(slab);
                rem.max[i] = other.max[i];
            }
        }
        // what remains of `rem` lies inside `other` and is discarded
        out
    }

    /// Euclidean separation; zero when the boxes overlap or touch
    fn gap(&self, other: &Aabb) -> f64 {
        let mut sq = 0.0;
        for d in self.depths(other) {
            if d < 0.0 {
                sq += d * d;
            }
        }
        sq.sqrt()
    }
}

fn subtract_all(cells: &[Aabb], others: &[Aabb]) -> Vec<Aabb> {
    let mut out: Vec<Aabb> = cells.to_vec();
    for other in others {
        out = out.iter().flat_map(|c| c.subtract(other)).collect();
    }
    out
}

////////////////////////////////////////////////////////////////////////////
// Shape handles

enum Geom {
    None,
    Vertex {
        point: Point3<f64>,
        tol: f64,
    },
    Edge {
        a: Point3<f64>,
        b: Point3<f64>,
        degenerate: bool,
    },
    /// Bounded parallelogram: points are `origin + s*u + t*v` for
    /// `(s, t)` in the unit square; the outward normal is `u x v`
    Face {
        origin: Point3<f64>,
        u: Vector3<f64>,
        v: Vector3<f64>,
    },
    Solid {
        cells: Vec<Aabb>,
    },
}

struct Node {
    kind: ShapeKind,
    geom: Geom,
    children: Mutex<Vec<RectShape>>,
}

impl Node {
    fn new(kind: ShapeKind, geom: Geom, children: Vec<RectShape>) -> RectShape {
        RectShape {
            node: Arc::new(Node {
                kind,
                geom,
                children: Mutex::new(children),
            }),
            orient: Orientation::Forward,
        }
    }
}

/// Handle to a shape owned by the rectilinear backend
///
/// Equality and hashing follow identity (the underlying node), ignoring
/// orientation.
#[derive(Clone)]
pub struct RectShape {
    node: Arc<Node>,
    orient: Orientation,
}

impl PartialEq for RectShape {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for RectShape {}

impl Hash for RectShape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.node) as usize).hash(state);
    }
}

impl fmt::Debug for RectShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}@{:x}{}",
            self.node.kind,
            Arc::as_ptr(&self.node) as usize & 0xFFFF,
            match self.orient {
                Orientation::Forward => "",
                Orientation::Reversed => "^",
            }
        )
    }
}

impl Shape for RectShape {
    fn kind(&self) -> ShapeKind {
        self.node.kind
    }

    fn orientation(&self) -> Orientation {
        self.orient
    }

    fn oriented(&self, orientation: Orientation) -> Self {
        Self {
            node: Arc::clone(&self.node),
            orient: orientation,
        }
    }

    fn reversed(&self) -> Self {
        self.oriented(self.orient.reversed())
    }

    fn children(&self) -> Vec<Self> {
        self.node.children.lock().unwrap().clone()
    }
}

impl RectShape {
    fn cells(&self) -> Vec<Aabb> {
        fn walk(shape: &RectShape, out: &mut Vec<Aabb>) {
            match &shape.node.geom {
                Geom::Solid { cells } => out.extend_from_slice(cells),
                _ => {
                    if matches!(
                        shape.kind(),
                        ShapeKind::Compound | ShapeKind::CompSolid
                    ) {
                        for c in shape.children() {
                            walk(&c, out);
                        }
                    }
                }
            }
        }
        let mut out = vec![];
        walk(self, &mut out);
        out
    }
}

////////////////////////////////////////////////////////////////////////////
// Topology generation

/// Builds the full B-rep hierarchy of one axis-aligned box, returning its
/// shell
fn box_topology(cell: Aabb) -> RectShape {
    let corner = |bits: usize| -> Point3<f64> {
        Point3::new(
            if bits & 1 == 0 { cell.min.x } else { cell.max.x },
            if bits & 2 == 0 { cell.min.y } else { cell.max.y },
            if bits & 4 == 0 { cell.min.z } else { cell.max.z },
        )
    };

    let verts: Vec<RectShape> = (0..8)
        .map(|i| {
            Node::new(
                ShapeKind::Vertex,
                Geom::Vertex {
                    point: corner(i),
                    tol: VERTEX_TOL,
                },
                vec![],
            )
        })
        .collect();

    // the 12 box edges, keyed by their (low, high) corner bits
    let edge_pairs: [(usize, usize); 12] = [
        (0, 1),
        (2, 3),
        (4, 5),
        (6, 7), // along x
        (0, 2),
        (1, 3),
        (4, 6),
        (5, 7), // along y
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7), // along z
    ];
    let edge = |a: usize, b: usize| -> RectShape {
        Node::new(
            ShapeKind::Edge,
            Geom::Edge {
                a: corner(a),
                b: corner(b),
                degenerate: false,
            },
            vec![
                verts[a].oriented(Orientation::Forward),
                verts[b].oriented(Orientation::Reversed),
            ],
        )
    };
    let edges: Vec<((usize, usize), RectShape)> =
        edge_pairs.iter().map(|&(a, b)| ((a, b), edge(a, b))).collect();
    let find_edge = |a: usize, b: usize| -> RectShape {
        let key = (a.min(b), a.max(b));
        let e = edges
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, e)| e.clone())
            .expect("box edge lookup");
        if a < b {
            e
        } else {
            e.reversed()
        }
    };

    // six faces with outward normals (u x v points out of the box);
    // corners listed counter-clockwise around that normal
    let face_specs: [[usize; 4]; 6] = [
        [0, 4, 6, 2], // -x
        [1, 3, 7, 5], // +x
        [0, 1, 5, 4], // -y
        [2, 6, 7, 3], // +y
        [0, 2, 3, 1], // -z
        [4, 5, 7, 6], // +z
    ];
    let faces: Vec<RectShape> = face_specs
        .iter()
        .map(|quad| {
            let o = corner(quad[0]);
            let u = corner(quad[1]) - o;
            let v = corner(quad[3]) - o;
            let loop_edges = (0..4)
                .map(|i| find_edge(quad[i], quad[(i + 1) % 4]))
                .collect();
            let wire = Node::new(ShapeKind::Wire, Geom::None, loop_edges);
            Node::new(
                ShapeKind::Face,
                Geom::Face { origin: o, u, v },
                vec![wire],
            )
        })
        .collect();

    Node::new(ShapeKind::Shell, Geom::None, faces)
}

fn solid_from_cells(cells: Vec<Aabb>) -> RectShape {
    let shells = cells.iter().map(|&c| box_topology(c)).collect::<Vec<_>>();
    Node::new(ShapeKind::Solid, Geom::Solid { cells }, shells)
}

////////////////////////////////////////////////////////////////////////////
// The kernel

/// The rectilinear kernel
///
/// Stateless and trivially cloneable; all geometry lives behind the shape
/// handles.
#[derive(Copy, Clone, Default)]
pub struct RectKernel;

impl RectKernel {
    pub fn new() -> Self {
        Self
    }

    /// Builds a box solid with full topology
    pub fn make_box(&self, corner: Point3<f64>, sizes: Vector3<f64>) -> RectShape {
        solid_from_cells(vec![Aabb::new(corner, corner + sizes)])
    }
}

/// Shared pave state for one pair of rectilinear solids
pub struct RectPave {
    a: Vec<Aabb>,
    b: Vec<Aabb>,
    fuzzy: f64,
}

impl RectPave {
    /// Common cells: raw cell intersections whose overlap depth clears the
    /// fuzzy band on every axis
    fn common_cells(&self) -> Vec<Aabb> {
        let mut out = vec![];
        for ca in &self.a {
            for cb in &self.b {
                if ca.depths(cb).iter().all(|&d| d > self.fuzzy) {
                    if let Some(c) = ca.intersection(cb) {
                        out.push(c);
                    }
                }
            }
        }
        out
    }

    /// Do any two cells come within the fuzzy band on all axes?
    fn any_contact(&self) -> Option<Point3<f64>> {
        for ca in &self.a {
            for cb in &self.b {
                if ca.depths(cb).iter().all(|&d| d >= -self.fuzzy) {
                    // clamp one center into the other box for a witness
                    let mid = nalgebra::center(&ca.min, &ca.max);
                    let p = Point3::from([
                        mid.x.clamp(cb.min.x, cb.max.x),
                        mid.y.clamp(cb.min.y, cb.max.y),
                        mid.z.clamp(cb.min.z, cb.max.z),
                    ]);
                    return Some(p);
                }
            }
        }
        None
    }
}

fn result_shape(cells: Vec<Aabb>) -> RectShape {
    if cells.is_empty() {
        Node::new(ShapeKind::Compound, Geom::None, vec![])
    } else {
        solid_from_cells(cells)
    }
}

impl Kernel for RectKernel {
    type Shape = RectShape;
    type Pave = RectPave;

    ////////////////////////////////////////////////////////////////////////
    // Assembly I/O

    fn read_native(&self, path: &Path) -> Result<RectShape, Error> {
        let file = std::fs::File::open(path)?;
        let mut lines = BufReader::new(file).lines();

        let mut next = || -> Result<String, Error> {
            match lines.next() {
                Some(line) => Ok(line?),
                None => Err(Error::MalformedAssembly("unexpected end of file".into())),
            }
        };

        let header = next()?;
        if header.trim() != "rectbrep 1" {
            return Err(Error::MalformedAssembly(format!(
                "unknown header '{}'",
                header.trim()
            )));
        }
        let count: usize = {
            let line = next()?;
            let rest = line
                .strip_prefix("compound ")
                .ok_or_else(|| Error::MalformedAssembly("expected 'compound N'".into()))?;
            rest.trim()
                .parse()
                .map_err(|_| Error::MalformedAssembly("bad compound count".into()))?
        };

        let mut solids = vec![];
        for _ in 0..count {
            let line = next()?;
            let cells: usize = line
                .strip_prefix("solid ")
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| Error::MalformedAssembly("expected 'solid M'".into()))?;
            let mut boxes = vec![];
            for _ in 0..cells {
                let line = next()?;
                let nums: Vec<f64> = line
                    .strip_prefix("cell ")
                    .map(|s| s.split_whitespace().flat_map(str::parse).collect())
                    .unwrap_or_default();
                if nums.len() != 6 {
                    return Err(Error::MalformedAssembly(format!("bad cell line '{line}'")));
                }
                let min = Point3::new(nums[0], nums[1], nums[2]);
                let max = Point3::new(nums[3], nums[4], nums[5]);
                if (0..3).any(|i| max[i] <= min[i]) {
                    return Err(Error::MalformedAssembly(format!(
                        "cell has non-positive extent: '{line}'"
                    )));
                }
                boxes.push(Aabb::new(min, max));
            }
            solids.push(solid_from_cells(boxes));
        }
        Ok(self.make_compound(&solids))
    }

    fn write_native(&self, shape: &RectShape, path: &Path) -> Result<(), Error> {
        let file = std::fs::File::create(path)?;
        let mut w = BufWriter::new(file);
        let children = shape.children();
        writeln!(w, "rectbrep 1")?;
        writeln!(w, "compound {}", children.len())?;
        for child in &children {
            let cells = child.cells();
            writeln!(w, "solid {}", cells.len())?;
            for c in &cells {
                writeln!(
                    w,
                    "cell {} {} {} {} {} {}",
                    c.min.x, c.min.y, c.min.z, c.max.x, c.max.y, c.max.z
                )?;
            }
        }
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////
    // Builders

    fn make_compound(&self, children: &[RectShape]) -> RectShape {
        Node::new(ShapeKind::Compound, Geom::None, children.to_vec())
    }

    fn empty_container_like(&self, original: &RectShape) -> Result<RectShape, Error> {
        let geom = match (&original.node.geom, original.kind()) {
            (Geom::Solid { cells }, _) => Geom::Solid {
                cells: cells.clone(),
            },
            (
                _,
                ShapeKind::Wire
                | ShapeKind::Shell
                | ShapeKind::Solid
                | ShapeKind::CompSolid
                | ShapeKind::Compound,
            ) => Geom::None,
            (_, kind) => return Err(Error::BadContainer(kind)),
        };
        Ok(Node::new(original.kind(), geom, vec![]))
    }

    fn add_child(&self, parent: &RectShape, child: &RectShape) {
        parent.node.children.lock().unwrap().push(child.clone());
    }

    ////////////////////////////////////////////////////////////////////////
    // Measures and checks

    fn volume_raw(&self, shape: &RectShape) -> f64 {
        shape.cells().iter().map(Aabb::volume).sum()
    }

    fn oriented_bbox(&self, shape: &RectShape) -> Obb {
        let cells = shape.cells();
        let mut min = Point3::from([f64::INFINITY; 3]);
        let mut max = Point3::from([f64::NEG_INFINITY; 3]);
        for c in &cells {
            for i in 0..3 {
                min[i] = min[i].min(c.min[i]);
                max[i] = max[i].max(c.max[i]);
            }
        }
        if cells.is_empty() {
            min = Point3::origin();
            max = Point3::origin();
        }
        Obb::axis_aligned(min, max)
    }

    fn min_distance(&self, a: &RectShape, b: &RectShape) -> Result<f64, Error> {
        let (ca, cb) = (a.cells(), b.cells());
        if ca.is_empty() || cb.is_empty() {
            return Err(Error::DistanceFailed);
        }
        let mut best = f64::INFINITY;
        for x in &ca {
            for y in &cb {
                best = best.min(x.gap(y));
            }
        }
        Ok(best)
    }

    fn validity_defects(&self, shape: &RectShape) -> Vec<String> {
        let mut defects = vec![];
        for solid in self.subshapes(shape, ShapeKind::Solid) {
            if let Geom::Solid { cells } = &solid.node.geom {
                if cells.is_empty() {
                    defects.push("EmptyShell".to_owned());
                }
            }
        }
        defects
    }

    ////////////////////////////////////////////////////////////////////////
    // Boolean operations

    fn pave(
        &self,
        a: &RectShape,
        b: &RectShape,
        fuzzy: f64,
        deadline: Option<&Deadline>,
    ) -> Result<Paved<RectPave>, PaveError> {
        let start = Instant::now();
        if let Some(deadline) = deadline {
            if deadline.expired() {
                return Err(PaveError::Timeout {
                    elapsed: deadline.elapsed(),
                    warnings: 0,
                });
            }
        }
        Ok(Paved {
            filler: RectPave {
                a: a.cells(),
                b: b.cells(),
                fuzzy: fuzzy.max(MIN_FUZZY),
            },
            fuzzy_value: fuzzy.max(MIN_FUZZY),
            warnings: 0,
            elapsed: start.elapsed(),
        })
    }

    fn boolean(&self, pave: &RectPave, op: BoolOp) -> Result<BoolOk<RectShape>, OpFailed> {
        let shape = match op {
            BoolOp::Common => result_shape(pave.common_cells()),
            BoolOp::Cut => result_shape(subtract_all(&pave.a, &pave.common_cells())),
            BoolOp::Cut21 => result_shape(subtract_all(&pave.b, &pave.common_cells())),
            BoolOp::Section => match pave.any_contact() {
                Some(p) => {
                    let v = Node::new(
                        ShapeKind::Vertex,
                        Geom::Vertex {
                            point: p,
                            tol: VERTEX_TOL,
                        },
                        vec![],
                    );
                    Node::new(ShapeKind::Compound, Geom::None, vec![v])
                }
                None => Node::new(ShapeKind::Compound, Geom::None, vec![]),
            },
        };
        Ok(BoolOk { shape, warnings: 0 })
    }

    fn fuse(&self, a: &RectShape, b: &RectShape) -> Result<BoolOk<RectShape>, OpFailed> {
        let ca = a.cells();
        let mut cells = ca.clone();
        cells.extend(subtract_all(&b.cells(), &ca));
        Ok(BoolOk {
            shape: result_shape(cells),
            warnings: 0,
        })
    }

    ////////////////////////////////////////////////////////////////////////
    // Sub-shape exploration

    fn subshapes(&self, shape: &RectShape, kind: ShapeKind) -> Vec<RectShape> {
        fn walk(
            shape: &RectShape,
            kind: ShapeKind,
            seen: &mut std::collections::HashSet<RectShape>,
            out: &mut Vec<RectShape>,
        ) {
            if shape.kind() == kind && seen.insert(shape.clone()) {
                out.push(shape.clone());
            }
            for c in shape.children() {
                walk(&c, kind, seen, out);
            }
        }
        let mut seen = std::collections::HashSet::new();
        let mut out = vec![];
        walk(shape, kind, &mut seen, &mut out);
        out
    }

    ////////////////////////////////////////////////////////////////////////
    // Topology helpers

    fn vertex_point(&self, vertex: &RectShape) -> Point3<f64> {
        match &vertex.node.geom {
            Geom::Vertex { point, .. } => *point,
            _ => Point3::origin(),
        }
    }

    fn vertex_tolerance(&self, vertex: &RectShape) -> f64 {
        match &vertex.node.geom {
            Geom::Vertex { tol, .. } => *tol,
            _ => VERTEX_TOL,
        }
    }

    fn merged_vertex(&self, members: &[RectShape]) -> RectShape {
        let mut sum = Vector3::zeros();
        for m in members {
            sum += self.vertex_point(m).coords;
        }
        let center = Point3::from(sum / members.len() as f64);
        let tol = members
            .iter()
            .map(|m| {
                self.vertex_tolerance(m)
                    + nalgebra::distance(&self.vertex_point(m), &center)
            })
            .fold(VERTEX_TOL, f64::max);
        Node::new(
            ShapeKind::Vertex,
            Geom::Vertex { point: center, tol },
            vec![],
        )
    }

    fn is_degenerate(&self, edge: &RectShape) -> bool {
        matches!(
            edge.node.geom,
            Geom::Edge {
                degenerate: true,
                ..
            }
        )
    }

    fn point_on(&self, shape: &RectShape) -> Result<Point3<f64>, Error> {
        match &shape.node.geom {
            Geom::Edge { a, b, .. } => Ok(nalgebra::center(a, b)),
            Geom::Face { origin, u, v } => Ok(origin + 0.5 * u + 0.5 * v),
            _ => Err(Error::NoPointOnShape(shape.kind())),
        }
    }

    fn project_point(&self, point: &Point3<f64>, shape: &RectShape) -> Option<Point3<f64>> {
        match &shape.node.geom {
            Geom::Edge { a, b, degenerate } => {
                if *degenerate {
                    return None;
                }
                let d = b - a;
                let len2 = d.norm_squared();
                if len2 == 0.0 {
                    return Some(*a);
                }
                let t = ((point - a).dot(&d) / len2).clamp(0.0, 1.0);
                Some(a + t * d)
            }
            Geom::Face { origin, u, v } => {
                let w = point - origin;
                let s = (w.dot(u) / u.norm_squared()).clamp(0.0, 1.0);
                let t = (w.dot(v) / v.norm_squared()).clamp(0.0, 1.0);
                Some(origin + s * u + t * v)
            }
            _ => None,
        }
    }

    fn edge_vertices(&self, edge: &RectShape) -> (RectShape, RectShape) {
        let children = edge.children();
        let first = children
            .iter()
            .find(|c| c.orientation() == Orientation::Forward)
            .or(children.first())
            .expect("edge without vertices")
            .clone();
        let last = children
            .iter()
            .find(|c| c.orientation() == Orientation::Reversed)
            .or(children.last())
            .expect("edge without vertices")
            .clone();
        (first, last)
    }

    fn remake_edge(
        &self,
        edge: &RectShape,
        v1: &RectShape,
        v2: &RectShape,
    ) -> Result<RectShape, Error> {
        let degenerate = self.is_degenerate(edge);
        Ok(Node::new(
            ShapeKind::Edge,
            Geom::Edge {
                a: self.vertex_point(v1),
                b: self.vertex_point(v2),
                degenerate,
            },
            vec![
                v1.oriented(Orientation::Forward),
                v2.oriented(Orientation::Reversed),
            ],
        ))
    }

    fn begin_face(&self, face: &RectShape) -> RectShape {
        let geom = match &face.node.geom {
            Geom::Face { origin, u, v } => Geom::Face {
                origin: *origin,
                u: *u,
                v: *v,
            },
            _ => Geom::None,
        };
        Node::new(ShapeKind::Face, geom, vec![])
    }

    // planar surfaces always carry a trivial parameter curve, so the
    // attach/build ladder short-circuits on `has_pcurve`
    fn has_pcurve(&self, _edge: &RectShape, _face: &RectShape) -> bool {
        true
    }

    fn attach_pcurve(&self, _from: &RectShape, _to: &RectShape, _face: &RectShape) -> bool {
        true
    }

    fn build_pcurve(&self, _edge: &RectShape, _face: &RectShape) -> Result<(), Error> {
        Ok(())
    }

    fn is_periodic_surface(&self, _face: &RectShape) -> bool {
        false
    }

    fn uv_bounds(&self, _face: &RectShape) -> (f64, f64, f64, f64) {
        (0.0, 1.0, 0.0, 1.0)
    }

    fn pcurve_in_bounds(
        &self,
        _edge: &RectShape,
        _face: &RectShape,
        _u_min: f64,
        _u_max: f64,
    ) -> bool {
        true
    }

    fn clear_pcurve(&self, _edge: &RectShape, _face: &RectShape) {}

    fn is_split_reversed(&self, split: &RectShape, original: &RectShape) -> bool {
        match (&split.node.geom, &original.node.geom) {
            (Geom::Edge { a, b, .. }, Geom::Edge { a: oa, b: ob, .. }) => {
                (b - a).dot(&(ob - oa)) < 0.0
            }
            (Geom::Face { u, v, .. }, Geom::Face { u: ou, v: ov, .. }) => {
                u.cross(v).dot(&ou.cross(ov)) < 0.0
            }
            _ => false,
        }
    }

    fn fix_same_parameter(&self, shape: &RectShape, _tolerance: f64) -> Result<RectShape, Error> {
        // 3-D and 2-D representations coincide by construction here
        Ok(shape.clone())
    }
}
