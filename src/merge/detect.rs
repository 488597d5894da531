//! Coincidence detection: vertex clusters, then edge and face groups
//!
//! Vertices cluster by flood-filling a spatial index of their bounding
//! spheres. Edges and faces first bucket by a *combinatorial* key, the
//! multiset of their child shapes mapped through the vertex/edge clusters
//! found so far, and each bucket is then refined by pairwise geometric
//! checks (project a representative point of one shape onto the other and
//! compare against the tolerance).
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use log::{debug, info};
use nalgebra::Point3;

use crate::geom::BoundingSphere;
use crate::kernel::{Kernel, Shape, ShapeKind};
use crate::merge::origin::Origin;
use crate::Error;

/// Finds every cluster of coincident sub-shapes in the assembly
pub fn detect<K: Kernel>(
    kernel: &K,
    root: &K::Shape,
    tolerance: f64,
) -> Result<Origin<K::Shape>, Error> {
    let mut origin = Origin::new();

    cluster_vertices(kernel, root, tolerance, &mut origin);
    info!("vertex detection done, {} clusters", origin.len());

    detect_shapes(kernel, root, ShapeKind::Edge, tolerance, &mut origin)?;
    info!("edge detection done, {} clusters", origin.len());

    detect_shapes(kernel, root, ShapeKind::Face, tolerance, &mut origin)?;
    info!("face detection done, {} clusters", origin.len());

    Ok(origin)
}

////////////////////////////////////////////////////////////////////////////
// Vertex clustering

fn cluster_vertices<K: Kernel>(
    kernel: &K,
    root: &K::Shape,
    tolerance: f64,
    origin: &mut Origin<K::Shape>,
) {
    let vertices = kernel.subshapes(root, ShapeKind::Vertex);
    if vertices.is_empty() {
        return;
    }

    let spheres: Vec<BoundingSphere> = vertices
        .iter()
        .map(|v| {
            BoundingSphere::new(
                kernel.vertex_point(v),
                kernel.vertex_tolerance(v) + tolerance,
            )
        })
        .collect();
    let index = SphereIndex::new(&spheres);

    let mut assigned = vec![false; vertices.len()];
    for start in 0..vertices.len() {
        if assigned[start] {
            continue;
        }
        assigned[start] = true;

        // flood fill over mutually intersecting spheres
        let mut cluster = vec![];
        let mut queue = vec![start];
        while let Some(i) = queue.pop() {
            cluster.push(i);
            for j in index.intersecting(&spheres[i]) {
                if !assigned[j] {
                    assigned[j] = true;
                    queue.push(j);
                }
            }
        }

        if cluster.len() >= 2 {
            debug!("vertex cluster of {}", cluster.len());
            origin.bind_cluster(cluster.iter().map(|&i| vertices[i].clone()).collect());
        }
    }
}

/// Uniform-grid index over bounding spheres
///
/// The cell size is the largest sphere diameter, so a sphere overlaps at
/// most a handful of cells and a query only has to visit the cells its own
/// bounds cover.
struct SphereIndex {
    cell: f64,
    grid: HashMap<[i64; 3], Vec<usize>>,
    spheres: Vec<BoundingSphere>,
}

impl SphereIndex {
    fn new(spheres: &[BoundingSphere]) -> Self {
        let cell = spheres
            .iter()
            .map(|s| s.radius * 2.0)
            .fold(f64::MIN_POSITIVE, f64::max);
        let mut grid: HashMap<[i64; 3], Vec<usize>> = HashMap::new();
        for (i, s) in spheres.iter().enumerate() {
            for key in Self::keys_for(cell, s) {
                grid.entry(key).or_default().push(i);
            }
        }
        Self {
            cell,
            grid,
            spheres: spheres.to_vec(),
        }
    }

    fn keys_for(cell: f64, sphere: &BoundingSphere) -> Vec<[i64; 3]> {
        let lo = Self::key_of(cell, &Point3::from(
            sphere.center.coords.add_scalar(-sphere.radius),
        ));
        let hi = Self::key_of(cell, &Point3::from(
            sphere.center.coords.add_scalar(sphere.radius),
        ));
        let mut keys = vec![];
        for x in lo[0]..=hi[0] {
            for y in lo[1]..=hi[1] {
                for z in lo[2]..=hi[2] {
                    keys.push([x, y, z]);
                }
            }
        }
        keys
    }

    fn key_of(cell: f64, p: &Point3<f64>) -> [i64; 3] {
        [
            (p.x / cell).floor() as i64,
            (p.y / cell).floor() as i64,
            (p.z / cell).floor() as i64,
        ]
    }

    /// Indices of every stored sphere intersecting the query sphere
    fn intersecting(&self, query: &BoundingSphere) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut out = vec![];
        for key in Self::keys_for(self.cell, query) {
            for &i in self.grid.get(&key).into_iter().flatten() {
                if seen.insert(i) && !query.is_out(&self.spheres[i]) {
                    out.push(i);
                }
            }
        }
        out
    }
}

////////////////////////////////////////////////////////////////////////////
// Edge and face grouping

/// Order-insensitive multiset key over child-shape identities
#[derive(Debug)]
struct PassKey<S: Shape> {
    parts: Vec<S>,
    hash: u64,
}

impl<S: Shape> PassKey<S> {
    fn new(parts: Vec<S>) -> Self {
        // a wrapping sum is order-insensitive by construction
        let hash = parts
            .iter()
            .map(|p| {
                let mut h = std::collections::hash_map::DefaultHasher::new();
                p.hash(&mut h);
                h.finish()
            })
            .fold(0u64, u64::wrapping_add);
        Self { parts, hash }
    }
}

impl<S: Shape> Hash for PassKey<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl<S: Shape> PartialEq for PassKey<S> {
    fn eq(&self, other: &Self) -> bool {
        if self.parts.len() != other.parts.len() {
            return false;
        }
        let mut counts: HashMap<&S, isize> = HashMap::new();
        for p in &self.parts {
            *counts.entry(p).or_default() += 1;
        }
        for p in &other.parts {
            match counts.get_mut(p) {
                Some(n) => *n -= 1,
                None => return false,
            }
        }
        counts.values().all(|&n| n == 0)
    }
}

impl<S: Shape> Eq for PassKey<S> {}

/// The combinatorial key of an edge or face, with children mapped through
/// the clusters found so far
fn pass_key<K: Kernel>(
    kernel: &K,
    shape: &K::Shape,
    origin: &Origin<K::Shape>,
) -> PassKey<K::Shape> {
    let map = |s: K::Shape| origin.representative(&s).cloned().unwrap_or(s);
    let parts = match shape.kind() {
        ShapeKind::Edge => shape
            .children()
            .into_iter()
            .filter(|c| c.kind() == ShapeKind::Vertex)
            .map(map)
            .collect(),
        ShapeKind::Face => kernel
            .subshapes(shape, ShapeKind::Edge)
            .into_iter()
            .filter(|e| !kernel.is_degenerate(e))
            .map(map)
            .collect(),
        _ => vec![],
    };
    PassKey::new(parts)
}

fn detect_shapes<K: Kernel>(
    kernel: &K,
    root: &K::Shape,
    kind: ShapeKind,
    tolerance: f64,
    origin: &mut Origin<K::Shape>,
) -> Result<(), Error> {
    // bucket by combinatorial key, preserving discovery order
    let mut buckets: Vec<Vec<K::Shape>> = vec![];
    let mut by_key: HashMap<PassKey<K::Shape>, usize> = HashMap::new();
    for shape in kernel.subshapes(root, kind) {
        let key = pass_key(kernel, &shape, origin);
        match by_key.entry(key) {
            std::collections::hash_map::Entry::Occupied(e) => {
                buckets[*e.get()].push(shape);
            }
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(buckets.len());
                buckets.push(vec![shape]);
            }
        }
    }

    // sharing a key is necessary but not sufficient; confirm geometric
    // coincidence within each bucket
    for bucket in &buckets {
        if bucket.len() < 2 {
            continue;
        }
        for group in refine_bucket(kernel, bucket, tolerance)? {
            if group.len() < 2 {
                continue;
            }
            if group[0].kind() == ShapeKind::Edge && kernel.is_degenerate(&group[0]) {
                continue;
            }
            origin.bind_cluster(group);
        }
    }
    Ok(())
}

/// Splits one combinatorial bucket into groups of geometrically coincident
/// shapes
fn refine_bucket<K: Kernel>(
    kernel: &K,
    shapes: &[K::Shape],
    tolerance: f64,
) -> Result<Vec<Vec<K::Shape>>, Error> {
    let mut processed: HashSet<&K::Shape> = HashSet::new();
    let mut groups = vec![];

    for shape in shapes {
        if processed.contains(shape) {
            continue;
        }
        if shape.kind() == ShapeKind::Edge && kernel.is_degenerate(shape) {
            processed.insert(shape);
            continue;
        }

        let p1 = kernel.point_on(shape)?;
        let mut nearby = vec![];
        for other in shapes {
            if shape == other {
                nearby.push(other);
            } else if let Some(p2) = kernel.project_point(&p1, other) {
                if nalgebra::distance_squared(&p1, &p2) < tolerance * tolerance {
                    nearby.push(other);
                }
            }
        }
        // we always find at least ourselves
        for s in nearby.iter().copied() {
            processed.insert(s);
        }
        groups.push(nearby.into_iter().cloned().collect());
    }
    Ok(groups)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernel::rect::RectKernel;
    use crate::testkit::cube_at;

    fn kinds<'a, S: Shape>(
        origin: &'a Origin<S>,
        kind: ShapeKind,
    ) -> impl Iterator<Item = (&'a S, &'a [S])> {
        origin.clusters().filter(move |(rep, _)| rep.kind() == kind)
    }

    #[test]
    fn abutting_cubes_share_four_vertex_pairs() {
        let k = RectKernel::new();
        let root = k.make_compound(&[
            cube_at(0.0, 0.0, 0.0, 2.0),
            cube_at(2.0, 0.0, 0.0, 2.0),
        ]);
        let origin = detect(&k, &root, 0.001).unwrap();

        let vertex_clusters: Vec<_> = kinds(&origin, ShapeKind::Vertex).collect();
        assert_eq!(vertex_clusters.len(), 4);
        assert!(vertex_clusters.iter().all(|(_, m)| m.len() == 2));

        let edge_clusters: Vec<_> = kinds(&origin, ShapeKind::Edge).collect();
        assert_eq!(edge_clusters.len(), 4);

        let face_clusters: Vec<_> = kinds(&origin, ShapeKind::Face).collect();
        assert_eq!(face_clusters.len(), 1);
        assert_eq!(face_clusters[0].1.len(), 2);
    }

    #[test]
    fn distant_cubes_produce_no_clusters() {
        let k = RectKernel::new();
        let root = k.make_compound(&[
            cube_at(0.0, 0.0, 0.0, 2.0),
            cube_at(10.0, 0.0, 0.0, 2.0),
        ]);
        let origin = detect(&k, &root, 0.001).unwrap();
        assert!(origin.is_empty());
    }

    #[test]
    fn corner_touching_cubes_share_one_vertex() {
        let k = RectKernel::new();
        let root = k.make_compound(&[
            cube_at(0.0, 0.0, 0.0, 1.0),
            cube_at(1.0, 1.0, 1.0, 1.0),
        ]);
        let origin = detect(&k, &root, 0.001).unwrap();

        let vertex_clusters: Vec<_> = kinds(&origin, ShapeKind::Vertex).collect();
        assert_eq!(vertex_clusters.len(), 1);
        assert_eq!(vertex_clusters[0].1.len(), 2);
        assert!(kinds(&origin, ShapeKind::Edge).next().is_none());
        assert!(kinds(&origin, ShapeKind::Face).next().is_none());
    }

    #[test]
    fn tolerance_bridges_small_gaps() {
        let k = RectKernel::new();
        // a 0.01 gap between the cubes
        let root = k.make_compound(&[
            cube_at(0.0, 0.0, 0.0, 2.0),
            cube_at(2.01, 0.0, 0.0, 2.0),
        ]);

        let tight = detect(&k, &root, 0.001).unwrap();
        assert!(tight.is_empty());

        let loose = detect(&k, &root, 0.1).unwrap();
        assert_eq!(kinds(&loose, ShapeKind::Vertex).count(), 4);
    }

    #[test]
    fn pass_keys_ignore_part_order() {
        let k = RectKernel::new();
        let cube = cube_at(0.0, 0.0, 0.0, 1.0);
        let verts = k.subshapes(&cube, ShapeKind::Vertex);

        let a = PassKey::new(vec![verts[0].clone(), verts[1].clone()]);
        let b = PassKey::new(vec![verts[1].clone(), verts[0].clone()]);
        assert_eq!(a, b);
        assert_eq!(a.hash, b.hash);

        let c = PassKey::new(vec![verts[0].clone(), verts[2].clone()]);
        assert_ne!(a, c);
    }

    #[test]
    fn refinement_rejects_distant_same_key_shapes() {
        // two edges between the same vertex clusters but different
        // midpoints would share a key; the projection check must split
        // them. Rect edges are straight, so exercise the projection path
        // directly instead.
        let k = RectKernel::new();
        let c1 = cube_at(0.0, 0.0, 0.0, 2.0);
        let c2 = cube_at(0.0, 0.0, 5.0, 2.0);
        let e1 = k.subshapes(&c1, ShapeKind::Edge)[0].clone();
        let e2 = k.subshapes(&c2, ShapeKind::Edge)[0].clone();
        let groups = refine_bucket(&k, &[e1, e2], 0.001).unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.len() == 1));
    }
}
