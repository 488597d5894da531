//! Topology rebuild: replace coincident sub-shapes with their
//! representatives, bottom-up
//!
//! The rebuild runs in a fixed order (vertices, edges, faces with their
//! wires, shells, solids, compsolids, compounds) so
//! that by the time a container is reassembled, every affected child
//! already has a replacement. Only shapes whose transitive closure holds a
//! cluster-bound sub-shape are rebuilt; everything else is reused as-is.
use std::collections::HashMap;

use log::{info, warn};

use crate::kernel::{Kernel, Orientation, Shape, ShapeKind};
use crate::merge::origin::Origin;
use crate::Error;

pub struct Rebuilder<'a, K: Kernel> {
    kernel: &'a K,
    detected: &'a Origin<K::Shape>,

    /// original (or cluster member) -> rebuilt shape
    replacements: HashMap<K::Shape, K::Shape>,

    affected_memo: HashMap<K::Shape, bool>,
}

impl<'a, K: Kernel> Rebuilder<'a, K> {
    pub fn new(kernel: &'a K, detected: &'a Origin<K::Shape>) -> Self {
        Self {
            kernel,
            detected,
            replacements: HashMap::new(),
            affected_memo: HashMap::new(),
        }
    }

    /// Rebuilds the assembly, mapping the root's children 1:1 into a new
    /// compound
    pub fn perform(mut self, root: &K::Shape) -> Result<K::Shape, Error> {
        self.fill_vertices();
        info!("vertex rebuild done");
        self.fill_shapes(root, ShapeKind::Edge)?;
        info!("edge rebuild done");
        self.fill_shapes(root, ShapeKind::Face)?;
        info!("face rebuild done");
        self.fill_containers(root, ShapeKind::Shell)?;
        self.fill_containers(root, ShapeKind::Solid)?;
        self.fill_containers(root, ShapeKind::CompSolid)?;
        info!("container rebuild done");
        self.fill_compounds(root)?;

        let children: Vec<K::Shape> = root
            .children()
            .into_iter()
            .map(|c| match self.replacements.get(&c) {
                Some(repl) => repl.oriented(c.orientation()),
                None => c,
            })
            .collect();
        Ok(self.kernel.make_compound(&children))
    }

    /// Does this shape transitively contain anything that was replaced?
    fn affected(&mut self, shape: &K::Shape) -> bool {
        if let Some(&hit) = self.affected_memo.get(shape) {
            return hit;
        }
        let hit = shape
            .children()
            .into_iter()
            .any(|c| self.replacements.contains_key(&c) || self.affected(&c));
        self.affected_memo.insert(shape.clone(), hit);
        hit
    }

    /// Gives every vertex cluster a single averaged vertex
    fn fill_vertices(&mut self) {
        for (rep, members) in self.detected.clusters() {
            if rep.kind() != ShapeKind::Vertex {
                continue;
            }
            let merged = self.kernel.merged_vertex(members);
            for m in members {
                self.replacements.insert(m.clone(), merged.clone());
            }
        }
    }

    /// Rebuilds affected edges or faces, binding every cluster member to
    /// the shared rebuilt shape
    fn fill_shapes(&mut self, root: &K::Shape, kind: ShapeKind) -> Result<(), Error> {
        for original in self.kernel.subshapes(root, kind) {
            if self.replacements.contains_key(&original) {
                continue;
            }
            let in_cluster = self.detected.contains(&original);
            if !in_cluster && !self.affected(&original) {
                continue;
            }

            let replacement = match kind {
                ShapeKind::Edge => self.copy_edge(&original)?,
                ShapeKind::Face => self.copy_face(&original)?,
                kind => return Err(Error::BadContainer(kind)),
            };

            if in_cluster {
                for member in self.detected.members_of(&original).unwrap_or_default() {
                    self.replacements
                        .insert(member.clone(), replacement.clone());
                }
            } else {
                self.replacements.insert(original, replacement);
            }
        }
        Ok(())
    }

    /// New edge on the source geometry with replaced end vertices;
    /// parameter ranges and degeneracy are the kernel's business
    fn copy_edge(&mut self, edge: &K::Shape) -> Result<K::Shape, Error> {
        let source = edge.oriented(Orientation::Forward);
        let (v1, v2) = self.kernel.edge_vertices(&source);
        let v1 = self.replacements.get(&v1).unwrap_or(&v1).clone();
        let v2 = self.replacements.get(&v2).unwrap_or(&v2).clone();
        self.kernel.remake_edge(&source, &v1, &v2)
    }

    /// New face from the source surface, with affected wires rebuilt
    /// edge-by-edge
    fn copy_face(&mut self, face: &K::Shape) -> Result<K::Shape, Error> {
        let source = face.oriented(Orientation::Forward);
        let result = self.kernel.begin_face(&source);
        let periodic = self.kernel.is_periodic_surface(&source);
        let (u_min, u_max, _, _) = self.kernel.uv_bounds(&source);

        for wire in source.children() {
            if !self.affected(&wire) {
                self.kernel.add_child(&result, &wire);
                continue;
            }

            let rebuilt = self.kernel.empty_container_like(&wire)?;
            for orig_edge in wire.children() {
                let edge = self
                    .replacements
                    .get(&orig_edge)
                    .unwrap_or(&orig_edge)
                    .clone();

                if self.kernel.is_degenerate(&edge) {
                    self.kernel
                        .add_child(&rebuilt, &edge.oriented(orig_edge.orientation()));
                    continue;
                }

                let edge_fwd = edge.oriented(Orientation::Forward);
                let orig_fwd = orig_edge.oriented(Orientation::Forward);

                // a replacement edge can come with a pcurve whose range
                // reflects a different period of the surface
                if periodic && !self.kernel.pcurve_in_bounds(&edge_fwd, &source, u_min, u_max) {
                    self.kernel.clear_pcurve(&edge_fwd, &source);
                }
                if !self.fit_pcurve(&orig_fwd, &edge_fwd, &source)? {
                    warn!("dropping an edge that would not take a pcurve");
                    continue;
                }

                let mut placed = edge.oriented(orig_edge.orientation());
                if self.kernel.is_split_reversed(&edge_fwd, &orig_fwd) {
                    placed = placed.reversed();
                }
                self.kernel.add_child(&rebuilt, &placed);
            }
            self.kernel
                .add_child(&result, &rebuilt.oriented(wire.orientation()));
        }
        Ok(result)
    }

    /// Existing pcurve, else one transplanted from the source edge, else
    /// one built by projection
    fn fit_pcurve(
        &self,
        orig_edge: &K::Shape,
        edge: &K::Shape,
        face: &K::Shape,
    ) -> Result<bool, Error> {
        if self.kernel.has_pcurve(edge, face) {
            return Ok(true);
        }
        if self.kernel.attach_pcurve(orig_edge, edge, face) {
            return Ok(true);
        }
        match self.kernel.build_pcurve(edge, face) {
            Ok(()) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    /// Reassembles shells, solids, and compsolids whose children changed
    fn fill_containers(&mut self, root: &K::Shape, kind: ShapeKind) -> Result<(), Error> {
        for original in self.kernel.subshapes(root, kind) {
            if !self.affected(&original) {
                continue;
            }
            let rebuilt = self.kernel.empty_container_like(&original)?;
            for child in original.children() {
                match self.replacements.get(&child) {
                    Some(repl) => {
                        let mut placed = repl.oriented(child.orientation());
                        if self.kernel.is_split_reversed(&placed, &child) {
                            placed = placed.reversed();
                        }
                        self.kernel.add_child(&rebuilt, &placed);
                    }
                    None => self.kernel.add_child(&rebuilt, &child),
                }
            }
            self.replacements.insert(original, rebuilt);
        }
        Ok(())
    }

    /// Rebuilds compound children of the root, depth-first
    fn fill_compounds(&mut self, root: &K::Shape) -> Result<(), Error> {
        for child in root.children() {
            if child.kind() == ShapeKind::Compound {
                self.fill_compound(&child)?;
            }
        }
        Ok(())
    }

    fn fill_compound(&mut self, shape: &K::Shape) -> Result<(), Error> {
        if !self.affected(shape) {
            return Ok(());
        }
        let rebuilt = self.kernel.empty_container_like(shape)?;
        for child in shape.children() {
            if child.kind() == ShapeKind::Compound {
                self.fill_compound(&child)?;
            }
            match self.replacements.get(&child) {
                Some(repl) => self
                    .kernel
                    .add_child(&rebuilt, &repl.oriented(child.orientation())),
                None => self.kernel.add_child(&rebuilt, &child),
            }
        }
        self.replacements.insert(shape.clone(), rebuilt);
        Ok(())
    }
}
