//! The in-memory assembly: an ordered list of solids
//!
//! The ordinal position of every solid is stable across all pipeline
//! stages: a slot may be *replaced* (by a rewritten solid, or by a
//! compound holding the original plus an imprinted fragment) but never
//! removed, reordered, or inserted before. CSV pair lists identify shapes
//! by this ordinal.
use std::path::Path;

use log::{debug, warn};

use crate::kernel::{Kernel, Shape, ShapeKind};
use crate::Error;

/// Ordered collection of solids, loaded from and stored to the kernel's
/// native serialization
pub struct Document<K: Kernel> {
    solids: Vec<K::Shape>,
}

impl<K: Kernel> Document<K> {
    /// Builds a document directly from solids (mostly for tests and
    /// in-process pipelines)
    pub fn from_solids(solids: Vec<K::Shape>) -> Self {
        Self { solids }
    }

    /// Reads an assembly file
    ///
    /// The top-level shape must be a COMPOUND or COMPSOLID; its immediate
    /// children (the document slots, in order) must be SOLIDs,
    /// COMPSOLIDs, or COMPOUNDs.
    pub fn load(kernel: &K, path: &Path) -> Result<Self, Error> {
        debug!("reading assembly from {}", path.display());
        let top = kernel.read_native(path)?;
        match top.kind() {
            ShapeKind::Compound | ShapeKind::CompSolid => (),
            kind => return Err(Error::BadTopLevelShape(kind)),
        }

        let children = top.children();
        debug!("expecting {} solid shapes", children.len());
        for child in &children {
            match child.kind() {
                ShapeKind::Compound | ShapeKind::CompSolid | ShapeKind::Solid => (),
                kind => return Err(Error::BadChildShape(kind)),
            }
        }
        Ok(Self { solids: children })
    }

    /// Writes the document as a single compound
    pub fn write(&self, kernel: &K, path: &Path) -> Result<(), Error> {
        debug!(
            "merging {} shapes for writing to {}",
            self.solids.len(),
            path.display()
        );
        let merged = kernel.make_compound(&self.solids);
        kernel.write_native(&merged, path)
    }

    pub fn len(&self) -> usize {
        self.solids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    pub fn solid(&self, i: usize) -> &K::Shape {
        &self.solids[i]
    }

    pub fn solids(&self) -> &[K::Shape] {
        &self.solids
    }

    /// Replaces the shape in slot `i`; the slot count never changes
    pub fn replace(&mut self, i: usize, shape: K::Shape) {
        self.solids[i] = shape;
    }

    /// Parses a shape ordinal, accepting only in-range non-negative
    /// integers
    pub fn lookup_solid(&self, s: &str) -> Option<usize> {
        let idx: usize = s.trim().parse().ok()?;
        (idx < self.solids.len()).then_some(idx)
    }

    /// Counts invalid shapes, logging the defects the kernel reports
    ///
    /// Validity never changes control flow in the pipeline itself; callers
    /// that require valid input check this before starting.
    pub fn count_invalid(&self, kernel: &K) -> usize {
        let mut num_invalid = 0;
        for (i, shape) in self.solids.iter().enumerate() {
            debug!("checking shape {i}");
            let defects = kernel.validity_defects(shape);
            if !defects.is_empty() {
                warn!("shape {i} contains defects: {}", defects.join(", "));
                num_invalid += 1;
            }
        }
        num_invalid
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernel::rect::RectKernel;
    use nalgebra::{Point3, Vector3};

    fn cube_doc() -> (RectKernel, Document<RectKernel>) {
        let k = RectKernel::new();
        let doc = Document::from_solids(vec![
            k.make_box(Point3::new(0.0, 0.0, 0.0), Vector3::new(5.0, 5.0, 5.0)),
            k.make_box(Point3::new(5.0, 0.0, 0.0), Vector3::new(5.0, 5.0, 5.0)),
        ]);
        (k, doc)
    }

    #[test]
    fn load_store_round_trip() {
        let (k, doc) = cube_doc();
        let dir = std::env::temp_dir().join("brepmend-document");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("doc.brep");
        doc.write(&k, &path).unwrap();

        let back = Document::load(&k, &path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(k.volume_raw(back.solid(0)), 125.0);
    }

    #[test]
    fn lookup_validates_range() {
        let (_, doc) = cube_doc();
        assert_eq!(doc.lookup_solid("0"), Some(0));
        assert_eq!(doc.lookup_solid(" 1 "), Some(1));
        assert_eq!(doc.lookup_solid("2"), None);
        assert_eq!(doc.lookup_solid("-1"), None);
        assert_eq!(doc.lookup_solid("zzz"), None);
        assert_eq!(doc.lookup_solid(""), None);
    }

    #[test]
    fn valid_shapes_count_clean() {
        let (k, doc) = cube_doc();
        assert_eq!(doc.count_invalid(&k), 0);
    }
}
