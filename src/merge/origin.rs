//! Forward-only mapping from cluster members to their representatives
//!
//! Representatives live in an arena; members map to a representative id.
//! There are deliberately no back-pointers from representatives into the
//! shapes that elected them, so clusters can never form reference cycles.
use std::collections::HashMap;

use crate::kernel::Shape;

/// Equivalence classes of coincident sub-shapes
///
/// A sub-shape that is not in any cluster is simply absent.
pub struct Origin<S: Shape> {
    reps: Vec<S>,
    members: Vec<Vec<S>>,
    map: HashMap<S, usize>,
}

impl<S: Shape> Default for Origin<S> {
    fn default() -> Self {
        Self {
            reps: vec![],
            members: vec![],
            map: HashMap::new(),
        }
    }
}

impl<S: Shape> Origin<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a group of mutually-coincident shapes; the first member
    /// becomes the representative
    ///
    /// Shapes already bound to an earlier cluster keep their first
    /// binding.
    pub fn bind_cluster(&mut self, members: Vec<S>) {
        debug_assert!(members.len() >= 2);
        let id = self.reps.len();
        self.reps.push(members[0].clone());
        for m in &members {
            self.map.entry(m.clone()).or_insert(id);
        }
        self.members.push(members);
    }

    /// The representative for a bound shape, or `None`
    pub fn representative(&self, shape: &S) -> Option<&S> {
        self.map.get(shape).map(|&id| &self.reps[id])
    }

    /// All members of the cluster containing `shape`, or `None`
    pub fn members_of(&self, shape: &S) -> Option<&[S]> {
        self.map.get(shape).map(|&id| self.members[id].as_slice())
    }

    pub fn contains(&self, shape: &S) -> bool {
        self.map.contains_key(shape)
    }

    /// Iterates over `(representative, members)` pairs in binding order
    pub fn clusters(&self) -> impl Iterator<Item = (&S, &[S])> {
        self.reps
            .iter()
            .zip(self.members.iter().map(Vec::as_slice))
    }

    /// Number of clusters
    pub fn len(&self) -> usize {
        self.reps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }
}
