//! Driver for timeout-bounded boolean operations over a shared pave step
//!
//! Paving is the dominant cost of a pairwise boolean, often seconds per
//! pair, so the pipeline pays for it once and reuses it for every
//! follow-up operation on the same pair. [`Paving`] bundles the kernel,
//! the pave handle, and the bookkeeping the stages report upward.
use std::time::{Duration, Instant};

use crate::kernel::{BoolOk, BoolOp, Kernel, OpFailed, PaveError};

/// Wall-clock budget for one pave step
///
/// A kernel consults the deadline from its progress callback while paving;
/// once paving has completed, later operations are assumed fast and are
/// not timed. An unbounded deadline never expires.
#[derive(Copy, Clone, Debug)]
pub struct Deadline {
    start: Instant,
    expires: Option<Instant>,
}

impl Deadline {
    pub fn new(timeout: Duration) -> Self {
        let start = Instant::now();
        Self {
            start,
            expires: Some(start + timeout),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            start: Instant::now(),
            expires: None,
        }
    }

    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|e| Instant::now() >= e)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// A paved pair, ready to run boolean operations
pub struct Paving<'a, K: Kernel> {
    kernel: &'a K,
    pave: K::Pave,

    /// Fuzzy value the kernel actually applied
    pub fuzzy_value: f64,

    /// Warnings emitted by the pave step itself
    pub filler_warnings: u32,

    /// How long the pave step took
    pub pave_seconds: f64,
}

impl<'a, K: Kernel> Paving<'a, K> {
    /// Runs the pave step for `(a, b)` at the given fuzzy value
    ///
    /// Neither input is mutated, here or by any later operation; results
    /// are always fresh shapes.
    pub fn new(
        kernel: &'a K,
        a: &K::Shape,
        b: &K::Shape,
        fuzzy: f64,
        deadline: Option<&Deadline>,
    ) -> Result<Self, PaveError> {
        let paved = kernel.pave(a, b, fuzzy, deadline)?;
        Ok(Self {
            kernel,
            pave: paved.filler,
            fuzzy_value: paved.fuzzy_value,
            filler_warnings: paved.warnings,
            pave_seconds: paved.elapsed.as_secs_f64(),
        })
    }

    /// Runs one boolean operation over the shared pave
    pub fn run(&self, op: BoolOp) -> Result<BoolOk<K::Shape>, OpFailed> {
        self.kernel.boolean(&self.pave, op)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deadline_unbounded_never_expires() {
        let d = Deadline::unbounded();
        assert!(!d.expired());
    }

    #[test]
    fn deadline_zero_expires_immediately() {
        let d = Deadline::new(Duration::ZERO);
        assert!(d.expired());
    }

    #[test]
    fn deadline_tracks_elapsed() {
        let d = Deadline::new(Duration::from_secs(3600));
        assert!(!d.expired());
        assert!(d.elapsed() < Duration::from_secs(3600));
    }
}
