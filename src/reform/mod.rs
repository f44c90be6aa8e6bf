//! The reformulation pipeline.
//!
//! Each operation reads the current [`Instance`], applies exactly one
//! transform, and commits atomically: every fallible step runs before the
//! first field is written, so a returned error leaves the instance
//! unchanged. The `to_qubo` driver chains the single-purpose steps in a
//! fixed order on a working copy.

mod log_encode;
mod penalty;
mod qubo;
mod slack;

pub use qubo::{PuboFormat, QuboFormat, QuboOptions};

use crate::model::{Instance, Sense};

impl Instance {
    /// Converts to a minimization problem by flipping the sense and
    /// negating the objective. Returns `false` (and changes nothing) if
    /// the instance is already minimizing.
    ///
    /// Calling this and then [`as_maximization_problem`](Self::as_maximization_problem)
    /// restores the original objective exactly.
    pub fn as_minimization_problem(&mut self) -> bool {
        if self.sense == Sense::Minimize {
            return false;
        }
        self.sense = Sense::Minimize;
        self.objective = std::mem::take(&mut self.objective).neg();
        true
    }

    /// Converts to a maximization problem; the mirror image of
    /// [`as_minimization_problem`](Self::as_minimization_problem).
    pub fn as_maximization_problem(&mut self) -> bool {
        if self.sense == Sense::Maximize {
            return false;
        }
        self.sense = Sense::Maximize;
        self.objective = std::mem::take(&mut self.objective).neg();
        true
    }
}
