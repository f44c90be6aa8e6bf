//! Assignments, solutions, and batched evaluation.
//!
//! External solvers hand back a [`State`] (or a [`Samples`] batch); the
//! instance evaluates it into a [`Solution`] (or [`SampleSet`]), filling in
//! values for variables eliminated by log-encoding.

mod sample_set;
mod solution;
mod state;

pub use sample_set::SampleSet;
pub use solution::{EvaluatedConstraint, Solution};
pub use state::{Samples, State};
