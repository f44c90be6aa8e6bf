//! Model entities: variables, constraints, and problem instances.
//!
//! An [`Instance`] is the mutable problem graph — decision variables, one
//! objective [`Function`](crate::algebra::Function), active constraints,
//! removed constraints, and an optimization sense. A
//! [`ParametricInstance`] additionally carries [`Parameter`]s that can be
//! substituted to concrete numbers to yield a plain [`Instance`].

mod constraint;
mod instance;
mod parametric;
mod variable;

pub use constraint::{Constraint, Equality, RemovedConstraint};
pub use instance::{ConstraintIdAllocator, Instance, Sense};
pub use parametric::ParametricInstance;
pub use variable::{DecisionVariable, Kind, Parameter};
