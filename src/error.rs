//! Domain errors for modeling and reformulation.
//!
//! All errors here are deterministic: they describe a property of the model
//! or of the requested transformation, never a transient condition. Every
//! mutating operation on an [`Instance`](crate::model::Instance) leaves the
//! instance unchanged when it returns one of these.

use thiserror::Error;

/// Errors raised by model construction, evaluation, and reformulation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A constraint `f(x) <= 0` whose evaluated bound is strictly positive
    /// can never be satisfied.
    #[error("constraint {id} is infeasible: bound of the left-hand side is [{lower}, {upper}]")]
    Infeasible { id: u64, lower: f64, upper: f64 },

    /// The integer slack required to turn an inequality into an equality
    /// would exceed the caller-supplied range limit.
    #[error("slack range {range} for constraint {id} exceeds the limit {limit}")]
    RangeExceeded { id: u64, range: f64, limit: u64 },

    /// A slack upper bound of zero leaves the slack no room to move.
    #[error("slack upper bound for constraint {0} must be positive")]
    ZeroSlackUpperBound(u64),

    /// Continuous variables appeared where only discrete kinds are supported.
    #[error("continuous variables are not supported here: ids={ids:?}")]
    UnsupportedVariableKind { ids: Vec<u64> },

    /// Mutually exclusive options were supplied together.
    #[error("conflicting options: {0}")]
    ConflictingOptions(String),

    /// A decision variable id was not found in the instance.
    #[error("decision variable {0} is not found")]
    UnknownVariable(u64),

    /// A constraint id was not found among the active constraints.
    #[error("constraint {0} is not found")]
    UnknownConstraint(u64),

    /// A constraint id was not found among the removed constraints.
    #[error("removed constraint {0} is not found")]
    UnknownRemovedConstraint(u64),

    /// A parameter id was not found in the parametric instance.
    #[error("parameter {0} is not found")]
    UnknownParameter(u64),

    /// An id referenced by a function is absent from a supplied assignment.
    #[error("variable {0} is missing from the assignment")]
    MissingAssignment(u64),

    /// The same id was declared twice while building an instance.
    #[error("duplicate id {0} among decision variables and parameters")]
    DuplicateId(u64),

    /// The same constraint id was used twice.
    #[error("duplicate constraint id {0}")]
    DuplicateConstraintId(u64),

    /// A variable bound with `lower > upper`.
    #[error("invalid bound [{lower}, {upper}] for variable {id}")]
    InvalidBound { id: u64, lower: f64, upper: f64 },

    /// The requested operation needs an inequality constraint.
    #[error("constraint {0} is not an inequality")]
    NotInequality(u64),

    /// A sample id was not found in a sample set.
    #[error("sample {0} is not found")]
    UnknownSampleId(u64),

    /// Two entries with the same name share the same subscripts, so a
    /// subscripts-keyed extraction would be ambiguous.
    #[error("duplicate subscripts {0:?}")]
    DuplicateSubscripts(Vec<i64>),

    /// Per-constraint penalty weights were supplied but one constraint has
    /// no entry.
    #[error("no penalty weight given for constraint {0}")]
    MissingPenaltyWeight(u64),

    /// QUBO extraction requires a degree <= 2 objective.
    #[error("objective degree exceeds 2; use the PUBO format instead")]
    DegreeTooHigh,

    /// QUBO/PUBO extraction requires every variable to be binary.
    #[error("non-binary variables remain: ids={ids:?}")]
    NonBinaryVariables { ids: Vec<u64> },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ModelError>;
