//! Constraints and removed constraints.

use std::collections::BTreeMap;

use crate::algebra::Function;

/// The comparison a constraint imposes on its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Equality {
    /// `f(x) = 0`
    EqualToZero,
    /// `f(x) <= 0`
    LessThanOrEqualToZero,
}

/// A constraint `f(x) = 0` or `f(x) <= 0` with optional metadata.
///
/// Constraints are built by the explicit constructors below; there is no
/// comparison-operator sugar. `g(x) <= c` is expressed as
/// `Constraint::less_than_or_equal_to_zero(id, g - c)` and `g(x) >= c` as
/// `Constraint::less_than_or_equal_to_zero(id, c - g)`.
///
/// # Examples
///
/// ```
/// use quboform::algebra::Function;
/// use quboform::model::Constraint;
///
/// // x0 + 2*x1 <= 5
/// let f = Function::linear([(0, 1.0), (1, 2.0)].into(), -5.0);
/// let c = Constraint::less_than_or_equal_to_zero(0, f).with_name("capacity");
/// assert_eq!(c.id, 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint {
    /// Unique id within an instance. Allocate fresh ids with
    /// [`ConstraintIdAllocator`](crate::model::ConstraintIdAllocator).
    pub id: u64,
    /// Left-hand side.
    pub function: Function,
    /// Comparison kind.
    pub equality: Equality,
    /// Optional name.
    pub name: Option<String>,
    /// Subscripts distinguishing constraints of the same name.
    pub subscripts: Vec<i64>,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Opaque key-value metadata.
    pub parameters: BTreeMap<String, String>,
}

impl Constraint {
    fn new(id: u64, function: Function, equality: Equality) -> Self {
        Self {
            id,
            function,
            equality,
            name: None,
            subscripts: Vec::new(),
            description: None,
            parameters: BTreeMap::new(),
        }
    }

    /// The constraint `f(x) = 0`.
    pub fn equal_to_zero(id: u64, function: Function) -> Self {
        Self::new(id, function, Equality::EqualToZero)
    }

    /// The constraint `f(x) <= 0`.
    pub fn less_than_or_equal_to_zero(id: u64, function: Function) -> Self {
        Self::new(id, function, Equality::LessThanOrEqualToZero)
    }

    /// Replaces the id.
    pub fn set_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the subscripts.
    pub fn with_subscripts(mut self, subscripts: Vec<i64>) -> Self {
        self.subscripts = subscripts;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Merges key-value metadata.
    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters.extend(parameters);
        self
    }
}

/// A constraint moved out of the active set, with the reason recorded.
///
/// Reasons used by the reformulation pipeline are `"trivial"`,
/// `"penalty_method"`, and `"uniform_penalty_method"`; manual relaxation
/// records whatever reason the caller supplies. Reason-specific data (such
/// as the id of the penalty-weight parameter) goes into
/// `removed_reason_parameters`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemovedConstraint {
    /// The constraint payload, preserved unchanged.
    pub constraint: Constraint,
    /// Why the constraint was removed.
    pub removed_reason: String,
    /// Reason-specific key-value data.
    pub removed_reason_parameters: BTreeMap<String, String>,
}

impl RemovedConstraint {
    /// Removes `constraint` with the given reason and no reason parameters.
    pub fn new(constraint: Constraint, reason: impl Into<String>) -> Self {
        Self {
            constraint,
            removed_reason: reason.into(),
            removed_reason_parameters: BTreeMap::new(),
        }
    }

    /// Attaches reason-specific parameters.
    pub fn with_reason_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.removed_reason_parameters = parameters;
        self
    }

    /// The removed constraint's id.
    pub fn id(&self) -> u64 {
        self.constraint.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let eq = Constraint::equal_to_zero(1, Function::variable(0));
        assert_eq!(eq.equality, Equality::EqualToZero);
        let le = Constraint::less_than_or_equal_to_zero(2, Function::variable(0));
        assert_eq!(le.equality, Equality::LessThanOrEqualToZero);
    }

    #[test]
    fn test_removed_preserves_payload() {
        let c = Constraint::equal_to_zero(7, Function::variable(0)).with_name("c7");
        let removed = RemovedConstraint::new(c.clone(), "manual");
        assert_eq!(removed.id(), 7);
        assert_eq!(removed.constraint, c);
        assert_eq!(removed.removed_reason, "manual");
    }
}
