//! Decision variables and parameters.

use crate::bound::Bound;

/// The kind of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// Takes values in `{0, 1}`.
    Binary,
    /// Takes integer values within its bound.
    Integer,
    /// Takes real values within its bound.
    Continuous,
    /// Zero or an integer within its bound.
    SemiInteger,
    /// Zero or a real within its bound.
    SemiContinuous,
}

/// A decision variable: id, kind, bound, and optional metadata.
///
/// # Examples
///
/// ```
/// use quboform::model::{DecisionVariable, Kind};
///
/// let x = DecisionVariable::integer(0, 0.0, 3.0)
///     .with_name("x")
///     .with_subscripts(vec![0]);
/// assert_eq!(x.kind, Kind::Integer);
/// assert_eq!(x.bound.upper, 3.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecisionVariable {
    /// Unique id within an instance.
    pub id: u64,
    /// Variable kind.
    pub kind: Kind,
    /// Value range; binary variables are fixed to `[0, 1]`.
    pub bound: Bound,
    /// Optional name, shared by families of subscripted variables.
    pub name: Option<String>,
    /// Subscripts distinguishing variables of the same name.
    pub subscripts: Vec<i64>,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Value fixed by `partial_evaluate`, if any.
    pub substituted_value: Option<f64>,
}

impl DecisionVariable {
    fn of_kind(id: u64, kind: Kind, lower: f64, upper: f64) -> Self {
        Self {
            id,
            kind,
            bound: Bound::new(lower, upper),
            name: None,
            subscripts: Vec::new(),
            description: None,
            substituted_value: None,
        }
    }

    /// A binary variable with bound `[0, 1]`.
    pub fn binary(id: u64) -> Self {
        Self::of_kind(id, Kind::Binary, 0.0, 1.0)
    }

    /// An integer variable with the given bound.
    pub fn integer(id: u64, lower: f64, upper: f64) -> Self {
        Self::of_kind(id, Kind::Integer, lower, upper)
    }

    /// A continuous variable with the given bound.
    pub fn continuous(id: u64, lower: f64, upper: f64) -> Self {
        Self::of_kind(id, Kind::Continuous, lower, upper)
    }

    /// A semi-integer variable with the given bound.
    pub fn semi_integer(id: u64, lower: f64, upper: f64) -> Self {
        Self::of_kind(id, Kind::SemiInteger, lower, upper)
    }

    /// A semi-continuous variable with the given bound.
    pub fn semi_continuous(id: u64, lower: f64, upper: f64) -> Self {
        Self::of_kind(id, Kind::SemiContinuous, lower, upper)
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
}

/// A parameter: shaped like a variable but never solved for. Present only
/// in a [`ParametricInstance`](crate::model::ParametricInstance) and
/// substituted to a concrete number to yield a plain instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    /// Unique id, sharing the id space of decision variables.
    pub id: u64,
    /// Optional name.
    pub name: Option<String>,
    /// Subscripts distinguishing parameters of the same name.
    pub subscripts: Vec<i64>,
    /// Optional free-form description.
    pub description: Option<String>,
}

impl Parameter {
    /// Creates a parameter with the given id.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            name: None,
            subscripts: Vec::new(),
            description: None,
        }
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_bound_is_fixed() {
        let b = DecisionVariable::binary(4);
        assert_eq!(b.bound, Bound::new(0.0, 1.0));
        assert_eq!(b.kind, Kind::Binary);
    }

    #[test]
    fn test_builder_metadata() {
        let x = DecisionVariable::integer(1, -2.0, 2.0)
            .with_name("y")
            .with_subscripts(vec![1, 2])
            .with_description("row choice");
        assert_eq!(x.name.as_deref(), Some("y"));
        assert_eq!(x.subscripts, [1, 2]);
        assert!(x.substituted_value.is_none());
    }
}
