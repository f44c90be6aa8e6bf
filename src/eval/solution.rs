//! Evaluating an instance against a single assignment.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ModelError, Result};
use crate::eval::State;
use crate::model::{Constraint, DecisionVariable, Equality, Instance, Sense};

/// Absolute tolerance for constraint feasibility: an equality holds when
/// `|g| <= ATOL`, an inequality when `g <= ATOL`.
pub(crate) const FEASIBILITY_ATOL: f64 = 1e-6;

/// A constraint's value under one assignment, with enough metadata to
/// report it without going back to the instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluatedConstraint {
    /// Constraint id.
    pub id: u64,
    /// Comparison kind of the originating constraint.
    pub equality: Equality,
    /// Value of the left-hand side.
    pub evaluated_value: f64,
    /// Ids the left-hand side actually used.
    pub used_decision_variable_ids: BTreeSet<u64>,
    /// Name copied from the constraint.
    pub name: Option<String>,
    /// Subscripts copied from the constraint.
    pub subscripts: Vec<i64>,
    /// Set when the constraint was in the removed set.
    pub removed_reason: Option<String>,
}

impl EvaluatedConstraint {
    fn from_constraint(constraint: &Constraint, state: &State) -> Result<Self> {
        let (evaluated_value, used) = constraint.function.evaluate(state)?;
        Ok(Self {
            id: constraint.id,
            equality: constraint.equality,
            evaluated_value,
            used_decision_variable_ids: used,
            name: constraint.name.clone(),
            subscripts: constraint.subscripts.clone(),
            removed_reason: None,
        })
    }

    /// Whether the value satisfies the comparison within the tolerance.
    pub fn is_feasible(&self) -> bool {
        match self.equality {
            Equality::EqualToZero => self.evaluated_value.abs() <= FEASIBILITY_ATOL,
            Equality::LessThanOrEqualToZero => self.evaluated_value <= FEASIBILITY_ATOL,
        }
    }
}

/// The result of evaluating an [`Instance`] against one assignment.
///
/// Holds the completed assignment (including values reconstructed for
/// log-encoded variables), the objective value, every constraint's value,
/// and the two feasibility flags.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    pub(crate) sense: Sense,
    pub(crate) state: State,
    pub(crate) objective: f64,
    pub(crate) decision_variables: BTreeMap<u64, DecisionVariable>,
    pub(crate) evaluated_constraints: Vec<EvaluatedConstraint>,
    pub(crate) feasible_relaxed: bool,
    pub(crate) feasible_unrelaxed: bool,
}

impl Solution {
    /// The optimization direction of the evaluated instance.
    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// The objective value.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// The completed assignment, including reconstructed values for
    /// log-encoded variables.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Every evaluated constraint, active ones first, then removed ones.
    pub fn evaluated_constraints(&self) -> &[EvaluatedConstraint] {
        &self.evaluated_constraints
    }

    /// Feasibility over all constraints, removed ones included. Alias for
    /// [`feasible_unrelaxed`](Self::feasible_unrelaxed).
    pub fn feasible(&self) -> bool {
        self.feasible_unrelaxed
    }

    /// Feasibility over the active constraints only.
    pub fn feasible_relaxed(&self) -> bool {
        self.feasible_relaxed
    }

    /// Feasibility over active and removed constraints.
    pub fn feasible_unrelaxed(&self) -> bool {
        self.feasible_unrelaxed
    }

    /// Values of all decision variables sharing `name`, keyed by their
    /// subscripts. Fails if two of them carry the same subscripts, or if
    /// one of them has no value in the assignment.
    pub fn extract_decision_variables(&self, name: &str) -> Result<BTreeMap<Vec<i64>, f64>> {
        let mut out = BTreeMap::new();
        for v in self.decision_variables.values() {
            if v.name.as_deref() != Some(name) {
                continue;
            }
            let value = self
                .state
                .get(v.id)
                .ok_or(ModelError::MissingAssignment(v.id))?;
            if out.insert(v.subscripts.clone(), value).is_some() {
                return Err(ModelError::DuplicateSubscripts(v.subscripts.clone()));
            }
        }
        Ok(out)
    }

    /// Values of all constraints sharing `name`, keyed by their
    /// subscripts. Fails on duplicate subscripts.
    pub fn extract_constraints(&self, name: &str) -> Result<BTreeMap<Vec<i64>, f64>> {
        let mut out = BTreeMap::new();
        for c in &self.evaluated_constraints {
            if c.name.as_deref() != Some(name) {
                continue;
            }
            if out.insert(c.subscripts.clone(), c.evaluated_value).is_some() {
                return Err(ModelError::DuplicateSubscripts(c.subscripts.clone()));
            }
        }
        Ok(out)
    }
}

impl Instance {
    /// Evaluates the instance against an assignment.
    ///
    /// Variables eliminated by log-encoding need not appear in `state`:
    /// their values are reconstructed from the encoded bits through the
    /// recorded affine formulas before anything else is evaluated. Fails
    /// with [`ModelError::MissingAssignment`] naming the smallest missing
    /// id if a referenced variable has no value.
    pub fn evaluate(&self, state: &State) -> Result<Solution> {
        let mut completed = state.clone();
        for (&id, formula) in &self.decision_variable_dependency {
            let (value, _) = formula.evaluate(state)?;
            completed.set(id, value);
        }

        let (objective, _) = self.objective.evaluate(&completed)?;
        let mut evaluated = Vec::with_capacity(
            self.constraints.len() + self.removed_constraints.len(),
        );
        for c in &self.constraints {
            evaluated.push(EvaluatedConstraint::from_constraint(c, &completed)?);
        }
        let feasible_relaxed = evaluated.iter().all(EvaluatedConstraint::is_feasible);
        let mut feasible_unrelaxed = feasible_relaxed;
        for rc in &self.removed_constraints {
            let mut e = EvaluatedConstraint::from_constraint(&rc.constraint, &completed)?;
            e.removed_reason = Some(rc.removed_reason.clone());
            feasible_unrelaxed &= e.is_feasible();
            evaluated.push(e);
        }

        Ok(Solution {
            sense: self.sense,
            state: completed,
            objective,
            decision_variables: self.decision_variables.clone(),
            evaluated_constraints: evaluated,
            feasible_relaxed,
            feasible_unrelaxed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Function;
    use std::collections::BTreeSet;

    /// max x0 + x1 s.t. x0 + x1 - 1 <= 0, over named binaries.
    fn capacity_instance() -> Instance {
        let x: Vec<_> = (0..2)
            .map(|i| {
                DecisionVariable::binary(i)
                    .with_name("x")
                    .with_subscripts(vec![i as i64])
            })
            .collect();
        Instance::from_components(
            Sense::Maximize,
            Function::linear([(0, 1.0), (1, 1.0)].into(), 0.0),
            x,
            vec![Constraint::less_than_or_equal_to_zero(
                0,
                Function::linear([(0, 1.0), (1, 1.0)].into(), -1.0),
            )
            .with_name("capacity")
            .with_subscripts(vec![0])],
        )
        .unwrap()
    }

    #[test]
    fn test_feasible_assignment() {
        let solution = capacity_instance()
            .evaluate(&State::from_iter([(0, 1.0), (1, 0.0)]))
            .unwrap();
        assert_eq!(solution.objective(), 1.0);
        assert!(solution.feasible());
        assert!(solution.feasible_relaxed());
        let c = &solution.evaluated_constraints()[0];
        assert_eq!(c.evaluated_value, 0.0);
        assert_eq!(c.used_decision_variable_ids, BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_infeasible_assignment() {
        let solution = capacity_instance()
            .evaluate(&State::from_iter([(0, 1.0), (1, 1.0)]))
            .unwrap();
        assert_eq!(solution.objective(), 2.0);
        assert!(!solution.feasible());
        assert!(!solution.feasible_relaxed());
    }

    #[test]
    fn test_relaxed_vs_unrelaxed() {
        let mut instance = capacity_instance();
        instance
            .relax_constraint(0, "manual", Default::default())
            .unwrap();
        let solution = instance
            .evaluate(&State::from_iter([(0, 1.0), (1, 1.0)]))
            .unwrap();
        // the violated constraint is no longer active
        assert!(solution.feasible_relaxed());
        assert!(!solution.feasible_unrelaxed());
        assert_eq!(
            solution.evaluated_constraints()[0].removed_reason.as_deref(),
            Some("manual")
        );
    }

    #[test]
    fn test_missing_assignment_names_smallest_id() {
        let err = capacity_instance().evaluate(&State::new()).unwrap_err();
        assert!(matches!(err, ModelError::MissingAssignment(0)));
    }

    #[test]
    fn test_log_encoded_variable_is_reconstructed() {
        let mut instance = Instance::from_components(
            Sense::Minimize,
            Function::variable(0),
            vec![DecisionVariable::integer(0, 0.0, 3.0)
                .with_name("x")
                .with_subscripts(vec![0])],
            Vec::new(),
        )
        .unwrap();
        instance.log_encode(&BTreeSet::new()).unwrap();
        // bits 1 and 2 encode x0 = b0 + 2*b1
        let solution = instance
            .evaluate(&State::from_iter([(1, 1.0), (2, 1.0)]))
            .unwrap();
        assert_eq!(solution.objective(), 3.0);
        assert_eq!(solution.state().get(0), Some(3.0));
        assert_eq!(
            solution.extract_decision_variables("x").unwrap(),
            BTreeMap::from([(vec![0], 3.0)])
        );
    }

    #[test]
    fn test_extract_constraints_by_name() {
        let solution = capacity_instance()
            .evaluate(&State::from_iter([(0, 0.0), (1, 0.0)]))
            .unwrap();
        assert_eq!(
            solution.extract_constraints("capacity").unwrap(),
            BTreeMap::from([(vec![0], -1.0)])
        );
        assert!(solution.extract_constraints("absent").unwrap().is_empty());
    }

    #[test]
    fn test_extract_duplicate_subscripts() {
        let x = vec![
            DecisionVariable::binary(0).with_name("x").with_subscripts(vec![0]),
            DecisionVariable::binary(1).with_name("x").with_subscripts(vec![0]),
        ];
        let instance = Instance::from_components(
            Sense::Minimize,
            Function::variable(0),
            x,
            Vec::new(),
        )
        .unwrap();
        let solution = instance
            .evaluate(&State::from_iter([(0, 0.0), (1, 1.0)]))
            .unwrap();
        let err = solution.extract_decision_variables("x").unwrap_err();
        assert!(matches!(err, ModelError::DuplicateSubscripts(s) if s == vec![0]));
    }
}
