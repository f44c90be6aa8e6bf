//! The `Instance` problem graph.

use std::collections::{BTreeMap, BTreeSet};

use crate::algebra::Function;
use crate::bound::Bound;
use crate::error::{ModelError, Result};
use crate::eval::State;
use crate::model::{Constraint, DecisionVariable, Kind, RemovedConstraint};

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sense {
    /// Minimize the objective.
    Minimize,
    /// Maximize the objective.
    Maximize,
}

/// An explicit, value-owned source of fresh constraint ids.
///
/// Replaces a process-wide counter: each builder owns its own allocator,
/// so construction is deterministic and instances can be built on separate
/// threads without sharing state.
///
/// This is a model-building convenience for callers assembling the
/// constraint list passed to [`Instance::from_components`]; the
/// reformulation operations never create new constraints, so nothing
/// inside the crate allocates from it.
///
/// # Examples
///
/// ```
/// use quboform::model::ConstraintIdAllocator;
///
/// let mut ids = ConstraintIdAllocator::new();
/// assert_eq!(ids.allocate(), 0);
/// assert_eq!(ids.allocate(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConstraintIdAllocator {
    next: u64,
}

impl ConstraintIdAllocator {
    /// Starts allocating from 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts allocating from `next`.
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Returns the next id and advances.
    pub fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// A mixed-integer polynomial optimization problem.
///
/// Constructed once from components, then mutated in place by the
/// reformulation operations in [`crate::reform`]. Every mutating operation
/// is atomic: on failure the instance is left unchanged.
///
/// # Examples
///
/// ```
/// use quboform::algebra::Function;
/// use quboform::model::{Constraint, DecisionVariable, Instance, Sense};
///
/// let x: Vec<_> = (0..2).map(DecisionVariable::binary).collect();
/// let objective = Function::variable(0).add(Function::variable(1));
/// let budget = Constraint::less_than_or_equal_to_zero(
///     0,
///     Function::linear([(0, 1.0), (1, 1.0)].into(), -1.0),
/// );
/// let instance = Instance::from_components(
///     Sense::Maximize,
///     objective,
///     x,
///     vec![budget],
/// ).unwrap();
/// assert_eq!(instance.constraints().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instance {
    pub(crate) sense: Sense,
    pub(crate) objective: Function,
    pub(crate) decision_variables: BTreeMap<u64, DecisionVariable>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) removed_constraints: Vec<RemovedConstraint>,
    /// Affine reconstruction formula per variable eliminated by
    /// log-encoding; consulted by evaluation.
    pub(crate) decision_variable_dependency: BTreeMap<u64, Function>,
}

impl Instance {
    /// Builds an instance, validating its invariants: unique variable ids,
    /// `lower <= upper` on every bound, unique constraint ids, and every
    /// id referenced by the objective or a constraint declared.
    pub fn from_components(
        sense: Sense,
        objective: Function,
        decision_variables: Vec<DecisionVariable>,
        constraints: Vec<Constraint>,
    ) -> Result<Self> {
        let mut variables = BTreeMap::new();
        for v in decision_variables {
            if v.bound.lower > v.bound.upper {
                return Err(ModelError::InvalidBound {
                    id: v.id,
                    lower: v.bound.lower,
                    upper: v.bound.upper,
                });
            }
            if variables.insert(v.id, v.clone()).is_some() {
                return Err(ModelError::DuplicateId(v.id));
            }
        }
        let mut constraint_ids = BTreeSet::new();
        for c in &constraints {
            if !constraint_ids.insert(c.id) {
                return Err(ModelError::DuplicateConstraintId(c.id));
            }
        }
        let instance = Self {
            sense,
            objective,
            decision_variables: variables,
            constraints,
            removed_constraints: Vec::new(),
            decision_variable_dependency: BTreeMap::new(),
        };
        for id in instance.referenced_ids() {
            if !instance.decision_variables.contains_key(&id) {
                return Err(ModelError::UnknownVariable(id));
            }
        }
        Ok(instance)
    }

    /// The trivial empty minimization instance: zero objective, no
    /// variables, no constraints.
    pub fn empty() -> Self {
        Self {
            sense: Sense::Minimize,
            objective: Function::constant(0.0),
            decision_variables: BTreeMap::new(),
            constraints: Vec::new(),
            removed_constraints: Vec::new(),
            decision_variable_dependency: BTreeMap::new(),
        }
    }

    /// Optimization direction.
    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// The objective function.
    pub fn objective(&self) -> &Function {
        &self.objective
    }

    /// Decision variables in ascending id order.
    pub fn decision_variables(&self) -> impl Iterator<Item = &DecisionVariable> {
        self.decision_variables.values()
    }

    /// Active constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Removed constraints.
    pub fn removed_constraints(&self) -> &[RemovedConstraint] {
        &self.removed_constraints
    }

    /// Reconstruction formulas for variables eliminated by log-encoding.
    pub fn decision_variable_dependency(&self) -> &BTreeMap<u64, Function> {
        &self.decision_variable_dependency
    }

    /// Looks up a decision variable by id.
    pub fn get_decision_variable(&self, id: u64) -> Result<&DecisionVariable> {
        self.decision_variables
            .get(&id)
            .ok_or(ModelError::UnknownVariable(id))
    }

    /// Looks up an active constraint by id.
    pub fn get_constraint(&self, id: u64) -> Result<&Constraint> {
        self.constraints
            .iter()
            .find(|c| c.id == id)
            .ok_or(ModelError::UnknownConstraint(id))
    }

    /// Looks up a removed constraint by id.
    pub fn get_removed_constraint(&self, id: u64) -> Result<&RemovedConstraint> {
        self.removed_constraints
            .iter()
            .find(|rc| rc.id() == id)
            .ok_or(ModelError::UnknownRemovedConstraint(id))
    }

    /// Ids referenced by the objective or any active constraint.
    pub fn used_decision_variable_ids(&self) -> BTreeSet<u64> {
        let mut ids = self.objective.used_variable_ids();
        for c in &self.constraints {
            ids.extend(c.function.used_variable_ids());
        }
        ids
    }

    /// Ids of variables of the given kind, ascending.
    pub fn variable_ids_of_kind(&self, kind: Kind) -> Vec<u64> {
        self.decision_variables
            .values()
            .filter(|v| v.kind == kind)
            .map(|v| v.id)
            .collect()
    }

    /// Moves an active constraint to the removed set with a reason.
    ///
    /// The payload is preserved and can be brought back by
    /// [`restore_constraint`](Self::restore_constraint).
    pub fn relax_constraint(
        &mut self,
        constraint_id: u64,
        reason: impl Into<String>,
        parameters: BTreeMap<String, String>,
    ) -> Result<()> {
        let index = self
            .constraints
            .iter()
            .position(|c| c.id == constraint_id)
            .ok_or(ModelError::UnknownConstraint(constraint_id))?;
        let constraint = self.constraints.remove(index);
        self.removed_constraints
            .push(RemovedConstraint::new(constraint, reason).with_reason_parameters(parameters));
        Ok(())
    }

    /// Moves a removed constraint back to the active set, dropping the
    /// removal reason and its parameters.
    pub fn restore_constraint(&mut self, constraint_id: u64) -> Result<()> {
        let index = self
            .removed_constraints
            .iter()
            .position(|rc| rc.id() == constraint_id)
            .ok_or(ModelError::UnknownRemovedConstraint(constraint_id))?;
        let removed = self.removed_constraints.remove(index);
        self.constraints.push(removed.constraint);
        Ok(())
    }

    /// Substitutes a partial assignment into the objective and every
    /// active and removed constraint, returning the reduced instance.
    /// Each assigned variable records its `substituted_value`.
    pub fn partial_evaluate(&self, state: &State) -> Result<Instance> {
        let mut reduced = self.clone();
        let (objective, _) = self.objective.partial_evaluate(state)?;
        reduced.objective = objective;
        for c in &mut reduced.constraints {
            let (f, _) = c.function.partial_evaluate(state)?;
            c.function = f;
        }
        for rc in &mut reduced.removed_constraints {
            let (f, _) = rc.constraint.function.partial_evaluate(state)?;
            rc.constraint.function = f;
        }
        for (id, value) in &state.entries {
            if let Some(v) = reduced.decision_variables.get_mut(id) {
                v.substituted_value = Some(*value);
            }
        }
        Ok(reduced)
    }

    /// Embeds this instance as a parametric instance with no parameters.
    pub fn as_parametric_instance(self) -> super::ParametricInstance {
        super::ParametricInstance {
            sense: self.sense,
            objective: self.objective,
            decision_variables: self.decision_variables,
            parameters: BTreeMap::new(),
            constraints: self.constraints,
            removed_constraints: self.removed_constraints,
            decision_variable_dependency: self.decision_variable_dependency,
        }
    }

    /// The smallest id strictly greater than every declared variable id.
    /// Newly introduced variables (slack, log-encoding bits) take ids from
    /// here up, never reusing ids.
    pub(crate) fn next_variable_id(&self) -> u64 {
        self.decision_variables
            .keys()
            .next_back()
            .map(|id| id + 1)
            .unwrap_or(0)
    }

    /// Per-variable bounds for the interval engine.
    pub(crate) fn variable_bounds(&self) -> BTreeMap<u64, Bound> {
        self.decision_variables
            .iter()
            .map(|(&id, v)| (id, v.bound))
            .collect()
    }

    /// All ids referenced by the objective or any (active or removed)
    /// constraint function.
    fn referenced_ids(&self) -> BTreeSet<u64> {
        let mut ids = self.objective.used_variable_ids();
        for c in &self.constraints {
            ids.extend(c.function.used_variable_ids());
        }
        for rc in &self.removed_constraints {
            ids.extend(rc.constraint.function.used_variable_ids());
        }
        ids
    }
}
