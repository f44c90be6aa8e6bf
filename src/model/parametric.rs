//! Parametric instances and parameter substitution.

use std::collections::BTreeMap;

use crate::algebra::Function;
use crate::error::{ModelError, Result};
use crate::eval::State;
use crate::model::{Constraint, DecisionVariable, Instance, Parameter, RemovedConstraint, Sense};

/// An [`Instance`] with free parameters.
///
/// Parameters share the id space of decision variables; the objective and
/// constraints may reference them. [`with_parameters`](Self::with_parameters)
/// substitutes every parameter to a concrete value and yields a plain
/// instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParametricInstance {
    pub(crate) sense: Sense,
    pub(crate) objective: Function,
    pub(crate) decision_variables: BTreeMap<u64, DecisionVariable>,
    pub(crate) parameters: BTreeMap<u64, Parameter>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) removed_constraints: Vec<RemovedConstraint>,
    pub(crate) decision_variable_dependency: BTreeMap<u64, Function>,
}

impl ParametricInstance {
    /// Builds a parametric instance, validating that variable and
    /// parameter ids are jointly unique and that every referenced id is
    /// declared on one side or the other.
    pub fn from_components(
        sense: Sense,
        objective: Function,
        decision_variables: Vec<DecisionVariable>,
        parameters: Vec<Parameter>,
        constraints: Vec<Constraint>,
    ) -> Result<Self> {
        // Reuse the instance-side validation for variables/constraints;
        // functions may also reference parameter ids, checked below.
        let mut variable_map = BTreeMap::new();
        for v in decision_variables {
            if v.bound.lower > v.bound.upper {
                return Err(ModelError::InvalidBound {
                    id: v.id,
                    lower: v.bound.lower,
                    upper: v.bound.upper,
                });
            }
            if variable_map.insert(v.id, v.clone()).is_some() {
                return Err(ModelError::DuplicateId(v.id));
            }
        }
        let mut parameter_map = BTreeMap::new();
        for p in parameters {
            if variable_map.contains_key(&p.id) {
                return Err(ModelError::DuplicateId(p.id));
            }
            if parameter_map.insert(p.id, p.clone()).is_some() {
                return Err(ModelError::DuplicateId(p.id));
            }
        }
        let mut constraint_ids = std::collections::BTreeSet::new();
        for c in &constraints {
            if !constraint_ids.insert(c.id) {
                return Err(ModelError::DuplicateConstraintId(c.id));
            }
        }
        let pi = Self {
            sense,
            objective,
            decision_variables: variable_map,
            parameters: parameter_map,
            constraints,
            removed_constraints: Vec::new(),
            decision_variable_dependency: BTreeMap::new(),
        };
        let mut referenced = pi.objective.used_variable_ids();
        for c in &pi.constraints {
            referenced.extend(c.function.used_variable_ids());
        }
        for id in referenced {
            if !pi.decision_variables.contains_key(&id) && !pi.parameters.contains_key(&id) {
                return Err(ModelError::UnknownVariable(id));
            }
        }
        Ok(pi)
    }

    /// Declared parameters in ascending id order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    /// Looks up a parameter by id.
    pub fn get_parameter(&self, id: u64) -> Result<&Parameter> {
        self.parameters
            .get(&id)
            .ok_or(ModelError::UnknownParameter(id))
    }

    /// Active constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Removed constraints.
    pub fn removed_constraints(&self) -> &[RemovedConstraint] {
        &self.removed_constraints
    }

    /// The objective function.
    pub fn objective(&self) -> &Function {
        &self.objective
    }

    /// Substitutes every parameter id with its value and yields a plain
    /// instance.
    ///
    /// Fails with [`ModelError::MissingAssignment`] if a parameter id
    /// referenced by any function is absent from `values`. Entries for ids
    /// that are not parameters are ignored.
    pub fn with_parameters(&self, values: &State) -> Result<Instance> {
        // Substitute parameter ids only.
        let substitution = State::from_iter(
            values
                .entries
                .iter()
                .filter(|(id, _)| self.parameters.contains_key(id))
                .map(|(&id, &v)| (id, v)),
        );
        let mut functions = vec![&self.objective];
        functions.extend(self.constraints.iter().map(|c| &c.function));
        functions.extend(self.removed_constraints.iter().map(|rc| &rc.constraint.function));
        for f in &functions {
            for id in f.used_variable_ids() {
                if self.parameters.contains_key(&id) && !substitution.contains(id) {
                    return Err(ModelError::MissingAssignment(id));
                }
            }
        }

        let (objective, _) = self.objective.partial_evaluate(&substitution)?;
        let mut constraints = self.constraints.clone();
        for c in &mut constraints {
            let (f, _) = c.function.partial_evaluate(&substitution)?;
            c.function = f;
        }
        let mut removed_constraints = self.removed_constraints.clone();
        for rc in &mut removed_constraints {
            let (f, _) = rc.constraint.function.partial_evaluate(&substitution)?;
            rc.constraint.function = f;
        }
        Ok(Instance {
            sense: self.sense,
            objective,
            decision_variables: self.decision_variables.clone(),
            constraints,
            removed_constraints,
            decision_variable_dependency: self.decision_variable_dependency.clone(),
        })
    }

    /// The smallest id strictly greater than every declared variable and
    /// parameter id.
    pub(crate) fn next_free_id(&self) -> u64 {
        let max_variable = self.decision_variables.keys().next_back().copied();
        let max_parameter = self.parameters.keys().next_back().copied();
        match max_variable.max(max_parameter) {
            Some(id) => id + 1,
            None => 0,
        }
    }
}
