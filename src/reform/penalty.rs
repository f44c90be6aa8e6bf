//! Penalty reformulations: constraints become weighted squared terms of
//! the objective, with the weights left as free parameters.

use std::collections::BTreeMap;

use crate::algebra::Function;
use crate::model::{Instance, Parameter, ParametricInstance};

/// Per-constraint penalty-weight parameter name.
pub(crate) const PENALTY_WEIGHT_NAME: &str = "penalty_weight";
/// The single shared weight parameter name.
pub(crate) const UNIFORM_PENALTY_WEIGHT_NAME: &str = "uniform_penalty_weight";

impl Instance {
    /// Converts every active constraint `f_i` into a penalty term
    /// `p_i * f_i(x)^2` added to the objective, with one fresh weight
    /// parameter `p_i` per constraint.
    ///
    /// Both equality and inequality constraints are squared as-is; an
    /// inequality is treated exactly like an equality here, so callers
    /// wanting exact inequality handling convert to equality with slack
    /// first. Each converted constraint moves to the removed set with
    /// reason `"penalty_method"` and its weight's id recorded under
    /// `"parameter_id"`, and each parameter is named `penalty_weight` with
    /// the constraint id as its subscript.
    pub fn penalty_method(self) -> ParametricInstance {
        let mut pi = self.as_parametric_instance();
        let mut next_id = pi.next_free_id();
        let mut objective = pi.objective.clone();
        for constraint in std::mem::take(&mut pi.constraints) {
            let parameter = Parameter::new(next_id)
                .with_name(PENALTY_WEIGHT_NAME)
                .with_subscripts(vec![constraint.id as i64]);
            objective = objective.add(
                Function::variable(next_id).mul(constraint.function.squared()),
            );
            let reason_parameters =
                BTreeMap::from([("parameter_id".to_string(), next_id.to_string())]);
            pi.removed_constraints.push(
                crate::model::RemovedConstraint::new(constraint, "penalty_method")
                    .with_reason_parameters(reason_parameters),
            );
            pi.parameters.insert(next_id, parameter);
            next_id += 1;
        }
        pi.objective = objective;
        pi
    }

    /// Like [`penalty_method`](Self::penalty_method) but with a single
    /// shared weight: the objective gains `p * sum_i f_i(x)^2` with one
    /// parameter `p` named `uniform_penalty_weight`. Constraints move to
    /// the removed set with reason `"uniform_penalty_method"` and no
    /// reason parameters.
    pub fn uniform_penalty_method(self) -> ParametricInstance {
        let mut pi = self.as_parametric_instance();
        let parameter_id = pi.next_free_id();
        let mut squared_sum = Function::constant(0.0);
        for constraint in std::mem::take(&mut pi.constraints) {
            squared_sum = squared_sum.add(constraint.function.squared());
            pi.removed_constraints.push(crate::model::RemovedConstraint::new(
                constraint,
                "uniform_penalty_method",
            ));
        }
        pi.objective = pi
            .objective
            .clone()
            .add(Function::variable(parameter_id).mul(squared_sum));
        pi.parameters.insert(
            parameter_id,
            Parameter::new(parameter_id).with_name(UNIFORM_PENALTY_WEIGHT_NAME),
        );
        pi
    }
}
