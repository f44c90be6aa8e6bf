//! Slack-based inequality conversions.

use crate::algebra::Function;
use crate::bound::function_bound;
use crate::error::{ModelError, Result};
use crate::model::{DecisionVariable, Equality, Instance, Kind};

/// Name tag given to slack variables introduced by either conversion.
pub(crate) const SLACK_NAME: &str = "ommx.slack";

impl Instance {
    /// Converts the inequality `f(x) <= 0` into the equality
    /// `a*f(x) + s = 0` with one new integer slack variable `s`.
    ///
    /// `a` is the [content factor](crate::algebra::Function::content_factor)
    /// of `f`, the minimal positive scalar making every coefficient of
    /// `a*f` integral, so the equality is exact over integer assignments.
    ///
    /// Evaluating the bound `[l, u]` of `a*f` may already settle the
    /// constraint:
    ///
    /// * `l > 0`: the constraint can never hold — fails with
    ///   [`ModelError::Infeasible`] reporting the bound.
    /// * `u <= 0`: trivially satisfied — the constraint moves to the
    ///   removed set with reason `"trivial"` and nothing is introduced.
    ///
    /// Otherwise the slack spans `[0, u - l]`; if `u - l` exceeds
    /// `max_integer_range` the call fails with
    /// [`ModelError::RangeExceeded`] and the instance is unchanged. The
    /// slack variable is named `ommx.slack` with the constraint id as its
    /// subscript.
    pub fn convert_inequality_to_equality_with_integer_slack(
        &mut self,
        constraint_id: u64,
        max_integer_range: u64,
    ) -> Result<()> {
        let constraint = self.get_constraint(constraint_id)?;
        if constraint.equality != Equality::LessThanOrEqualToZero {
            return Err(ModelError::NotInequality(constraint_id));
        }
        self.reject_continuous(&constraint.function)?;

        let factor = constraint.function.content_factor();
        let scaled = constraint.function.clone().scale(factor);
        let bound = function_bound(&scaled, &self.variable_bounds())?;
        if bound.lower > 0.0 {
            return Err(ModelError::Infeasible {
                id: constraint_id,
                lower: bound.lower,
                upper: bound.upper,
            });
        }
        if bound.upper <= 0.0 {
            return self.relax_constraint(constraint_id, "trivial", Default::default());
        }
        let range = bound.width();
        if range > max_integer_range as f64 {
            return Err(ModelError::RangeExceeded {
                id: constraint_id,
                range,
                limit: max_integer_range,
            });
        }

        // All checks passed; commit.
        let slack_id = self.next_variable_id();
        let slack = DecisionVariable::integer(slack_id, 0.0, range)
            .with_name(SLACK_NAME)
            .with_subscripts(vec![constraint_id as i64]);
        self.decision_variables.insert(slack_id, slack);
        let rewritten = scaled.add(Function::variable(slack_id));
        for c in &mut self.constraints {
            if c.id == constraint_id {
                c.function = rewritten;
                c.equality = Equality::EqualToZero;
                break;
            }
        }
        Ok(())
    }

    /// Softens the inequality `f(x) <= 0` into `f(x) + b*s <= 0` with an
    /// integer slack `s` in `[0, slack_upper_bound]`, for use when the
    /// exact conversion's slack range would be impractical.
    ///
    /// The coefficient `b` is the smallest integer letting `b*s` reach the
    /// most negative value of `f`, i.e. `ceil(-l / slack_upper_bound)`
    /// for the lower bound `l < 0`. The residual approximation error is at
    /// most `b`; a larger `slack_upper_bound` gives a smaller `b` at the
    /// cost of more slack bits. Returns `Some(b)`, or `None` when the
    /// constraint is trivially satisfied and removed without introducing
    /// anything.
    ///
    /// Bound classification (infeasible / trivial) behaves exactly as in
    /// [`convert_inequality_to_equality_with_integer_slack`](Self::convert_inequality_to_equality_with_integer_slack),
    /// but on the unscaled `f`.
    ///
    /// `slack_upper_bound` must be positive; `0` fails with
    /// [`ModelError::ZeroSlackUpperBound`] since `b` divides by it.
    pub fn add_integer_slack_to_inequality(
        &mut self,
        constraint_id: u64,
        slack_upper_bound: u64,
    ) -> Result<Option<f64>> {
        if slack_upper_bound == 0 {
            return Err(ModelError::ZeroSlackUpperBound(constraint_id));
        }
        let constraint = self.get_constraint(constraint_id)?;
        if constraint.equality != Equality::LessThanOrEqualToZero {
            return Err(ModelError::NotInequality(constraint_id));
        }
        self.reject_continuous(&constraint.function)?;

        let bound = function_bound(&constraint.function, &self.variable_bounds())?;
        if bound.lower > 0.0 {
            return Err(ModelError::Infeasible {
                id: constraint_id,
                lower: bound.lower,
                upper: bound.upper,
            });
        }
        if bound.upper <= 0.0 {
            self.relax_constraint(constraint_id, "trivial", Default::default())?;
            return Ok(None);
        }

        let coefficient = (-bound.lower / slack_upper_bound as f64).ceil();
        let slack_id = self.next_variable_id();
        let slack = DecisionVariable::integer(slack_id, 0.0, slack_upper_bound as f64)
            .with_name(SLACK_NAME)
            .with_subscripts(vec![constraint_id as i64]);
        self.decision_variables.insert(slack_id, slack);
        let addition = Function::variable(slack_id).scale(coefficient);
        for c in &mut self.constraints {
            if c.id == constraint_id {
                c.function = c.function.clone().add(addition);
                break;
            }
        }
        Ok(Some(coefficient))
    }

    /// Fails with [`ModelError::UnsupportedVariableKind`] naming the
    /// offending ids if `function` references a continuous or
    /// semi-continuous variable.
    fn reject_continuous(&self, function: &Function) -> Result<()> {
        let ids: Vec<u64> = function
            .used_variable_ids()
            .into_iter()
            .filter(|id| {
                matches!(
                    self.decision_variables.get(id).map(|v| v.kind),
                    Some(Kind::Continuous) | Some(Kind::SemiContinuous)
                )
            })
            .collect();
        if ids.is_empty() {
            Ok(())
        } else {
            Err(ModelError::UnsupportedVariableKind { ids })
        }
    }
}
