//! QUBO/PUBO extraction and the end-to-end conversion driver.

use std::collections::{BTreeMap, BTreeSet};

use crate::algebra::Monomial;
use crate::error::{ModelError, Result};
use crate::model::{Equality, Instance, Kind};

/// Upper-triangular quadratic coefficients keyed by `(i, j)` with
/// `i <= j`; linear terms sit on the diagonal `(i, i)`.
pub type QuboFormat = BTreeMap<(u64, u64), f64>;

/// Polynomial coefficients keyed by sorted, deduplicated variable-id
/// monomials; degree is unrestricted.
pub type PuboFormat = BTreeMap<Monomial, f64>;

/// Options for the [`to_qubo`](Instance::to_qubo) driver.
///
/// `uniform_penalty_weight` and `penalty_weights` are mutually exclusive;
/// supplying both fails with [`ModelError::ConflictingOptions`]. With
/// neither, a uniform weight of `1.0` is used.
///
/// # Examples
///
/// ```
/// use quboform::reform::QuboOptions;
///
/// let options = QuboOptions::default()
///     .with_uniform_penalty_weight(2.0)
///     .with_inequality_integer_slack_max_range(16);
/// ```
#[derive(Debug, Clone)]
pub struct QuboOptions {
    /// Single weight applied to every constraint's squared penalty.
    pub uniform_penalty_weight: Option<f64>,
    /// Per-constraint weights keyed by constraint id. Every active
    /// constraint must have an entry when this is non-empty.
    pub penalty_weights: BTreeMap<u64, f64>,
    /// Largest slack range accepted by the exact inequality conversion
    /// before falling back to the bounded-slack form.
    pub inequality_integer_slack_max_range: u64,
}

impl Default for QuboOptions {
    fn default() -> Self {
        Self {
            uniform_penalty_weight: None,
            penalty_weights: BTreeMap::new(),
            inequality_integer_slack_max_range: 32,
        }
    }
}

impl QuboOptions {
    /// Sets the shared penalty weight.
    pub fn with_uniform_penalty_weight(mut self, weight: f64) -> Self {
        self.uniform_penalty_weight = Some(weight);
        self
    }

    /// Sets per-constraint penalty weights.
    pub fn with_penalty_weights(mut self, weights: BTreeMap<u64, f64>) -> Self {
        self.penalty_weights = weights;
        self
    }

    /// Sets the slack range limit for the exact inequality conversion.
    pub fn with_inequality_integer_slack_max_range(mut self, range: u64) -> Self {
        self.inequality_integer_slack_max_range = range;
        self
    }
}

impl Instance {
    /// Reads the objective off as a QUBO coefficient map plus a constant
    /// offset. This only translates the data format: no reformulation
    /// happens, so the instance must already be unconstrained in spirit
    /// (constraints are ignored), binary, and at most quadratic. Use
    /// [`to_qubo`](Self::to_qubo) for the full pipeline.
    ///
    /// Linear terms land on the diagonal `(i, i)`, merged with `x_i^2`
    /// terms since `x^2 = x` for binary variables. Coefficients that are
    /// exactly zero are dropped.
    pub fn as_qubo_format(&self) -> Result<(QuboFormat, f64)> {
        self.check_used_variables_binary()?;
        if self.objective.degree() > 2 {
            return Err(ModelError::DegreeTooHigh);
        }
        let mut qubo = QuboFormat::new();
        let mut offset = 0.0;
        for (monomial, coefficient) in self.objective.terms() {
            match monomial.as_slice() {
                [] => offset += coefficient,
                &[i] => *qubo.entry((i, i)).or_insert(0.0) += coefficient,
                // binary idempotence folds x_i^2 onto the diagonal
                &[i, j] if i == j => *qubo.entry((i, i)).or_insert(0.0) += coefficient,
                &[i, j] => *qubo.entry((i, j)).or_insert(0.0) += coefficient,
                _ => return Err(ModelError::DegreeTooHigh),
            }
        }
        qubo.retain(|_, c| *c != 0.0);
        Ok((qubo, offset))
    }

    /// Reads the objective off as a PUBO coefficient map plus a constant
    /// offset: like [`as_qubo_format`](Self::as_qubo_format) but without
    /// the degree restriction. Repeated ids within a monomial are
    /// deduplicated by binary idempotence.
    pub fn as_pubo_format(&self) -> Result<(PuboFormat, f64)> {
        self.check_used_variables_binary()?;
        let mut pubo = PuboFormat::new();
        let mut offset = 0.0;
        for (mut monomial, coefficient) in self.objective.terms() {
            monomial.dedup();
            if monomial.is_empty() {
                offset += coefficient;
            } else {
                *pubo.entry(monomial).or_insert(0.0) += coefficient;
            }
        }
        pubo.retain(|_, c| *c != 0.0);
        Ok((pubo, offset))
    }

    /// Runs the whole QUBO conversion pipeline, mutating the instance to
    /// record every step, and returns the coefficient map and offset:
    ///
    /// 1. Normalize to minimization.
    /// 2. Reject continuous variables.
    /// 3. Convert each inequality to an equality with integer slack; if
    ///    the exact conversion's range exceeds the limit, fall back to the
    ///    bounded-slack form.
    /// 4. Eliminate constraints by the (uniform) penalty method,
    ///    substituting the weights from `options`.
    /// 5. Log-encode every integer variable.
    /// 6. Extract the QUBO map and offset.
    /// 7. Restore the recorded optimization sense. The objective keeps
    ///    its minimization form so that it matches the returned QUBO.
    ///
    /// The whole pipeline is atomic: on any failure the instance is left
    /// exactly as it was.
    pub fn to_qubo(&mut self, options: &QuboOptions) -> Result<(QuboFormat, f64)> {
        if options.uniform_penalty_weight.is_some() && !options.penalty_weights.is_empty() {
            return Err(ModelError::ConflictingOptions(
                "uniform_penalty_weight and penalty_weights are mutually exclusive".to_string(),
            ));
        }
        let sense = self.sense;
        let mut working = self.clone();
        working.as_minimization_problem();

        let continuous: Vec<u64> = working
            .decision_variables()
            .filter(|v| matches!(v.kind, Kind::Continuous | Kind::SemiContinuous))
            .map(|v| v.id)
            .collect();
        if !continuous.is_empty() {
            return Err(ModelError::UnsupportedVariableKind { ids: continuous });
        }

        let inequality_ids: Vec<u64> = working
            .constraints()
            .iter()
            .filter(|c| c.equality == Equality::LessThanOrEqualToZero)
            .map(|c| c.id)
            .collect();
        let limit = options.inequality_integer_slack_max_range;
        for id in inequality_ids {
            match working.convert_inequality_to_equality_with_integer_slack(id, limit) {
                Ok(()) => {}
                Err(ModelError::RangeExceeded { .. }) => {
                    working.add_integer_slack_to_inequality(id, limit)?;
                }
                Err(e) => return Err(e),
            }
        }

        if !working.constraints().is_empty() {
            if options.penalty_weights.is_empty() {
                let weight = options.uniform_penalty_weight.unwrap_or(1.0);
                let pi = working.uniform_penalty_method();
                let parameter_id = pi
                    .parameters()
                    .next()
                    .map(|p| p.id)
                    .unwrap_or_default();
                working = pi.with_parameters(&[(parameter_id, weight)].into_iter().collect())?;
            } else {
                let pi = working.penalty_method();
                let mut weights = crate::eval::State::new();
                for p in pi.parameters() {
                    // penalty_method tags each weight parameter with the
                    // id of the constraint it penalizes
                    let constraint_id = p
                        .subscripts
                        .first()
                        .map(|&s| s as u64)
                        .ok_or(ModelError::UnknownParameter(p.id))?;
                    let weight = options
                        .penalty_weights
                        .get(&constraint_id)
                        .ok_or(ModelError::MissingPenaltyWeight(constraint_id))?;
                    weights.set(p.id, *weight);
                }
                working = pi.with_parameters(&weights)?;
            }
        }

        working.log_encode(&BTreeSet::new())?;
        let (qubo, offset) = working.as_qubo_format()?;
        working.sense = sense;
        *self = working;
        Ok((qubo, offset))
    }

    /// Fails if any id used by the objective or a constraint is not a
    /// binary variable. Continuous kinds get
    /// [`ModelError::UnsupportedVariableKind`]; integer kinds get
    /// [`ModelError::NonBinaryVariables`].
    fn check_used_variables_binary(&self) -> Result<()> {
        let mut continuous = Vec::new();
        let mut non_binary = Vec::new();
        for id in self.used_decision_variable_ids() {
            match self.get_decision_variable(id)?.kind {
                Kind::Binary => {}
                Kind::Continuous | Kind::SemiContinuous => continuous.push(id),
                Kind::Integer | Kind::SemiInteger => non_binary.push(id),
            }
        }
        if !continuous.is_empty() {
            return Err(ModelError::UnsupportedVariableKind { ids: continuous });
        }
        if !non_binary.is_empty() {
            return Err(ModelError::NonBinaryVariables { ids: non_binary });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Function;
    use crate::model::{Constraint, DecisionVariable, Sense};

    fn binaries(n: u64) -> Vec<DecisionVariable> {
        (0..n).map(DecisionVariable::binary).collect()
    }

    #[test]
    fn test_qubo_format_diagonal_merge() {
        // x0 + x0^2 + 2 x0 x1 + 3
        let objective = Function::variable(0)
            .add(Function::variable(0).mul(Function::variable(0)))
            .add(Function::variable(0).mul(Function::variable(1)).scale(2.0))
            .add(Function::constant(3.0));
        let instance =
            Instance::from_components(Sense::Minimize, objective, binaries(2), Vec::new())
                .unwrap();
        let (qubo, offset) = instance.as_qubo_format().unwrap();
        assert_eq!(qubo, BTreeMap::from([((0, 0), 2.0), ((0, 1), 2.0)]));
        assert_eq!(offset, 3.0);
    }

    #[test]
    fn test_qubo_format_drops_exact_zeros() {
        let objective = Function::variable(0).add(Function::variable(0).scale(-1.0));
        let instance =
            Instance::from_components(Sense::Minimize, objective, binaries(1), Vec::new())
                .unwrap();
        let (qubo, offset) = instance.as_qubo_format().unwrap();
        assert!(qubo.is_empty());
        assert_eq!(offset, 0.0);
    }

    #[test]
    fn test_qubo_format_rejects_cubic() {
        let objective = Function::variable(0)
            .mul(Function::variable(1))
            .mul(Function::variable(2));
        let instance =
            Instance::from_components(Sense::Minimize, objective, binaries(3), Vec::new())
                .unwrap();
        assert!(matches!(
            instance.as_qubo_format().unwrap_err(),
            ModelError::DegreeTooHigh
        ));
        // the PUBO format accepts it
        let (pubo, offset) = instance.as_pubo_format().unwrap();
        assert_eq!(pubo, BTreeMap::from([(vec![0, 1, 2], 1.0)]));
        assert_eq!(offset, 0.0);
    }

    #[test]
    fn test_qubo_format_checks_used_ids_only() {
        // an unused integer variable does not block extraction
        let mut variables = binaries(1);
        variables.push(DecisionVariable::integer(5, 0.0, 7.0));
        let instance = Instance::from_components(
            Sense::Minimize,
            Function::variable(0),
            variables,
            Vec::new(),
        )
        .unwrap();
        assert!(instance.as_qubo_format().is_ok());
    }

    #[test]
    fn test_qubo_format_reports_non_binary() {
        let variables = vec![
            DecisionVariable::integer(0, 0.0, 3.0),
            DecisionVariable::binary(1),
        ];
        let instance = Instance::from_components(
            Sense::Minimize,
            Function::variable(0).add(Function::variable(1)),
            variables,
            Vec::new(),
        )
        .unwrap();
        assert!(matches!(
            instance.as_qubo_format().unwrap_err(),
            ModelError::NonBinaryVariables { ids } if ids == vec![0]
        ));
    }

    #[test]
    fn test_to_qubo_conflicting_options() {
        let mut instance = Instance::from_components(
            Sense::Minimize,
            Function::variable(0),
            binaries(1),
            vec![Constraint::equal_to_zero(0, Function::variable(0))],
        )
        .unwrap();
        let before = instance.clone();
        let options = QuboOptions::default()
            .with_uniform_penalty_weight(1.0)
            .with_penalty_weights(BTreeMap::from([(0, 1.0)]));
        let err = instance.to_qubo(&options).unwrap_err();
        assert!(matches!(err, ModelError::ConflictingOptions(_)));
        assert_eq!(instance, before);
    }

    #[test]
    fn test_to_qubo_continuous_rejected_without_mutation() {
        let variables = vec![
            DecisionVariable::binary(0),
            DecisionVariable::continuous(1, 0.0, 1.0),
            DecisionVariable::semi_continuous(2, 0.0, 1.0),
        ];
        let mut instance = Instance::from_components(
            Sense::Maximize,
            Function::variable(0),
            variables,
            Vec::new(),
        )
        .unwrap();
        let before = instance.clone();
        let err = instance.to_qubo(&QuboOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnsupportedVariableKind { ids } if ids == vec![1, 2]
        ));
        assert_eq!(instance, before);
    }

    #[test]
    fn test_to_qubo_missing_penalty_weight() {
        let mut instance = Instance::from_components(
            Sense::Minimize,
            Function::variable(0),
            binaries(2),
            vec![
                Constraint::equal_to_zero(0, Function::variable(0)),
                Constraint::equal_to_zero(1, Function::variable(1)),
            ],
        )
        .unwrap();
        let before = instance.clone();
        let options =
            QuboOptions::default().with_penalty_weights(BTreeMap::from([(0, 1.0)]));
        let err = instance.to_qubo(&options).unwrap_err();
        assert!(matches!(err, ModelError::MissingPenaltyWeight(1)));
        assert_eq!(instance, before);
    }

    #[test]
    fn test_to_qubo_restores_sense_flag() {
        // max x0 s.t. x0 = 1
        let mut instance = Instance::from_components(
            Sense::Maximize,
            Function::variable(0),
            binaries(1),
            vec![Constraint::equal_to_zero(
                0,
                Function::linear([(0, 1.0)].into(), -1.0),
            )],
        )
        .unwrap();
        let (qubo, offset) = instance.to_qubo(&QuboOptions::default()).unwrap();
        // -x0 + (x0 - 1)^2 = -x0 + x0 - 2 x0 + 1 = -2 x0 + 1
        assert_eq!(qubo, BTreeMap::from([((0, 0), -2.0)]));
        assert_eq!(offset, 1.0);
        // the sense comes back but the objective stays in minimized form
        assert_eq!(instance.sense(), Sense::Maximize);
        let minimized = Function::linear([(0, -1.0)].into(), 0.0)
            .add(Function::linear([(0, 1.0)].into(), -1.0).squared());
        assert!(instance.objective().almost_equal(&minimized, 1e-10));
        assert!(instance.constraints().is_empty());
        assert_eq!(
            instance.removed_constraints()[0].removed_reason,
            "uniform_penalty_method"
        );
    }
}
