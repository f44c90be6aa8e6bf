//! Binary log-encoding of bounded integer variables.

use std::collections::{BTreeMap, BTreeSet};

use crate::algebra::Function;
use crate::error::{ModelError, Result};
use crate::model::{DecisionVariable, Instance, Kind};

/// Name tag given to the binary bits introduced by log-encoding.
pub(crate) const LOG_ENCODE_NAME: &str = "ommx.log_encode";

impl Instance {
    /// Replaces each listed integer variable `x` in `[l, u]` by an affine
    /// combination of fresh binary bits:
    ///
    /// ```text
    /// x = l + sum_{i < m-1} 2^i b_i + (u - l - 2^(m-1) + 1) b_{m-1}
    /// ```
    ///
    /// with `m = ceil(log2(u - l + 1))` bits. The top bit carries a
    /// clipped coefficient so the encoding covers `[l, u]` exactly, never
    /// overshooting. A variable with `u == l` needs no bits and is
    /// substituted by the constant `l` directly.
    ///
    /// Every occurrence in the objective and in active and removed
    /// constraints is substituted, and the affine formula is recorded in
    /// [`decision_variable_dependency`](Self::decision_variable_dependency)
    /// so evaluation can reconstruct `x` from the bits. Bits are named
    /// `ommx.log_encode` with subscripts `[x.id, i]`.
    ///
    /// An empty `ids` set means "all integer variables". Fails with
    /// [`ModelError::UnsupportedVariableKind`] if any requested id is not
    /// an integer variable, and with [`ModelError::UnknownVariable`] if an
    /// id is undeclared; nothing is modified on failure.
    pub fn log_encode(&mut self, ids: &BTreeSet<u64>) -> Result<()> {
        let targets: Vec<u64> = if ids.is_empty() {
            self.variable_ids_of_kind(Kind::Integer)
        } else {
            let mut wrong_kind = Vec::new();
            for &id in ids {
                let v = self.get_decision_variable(id)?;
                if v.kind != Kind::Integer {
                    wrong_kind.push(id);
                }
            }
            if !wrong_kind.is_empty() {
                return Err(ModelError::UnsupportedVariableKind { ids: wrong_kind });
            }
            ids.iter().copied().collect()
        };
        if targets.is_empty() {
            return Ok(());
        }

        let mut replacements = BTreeMap::new();
        let mut next_id = self.next_variable_id();
        let mut new_bits = Vec::new();
        for &id in &targets {
            let v = self.get_decision_variable(id)?;
            let (lower, upper) = (v.bound.lower.ceil(), v.bound.upper.floor());
            let width = upper - lower;
            let mut formula = Function::constant(lower);
            if width >= 1.0 {
                let bits = (width + 1.0).log2().ceil() as u32;
                for i in 0..bits {
                    let coefficient = if i == bits - 1 {
                        // clip the top bit so the maximum is exactly `upper`
                        width - 2f64.powi(i as i32) + 1.0
                    } else {
                        2f64.powi(i as i32)
                    };
                    let bit = DecisionVariable::binary(next_id)
                        .with_name(LOG_ENCODE_NAME)
                        .with_subscripts(vec![id as i64, i as i64]);
                    new_bits.push(bit);
                    formula = formula.add(Function::variable(next_id).scale(coefficient));
                    next_id += 1;
                }
            }
            replacements.insert(id, formula);
        }

        self.objective = self.objective.substitute(&replacements);
        for c in &mut self.constraints {
            c.function = c.function.substitute(&replacements);
        }
        for rc in &mut self.removed_constraints {
            rc.constraint.function = rc.constraint.function.substitute(&replacements);
        }
        for bit in new_bits {
            self.decision_variables.insert(bit.id, bit);
        }
        for (id, formula) in replacements {
            self.decision_variable_dependency.insert(id, formula);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::State;
    use crate::model::Sense;

    fn single_integer(lower: f64, upper: f64) -> Instance {
        Instance::from_components(
            Sense::Minimize,
            Function::variable(0),
            vec![DecisionVariable::integer(0, lower, upper)],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_two_bit_encoding() {
        // x in [0, 3] takes exactly two bits with coefficients 1 and 2
        let mut instance = single_integer(0.0, 3.0);
        instance.log_encode(&BTreeSet::new()).unwrap();

        let formula = &instance.decision_variable_dependency()[&0];
        assert!(formula.almost_equal(
            &Function::linear([(1, 1.0), (2, 2.0)].into(), 0.0),
            1e-10
        ));
        assert!(instance
            .objective()
            .almost_equal(formula, 1e-10));

        let bit = instance.get_decision_variable(1).unwrap();
        assert_eq!(bit.kind, Kind::Binary);
        assert_eq!(bit.name.as_deref(), Some(LOG_ENCODE_NAME));
        assert_eq!(bit.subscripts, [0, 0]);
        assert_eq!(
            instance.get_decision_variable(2).unwrap().subscripts,
            [0, 1]
        );

        // every value in [0, 3] is reachable from some assignment of bits
        for (b0, b1, x) in [(0.0, 0.0, 0.0), (1.0, 0.0, 1.0), (0.0, 1.0, 2.0), (1.0, 1.0, 3.0)] {
            let state = State::from_iter([(1, b0), (2, b1)]);
            let (value, _) = formula.evaluate(&state).unwrap();
            assert_eq!(value, x);
        }
    }

    #[test]
    fn test_clipped_top_bit() {
        // x in [2, 6]: width 4, three bits with coefficients 1, 2, 1
        let mut instance = single_integer(2.0, 6.0);
        instance.log_encode(&BTreeSet::new()).unwrap();
        let formula = &instance.decision_variable_dependency()[&0];
        assert!(formula.almost_equal(
            &Function::linear([(1, 1.0), (2, 2.0), (3, 1.0)].into(), 2.0),
            1e-10
        ));
        // all bits set reaches the upper bound exactly
        let state = State::from_iter([(1, 1.0), (2, 1.0), (3, 1.0)]);
        assert_eq!(formula.evaluate(&state).unwrap().0, 6.0);
    }

    #[test]
    fn test_point_bound_becomes_constant() {
        let mut instance = single_integer(5.0, 5.0);
        instance.log_encode(&BTreeSet::new()).unwrap();
        assert!(instance
            .objective()
            .almost_equal(&Function::constant(5.0), 1e-10));
        // a constant substitution introduces no bits
        assert_eq!(instance.decision_variables().count(), 1);
    }

    #[test]
    fn test_non_integer_target_rejected() {
        let mut instance = Instance::from_components(
            Sense::Minimize,
            Function::variable(0),
            vec![DecisionVariable::continuous(0, 0.0, 3.0)],
            Vec::new(),
        )
        .unwrap();
        let err = instance.log_encode(&BTreeSet::from([0])).unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnsupportedVariableKind { ids } if ids == vec![0]
        ));
    }

    #[test]
    fn test_empty_set_skips_non_integers() {
        let mut instance = Instance::from_components(
            Sense::Minimize,
            Function::variable(0).add(Function::variable(1)),
            vec![
                DecisionVariable::binary(0),
                DecisionVariable::integer(1, 0.0, 1.0),
            ],
            Vec::new(),
        )
        .unwrap();
        instance.log_encode(&BTreeSet::new()).unwrap();
        // only the integer is encoded, the binary stays
        assert!(instance.decision_variable_dependency().contains_key(&1));
        assert!(!instance.decision_variable_dependency().contains_key(&0));
    }
}
