//! Full and partial substitution of assignments into functions.

use std::collections::{BTreeMap, BTreeSet};

use super::function::{Function, Linear, Monomial, Polynomial, Quadratic};
use crate::error::{ModelError, Result};
use crate::eval::State;

impl Function {
    /// Substitutes every referenced id and returns the value together with
    /// the ids actually used.
    ///
    /// Fails with [`ModelError::MissingAssignment`] naming the smallest
    /// unresolved id if any id referenced by a nonzero term is absent.
    /// Ids present in `state` but unused by the function are not reported.
    ///
    /// # Examples
    ///
    /// ```
    /// use quboform::algebra::Function;
    /// use quboform::eval::State;
    ///
    /// // 2*x1 + 3*x2 + 1
    /// let f = Function::linear([(1, 2.0), (2, 3.0)].into(), 1.0);
    /// let state = State::from_iter([(1, 3.0), (2, 4.0), (3, 5.0)]);
    /// let (value, used) = f.evaluate(&state).unwrap();
    /// assert_eq!(value, 19.0);
    /// assert_eq!(used.into_iter().collect::<Vec<_>>(), [1, 2]);
    /// ```
    pub fn evaluate(&self, state: &State) -> Result<(f64, BTreeSet<u64>)> {
        let mut value = 0.0;
        let mut used = BTreeSet::new();
        for (monomial, coefficient) in self.terms() {
            if coefficient == 0.0 {
                continue;
            }
            let mut product = coefficient;
            for &id in &monomial {
                let v = state.get(id).ok_or(ModelError::MissingAssignment(id))?;
                product *= v;
                used.insert(id);
            }
            value += product;
        }
        Ok((value, used))
    }

    /// Substitutes the assigned ids only, returning a reduced function over
    /// the remaining ids and the set of ids consumed.
    ///
    /// The degree tag is preserved: partially evaluating a `Quadratic`
    /// yields a `Quadratic` even if no degree-2 term survives.
    ///
    /// # Examples
    ///
    /// ```
    /// use quboform::algebra::Function;
    /// use quboform::eval::State;
    ///
    /// // 2*x1 + 3*x2 + 1 with x1 = 3 reduces to 3*x2 + 7
    /// let f = Function::linear([(1, 2.0), (2, 3.0)].into(), 1.0);
    /// let (g, used) = f.partial_evaluate(&State::from_iter([(1, 3.0)])).unwrap();
    /// assert!(g.almost_equal(&Function::linear([(2, 3.0)].into(), 7.0), 1e-10));
    /// assert_eq!(used.into_iter().collect::<Vec<_>>(), [1]);
    /// ```
    pub fn partial_evaluate(&self, state: &State) -> Result<(Function, BTreeSet<u64>)> {
        let mut used = BTreeSet::new();
        let reduced = match self {
            Function::Constant(c) => Function::Constant(*c),
            Function::Linear(l) => {
                let mut terms = BTreeMap::new();
                let mut constant = l.constant;
                for (&id, &c) in &l.terms {
                    match state.get(id) {
                        Some(v) => {
                            constant += c * v;
                            if c != 0.0 {
                                used.insert(id);
                            }
                        }
                        None => {
                            *terms.entry(id).or_insert(0.0) += c;
                        }
                    }
                }
                Function::Linear(Linear::new(terms, constant))
            }
            Function::Quadratic(q) => {
                let mut quad = BTreeMap::new();
                let mut linear = BTreeMap::new();
                let mut constant = q.linear.constant;
                for (&(i, j), &c) in &q.quad_terms {
                    match (state.get(i), state.get(j)) {
                        (Some(vi), Some(vj)) => {
                            constant += c * vi * vj;
                            if c != 0.0 {
                                used.insert(i);
                                used.insert(j);
                            }
                        }
                        (Some(vi), None) => {
                            *linear.entry(j).or_insert(0.0) += c * vi;
                            if c != 0.0 {
                                used.insert(i);
                            }
                        }
                        (None, Some(vj)) => {
                            *linear.entry(i).or_insert(0.0) += c * vj;
                            if c != 0.0 {
                                used.insert(j);
                            }
                        }
                        (None, None) => {
                            *quad.entry((i, j)).or_insert(0.0) += c;
                        }
                    }
                }
                for (&id, &c) in &q.linear.terms {
                    match state.get(id) {
                        Some(v) => {
                            constant += c * v;
                            if c != 0.0 {
                                used.insert(id);
                            }
                        }
                        None => {
                            *linear.entry(id).or_insert(0.0) += c;
                        }
                    }
                }
                Function::Quadratic(Quadratic {
                    quad_terms: quad,
                    linear: Linear::new(linear, constant),
                })
            }
            Function::Polynomial(p) => {
                let mut terms: BTreeMap<Monomial, f64> = BTreeMap::new();
                for (monomial, &c) in &p.terms {
                    let mut factor = c;
                    let mut rest = Vec::new();
                    for &id in monomial {
                        match state.get(id) {
                            Some(v) => {
                                factor *= v;
                                if c != 0.0 {
                                    used.insert(id);
                                }
                            }
                            None => rest.push(id),
                        }
                    }
                    *terms.entry(rest).or_insert(0.0) += factor;
                }
                terms.entry(Vec::new()).or_insert(0.0);
                Function::Polynomial(Polynomial { terms })
            }
        };
        Ok((reduced, used))
    }
}
