//! Batched evaluation over many assignments.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{ModelError, Result};
use crate::eval::{Samples, Solution};
use crate::model::{Instance, Sense};

/// Solutions for a batch of samples, keyed by sample id.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleSet {
    pub(crate) sense: Sense,
    pub(crate) solutions: BTreeMap<u64, Solution>,
}

impl SampleSet {
    /// The solution for `sample_id`.
    pub fn get(&self, sample_id: u64) -> Result<&Solution> {
        self.solutions
            .get(&sample_id)
            .ok_or(ModelError::UnknownSampleId(sample_id))
    }

    /// Sample ids in ascending order.
    pub fn sample_ids(&self) -> Vec<u64> {
        self.solutions.keys().copied().collect()
    }

    /// Objective value per sample id.
    pub fn objectives(&self) -> BTreeMap<u64, f64> {
        self.solutions
            .iter()
            .map(|(&id, s)| (id, s.objective()))
            .collect()
    }

    /// Feasibility over active constraints per sample id.
    pub fn feasible_relaxed(&self) -> BTreeMap<u64, bool> {
        self.solutions
            .iter()
            .map(|(&id, s)| (id, s.feasible_relaxed()))
            .collect()
    }

    /// Feasibility over all constraints per sample id.
    pub fn feasible_unrelaxed(&self) -> BTreeMap<u64, bool> {
        self.solutions
            .iter()
            .map(|(&id, s)| (id, s.feasible_unrelaxed()))
            .collect()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// The best solution among those feasible over the active
    /// constraints: lowest objective when minimizing, highest when
    /// maximizing. Ties keep the smallest sample id. `None` when no
    /// sample is feasible.
    pub fn best_feasible(&self) -> Option<&Solution> {
        self.best_by(Solution::feasible_relaxed)
    }

    /// Like [`best_feasible`](Self::best_feasible) but requiring
    /// feasibility over removed constraints as well.
    pub fn best_feasible_unrelaxed(&self) -> Option<&Solution> {
        self.best_by(Solution::feasible_unrelaxed)
    }

    fn best_by(&self, accept: impl Fn(&Solution) -> bool) -> Option<&Solution> {
        let mut best: Option<&Solution> = None;
        // ascending id order; strict improvement keeps the smallest id on ties
        for solution in self.solutions.values().filter(|s| accept(s)) {
            let better = match best {
                None => true,
                Some(b) => match self.sense {
                    Sense::Minimize => solution.objective() < b.objective(),
                    Sense::Maximize => solution.objective() > b.objective(),
                },
            };
            if better {
                best = Some(solution);
            }
        }
        best
    }
}

impl Instance {
    /// Evaluates every sample in the batch. Fails on the first sample
    /// that cannot be evaluated.
    pub fn evaluate_samples(&self, samples: &Samples) -> Result<SampleSet> {
        #[cfg(feature = "parallel")]
        let solutions = samples
            .entries
            .par_iter()
            .map(|(&id, state)| Ok((id, self.evaluate(state)?)))
            .collect::<Result<BTreeMap<u64, Solution>>>()?;
        #[cfg(not(feature = "parallel"))]
        let solutions = samples
            .entries
            .iter()
            .map(|(&id, state)| Ok((id, self.evaluate(state)?)))
            .collect::<Result<BTreeMap<u64, Solution>>>()?;
        Ok(SampleSet {
            sense: self.sense,
            solutions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Function;
    use crate::eval::State;
    use crate::model::{Constraint, DecisionVariable};

    /// max x0 + x1 s.t. x0 + x1 <= 1 over binaries.
    fn capacity_instance() -> Instance {
        Instance::from_components(
            Sense::Maximize,
            Function::linear([(0, 1.0), (1, 1.0)].into(), 0.0),
            vec![DecisionVariable::binary(0), DecisionVariable::binary(1)],
            vec![Constraint::less_than_or_equal_to_zero(
                0,
                Function::linear([(0, 1.0), (1, 1.0)].into(), -1.0),
            )],
        )
        .unwrap()
    }

    fn sample(pairs: [(u64, f64); 2]) -> State {
        State::from_iter(pairs)
    }

    #[test]
    fn test_best_feasible_respects_sense() {
        let samples = Samples::from_iter([
            (0, sample([(0, 0.0), (1, 0.0)])), // feasible, objective 0
            (1, sample([(0, 1.0), (1, 0.0)])), // feasible, objective 1
            (2, sample([(0, 1.0), (1, 1.0)])), // infeasible, objective 2
        ]);
        let set = capacity_instance().evaluate_samples(&samples).unwrap();
        assert_eq!(set.len(), 3);
        // maximizing: the infeasible objective-2 sample is skipped
        let best = set.best_feasible().unwrap();
        assert_eq!(best.objective(), 1.0);
        assert_eq!(set.objectives()[&2], 2.0);
        assert_eq!(set.feasible_unrelaxed()[&2], false);
    }

    #[test]
    fn test_best_feasible_tie_breaks_by_smallest_id() {
        let samples = Samples::from_iter([
            (7, sample([(0, 1.0), (1, 0.0)])),
            (3, sample([(0, 0.0), (1, 1.0)])), // same objective, smaller id
        ]);
        let set = capacity_instance().evaluate_samples(&samples).unwrap();
        let best = set.best_feasible().unwrap();
        assert_eq!(best.state().get(1), Some(1.0));
    }

    #[test]
    fn test_best_feasible_none_when_all_infeasible() {
        let samples = Samples::from_iter([(0, sample([(0, 1.0), (1, 1.0)]))]);
        let set = capacity_instance().evaluate_samples(&samples).unwrap();
        assert!(set.best_feasible().is_none());
        assert!(set.best_feasible_unrelaxed().is_none());
    }

    #[test]
    fn test_unrelaxed_selection_sees_removed_constraints() {
        let mut instance = capacity_instance();
        instance
            .relax_constraint(0, "manual", Default::default())
            .unwrap();
        let samples = Samples::from_iter([
            (0, sample([(0, 1.0), (1, 1.0)])), // violates the removed constraint
            (1, sample([(0, 1.0), (1, 0.0)])),
        ]);
        let set = instance.evaluate_samples(&samples).unwrap();
        // relaxed: sample 0 wins on objective
        assert_eq!(set.best_feasible().unwrap().objective(), 2.0);
        // unrelaxed: sample 0 is excluded
        assert_eq!(set.best_feasible_unrelaxed().unwrap().objective(), 1.0);
    }

    #[test]
    fn test_get_unknown_sample() {
        let set = capacity_instance()
            .evaluate_samples(&Samples::new())
            .unwrap();
        assert!(matches!(
            set.get(9).unwrap_err(),
            ModelError::UnknownSampleId(9)
        ));
    }
}
