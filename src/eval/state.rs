//! Variable assignments supplied by external solvers.

use std::collections::BTreeMap;

/// An assignment of decision-variable ids to values.
///
/// # Examples
///
/// ```
/// use quboform::eval::State;
///
/// let state = State::from_iter([(0, 1.0), (1, 0.0)]);
/// assert_eq!(state.get(0), Some(1.0));
/// assert_eq!(state.get(9), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    /// Value per variable id.
    pub entries: BTreeMap<u64, f64>,
}

impl State {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value assigned to `id`, if any.
    pub fn get(&self, id: u64) -> Option<f64> {
        self.entries.get(&id).copied()
    }

    /// Assigns a value, replacing any previous one.
    pub fn set(&mut self, id: u64, value: f64) {
        self.entries.insert(id, value);
    }

    /// Whether `id` is assigned.
    pub fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of assigned ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no id is assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(u64, f64)> for State {
    fn from_iter<T: IntoIterator<Item = (u64, f64)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<u64, f64>> for State {
    fn from(entries: BTreeMap<u64, f64>) -> Self {
        Self { entries }
    }
}

/// A batch of assignments keyed by sample id.
///
/// Iteration order is ascending sample id, which fixes the deterministic
/// tie-break used by best-feasible selection.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Samples {
    /// Assignment per sample id.
    pub entries: BTreeMap<u64, State>,
}

impl Samples {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample, replacing any previous one with the same id.
    pub fn insert(&mut self, sample_id: u64, state: State) {
        self.entries.insert(sample_id, state);
    }

    /// The assignment for `sample_id`, if present.
    pub fn get(&self, sample_id: u64) -> Option<&State> {
        self.entries.get(&sample_id)
    }

    /// Sample ids in ascending order.
    pub fn sample_ids(&self) -> Vec<u64> {
        self.entries.keys().copied().collect()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(u64, State)> for Samples {
    fn from_iter<T: IntoIterator<Item = (u64, State)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
