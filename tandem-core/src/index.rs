//! Global indices over a list of trajectories.
//!
//! [`StepIndex`] maps a global position (the *master index*) to a
//! `(trajectory, step)` pair. [`SequenceIndex`] keeps the subset of those pairs
//! that end a full sequence window. Both are append-only, so a position handed
//! out once keeps naming the same step for the lifetime of the index.
use crate::trajectory::Trajectory;
use std::slice::Iter;

/// Identifies a step of a trajectory in a list of trajectories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StepId {
    /// Position of the trajectory.
    pub trajectory: usize,

    /// Local position of the step in the trajectory.
    pub step: usize,
}

impl StepId {
    /// Creates a step id.
    pub fn new(trajectory: usize, step: usize) -> Self {
        Self { trajectory, step }
    }
}

/// Flat, append-only index of every step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepIndex(Vec<StepId>);

impl StepIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self(vec![])
    }

    /// Enumerates every step of the given trajectories in order.
    pub fn from_trajectories<O, A, H>(trajectories: &[Trajectory<O, A, H>]) -> Self {
        let ids = trajectories
            .iter()
            .enumerate()
            .flat_map(|(t, tr)| (0..tr.len()).map(move |s| StepId::new(t, s)))
            .collect();
        Self(ids)
    }

    /// Appends an entry.
    pub fn push(&mut self, id: StepId) {
        self.0.push(id);
    }

    /// Returns the entry at master position `i`.
    pub fn get(&self, i: usize) -> Option<StepId> {
        self.0.get(i).copied()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> Iter<'_, StepId> {
        self.0.iter()
    }

    /// Returns the entries as a slice.
    pub fn as_slice(&self) -> &[StepId] {
        &self.0
    }
}

/// Index of the steps ending a full window of `sequence_length` steps.
///
/// A step `s` is eligible iff `s > sequence_length + 1`. The same rule is used
/// for expert datasets and online replay buffers, so a window ending at an
/// eligible step always starts at local step 3 or later and has a preceding
/// step whose cached hidden state initializes the recurrent model.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceIndex {
    sequence_length: usize,
    ids: Vec<StepId>,
}

impl SequenceIndex {
    /// Creates an empty index.
    pub fn new(sequence_length: usize) -> Self {
        Self {
            sequence_length,
            ids: vec![],
        }
    }

    /// Builds the index from a step index in one pass.
    pub fn build(steps: &StepIndex, sequence_length: usize) -> Self {
        let mut index = Self::new(sequence_length);
        for &id in steps.iter() {
            index.observe(id);
        }
        index
    }

    /// Returns `true` if a window can end at local step `step`.
    #[inline]
    pub fn is_eligible(&self, step: usize) -> bool {
        step > self.sequence_length + 1
    }

    /// Appends `id` if it ends a full window. Returns `true` if appended.
    pub fn observe(&mut self, id: StepId) -> bool {
        if self.is_eligible(id.step) {
            self.ids.push(id);
            true
        } else {
            false
        }
    }

    /// Returns the window length.
    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Returns the entry at master position `i`.
    pub fn get(&self, i: usize) -> Option<StepId> {
        self.ids.get(i).copied()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> Iter<'_, StepId> {
        self.ids.iter()
    }

    /// Returns the entries as a slice.
    pub fn as_slice(&self) -> &[StepId] {
        &self.ids
    }
}
