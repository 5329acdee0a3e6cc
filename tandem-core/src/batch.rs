//! Batches of transitions and sequences.
//!
//! [`TransitionBatch`] and [`SequenceBatch`] are struct-of-arrays collators
//! for [`Sample`]s. Any other type implementing [`Collate`] can be used with
//! the buffers in this crate, including `Vec<Sample<O, A, H>>`, which keeps
//! the samples as they are.
use crate::{
    error::TandemError,
    trajectory::{Sample, Sequence, Transition},
    Collate,
};
use anyhow::Result;

/// A collated batch together with the indices of its samples.
///
/// `ixs[i]` is the master index of the `i`-th sample of `batch`. Pass it back
/// unchanged to the `update_hidden()` method of the buffer the batch came from.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedBatch<B> {
    /// Collated samples.
    pub batch: B,

    /// Master indices of the samples.
    pub ixs: Vec<usize>,
}

impl<B> IndexedBatch<B> {
    /// Collates `(sample, master_index)` pairs.
    pub fn collate<T>(samples: Vec<(T, usize)>) -> Result<Self>
    where
        B: Collate<Item = T>,
    {
        let (items, ixs): (Vec<_>, Vec<_>) = samples.into_iter().unzip();
        Ok(Self {
            batch: B::collate(items)?,
            ixs,
        })
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.ixs.len()
    }

    /// Returns `true` if the batch has no sample.
    pub fn is_empty(&self) -> bool {
        self.ixs.is_empty()
    }

    /// Decomposes into the batch and the indices.
    pub fn unpack(self) -> (B, Vec<usize>) {
        (self.batch, self.ixs)
    }
}

/// A batch of single-step transitions.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionBatch<O, A, H> {
    /// Current observations.
    pub obs: Vec<O>,

    /// Actions.
    pub act: Vec<A>,

    /// Next observations.
    pub next_obs: Vec<O>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Done flags.
    pub is_done: Vec<i8>,

    /// Cached hidden states.
    pub hidden: Vec<Option<H>>,
}

impl<O, A, H> TransitionBatch<O, A, H> {
    /// Creates an empty batch with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            next_obs: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            is_done: Vec::with_capacity(capacity),
            hidden: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    fn push(&mut self, tr: Transition<O, A, H>) {
        self.obs.push(tr.obs);
        self.act.push(tr.act);
        self.next_obs.push(tr.next_obs);
        self.reward.push(tr.reward);
        self.is_done.push(tr.is_done as i8);
        self.hidden.push(tr.hidden);
    }
}

impl<O, A, H> Collate for TransitionBatch<O, A, H> {
    type Item = Sample<O, A, H>;

    fn collate(items: Vec<Self::Item>) -> Result<Self> {
        let mut batch = Self::with_capacity(items.len());
        for item in items {
            match item {
                Sample::Step(tr) => batch.push(tr),
                Sample::Sequence(_) => {
                    return Err(TandemError::Collate(
                        "TransitionBatch got a sequence sample".to_string(),
                    ))?
                }
            }
        }
        Ok(batch)
    }
}

/// A batch of fixed-length sequences.
///
/// Outer vectors run over samples, inner vectors over time.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceBatch<O, A, H> {
    /// Observations, `sequence_length + 1` per sample.
    pub obs: Vec<Vec<O>>,

    /// Actions.
    pub act: Vec<Vec<A>>,

    /// Rewards.
    pub reward: Vec<Vec<f32>>,

    /// Done flags.
    pub is_done: Vec<Vec<i8>>,

    /// Hidden states initializing each sequence.
    pub initial_hidden: Vec<Option<H>>,
}

impl<O, A, H> SequenceBatch<O, A, H> {
    /// Creates an empty batch with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            is_done: Vec::with_capacity(capacity),
            initial_hidden: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of sequences.
    pub fn len(&self) -> usize {
        self.act.len()
    }

    /// Returns `true` if the batch has no sequence.
    pub fn is_empty(&self) -> bool {
        self.act.is_empty()
    }

    fn push(&mut self, seq: Sequence<O, A, H>) {
        self.obs.push(seq.obs);
        self.act.push(seq.act);
        self.reward.push(seq.reward);
        self.is_done.push(seq.is_done);
        self.initial_hidden.push(seq.initial_hidden);
    }
}

impl<O, A, H> Collate for SequenceBatch<O, A, H> {
    type Item = Sample<O, A, H>;

    fn collate(items: Vec<Self::Item>) -> Result<Self> {
        let mut batch = Self::with_capacity(items.len());
        let mut length = None;
        for item in items {
            match item {
                Sample::Sequence(seq) => {
                    let n = seq.len();
                    if *length.get_or_insert(n) != n {
                        return Err(TandemError::Collate(format!(
                            "SequenceBatch got sequences of lengths {:?} and {}",
                            length, n
                        )))?;
                    }
                    batch.push(seq)
                }
                Sample::Step(_) => {
                    return Err(TandemError::Collate(
                        "SequenceBatch got a step sample".to_string(),
                    ))?
                }
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn step(i: usize) -> Sample<usize, usize, ()> {
        Sample::Step(Transition {
            obs: i,
            act: i,
            reward: i as f32,
            next_obs: i + 1,
            is_done: false,
            hidden: None,
        })
    }

    #[test]
    fn test_indexed_transition_batch() {
        let samples = vec![(step(3), 30), (step(1), 10), (step(2), 20)];
        let batch = IndexedBatch::<TransitionBatch<_, _, _>>::collate(samples).unwrap();
        assert_eq!(batch.ixs, vec![30, 10, 20]);
        assert_eq!(batch.batch.obs, vec![3, 1, 2]);
        assert_eq!(batch.batch.next_obs, vec![4, 2, 3]);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_mixed_samples_are_rejected() {
        let seq = Sample::Sequence(Sequence {
            obs: vec![0usize, 1],
            act: vec![0usize],
            reward: vec![0.0],
            is_done: vec![0],
            initial_hidden: None::<()>,
        });
        assert!(TransitionBatch::collate(vec![step(0), seq.clone()]).is_err());
        assert!(SequenceBatch::collate(vec![seq, step(0)]).is_err());
    }
}
