//! Random access to the steps or sequences of a fixed set of trajectories.
mod config;
use crate::{
    error::TandemError,
    index::{SequenceIndex, StepId, StepIndex},
    trajectory::{Sample, Trajectory},
    CurriculumFilter, DatasetBase,
};
use anyhow::Result;
pub use config::DatasetConfig;
use log::info;

/// A dataset of recorded trajectories, typically expert demonstrations.
///
/// Samples are single steps if `sequence_length == 0` and windows of
/// `sequence_length` steps otherwise. The *master lookup* is the step index
/// in the former case and the sequence index in the latter. With a
/// curriculum, only the entries of the current [`CurriculumSnapshot`] are
/// visible, and [`get`](Self::get) translates visible positions back to
/// master indices, which are the keys for
/// [`update_hidden`](Self::update_hidden).
///
/// [`CurriculumSnapshot`]: crate::CurriculumSnapshot
pub struct TrajectoryDataset<O, A, H> {
    trajectories: Vec<Trajectory<O, A, H>>,
    steps: StepIndex,
    sequences: Option<SequenceIndex>,
    curriculum: Option<CurriculumFilter>,
}

impl<O, A, H> TrajectoryDataset<O, A, H> {
    /// Builds a dataset from trajectories.
    ///
    /// With a curriculum, the initial snapshot is computed at fraction `0`.
    pub fn build(trajectories: Vec<Trajectory<O, A, H>>, config: &DatasetConfig) -> Result<Self> {
        let steps = StepIndex::from_trajectories(&trajectories);
        let sum_rewards: f32 = trajectories.iter().map(|tr| tr.sum_rewards()).sum();
        info!(
            "Dataset initialized with {} steps in {} trajectories",
            steps.len(),
            trajectories.len()
        );
        info!("{} reward sum", sum_rewards);

        let sequences = match config.sequence_length {
            0 => None,
            n => {
                let sequences = SequenceIndex::build(&steps, n);
                info!("Identified {} sub-sequences of {} steps", sequences.len(), n);
                Some(sequences)
            }
        };

        let curriculum = match &config.curriculum {
            Some(c) => Some(CurriculumFilter::build(c)?),
            None => None,
        };

        let mut dataset = Self {
            trajectories,
            steps,
            sequences,
            curriculum,
        };
        dataset.update_curriculum(0.0)?;
        Ok(dataset)
    }

    /// Returns the unfiltered entries; positions in it are master indices.
    fn master(&self) -> &[StepId] {
        match &self.sequences {
            Some(sequences) => sequences.as_slice(),
            None => self.steps.as_slice(),
        }
    }

    /// Returns the entry and master index behind visible position `i`.
    fn resolve(&self, i: usize) -> Result<(StepId, usize)> {
        let resolved = match &self.curriculum {
            Some(c) => c.snapshot().resolve(i),
            None => self.master().get(i).map(|&id| (id, i)),
        };
        match resolved {
            Some(r) => Ok(r),
            None => Err(TandemError::OutOfRange {
                index: i,
                len: self.len(),
            })?,
        }
    }

    /// Returns the number of visible samples.
    pub fn len(&self) -> usize {
        match &self.curriculum {
            Some(c) => c.snapshot().len(),
            None => self.master().len(),
        }
    }

    /// Returns `true` if no sample is visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of entries in the master lookup.
    pub fn master_len(&self) -> usize {
        self.master().len()
    }

    /// Returns the number of steps over all trajectories.
    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    /// Returns the sequence length, `0` for single-step samples.
    pub fn sequence_length(&self) -> usize {
        self.sequences
            .as_ref()
            .map(|s| s.sequence_length())
            .unwrap_or(0)
    }

    /// Returns the trajectories.
    pub fn trajectories(&self) -> &[Trajectory<O, A, H>] {
        &self.trajectories
    }

    /// Returns `true` if a curriculum is applied.
    pub fn is_curriculum_training(&self) -> bool {
        self.curriculum.is_some()
    }

    /// Returns the curriculum filter, if any.
    pub fn curriculum(&self) -> Option<&CurriculumFilter> {
        self.curriculum.as_ref()
    }

    /// Returns the number of distinct entries eligible under the curriculum.
    ///
    /// Without a curriculum, every entry of the master lookup is eligible.
    pub fn curriculum_length(&self) -> usize {
        match &self.curriculum {
            Some(c) => c.snapshot().curriculum_length(),
            None => self.master_len(),
        }
    }

    /// Returns the fraction of the master lookup currently eligible.
    pub fn curriculum_inclusion(&self) -> f32 {
        match self.master_len() {
            0 => 0.0,
            n => self.curriculum_length() as f32 / n as f32,
        }
    }

    /// Returns the fraction at which the curriculum stops changing.
    pub fn final_curriculum_fraction(&self) -> f64 {
        match &self.curriculum {
            Some(c) => c.final_curriculum_fraction(),
            None => 1.0,
        }
    }

    /// Returns the generation of the curriculum snapshot.
    pub fn generation(&self) -> u64 {
        match &self.curriculum {
            Some(c) => c.snapshot().generation(),
            None => 0,
        }
    }

    /// Recomputes the visible samples for the given curriculum fraction.
    ///
    /// Has no effect without a curriculum. Visible positions handed out
    /// before the call are invalid afterwards; master indices stay valid.
    pub fn update_curriculum(&mut self, fraction: f64) -> Result<()> {
        let lengths = self
            .trajectories
            .iter()
            .map(|tr| tr.len())
            .collect::<Vec<_>>();
        let master = match &self.sequences {
            Some(sequences) => sequences.as_slice(),
            None => self.steps.as_slice(),
        };
        if let Some(curriculum) = self.curriculum.as_mut() {
            curriculum.update(master, &lengths, fraction)?;
        }
        Ok(())
    }

    /// Writes hidden states to the steps behind the given master indices.
    pub fn update_hidden(&mut self, ixs: &[usize], hidden: Vec<H>) -> Result<()> {
        if ixs.len() != hidden.len() {
            return Err(TandemError::LengthMismatch {
                indices: ixs.len(),
                hidden: hidden.len(),
            })?;
        }

        let master = match &self.sequences {
            Some(sequences) => sequences.as_slice(),
            None => self.steps.as_slice(),
        };
        for (&ix, h) in ixs.iter().zip(hidden.into_iter()) {
            let id = match master.get(ix) {
                Some(&id) => id,
                None => {
                    return Err(TandemError::OutOfRange {
                        index: ix,
                        len: master.len(),
                    })?
                }
            };
            self.trajectories[id.trajectory].update_hidden(id.step, h)?;
        }
        Ok(())
    }
}

impl<O, A, H> TrajectoryDataset<O, A, H>
where
    O: Clone,
    A: Clone,
    H: Clone,
{
    /// Returns the sample at visible position `i` and its master index.
    pub fn get(&self, i: usize) -> Result<(Sample<O, A, H>, usize)> {
        let (id, master) = self.resolve(i)?;
        let tr = &self.trajectories[id.trajectory];
        let sample = match &self.sequences {
            Some(sequences) => Sample::Sequence(
                tr.get_sequence(id.step, sequences.sequence_length())?,
            ),
            None => Sample::Step(tr.get_step(id.step)?),
        };
        Ok((sample, master))
    }
}

impl<O, A, H> DatasetBase for TrajectoryDataset<O, A, H>
where
    O: Clone,
    A: Clone,
    H: Clone,
{
    type Item = Sample<O, A, H>;

    fn len(&self) -> usize {
        TrajectoryDataset::len(self)
    }

    fn get(&self, i: usize) -> Result<(Self::Item, usize)> {
        TrajectoryDataset::get(self, i)
    }

    fn generation(&self) -> u64 {
        TrajectoryDataset::generation(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::CurriculumConfig;

    type Dataset = TrajectoryDataset<usize, usize, f32>;

    /// Trajectories whose observations encode `(trajectory, step)` as `1000 * t + s`.
    fn trajectories(lengths: &[usize]) -> Vec<Trajectory<usize, usize, f32>> {
        lengths
            .iter()
            .enumerate()
            .map(|(t, &n)| {
                let mut tr = Trajectory::new(1000 * t);
                for s in 0..n {
                    tr.push(1000 * t + s, 1.0, 1000 * t + s + 1, s + 1 == n)
                        .unwrap();
                }
                tr
            })
            .collect()
    }

    #[test]
    fn test_step_mode() {
        let dataset = Dataset::build(trajectories(&[3, 4]), &DatasetConfig::default()).unwrap();
        assert_eq!(dataset.len(), 7);
        assert_eq!(dataset.num_steps(), 7);
        let (sample, master) = dataset.get(4).unwrap();
        assert_eq!(master, 4);
        match sample {
            Sample::Step(tr) => assert_eq!(tr.act, 1001),
            _ => panic!("expected a step"),
        }
        assert!(dataset.get(7).is_err());
    }

    #[test]
    fn test_sequence_mode() {
        let config = DatasetConfig::default().sequence_length(3);
        let dataset = Dataset::build(trajectories(&[10, 4, 7]), &config).unwrap();
        // Steps 5..=9 of the first, none of the second, 5..=6 of the third
        assert_eq!(dataset.len(), 7);
        let (sample, master) = dataset.get(5).unwrap();
        assert_eq!(master, 5);
        match sample {
            Sample::Sequence(seq) => assert_eq!(seq.act, vec![2003, 2004, 2005]),
            _ => panic!("expected a sequence"),
        }
    }

    #[test]
    fn test_curriculum_master_index() {
        let config = DatasetConfig::default().sequence_length(2).curriculum(Some(
            CurriculumConfig::default()
                .emphasize_new_samples(true)
                .emphasized_fraction(0.2)
                .emphasis_relative_sample_frequency(2),
        ));
        let mut dataset = Dataset::build(trajectories(&[20, 30]), &config).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.generation(), 1);

        dataset.update_curriculum(0.5).unwrap();
        assert_eq!(dataset.generation(), 2);
        assert!(dataset.len() > dataset.curriculum_length());

        // Every visible sample resolves to the entry named by its master index
        let master = dataset.master().to_vec();
        for i in 0..dataset.len() {
            let (sample, m) = dataset.get(i).unwrap();
            let id = master[m];
            match sample {
                Sample::Sequence(seq) => assert_eq!(seq.act[1], 1000 * id.trajectory + id.step),
                _ => panic!("expected a sequence"),
            }
        }
    }

    #[test]
    fn test_update_hidden() {
        let config = DatasetConfig::default().sequence_length(2);
        let mut dataset = Dataset::build(trajectories(&[12]), &config).unwrap();
        // Master indices 2 and 5 are steps 6 and 9
        dataset.update_hidden(&[2, 5], vec![0.2, 0.5]).unwrap();
        let tr = &dataset.trajectories()[0];
        for s in 0..12 {
            match s {
                6 => assert_eq!(tr.hidden(s), Some(&0.2)),
                9 => assert_eq!(tr.hidden(s), Some(&0.5)),
                _ => assert_eq!(tr.hidden(s), None),
            }
        }

        let err = dataset.update_hidden(&[1], vec![]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TandemError>(),
            Some(&TandemError::LengthMismatch {
                indices: 1,
                hidden: 0
            })
        );
        assert!(dataset.update_hidden(&[9], vec![0.0]).is_err());
    }
}
