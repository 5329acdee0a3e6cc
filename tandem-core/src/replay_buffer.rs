//! Online replay buffer filled by the environment loop.
mod config;
use crate::{
    batch::IndexedBatch,
    error::TandemError,
    index::{SequenceIndex, StepId, StepIndex},
    trajectory::{Sample, State, Trajectory},
    Collate, ExperienceBufferBase, ReplayBufferBase, Step,
};
use anyhow::Result;
pub use config::ReplayBufferConfig;
use rand::{rngs::StdRng, SeedableRng};
use std::marker::PhantomData;

/// A replay buffer of trajectories collected online.
///
/// Steps are appended to the latest trajectory; a new one is started with
/// [`new_trajectory`](Self::new_trajectory). The *pool* is the step index in
/// step mode and the sequence index in sequence mode. Both indices grow
/// incrementally and never get reordered, so pool positions are stable and
/// serve as keys for [`update_hidden`](Self::update_hidden).
///
/// `B` is the collated batch type returned by [`sample`](Self::sample).
pub struct ReplayBuffer<O, A, H, B = Vec<Sample<O, A, H>>> {
    trajectories: Vec<Trajectory<O, A, H>>,
    steps: StepIndex,
    sequences: Option<SequenceIndex>,
    rng: StdRng,
    phantom: PhantomData<fn() -> B>,
}

impl<O, A, H, B> ReplayBuffer<O, A, H, B> {
    /// Creates an empty buffer.
    pub fn new(config: &ReplayBufferConfig) -> Self {
        Self::from_trajectories(vec![], config)
    }

    /// Creates a buffer holding the given trajectories.
    ///
    /// The last trajectory becomes the current one, so steps can be appended
    /// to it if it is not done.
    pub fn from_trajectories(
        trajectories: Vec<Trajectory<O, A, H>>,
        config: &ReplayBufferConfig,
    ) -> Self {
        let steps = StepIndex::from_trajectories(&trajectories);
        let sequences = config
            .effective_sequence_length()
            .map(|n| SequenceIndex::build(&steps, n));
        Self {
            trajectories,
            steps,
            sequences,
            rng: StdRng::seed_from_u64(config.seed),
            phantom: PhantomData,
        }
    }

    /// Takes the trajectories out of the buffer.
    pub fn into_trajectories(self) -> Vec<Trajectory<O, A, H>> {
        self.trajectories
    }

    /// Starts a new trajectory.
    pub fn new_trajectory(&mut self, init_obs: O) {
        self.trajectories.push(Trajectory::new(init_obs));
    }

    /// Appends a step to the current trajectory.
    pub fn append_step(&mut self, act: A, reward: f32, next_obs: O, is_done: bool) -> Result<()> {
        let t = match self.trajectories.len() {
            0 => return Err(TandemError::NoActiveTrajectory)?,
            n => n - 1,
        };
        let tr = &mut self.trajectories[t];
        tr.push(act, reward, next_obs, is_done)?;

        let id = StepId::new(t, tr.len() - 1);
        self.steps.push(id);
        if let Some(sequences) = self.sequences.as_mut() {
            sequences.observe(id);
        }
        Ok(())
    }

    fn pool(&self) -> &[StepId] {
        match &self.sequences {
            Some(sequences) => sequences.as_slice(),
            None => self.steps.as_slice(),
        }
    }

    /// Returns the number of entries that can be sampled.
    pub fn len(&self) -> usize {
        self.pool().len()
    }

    /// Returns `true` if nothing can be sampled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of steps over all trajectories.
    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    /// Returns the number of trajectories, the current one included.
    pub fn num_trajectories(&self) -> usize {
        self.trajectories.len()
    }

    /// Returns the sequence length, `None` in step mode.
    pub fn sequence_length(&self) -> Option<usize> {
        self.sequences.as_ref().map(|s| s.sequence_length())
    }

    /// Returns the trajectories.
    pub fn trajectories(&self) -> &[Trajectory<O, A, H>] {
        &self.trajectories
    }

    /// Returns the trajectory steps are appended to.
    pub fn current_trajectory(&self) -> Option<&Trajectory<O, A, H>> {
        self.trajectories.last()
    }

    /// Writes hidden states to the steps behind the given pool positions.
    pub fn update_hidden(&mut self, ixs: &[usize], hidden: Vec<H>) -> Result<()> {
        if ixs.len() != hidden.len() {
            return Err(TandemError::LengthMismatch {
                indices: ixs.len(),
                hidden: hidden.len(),
            })?;
        }

        let pool = match &self.sequences {
            Some(sequences) => sequences.as_slice(),
            None => self.steps.as_slice(),
        };
        for (&ix, h) in ixs.iter().zip(hidden.into_iter()) {
            let id = match pool.get(ix) {
                Some(&id) => id,
                None => {
                    return Err(TandemError::OutOfRange {
                        index: ix,
                        len: pool.len(),
                    })?
                }
            };
            self.trajectories[id.trajectory].update_hidden(id.step, h)?;
        }
        Ok(())
    }
}

impl<O, A, H, B> ReplayBuffer<O, A, H, B>
where
    O: Clone,
    A: Clone,
    H: Clone,
{
    /// Returns the sample at pool position `i`.
    pub fn get(&self, i: usize) -> Result<Sample<O, A, H>> {
        let id = match self.pool().get(i) {
            Some(&id) => id,
            None => {
                return Err(TandemError::OutOfRange {
                    index: i,
                    len: self.len(),
                })?
            }
        };
        let tr = &self.trajectories[id.trajectory];
        match &self.sequences {
            Some(sequences) => Ok(Sample::Sequence(
                tr.get_sequence(id.step, sequences.sequence_length())?,
            )),
            None => Ok(Sample::Step(tr.get_step(id.step)?)),
        }
    }

    /// Returns the latest observation and hidden state of the current trajectory.
    pub fn current_state(&self) -> Option<State<O, H>> {
        self.current_trajectory().map(|tr| tr.current_state())
    }

    /// Samples `min(k, len())` entries uniformly without replacement.
    ///
    /// Fails with [`TandemError::EmptyPool`] if `k > 0` and nothing can be
    /// sampled. `k == 0` gives an empty batch.
    pub fn sample(&mut self, k: usize) -> Result<IndexedBatch<B>>
    where
        B: Collate<Item = Sample<O, A, H>>,
    {
        let pool = self.len();
        if k > 0 && pool == 0 {
            return Err(TandemError::EmptyPool)?;
        }

        let ixs = rand::seq::index::sample(&mut self.rng, pool, k.min(pool)).into_vec();
        let samples = ixs
            .into_iter()
            .map(|i| Ok((self.get(i)?, i)))
            .collect::<Result<Vec<_>>>()?;
        IndexedBatch::collate(samples)
    }
}

impl<O, A, H, B> ExperienceBufferBase for ReplayBuffer<O, A, H, B> {
    type Item = Step<O, A>;

    /// Appends the step; a done step carrying `init_obs` starts the next trajectory.
    fn push(&mut self, step: Step<O, A>) -> Result<()> {
        let Step {
            act,
            obs,
            reward,
            is_done,
            init_obs,
        } = step;
        self.append_step(act, reward, obs, is_done)?;
        if let (true, Some(init_obs)) = (is_done, init_obs) {
            self.new_trajectory(init_obs);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        ReplayBuffer::len(self)
    }
}

impl<O, A, H, B> ReplayBufferBase for ReplayBuffer<O, A, H, B>
where
    O: Clone,
    A: Clone,
    H: Clone,
    B: Collate<Item = Sample<O, A, H>>,
{
    type Config = ReplayBufferConfig;
    type Batch = IndexedBatch<B>;
    type Hidden = H;

    fn build(config: &Self::Config) -> Self {
        Self::new(config)
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.sample(size)
    }

    fn update_hidden(&mut self, ixs: &[usize], hidden: Vec<H>) -> Result<()> {
        ReplayBuffer::update_hidden(self, ixs, hidden)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::batch::{SequenceBatch, TransitionBatch};

    type Buffer<B> = ReplayBuffer<usize, usize, f32, B>;
    type Samples = Vec<Sample<usize, usize, f32>>;
    type Transitions = TransitionBatch<usize, usize, f32>;
    type Sequences = SequenceBatch<usize, usize, f32>;

    /// Fills a buffer with episodes of the given lengths; observations are `1000 * t + s`.
    fn fill<B>(buffer: &mut Buffer<B>, lengths: &[usize]) {
        for (t, &n) in lengths.iter().enumerate() {
            buffer.new_trajectory(1000 * t);
            for s in 0..n {
                buffer
                    .append_step(1000 * t + s, 1.0, 1000 * t + s + 1, s + 1 == n)
                    .unwrap();
            }
        }
    }

    #[test]
    fn test_append_before_trajectory() {
        let mut buffer = Buffer::<Samples>::new(&ReplayBufferConfig::default());
        let err = buffer.append_step(0, 0.0, 1, false).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TandemError>(),
            Some(&TandemError::NoActiveTrajectory)
        );
    }

    #[test]
    fn test_sample_without_replacement() {
        let mut buffer = Buffer::<Transitions>::new(&ReplayBufferConfig::default());
        fill(&mut buffer, &[5, 3]);
        assert_eq!(buffer.len(), 8);

        for k in [1, 4, 8, 20] {
            let batch = buffer.sample(k).unwrap();
            assert_eq!(batch.len(), k.min(8));
            let mut ixs = batch.ixs.clone();
            ixs.sort();
            ixs.dedup();
            assert_eq!(ixs.len(), batch.len());
            for (obs, act) in batch.batch.obs.iter().zip(batch.batch.act.iter()) {
                assert_eq!(obs, act);
            }
        }
        assert!(buffer.sample(0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_pool() {
        let config = ReplayBufferConfig::default().sequence_length(Some(3));
        let mut buffer = Buffer::<Sequences>::new(&config);
        fill(&mut buffer, &[4]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.num_steps(), 4);
        let err = buffer.sample(2).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TandemError>(),
            Some(&TandemError::EmptyPool)
        );
        assert!(buffer.sample(0).unwrap().is_empty());
    }

    #[test]
    fn test_incremental_sequence_index() {
        let config = ReplayBufferConfig::default().sequence_length(Some(3));
        let mut buffer = Buffer::<Samples>::new(&config);
        fill(&mut buffer, &[10, 4, 7]);

        let rebuilt = Buffer::<Samples>::from_trajectories(
            buffer.trajectories().to_vec(),
            &config,
        );
        assert_eq!(buffer.pool(), rebuilt.pool());
        assert_eq!(buffer.len(), 7);
        let steps = buffer.pool().iter().map(|id| id.step).collect::<Vec<_>>();
        assert_eq!(steps, vec![5, 6, 7, 8, 9, 5, 6]);
    }

    #[test]
    fn test_hidden_write_back() {
        let config = ReplayBufferConfig::default().sequence_length(Some(2));
        let mut buffer = Buffer::<Sequences>::new(&config);
        fill(&mut buffer, &[8, 8]);
        // Pool positions 0 and 4 end at step 4 of each trajectory
        buffer.update_hidden(&[0, 4], vec![1.0, 2.0]).unwrap();

        for (t, tr) in buffer.trajectories().iter().enumerate() {
            for s in 0..tr.len() {
                let expected = match (t, s) {
                    (0, 4) => Some(&1.0),
                    (1, 4) => Some(&2.0),
                    _ => None,
                };
                assert_eq!(tr.hidden(s), expected);
            }
        }

        // A window starting at step 5 is initialized from step 4
        match buffer.get(2).unwrap() {
            Sample::Sequence(seq) => {
                assert_eq!(seq.act, vec![5, 6]);
                assert_eq!(seq.initial_hidden, Some(1.0));
            }
            _ => panic!("expected a sequence"),
        }
        assert!(buffer.update_hidden(&[8], vec![0.0]).is_err());
    }

    #[test]
    fn test_push_starts_next_trajectory() {
        let mut buffer = Buffer::<Samples>::new(&ReplayBufferConfig::default());
        buffer.new_trajectory(0);
        buffer.push(Step::new(0, 1, 1.0, false, None)).unwrap();
        buffer.push(Step::new(1, 2, 1.0, true, Some(100))).unwrap();
        assert_eq!(buffer.num_trajectories(), 2);
        assert_eq!(buffer.num_steps(), 2);
        assert_eq!(buffer.current_state().map(|s| s.obs), Some(100));

        buffer.push(Step::new(100, 101, 0.5, false, None)).unwrap();
        assert_eq!(buffer.current_trajectory().map(|tr| tr.len()), Some(1));
        assert_eq!(ExperienceBufferBase::len(&buffer), 3);
    }

    /// Draws a batch through the trait and caches `h` for every sample.
    fn train_step<R>(buffer: &mut R, size: usize, h: f32) -> Vec<usize>
    where
        R: ReplayBufferBase<Batch = IndexedBatch<Sequences>, Hidden = f32>,
    {
        let batch = buffer.batch(size).unwrap();
        assert!(batch.batch.act.iter().all(|act| act.len() == 2));
        let ixs = batch.ixs;
        buffer.update_hidden(&ixs, vec![h; ixs.len()]).unwrap();
        ixs
    }

    #[test]
    fn test_replay_buffer_base() {
        let config = ReplayBufferConfig::default().sequence_length(Some(2));
        let mut buffer = <Buffer<Sequences> as ReplayBufferBase>::build(&config);
        fill(&mut buffer, &[8, 8]);

        let ixs = train_step(&mut buffer, 3, 0.5);
        assert_eq!(ixs.len(), 3);
        let cached = buffer
            .trajectories()
            .iter()
            .map(|tr| (0..tr.len()).filter(|&s| tr.hidden(s) == Some(&0.5)).count())
            .sum::<usize>();
        assert_eq!(cached, 3);

        // Short pools give what they have
        assert_eq!(train_step(&mut buffer, 20, 1.0).len(), 8);
    }
}
