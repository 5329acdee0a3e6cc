//! Replay buffer mixing expert demonstrations with online experience.
mod config;
use crate::{
    batch::IndexedBatch,
    error::TandemError,
    trajectory::{Sample, State},
    BatchLoader, Collate, ExperienceBufferBase, ReplayBuffer, Step, TrajectoryDataset,
};
use anyhow::Result;
pub use config::MixedReplayBufferConfig;
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};

/// Expert and replay parts of a mixed batch.
#[derive(Clone, Debug, PartialEq)]
pub struct MixedBatch<B> {
    /// Samples from the expert dataset, indexed by master index.
    pub expert: IndexedBatch<B>,

    /// Samples from the online replay buffer, indexed by pool position.
    pub replay: IndexedBatch<B>,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// A replay buffer drawing a fixed fraction of every batch from expert data.
///
/// Expert samples come from a [`TrajectoryDataset`] through a shuffled
/// [`BatchLoader`] that drops the last incomplete batch. Replay samples are
/// drawn uniformly from an online [`ReplayBuffer`], which is also where new
/// experience goes.
///
/// ```mermaid
/// graph LR
///     Env -->|push| ReplayBuffer
///     ExpertDataset --> BatchLoader
///     BatchLoader -->|expert| MixedBatch
///     ReplayBuffer -->|replay| MixedBatch
///     MixedBatch --> Model
///     Model -->|update_hidden| ReplayBuffer
///     Model -->|update_hidden| ExpertDataset
/// ```
///
/// The training loop reports its progress with
/// [`update_curriculum`](Self::update_curriculum). Every
/// `curriculum_refresh_steps` steps, until the final curriculum fraction is
/// reached, the expert curriculum is recomputed and the loader replaced. When
/// the loader runs out, it is replaced as well, after refreshing the
/// curriculum at the last reported fraction.
pub struct MixedReplayBuffer<O, A, H, B = Vec<Sample<O, A, H>>> {
    config: MixedReplayBufferConfig,
    expert: TrajectoryDataset<O, A, H>,
    replay: ReplayBuffer<O, A, H, B>,
    loader: BatchLoader,
    rng: StdRng,
    curriculum_fraction: f64,
}

impl<O, A, H, B> MixedReplayBuffer<O, A, H, B>
where
    O: Clone,
    A: Clone,
    H: Clone,
{
    /// Builds a mixed buffer.
    ///
    /// `initial_replay` is moved into the buffer if given; an empty replay
    /// buffer is created from `config.replay` otherwise. The expert dataset
    /// and the replay buffer must use the same sequence length.
    pub fn build(
        config: &MixedReplayBufferConfig,
        expert: TrajectoryDataset<O, A, H>,
        initial_replay: Option<ReplayBuffer<O, A, H, B>>,
    ) -> Result<Self> {
        config.check()?;
        let replay = match initial_replay {
            Some(replay) => replay,
            None => ReplayBuffer::new(&config.replay),
        };
        let replay_sequence_length = replay.sequence_length().unwrap_or(0);
        if replay_sequence_length != expert.sequence_length() {
            return Err(TandemError::InvalidConfig(format!(
                "sequence lengths of expert dataset ({}) and replay buffer ({}) differ",
                expert.sequence_length(),
                replay_sequence_length
            )))?;
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let loader = BatchLoader::new(
            &expert,
            config.expert_batch_size(),
            config.num_workers,
            &mut rng,
        );
        info!(
            "Mixed replay buffer with {} expert and {} replay samples per batch",
            config.expert_batch_size(),
            config.replay_batch_size()
        );

        Ok(Self {
            config: config.clone(),
            expert,
            replay,
            loader,
            rng,
            curriculum_fraction: 0.0,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MixedReplayBufferConfig {
        &self.config
    }

    /// Returns the expert dataset.
    pub fn expert(&self) -> &TrajectoryDataset<O, A, H> {
        &self.expert
    }

    /// Returns the online replay buffer.
    pub fn replay(&self) -> &ReplayBuffer<O, A, H, B> {
        &self.replay
    }

    /// Takes the online replay buffer out, e.g. to seed another mixed buffer.
    pub fn into_replay(self) -> ReplayBuffer<O, A, H, B> {
        self.replay
    }

    /// Returns the number of expert samples in a batch.
    pub fn expert_batch_size(&self) -> usize {
        self.config.expert_batch_size()
    }

    /// Returns the number of replay samples in a batch.
    pub fn replay_batch_size(&self) -> usize {
        self.config.replay_batch_size()
    }

    /// Returns the last reported curriculum fraction.
    pub fn curriculum_fraction(&self) -> f64 {
        self.curriculum_fraction
    }

    /// Returns the number of samples in the replay pool.
    pub fn len(&self) -> usize {
        self.replay.len()
    }

    /// Returns `true` if the replay pool is empty.
    pub fn is_empty(&self) -> bool {
        self.replay.is_empty()
    }

    /// Starts a new online trajectory.
    pub fn new_trajectory(&mut self, init_obs: O) {
        self.replay.new_trajectory(init_obs)
    }

    /// Appends a step to the current online trajectory.
    pub fn append_step(&mut self, act: A, reward: f32, next_obs: O, is_done: bool) -> Result<()> {
        self.replay.append_step(act, reward, next_obs, is_done)
    }

    fn reset_loader(&mut self) {
        self.loader = BatchLoader::new(
            &self.expert,
            self.config.expert_batch_size(),
            self.config.num_workers,
            &mut self.rng,
        );
        debug!(
            "Expert loader reinitialized with {} batches",
            self.loader.remaining()
        );
    }

    /// Records the training progress and refreshes the curriculum when due.
    ///
    /// The refresh happens if `step` is a multiple of
    /// `curriculum_refresh_steps` and `fraction` is below the final
    /// curriculum fraction. Returns the fraction of the expert master lookup
    /// eligible afterwards.
    pub fn update_curriculum(&mut self, step: usize, fraction: f64) -> Result<f32> {
        self.curriculum_fraction = fraction;
        if step % self.config.curriculum_refresh_steps == 0
            && fraction < self.expert.final_curriculum_fraction()
        {
            self.expert.update_curriculum(fraction)?;
            self.reset_loader();
        }
        Ok(self.expert.curriculum_inclusion())
    }

    /// Writes hidden states back to the replay buffer and the expert dataset.
    ///
    /// Indices are the `ixs` of the two parts of a [`MixedBatch`].
    pub fn update_hidden(
        &mut self,
        replay_ixs: &[usize],
        replay_hidden: Vec<H>,
        expert_ixs: &[usize],
        expert_hidden: Vec<H>,
    ) -> Result<()> {
        self.replay.update_hidden(replay_ixs, replay_hidden)?;
        self.expert.update_hidden(expert_ixs, expert_hidden)
    }
}

impl<O, A, H, B> MixedReplayBuffer<O, A, H, B>
where
    O: Clone + Send + Sync,
    A: Clone + Send + Sync,
    H: Clone + Send + Sync,
    B: Collate<Item = Sample<O, A, H>>,
{
    /// Returns the next expert batch.
    ///
    /// If the loader is exhausted, the curriculum is refreshed at the last
    /// reported fraction, the loader replaced and the batch requested once
    /// more. Fails with [`TandemError::EmptyPool`] if no expert sample is
    /// visible after the refresh, and with
    /// [`TandemError::ExpertPoolExhausted`] if the visible samples do not
    /// fill a batch.
    pub fn sample_expert(&mut self) -> Result<IndexedBatch<B>> {
        if let Some(batch) = self.loader.next_batch(&self.expert)? {
            return Ok(batch);
        }

        if self.expert.is_curriculum_training() {
            self.expert.update_curriculum(self.curriculum_fraction)?;
        }
        self.reset_loader();
        if self.expert.is_empty() {
            return Err(TandemError::EmptyPool)?;
        }

        match self.loader.next_batch(&self.expert)? {
            Some(batch) => Ok(batch),
            None => Err(TandemError::ExpertPoolExhausted)?,
        }
    }

    /// Returns a batch from the online replay buffer.
    pub fn sample_replay(&mut self) -> Result<IndexedBatch<B>> {
        let size = self.config.replay_batch_size();
        self.replay.sample(size)
    }

    /// Returns a mixed batch.
    ///
    /// The replay part is drawn first, so a failure on an empty replay pool
    /// leaves the expert loader untouched.
    pub fn sample(&mut self) -> Result<MixedBatch<B>> {
        let replay = self.sample_replay()?;
        Ok(MixedBatch {
            expert: self.sample_expert()?,
            replay,
        })
    }

    /// Returns the latest observation and hidden state of the current online trajectory.
    pub fn current_state(&self) -> Option<State<O, H>> {
        self.replay.current_state()
    }
}

impl<O, A, H, B> ExperienceBufferBase for MixedReplayBuffer<O, A, H, B> {
    type Item = Step<O, A>;

    fn push(&mut self, step: Step<O, A>) -> Result<()> {
        self.replay.push(step)
    }

    fn len(&self) -> usize {
        self.replay.len()
    }
}
