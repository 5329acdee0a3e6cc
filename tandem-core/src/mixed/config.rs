//! Configuration of [`MixedReplayBuffer`](super::MixedReplayBuffer).
use crate::{error::TandemError, ReplayBufferConfig};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`MixedReplayBuffer`](super::MixedReplayBuffer).
///
/// # Examples
///
/// ```rust
/// use tandem_core::{MixedReplayBufferConfig, ReplayBufferConfig};
///
/// let config = MixedReplayBufferConfig::default()
///     .batch_size(64)
///     .expert_sample_fraction(0.3)
///     .replay(ReplayBufferConfig::default().sequence_length(Some(16)));
/// assert_eq!(config.expert_batch_size(), 19);
/// assert_eq!(config.replay_batch_size(), 45);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MixedReplayBufferConfig {
    /// Total number of samples in a mixed batch.
    pub batch_size: usize,

    /// Fraction of a batch drawn from the expert dataset.
    pub expert_sample_fraction: f64,

    /// Number of training steps between curriculum refreshes.
    pub curriculum_refresh_steps: usize,

    /// Number of threads fetching expert samples.
    pub num_workers: usize,

    /// Seed of the random generator shuffling expert samples.
    pub seed: u64,

    /// Configuration of the online replay buffer.
    pub replay: ReplayBufferConfig,
}

impl Default for MixedReplayBufferConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            expert_sample_fraction: 0.5,
            curriculum_refresh_steps: 1000,
            num_workers: 4,
            seed: 42,
            replay: ReplayBufferConfig::default(),
        }
    }
}

impl MixedReplayBufferConfig {
    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the fraction of expert samples.
    pub fn expert_sample_fraction(mut self, v: f64) -> Self {
        self.expert_sample_fraction = v;
        self
    }

    /// Sets the number of steps between curriculum refreshes.
    pub fn curriculum_refresh_steps(mut self, v: usize) -> Self {
        self.curriculum_refresh_steps = v;
        self
    }

    /// Sets the number of fetching threads.
    pub fn num_workers(mut self, v: usize) -> Self {
        self.num_workers = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the configuration of the replay buffer.
    pub fn replay(mut self, v: ReplayBufferConfig) -> Self {
        self.replay = v;
        self
    }

    /// Returns the number of expert samples in a batch, rounded down.
    pub fn expert_batch_size(&self) -> usize {
        (self.batch_size as f64 * self.expert_sample_fraction).floor() as usize
    }

    /// Returns the number of replay samples in a batch.
    pub fn replay_batch_size(&self) -> usize {
        self.batch_size - self.expert_batch_size()
    }

    /// Checks the values of the configuration.
    pub fn check(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(TandemError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ))?;
        }
        if !(0.0..=1.0).contains(&self.expert_sample_fraction) {
            return Err(TandemError::InvalidConfig(format!(
                "expert_sample_fraction must be in [0, 1], got {}",
                self.expert_sample_fraction
            )))?;
        }
        if self.curriculum_refresh_steps == 0 {
            return Err(TandemError::InvalidConfig(
                "curriculum_refresh_steps must be positive".to_string(),
            ))?;
        }
        Ok(())
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
