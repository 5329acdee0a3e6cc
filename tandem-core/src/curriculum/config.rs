//! Configuration of [`CurriculumFilter`](super::CurriculumFilter).
use crate::error::TandemError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Configuration of [`CurriculumFilter`](super::CurriculumFilter).
///
/// # Examples
///
/// ```rust
/// use tandem_core::CurriculumConfig;
///
/// let config = CurriculumConfig::default()
///     .initial_curriculum_size(50)
///     .extracurricular_sparsity(20)
///     .emphasize_new_samples(true)
///     .emphasized_fraction(0.1)
///     .emphasis_relative_sample_frequency(3);
/// assert!(config.check().is_ok());
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CurriculumConfig {
    /// Steps with a local index below this value are always included.
    pub initial_curriculum_size: usize,

    /// Every `extracurricular_sparsity`-th step that is otherwise excluded is
    /// included anyway, with a random phase drawn on every update.
    pub extracurricular_sparsity: usize,

    /// If `true`, steps newly unlocked by the current fraction are repeated.
    pub emphasize_new_samples: bool,

    /// Width of the band of newly unlocked steps, as a fraction of the
    /// trajectory length.
    pub emphasized_fraction: f64,

    /// How many times steps in the emphasized band appear in total.
    pub emphasis_relative_sample_frequency: usize,

    /// Seed of the random phase of extracurricular samples.
    pub seed: u64,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            initial_curriculum_size: 0,
            extracurricular_sparsity: usize::MAX,
            emphasize_new_samples: false,
            emphasized_fraction: 0.1,
            emphasis_relative_sample_frequency: 1,
            seed: 42,
        }
    }
}

impl CurriculumConfig {
    /// Sets the size of the always-included prefix.
    pub fn initial_curriculum_size(mut self, v: usize) -> Self {
        self.initial_curriculum_size = v;
        self
    }

    /// Sets the sparsity of extracurricular samples.
    pub fn extracurricular_sparsity(mut self, v: usize) -> Self {
        self.extracurricular_sparsity = v;
        self
    }

    /// Enables or disables emphasis of newly unlocked samples.
    pub fn emphasize_new_samples(mut self, v: bool) -> Self {
        self.emphasize_new_samples = v;
        self
    }

    /// Sets the width of the emphasized band.
    pub fn emphasized_fraction(mut self, v: f64) -> Self {
        self.emphasized_fraction = v;
        self
    }

    /// Sets the relative sample frequency of emphasized samples.
    pub fn emphasis_relative_sample_frequency(mut self, v: usize) -> Self {
        self.emphasis_relative_sample_frequency = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns the fraction at which the curriculum stops changing.
    pub fn final_curriculum_fraction(&self) -> f64 {
        if self.emphasize_new_samples {
            1.0 + self.emphasized_fraction
        } else {
            1.0
        }
    }

    /// Checks the values.
    pub fn check(&self) -> Result<()> {
        if self.extracurricular_sparsity == 0 {
            return Err(TandemError::InvalidConfig(
                "extracurricular_sparsity must be at least 1".to_string(),
            ))?;
        }
        if self.emphasis_relative_sample_frequency == 0 {
            return Err(TandemError::InvalidConfig(
                "emphasis_relative_sample_frequency must be at least 1".to_string(),
            ))?;
        }
        if self.emphasize_new_samples
            && !(self.emphasized_fraction > 0.0 && self.emphasized_fraction < 1.0)
        {
            return Err(TandemError::InvalidConfig(format!(
                "emphasized_fraction must be in (0, 1), got {}",
                self.emphasized_fraction
            )))?;
        }
        Ok(())
    }
}
