//! Configuration of [`TrajectoryDataset`](super::TrajectoryDataset).
use crate::CurriculumConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`TrajectoryDataset`](super::TrajectoryDataset).
///
/// # Examples
///
/// ```rust
/// use tandem_core::{CurriculumConfig, DatasetConfig};
///
/// // Sequences of 32 steps with a curriculum
/// let config = DatasetConfig::default()
///     .sequence_length(32)
///     .curriculum(Some(CurriculumConfig::default().initial_curriculum_size(100)));
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DatasetConfig {
    /// Length of sampled sequences. `0` selects single-step samples.
    pub sequence_length: usize,

    /// Curriculum applied to the samples. `None` disables curriculum training.
    pub curriculum: Option<CurriculumConfig>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            sequence_length: 0,
            curriculum: None,
        }
    }
}

impl DatasetConfig {
    /// Sets the sequence length.
    pub fn sequence_length(mut self, v: usize) -> Self {
        self.sequence_length = v;
        self
    }

    /// Sets the curriculum.
    pub fn curriculum(mut self, v: Option<CurriculumConfig>) -> Self {
        self.curriculum = v;
        self
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
