use anyhow::Result;
use std::io::Write;
use tandem_core::{
    CurriculumConfig, DatasetConfig, MixedReplayBufferConfig, ReplayBufferConfig,
};
use tempdir::TempDir;
use test_log::test;

#[test]
fn test_dataset_config_round_trip() -> Result<()> {
    let dir = TempDir::new("dataset_config")?;
    let path = dir.path().join("dataset.yaml");
    let config = DatasetConfig::default().sequence_length(16).curriculum(Some(
        CurriculumConfig::default()
            .initial_curriculum_size(50)
            .extracurricular_sparsity(5)
            .emphasize_new_samples(true)
            .emphasized_fraction(0.2)
            .emphasis_relative_sample_frequency(3)
            .seed(7),
    ));
    config.save(&path)?;
    assert_eq!(DatasetConfig::load(&path)?, config);
    Ok(())
}

#[test]
fn test_mixed_config_round_trip() -> Result<()> {
    let dir = TempDir::new("mixed_config")?;
    let path = dir.path().join("mixed.yaml");
    let config = MixedReplayBufferConfig::default()
        .batch_size(128)
        .expert_sample_fraction(0.25)
        .curriculum_refresh_steps(500)
        .replay(ReplayBufferConfig::default().sequence_length(Some(16)).seed(3));
    config.save(&path)?;
    let loaded = MixedReplayBufferConfig::load(&path)?;
    assert_eq!(loaded, config);
    assert_eq!(loaded.expert_batch_size(), 32);
    Ok(())
}

#[test]
fn test_load_hand_written_config() -> Result<()> {
    let dir = TempDir::new("hand_written")?;
    let path = dir.path().join("mixed.yaml");
    let mut file = std::fs::File::create(&path)?;
    file.write_all(
        b"batch_size: 64
expert_sample_fraction: 0.3
curriculum_refresh_steps: 100
num_workers: 2
seed: 1
replay:
  sequence_length: 8
  seed: 2
",
    )?;
    let config = MixedReplayBufferConfig::load(&path)?;
    config.check()?;
    assert_eq!(config.expert_batch_size(), 19);
    assert_eq!(config.replay_batch_size(), 45);
    assert_eq!(config.replay.sequence_length, Some(8));
    Ok(())
}
