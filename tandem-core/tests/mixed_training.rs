use anyhow::Result;
use log::info;
use tandem_core::{
    CurriculumConfig, DatasetConfig, ExperienceBufferBase, MixedReplayBuffer,
    MixedReplayBufferConfig, ReplayBuffer, ReplayBufferConfig, SequenceBatch, Step, Trajectory,
    TrajectoryDataset,
};
use test_log::test;

const SEQUENCE_LENGTH: usize = 4;
const EPISODE_LENGTH: usize = 20;
const ENV_STEPS: usize = 400;

type Obs = usize;
type Act = usize;
type Hidden = f32;
type Batch = SequenceBatch<Obs, Act, Hidden>;

fn expert_trajectories(n: usize, len: usize) -> Vec<Trajectory<Obs, Act, Hidden>> {
    (0..n)
        .map(|t| {
            let mut tr = Trajectory::new(1000 * t);
            for s in 0..len {
                tr.push(1000 * t + s, 1.0, 1000 * t + s + 1, s + 1 == len)
                    .unwrap();
            }
            tr
        })
        .collect()
}

fn expert_dataset() -> Result<TrajectoryDataset<Obs, Act, Hidden>> {
    let config = DatasetConfig::default()
        .sequence_length(SEQUENCE_LENGTH)
        .curriculum(Some(
            CurriculumConfig::default()
                .initial_curriculum_size(10)
                .emphasize_new_samples(true)
                .emphasized_fraction(0.1)
                .emphasis_relative_sample_frequency(2),
        ));
    TrajectoryDataset::build(expert_trajectories(4, 60), &config)
}

fn mixed_config() -> MixedReplayBufferConfig {
    MixedReplayBufferConfig::default()
        .batch_size(16)
        .expert_sample_fraction(0.5)
        .curriculum_refresh_steps(10)
        .num_workers(2)
        .replay(ReplayBufferConfig::default().sequence_length(Some(SEQUENCE_LENGTH)))
}

#[test]
fn test_mixed_training_loop() -> Result<()> {
    let mut buffer =
        MixedReplayBuffer::<Obs, Act, Hidden, Batch>::build(&mixed_config(), expert_dataset()?, None)?;
    let master_len = buffer.expert().master_len();
    // Windows end at steps 6..=59 of each expert trajectory
    assert_eq!(master_len, 4 * 54);

    buffer.new_trajectory(0);
    let mut obs = 0;
    let mut inclusion = buffer.expert().curriculum_inclusion();
    let mut n_batches = 0;

    for step in 0..ENV_STEPS {
        let is_done = (step + 1) % EPISODE_LENGTH == 0;
        let next_obs = obs + 1;
        let init_obs = if is_done { Some(0) } else { None };
        buffer.push(Step::new(step, next_obs, 0.0, is_done, init_obs))?;
        obs = if is_done { 0 } else { next_obs };

        let state = buffer.current_state().unwrap();
        assert_eq!(state.obs, obs);

        if buffer.is_empty() {
            continue;
        }

        let batch = buffer.sample()?;
        n_batches += 1;
        assert_eq!(batch.expert.len(), 8);
        assert!(batch.replay.len() <= 8);
        assert!(batch.expert.ixs.iter().all(|&ix| ix < master_len));
        assert!(batch
            .expert
            .batch
            .act
            .iter()
            .chain(batch.replay.batch.act.iter())
            .all(|act| act.len() == SEQUENCE_LENGTH));

        let expert_hidden = batch.expert.ixs.iter().map(|&ix| ix as f32).collect();
        let replay_hidden = batch.replay.ixs.iter().map(|&ix| ix as f32).collect();
        buffer.update_hidden(
            &batch.replay.ixs,
            replay_hidden,
            &batch.expert.ixs,
            expert_hidden,
        )?;

        let fraction = step as f64 / ENV_STEPS as f64;
        let new_inclusion = buffer.update_curriculum(step, fraction)?;
        assert!(new_inclusion >= inclusion);
        inclusion = new_inclusion;
    }

    info!(
        "{} batches, {} replay sequences, curriculum inclusion {}",
        n_batches,
        buffer.len(),
        inclusion
    );
    assert_eq!(buffer.replay().num_trajectories(), ENV_STEPS / EPISODE_LENGTH + 1);
    // Windows end at steps 6..=19 of each online episode
    assert_eq!(buffer.len(), (ENV_STEPS / EPISODE_LENGTH) * 14);
    assert!(inclusion > 0.9);

    Ok(())
}

#[test]
fn test_seeding_from_previous_buffer() -> Result<()> {
    let config = mixed_config();
    let mut first =
        MixedReplayBuffer::<Obs, Act, Hidden, Batch>::build(&config, expert_dataset()?, None)?;
    first.new_trajectory(0);
    for s in 0..30 {
        first.append_step(s, 0.0, s + 1, false)?;
    }
    let replay_len = first.len();

    // Hand the online experience over to a buffer with a fresh expert dataset
    let replay: ReplayBuffer<Obs, Act, Hidden, Batch> = first.into_replay();
    assert_eq!(replay.num_steps(), 30);
    let mut second = MixedReplayBuffer::build(&config, expert_dataset()?, Some(replay))?;
    assert_eq!(second.len(), replay_len);
    assert_eq!(second.replay().num_trajectories(), 1);
    second.append_step(30, 0.0, 31, true)?;
    assert_eq!(second.len(), replay_len + 1);
    assert_eq!(second.sample()?.replay.len(), 8);

    Ok(())
}
