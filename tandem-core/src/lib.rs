#![warn(missing_docs)]
//! Data core for reinforcement learning from expert demonstrations and online experience.
//!
//! * [`Trajectory`] stores one episode and materializes single steps or
//!   fixed-length windows of steps from it.
//! * [`StepIndex`] and [`SequenceIndex`] map flat sample positions to steps.
//! * [`CurriculumFilter`] restricts expert samples to the early part of each
//!   trajectory, unlocking later steps as training progresses.
//! * [`TrajectoryDataset`] serves expert samples, [`ReplayBuffer`] online
//!   ones, and [`MixedReplayBuffer`] combines the two into every batch.
//!
//! Recurrent models write their hidden states back through the
//! `update_hidden()` methods, keyed by the indices returned with each batch.
pub mod error;

mod base;
pub use base::{Collate, DatasetBase, ExperienceBufferBase, ReplayBufferBase, Step};

mod trajectory;
pub use trajectory::{Sample, Sequence, State, Trajectory, Transition};

mod index;
pub use index::{SequenceIndex, StepId, StepIndex};

mod curriculum;
pub use curriculum::{CurriculumConfig, CurriculumFilter, CurriculumSnapshot};

mod batch;
pub use batch::{IndexedBatch, SequenceBatch, TransitionBatch};

mod dataset;
pub use dataset::{DatasetConfig, TrajectoryDataset};

mod loader;
pub use loader::BatchLoader;

mod replay_buffer;
pub use replay_buffer::{ReplayBuffer, ReplayBufferConfig};

mod mixed;
pub use mixed::{MixedBatch, MixedReplayBuffer, MixedReplayBufferConfig};

pub use error::TandemError;
