//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Functions in this crate return [`anyhow::Result`]; callers that need to
/// react to a particular condition can downcast with
/// `err.downcast_ref::<TandemError>()`.
#[derive(Error, Debug, PartialEq)]
pub enum TandemError {
    /// An index (step, window end, pool position) is out of range.
    #[error("Index {index} is out of range for length {len}")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The length of the indexed collection.
        len: usize,
    },

    /// A sequence window would start before the first step of its trajectory.
    #[error("Sequence of length {length} ending at step {end} starts before the trajectory")]
    WindowBeforeStart {
        /// Last step of the requested window.
        end: usize,
        /// Requested window length.
        length: usize,
    },

    /// No entries are eligible for sampling.
    #[error("No samples are eligible in the pool")]
    EmptyPool,

    /// The expert batch loader was exhausted twice in a row.
    #[error("Expert batch loader exhausted right after reinitialization")]
    ExpertPoolExhausted,

    /// A batch loader was used against a curriculum snapshot it was not built for.
    #[error("Batch loader built for curriculum generation {expected}, dataset is at {found}")]
    StaleSnapshot {
        /// Generation the loader was built against.
        expected: u64,
        /// Current generation of the dataset.
        found: u64,
    },

    /// Index and hidden-state slices passed to a write-back have different lengths.
    #[error("Got {indices} indices but {hidden} hidden states")]
    LengthMismatch {
        /// Number of indices.
        indices: usize,
        /// Number of hidden states.
        hidden: usize,
    },

    /// A step was appended before any trajectory was started.
    #[error("No active trajectory, call new_trajectory() first")]
    NoActiveTrajectory,

    /// A step was appended to a trajectory that is already done.
    #[error("Trajectory is already done")]
    TrajectoryFinished,

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Samples could not be collated into a batch.
    #[error("Collation error: {0}")]
    Collate(String),

    /// A prefetch worker thread panicked.
    #[error("Batch loader worker panicked")]
    WorkerPanicked,
}
