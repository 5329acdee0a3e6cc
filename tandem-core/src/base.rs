//! Core interfaces.
mod batch;
mod dataset;
mod replay_buffer;
mod step;
pub use batch::Collate;
pub use dataset::DatasetBase;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
pub use step::Step;
