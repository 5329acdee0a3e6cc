//! Replay buffer interface.
//!
//! Experience buffers are filled step by step by the environment loop and
//! hand out batches to the training loop. Recurrent training additionally
//! writes hidden states back for the samples of each batch.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
///
/// # Examples
///
/// ```ignore
/// struct SimpleBuffer<T> {
///     items: Vec<T>,
/// }
///
/// impl<T> ExperienceBufferBase for SimpleBuffer<T> {
///     type Item = T;
///
///     fn push(&mut self, tr: T) -> Result<()> {
///         self.items.push(tr);
///         Ok(())
///     }
///
///     fn len(&self) -> usize {
///         self.items.len()
///     }
/// }
/// ```
pub trait ExperienceBufferBase {
    /// The type of experience pushed into the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the number of samples that can currently be drawn.
    fn len(&self) -> usize;

    /// Returns `true` if no sample can be drawn.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers that generate batches for training.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// The type of recurrent hidden states written back into the buffer.
    type Hidden;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Self;

    /// Constructs a batch of at most `size` samples.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;

    /// Writes hidden states back to the steps behind the given sample indices.
    ///
    /// `ixs` are the indices returned together with a batch, `hidden` holds
    /// one state per index in the same order.
    fn update_hidden(&mut self, ixs: &[usize], hidden: Vec<Self::Hidden>) -> Result<()>;
}
