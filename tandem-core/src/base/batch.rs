//! Collation of samples into batches.
use anyhow::Result;

/// Merges a list of samples with identical structure into one batch.
///
/// Implementations must preserve the order of `items`. Bookkeeping indices
/// returned by datasets and replay buffers are never passed to this trait;
/// they travel next to the batch in [`IndexedBatch`](crate::IndexedBatch).
///
/// # Examples
///
/// ```ignore
/// struct Rewards(Vec<f32>);
///
/// impl Collate for Rewards {
///     type Item = Sample<Obs, Act, Hidden>;
///
///     fn collate(items: Vec<Self::Item>) -> Result<Self> {
///         let rewards = items.into_iter().map(|s| match s {
///             Sample::Step(tr) => Ok(tr.reward),
///             Sample::Sequence(_) => Err(anyhow!("expected steps")),
///         });
///         Ok(Rewards(rewards.collect::<Result<_>>()?))
///     }
/// }
/// ```
pub trait Collate: Sized {
    /// Type of samples to be collated.
    type Item;

    /// Collates samples into a batch.
    fn collate(items: Vec<Self::Item>) -> Result<Self>;
}

impl<T> Collate for Vec<T> {
    type Item = T;

    fn collate(items: Vec<T>) -> Result<Self> {
        Ok(items)
    }
}
