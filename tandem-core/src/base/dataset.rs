//! Random-access sample sources.
use anyhow::Result;

/// A random-access container of samples.
///
/// [`BatchLoader`](crate::BatchLoader) iterates over any implementation of
/// this trait in shuffled batches.
pub trait DatasetBase {
    /// Type of samples.
    type Item;

    /// Returns the number of samples currently visible.
    fn len(&self) -> usize;

    /// Returns `true` if no sample is visible.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the sample at visible position `i` and its master index.
    ///
    /// The master index is stable across curriculum updates and is the key
    /// to use when writing hidden states back.
    fn get(&self, i: usize) -> Result<(Self::Item, usize)>;

    /// Returns the generation of the set of visible samples.
    ///
    /// The generation changes every time the visible positions are remapped.
    /// Static datasets can keep the default.
    fn generation(&self) -> u64 {
        0
    }
}
