//! Shuffled batch iteration over a dataset.
use crate::{batch::IndexedBatch, error::TandemError, Collate, DatasetBase};
use anyhow::Result;
use crossbeam_channel::unbounded;
use rand::{seq::SliceRandom, Rng};

/// Iterates once over a dataset in shuffled batches of a fixed size.
///
/// The last incomplete batch is dropped. With `num_workers > 1`, the samples
/// of a batch are fetched on that many scoped worker threads, which only
/// borrow the dataset immutably for the duration of the call.
///
/// A loader is tied to the curriculum generation of the dataset it was
/// created for. Once the dataset remaps its visible positions, the loader
/// refuses to produce batches and has to be replaced.
#[derive(Clone, Debug)]
pub struct BatchLoader {
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
    num_workers: usize,
    generation: u64,
}

impl BatchLoader {
    /// Creates a loader with a fresh shuffled order of the visible samples.
    pub fn new<D, R>(dataset: &D, batch_size: usize, num_workers: usize, rng: &mut R) -> Self
    where
        D: DatasetBase,
        R: Rng + ?Sized,
    {
        let mut order = (0..dataset.len()).collect::<Vec<_>>();
        order.shuffle(rng);
        Self {
            order,
            cursor: 0,
            batch_size,
            num_workers,
            generation: dataset.generation(),
        }
    }

    /// Returns the batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the generation of the dataset this loader was created for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the number of full batches left.
    pub fn remaining(&self) -> usize {
        match self.batch_size {
            0 => usize::MAX,
            n => (self.order.len() - self.cursor) / n,
        }
    }

    /// Returns the next batch, or `None` if the loader is exhausted.
    pub fn next_batch<D, B>(&mut self, dataset: &D) -> Result<Option<IndexedBatch<B>>>
    where
        D: DatasetBase + Sync,
        D::Item: Send,
        B: Collate<Item = D::Item>,
    {
        if dataset.generation() != self.generation {
            return Err(TandemError::StaleSnapshot {
                expected: self.generation,
                found: dataset.generation(),
            })?;
        }
        if self.cursor + self.batch_size > self.order.len() {
            return Ok(None);
        }

        let positions = &self.order[self.cursor..self.cursor + self.batch_size];
        self.cursor += self.batch_size;

        let samples = if self.num_workers > 1 && positions.len() > 1 {
            fetch_parallel(dataset, positions, self.num_workers)?
        } else {
            positions
                .iter()
                .map(|&i| dataset.get(i))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Some(IndexedBatch::collate(samples)?))
    }
}

/// Fetches samples on worker threads, keeping the order of `positions`.
fn fetch_parallel<D>(
    dataset: &D,
    positions: &[usize],
    num_workers: usize,
) -> Result<Vec<(D::Item, usize)>>
where
    D: DatasetBase + Sync,
    D::Item: Send,
{
    let chunk_size = (positions.len() + num_workers - 1) / num_workers;
    let (sender, receiver) = unbounded();

    let joined = std::thread::scope(|scope| {
        let handles = positions
            .chunks(chunk_size)
            .enumerate()
            .map(|(k, chunk)| {
                let sender = sender.clone();
                scope.spawn(move || {
                    let samples = chunk
                        .iter()
                        .map(|&i| dataset.get(i))
                        .collect::<Result<Vec<_>>>();
                    // The receiver lives until all workers are joined
                    let _ = sender.send((k, samples));
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Vec<_>>()
    });
    drop(sender);

    if joined.iter().any(|r| r.is_err()) {
        return Err(TandemError::WorkerPanicked)?;
    }

    let mut chunks = receiver.try_iter().collect::<Vec<_>>();
    chunks.sort_by_key(|(k, _)| *k);
    let mut samples = Vec::with_capacity(positions.len());
    for (_, chunk) in chunks {
        samples.extend(chunk?);
    }
    Ok(samples)
}
