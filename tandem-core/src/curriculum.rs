//! Curriculum over the steps of expert trajectories.
//!
//! Given a curriculum fraction `f` in `[0, 1]`, a step `s` of a trajectory of
//! length `n` is eligible if `s <= n * f`, so the early part of every
//! trajectory is unlocked first. In addition:
//!
//! * steps below `initial_curriculum_size` are always eligible,
//! * every `extracurricular_sparsity`-th remaining step is eligible, with a
//!   phase drawn from the filter's random generator on every update,
//! * with `emphasize_new_samples`, steps unlocked within the last
//!   `emphasized_fraction` are repeated so that they are drawn
//!   `emphasis_relative_sample_frequency` times as often.
//!
//! The result of an update is a [`CurriculumSnapshot`]: the eligible entries
//! and, for each of them, its position in the unfiltered index (the master
//! index). Snapshots are rebuilt from scratch and replaced as a whole.
mod config;
use crate::{error::TandemError, index::StepId};
use anyhow::Result;
pub use config::CurriculumConfig;
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Entries eligible for sampling under one curriculum fraction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurriculumSnapshot {
    fraction: f64,
    phase: usize,
    filtered: Vec<StepId>,
    cross_lookup: Vec<usize>,
    curriculum_length: usize,
    generation: u64,
}

impl CurriculumSnapshot {
    /// Returns the fraction this snapshot was computed for.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Returns the phase of extracurricular samples drawn for this snapshot.
    pub fn phase(&self) -> usize {
        self.phase
    }

    /// Returns the eligible entries, emphasized entries included.
    pub fn filtered(&self) -> &[StepId] {
        &self.filtered
    }

    /// Returns the master index of every filtered position.
    pub fn cross_lookup(&self) -> &[usize] {
        &self.cross_lookup
    }

    /// Returns the number of distinct eligible entries, before emphasis.
    pub fn curriculum_length(&self) -> usize {
        self.curriculum_length
    }

    /// Returns the number of filtered positions, emphasized entries included.
    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    /// Returns `true` if nothing is eligible.
    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// Returns the sequence number of this snapshot; `0` before the first update.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolves a filtered position to its entry and master index.
    pub fn resolve(&self, i: usize) -> Option<(StepId, usize)> {
        Some((*self.filtered.get(i)?, *self.cross_lookup.get(i)?))
    }
}

/// Computes curriculum snapshots.
pub struct CurriculumFilter {
    config: CurriculumConfig,
    rng: StdRng,
    snapshot: CurriculumSnapshot,
}

impl CurriculumFilter {
    /// Builds a filter. Nothing is eligible until the first [`update`](Self::update).
    pub fn build(config: &CurriculumConfig) -> Result<Self> {
        config.check()?;
        Ok(Self {
            config: config.clone(),
            rng: StdRng::seed_from_u64(config.seed),
            snapshot: CurriculumSnapshot::default(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CurriculumConfig {
        &self.config
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> &CurriculumSnapshot {
        &self.snapshot
    }

    /// Returns the fraction at which the curriculum stops changing.
    pub fn final_curriculum_fraction(&self) -> f64 {
        self.config.final_curriculum_fraction()
    }

    /// Recomputes the snapshot for the given fraction.
    ///
    /// `index` is the unfiltered index; positions in it are master indices.
    /// `lengths[t]` is the number of steps of trajectory `t`.
    pub fn update(&mut self, index: &[StepId], lengths: &[usize], fraction: f64) -> Result<()> {
        let sparsity = self.config.extracurricular_sparsity as u128;
        let phase = self.rng.gen_range(0..self.config.extracurricular_sparsity);
        let f = fraction;

        let mut filtered = vec![];
        let mut cross_lookup = vec![];
        for (master, &id) in index.iter().enumerate() {
            let len = Self::length(lengths, id)?;
            let s = id.step;
            if s as f64 <= len * f
                || s < self.config.initial_curriculum_size
                || (s as u128 + phase as u128) % sparsity == 0
            {
                filtered.push(id);
                cross_lookup.push(master);
            }
        }
        let curriculum_length = filtered.len();

        let ef = self.config.emphasized_fraction;
        if self.config.emphasize_new_samples
            && fraction > self.config.emphasized_fraction
            && fraction < self.final_curriculum_fraction()
        {
            let mut band = vec![];
            for (master, &id) in index.iter().enumerate() {
                let len = Self::length(lengths, id)?;
                let s = id.step as f64;
                if s <= len * f && s > len * (f - ef) {
                    band.push((id, master));
                }
            }
            for _ in 1..self.config.emphasis_relative_sample_frequency {
                filtered.extend(band.iter().map(|(id, _)| *id));
                cross_lookup.extend(band.iter().map(|(_, master)| *master));
            }
            info!("{} samples emphasized", band.len());
        }

        info!(
            "Curriculum updated to {:.3}, including {} / {} sequences",
            fraction,
            curriculum_length,
            index.len()
        );

        self.snapshot = CurriculumSnapshot {
            fraction,
            phase,
            filtered,
            cross_lookup,
            curriculum_length,
            generation: self.snapshot.generation + 1,
        };

        Ok(())
    }

    #[inline]
    fn length(lengths: &[usize], id: StepId) -> Result<f64> {
        match lengths.get(id.trajectory) {
            Some(&len) => Ok(len as f64),
            None => Err(TandemError::OutOfRange {
                index: id.trajectory,
                len: lengths.len(),
            })?,
        }
    }
}
