//! Episodes and the samples materialized from them.
//!
//! A [`Trajectory`] stores one episode as an initial observation followed by
//! `(act, reward, next_obs)` triples. Step `i` of a trajectory is the transition
//! `(obs[i], act[i], reward[i], obs[i + 1])`. Each step can also carry a cached
//! recurrent hidden state, written back by the training loop after a sequence
//! ending at that step has gone through the recurrent model.
use crate::error::TandemError;
use anyhow::Result;

/// A single transition taken from a trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O, A, H> {
    /// Observation `o_t`.
    pub obs: O,

    /// Action `a_t`.
    pub act: A,

    /// Reward `r_t`.
    pub reward: f32,

    /// Observation `o_t+1`.
    pub next_obs: O,

    /// `true` if the episode ended at this step.
    pub is_done: bool,

    /// Hidden state cached for this step, if any.
    pub hidden: Option<H>,
}

/// A fixed-length window of consecutive steps.
///
/// `obs` has one more element than `act`, so that current and next
/// observations of every step in the window can be taken as `obs[..n]`
/// and `obs[1..]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence<O, A, H> {
    /// Observations `o_s, ..., o_e+1`.
    pub obs: Vec<O>,

    /// Actions `a_s, ..., a_e`.
    pub act: Vec<A>,

    /// Rewards `r_s, ..., r_e`.
    pub reward: Vec<f32>,

    /// Done flags of the steps in the window.
    pub is_done: Vec<i8>,

    /// Hidden state cached for the step right before the window, used to
    /// initialize the recurrent model. `None` if the window starts at the
    /// beginning of the trajectory or nothing has been cached yet.
    pub initial_hidden: Option<H>,
}

impl<O, A, H> Sequence<O, A, H> {
    /// Returns the number of steps in the window.
    pub fn len(&self) -> usize {
        self.act.len()
    }
}

/// A sample returned by datasets and replay buffers.
#[derive(Clone, Debug, PartialEq)]
pub enum Sample<O, A, H> {
    /// A single step.
    Step(Transition<O, A, H>),

    /// A window of steps.
    Sequence(Sequence<O, A, H>),
}

/// The latest state of a trajectory, used for policy inference.
#[derive(Clone, Debug, PartialEq)]
pub struct State<O, H> {
    /// Latest observation.
    pub obs: O,

    /// Hidden state cached for the latest step.
    pub hidden: Option<H>,
}

/// One episode.
#[derive(Clone, Debug)]
pub struct Trajectory<O, A, H> {
    obs: Vec<O>,
    act: Vec<A>,
    reward: Vec<f32>,
    hidden: Vec<Option<H>>,
    is_done: bool,
}

impl<O, A, H> Trajectory<O, A, H> {
    /// Creates a trajectory starting from the given observation.
    pub fn new(init_obs: O) -> Self {
        Self {
            obs: vec![init_obs],
            act: vec![],
            reward: vec![],
            hidden: vec![],
            is_done: false,
        }
    }

    /// Appends a step.
    ///
    /// Fails with [`TandemError::TrajectoryFinished`] if the trajectory is
    /// already done.
    pub fn push(&mut self, act: A, reward: f32, next_obs: O, is_done: bool) -> Result<()> {
        if self.is_done {
            return Err(TandemError::TrajectoryFinished)?;
        }
        self.act.push(act);
        self.reward.push(reward);
        self.obs.push(next_obs);
        self.hidden.push(None);
        self.is_done = is_done;
        Ok(())
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.act.len()
    }

    /// Returns `true` if no step has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.act.is_empty()
    }

    /// Returns `true` if the episode has ended.
    pub fn is_done(&self) -> bool {
        self.is_done
    }

    /// Returns the sum of rewards.
    pub fn sum_rewards(&self) -> f32 {
        self.reward.iter().sum()
    }

    /// Returns the hidden state cached for step `i`.
    pub fn hidden(&self, i: usize) -> Option<&H> {
        self.hidden.get(i).and_then(|h| h.as_ref())
    }

    /// Overwrites the hidden state cached for step `i`.
    pub fn update_hidden(&mut self, i: usize, hidden: H) -> Result<()> {
        let len = self.len();
        match self.hidden.get_mut(i) {
            Some(h) => {
                *h = Some(hidden);
                Ok(())
            }
            None => Err(TandemError::OutOfRange { index: i, len })?,
        }
    }

    #[inline]
    fn step_is_done(&self, i: usize) -> bool {
        self.is_done && i + 1 == self.len()
    }
}

impl<O, A, H> Trajectory<O, A, H>
where
    O: Clone,
    A: Clone,
    H: Clone,
{
    /// Returns step `i`.
    pub fn get_step(&self, i: usize) -> Result<Transition<O, A, H>> {
        if i >= self.len() {
            return Err(TandemError::OutOfRange {
                index: i,
                len: self.len(),
            })?;
        }

        Ok(Transition {
            obs: self.obs[i].clone(),
            act: self.act[i].clone(),
            reward: self.reward[i],
            next_obs: self.obs[i + 1].clone(),
            is_done: self.step_is_done(i),
            hidden: self.hidden[i].clone(),
        })
    }

    /// Returns `length` consecutive steps ending at step `end` (inclusive).
    ///
    /// The window never gets clamped: it fails if it would start before the
    /// first step or if `end` is not a step of this trajectory.
    pub fn get_sequence(&self, end: usize, length: usize) -> Result<Sequence<O, A, H>> {
        if end >= self.len() {
            return Err(TandemError::OutOfRange {
                index: end,
                len: self.len(),
            })?;
        }
        if length == 0 || end + 1 < length {
            return Err(TandemError::WindowBeforeStart { end, length })?;
        }

        let start = end + 1 - length;
        let initial_hidden = match start {
            0 => None,
            _ => self.hidden[start - 1].clone(),
        };

        Ok(Sequence {
            obs: self.obs[start..=end + 1].to_vec(),
            act: self.act[start..=end].to_vec(),
            reward: self.reward[start..=end].to_vec(),
            is_done: (start..=end).map(|i| self.step_is_done(i) as i8).collect(),
            initial_hidden,
        })
    }

    /// Returns the latest observation together with the hidden state cached
    /// for the latest step.
    pub fn current_state(&self) -> State<O, H> {
        let hidden = match self.len() {
            0 => None,
            n => self.hidden[n - 1].clone(),
        };
        State {
            // `obs` always holds at least the initial observation.
            obs: self.obs[self.obs.len() - 1].clone(),
            hidden,
        }
    }
}
