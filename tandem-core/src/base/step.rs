//! Environment step.

/// An action, the following observation and reward `(a_t, o_t+1, r_t)`.
///
/// This is what the environment loop hands to
/// [`ExperienceBufferBase::push`](crate::ExperienceBufferBase::push).
#[derive(Clone, Debug, PartialEq)]
pub struct Step<O, A> {
    /// Action.
    pub act: A,

    /// Observation after the action.
    pub obs: O,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the episode is done.
    pub is_done: bool,

    /// Initial observation of the next episode.
    ///
    /// If `is_done` is `true` and this is `Some(_)`, the buffer starts a new
    /// trajectory from it. Otherwise it is ignored.
    pub init_obs: Option<O>,
}

impl<O, A> Step<O, A> {
    /// Constructs a [`Step`] object.
    pub fn new(act: A, obs: O, reward: f32, is_done: bool, init_obs: Option<O>) -> Self {
        Step {
            act,
            obs,
            reward,
            is_done,
            init_obs,
        }
    }
}
