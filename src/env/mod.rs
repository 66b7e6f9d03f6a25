//! Environments the agent can be trained on.
//!
//! An [`Environment`] hands out fixed-size `f32` observations and accepts
//! discrete action indices; the agent never looks past this interface.

mod cartpole;

pub use cartpole::CartPole;

use ndarray::Array1;

use crate::error::{DqnError, Result};

/// Result of advancing an environment by one action.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvStep {
    pub next_state: Array1<f32>,
    pub reward: f32,
    /// The episode reached a terminal state.
    pub terminated: bool,
    /// The episode was cut off by a time limit.
    pub truncated: bool,
}

impl EnvStep {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A discrete-action environment.
pub trait Environment {
    /// Length of the observation vectors.
    fn state_dim(&self) -> usize;

    /// Number of discrete actions; valid actions are `0..action_dim()`.
    fn action_dim(&self) -> usize;

    /// Start a new episode. `Some(seed)` reseeds the environment's RNG first.
    fn reset(&mut self, seed: Option<u64>) -> Array1<f32>;

    /// Apply `action` and advance one time step.
    fn step(&mut self, action: usize) -> Result<EnvStep>;
}

/// Build an environment from its identifier.
pub fn make_env(id: &str) -> Result<Box<dyn Environment>> {
    match id {
        "CartPole-v1" | "cartpole" => Ok(Box::new(CartPole::new())),
        other => Err(DqnError::invalid_parameter(
            "env",
            format!("unknown environment '{}'", other).as_str(),
        )),
    }
}
