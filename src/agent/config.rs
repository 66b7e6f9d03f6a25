use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::WeightInit;
use crate::optimizer::OptimizerKind;

/// Hyperparameters and dimensions a [`DqnAgent`](super::DqnAgent) is built from.
///
/// The defaults are those of a CartPole-sized agent: two hidden layers of
/// 64 units with ReLU, `gamma = 0.99`, `tau = 1e-3`, Adam at `5e-4`, a target sync
/// every 4 steps and room for 100k transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub state_dim: usize,
    pub action_dim: usize,
    pub hidden_sizes: Vec<usize>,
    /// Nonlinearity of the hidden layers; the output layer is always linear.
    pub hidden_activation: Activation,
    pub weight_init: WeightInit,
    /// Discount factor γ, in (0, 1].
    pub discount: f32,
    /// Soft-update rate τ, in (0, 1].
    pub tau: f32,
    pub learning_rate: f32,
    /// Steps between target-network syncs.
    pub update_freq: usize,
    /// Replay buffer capacity.
    pub capacity: usize,
    pub batch_size: usize,
    pub optimizer: OptimizerKind,
    /// Also blend the target network after every learning update.
    pub sync_every_learn: bool,
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            state_dim: 4,
            action_dim: 2,
            hidden_sizes: vec![64, 64],
            hidden_activation: Activation::Relu,
            weight_init: WeightInit::FanInUniform,
            discount: 0.99,
            tau: 1e-3,
            learning_rate: 5e-4,
            update_freq: 4,
            capacity: 100_000,
            batch_size: 64,
            optimizer: OptimizerKind::Adam,
            sync_every_learn: false,
            seed: 0,
        }
    }
}

impl AgentConfig {
    pub fn new(state_dim: usize, action_dim: usize) -> Self {
        AgentConfig {
            state_dim,
            action_dim,
            ..Default::default()
        }
    }

    /// Reject configurations the agent cannot run with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("state_dim", self.state_dim),
            ("action_dim", self.action_dim),
            ("update_freq", self.update_freq),
            ("capacity", self.capacity),
            ("batch_size", self.batch_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(DqnError::invalid_parameter(name, "must be greater than 0"));
            }
        }
        if self.hidden_sizes.iter().any(|&size| size == 0) {
            return Err(DqnError::invalid_parameter("hidden_sizes", "every hidden layer needs at least one unit"));
        }
        if let WeightInit::Uniform { min, max } = self.weight_init {
            if !(min < max) {
                return Err(DqnError::invalid_parameter(
                    "weight_init",
                    format!("uniform range needs min < max, got [{}, {}]", min, max).as_str(),
                ));
            }
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(DqnError::invalid_parameter(
                "discount",
                format!("must be in (0, 1], got {}", self.discount).as_str(),
            ));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return Err(DqnError::invalid_parameter(
                "tau",
                format!("must be in (0, 1], got {}", self.tau).as_str(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(DqnError::invalid_parameter(
                "learning_rate",
                format!("must be positive and finite, got {}", self.learning_rate).as_str(),
            ));
        }
        Ok(())
    }

    /// Full layer sizes of the Q-network, input and output included.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_sizes.len() + 2);
        sizes.push(self.state_dim);
        sizes.extend_from_slice(&self.hidden_sizes);
        sizes.push(self.action_dim);
        sizes
    }
}
