use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::activations::Activation;
use crate::agent::AgentConfig;
use crate::error::{DqnError, Result};
use crate::layers::WeightInit;
use crate::optimizer::OptimizerKind;
use crate::schedule::EpsilonSchedule;
use crate::trainer::TrainSettings;

/// Everything a training run needs, loadable from JSON.
///
/// Missing fields take their defaults, so a file only has to name what it
/// changes:
///
/// ```json
/// { "n_episodes": 300, "learning_rate": 5e-4, "hidden_sizes": [128, 128] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub env: String,
    pub seed: u64,
    pub n_episodes: usize,
    pub batch_size: usize,
    pub discount: f32,
    pub learning_rate: f32,
    pub tau: f32,
    /// Replay buffer capacity.
    pub max_size: usize,
    pub update_freq: usize,
    pub max_episode_len: usize,
    pub epsilon_start: f32,
    pub epsilon_end: f32,
    pub epsilon_decay: f32,
    pub hidden_sizes: Vec<usize>,
    pub hidden_activation: Activation,
    /// e.g. `"xavier_uniform"` or `{"uniform": {"min": -0.1, "max": 0.1}}`.
    pub weight_init: WeightInit,
    pub optimizer: OptimizerKind,
    pub sync_every_learn: bool,
    pub log_interval: usize,
    pub moving_window: usize,
    /// Where to write `scalars.csv`; no CSV output when unset.
    pub metrics_dir: Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            env: "CartPole-v1".to_string(),
            seed: 0,
            n_episodes: 1500,
            batch_size: 64,
            discount: 0.99,
            learning_rate: 1e-4,
            tau: 0.005,
            max_size: 100_000,
            update_freq: 4,
            max_episode_len: 1000,
            epsilon_start: 0.09,
            epsilon_end: 0.05,
            epsilon_decay: 0.995,
            hidden_sizes: vec![64, 64],
            hidden_activation: Activation::Relu,
            weight_init: WeightInit::FanInUniform,
            optimizer: OptimizerKind::Adam,
            sync_every_learn: false,
            log_interval: 100,
            moving_window: 100,
            metrics_dir: None,
        }
    }
}

impl TrainConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check every knob. The agent and schedule knobs are checked by their
    /// own constructors as well; this reports them before anything is built.
    pub fn validate(&self) -> Result<()> {
        if self.env.trim().is_empty() {
            return Err(DqnError::invalid_parameter("env", "must name an environment"));
        }
        for (name, value) in [
            ("max_episode_len", self.max_episode_len),
            ("log_interval", self.log_interval),
            ("moving_window", self.moving_window),
        ] {
            if value == 0 {
                return Err(DqnError::invalid_parameter(name, "must be greater than 0"));
            }
        }
        if self.batch_size >= self.max_size {
            warn!(
                batch_size = self.batch_size,
                max_size = self.max_size,
                "batch_size is not below max_size; no learning update will ever run"
            );
        }
        EpsilonSchedule::new(self.epsilon_start, self.epsilon_end, self.epsilon_decay)?;
        // Dimensions come from the environment; any positive pair will do here.
        self.agent_config(1, 1).validate()
    }

    /// Agent configuration for an environment with the given dimensions.
    pub fn agent_config(&self, state_dim: usize, action_dim: usize) -> AgentConfig {
        AgentConfig {
            state_dim,
            action_dim,
            hidden_sizes: self.hidden_sizes.clone(),
            hidden_activation: self.hidden_activation,
            weight_init: self.weight_init,
            discount: self.discount,
            tau: self.tau,
            learning_rate: self.learning_rate,
            update_freq: self.update_freq,
            capacity: self.max_size,
            batch_size: self.batch_size,
            optimizer: self.optimizer,
            sync_every_learn: self.sync_every_learn,
            seed: self.seed,
        }
    }

    pub fn schedule(&self) -> Result<EpsilonSchedule> {
        EpsilonSchedule::new(self.epsilon_start, self.epsilon_end, self.epsilon_decay)
    }

    pub fn train_settings(&self) -> Result<TrainSettings> {
        Ok(TrainSettings {
            n_episodes: self.n_episodes,
            max_episode_len: self.max_episode_len,
            epsilon: self.schedule()?,
            log_interval: self.log_interval,
            moving_window: self.moving_window,
            seed: Some(self.seed),
        })
    }
}
