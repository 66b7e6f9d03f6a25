//! # Reinforcement Learning Agent Module
//!
//! The DQN agent and its configuration.
//!
//! ## Core Concepts
//!
//! - **Q-Learning**: regress `Q(s, a)` toward the TD target `r + γ max_b Q_target(s', b)`
//! - **Exploration vs Exploitation**: epsilon-greedy action selection
//! - **Experience Replay**: learn from uniformly sampled past transitions
//! - **Target Network**: a slowly tracking copy of the Q-network, blended
//!   toward it with rate `tau` every `update_freq` steps
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cartpole_dqn::agent::DqnAgentBuilder;
//! use ndarray::array;
//!
//! // CartPole: 4 inputs, 2 actions
//! let mut agent = DqnAgentBuilder::new(4, 2)
//!     .hidden_sizes(&[64, 64])
//!     .tau(0.005)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let state = array![0.1, 0.2, -0.3, 0.4];
//! let action = agent.select_action(state.view(), 0.05).unwrap();
//! ```

mod config;
mod dqn;

pub use config::AgentConfig;
pub use dqn::{td_targets, DqnAgent, DqnAgentBuilder, StepOutcome};
