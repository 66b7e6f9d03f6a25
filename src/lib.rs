//! # cartpole_dqn - Deep Q-Learning on CartPole
//!
//! A small, dependency-light implementation of DQN: a feed-forward Q-network
//! trained from a uniform experience replay buffer against a soft-updated
//! target network, together with a CartPole-v1 environment and the training
//! loop that ties them together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cartpole_dqn::agent::DqnAgentBuilder;
//! use cartpole_dqn::env::{CartPole, Environment};
//!
//! let mut env = CartPole::new();
//! let mut agent = DqnAgentBuilder::new(env.state_dim(), env.action_dim())
//!     .seed(0)
//!     .build()
//!     .unwrap();
//!
//! let mut state = env.reset(Some(0));
//! loop {
//!     let action = agent.select_action(state.view(), 0.1).unwrap();
//!     let step = env.step(action).unwrap();
//!     agent
//!         .step(state.view(), action, step.reward, step.next_state.view(), step.done())
//!         .unwrap();
//!     if step.done() {
//!         break;
//!     }
//!     state = step.next_state;
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions (ReLU, Tanh, Linear)
//! - [`agent`] - The DQN agent, its configuration and builder
//! - [`config`] - JSON-loadable training configuration
//! - [`env`] - Environment trait and CartPole
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialization
//! - [`loss`] - Loss functions for training
//! - [`metrics`] - Metric recorders and episode tracking
//! - [`network`] - The Q-network
//! - [`optimizer`] - SGD and Adam
//! - [`replay_buffer`] - Experience replay
//! - [`schedule`] - Exploration schedule
//! - [`trainer`] - The episode loop

pub mod activations;
pub mod agent;
pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod logging;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod schedule;
pub mod trainer;

#[cfg(test)]
mod tests;
