use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::WeightInit;
use crate::loss::{Loss, MSE};
use crate::network::QNetwork;
use crate::optimizer::{Optimizer, OptimizerKind, OptimizerWrapper};
use crate::replay_buffer::{Batch, ReplayBuffer, Transition};
use super::config::AgentConfig;

/// What happened during one call to [`DqnAgent::step`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepOutcome {
    /// Loss of the learning update, if the buffer was large enough to run one.
    pub loss: Option<f32>,
    /// Whether the target network was blended toward the online network.
    pub target_synced: bool,
}

/// TD targets `r + γ · max_a Q_target(s', a) · (1 - done)`, one per row.
///
/// `next_q` holds the target network's Q-values for the next states. Rows
/// with `done = 1` get exactly their reward: nothing is bootstrapped past the
/// end of an episode.
pub fn td_targets(
    rewards: ArrayView1<f32>,
    next_q: ArrayView2<f32>,
    dones: ArrayView1<f32>,
    discount: f32,
) -> Result<Array1<f32>> {
    let batch = rewards.len();
    if next_q.nrows() != batch || dones.len() != batch {
        return Err(DqnError::dimension_mismatch(
            format!("{} rows", batch),
            format!("{} next-state rows and {} done flags", next_q.nrows(), dones.len()),
        ));
    }

    let max_next_q = next_q.map_axis(Axis(1), |row| {
        row.iter().fold(f32::NEG_INFINITY, |max, &v| max.max(v))
    });

    Ok(ndarray::Zip::from(&rewards)
        .and(&max_next_q)
        .and(&dones)
        .map_collect(|&r, &q, &d| r + discount * q * (1.0 - d)))
}

/// Index of the largest value; the first one wins ties and NaNs are skipped.
fn argmax(values: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, best_v)) if v <= best_v => {}
            _ => best = Some((idx, v)),
        }
    }
    match best {
        Some((idx, _)) => Some(idx),
        None if values.is_empty() => None,
        None => Some(0),
    }
}

/// Deep Q-Network agent with experience replay and a soft-updated target network.
///
/// Each call to [`DqnAgent::step`] stores a transition, learns from a uniformly
/// sampled batch once the buffer holds more than `batch_size` transitions,
/// and every `update_freq` steps blends the target network toward the
/// online one with rate `tau`.
///
/// # Example
///
/// ```rust
/// use cartpole_dqn::agent::{AgentConfig, DqnAgent};
/// use ndarray::array;
///
/// let config = AgentConfig { batch_size: 2, ..AgentConfig::new(4, 2) };
/// let mut agent = DqnAgent::new(config).unwrap();
///
/// let state = array![0.1, -0.2, 0.3, -0.1];
/// let action = agent.select_action(state.view(), 0.1).unwrap();
///
/// let next_state = array![0.15, -0.25, 0.35, -0.05];
/// let outcome = agent.step(state.view(), action, 1.0, next_state.view(), false).unwrap();
/// assert!(outcome.loss.is_none());
/// assert_eq!(agent.t_train(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DqnAgent {
    config: AgentConfig,
    online: QNetwork,
    target: QNetwork,
    optimizer: OptimizerWrapper,
    memory: ReplayBuffer,
    rng: StdRng,
    t_train: u64,
    learn_steps: u64,
    target_syncs: u64,
}

impl DqnAgent {
    /// Build an agent; fails fast on an invalid configuration.
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        if config.batch_size >= config.capacity {
            warn!(
                batch_size = config.batch_size,
                capacity = config.capacity,
                "replay buffer can never hold more than batch_size transitions; the agent will not learn"
            );
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let online = QNetwork::mlp_with(
            config.state_dim,
            &config.hidden_sizes,
            config.action_dim,
            config.hidden_activation,
            config.weight_init,
            &mut rng,
        )?;
        let target = online.clone();
        let memory = ReplayBuffer::new(config.capacity, config.state_dim, config.batch_size)?;
        let optimizer = config.optimizer.build();

        debug!(
            layers = ?config.layer_sizes(),
            parameters = online.parameter_count(),
            "created DQN agent"
        );

        Ok(DqnAgent {
            config,
            online,
            target,
            optimizer,
            memory,
            rng,
            t_train: 0,
            learn_steps: 0,
            target_syncs: 0,
        })
    }

    /// Epsilon-greedy action selection.
    ///
    /// With probability `epsilon` a uniformly random action is returned,
    /// otherwise the action with the highest online Q-value.
    pub fn select_action(&mut self, state: ArrayView1<f32>, epsilon: f32) -> Result<usize> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(DqnError::invalid_parameter(
                "epsilon",
                format!("must be within [0, 1], got {}", epsilon).as_str(),
            ));
        }
        self.check_state(state)?;

        if self.rng.gen::<f32>() < epsilon {
            Ok(self.rng.gen_range(0..self.config.action_dim))
        } else {
            self.greedy_action(state)
        }
    }

    /// The action with the highest online Q-value.
    pub fn greedy_action(&self, state: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.q_values(state)?;
        argmax(q_values.view())
            .ok_or_else(|| DqnError::TrainingError("network produced no Q-values".to_string()))
    }

    /// Online Q-values for a single state.
    pub fn q_values(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.check_state(state)?;
        Ok(self.online.predict(state))
    }

    /// Record one environment step and run the learning and sync schedule.
    pub fn step(
        &mut self,
        state: ArrayView1<f32>,
        action: usize,
        reward: f32,
        next_state: ArrayView1<f32>,
        done: bool,
    ) -> Result<StepOutcome> {
        if action >= self.config.action_dim {
            return Err(DqnError::InvalidAction { action, max_actions: self.config.action_dim });
        }
        self.memory.add_parts(state, action, reward, next_state, done)?;
        self.t_train += 1;

        let mut outcome = StepOutcome::default();

        if self.memory.len() > self.config.batch_size {
            let batch = self.memory.sample(&mut self.rng)?;
            outcome.loss = Some(self.learn(&batch)?);
        }

        if self.t_train % self.config.update_freq as u64 == 0 {
            self.target_update()?;
            outcome.target_synced = true;
        }

        Ok(outcome)
    }

    /// [`DqnAgent::step`] for an already assembled transition.
    pub fn observe(&mut self, transition: &Transition) -> Result<StepOutcome> {
        self.step(
            transition.state.view(),
            transition.action,
            transition.reward,
            transition.next_state.view(),
            transition.done,
        )
    }

    /// One gradient step on the online network toward the TD targets of `batch`.
    ///
    /// Returns the mean squared TD error before the update.
    pub fn learn(&mut self, batch: &Batch) -> Result<f32> {
        if batch.is_empty() {
            return Err(DqnError::EmptyBuffer("cannot learn from an empty batch".to_string()));
        }
        if batch.states.ncols() != self.config.state_dim || batch.next_states.ncols() != self.config.state_dim {
            return Err(DqnError::dimension_mismatch(
                format!("states with {} features", self.config.state_dim),
                format!("states with {} features", batch.states.ncols()),
            ));
        }
        if let Some(&action) = batch.actions.iter().find(|&&a| a >= self.config.action_dim) {
            return Err(DqnError::InvalidAction { action, max_actions: self.config.action_dim });
        }

        // Target side: plain prediction, nothing to backpropagate into.
        let next_q = self.target.predict_batch(batch.next_states.view());
        let y_hat = td_targets(batch.rewards.view(), next_q.view(), batch.dones.view(), self.config.discount)?;

        let q = self.online.forward_batch(batch.states.view());
        let y: Array1<f32> = batch
            .actions
            .iter()
            .enumerate()
            .map(|(row, &action)| q[[row, action]])
            .collect();

        let loss = MSE.compute(y.view(), y_hat.view());
        let dy = MSE.gradient(y.view(), y_hat.view());

        // Only the taken action's output receives gradient.
        let mut output_grad = Array2::zeros(q.dim());
        for (row, &action) in batch.actions.iter().enumerate() {
            output_grad[[row, action]] = dy[row];
        }

        let gradients = self.online.backward_batch(output_grad.view())?;
        self.online.clear_cache();
        self.optimizer.step(&mut self.online, &gradients, self.config.learning_rate)?;
        self.learn_steps += 1;

        trace!(step = self.t_train, loss, "learning update");

        if self.config.sync_every_learn {
            self.target_update()?;
        }

        Ok(loss)
    }

    /// Blend the target network toward the online network with the configured `tau`.
    pub fn target_update(&mut self) -> Result<()> {
        self.soft_update(self.config.tau)
    }

    /// `θ_target <- tau * θ_online + (1 - tau) * θ_target` over all parameters.
    pub fn soft_update(&mut self, tau: f32) -> Result<()> {
        self.target.soft_update_from(&self.online, tau)?;
        self.target_syncs += 1;
        debug!(step = self.t_train, tau, syncs = self.target_syncs, "target network sync");
        Ok(())
    }

    fn check_state(&self, state: ArrayView1<f32>) -> Result<()> {
        if state.len() != self.config.state_dim {
            return Err(DqnError::dimension_mismatch(
                format!("state of length {}", self.config.state_dim),
                format!("state of length {}", state.len()),
            ));
        }
        Ok(())
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn online(&self) -> &QNetwork {
        &self.online
    }

    pub fn target(&self) -> &QNetwork {
        &self.target
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn optimizer_kind(&self) -> OptimizerKind {
        self.config.optimizer
    }

    /// Steps recorded so far; never reset.
    pub fn t_train(&self) -> u64 {
        self.t_train
    }

    /// Learning updates performed so far.
    pub fn learn_steps(&self) -> u64 {
        self.learn_steps
    }

    /// Target-network blends performed so far.
    pub fn target_syncs(&self) -> u64 {
        self.target_syncs
    }
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    config: AgentConfig,
}

impl DqnAgentBuilder {
    pub fn new(state_dim: usize, action_dim: usize) -> Self {
        DqnAgentBuilder { config: AgentConfig::new(state_dim, action_dim) }
    }

    pub fn from_config(config: AgentConfig) -> Self {
        DqnAgentBuilder { config }
    }

    pub fn hidden_sizes(mut self, sizes: &[usize]) -> Self {
        self.config.hidden_sizes = sizes.to_vec();
        self
    }

    pub fn hidden_activation(mut self, activation: Activation) -> Self {
        self.config.hidden_activation = activation;
        self
    }

    pub fn weight_init(mut self, init: WeightInit) -> Self {
        self.config.weight_init = init;
        self
    }

    pub fn discount(mut self, discount: f32) -> Self {
        self.config.discount = discount;
        self
    }

    pub fn tau(mut self, tau: f32) -> Self {
        self.config.tau = tau;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    pub fn update_freq(mut self, freq: usize) -> Self {
        self.config.update_freq = freq;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.config.optimizer = optimizer;
        self
    }

    pub fn sync_every_learn(mut self, enabled: bool) -> Self {
        self.config.sync_every_learn = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn build(self) -> Result<DqnAgent> {
        DqnAgent::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(array![1.0, 3.0, 3.0].view()), Some(1));
        assert_eq!(argmax(array![-2.0].view()), Some(0));
        assert_eq!(argmax(array![f32::NAN, 0.5].view()), Some(1));
        assert_eq!(argmax(Array1::<f32>::zeros(0).view()), None);
    }

    #[test]
    fn test_td_targets_bootstrap() {
        let rewards = array![1.0, 0.5];
        let next_q = array![[2.0, 4.0], [-1.0, -3.0]];
        let dones = array![0.0, 0.0];
        let y_hat = td_targets(rewards.view(), next_q.view(), dones.view(), 0.5).unwrap();
        assert_eq!(y_hat, array![3.0, 0.0]);
    }

    #[test]
    fn test_td_targets_length_mismatch() {
        let result = td_targets(
            array![1.0].view(),
            array![[1.0], [2.0]].view(),
            array![0.0].view(),
            0.9,
        );
        assert!(result.is_err());
    }
}
