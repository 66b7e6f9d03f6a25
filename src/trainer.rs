//! The episode loop.
//!
//! [`train`] runs an agent against an environment for a fixed number of
//! episodes, decaying exploration once per episode and reporting the moving
//! average of episode scores through a [`Recorder`].

use tracing::{debug, info};

use crate::agent::DqnAgent;
use crate::env::Environment;
use crate::error::{DqnError, Result};
use crate::metrics::{EpisodeTracker, Recorder};
use crate::schedule::EpsilonSchedule;

pub const LOSS_TAG: &str = "train/loss";
pub const MOVING_AVERAGE_TAG: &str = "episodic_reward/moving_average";

/// Knobs of the episode loop.
#[derive(Debug, Clone)]
pub struct TrainSettings {
    pub n_episodes: usize,
    /// Step limit per episode, on top of any limit the environment enforces.
    pub max_episode_len: usize,
    pub epsilon: EpsilonSchedule,
    /// Episodes between progress reports.
    pub log_interval: usize,
    /// Number of recent episodes in the moving average.
    pub moving_window: usize,
    /// Seed for the first environment reset only.
    pub seed: Option<u64>,
}

/// Summary of a finished training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Total reward of every episode, in order.
    pub scores: Vec<f32>,
    pub total_steps: u64,
    pub learn_steps: u64,
    pub target_syncs: u64,
    pub final_epsilon: f32,
    pub final_moving_average: Option<f32>,
}

impl TrainingReport {
    pub fn episodes(&self) -> usize {
        self.scores.len()
    }
}

/// Train `agent` on `env` for `settings.n_episodes` episodes.
///
/// An episode ends when the environment terminates or truncates, or after
/// `max_episode_len` steps. Either termination kind is stored as `done`.
pub fn train<E, R>(
    env: &mut E,
    agent: &mut DqnAgent,
    settings: &TrainSettings,
    recorder: &mut R,
) -> Result<TrainingReport>
where
    E: Environment + ?Sized,
    R: Recorder + ?Sized,
{
    if env.state_dim() != agent.config().state_dim || env.action_dim() != agent.config().action_dim {
        return Err(DqnError::dimension_mismatch(
            format!("agent with {} inputs and {} actions", env.state_dim(), env.action_dim()),
            format!("agent with {} inputs and {} actions", agent.config().state_dim, agent.config().action_dim),
        ));
    }
    if settings.max_episode_len == 0 || settings.log_interval == 0 {
        return Err(DqnError::invalid_parameter(
            "max_episode_len/log_interval",
            "must be greater than 0",
        ));
    }

    let mut schedule = settings.epsilon;
    let mut tracker = EpisodeTracker::new(settings.moving_window);
    let steps_before = agent.t_train();

    for e in 0..settings.n_episodes {
        let seed = if e == 0 { settings.seed } else { None };
        let mut state = env.reset(seed);
        let epsilon = schedule.value();
        tracker.start_episode();

        for _ in 0..settings.max_episode_len {
            let action = agent.select_action(state.view(), epsilon)?;
            let transition = env.step(action)?;
            let done = transition.done();

            let outcome = agent.step(
                state.view(),
                action,
                transition.reward,
                transition.next_state.view(),
                done,
            )?;
            if let Some(loss) = outcome.loss {
                recorder.record(LOSS_TAG, loss, agent.t_train())?;
            }

            tracker.step(transition.reward);
            state = transition.next_state;
            if done {
                break;
            }
        }

        let score = tracker.end_episode();
        schedule.advance();
        debug!(episode = e, score, steps = tracker.current_length(), epsilon, "episode finished");

        if e % settings.log_interval == 0 {
            let average = tracker.moving_average().unwrap_or(score);
            info!(
                "Episode Number {} Average Episodic Reward (over {} episodes): {:.2}",
                e,
                settings.moving_window,
                average
            );
            recorder.record(MOVING_AVERAGE_TAG, average, e as u64)?;
        }
    }
    recorder.flush()?;

    Ok(TrainingReport {
        scores: tracker.scores().to_vec(),
        total_steps: agent.t_train() - steps_before,
        learn_steps: agent.learn_steps(),
        target_syncs: agent.target_syncs(),
        final_epsilon: schedule.value(),
        final_moving_average: tracker.moving_average(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::DqnAgentBuilder;
    use crate::env::EnvStep;
    use crate::metrics::{InMemoryRecorder, TracingRecorder};
    use ndarray::{array, Array1};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Counts `info` and `debug` events.
    #[derive(Clone, Default)]
    struct LevelCounter {
        info: Arc<AtomicUsize>,
        debug: Arc<AtomicUsize>,
    }

    impl<S: Subscriber> Layer<S> for LevelCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let level = *event.metadata().level();
            if level == Level::INFO {
                self.info.fetch_add(1, Ordering::SeqCst);
            } else if level == Level::DEBUG {
                self.debug.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Ends every episode after `length` steps, rewarding 1 per step.
    struct Corridor {
        length: usize,
        t: usize,
    }

    impl Environment for Corridor {
        fn state_dim(&self) -> usize {
            2
        }

        fn action_dim(&self) -> usize {
            2
        }

        fn reset(&mut self, _seed: Option<u64>) -> Array1<f32> {
            self.t = 0;
            array![0.0, 0.0]
        }

        fn step(&mut self, _action: usize) -> Result<EnvStep> {
            self.t += 1;
            Ok(EnvStep {
                next_state: array![self.t as f32, 1.0],
                reward: 1.0,
                terminated: self.t >= self.length,
                truncated: false,
            })
        }
    }

    fn settings(n_episodes: usize) -> TrainSettings {
        TrainSettings {
            n_episodes,
            max_episode_len: 100,
            epsilon: EpsilonSchedule::new(0.5, 0.1, 0.5).unwrap(),
            log_interval: 2,
            moving_window: 2,
            seed: Some(0),
        }
    }

    #[test]
    fn test_train_reports_scores() {
        let mut env = Corridor { length: 5, t: 0 };
        let mut agent = DqnAgentBuilder::new(2, 2).hidden_sizes(&[8]).batch_size(4).build().unwrap();
        let mut recorder = InMemoryRecorder::new();

        let report = train(&mut env, &mut agent, &settings(4), &mut recorder).unwrap();

        assert_eq!(report.scores, vec![5.0; 4]);
        assert_eq!(report.total_steps, 20);
        assert_eq!(report.final_epsilon, 0.1);
        assert_eq!(report.final_moving_average, Some(5.0));

        let averages = recorder.values(MOVING_AVERAGE_TAG);
        assert_eq!(averages, vec![(0, 5.0), (2, 5.0)]);
        // 20 steps, learning once the buffer holds more than 4
        assert_eq!(recorder.values(LOSS_TAG).len(), 16);
    }

    #[test]
    fn test_info_output_is_periodic() {
        let mut env = Corridor { length: 5, t: 0 };
        let mut agent = DqnAgentBuilder::new(2, 2).hidden_sizes(&[8]).batch_size(4).build().unwrap();
        let counter = LevelCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());

        let report = tracing::subscriber::with_default(subscriber, || {
            train(&mut env, &mut agent, &settings(6), &mut TracingRecorder)
        })
        .unwrap();

        assert_eq!(report.learn_steps, 26);
        // One progress line each at episodes 0, 2 and 4
        assert_eq!(counter.info.load(Ordering::SeqCst), 3);
        // Every loss still reaches the debug level
        assert!(counter.debug.load(Ordering::SeqCst) >= 26);
    }

    #[test]
    fn test_episode_length_cap() {
        let mut env = Corridor { length: 1000, t: 0 };
        let mut agent = DqnAgentBuilder::new(2, 2).hidden_sizes(&[4]).build().unwrap();
        let mut settings = settings(2);
        settings.max_episode_len = 7;

        let report = train(&mut env, &mut agent, &settings, &mut crate::metrics::NullRecorder).unwrap();
        assert_eq!(report.scores, vec![7.0, 7.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut env = Corridor { length: 5, t: 0 };
        let mut agent = DqnAgentBuilder::new(4, 2).build().unwrap();
        let result = train(&mut env, &mut agent, &settings(1), &mut crate::metrics::NullRecorder);
        assert!(matches!(result, Err(DqnError::DimensionMismatch { .. })));
    }
}
