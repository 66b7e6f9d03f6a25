use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{DqnError, Result};
use super::{EnvStep, Environment};

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const TOTAL_MASS: f32 = MASS_CART + MASS_POLE;
/// Half the pole's length.
const LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = MASS_POLE * LENGTH;
const FORCE_MAG: f32 = 10.0;
const DT: f32 = 0.02;
/// 12 degrees.
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;
const X_THRESHOLD: f32 = 2.4;
const MAX_EPISODE_STEPS: usize = 500;

/// The classic cart-pole balancing task (CartPole-v1 dynamics).
///
/// Observation: `[x, x_dot, theta, theta_dot]`. Actions: `0` pushes the cart
/// left, `1` pushes it right. Every step yields a reward of 1; the episode
/// terminates when the pole tilts past 12 degrees or the cart leaves the
/// track, and is truncated after 500 steps. Stepping a finished episode is
/// an error until the next [`reset`](Environment::reset).
#[derive(Debug, Clone)]
pub struct CartPole {
    x: f32,
    x_dot: f32,
    theta: f32,
    theta_dot: f32,
    steps: usize,
    done: bool,
    rng: StdRng,
}

impl CartPole {
    pub fn new() -> Self {
        CartPole {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            steps: 0,
            done: false,
            rng: StdRng::from_entropy(),
        }
    }

    fn observation(&self) -> Array1<f32> {
        array![self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for CartPole {
    fn state_dim(&self) -> usize {
        4
    }

    fn action_dim(&self) -> usize {
        2
    }

    fn reset(&mut self, seed: Option<u64>) -> Array1<f32> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
        self.steps = 0;
        self.done = false;
        self.observation()
    }

    fn step(&mut self, action: usize) -> Result<EnvStep> {
        if self.done {
            return Err(DqnError::TrainingError(
                "episode has ended; call reset() before stepping again".to_string(),
            ));
        }
        let force = match action {
            0 => -FORCE_MAG,
            1 => FORCE_MAG,
            _ => return Err(DqnError::InvalidAction { action, max_actions: 2 }),
        };

        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();

        let temp = (force + POLE_MASS_LENGTH * self.theta_dot * self.theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        // Explicit Euler, positions first.
        self.x += DT * self.x_dot;
        self.x_dot += DT * x_acc;
        self.theta += DT * self.theta_dot;
        self.theta_dot += DT * theta_acc;
        self.steps += 1;

        let terminated = self.x.abs() > X_THRESHOLD || self.theta.abs() > THETA_THRESHOLD;
        let truncated = !terminated && self.steps >= MAX_EPISODE_STEPS;
        self.done = terminated || truncated;

        Ok(EnvStep {
            next_state: self.observation(),
            reward: 1.0,
            terminated,
            truncated,
        })
    }
}
