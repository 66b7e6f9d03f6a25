use std::collections::VecDeque;
use serde::{Serialize, Deserialize};

/// Episode scores with a moving window over the most recent ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeTracker {
    /// Every finished episode's total reward
    scores: Vec<f32>,

    /// The last `window` scores
    recent: VecDeque<f32>,

    window: usize,

    // Current episode
    current_reward: f32,
    current_length: usize,

    total_steps: usize,
}

impl EpisodeTracker {
    /// `window` is clamped to at least 1.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        EpisodeTracker {
            scores: Vec::new(),
            recent: VecDeque::with_capacity(window),
            window,
            current_reward: 0.0,
            current_length: 0,
            total_steps: 0,
        }
    }

    /// Start a new episode
    pub fn start_episode(&mut self) {
        self.current_reward = 0.0;
        self.current_length = 0;
    }

    /// Record a step within an episode
    pub fn step(&mut self, reward: f32) {
        self.current_reward += reward;
        self.current_length += 1;
        self.total_steps += 1;
    }

    /// Close the current episode and return its score.
    pub fn end_episode(&mut self) -> f32 {
        let score = self.current_reward;
        self.push_score(score);
        score
    }

    pub fn push_score(&mut self, score: f32) {
        if self.recent.len() >= self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(score);
        self.scores.push(score);
    }

    /// Mean of the last `window` scores; `None` before the first episode ends.
    pub fn moving_average(&self) -> Option<f32> {
        if self.recent.is_empty() {
            return None;
        }
        Some(self.recent.iter().sum::<f32>() / self.recent.len() as f32)
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn episode_count(&self) -> usize {
        self.scores.len()
    }

    pub fn current_reward(&self) -> f32 {
        self.current_reward
    }

    pub fn current_length(&self) -> usize {
        self.current_length
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn best_score(&self) -> Option<f32> {
        self.scores.iter().copied().reduce(f32::max)
    }
}

impl Default for EpisodeTracker {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_window() {
        let mut tracker = EpisodeTracker::new(2);
        assert_eq!(tracker.moving_average(), None);

        for score in [10.0, 20.0, 40.0] {
            tracker.start_episode();
            tracker.step(score);
            tracker.end_episode();
        }

        assert_eq!(tracker.scores(), &[10.0, 20.0, 40.0]);
        assert_eq!(tracker.moving_average(), Some(30.0));
        assert_eq!(tracker.best_score(), Some(40.0));
        assert_eq!(tracker.total_steps(), 3);
    }

    #[test]
    fn test_episode_accumulates() {
        let mut tracker = EpisodeTracker::default();
        tracker.start_episode();
        tracker.step(1.0);
        tracker.step(1.0);
        assert_eq!(tracker.current_length(), 2);
        assert_eq!(tracker.end_episode(), 2.0);
    }
}
