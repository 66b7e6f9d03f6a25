use serde::{Serialize, Deserialize};

use crate::error::{DqnError, Result};

/// Multiplicative exploration schedule: `ε <- max(ε * decay, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    start: f32,
    end: f32,
    decay: f32,
    current: f32,
}

impl EpsilonSchedule {
    pub fn new(start: f32, end: f32, decay: f32) -> Result<Self> {
        for (name, value) in [("epsilon_start", start), ("epsilon_end", end), ("epsilon_decay", decay)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DqnError::invalid_parameter(
                    name,
                    format!("must be within [0, 1], got {}", value).as_str(),
                ));
            }
        }
        if end > start {
            return Err(DqnError::invalid_parameter(
                "epsilon_end",
                format!("must not exceed epsilon_start ({} > {})", end, start).as_str(),
            ));
        }
        Ok(EpsilonSchedule { start, end, decay, current: start })
    }

    /// A schedule that always returns `epsilon`.
    pub fn constant(epsilon: f32) -> Result<Self> {
        Self::new(epsilon, epsilon, 1.0)
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    /// Decay once; returns the new value.
    pub fn advance(&mut self) -> f32 {
        self.current = (self.current * self.decay).max(self.end);
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.start;
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }
}
