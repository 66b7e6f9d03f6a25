//! Fixed-capacity experience replay.
//!
//! Transitions are stored field-by-field in preallocated arrays and written
//! through a circular cursor, so once the buffer is full every insert
//! overwrites the oldest transition. Sampling draws indices uniformly with
//! replacement and never mutates the buffer.

use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;

use crate::error::{DqnError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

impl Transition {
    pub fn new(state: Array1<f32>, action: usize, reward: f32, next_state: Array1<f32>, done: bool) -> Self {
        Transition { state, action, reward, next_state, done }
    }
}

/// A batch of transitions regrouped per field, one row per sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub states: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    pub next_states: Array2<f32>,
    /// `1.0` for terminal transitions, `0.0` otherwise.
    pub dones: Array1<f32>,
    /// Buffer slots the rows were gathered from.
    pub indices: Vec<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Draw `count` indices independently and uniformly from `[0, size)`, with replacement.
pub fn sample_indices<R: Rng + ?Sized>(size: usize, count: usize, rng: &mut R) -> Result<Vec<usize>> {
    if size == 0 {
        return Err(DqnError::EmptyBuffer("cannot sample from an empty replay buffer".to_string()));
    }
    Ok((0..count).map(|_| rng.gen_range(0..size)).collect())
}

#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    states: Array2<f32>,
    actions: Vec<usize>,
    rewards: Array1<f32>,
    next_states: Array2<f32>,
    dones: Array1<f32>,
    capacity: usize,
    batch_size: usize,
    ptr: usize,
    size: usize,
}

impl ReplayBuffer {
    /// Allocate storage for `capacity` transitions of `state_dim`-sized states.
    pub fn new(capacity: usize, state_dim: usize, batch_size: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DqnError::invalid_parameter("capacity", "must be greater than 0"));
        }
        if state_dim == 0 {
            return Err(DqnError::invalid_parameter("state_dim", "must be greater than 0"));
        }
        if batch_size == 0 {
            return Err(DqnError::invalid_parameter("batch_size", "must be greater than 0"));
        }

        Ok(ReplayBuffer {
            states: Array2::zeros((capacity, state_dim)),
            actions: vec![0; capacity],
            rewards: Array1::zeros(capacity),
            next_states: Array2::zeros((capacity, state_dim)),
            dones: Array1::zeros(capacity),
            capacity,
            batch_size,
            ptr: 0,
            size: 0,
        })
    }

    /// Store a transition in the slot under the cursor, overwriting the
    /// oldest one once the buffer is full.
    pub fn add(&mut self, transition: &Transition) -> Result<()> {
        self.add_parts(
            transition.state.view(),
            transition.action,
            transition.reward,
            transition.next_state.view(),
            transition.done,
        )
    }

    /// Same as [`ReplayBuffer::add`] without building a [`Transition`] first.
    pub fn add_parts(
        &mut self,
        state: ArrayView1<f32>,
        action: usize,
        reward: f32,
        next_state: ArrayView1<f32>,
        done: bool,
    ) -> Result<()> {
        let state_dim = self.state_dim();
        for (name, len) in [("state", state.len()), ("next_state", next_state.len())] {
            if len != state_dim {
                return Err(DqnError::dimension_mismatch(
                    format!("{} of length {}", name, state_dim),
                    format!("{} of length {}", name, len),
                ));
            }
        }

        let slot = self.ptr;
        self.states.row_mut(slot).assign(&state);
        self.actions[slot] = action;
        self.rewards[slot] = reward;
        self.next_states.row_mut(slot).assign(&next_state);
        self.dones[slot] = if done { 1.0 } else { 0.0 };

        self.ptr = (self.ptr + 1) % self.capacity;
        self.size = (self.size + 1).min(self.capacity);
        Ok(())
    }

    /// Sample `batch_size` transitions (the size fixed at construction).
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Batch> {
        self.sample_n(self.batch_size, rng)
    }

    /// Sample `count` transitions uniformly with replacement.
    pub fn sample_n<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Batch> {
        let indices = sample_indices(self.size, count, rng)?;
        Ok(self.gather(indices))
    }

    /// Regroup the transitions stored at `indices` into a [`Batch`].
    ///
    /// Every index must be below `len()`.
    pub fn gather(&self, indices: Vec<usize>) -> Batch {
        debug_assert!(indices.iter().all(|&i| i < self.size));
        let states = self.states.select(ndarray::Axis(0), &indices);
        let next_states = self.next_states.select(ndarray::Axis(0), &indices);
        let actions = indices.iter().map(|&i| self.actions[i]).collect();
        let rewards = indices.iter().map(|&i| self.rewards[i]).collect();
        let dones = indices.iter().map(|&i| self.dones[i]).collect();

        Batch { states, actions, rewards, next_states, dones, indices }
    }

    /// The transition stored in slot `index`, if that slot has been written.
    pub fn get(&self, index: usize) -> Option<Transition> {
        if index >= self.size {
            return None;
        }
        Some(Transition {
            state: self.states.row(index).to_owned(),
            action: self.actions[index],
            reward: self.rewards[index],
            next_state: self.next_states.row(index).to_owned(),
            done: self.dones[index] != 0.0,
        })
    }

    /// Stored transitions from oldest to newest.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = Transition> + '_ {
        let start = if self.is_full() { self.ptr } else { 0 };
        (0..self.size).filter_map(move |offset| self.get((start + offset) % self.capacity))
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn state_dim(&self) -> usize {
        self.states.ncols()
    }

    /// Slot the next transition will be written to.
    pub fn cursor(&self) -> usize {
        self.ptr
    }
}
