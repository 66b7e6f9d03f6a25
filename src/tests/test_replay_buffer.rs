use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::error::DqnError;
use crate::replay_buffer::{sample_indices, ReplayBuffer, Transition};

fn transition(i: usize) -> Transition {
    Transition::new(
        array![i as f32, -(i as f32)],
        i % 2,
        i as f32,
        array![(i + 1) as f32, -((i + 1) as f32)],
        i % 3 == 0,
    )
}

#[test]
fn test_replay_buffer_add_and_get() {
    let mut buffer = ReplayBuffer::new(10, 2, 4).unwrap();
    let t = transition(1);
    buffer.add(&t).unwrap();

    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.get(0), Some(t));
    assert_eq!(buffer.get(1), None);
}

#[test]
fn test_replay_buffer_capacity() {
    let mut buffer = ReplayBuffer::new(3, 2, 2).unwrap();

    // Add more transitions than capacity
    for i in 0..5 {
        buffer.add(&transition(i)).unwrap();
        assert!(buffer.len() <= buffer.capacity());
    }

    // Should only keep last 3
    assert_eq!(buffer.len(), 3);
    assert!(buffer.is_full());
    assert_eq!(buffer.cursor(), 2);

    let rewards: Vec<f32> = buffer.iter_oldest_first().map(|t| t.reward).collect();
    assert_eq!(rewards, vec![2.0, 3.0, 4.0]);

    // Slot 0 was overwritten by the fourth insert
    assert_eq!(buffer.get(0).unwrap().reward, 3.0);
}

#[test]
fn test_replay_buffer_is_empty() {
    let mut buffer = ReplayBuffer::new(10, 2, 1).unwrap();
    assert!(buffer.is_empty());

    buffer.add(&transition(0)).unwrap();

    assert!(!buffer.is_empty());
}

#[test]
fn test_replay_buffer_rejects_wrong_state_length() {
    let mut buffer = ReplayBuffer::new(10, 2, 1).unwrap();
    let bad = Transition::new(array![1.0, 2.0, 3.0], 0, 0.0, array![1.0, 2.0], false);

    assert!(matches!(buffer.add(&bad), Err(DqnError::DimensionMismatch { .. })));
    assert!(buffer.is_empty());
}

#[test]
fn test_replay_buffer_rejects_zero_sizes() {
    assert!(ReplayBuffer::new(0, 2, 1).is_err());
    assert!(ReplayBuffer::new(10, 0, 1).is_err());
    assert!(ReplayBuffer::new(10, 2, 0).is_err());
}

#[test]
fn test_sample_shapes_and_fields() {
    let mut buffer = ReplayBuffer::new(10, 2, 6).unwrap();
    for i in 0..4 {
        buffer.add(&transition(i)).unwrap();
    }
    let mut rng = StdRng::seed_from_u64(7);
    let batch = buffer.sample(&mut rng).unwrap();

    // Sampling is with replacement, so a batch may exceed the stored count
    assert_eq!(batch.len(), 6);
    assert_eq!(batch.states.dim(), (6, 2));
    assert_eq!(batch.next_states.dim(), (6, 2));

    for (row, &slot) in batch.indices.iter().enumerate() {
        assert!(slot < buffer.len());
        let stored = buffer.get(slot).unwrap();
        assert_eq!(batch.states.row(row), stored.state.view());
        assert_eq!(batch.actions[row], stored.action);
        assert_eq!(batch.rewards[row], stored.reward);
        assert_eq!(batch.next_states.row(row), stored.next_state.view());
        assert_eq!(batch.dones[row], if stored.done { 1.0 } else { 0.0 });
    }
}

#[test]
fn test_sample_does_not_mutate() {
    let mut buffer = ReplayBuffer::new(5, 2, 3).unwrap();
    for i in 0..7 {
        buffer.add(&transition(i)).unwrap();
    }
    let before: Vec<Transition> = buffer.iter_oldest_first().collect();
    let mut rng = StdRng::seed_from_u64(0);
    for _ in 0..10 {
        buffer.sample(&mut rng).unwrap();
    }
    let after: Vec<Transition> = buffer.iter_oldest_first().collect();
    assert_eq!(before, after);
    assert_eq!(buffer.cursor(), 2);
}

#[test]
fn test_sample_is_reproducible() {
    let mut buffer = ReplayBuffer::new(50, 2, 8).unwrap();
    for i in 0..50 {
        buffer.add(&transition(i)).unwrap();
    }
    let a = buffer.sample(&mut StdRng::seed_from_u64(11)).unwrap();
    let b = buffer.sample(&mut StdRng::seed_from_u64(11)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_sample_indices_cover_range() {
    let mut rng = StdRng::seed_from_u64(3);
    let indices = sample_indices(4, 2000, &mut rng).unwrap();
    assert!(indices.iter().all(|&i| i < 4));
    for slot in 0..4 {
        assert!(indices.contains(&slot));
    }
}

#[test]
fn test_sample_empty_buffer() {
    let buffer = ReplayBuffer::new(5, 2, 3).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(buffer.sample(&mut rng), Err(DqnError::EmptyBuffer(_))));
}
