use ndarray::{array, Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::layers::LayerGradients;
use crate::network::QNetwork;
use crate::optimizer::{Adam, Optimizer, OptimizerKind, OptimizerWrapper, SGD};

fn assert_close(actual: &Array2<f32>, expected: &Array2<f32>, tol: f32) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!((a - e).abs() < tol, "{} vs {}", a, e);
    }
}

#[test]
fn test_sgd_update_weights() {
    let mut sgd = SGD::new();
    let mut weights = array![[1.0, 1.0], [1.0, 1.0]];
    let gradients = array![[0.1, 0.2], [0.3, 0.4]];

    sgd.update_weights(0, &mut weights, &gradients, 0.01);

    assert_close(&weights, &array![[0.999, 0.998], [0.997, 0.996]], 1e-6);
}

#[test]
fn test_sgd_update_biases() {
    let mut sgd = SGD::new();
    let mut biases = array![1.0, 1.0];
    let gradients = array![0.1, 0.2];

    sgd.update_biases(0, &mut biases, &gradients, 0.01);

    assert!((biases[0] - 0.999).abs() < 1e-6);
    assert!((biases[1] - 0.998).abs() < 1e-6);
}

#[test]
fn test_adam_new() {
    let adam = Adam::new(0.9, 0.999, 1e-8);

    assert_eq!(adam.beta1, 0.9);
    assert_eq!(adam.beta2, 0.999);
    assert_eq!(adam.epsilon, 1e-8);
    assert_eq!(adam.t, 0);
}

#[test]
fn test_adam_first_step_moves_by_learning_rate() {
    let mut adam = Adam::default();
    let mut weights = array![[1.0, 1.0], [1.0, 1.0]];
    let gradients = array![[0.1, -0.2], [0.3, 0.4]];

    adam.begin_step();
    adam.update_weights(0, &mut weights, &gradients, 0.01);

    // Bias correction makes the first step lr * sign(g)
    assert_close(&weights, &array![[0.99, 1.01], [0.99, 0.99]], 1e-5);
}

#[test]
fn test_adam_keeps_state_per_layer() {
    let mut adam = Adam::default();
    let mut a = array![[0.0]];
    let mut b = array![[0.0]];

    adam.begin_step();
    adam.update_weights(0, &mut a, &array![[1.0]], 0.1);
    adam.update_weights(1, &mut b, &array![[-1.0]], 0.1);

    assert!((a[[0, 0]] + 0.1).abs() < 1e-5);
    assert!((b[[0, 0]] - 0.1).abs() < 1e-5);
}

#[test]
fn test_optimizer_kind_builds_wrapper() {
    assert!(matches!(OptimizerKind::Sgd.build(), OptimizerWrapper::SGD(_)));
    assert!(matches!(OptimizerKind::Adam.build(), OptimizerWrapper::Adam(_)));
    assert_eq!(OptimizerKind::default(), OptimizerKind::Adam);
}

#[test]
fn test_step_updates_every_layer() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut network = QNetwork::mlp(3, &[4], 2, &mut rng).unwrap();
    let before = network.clone();
    let gradients: Vec<LayerGradients> = network
        .layers
        .iter()
        .map(|layer| LayerGradients {
            weights: Array2::ones(layer.weights.dim()),
            biases: Array1::ones(layer.biases.len()),
        })
        .collect();

    let mut sgd = OptimizerWrapper::SGD(SGD::new());
    sgd.step(&mut network, &gradients, 0.5).unwrap();

    for (after, before) in network.layers.iter().zip(&before.layers) {
        assert_close(&after.weights, &before.weights.mapv(|w| w - 0.5), 1e-6);
    }
}

#[test]
fn test_step_rejects_mismatched_gradients() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut network = QNetwork::mlp(3, &[4], 2, &mut rng).unwrap();
    let gradients = vec![LayerGradients {
        weights: Array2::zeros((3, 4)),
        biases: Array1::zeros(4),
    }];

    let mut adam = OptimizerWrapper::Adam(Adam::default());
    assert!(adam.step(&mut network, &gradients, 0.1).is_err());
}
