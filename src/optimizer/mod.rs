use ndarray::{Array1, Array2};
use serde::{Serialize, Deserialize};

use crate::error::{DqnError, Result};
use crate::layers::LayerGradients;
use crate::network::QNetwork;

/// A first-order update rule for the parameters of a [`QNetwork`].
///
/// `layer` identifies which layer a tensor belongs to so stateful optimizers
/// keep one set of moment estimates per parameter tensor.
pub trait Optimizer {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);
    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);

    /// Called once before the per-tensor updates of a step.
    fn begin_step(&mut self) {}

    /// Apply one descent step to every layer of `network`.
    fn step(&mut self, network: &mut QNetwork, gradients: &[LayerGradients], learning_rate: f32) -> Result<()> {
        if gradients.len() != network.layers.len() {
            return Err(DqnError::dimension_mismatch(
                format!("{} layer gradients", network.layers.len()),
                format!("{} layer gradients", gradients.len()),
            ));
        }
        for (layer, grads) in network.layers.iter().zip(gradients) {
            if layer.weights.dim() != grads.weights.dim() || layer.biases.dim() != grads.biases.dim() {
                return Err(DqnError::dimension_mismatch(
                    format!("{:?}", layer.weights.dim()),
                    format!("{:?}", grads.weights.dim()),
                ));
            }
        }

        self.begin_step();
        for (index, (layer, grads)) in network.layers.iter_mut().zip(gradients).enumerate() {
            self.update_weights(index, &mut layer.weights, &grads.weights, learning_rate);
            self.update_biases(index, &mut layer.biases, &grads.biases, learning_rate);
        }
        Ok(())
    }
}

/// Which optimizer the agent trains its online network with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    #[default]
    Adam,
}

impl OptimizerKind {
    pub fn build(self) -> OptimizerWrapper {
        match self {
            OptimizerKind::Sgd => OptimizerWrapper::SGD(SGD::new()),
            OptimizerKind::Adam => OptimizerWrapper::Adam(Adam::default()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
        }
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
        }
    }

    fn begin_step(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.begin_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.begin_step(),
        }
    }
}

/// Plain stochastic gradient descent: `θ <- θ - lr * g`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for SGD {
    fn update_weights(&mut self, _layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, _layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// Adam with bias-corrected first and second moment estimates.
///
/// Moment buffers are created lazily, shaped after the first gradients seen
/// for each layer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Vec<Array2<f32>>,
    v_weights: Vec<Array2<f32>>,
    m_biases: Vec<Array1<f32>>,
    v_biases: Vec<Array1<f32>>,
    pub t: i32,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            m_weights: Vec::new(),
            v_weights: Vec::new(),
            m_biases: Vec::new(),
            v_biases: Vec::new(),
            t: 0,
        }
    }

    fn corrections(&self) -> (f32, f32) {
        let t = self.t.max(1);
        (1.0 - self.beta1.powi(t), 1.0 - self.beta2.powi(t))
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-8)
    }
}

fn ensure_slot<A: Clone>(slots: &mut Vec<A>, index: usize, fresh: impl Fn() -> A) {
    while slots.len() <= index {
        slots.push(fresh());
    }
}

impl Optimizer for Adam {
    fn begin_step(&mut self) {
        self.t += 1;
    }

    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (bc1, bc2) = self.corrections();
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);

        let dim = gradients.dim();
        ensure_slot(&mut self.m_weights, layer, || Array2::zeros(dim));
        ensure_slot(&mut self.v_weights, layer, || Array2::zeros(dim));
        if self.m_weights[layer].dim() != dim {
            self.m_weights[layer] = Array2::zeros(dim);
            self.v_weights[layer] = Array2::zeros(dim);
        }

        let m = &mut self.m_weights[layer];
        let v = &mut self.v_weights[layer];
        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        ndarray::Zip::from(weights)
            .and(&*m)
            .and(&*v)
            .for_each(|w, &m, &v| {
                let m_hat = m / bc1;
                let v_hat = v / bc2;
                *w -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            });
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (bc1, bc2) = self.corrections();
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);

        let len = gradients.len();
        ensure_slot(&mut self.m_biases, layer, || Array1::zeros(len));
        ensure_slot(&mut self.v_biases, layer, || Array1::zeros(len));
        if self.m_biases[layer].len() != len {
            self.m_biases[layer] = Array1::zeros(len);
            self.v_biases[layer] = Array1::zeros(len);
        }

        let m = &mut self.m_biases[layer];
        let v = &mut self.v_biases[layer];
        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        ndarray::Zip::from(biases)
            .and(&*m)
            .and(&*v)
            .for_each(|b, &m, &v| {
                let m_hat = m / bc1;
                let v_hat = v / bc2;
                *b -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            });
    }
}
