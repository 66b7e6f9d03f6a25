use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use super::initialization::WeightInit;

/// Gradients of a dense layer's parameters, shaped like the parameters themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGradients {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// A fully connected (dense) layer in a neural network
///
/// Weights are stored `(input_size, output_size)` so a batch of row vectors
/// is propagated with a single `inputs.dot(&weights)`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer, drawing its initial parameters from `rng`.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(DqnError::invalid_parameter(
                "layer_size",
                "layers need at least one input and one output",
            ));
        }
        let weights = init.initialize_weights((input_size, output_size), rng)?;
        let biases = init.initialize_biases(input_size, output_size, rng);
        Ok(DenseLayer {
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        })
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Result<Self> {
        if weights.dim() != self.weights.dim() {
            return Err(DqnError::dimension_mismatch(
                format!("{:?}", self.weights.dim()),
                format!("{:?}", weights.dim()),
            ));
        }
        self.weights = weights;
        Ok(self)
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Result<Self> {
        if biases.dim() != self.biases.dim() {
            return Err(DqnError::dimension_mismatch(
                format!("{}", self.biases.len()),
                format!("{}", biases.len()),
            ));
        }
        self.biases = biases;
        Ok(self)
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Forward pass that keeps the inputs and pre-activations for `backward_batch`.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let pre_activation = self.affine(inputs);
        let outputs = self.activation.map_batch(pre_activation.view());
        self.inputs = Some(inputs.to_owned());
        self.pre_activation_output = Some(pre_activation);
        outputs
    }

    /// Forward pass without recording anything for backpropagation.
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.affine(inputs);
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    fn affine(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0))
    }

    /// Compute parameter gradients for a batch of output errors.
    ///
    /// Returns the error with the activation derivative folded in (the caller
    /// multiplies it by `weights.t()` to continue backpropagation) together
    /// with the gradients of this layer's weights and biases.
    pub fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<(Array2<f32>, LayerGradients)> {
        let pre_activation_output = self.pre_activation_output.as_ref().ok_or_else(|| {
            DqnError::TrainingError(
                "No pre-activation output stored. forward_batch() must be called before backward_batch()".to_string(),
            )
        })?;
        let inputs = self.inputs.as_ref().ok_or_else(|| {
            DqnError::TrainingError(
                "No inputs stored. forward_batch() must be called before backward_batch()".to_string(),
            )
        })?;
        if output_errors.dim() != pre_activation_output.dim() {
            return Err(DqnError::dimension_mismatch(
                format!("{:?}", pre_activation_output.dim()),
                format!("{:?}", output_errors.dim()),
            ));
        }

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = &output_errors * &activation_deriv;
        let gradients = LayerGradients {
            weights: inputs.t().dot(&adjusted_error),
            biases: adjusted_error.sum_axis(Axis(0)),
        };

        Ok((adjusted_error, gradients))
    }

    /// Drop the activations cached by the last `forward_batch`.
    pub fn clear_cache(&mut self) {
        self.inputs = None;
        self.pre_activation_output = None;
    }

    pub fn same_shape(&self, other: &DenseLayer) -> bool {
        self.weights.dim() == other.weights.dim() && self.biases.dim() == other.biases.dim()
    }

    /// `self <- tau * source + (1 - tau) * self`, elementwise over weights and biases.
    pub fn blend_from(&mut self, source: &DenseLayer, tau: f32) {
        let keep = 1.0 - tau;
        self.weights
            .zip_mut_with(&source.weights, |t, &s| *t = tau * s + keep * *t);
        self.biases
            .zip_mut_with(&source.biases, |t, &s| *t = tau * s + keep * *t);
    }
}
