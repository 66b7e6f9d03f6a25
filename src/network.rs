use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::{DenseLayer, LayerGradients, WeightInit};

/// A feed-forward Q-network mapping a state to one value per discrete action.
///
/// The online and target networks of an agent are two instances of this type
/// built from the same layer sizes; their parameters are kept in lockstep
/// shape so they can be blended elementwise with [`QNetwork::soft_update_from`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QNetwork {
    pub layers: Vec<DenseLayer>,
}

impl QNetwork {
    /// Create a new network with the given layer sizes and activations.
    ///
    /// `layer_sizes` includes the input (state size) and output (action count)
    /// layers, so `activations.len()` must be `layer_sizes.len() - 1`.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(DqnError::invalid_parameter(
                "layer_sizes",
                "network must have at least input and output layers",
            ));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(DqnError::dimension_mismatch(
                format!("{} activations", layer_sizes.len() - 1),
                format!("{} activations", activations.len()),
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation, init, &mut *rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(QNetwork { layers })
    }

    /// ReLU between hidden layers, linear head: `state_dim -> hidden... -> action_dim`.
    pub fn mlp<R: Rng + ?Sized>(
        state_dim: usize,
        hidden_sizes: &[usize],
        action_dim: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Self::mlp_with(state_dim, hidden_sizes, action_dim, Activation::Relu, WeightInit::default(), rng)
    }

    /// Like [`QNetwork::mlp`], with a chosen hidden activation and weight init.
    /// The head stays linear.
    pub fn mlp_with<R: Rng + ?Sized>(
        state_dim: usize,
        hidden_sizes: &[usize],
        action_dim: usize,
        hidden_activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        let mut layer_sizes = Vec::with_capacity(hidden_sizes.len() + 2);
        layer_sizes.push(state_dim);
        layer_sizes.extend_from_slice(hidden_sizes);
        layer_sizes.push(action_dim);

        let mut activations = vec![hidden_activation; hidden_sizes.len()];
        activations.push(Activation::Linear);

        Self::new(&layer_sizes, &activations, init, rng)
    }

    /// Assemble a network from prebuilt layers, checking that consecutive
    /// layer sizes line up.
    pub fn with_layers(layers: Vec<DenseLayer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(DqnError::invalid_parameter("layers", "network needs at least one layer"));
        }
        for pair in layers.windows(2) {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(DqnError::dimension_mismatch(
                    pair[0].output_size().to_string(),
                    pair[1].input_size().to_string(),
                ));
            }
        }
        Ok(QNetwork { layers })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(DenseLayer::parameter_count).sum()
    }

    /// Q-values for a single state.
    pub fn predict(&self, state: ArrayView1<f32>) -> Array1<f32> {
        let output = self.predict_batch(state.insert_axis(Axis(0)));
        output.index_axis_move(Axis(0), 0)
    }

    /// Q-values for a batch of states, one row per state. Nothing is cached,
    /// so the result cannot be backpropagated through.
    pub fn predict_batch(&self, states: ArrayView2<f32>) -> Array2<f32> {
        let mut current = states.to_owned();
        for layer in &self.layers {
            current = layer.predict_batch(current.view());
        }
        current
    }

    /// Forward pass for a batch of states, caching activations for `backward_batch`.
    pub fn forward_batch(&mut self, states: ArrayView2<f32>) -> Array2<f32> {
        let mut current = states.to_owned();
        for layer in &mut self.layers {
            current = layer.forward_batch(current.view());
        }
        current
    }

    /// Backpropagate `output_grad` (d loss / d output, one row per sample)
    /// through the activations cached by the last `forward_batch`.
    ///
    /// Gradients are returned in layer order.
    pub fn backward_batch(&self, output_grad: ArrayView2<f32>) -> Result<Vec<LayerGradients>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_grad.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, layer_gradients) = layer.backward_batch(current_error.view())?;
            gradients.push(layer_gradients);
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        Ok(gradients)
    }

    pub fn clear_cache(&mut self) {
        for layer in &mut self.layers {
            layer.clear_cache();
        }
    }

    /// True when both networks have the same number of layers with equal shapes.
    pub fn same_architecture(&self, other: &QNetwork) -> bool {
        self.layers.len() == other.layers.len()
            && self.layers.iter().zip(&other.layers).all(|(a, b)| a.same_shape(b))
    }

    /// Polyak update: `θ_self <- tau * θ_source + (1 - tau) * θ_self` for every
    /// weight and bias tensor.
    pub fn soft_update_from(&mut self, source: &QNetwork, tau: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&tau) {
            return Err(DqnError::invalid_parameter(
                "tau",
                format!("must be within [0, 1], got {}", tau).as_str(),
            ));
        }
        if !self.same_architecture(source) {
            return Err(DqnError::dimension_mismatch(
                format!("{} parameters", self.parameter_count()),
                format!("{} parameters", source.parameter_count()),
            ));
        }

        for (target, online) in self.layers.iter_mut().zip(&source.layers) {
            target.blend_from(online, tau);
        }
        Ok(())
    }

    /// Hard copy of `source`'s parameters into `self`.
    pub fn copy_from(&mut self, source: &QNetwork) -> Result<()> {
        self.soft_update_from(source, 1.0)
    }

    /// All parameters concatenated in a stable order: for each layer, its
    /// weights in row-major order followed by its biases.
    pub fn flat_parameters(&self) -> Array1<f32> {
        let mut flat = Vec::with_capacity(self.parameter_count());
        for layer in &self.layers {
            flat.extend(layer.weights.iter().copied());
            flat.extend(layer.biases.iter().copied());
        }
        Array1::from_vec(flat)
    }
}
