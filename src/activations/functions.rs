use clap::ValueEnum;
use ndarray::{Array2, ArrayView2};
use serde::{Serialize, Deserialize};

/// The nonlinearities a dense layer of the Q-network can apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Linear,
}

impl Activation {
    /// Apply the activation function to a batch of pre-activations in-place.
    pub fn apply_batch(&self, inputs: &mut Array2<f32>) {
        match self {
            Activation::Relu => {
                inputs.mapv_inplace(|v| v.max(0.0));
            }
            Activation::Tanh => {
                inputs.mapv_inplace(|v| v.tanh());
            }
            Activation::Linear => {}
        }
    }

    /// Apply the activation function to a batch, returning a new array.
    pub fn map_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = inputs.to_owned();
        self.apply_batch(&mut outputs);
        outputs
    }

    /// Compute the derivative of the activation function for a batch of pre-activations.
    pub fn derivative_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => {
                inputs.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
            }
            Activation::Tanh => {
                inputs.mapv(|v| {
                    let tanh_v = v.tanh();
                    1.0 - tanh_v * tanh_v
                })
            }
            Activation::Linear => {
                Array2::ones(inputs.dim())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_relu_clamps_negatives() {
        let mut x = array![[-1.0, 0.0, 2.5]];
        Activation::Relu.apply_batch(&mut x);
        assert_eq!(x, array![[0.0, 0.0, 2.5]]);
    }

    #[test]
    fn test_relu_derivative_is_step() {
        let d = Activation::Relu.derivative_batch(array![[-0.5, 0.0, 3.0]].view());
        assert_eq!(d, array![[0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_linear_is_identity() {
        let x = array![[-2.0, 7.0]];
        assert_eq!(Activation::Linear.map_batch(x.view()), x);
        assert_eq!(Activation::Linear.derivative_batch(x.view()), array![[1.0, 1.0]]);
    }

    #[test]
    fn test_tanh_derivative_at_zero() {
        let d = Activation::Tanh.derivative_batch(array![[0.0]].view());
        assert!((d[[0, 0]] - 1.0).abs() < 1e-6);
    }
}
