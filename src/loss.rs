use ndarray::{Array1, ArrayView1};

/// Trait defining the interface for regression losses over a batch of scalars
pub trait Loss {
    /// Compute the loss of `predictions` against `targets`
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32;

    /// Compute the gradient of the loss with respect to `predictions`
    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32>;
}

/// Mean Squared Error loss: `mean((prediction - target)^2)`
#[derive(Debug, Clone, Copy, Default)]
pub struct MSE;

impl Loss for MSE {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        let diff = &predictions - &targets;
        diff.mapv(|x| x * x).sum() / predictions.len() as f32
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        (&predictions - &targets) * (2.0 / predictions.len() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse_value() {
        let loss = MSE.compute(array![1.0, 2.0].view(), array![0.0, 4.0].view());
        assert_eq!(loss, 2.5);
    }

    #[test]
    fn test_mse_gradient() {
        let grad = MSE.gradient(array![1.0, 2.0].view(), array![0.0, 4.0].view());
        assert_eq!(grad, array![1.0, -2.0]);
    }

    #[test]
    fn test_mse_zero_at_target() {
        let x = array![0.3, -1.2, 5.0];
        assert_eq!(MSE.compute(x.view(), x.view()), 0.0);
    }
}
