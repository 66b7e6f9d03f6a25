//! # Activation Functions Module
//!
//! Nonlinearities applied between the dense layers of the Q-network.
//!
//! ## Available Activations
//!
//! - **ReLU** (Rectified Linear Unit): `max(0, x)` - used for every hidden layer by default
//! - **Tanh**: Hyperbolic tangent - outputs between -1 and 1
//! - **Linear**: Identity function - used for the output layer, since Q-values are unbounded
//!
//! ## Usage Example
//!
//! ```rust
//! use cartpole_dqn::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5, 0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut data);
//! assert_eq!(data, array![[1.0, 0.0, 0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
