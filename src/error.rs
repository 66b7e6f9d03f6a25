use std::fmt;

/// Result type for agent, buffer and training operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Main error type for the crate
#[derive(Debug, Clone, PartialEq)]
pub enum DqnError {
    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid configuration or hyperparameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// IO errors (config and metrics files)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// Sampling from a buffer that holds no transitions
    EmptyBuffer(String),

    /// Action index outside the environment's action space
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Training error
    TrainingError(String),
}

impl fmt::Display for DqnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqnError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            DqnError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            DqnError::IoError(msg) => write!(f, "IO error: {}", msg),
            DqnError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            DqnError::EmptyBuffer(msg) => write!(f, "Empty buffer: {}", msg),
            DqnError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            DqnError::TrainingError(msg) => write!(f, "Training error: {}", msg),
        }
    }
}

impl std::error::Error for DqnError {}

impl From<std::io::Error> for DqnError {
    fn from(err: std::io::Error) -> Self {
        DqnError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for DqnError {
    fn from(err: serde_json::Error) -> Self {
        DqnError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl DqnError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DqnError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        DqnError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for the errors raised while validating hyperparameters and shapes.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DqnError::InvalidParameter { .. } | DqnError::DimensionMismatch { .. }
        )
    }
}
