use thiserror::Error;

/// Result type for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Main error type for the benchmark suite
#[derive(Debug, Error)]
pub enum BenchError {
    /// Missing or malformed configuration field
    #[error("Configuration error in '{field}': {reason}")]
    Config {
        field: String,
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Invalid dimensions for operations
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Allocation larger than what the device (or host) can hold
    #[error("Resource exhausted: requested {requested} bytes ({reason})")]
    ResourceExhausted {
        requested: u64,
        reason: String,
    },

    /// Accelerator runtime could not be initialized
    #[error("Device initialization failed: {0}")]
    DeviceInit(String),

    /// Device rejected a launch, copy or synchronization
    #[error("Launch failure: {0}")]
    Launch(String),

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON report serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper functions for common error patterns
impl BenchError {
    pub fn config<S: Into<String>>(field: S, reason: S) -> Self {
        BenchError::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn resource_exhausted<S: Into<String>>(requested: u64, reason: S) -> Self {
        BenchError::ResourceExhausted {
            requested,
            reason: reason.into(),
        }
    }

    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        BenchError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        BenchError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
