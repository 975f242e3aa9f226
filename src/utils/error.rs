//! Error Handling Module
//!
//! Defines the error taxonomy for the classifier harness.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Main error type for classifier operations
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Input dimensions disagree with the dimensions the model was built for
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Invalid hyperparameters or dataset sizes
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation attempted after the execution session was released
    #[error("Session closed: {0}")]
    Closed(String),

    /// Tensor data could not be read back to the host
    #[error("Tensor error: {0}")]
    Tensor(String),

    /// Error with dataset files
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        ClassifierError::Serialization(err.to_string())
    }
}

/// Convenience Result type for classifier operations
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| ClassifierError::Dataset(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| ClassifierError::Dataset(format!("{}: {}", f(), e)))
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| ClassifierError::Dataset(msg.to_string()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| ClassifierError::Dataset(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClassifierError::ShapeMismatch("expected 8x8, got 4x4".to_string());
        assert_eq!(format!("{}", err), "Shape mismatch: expected 8x8, got 4x4");

        let err = ClassifierError::Config("batch_size must be > 0".to_string());
        assert_eq!(err.to_string(), "Configuration error: batch_size must be > 0");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ClassifierError = io_err.into();
        assert!(matches!(err, ClassifierError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<f32>>("not json").unwrap_err();
        let err: ClassifierError = json_err.into();
        assert!(matches!(err, ClassifierError::Serialization(_)));
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<i32, std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"));

        let with_context = result.context("Failed to read file");
        assert!(matches!(with_context, Err(ClassifierError::Dataset(msg)) if msg.contains("Failed to read file")));
    }

    #[test]
    fn test_option_context() {
        let opt: Option<i32> = None;
        assert!(opt.context("Value was None").is_err());
    }
}
