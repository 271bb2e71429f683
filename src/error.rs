//! Error types for the swing analysis library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),

    /// `ONNX` Runtime inference failed
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Video could not be opened or decoded
    #[error("Video error: {0}")]
    Video(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model loading or inference error
    #[error("Model error: {0}")]
    ModelError(String),

    /// Model input configuration error (wrong shape, missing input)
    #[error("Model input error: {0}")]
    ModelInputError(String),

    /// Model output processing error
    #[error("Model output error: {0}")]
    ModelOutputError(String),

    /// Model data shape or format error
    #[error("Model data format error: {0}")]
    ModelDataFormatError(String),

    /// Reference statistics table missing or malformed
    #[error("Reference statistics error: {0}")]
    StatsError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The caller cancelled the analysis
    #[error("analysis cancelled")]
    Cancelled,
}

impl Error {
    /// Whether this error is a configuration/programmer defect rather than a
    /// runtime data error. Data defects are absorbed inside the pipeline;
    /// configuration defects propagate to the caller.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::ConfigError(_) | Error::ModelInputError(_) | Error::StatsError(_)
        )
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
