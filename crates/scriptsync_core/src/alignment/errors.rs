//! Error types for alignment.

use thiserror::Error;

use crate::service::ServiceError;

/// Error from an alignment run.
#[derive(Error, Debug)]
pub enum AlignmentError {
    /// The underlying service call failed.
    #[error("service call failed: {0}")]
    Service(#[from] ServiceError),

    /// The service returned no usable text.
    #[error("service returned an empty response")]
    EmptyResponse,

    /// Response text could not be parsed into scenes.
    #[error("malformed alignment response: {0}")]
    MalformedResponse(String),

    /// The run finished without producing a single scene.
    #[error("alignment produced no scenes")]
    NoScenes,

    /// Caller-supplied inputs were unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Cancellation was requested mid-run.
    #[error("alignment was cancelled")]
    Cancelled,
}

impl AlignmentError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
