//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Session → Step → Operation → Detail

use std::io;

use thiserror::Error;

use crate::alignment::AlignmentError;
use crate::media::MediaError;
use crate::service::ServiceError;

/// Top-level pipeline error with session context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Session '{session_id}' failed at step '{step_name}': {source}")]
    StepFailed {
        session_id: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Input validation failed before the pipeline started.
    #[error("Session '{session_id}' failed validation: {message}")]
    ValidationFailed { session_id: String, message: String },

    /// Pipeline was cancelled.
    #[error("Session '{session_id}' was cancelled")]
    Cancelled { session_id: String },

    /// Failed to set up the session (create directories, etc.).
    #[error("Session '{session_id}' setup failed: {message}")]
    SetupFailed { session_id: String, message: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        session_id: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            session_id: session_id.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a validation failed error.
    pub fn validation_failed(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            session_id: session_id.into(),
            message: message.into(),
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            session_id: session_id.into(),
            message: message.into(),
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(session_id: impl Into<String>) -> Self {
        Self::Cancelled {
            session_id: session_id.into(),
        }
    }

    /// Machine-readable error category for callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StepFailed { source, .. } => source.kind(),
            Self::ValidationFailed { .. } => "validation",
            Self::Cancelled { .. } => "cancelled",
            Self::SetupFailed { .. } => "setup",
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// Alignment failed.
    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    /// A media operation failed.
    #[error(transparent)]
    Media(#[from] MediaError),

    /// A remote service call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Every scene was excluded by validation.
    #[error("no usable scenes after validation")]
    NoUsableScenes,

    /// Cancellation observed mid-step.
    #[error("step was cancelled")]
    Cancelled,
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Machine-readable error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidOutput(_) => "invalid_output",
            Self::Alignment(AlignmentError::Cancelled) | Self::Cancelled => "cancelled",
            Self::Alignment(_) => "alignment",
            Self::Media(_) => "media",
            Self::Service(_) => "service",
            Self::IoError { .. } => "io",
            Self::NoUsableScenes => "no_usable_scenes",
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
