//! Remote service integration.
//!
//! The alignment and narration backends live behind traits so the
//! orchestrator (and tests) never talk to the network directly. The
//! concrete clients speak to Google's Gemini and Cloud TTS REST APIs.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

mod gemini;
mod rate_limit;
mod retry;
mod tts;

pub use gemini::{GeminiClient, GenerationOptions};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
pub use tts::{TextToSpeechClient, VoiceSettings};

/// A video uploaded to the alignment service, ready to be referenced
/// from analysis requests.
#[derive(Debug, Clone)]
pub struct VideoHandle {
    /// Server-side resource name (e.g. `files/abc123`).
    pub name: String,
    /// URI used to reference the file from a generation request.
    pub uri: String,
    pub mime_type: String,
}

/// Backend that aligns a narration script against uploaded footage.
#[async_trait]
pub trait AlignmentService: Send + Sync {
    /// Upload a video and wait until the service has finished
    /// ingesting it.
    async fn upload_video(&self, path: &Path) -> Result<VideoHandle, ServiceError>;

    /// Run one alignment request against an uploaded video and return
    /// the raw response text.
    async fn request_alignment(
        &self,
        video: &VideoHandle,
        prompt: &str,
    ) -> Result<String, ServiceError>;
}

/// Backend that renders narration text to an audio file.
#[async_trait]
pub trait NarrationRenderer: Send + Sync {
    /// Synthesize `text` and write the audio to `output`.
    async fn render(&self, text: &str, output: &Path) -> Result<(), ServiceError>;
}

/// Error from a remote service call.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Network-level failure (connect, timeout, TLS). Retryable.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status. Not retryable;
    /// 4xx means the request itself is wrong and 5xx bodies carry
    /// diagnostics the caller should see.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response was well-formed but missing an expected field.
    #[error("missing data in response: {0}")]
    MissingData(String),

    /// Local file I/O around an upload or download failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// All retry attempts were spent on transient failures.
    #[error("'{description}' failed after {attempts} attempts, likely network instability: {source}")]
    ExhaustedRetries {
        description: String,
        attempts: u32,
        #[source]
        source: Box<ServiceError>,
    },
}

impl ServiceError {
    /// Create a missing data error.
    pub fn missing_data(message: impl Into<String>) -> Self {
        Self::MissingData(message.into())
    }

    /// Create an HTTP status error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Whether retrying the same call can plausibly succeed. Only
    /// transport failures qualify; HTTP errors and malformed payloads
    /// repeat deterministically.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
