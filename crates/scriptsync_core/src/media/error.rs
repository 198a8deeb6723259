//! Error types for media processing.

use std::path::PathBuf;

use thiserror::Error;

/// Error from an ffmpeg or ffprobe operation.
#[derive(Error, Debug)]
pub enum MediaError {
    /// The input file does not exist.
    #[error("source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The tool exited with a non-zero status.
    #[error("{tool} failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        stderr: String,
    },

    /// The tool ran past its deadline and was killed.
    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    /// A duration could not be read from the file.
    #[error("could not determine duration of {}: {reason}", .path.display())]
    DurationUnavailable { path: PathBuf, reason: String },

    /// Tool output could not be parsed.
    #[error("failed to parse tool output: {0}")]
    Parse(String),

    /// File I/O around a media operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn command_failed(tool: impl Into<String>, exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn duration_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DurationUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}
