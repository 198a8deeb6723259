//! Session input specification.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Caller-provided inputs for one processing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSpec {
    /// Path to the source video.
    pub source_video: PathBuf,

    /// Full narration script to align against the video.
    pub script: String,

    /// Optional extra instructions forwarded to the alignment service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl SessionSpec {
    pub fn new(source_video: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self {
            source_video: source_video.into(),
            script: script.into(),
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}
