//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::layout::SessionLayout;
use super::pipeline::CancelHandle;
use crate::config::Settings;
use crate::logging::SessionLogger;
use crate::models::{AudioAsset, ProcessedClip, Scene, SessionSpec};
use crate::service::{AlignmentService, NarrationRenderer};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Remote backends the pipeline talks to, behind trait objects so
/// tests can substitute mocks.
#[derive(Clone)]
pub struct SessionServices {
    pub alignment: Arc<dyn AlignmentService>,
    pub narration: Arc<dyn NarrationRenderer>,
}

/// Read-only context passed to pipeline steps.
///
/// Contains session configuration and shared resources that steps can
/// read but not modify. Mutable state goes in `SessionState`.
pub struct Context {
    /// Session inputs (video, script, instructions).
    pub spec: SessionSpec,
    /// Application settings.
    pub settings: Settings,
    /// Session identifier.
    pub session_id: String,
    /// On-disk layout of the session working directory.
    pub layout: SessionLayout,
    /// Remote service backends.
    pub services: SessionServices,
    /// Per-session logger.
    pub logger: Arc<SessionLogger>,
    /// Cancellation flag shared with the pipeline runner.
    pub cancel: CancelHandle,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(
        spec: SessionSpec,
        settings: Settings,
        session_id: impl Into<String>,
        layout: SessionLayout,
        services: SessionServices,
        logger: Arc<SessionLogger>,
        cancel: CancelHandle,
    ) -> Self {
        Self {
            spec,
            settings,
            session_id: session_id.into(),
            layout,
            services,
            logger,
            cancel,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }
}

/// Mutable session state that accumulates results from pipeline steps.
///
/// Steps append their output; nothing is overwritten once recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// When the session started.
    pub started_at: Option<String>,
    /// Alignment results (from the Align step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentOutput>,
    /// Scenes excluded from assembly, with their reasons.
    #[serde(default)]
    pub skipped: Vec<Scene>,
    /// Rendered narration audio (from the Narrate step).
    #[serde(default)]
    pub audio: Vec<AudioAsset>,
    /// Encoded clips (from the Clips step).
    #[serde(default)]
    pub clips: Vec<ProcessedClip>,
    /// Final concatenated video, when concatenation succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_video: Option<PathBuf>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Check if alignment has been completed.
    pub fn has_alignment(&self) -> bool {
        self.alignment.is_some()
    }

    /// Usable scenes from alignment, if any.
    pub fn scenes(&self) -> &[Scene] {
        self.alignment.as_ref().map(|a| a.scenes.as_slice()).unwrap_or(&[])
    }
}

/// Output from the Align step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentOutput {
    /// Scenes that passed validation, in script order.
    pub scenes: Vec<Scene>,
    /// Free-text notes from the alignment service.
    pub notes: Option<String>,
    /// Whether the chunked path was taken.
    pub chunked: bool,
    /// Number of analysis windows used (1 for single pass).
    pub chunk_count: usize,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (preconditions not met, but not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_state_tracks_completion() {
        let mut state = SessionState::new();
        assert!(!state.has_alignment());
        assert!(state.scenes().is_empty());

        state.alignment = Some(AlignmentOutput {
            scenes: vec![Scene {
                scene_number: 1,
                start_time: "00:00:05".to_string(),
                end_time: "00:00:15".to_string(),
                duration_seconds: Some(10.0),
                narration: "words".to_string(),
                status: None,
                skip_reason: None,
            }],
            notes: None,
            chunked: false,
            chunk_count: 1,
        });

        assert!(state.has_alignment());
        assert_eq!(state.scenes().len(), 1);
    }

    #[test]
    fn session_state_serializes() {
        let state = SessionState::new();
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("started_at"));
        assert!(!json.contains("alignment"));
    }
}
