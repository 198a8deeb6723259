//! Session processor: wires inputs, layout, and pipeline together.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use super::create_session_pipeline;
use super::layout::SessionLayout;
use super::pipeline::{CancelHandle, PipelineRunResult};
use super::types::{Context, ProgressCallback, SessionServices, SessionState};
use crate::config::Settings;
use crate::logging::{LogCallback, LogConfig, SessionLogger};
use crate::models::{ProcessedClip, Scene, SessionSpec, SkippedScene};

/// Final status of a processing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Every scene made it into the final video.
    Success,
    /// Output exists but some scenes were skipped, or the final
    /// concatenation did not happen.
    Partial,
    /// The pipeline stopped with an error.
    Failed,
}

/// Caller-facing result of one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub session_id: String,
    pub status: SessionStatus,
    /// Scenes that made it through assembly.
    pub scenes: Vec<Scene>,
    pub clips: Vec<ProcessedClip>,
    /// Scenes excluded along the way, with reasons.
    pub skipped: Vec<SkippedScene>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_video: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
}

impl SessionOutcome {
    fn failure(session_id: String, error: String, error_kind: &str) -> Self {
        Self {
            session_id,
            status: SessionStatus::Failed,
            scenes: Vec::new(),
            clips: Vec::new(),
            skipped: Vec::new(),
            final_video: None,
            error: Some(error),
            error_kind: Some(error_kind.to_string()),
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        }
    }
}

/// Options for one session run.
#[derive(Default)]
pub struct SessionOptions {
    /// Requested session id; blank means a timestamp id.
    pub session_id: Option<String>,
    /// Skip chunking even for long videos.
    pub force_single_pass: bool,
    /// Callback receiving each session log line.
    pub log_callback: Option<LogCallback>,
    /// Callback receiving progress updates.
    pub progress_callback: Option<ProgressCallback>,
    /// External cancellation handle.
    pub cancel: Option<CancelHandle>,
}

/// Runs sessions through the standard pipeline.
///
/// The processor is responsible for building the session directory
/// layout, the per-session logger, and the pipeline context, then
/// collecting results into a `SessionOutcome`.
pub struct SessionProcessor {
    settings: Settings,
    log_dir: PathBuf,
    sessions_dir: PathBuf,
    services: SessionServices,
}

impl SessionProcessor {
    pub fn new(
        settings: Settings,
        log_dir: PathBuf,
        sessions_dir: PathBuf,
        services: SessionServices,
    ) -> Self {
        Self {
            settings,
            log_dir,
            sessions_dir,
            services,
        }
    }

    /// Process a single session.
    ///
    /// Never panics or returns `Err`; every failure mode lands in the
    /// outcome so queue callers can keep going.
    pub async fn process_session(
        &self,
        spec: SessionSpec,
        options: SessionOptions,
    ) -> SessionOutcome {
        let requested_id = options.session_id.as_deref().unwrap_or("");
        let layout = SessionLayout::new(&self.sessions_dir, requested_id);
        let session_id = layout.session_id().to_string();

        if let Err(e) = layout.create_all() {
            return SessionOutcome::failure(
                session_id,
                format!("Failed to create session directories: {e}"),
                "setup",
            );
        }
        if let Err(e) = std::fs::write(layout.script_path(), &spec.script) {
            return SessionOutcome::failure(
                session_id,
                format!("Failed to persist script: {e}"),
                "setup",
            );
        }

        let log_config = LogConfig {
            compact: self.settings.logging.compact,
            progress_step: self.settings.logging.progress_step,
            error_tail: self.settings.logging.error_tail as usize,
            ..LogConfig::default()
        };
        let logger = match SessionLogger::new(
            &session_id,
            &self.log_dir,
            log_config,
            options.log_callback,
        ) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                return SessionOutcome::failure(
                    session_id,
                    format!("Failed to create logger: {e}"),
                    "setup",
                );
            }
        };

        let pipeline = create_session_pipeline(options.force_single_pass);
        let cancel = options.cancel.unwrap_or_else(|| pipeline.cancel_handle());

        let mut ctx = Context::new(
            spec,
            self.settings.clone(),
            &session_id,
            layout,
            self.services.clone(),
            logger,
            cancel,
        );
        if let Some(callback) = options.progress_callback {
            ctx = ctx.with_progress_callback(callback);
        }

        let mut state = SessionState::new();
        ctx.logger
            .info(&format!("Starting session: {}", session_id));
        ctx.logger.info(&format!(
            "Source: {}",
            ctx.spec.source_video.display()
        ));

        match pipeline.run(&ctx, &mut state).await {
            Ok(run_result) => {
                let status = derive_status(&state, &run_result);
                ctx.logger
                    .info(&format!("Session finished with status {:?}", status));
                SessionOutcome {
                    session_id,
                    status,
                    scenes: state.scenes().to_vec(),
                    clips: state.clips.clone(),
                    skipped: to_skipped(&state.skipped),
                    final_video: state.final_video.clone(),
                    error: None,
                    error_kind: None,
                    steps_completed: run_result.steps_completed,
                    steps_skipped: run_result.steps_skipped,
                }
            }
            Err(e) => {
                ctx.logger.error(&format!("Pipeline failed: {e}"));
                ctx.logger.show_tail("failure");
                let mut outcome =
                    SessionOutcome::failure(session_id, e.to_string(), e.kind());
                // Keep whatever partial results exist for diagnosis.
                outcome.scenes = state.scenes().to_vec();
                outcome.clips = state.clips.clone();
                outcome.skipped = to_skipped(&state.skipped);
                outcome
            }
        }
    }
}

/// Map pipeline results onto the caller-facing status.
fn derive_status(state: &SessionState, run_result: &PipelineRunResult) -> SessionStatus {
    let complete = state.final_video.is_some()
        && state.skipped.is_empty()
        && run_result.all_completed();
    if complete {
        SessionStatus::Success
    } else {
        SessionStatus::Partial
    }
}

fn to_skipped(scenes: &[Scene]) -> Vec<SkippedScene> {
    scenes
        .iter()
        .map(|s| SkippedScene {
            scene_number: s.scene_number,
            reason: s
                .skip_reason
                .clone()
                .unwrap_or_else(|| "unspecified".to_string()),
        })
        .collect()
}
