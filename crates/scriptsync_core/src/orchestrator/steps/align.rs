//! Align step: map the script onto the footage.

use std::time::Duration;

use async_trait::async_trait;

use crate::alignment::{AlignerConfig, ChunkedAligner, SinglePassAligner};
use crate::media::{media_duration, split_into_windows};
use crate::models::partition_scenes;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::types::{AlignmentOutput, Context, SessionState, StepOutcome};
use crate::orchestrator::PipelineStep;
use crate::service::{RateLimiter, RetryPolicy};

/// Runs alignment, choosing the chunked or single-pass path based on
/// the source duration, then validates and persists the scenes.
pub struct AlignStep {
    /// Skip chunking even for long videos.
    pub force_single_pass: bool,
}

impl AlignStep {
    pub fn new(force_single_pass: bool) -> Self {
        Self { force_single_pass }
    }
}

#[async_trait]
impl PipelineStep for AlignStep {
    fn name(&self) -> &str {
        "Align"
    }

    fn validate_input(&self, ctx: &Context, _state: &SessionState) -> StepResult<()> {
        if !ctx.spec.source_video.exists() {
            return Err(StepError::invalid_input(format!(
                "source video not found: {}",
                ctx.spec.source_video.display()
            )));
        }
        if ctx.spec.script.trim().is_empty() {
            return Err(StepError::invalid_input("script is empty"));
        }
        Ok(())
    }

    async fn execute(&self, ctx: &Context, state: &mut SessionState) -> StepResult<StepOutcome> {
        let gemini = &ctx.settings.gemini;
        let encode = &ctx.settings.encode;

        let rate = RateLimiter::new(Duration::from_secs(gemini.api_delay_seconds));
        let retry = RetryPolicy::new(
            gemini.max_retries,
            Duration::from_secs(gemini.retry_backoff_seconds),
        );

        let probe_timeout = Duration::from_secs(encode.probe_timeout_seconds);
        let duration = media_duration(&encode.ffprobe_path, &ctx.spec.source_video, probe_timeout)
            .await?;
        ctx.logger
            .info(&format!("Source duration: {:.1}s", duration));

        let window = gemini.chunk_window_seconds;
        let use_chunks = !self.force_single_pass && duration > window as f64;
        let instructions = ctx.spec.instructions.as_deref();

        let (mut result, chunk_count) = if use_chunks {
            ctx.logger.section("Chunked alignment");
            let chunks = split_into_windows(
                &encode.ffmpeg_path,
                &ctx.spec.source_video,
                &ctx.layout.chunks_dir(),
                window,
                // Stream-copy segmenting is fast; the concat deadline
                // is a comfortable ceiling for it.
                Duration::from_secs(encode.concat_timeout_seconds),
            )
            .await?;
            ctx.logger
                .info(&format!("Analyzing {} windows of {}s", chunks.len(), window));

            let config = AlignerConfig {
                window_seconds: window,
                max_chunk_retries: gemini.max_chunk_retries,
                ..AlignerConfig::default()
            };
            let aligner =
                ChunkedAligner::new(ctx.services.alignment.as_ref(), &rate, &retry, config);
            let count = chunks.len();
            let result = aligner
                .align(&chunks, &ctx.spec.script, instructions, &ctx.cancel)
                .await?;
            (result, count)
        } else {
            ctx.logger.section("Single-pass alignment");
            let aligner = SinglePassAligner::new(ctx.services.alignment.as_ref(), &rate, &retry);
            let result = aligner
                .align(&ctx.spec.source_video, &ctx.spec.script, instructions)
                .await?;
            (result, 1)
        };

        result.renumber();
        let scenes_json = serde_json::to_string_pretty(&result)
            .map_err(|e| StepError::invalid_output(format!("scene serialization: {e}")))?;
        std::fs::write(ctx.layout.scenes_path(), scenes_json)
            .map_err(|e| StepError::io_error("writing scenes.json", e))?;

        let (valid, skipped) = partition_scenes(result.scenes);
        for scene in &skipped {
            ctx.logger.warn(&format!(
                "Scene {} skipped: {}",
                scene.scene_number,
                scene.skip_reason.as_deref().unwrap_or("unknown")
            ));
        }
        ctx.logger.info(&format!(
            "Alignment produced {} usable scenes ({} skipped)",
            valid.len(),
            skipped.len()
        ));

        state.skipped.extend(skipped);
        if valid.is_empty() {
            return Err(StepError::NoUsableScenes);
        }

        state.alignment = Some(AlignmentOutput {
            scenes: valid,
            notes: result.notes,
            chunked: use_chunks,
            chunk_count,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &SessionState) -> StepResult<()> {
        if state.scenes().is_empty() {
            return Err(StepError::invalid_output("alignment recorded no scenes"));
        }
        Ok(())
    }
}
