//! Concat step: join clips into the final video.

use std::time::Duration;

use async_trait::async_trait;

use crate::media::concatenate_clips;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::types::{Context, SessionState, StepOutcome};
use crate::orchestrator::PipelineStep;

/// Concatenates the session's clips. A concatenation failure leaves
/// the clips on disk and the session partial instead of failed.
pub struct ConcatStep;

#[async_trait]
impl PipelineStep for ConcatStep {
    fn name(&self) -> &str {
        "Concat"
    }

    fn validate_input(&self, _ctx: &Context, _state: &SessionState) -> StepResult<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &Context, state: &mut SessionState) -> StepResult<StepOutcome> {
        if state.clips.is_empty() {
            return Ok(StepOutcome::Skipped("no clips to concatenate".to_string()));
        }

        let paths: Vec<_> = state.clips.iter().map(|c| c.path.clone()).collect();
        let output = ctx.layout.final_video_path();
        ctx.logger.info(&format!(
            "Concatenating {} clips into {}",
            paths.len(),
            output.display()
        ));

        let timeout = Duration::from_secs(ctx.settings.encode.concat_timeout_seconds);
        match concatenate_clips(
            &ctx.settings.encode.ffmpeg_path,
            &paths,
            &ctx.layout.concat_list_path(),
            &output,
            timeout,
        )
        .await
        {
            Ok(()) => {
                state.final_video = Some(output);
                Ok(StepOutcome::Success)
            }
            Err(err) => {
                // The individual clips are still usable output.
                ctx.logger
                    .error(&format!("Concatenation failed, clips kept: {}", err));
                Ok(StepOutcome::Skipped(format!("concatenation failed: {err}")))
            }
        }
    }

    fn validate_output(&self, _ctx: &Context, state: &SessionState) -> StepResult<()> {
        match &state.final_video {
            Some(path) if path.exists() => Ok(()),
            Some(path) => Err(StepError::invalid_output(format!(
                "final video missing: {}",
                path.display()
            ))),
            None => Err(StepError::invalid_output("final video not recorded")),
        }
    }
}
