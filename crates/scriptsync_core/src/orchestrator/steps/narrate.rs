//! Narrate step: render each scene's narration to audio.

use std::time::Duration;

use async_trait::async_trait;

use crate::models::AudioAsset;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::types::{Context, SessionState, StepOutcome};
use crate::orchestrator::PipelineStep;
use crate::service::RetryPolicy;

/// Renders narration audio per scene. A scene whose synthesis fails is
/// excluded from assembly rather than failing the session.
pub struct NarrateStep;

#[async_trait]
impl PipelineStep for NarrateStep {
    fn name(&self) -> &str {
        "Narrate"
    }

    fn validate_input(&self, _ctx: &Context, state: &SessionState) -> StepResult<()> {
        if !state.has_alignment() {
            return Err(StepError::invalid_input("alignment has not run"));
        }
        Ok(())
    }

    async fn execute(&self, ctx: &Context, state: &mut SessionState) -> StepResult<StepOutcome> {
        let gemini = &ctx.settings.gemini;
        let retry = RetryPolicy::new(
            gemini.max_retries,
            Duration::from_secs(gemini.retry_backoff_seconds),
        );

        let scenes = state.scenes().to_vec();
        let total = scenes.len();
        let mut rendered = Vec::new();
        let mut failed_numbers = Vec::new();

        for (i, scene) in scenes.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                return Err(StepError::Cancelled);
            }

            let output = ctx.layout.audio_path(scene.scene_number);
            ctx.logger.info(&format!(
                "Rendering narration {}/{} (scene {})",
                i + 1,
                total,
                scene.scene_number
            ));
            ctx.report_progress(
                self.name(),
                ((i as f64 / total as f64) * 100.0) as u32,
                &format!("scene {}", scene.scene_number),
            );

            let render = retry
                .execute("narration synthesis", || {
                    ctx.services.narration.render(&scene.narration, &output)
                })
                .await;

            match render {
                Ok(()) => rendered.push(AudioAsset {
                    scene_number: scene.scene_number,
                    path: output,
                    duration_seconds: None,
                }),
                Err(err) => {
                    ctx.logger.warn(&format!(
                        "Scene {} narration failed: {}",
                        scene.scene_number, err
                    ));
                    failed_numbers.push(scene.scene_number);
                }
            }
        }

        if !failed_numbers.is_empty() {
            if let Some(alignment) = state.alignment.as_mut() {
                let mut kept = Vec::with_capacity(alignment.scenes.len());
                for mut scene in alignment.scenes.drain(..) {
                    if failed_numbers.contains(&scene.scene_number) {
                        scene.skip_reason = Some("narration synthesis failed".to_string());
                        state.skipped.push(scene);
                    } else {
                        kept.push(scene);
                    }
                }
                alignment.scenes = kept;
            }
        }

        if rendered.is_empty() {
            return Err(StepError::invalid_output("no narration could be rendered"));
        }

        ctx.logger.info(&format!(
            "Rendered {}/{} narration tracks",
            rendered.len(),
            total
        ));
        state.audio = rendered;
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &SessionState) -> StepResult<()> {
        if state.audio.is_empty() {
            return Err(StepError::invalid_output("no audio assets recorded"));
        }
        Ok(())
    }
}
