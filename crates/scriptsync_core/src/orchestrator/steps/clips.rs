//! Clips step: cut one audio-synchronized clip per scene.

use async_trait::async_trait;

use crate::media::ClipSynchronizer;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::types::{Context, SessionState, StepOutcome};
use crate::orchestrator::PipelineStep;

/// Extracts a clip per rendered narration track. A failed clip skips
/// its scene; the session carries on with whatever assembled.
pub struct ClipsStep;

#[async_trait]
impl PipelineStep for ClipsStep {
    fn name(&self) -> &str {
        "Clips"
    }

    fn validate_input(&self, ctx: &Context, state: &SessionState) -> StepResult<()> {
        if state.audio.is_empty() {
            return Err(StepError::invalid_input("no narration audio available"));
        }
        if !ctx.spec.source_video.exists() {
            return Err(StepError::invalid_input(format!(
                "source video not found: {}",
                ctx.spec.source_video.display()
            )));
        }
        Ok(())
    }

    async fn execute(&self, ctx: &Context, state: &mut SessionState) -> StepResult<StepOutcome> {
        let synchronizer = ClipSynchronizer::new(ctx.settings.encode.clone());
        let assets = state.audio.clone();
        let total = assets.len();
        let mut clips = Vec::new();
        let mut failed_numbers = Vec::new();

        for (i, asset) in assets.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                return Err(StepError::Cancelled);
            }

            let Some(scene) = state
                .scenes()
                .iter()
                .find(|s| s.scene_number == asset.scene_number)
                .cloned()
            else {
                ctx.logger.warn(&format!(
                    "No scene for audio asset {}, skipping",
                    asset.scene_number
                ));
                continue;
            };

            let output = ctx.layout.clip_path(scene.scene_number);
            ctx.logger.info(&format!(
                "Cutting clip {}/{} (scene {}, start {})",
                i + 1,
                total,
                scene.scene_number,
                scene.start_time
            ));
            ctx.report_progress(
                self.name(),
                ((i as f64 / total as f64) * 100.0) as u32,
                &format!("scene {}", scene.scene_number),
            );

            match synchronizer
                .extract_clip(&ctx.spec.source_video, &scene, &asset.path, &output)
                .await
            {
                Ok(clip) => clips.push(clip),
                Err(err) => {
                    ctx.logger.warn(&format!(
                        "Scene {} clip failed: {}",
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
                        scene.skip_reason = Some("clip extraction failed".to_string());
                        state.skipped.push(scene);
                    } else {
                        kept.push(scene);
                    }
                }
                alignment.scenes = kept;
            }
        }

        if clips.is_empty() {
            return Ok(StepOutcome::Skipped(
                "no clips could be assembled".to_string(),
            ));
        }

        ctx.logger
            .info(&format!("Assembled {}/{} clips", clips.len(), total));
        state.clips = clips;
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &SessionState) -> StepResult<()> {
        if state.clips.is_empty() {
            return Err(StepError::invalid_output("no clips recorded"));
        }
        for clip in &state.clips {
            if !clip.path.exists() {
                return Err(StepError::invalid_output(format!(
                    "clip file missing: {}",
                    clip.path.display()
                )));
            }
        }
        Ok(())
    }
}
