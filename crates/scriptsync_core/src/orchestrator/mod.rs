//! Session orchestration.
//!
//! A session runs through four steps: Align (script to footage),
//! Narrate (text to speech), Clips (audio-synchronized extraction),
//! and Concat (final assembly). The pipeline validates before and
//! after each step and supports cancellation at step and per-scene
//! boundaries.

mod errors;
mod layout;
mod pipeline;
mod session;
mod step;
mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use layout::SessionLayout;
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use session::{SessionOptions, SessionOutcome, SessionProcessor, SessionStatus};
pub use step::PipelineStep;
pub use steps::{AlignStep, ClipsStep, ConcatStep, NarrateStep};
pub use types::{
    AlignmentOutput, Context, ProgressCallback, SessionServices, SessionState, StepOutcome,
};

/// Build the standard session pipeline.
pub fn create_session_pipeline(force_single_pass: bool) -> Pipeline {
    Pipeline::new()
        .with_step(AlignStep::new(force_single_pass))
        .with_step(NarrateStep)
        .with_step(ClipsStep)
        .with_step(ConcatStep)
}
