//! Data model shared across the pipeline.

mod scenes;
mod session;

pub use scenes::{
    partition_scenes, AlignmentResult, AudioAsset, ProcessedClip, Scene, SkippedScene,
};
pub use session::SessionSpec;
