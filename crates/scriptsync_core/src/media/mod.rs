//! Local media processing via ffmpeg and ffprobe.

mod clip;
mod concat;
mod error;
mod probe;
mod runner;
mod split;

pub use clip::ClipSynchronizer;
pub use concat::{concatenate_clips, write_concat_manifest};
pub use error::MediaError;
pub use probe::media_duration;
pub use runner::run_tool;
pub use split::split_into_windows;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;
