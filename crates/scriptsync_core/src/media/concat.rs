//! Joining processed clips into the final video.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use super::error::MediaError;
use super::runner::run_tool;

/// Render the concat demuxer manifest for `clips`, in order.
///
/// Paths are wrapped in single quotes with embedded quotes escaped the
/// way the demuxer expects (`'\''`).
pub fn write_concat_manifest(clips: &[PathBuf]) -> String {
    let mut manifest = String::new();
    for clip in clips {
        let escaped = clip.display().to_string().replace('\'', r"'\''");
        manifest.push_str(&format!("file '{escaped}'\n"));
    }
    manifest
}

/// Concatenate clips into `output` using the concat demuxer with
/// stream copy. All clips share an encode profile, so no re-encode is
/// needed. The manifest file is removed on success and kept on failure
/// for inspection.
pub async fn concatenate_clips(
    ffmpeg: &str,
    clips: &[PathBuf],
    manifest_path: &Path,
    output: &Path,
    timeout: Duration,
) -> Result<(), MediaError> {
    if clips.is_empty() {
        return Err(MediaError::parse("no clips to concatenate"));
    }
    for clip in clips {
        if !clip.exists() {
            return Err(MediaError::SourceNotFound(clip.clone()));
        }
    }

    std::fs::write(manifest_path, write_concat_manifest(clips))?;

    let mut cmd = Command::new(ffmpeg);
    cmd.args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(manifest_path)
        .args(["-c", "copy"])
        .arg(output);

    run_tool(cmd, "ffmpeg", timeout).await?;

    let _ = std::fs::remove_file(manifest_path);
    tracing::info!(clips = clips.len(), output = %output.display(), "final video assembled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_lists_clips_in_order() {
        let clips = vec![
            PathBuf::from("/work/clip_001.mp4"),
            PathBuf::from("/work/clip_002.mp4"),
        ];
        let manifest = write_concat_manifest(&clips);
        assert_eq!(
            manifest,
            "file '/work/clip_001.mp4'\nfile '/work/clip_002.mp4'\n"
        );
    }

    #[test]
    fn manifest_escapes_quotes() {
        let clips = vec![PathBuf::from("/work/it's here.mp4")];
        let manifest = write_concat_manifest(&clips);
        assert_eq!(manifest, "file '/work/it'\\''s here.mp4'\n");
    }

    #[tokio::test]
    async fn empty_clip_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = concatenate_clips(
            "ffmpeg",
            &[],
            &dir.path().join("list.txt"),
            &dir.path().join("out.mp4"),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::Parse(_)));
    }

    #[tokio::test]
    async fn missing_clip_is_rejected_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let err = concatenate_clips(
            "ffmpeg",
            &[dir.path().join("ghost.mp4")],
            &dir.path().join("list.txt"),
            &dir.path().join("out.mp4"),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::SourceNotFound(_)));
    }
}
