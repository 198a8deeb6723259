//! Splitting a source video into fixed analysis windows.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use super::error::MediaError;
use super::runner::run_tool;

/// Split `source` into stream-copied windows of `window_seconds` under
/// `output_dir`, returning the chunk paths in playback order.
///
/// Segmenting with `-c copy` cuts on keyframes, so window boundaries
/// are approximate; the alignment controller tolerates that because it
/// re-anchors timestamps per window and trims script by content.
pub async fn split_into_windows(
    ffmpeg: &str,
    source: &Path,
    output_dir: &Path,
    window_seconds: u32,
    timeout: Duration,
) -> Result<Vec<PathBuf>, MediaError> {
    if !source.exists() {
        return Err(MediaError::SourceNotFound(source.to_path_buf()));
    }
    std::fs::create_dir_all(output_dir)?;

    let pattern = output_dir.join("chunk_%03d.mp4");
    let mut cmd = Command::new(ffmpeg);
    cmd.args(build_split_args(source, &pattern, window_seconds));

    run_tool(cmd, "ffmpeg", timeout).await?;

    let mut chunks: Vec<PathBuf> = std::fs::read_dir(output_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("chunk_") && n.ends_with(".mp4"))
                .unwrap_or(false)
        })
        .collect();
    chunks.sort();

    if chunks.is_empty() {
        return Err(MediaError::parse("segmenting produced no chunk files"));
    }
    tracing::info!(count = chunks.len(), window_seconds, "video split into windows");
    Ok(chunks)
}

fn build_split_args(source: &Path, pattern: &Path, window_seconds: u32) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        source.into(),
        "-f".into(),
        "segment".into(),
        "-segment_time".into(),
        window_seconds.to_string().into(),
        "-c".into(),
        "copy".into(),
        "-map".into(),
        "0".into(),
        "-reset_timestamps".into(),
        "1".into(),
        pattern.into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_args_request_stream_copy_segments() {
        let args = build_split_args(
            Path::new("in.mp4"),
            Path::new("/tmp/chunk_%03d.mp4"),
            600,
        );
        let rendered: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let joined = rendered.join(" ");
        assert!(joined.contains("-f segment"));
        assert!(joined.contains("-segment_time 600"));
        assert!(joined.contains("-c copy"));
        assert!(joined.contains("-reset_timestamps 1"));
        assert!(joined.ends_with("chunk_%03d.mp4"));
    }

    #[tokio::test]
    async fn missing_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = split_into_windows(
            "ffmpeg",
            Path::new("/nonexistent/source.mp4"),
            dir.path(),
            600,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::SourceNotFound(_)));
    }
}
