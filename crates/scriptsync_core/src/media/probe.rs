//! Duration probing via ffprobe.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;

use super::error::MediaError;
use super::runner::run_tool;

/// Read a file's duration in seconds with ffprobe.
pub async fn media_duration(
    ffprobe: &str,
    path: &Path,
    timeout: Duration,
) -> Result<f64, MediaError> {
    if !path.exists() {
        return Err(MediaError::SourceNotFound(path.to_path_buf()));
    }

    let mut cmd = Command::new(ffprobe);
    cmd.args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
        .arg(path);

    let output = run_tool(cmd, "ffprobe", timeout).await?;
    let json: Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| MediaError::parse(format!("ffprobe output: {e}")))?;

    parse_duration(&json)
        .ok_or_else(|| MediaError::duration_unavailable(path, "no format.duration in probe output"))
}

/// Pull `format.duration` out of ffprobe's JSON. The field is a string.
fn parse_duration(json: &Value) -> Option<f64> {
    let raw = json.get("format")?.get("duration")?.as_str()?;
    let seconds: f64 = raw.trim().parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_duration_string() {
        let probe = json!({"format": {"duration": "12.345000"}});
        assert_eq!(parse_duration(&probe), Some(12.345));
    }

    #[test]
    fn missing_duration_is_none() {
        assert_eq!(parse_duration(&json!({"format": {}})), None);
        assert_eq!(parse_duration(&json!({})), None);
    }

    #[test]
    fn garbage_duration_is_none() {
        let probe = json!({"format": {"duration": "N/A"}});
        assert_eq!(parse_duration(&probe), None);
        let negative = json!({"format": {"duration": "-3.0"}});
        assert_eq!(parse_duration(&negative), None);
    }

    #[tokio::test]
    async fn missing_file_is_source_not_found() {
        let err = media_duration(
            "ffprobe",
            Path::new("/nonexistent/video.mp4"),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::SourceNotFound(_)));
    }
}
