//! Subprocess execution with a hard deadline.

use std::process::Output;
use std::time::Duration;

use tokio::process::Command;

use super::error::MediaError;

/// Run a prepared command, killing it if the deadline passes.
///
/// A non-zero exit maps to `CommandFailed` with the tail of stderr
/// preserved; runaway encodes map to `Timeout`.
pub async fn run_tool(
    mut cmd: Command,
    tool: &str,
    timeout: Duration,
) -> Result<Output, MediaError> {
    cmd.kill_on_drop(true);
    tracing::debug!(tool, timeout_secs = timeout.as_secs(), "running external tool");

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(MediaError::Timeout {
                tool: tool.to_string(),
                seconds: timeout.as_secs(),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::command_failed(
            tool,
            output.status.code().unwrap_or(-1),
            tail(&stderr, 2000),
        ));
    }

    Ok(output)
}

/// Last `max` bytes of `text`, on a char boundary.
fn tail(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_short_text() {
        assert_eq!(tail("hello", 10), "hello");
    }

    #[test]
    fn tail_truncates_on_char_boundary() {
        let text = "aé".repeat(100);
        let t = tail(&text, 5);
        assert!(t.len() <= 5);
        assert!(t.is_char_boundary(0));
    }

    #[tokio::test]
    async fn missing_tool_is_io_error() {
        let cmd = Command::new("definitely-not-a-real-tool-xyz");
        let err = run_tool(cmd, "fake", Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, MediaError::Io(_)));
    }

    #[tokio::test]
    async fn failing_command_reports_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo boom >&2; exit 3"]);
        let err = run_tool(cmd, "sh", Duration::from_secs(5)).await.unwrap_err();
        match err {
            MediaError::CommandFailed {
                tool,
                exit_code,
                stderr,
            } => {
                assert_eq!(tool, "sh");
                assert_eq!(exit_code, 3);
                assert!(stderr.contains("boom"));
            }
            other => panic!("expected CommandFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 5"]);
        let err = run_tool(cmd, "sh", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Timeout { .. }));
    }
}
