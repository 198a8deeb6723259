//! Chunked alignment controller.
//!
//! Long videos are split into fixed windows and analyzed one at a
//! time. Each window sees only the script that earlier windows have
//! not consumed; after a window returns scenes, the split-point search
//! decides how much script was used. A window whose result cannot be
//! placed in the script is retried a few times and, failing that,
//! either accepted untrimmed or dropped.

use std::path::PathBuf;
use std::time::Duration;

use super::decision::{decide_trim, TrimOutcome};
use super::errors::AlignmentError;
use super::prompt::build_alignment_prompt;
use super::response::parse_alignment;
use crate::models::AlignmentResult;
use crate::orchestrator::CancelHandle;
use crate::service::{AlignmentService, RateLimiter, RetryPolicy};

/// Tuning for the chunked controller.
#[derive(Debug, Clone)]
pub struct AlignerConfig {
    /// Window length each chunk file covers, used to re-anchor
    /// chunk-relative timestamps.
    pub window_seconds: u32,
    /// Attempts per chunk before it is accepted degraded or dropped.
    pub max_chunk_retries: u32,
    /// Stop early once the unconsumed script is shorter than this.
    pub min_remaining_chars: usize,
    /// Pause before re-asking about the same chunk.
    pub chunk_retry_pause: Duration,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            window_seconds: 600,
            max_chunk_retries: 3,
            min_remaining_chars: 10,
            chunk_retry_pause: Duration::from_secs(5),
        }
    }
}

/// Walks chunk files in order, maintaining the unconsumed script.
pub struct ChunkedAligner<'a> {
    service: &'a dyn AlignmentService,
    rate: &'a RateLimiter,
    retry: &'a RetryPolicy,
    config: AlignerConfig,
}

impl<'a> ChunkedAligner<'a> {
    pub fn new(
        service: &'a dyn AlignmentService,
        rate: &'a RateLimiter,
        retry: &'a RetryPolicy,
        config: AlignerConfig,
    ) -> Self {
        Self {
            service,
            rate,
            retry,
            config,
        }
    }

    /// Align `script` against the chunk files, which must be in
    /// playback order and each cover `window_seconds` of footage.
    pub async fn align(
        &self,
        chunks: &[PathBuf],
        script: &str,
        instructions: Option<&str>,
        cancel: &CancelHandle,
    ) -> Result<AlignmentResult, AlignmentError> {
        if chunks.is_empty() {
            return Err(AlignmentError::invalid_input("no chunk files to analyze"));
        }
        if script.trim().is_empty() {
            return Err(AlignmentError::invalid_input("script is empty"));
        }

        let mut remaining = script.to_string();
        let mut all_scenes = Vec::new();
        let mut notes = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(AlignmentError::Cancelled);
            }

            if remaining.trim().len() < self.config.min_remaining_chars {
                tracing::info!(
                    chunk = index + 1,
                    total = chunks.len(),
                    "script exhausted, skipping remaining chunks"
                );
                break;
            }

            let offset = (index as u32 * self.config.window_seconds) as f64;
            let mut accepted = false;

            for attempt in 1..=self.config.max_chunk_retries {
                if attempt > 1 {
                    tokio::time::sleep(self.config.chunk_retry_pause).await;
                }

                let mut result = match self.analyze_chunk(chunk, &remaining, instructions).await {
                    Ok(result) => result,
                    Err(err) => {
                        tracing::warn!(
                            chunk = index + 1,
                            attempt,
                            error = %err,
                            "chunk analysis failed"
                        );
                        continue;
                    }
                };

                if result.scenes.is_empty() {
                    tracing::warn!(chunk = index + 1, attempt, "chunk returned zero scenes");
                    continue;
                }

                for scene in &mut result.scenes {
                    scene.offset_by(offset);
                }

                let checkpoint = all_scenes.len();
                let scene_count = result.scenes.len();
                all_scenes.extend(result.scenes);
                let note = result.notes.filter(|n| !n.trim().is_empty());

                let retries_left = attempt < self.config.max_chunk_retries;
                match decide_trim(&remaining, &all_scenes[checkpoint..], retries_left) {
                    TrimOutcome::Advance {
                        remaining: rest,
                        consumed,
                    } => {
                        tracing::info!(
                            chunk = index + 1,
                            scenes = scene_count,
                            consumed_chars = consumed,
                            "chunk accepted"
                        );
                        remaining = rest;
                        accepted = true;
                    }
                    TrimOutcome::NothingToTrim => {
                        tracing::warn!(
                            chunk = index + 1,
                            "no narration to trim against, keeping script as-is"
                        );
                        accepted = true;
                    }
                    TrimOutcome::DegradedAccept => {
                        tracing::warn!(
                            chunk = index + 1,
                            "narration not found in script, accepting untrimmed; \
                             later chunks may duplicate coverage"
                        );
                        accepted = true;
                    }
                    TrimOutcome::Retry => {
                        tracing::warn!(
                            chunk = index + 1,
                            attempt,
                            "narration not found in script, rolling back chunk"
                        );
                        all_scenes.truncate(checkpoint);
                    }
                }

                if accepted {
                    if let Some(note) = note {
                        notes.push(note);
                    }
                    break;
                }
            }

            if !accepted {
                tracing::warn!(
                    chunk = index + 1,
                    attempts = self.config.max_chunk_retries,
                    "chunk dropped after exhausting attempts"
                );
            }
        }

        if all_scenes.is_empty() {
            return Err(AlignmentError::NoScenes);
        }

        let mut result = AlignmentResult {
            scenes: all_scenes,
            notes: if notes.is_empty() {
                None
            } else {
                Some(notes.join("\n"))
            },
        };
        result.renumber();
        Ok(result)
    }

    async fn analyze_chunk(
        &self,
        chunk: &PathBuf,
        remaining_script: &str,
        instructions: Option<&str>,
    ) -> Result<AlignmentResult, AlignmentError> {
        self.rate.wait().await;
        let video = self
            .retry
            .execute("chunk upload", || self.service.upload_video(chunk))
            .await?;

        let prompt = build_alignment_prompt(remaining_script, instructions);
        let text = self
            .retry
            .execute("chunk alignment", || {
                self.service.request_alignment(&video, &prompt)
            })
            .await?;

        parse_alignment(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::service::{ServiceError, VideoHandle};

    /// Serves a scripted sequence of responses, one per alignment call.
    struct MockService {
        responses: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockService {
        fn new(mut responses: Vec<String>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AlignmentService for MockService {
        async fn upload_video(&self, path: &Path) -> Result<VideoHandle, ServiceError> {
            Ok(VideoHandle {
                name: format!("files/{}", path.display()),
                uri: "https://example.test/file".to_string(),
                mime_type: "video/mp4".to_string(),
            })
        }

        async fn request_alignment(
            &self,
            _video: &VideoHandle,
            prompt: &str,
        ) -> Result<String, ServiceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ServiceError::missing_data("no scripted response left"))
        }
    }

    fn aligner_parts() -> (RateLimiter, RetryPolicy, AlignerConfig) {
        (
            RateLimiter::new(Duration::ZERO),
            RetryPolicy::new(1, Duration::from_millis(1)),
            AlignerConfig {
                window_seconds: 600,
                max_chunk_retries: 2,
                min_remaining_chars: 10,
                chunk_retry_pause: Duration::from_millis(1),
            },
        )
    }

    fn chunk_paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("chunk_{i:03}.mp4"))).collect()
    }

    const SCRIPT: &str = "The lighthouse keeper climbed the spiral stairs at dusk. \
        Gulls wheeled over the breakwater as the lamp began to turn. \
        By midnight the storm had swallowed the horizon completely.";

    fn scenes_json(narration: &str) -> String {
        format!(
            r#"{{"scenes": [{{"scene_number": 1, "start_time": "00:10", "end_time": "00:22", "narration": "{narration}"}}]}}"#
        )
    }

    /// The script portion of a prompt, i.e. everything after the marker.
    fn script_portion(prompt: &str) -> &str {
        prompt.split("SCRIPT:\n").nth(1).unwrap()
    }

    fn squash_ws(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[tokio::test]
    async fn consumed_script_shrinks_across_chunks() {
        let service = MockService::new(vec![
            scenes_json("The lighthouse keeper climbed the spiral stairs at dusk."),
            scenes_json("Gulls wheeled over the breakwater as the lamp began to turn."),
        ]);
        let (rate, retry, config) = aligner_parts();
        let aligner = ChunkedAligner::new(&service, &rate, &retry, config);
        let cancel = CancelHandle::new();

        let result = aligner
            .align(&chunk_paths(2), SCRIPT, None, &cancel)
            .await
            .unwrap();

        assert_eq!(result.scenes.len(), 2);
        // The second prompt must carry only the unconsumed script.
        let prompts = service.prompts.lock().unwrap();
        assert!(!prompts[1].contains("lighthouse keeper climbed"));
        assert!(prompts[1].contains("Gulls wheeled over the breakwater"));
    }

    #[tokio::test]
    async fn consumed_prefixes_reconstruct_the_script() {
        let service = MockService::new(vec![
            scenes_json("The lighthouse keeper climbed the spiral stairs at dusk."),
            scenes_json("Gulls wheeled over the breakwater as the lamp began to turn."),
            scenes_json("By midnight the storm had swallowed the horizon completely."),
        ]);
        let (rate, retry, config) = aligner_parts();
        let aligner = ChunkedAligner::new(&service, &rate, &retry, config);

        let result = aligner
            .align(&chunk_paths(3), SCRIPT, None, &CancelHandle::new())
            .await
            .unwrap();
        assert_eq!(result.scenes.len(), 3);

        // Each prompt carries the then-remaining script; the part each
        // chunk consumed is its script minus the next prompt's, which
        // must be a trailing piece of it. Stitching the consumed parts
        // back together has to yield the whole script.
        let prompts = service.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        let scripts: Vec<&str> = prompts.iter().map(|p| script_portion(p)).collect();

        let mut rebuilt = String::new();
        for pair in scripts.windows(2) {
            assert!(pair[0].ends_with(pair[1]), "not a suffix: {:?}", pair[1]);
            rebuilt.push_str(&pair[0][..pair[0].len() - pair[1].len()]);
        }
        rebuilt.push_str(scripts.last().unwrap());

        assert_eq!(squash_ws(&rebuilt), squash_ws(SCRIPT));
    }

    #[tokio::test]
    async fn second_chunk_timestamps_are_offset() {
        let service = MockService::new(vec![
            scenes_json("The lighthouse keeper climbed the spiral stairs at dusk."),
            scenes_json("Gulls wheeled over the breakwater as the lamp began to turn."),
        ]);
        let (rate, retry, config) = aligner_parts();
        let aligner = ChunkedAligner::new(&service, &rate, &retry, config);

        let result = aligner
            .align(&chunk_paths(2), SCRIPT, None, &CancelHandle::new())
            .await
            .unwrap();

        assert_eq!(result.scenes[0].start_time, "00:00:10.000");
        assert_eq!(result.scenes[1].start_time, "00:10:10.000");
        let numbers: Vec<u32> = result.scenes.iter().map(|s| s.scene_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn unlocatable_chunk_is_retried_then_accepted_degraded() {
        let off_script = scenes_json("Totally unrelated words about a desert caravan at noon.");
        let service = MockService::new(vec![off_script.clone(), off_script]);
        let (rate, retry, config) = aligner_parts();
        let aligner = ChunkedAligner::new(&service, &rate, &retry, config);

        let result = aligner
            .align(&chunk_paths(1), SCRIPT, None, &CancelHandle::new())
            .await
            .unwrap();

        // Both attempts were spent; the second is kept untrimmed.
        assert_eq!(result.scenes.len(), 1);
        assert!(service.responses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_chunk_is_dropped_but_run_continues() {
        let service = MockService::new(vec![
            "not json at all".to_string(),
            "still not json".to_string(),
            scenes_json("Gulls wheeled over the breakwater as the lamp began to turn."),
        ]);
        let (rate, retry, config) = aligner_parts();
        let aligner = ChunkedAligner::new(&service, &rate, &retry, config);

        let result = aligner
            .align(&chunk_paths(2), SCRIPT, None, &CancelHandle::new())
            .await
            .unwrap();

        assert_eq!(result.scenes.len(), 1);
        assert!(result.scenes[0].narration.contains("Gulls wheeled"));
    }

    #[tokio::test]
    async fn all_chunks_failing_is_no_scenes() {
        let service = MockService::new(vec!["nope".to_string(), "nope".to_string()]);
        let (rate, retry, config) = aligner_parts();
        let aligner = ChunkedAligner::new(&service, &rate, &retry, config);

        let err = aligner
            .align(&chunk_paths(1), SCRIPT, None, &CancelHandle::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AlignmentError::NoScenes));
    }

    #[tokio::test]
    async fn cancellation_stops_before_first_chunk() {
        let service = MockService::new(vec![]);
        let (rate, retry, config) = aligner_parts();
        let aligner = ChunkedAligner::new(&service, &rate, &retry, config);
        let cancel = CancelHandle::new();
        cancel.cancel();

        let err = aligner
            .align(&chunk_paths(2), SCRIPT, None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AlignmentError::Cancelled));
    }

    #[tokio::test]
    async fn exhausted_script_skips_trailing_chunks() {
        let service = MockService::new(vec![scenes_json(SCRIPT)]);
        let (rate, retry, config) = aligner_parts();
        let aligner = ChunkedAligner::new(&service, &rate, &retry, config);

        // Three chunks but the first consumes the whole script; the
        // mock would error on any further call.
        let result = aligner
            .align(&chunk_paths(3), SCRIPT, None, &CancelHandle::new())
            .await
            .unwrap();
        assert_eq!(result.scenes.len(), 1);
    }

    #[tokio::test]
    async fn empty_inputs_are_rejected() {
        let service = MockService::new(vec![]);
        let (rate, retry, config) = aligner_parts();
        let aligner = ChunkedAligner::new(&service, &rate, &retry, config);

        assert!(matches!(
            aligner.align(&[], SCRIPT, None, &CancelHandle::new()).await,
            Err(AlignmentError::InvalidInput(_))
        ));
        assert!(matches!(
            aligner
                .align(&chunk_paths(1), "  ", None, &CancelHandle::new())
                .await,
            Err(AlignmentError::InvalidInput(_))
        ));
    }
}
