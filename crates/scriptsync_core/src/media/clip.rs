//! Audio-synchronized clip extraction.
//!
//! The narration audio is authoritative for clip length. The scene's
//! timestamps pick where in the source the clip starts; how long it
//! runs is dictated by the rendered audio, never by the scene's own
//! duration. A mismatch between the two is reported but does not block
//! the clip.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

use super::error::MediaError;
use super::probe::media_duration;
use super::runner::run_tool;
use crate::config::EncodeSettings;
use crate::models::{ProcessedClip, Scene};

/// Divergence between audio and scene duration worth flagging.
const DURATION_MISMATCH_WARN: f64 = 0.5;

/// Output tolerance under which sync is considered exact.
const SYNC_TOLERANCE: f64 = 0.1;

/// Builds clips whose video track is cut to fit the narration audio.
pub struct ClipSynchronizer {
    settings: EncodeSettings,
}

impl ClipSynchronizer {
    pub fn new(settings: EncodeSettings) -> Self {
        Self { settings }
    }

    /// Extract one clip from `source` for `scene`, muxing in `audio`
    /// and writing to `output`.
    pub async fn extract_clip(
        &self,
        source: &Path,
        scene: &Scene,
        audio: &Path,
        output: &Path,
    ) -> Result<ProcessedClip, MediaError> {
        if !source.exists() {
            return Err(MediaError::SourceNotFound(source.to_path_buf()));
        }
        if !audio.exists() {
            return Err(MediaError::SourceNotFound(audio.to_path_buf()));
        }

        let start = scene.start_seconds().ok_or_else(|| {
            MediaError::parse(format!(
                "scene {} has unparseable start time '{}'",
                scene.scene_number, scene.start_time
            ))
        })?;

        let probe_timeout = Duration::from_secs(self.settings.probe_timeout_seconds);
        let audio_duration =
            match media_duration(&self.settings.ffprobe_path, audio, probe_timeout).await {
                Ok(duration) => duration,
                Err(MediaError::DurationUnavailable { reason, .. }) => {
                    let fallback = scene
                        .duration_seconds
                        .or_else(|| {
                            scene
                                .end_seconds()
                                .map(|end| end - start)
                        })
                        .ok_or_else(|| {
                            MediaError::duration_unavailable(
                                audio,
                                "audio unprobeable and scene has no duration",
                            )
                        })?;
                    tracing::warn!(
                        scene = scene.scene_number,
                        reason,
                        fallback,
                        "audio duration unavailable, falling back to scene timing"
                    );
                    fallback
                }
                Err(err) => return Err(err),
            };

        if let Some(scene_duration) = scene.duration_seconds {
            let divergence = (audio_duration - scene_duration).abs();
            if divergence > DURATION_MISMATCH_WARN {
                tracing::warn!(
                    scene = scene.scene_number,
                    audio_duration,
                    scene_duration,
                    "narration audio diverges from scene duration, audio wins"
                );
            }
        }

        let mut cmd = Command::new(&self.settings.ffmpeg_path);
        cmd.args(self.build_clip_args(source, audio, start, audio_duration, output));

        let timeout = Duration::from_secs(self.settings.clip_timeout_seconds);
        match run_tool(cmd, "ffmpeg", timeout).await {
            Ok(_) => {}
            Err(err @ MediaError::Timeout { .. }) => {
                // A partial file would poison concatenation.
                let _ = std::fs::remove_file(output);
                return Err(err);
            }
            Err(err) => return Err(err),
        }

        match media_duration(&self.settings.ffprobe_path, output, probe_timeout).await {
            Ok(out_duration) => {
                let drift = (out_duration - audio_duration).abs();
                if drift < SYNC_TOLERANCE {
                    tracing::info!(scene = scene.scene_number, "clip in perfect sync");
                } else {
                    tracing::warn!(
                        scene = scene.scene_number,
                        out_duration,
                        audio_duration,
                        "clip duration drifted from narration"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(scene = scene.scene_number, error = %err, "could not verify clip");
            }
        }

        Ok(ProcessedClip {
            scene_number: scene.scene_number,
            path: output.to_path_buf(),
            start_time: scene.start_time.clone(),
            end_time: scene.end_time.clone(),
        })
    }

    fn build_clip_args(
        &self,
        source: &Path,
        audio: &Path,
        start: f64,
        audio_duration: f64,
        output: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-ss".into(),
            format!("{start:.3}").into(),
            "-i".into(),
            source.into(),
            "-i".into(),
            audio.into(),
            "-t".into(),
            format!("{audio_duration:.3}").into(),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
        ];

        // The delay shifts narration inside the clip; the clip itself
        // still runs exactly as long as the audio.
        if self.settings.start_delay_ms > 0 {
            args.push("-filter:a".into());
            args.push(format!("adelay={0}:all=1", self.settings.start_delay_ms).into());
        }

        args.extend::<Vec<OsString>>(vec![
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            self.settings.preset.clone().into(),
            "-crf".into(),
            self.settings.crf.to_string().into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            self.settings.audio_bitrate.clone().into(),
            output.into(),
        ]);
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(args: &[OsString]) -> String {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn clip_length_comes_from_audio_not_scene() {
        let sync = ClipSynchronizer::new(EncodeSettings {
            start_delay_ms: 0,
            ..EncodeSettings::default()
        });
        let args = sync.build_clip_args(
            Path::new("src.mp4"),
            Path::new("narr.mp3"),
            65.0,
            12.34,
            Path::new("out.mp4"),
        );
        let joined = render(&args);
        assert!(joined.contains("-ss 65.000"));
        assert!(joined.contains("-t 12.340"));
        // Audio authority means no -shortest and no scene end time.
        assert!(!joined.contains("-shortest"));
        assert!(!joined.contains("adelay"));
    }

    #[test]
    fn start_delay_adds_adelay_filter() {
        let sync = ClipSynchronizer::new(EncodeSettings {
            start_delay_ms: 250,
            ..EncodeSettings::default()
        });
        let args = sync.build_clip_args(
            Path::new("src.mp4"),
            Path::new("narr.mp3"),
            0.0,
            10.0,
            Path::new("out.mp4"),
        );
        let joined = render(&args);
        assert!(joined.contains("adelay=250:all=1"));
    }

    #[test]
    fn start_delay_leaves_duration_at_audio_length() {
        // Default settings carry a 250ms perception delay; it must not
        // stretch the -t cut past the narration audio.
        let sync = ClipSynchronizer::new(EncodeSettings::default());
        let args = sync.build_clip_args(
            Path::new("src.mp4"),
            Path::new("narr.mp3"),
            0.0,
            10.0,
            Path::new("out.mp4"),
        );
        let joined = render(&args);
        assert!(joined.contains("-t 10.000"), "got: {joined}");
        assert!(joined.contains("adelay=250:all=1"));
    }

    #[test]
    fn encode_settings_flow_into_args() {
        let sync = ClipSynchronizer::new(EncodeSettings {
            preset: "fast".to_string(),
            crf: 20,
            audio_bitrate: "128k".to_string(),
            ..EncodeSettings::default()
        });
        let args = sync.build_clip_args(
            Path::new("src.mp4"),
            Path::new("narr.mp3"),
            0.0,
            10.0,
            Path::new("out.mp4"),
        );
        let joined = render(&args);
        assert!(joined.contains("-preset fast"));
        assert!(joined.contains("-crf 20"));
        assert!(joined.contains("-b:a 128k"));
        assert!(joined.ends_with("out.mp4"));
    }
}
