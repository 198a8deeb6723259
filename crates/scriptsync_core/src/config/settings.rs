//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level
//! updates. API keys are deliberately absent; they come from the
//! environment, never from the config file.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Alignment service settings.
    #[serde(default)]
    pub gemini: GeminiSettings,

    /// Narration synthesis settings.
    #[serde(default)]
    pub tts: TtsSettings,

    /// Clip encoding settings.
    #[serde(default)]
    pub encode: EncodeSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for session output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root folder for per-session working directories.
    #[serde(default = "default_sessions_folder")]
    pub sessions_folder: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_sessions_folder() -> String {
    "sessions".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            sessions_folder: default_sessions_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Alignment service tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSettings {
    /// Model used for alignment requests.
    #[serde(default = "default_model")]
    pub model: String,

    /// Minimum seconds between outbound service calls.
    #[serde(default = "default_api_delay")]
    pub api_delay_seconds: u64,

    /// Attempts per service call before giving up on transient errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff in seconds; attempt n waits n times this.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_seconds: u64,

    /// Analysis window length for chunked alignment.
    #[serde(default = "default_chunk_window")]
    pub chunk_window_seconds: u32,

    /// Attempts per chunk before degraded accept or drop.
    #[serde(default = "default_max_chunk_retries")]
    pub max_chunk_retries: u32,

    /// Seconds between polls while an upload is processing.
    #[serde(default = "default_upload_poll")]
    pub upload_poll_seconds: u64,

    /// Sampling temperature; alignment wants deterministic output.
    #[serde(default)]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_delay() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    5
}

fn default_chunk_window() -> u32 {
    600
}

fn default_max_chunk_retries() -> u32 {
    3
}

fn default_upload_poll() -> u64 {
    2
}

fn default_top_p() -> f64 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_delay_seconds: default_api_delay(),
            max_retries: default_max_retries(),
            retry_backoff_seconds: default_retry_backoff(),
            chunk_window_seconds: default_chunk_window(),
            max_chunk_retries: default_max_chunk_retries(),
            upload_poll_seconds: default_upload_poll(),
            temperature: 0.0,
            top_p: default_top_p(),
            top_k: default_top_k(),
        }
    }
}

/// Narration voice selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsSettings {
    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_language_code")]
    pub language_code: String,
}

fn default_voice() -> String {
    "en-US-Studio-O".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            language_code: default_language_code(),
        }
    }
}

/// ffmpeg invocation and encode profile settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeSettings {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,

    /// x264 preset for clip encodes.
    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_crf")]
    pub crf: u32,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Silence inserted before narration starts, in milliseconds.
    #[serde(default = "default_start_delay")]
    pub start_delay_ms: u64,

    /// Deadline for a single clip encode.
    #[serde(default = "default_clip_timeout")]
    pub clip_timeout_seconds: u64,

    /// Deadline for final concatenation.
    #[serde(default = "default_concat_timeout")]
    pub concat_timeout_seconds: u64,

    /// Deadline for an ffprobe call.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_crf() -> u32 {
    23
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_start_delay() -> u64 {
    250
}

fn default_clip_timeout() -> u64 {
    300
}

fn default_concat_timeout() -> u64 {
    600
}

fn default_probe_timeout() -> u64 {
    10
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            preset: default_preset(),
            crf: default_crf(),
            audio_bitrate: default_audio_bitrate(),
            start_delay_ms: default_start_delay(),
            clip_timeout_seconds: default_clip_timeout(),
            concat_timeout_seconds: default_concat_timeout(),
            probe_timeout_seconds: default_probe_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of error lines kept in the tail buffer.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
        }
    }
}

/// Identifies a config section for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Gemini,
    Tts,
    Encode,
    Logging,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Paths => "paths",
            Self::Gemini => "gemini",
            Self::Tts => "tts",
            Self::Encode => "encode",
            Self::Logging => "logging",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gemini.model, settings.gemini.model);
        assert_eq!(parsed.encode.crf, 23);
    }

    #[test]
    fn missing_sections_get_defaults() {
        let parsed: Settings = toml::from_str("[gemini]\nmodel = \"gemini-2.5-pro\"\n").unwrap();
        assert_eq!(parsed.gemini.model, "gemini-2.5-pro");
        assert_eq!(parsed.gemini.api_delay_seconds, 60);
        assert_eq!(parsed.tts.voice, "en-US-Studio-O");
        assert_eq!(parsed.encode.clip_timeout_seconds, 300);
    }

    #[test]
    fn section_table_names() {
        assert_eq!(ConfigSection::Gemini.table_name(), "gemini");
        assert_eq!(ConfigSection::Encode.table_name(), "encode");
    }
}
