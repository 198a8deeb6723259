//! Scene and clip types.
//!
//! A `Scene` is one narrated segment produced by alignment. Scenes are
//! normalized (timestamps trimmed, duration backfilled) immediately after
//! parsing and are not mutated once clip assembly begins, except for the
//! final sequential renumbering.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::timecode;

/// One narrated segment with absolute timestamps into the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Sequential scene number; only strictly increasing after the final
    /// renumbering pass.
    #[serde(default)]
    pub scene_number: u32,

    /// Absolute start timestamp, `HH:MM:SS[.fff]`.
    #[serde(default)]
    pub start_time: String,

    /// Absolute end timestamp, `HH:MM:SS[.fff]`.
    #[serde(default)]
    pub end_time: String,

    /// Segment duration; derived from the timestamps when absent.
    #[serde(default)]
    pub duration_seconds: Option<f64>,

    /// Narration text, drawn from the source script.
    #[serde(default)]
    pub narration: String,

    /// Optional reviewer flag set by the alignment service
    /// (e.g. "review" for segments it was unsure about).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Set when downstream validation excludes this scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl Scene {
    /// Start timestamp in seconds, if parseable.
    pub fn start_seconds(&self) -> Option<f64> {
        timecode::parse_timestamp(&self.start_time)
    }

    /// End timestamp in seconds, if parseable.
    pub fn end_seconds(&self) -> Option<f64> {
        timecode::parse_timestamp(&self.end_time)
    }

    /// Whether both timestamps are present and parseable.
    pub fn has_timing(&self) -> bool {
        self.start_seconds().is_some() && self.end_seconds().is_some()
    }

    /// Whether the narration carries any text.
    pub fn has_narration(&self) -> bool {
        !self.narration.trim().is_empty()
    }

    /// Trim string fields and backfill `duration_seconds` from the
    /// timestamps. Called once right after parsing a service response.
    pub fn normalize(&mut self) {
        self.start_time = self.start_time.trim().to_string();
        self.end_time = self.end_time.trim().to_string();
        self.narration = self.narration.trim().to_string();

        if self.duration_seconds.is_none() {
            if let (Some(start), Some(end)) = (self.start_seconds(), self.end_seconds()) {
                self.duration_seconds = Some(round2(end - start));
            }
        }
    }

    /// Re-anchor chunk-relative timestamps to absolute video time by
    /// adding `offset_seconds`, reformatting as `HH:MM:SS.mmm` and
    /// recomputing the duration.
    pub fn offset_by(&mut self, offset_seconds: f64) {
        let start_rel = self.start_seconds();
        let end_rel = self.end_seconds();

        if let Some(start) = start_rel {
            self.start_time = timecode::format_timestamp(start + offset_seconds);
        }
        if let Some(end) = end_rel {
            self.end_time = timecode::format_timestamp(end + offset_seconds);
        }
        if let (Some(start), Some(end)) = (start_rel, end_rel) {
            self.duration_seconds = Some(round2(end - start));
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ordered scenes plus optional free-text notes from the alignment call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlignmentResult {
    #[serde(default)]
    pub scenes: Vec<Scene>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AlignmentResult {
    /// Renumber scenes sequentially starting at 1.
    pub fn renumber(&mut self) {
        for (idx, scene) in self.scenes.iter_mut().enumerate() {
            scene.scene_number = (idx + 1) as u32;
        }
    }
}

/// Rendered narration audio for one scene. The duration is only known
/// after the asset has been probed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioAsset {
    pub scene_number: u32,
    pub path: PathBuf,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

/// An encoded clip, with the scene's timestamps kept for traceability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedClip {
    pub scene_number: u32,
    pub path: PathBuf,
    pub start_time: String,
    pub end_time: String,
}

/// Scene number plus the reason it was excluded, for caller-visible
/// partial-success reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedScene {
    pub scene_number: u32,
    pub reason: String,
}

/// Split scenes into usable and skipped lists.
///
/// A scene is skipped when the service flagged it for review, or when
/// timestamps or narration are missing. The skip reason is a
/// comma-joined list of everything that was wrong.
pub fn partition_scenes(scenes: Vec<Scene>) -> (Vec<Scene>, Vec<Scene>) {
    let mut valid = Vec::new();
    let mut skipped = Vec::new();

    for mut scene in scenes {
        let flagged = scene
            .status
            .as_deref()
            .map(|s| s.trim().eq_ignore_ascii_case("review"))
            .unwrap_or(false);

        let mut reasons = Vec::new();
        if flagged {
            reasons.push("flagged for review");
        }
        if !scene.has_timing() {
            reasons.push("missing timestamps");
        }
        if !scene.has_narration() {
            reasons.push("missing narration");
        }

        if reasons.is_empty() {
            valid.push(scene);
        } else {
            scene.skip_reason = Some(reasons.join(", "));
            skipped.push(scene);
        }
    }

    (valid, skipped)
}
