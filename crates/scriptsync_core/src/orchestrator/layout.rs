//! On-disk layout of a session working directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Paths used by one session, all rooted under a per-session directory:
///
/// ```text
/// <sessions_root>/<session_id>/
///   chunks/            analysis windows for long videos
///   audio/             rendered narration, scene_NNN.mp3
///   clips/             encoded clips, clip_NNN.mp4
///   output/            final video and scenes.json
/// ```
#[derive(Debug, Clone)]
pub struct SessionLayout {
    session_id: String,
    root: PathBuf,
}

impl SessionLayout {
    /// Build a layout under `sessions_root`. The requested id is
    /// sanitized; a blank id falls back to a timestamp.
    pub fn new(sessions_root: impl AsRef<Path>, requested_id: &str) -> Self {
        let session_id = sanitize_session_id(requested_id);
        let root = sessions_root.as_ref().join(&session_id);
        Self { session_id, root }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.root.join("chunks")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("audio")
    }

    pub fn clips_dir(&self) -> PathBuf {
        self.root.join("clips")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    /// Copy of the input script, kept for reproducing the run.
    pub fn script_path(&self) -> PathBuf {
        self.root.join("script.txt")
    }

    /// Alignment result persisted as JSON.
    pub fn scenes_path(&self) -> PathBuf {
        self.output_dir().join("scenes.json")
    }

    pub fn audio_path(&self, scene_number: u32) -> PathBuf {
        self.audio_dir().join(format!("scene_{scene_number:03}.mp3"))
    }

    pub fn clip_path(&self, scene_number: u32) -> PathBuf {
        self.clips_dir().join(format!("clip_{scene_number:03}.mp4"))
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.root.join("concat_list.txt")
    }

    pub fn final_video_path(&self) -> PathBuf {
        self.output_dir().join("final_video.mp4")
    }

    /// Create every directory the session will write into.
    pub fn create_all(&self) -> io::Result<()> {
        for dir in [
            self.root.clone(),
            self.chunks_dir(),
            self.audio_dir(),
            self.clips_dir(),
            self.output_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Restrict a session id to filesystem-safe characters, capped at 40.
/// Blank input gets a timestamp id instead.
fn sanitize_session_id(requested: &str) -> String {
    let cleaned: String = requested
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(40)
        .collect();

    if cleaned.is_empty() {
        chrono::Local::now().format("session_%Y%m%d_%H%M%S").to_string()
    } else {
        cleaned
    }
}
