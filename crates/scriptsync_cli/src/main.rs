//! Command-line entry point for scriptsync.
//!
//! Reads a narration script and a source video, aligns them through
//! the configured generative backend, renders narration audio, cuts
//! audio-synchronized clips, and assembles the final video. The
//! session outcome is printed as JSON on stdout; logs go to stderr and
//! to the per-session log file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use directories::ProjectDirs;

use scriptsync_core::config::ConfigManager;
use scriptsync_core::logging::{init_tracing, LogLevel};
use scriptsync_core::models::SessionSpec;
use scriptsync_core::orchestrator::{
    SessionOptions, SessionProcessor, SessionServices, SessionStatus,
};
use scriptsync_core::service::{
    GeminiClient, GenerationOptions, TextToSpeechClient, VoiceSettings,
};

#[derive(Parser, Debug)]
#[command(name = "scriptsync", version, about = "Align a narration script to footage and assemble a narrated video")]
struct Args {
    /// Source video file.
    video: PathBuf,

    /// Narration script (plain text).
    script: PathBuf,

    /// Config file path (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Session identifier; a timestamp is used when omitted.
    #[arg(long)]
    session_id: Option<String>,

    /// Extra instructions forwarded to the alignment service.
    #[arg(long)]
    instructions: Option<String>,

    /// Analyze the whole video in one request even if it is long.
    #[arg(long)]
    single_pass: bool,

    /// Override the sessions output directory.
    #[arg(long)]
    sessions_dir: Option<PathBuf>,

    /// Verbose diagnostics.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = ConfigManager::new(&config_path);
    config
        .load_or_create()
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    config.ensure_dirs_exist()?;
    let settings = config.settings().clone();

    let gemini_key = std::env::var("GEMINI_API_KEY")
        .context("GEMINI_API_KEY is not set; alignment needs an API key")?;
    let tts_key = std::env::var("TTS_API_KEY")
        .context("TTS_API_KEY is not set; narration synthesis needs an API key")?;

    let alignment = GeminiClient::new(gemini_key, &settings.gemini.model)?
        .with_options(GenerationOptions {
            temperature: settings.gemini.temperature,
            top_p: settings.gemini.top_p,
            top_k: settings.gemini.top_k,
        })
        .with_poll_interval(Duration::from_secs(settings.gemini.upload_poll_seconds));
    let narration = TextToSpeechClient::new(
        tts_key,
        VoiceSettings {
            language_code: settings.tts.language_code.clone(),
            name: settings.tts.voice.clone(),
        },
    )?;

    let services = SessionServices {
        alignment: std::sync::Arc::new(alignment),
        narration: std::sync::Arc::new(narration),
    };

    let script = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading script {}", args.script.display()))?;
    let mut spec = SessionSpec::new(&args.video, script);
    if let Some(instructions) = args.instructions {
        spec = spec.with_instructions(instructions);
    }

    let sessions_dir = args
        .sessions_dir
        .unwrap_or_else(|| config.sessions_folder());
    let processor = SessionProcessor::new(
        settings,
        config.logs_folder(),
        sessions_dir,
        services,
    );

    let outcome = processor
        .process_session(
            spec,
            SessionOptions {
                session_id: args.session_id,
                force_single_pass: args.single_pass,
                ..SessionOptions::default()
            },
        )
        .await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    match outcome.status {
        SessionStatus::Failed => bail!(
            "session failed: {}",
            outcome.error.unwrap_or_else(|| "unknown error".to_string())
        ),
        SessionStatus::Partial => {
            tracing::warn!(
                skipped = outcome.skipped.len(),
                "session finished partially"
            );
            Ok(())
        }
        SessionStatus::Success => Ok(()),
    }
}

fn default_config_path() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "scriptsync")
        .context("could not determine a config directory")?;
    Ok(dirs.config_dir().join("settings.toml"))
}
