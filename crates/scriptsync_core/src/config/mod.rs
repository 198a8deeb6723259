//! Configuration management.

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EncodeSettings, GeminiSettings, LoggingSettings, PathSettings, Settings,
    TtsSettings,
};
