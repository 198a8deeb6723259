//! scriptsync core - backend logic for script-to-footage alignment.
//!
//! This crate contains all business logic with zero UI dependencies:
//! timestamp handling, fuzzy script splitting, the chunked alignment
//! controller, ffmpeg-based clip synchronization, and the session
//! pipeline that ties them together. It can be driven by the CLI
//! binary or embedded in a larger application.

pub mod alignment;
pub mod config;
pub mod logging;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod script;
pub mod service;
pub mod timecode;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
