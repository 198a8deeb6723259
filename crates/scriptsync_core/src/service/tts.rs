//! Google Cloud Text-to-Speech client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::{NarrationRenderer, ServiceError};

const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";

/// Voice selection for synthesized narration.
#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub language_code: String,
    pub name: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            language_code: "en-US".to_string(),
            name: "en-US-Studio-O".to_string(),
        }
    }
}

/// REST client for the `text:synthesize` endpoint. Audio comes back
/// base64-encoded in the JSON body and is written out as MP3.
pub struct TextToSpeechClient {
    http: reqwest::Client,
    api_key: String,
    voice: VoiceSettings,
    base_url: String,
}

impl TextToSpeechClient {
    pub fn new(api_key: impl Into<String>, voice: VoiceSettings) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            voice,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl NarrationRenderer for TextToSpeechClient {
    async fn render(&self, text: &str, output: &Path) -> Result<(), ServiceError> {
        let url = format!("{}/v1/text:synthesize?key={}", self.base_url, self.api_key);
        let body = json!({
            "input": { "text": text },
            "voice": {
                "languageCode": self.voice.language_code,
                "name": self.voice.name,
            },
            "audioConfig": { "audioEncoding": "MP3" },
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::http(status.as_u16(), body));
        }

        let parsed: SynthesizeResponse = response.json().await?;
        let encoded = parsed
            .audio_content
            .ok_or_else(|| ServiceError::missing_data("synthesize response has no audioContent"))?;
        let audio = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| ServiceError::missing_data(format!("invalid base64 audio: {e}")))?;

        tokio::fs::write(output, &audio).await?;
        tracing::debug!(path = %output.display(), bytes = audio.len(), "narration audio written");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    #[serde(default, rename = "audioContent")]
    audio_content: Option<String>,
}
