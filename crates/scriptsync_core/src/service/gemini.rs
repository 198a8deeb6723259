//! Gemini REST client for video upload and alignment requests.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio_util::codec::{BytesCodec, FramedRead};

use super::{AlignmentService, ServiceError, VideoHandle};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// How often to poll an uploaded file while the service ingests it.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Generation parameters sent with every alignment request.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        // Deterministic output; alignment is extraction, not creation.
        Self {
            temperature: 0.0,
            top_p: 0.9,
            top_k: 40,
        }
    }
}

/// Client for the Gemini generative language API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    options: GenerationOptions,
    poll_interval: Duration,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ServiceError> {
        // Long-running generation over a full video chunk; the request
        // timeout has to cover server-side analysis, not just transfer.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            options: GenerationOptions::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_file_state(&self, name: &str) -> Result<FileResource, ServiceError> {
        let url = format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key);
        let response = self.http.get(&url).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl AlignmentService for GeminiClient {
    async fn upload_video(&self, path: &Path) -> Result<VideoHandle, ServiceError> {
        let mime_type = guess_mime_type(path);
        // Chunk files run to hundreds of megabytes; the body streams
        // straight from disk.
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        tracing::info!(
            path = %path.display(),
            bytes = size,
            "uploading video for analysis"
        );

        let url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);
        let response = self
            .http
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", mime_type)
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(reqwest::Body::wrap_stream(FramedRead::new(
                file,
                BytesCodec::new(),
            )))
            .send()
            .await?;
        let uploaded: UploadResponse = read_json(response).await?;
        let mut file = uploaded.file;

        // The service ingests asynchronously; the file is unusable
        // until its state leaves PROCESSING.
        while file.state.as_deref() == Some("PROCESSING") {
            tracing::debug!(name = %file.name, "waiting for upload processing");
            tokio::time::sleep(self.poll_interval).await;
            file = self.fetch_file_state(&file.name).await?;
        }

        if file.state.as_deref() == Some("FAILED") {
            return Err(ServiceError::missing_data(format!(
                "upload processing failed for '{}'",
                file.name
            )));
        }

        let uri = file
            .uri
            .ok_or_else(|| ServiceError::missing_data("uploaded file has no uri"))?;
        tracing::info!(name = %file.name, "video upload ready");

        Ok(VideoHandle {
            name: file.name,
            uri,
            mime_type: file.mime_type.unwrap_or_else(|| mime_type.to_string()),
        })
    }

    async fn request_alignment(
        &self,
        video: &VideoHandle,
        prompt: &str,
    ) -> Result<String, ServiceError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "contents": [{
                "parts": [
                    {
                        "file_data": {
                            "file_uri": video.uri,
                            "mime_type": video.mime_type,
                        }
                    },
                    { "text": prompt },
                ]
            }],
            "generationConfig": {
                "temperature": self.options.temperature,
                "topP": self.options.top_p,
                "topK": self.options.top_k,
            }
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let parsed: GenerateResponse = read_json(response).await?;

        let text: String = parsed
            .candidates
            .iter()
            .flat_map(|c| c.content.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(ServiceError::missing_data(
                "generation response contained no text",
            ));
        }
        Ok(text)
    }
}

/// Deserialize a JSON body, mapping non-success statuses to
/// `ServiceError::Http` with the body preserved for diagnostics.
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::http(status.as_u16(), body));
    }
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| ServiceError::missing_data(format!("unexpected response shape: {e}")))
}

fn guess_mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        _ => "video/mp4",
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default, rename = "mimeType")]
    mime_type: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_guessing() {
        assert_eq!(guess_mime_type(Path::new("a.mkv")), "video/x-matroska");
        assert_eq!(guess_mime_type(Path::new("a.MOV")), "video/quicktime");
        assert_eq!(guess_mime_type(Path::new("a.mp4")), "video/mp4");
        assert_eq!(guess_mime_type(Path::new("noext")), "video/mp4");
    }

    #[test]
    fn generate_response_parses_and_joins_text() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "{\"scenes\": "}, {"text": "[]}"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed
            .candidates
            .iter()
            .flat_map(|c| c.content.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();
        assert_eq!(text, r#"{"scenes": []}"#);
    }

    #[test]
    fn file_resource_tolerates_missing_fields() {
        let file: FileResource =
            serde_json::from_str(r#"{"name": "files/abc", "state": "PROCESSING"}"#).unwrap();
        assert_eq!(file.name, "files/abc");
        assert!(file.uri.is_none());
    }

    #[tokio::test]
    async fn upload_of_missing_file_fails_before_any_request() {
        let client = GeminiClient::new("k", "gemini-2.0-flash")
            .unwrap()
            .with_base_url("http://127.0.0.1:1");

        let err = client
            .upload_video(Path::new("/nonexistent/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)), "got {err}");
    }

    #[tokio::test]
    async fn upload_against_dead_endpoint_is_transport_error() {
        let client = GeminiClient::new("k", "gemini-2.0-flash")
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"not really video").unwrap();

        let err = client.upload_video(&video).await.unwrap_err();
        assert!(err.is_transient(), "expected transport error, got {err}");
    }
}
