//! Remote vision-language inference client
//!
//! Encodes a frame region as JPEG, embeds it inline in a single
//! chat-completions request with a fixed instruction prompt, and returns the
//! trimmed response text verbatim. The caller enforces at-most-one request
//! in flight; nothing here queues or retries.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::Deserialize;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::capture::CapturedFrame;
use crate::vision::VisionError;

/// Fixed instruction prompt sent with every request
const PROMPT: &str = "This image shows a thermometer in Celsius. Please read the temperature \
     displayed. Respond with ONLY the numeric value (e.g., '37.0'). If you cannot read the \
     temperature clearly, respond with 'Unable to read'.";

/// JPEG quality for the inline attachment
const JPEG_QUALITY: u8 = 90;

/// Per-request timeout. Expiry is reported as a service error so the next
/// scheduled attempt is not blocked indefinitely.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// Backend seam for the remote call, so the scheduler can be driven by a
/// stub in tests.
pub trait VisionBackend: Send + Sync + 'static {
    /// Whether a credential is available; when false the caller degrades to
    /// a sentinel display without dispatching.
    fn is_configured(&self) -> bool;

    /// Submit one encoded image and return the raw response text
    fn read_value(&self, jpeg: &[u8]) -> Result<String, VisionError>;
}

/// Client for an OpenAI-style chat-completions endpoint
pub struct OpenAiVision {
    http: reqwest::Client,
    runtime: Runtime,
    api_key: Option<String>,
    api_base: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiVision {
    /// Create a client, reading the bearer credential from `OPENAI_API_KEY`.
    /// A missing credential is not an error here; it degrades every reading
    /// to the sentinel state instead.
    pub fn new(api_base: &str, model: &str) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set; readings will be unavailable");
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let runtime = Runtime::new()?;

        Ok(Self {
            http,
            runtime,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    async fn request(&self, key: &str, jpeg: &[u8]) -> Result<String, VisionError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": PROMPT },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg)),
                        },
                    },
                ],
            }],
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(VisionError::Service(format!("HTTP {}: {}", status, detail)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Service(format!("malformed response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| VisionError::Service("response carried no choices".to_string()))?;

        Ok(content.trim().to_string())
    }
}

impl VisionBackend for OpenAiVision {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn read_value(&self, jpeg: &[u8]) -> Result<String, VisionError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(VisionError::MissingCredential)?;

        debug!("Submitting {} byte image for reading", jpeg.len());
        self.runtime.block_on(self.request(key, jpeg))
    }
}

fn map_send_error(e: reqwest::Error) -> VisionError {
    if e.is_timeout() {
        VisionError::Service("request timed out".to_string())
    } else {
        VisionError::Network(e.to_string())
    }
}

/// Encode an RGB frame as JPEG for the inline attachment
pub fn encode_jpeg(frame: &CapturedFrame) -> anyhow::Result<Vec<u8>> {
    if frame.width == 0 || frame.height == 0 {
        anyhow::bail!("cannot encode an empty region");
    }

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), JPEG_QUALITY);
    encoder.write_image(
        &frame.data,
        frame.width,
        frame.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}
