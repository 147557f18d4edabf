use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::encoding::domain::encoded_frame::EncodedFrame;
use crate::remote::domain::summary_request::SummaryRequest;
use crate::remote::domain::vision_model::VisionModel;
use crate::shared::constants::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::shared::error::RemoteError;

/// Connection settings for an OpenAI-compatible chat completions endpoint.
///
/// The credential is passed in explicitly; nothing here reads the
/// environment.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Blocking client for the chat completions API with image inputs.
///
/// Frames are sent as base64 `data:` URLs after the instruction text, in
/// the order they appear in the request.
pub struct OpenAiVisionClient {
    config: ClientConfig,
    http: reqwest::blocking::Client,
}

impl OpenAiVisionClient {
    pub fn new(config: ClientConfig) -> Result<Self, RemoteError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(RemoteError::Network)?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl VisionModel for OpenAiVisionClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn complete(&self, request: &SummaryRequest) -> Result<String, RemoteError> {
        let body = build_body(&self.config.model, request);
        log::debug!(
            "POST {} ({} images, {} payload bytes)",
            self.endpoint(),
            request.frames.len(),
            request.payload_bytes()
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .map_err(RemoteError::Network)?;

        let status = response.status().as_u16();
        let text = response.text().map_err(RemoteError::Network)?;
        if !(200..300).contains(&status) {
            return Err(classify_failure(status, &text));
        }
        parse_completion(&text)
    }
}

fn build_body<'a>(model: &'a str, request: &'a SummaryRequest) -> ChatRequest<'a> {
    let mut content = Vec::with_capacity(request.frames.len() + 1);
    content.push(ContentPart::Text {
        text: &request.instruction,
    });
    content.extend(request.frames.iter().map(|frame| ContentPart::ImageUrl {
        image_url: ImageUrl {
            url: data_url(frame),
        },
    }));

    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content,
        }],
        max_tokens: request.max_tokens,
    }
}

fn data_url(frame: &EncodedFrame) -> String {
    format!(
        "data:{};base64,{}",
        frame.mime_type,
        STANDARD.encode(&frame.payload)
    )
}

/// Maps a non-success status to the error the caller sees.
fn classify_failure(status: u16, body: &str) -> RemoteError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    match status {
        401 | 403 => RemoteError::Authentication(message),
        402 | 429 => RemoteError::Quota(message),
        _ => RemoteError::Api { status, message },
    }
}

fn parse_completion(body: &str) -> Result<String, RemoteError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| RemoteError::MalformedResponse("response has no message content".into()))
}
