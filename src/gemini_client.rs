use crate::upload::UploadedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API returned error: {message}")]
    ApiError { message: String },

    #[error("response contained no image")]
    NoImage,

    #[error("image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("no API key configured")]
    MissingApiKey,
}

// Wire types for `models/{model}:generateContent`.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Inline {
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: [&'static str; 1],
    image_config: ImageConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig<'a> {
    aspect_ratio: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ApiError> {
        if api_key.trim().is_empty() {
            return Err(ApiError::MissingApiKey);
        }
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    /// Requests a single image and returns its decoded bytes.
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        references: &[UploadedImage],
    ) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = build_request(prompt, aspect_ratio, references);

        log::debug!(
            "POST {} ({} reference image(s), aspect {})",
            url,
            references.len(),
            aspect_ratio
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            log::warn!("Generation request failed with HTTP {}: {}", status, message);
            return Err(ApiError::ApiError {
                message: format!("HTTP {}: {}", status, message),
            });
        }

        parse_image_response(&text)
    }
}

fn build_request<'a>(
    prompt: &'a str,
    aspect_ratio: &'a str,
    references: &[UploadedImage],
) -> GenerateRequest<'a> {
    let mut parts = vec![RequestPart::Text { text: prompt }];
    parts.extend(references.iter().map(|reference| RequestPart::Inline {
        inline_data: InlineData {
            mime_type: reference.mime_type.clone(),
            data: reference.base64(),
        },
    }));

    GenerateRequest {
        contents: vec![Content { parts }],
        generation_config: GenerationConfig {
            response_modalities: ["IMAGE"],
            image_config: ImageConfig { aspect_ratio },
        },
    }
}

/// Pulls the first inline image out of the first candidate.
fn parse_image_response(text: &str) -> Result<Vec<u8>, ApiError> {
    let response: GenerateResponse = serde_json::from_str(text)?;
    let inline = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.inline_data))
        .ok_or(ApiError::NoImage)?;
    Ok(STANDARD.decode(inline.data)?)
}
