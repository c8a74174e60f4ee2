//! Gemini `generateContent` implementation of [`GenerativeProvider`].
//!
//! The payload travels inline as base64 in the JSON body, which is why the
//! orchestrator enforces a payload ceiling before ever reaching this module:
//! a 10 MB PDF becomes a ~13.3 MB request body, and the API rejects bodies
//! much beyond that with an opaque transport error instead of a clean 4xx.

use crate::config::ModelCandidate;
use crate::convert::ConversionRequest;
use crate::error::ConvertError;
use crate::provider::{GenerationParams, GenerativeProvider, ModelError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP client for the Gemini generateContent endpoint.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    /// Build a provider with the given key and per-call timeout.
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, ConvertError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ConvertError::Internal(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the endpoint base URL (proxies, self-hosted gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    async fn generate(
        &self,
        model: &ModelCandidate,
        request: &ConversionRequest,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ModelError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model.id
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: &request.mime_type,
                            data: STANDARD.encode(&request.data),
                        },
                    },
                    Part::Text { text: prompt },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
                thinking_config: params
                    .thinking_budget
                    .filter(|_| model.reasoning)
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            },
        };

        debug!("POST {} ({} payload bytes)", url, request.data.len());

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => envelope.error.message,
                Err(_) if !text.is_empty() => text,
                Err(_) => status.to_string(),
            };
            return Err(ModelError::new(Some(status.as_u16()), message));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ModelError::new(None, format!("Malformed response body: {e}")))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .flat_map(|c| c.content.map(|ct| ct.parts).unwrap_or_default())
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            return Err(ModelError::new(None, "empty response from model"));
        }

        Ok(text)
    }
}

/// Normalize a reqwest transport failure into message text the central
/// classifier recognizes as retryable.
fn transport_error(e: reqwest::Error) -> ModelError {
    let message = if e.is_timeout() {
        format!("network timeout: {e}")
    } else if e.is_connect() {
        format!("network connection error: {e}")
    } else {
        format!("network error: {e}")
    };
    ModelError::new(None, message)
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_serializes_camel_case() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: "application/pdf",
                            data: "QUJD".into(),
                        },
                    },
                    Part::Text { text: "convert" },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 65_536,
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: 8192,
                }),
            },
        };

        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"generationConfig\""), "got: {json}");
        assert!(json.contains("\"inlineData\""), "got: {json}");
        assert!(json.contains("\"maxOutputTokens\":65536"), "got: {json}");
        assert!(json.contains("\"mimeType\":\"application/pdf\""), "got: {json}");
        assert!(json.contains("\"thinkingBudget\":8192"), "got: {json}");
    }

    #[test]
    fn thinking_config_omitted_when_absent() {
        let config = GenerationConfig {
            temperature: 0.1,
            max_output_tokens: 1024,
            thinking_config: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("thinkingConfig"), "got: {json}");
    }

    #[test]
    fn error_envelope_parses() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.message, "Quota exceeded");
    }

    #[test]
    fn response_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"<p>a</p>"},{"text":"<p>b</p>"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed
            .candidates
            .into_iter()
            .flat_map(|c| c.content.map(|ct| ct.parts).unwrap_or_default())
            .filter_map(|p| p.text)
            .collect();
        assert_eq!(text, "<p>a</p><p>b</p>");
    }
}
