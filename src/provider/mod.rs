//! The provider seam: how the orchestrator talks to a remote model.
//!
//! The remote service is treated as an untrusted, fallible black box with a
//! binary-in/text-out contract. [`GenerativeProvider`] is the only surface
//! the orchestration loop sees; the concrete [`gemini::GeminiProvider`]
//! implements it over HTTP, and tests substitute scripted fakes.
//!
//! A provider failure is a [`ModelError`]: the raw status (if the transport
//! produced one) plus the raw message. Classification into retry/fallback
//! categories happens centrally in [`crate::error::classify`], never here.

pub mod gemini;

use crate::config::ModelCandidate;
use crate::convert::ConversionRequest;
use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiProvider;

/// Fixed generation parameters for a conversion call.
///
/// Low temperature for determinism; `thinking_budget` is only populated for
/// roster candidates that support extended reasoning.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub thinking_budget: Option<u32>,
}

/// A raw failure signal from one model attempt.
///
/// Carries whatever the transport produced — a structured HTTP status, a
/// free-text message, or both — without interpretation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ModelError {
    /// HTTP status, when the failure came from an HTTP response.
    pub status: Option<u16>,
    /// Raw error message from the transport or the service body.
    pub message: String,
}

impl ModelError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// One remote generation endpoint, callable per model candidate.
///
/// Implementations must be `Send + Sync`; the orchestrator holds them behind
/// an `Arc` and awaits one call at a time.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Submit the binary payload plus instruction prompt to `model` and
    /// return the raw markup text.
    ///
    /// An empty result must be reported as an `Err` (the orchestrator treats
    /// it as retryable), never as `Ok("")`.
    async fn generate(
        &self,
        model: &ModelCandidate,
        request: &ConversionRequest,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ModelError>;
}
