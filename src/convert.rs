//! Conversion orchestration: one submitted file in, one markup document out.
//!
//! The remote service is intermittently over capacity and retires model
//! identifiers without notice, so a single request is driven through a
//! two-level loop: outer over the prioritized model roster, inner over
//! bounded attempts per model. The two levels isolate three very different
//! situations from each other:
//!
//! * "this specific model is gone" — fail fast, try the next model;
//! * "everything is just busy right now" — wait, retry the same model;
//! * "the request itself is invalid" — abort, nothing downstream can help.
//!
//! One conversion call suspends the caller until success or full exhaustion
//! of the model/attempt matrix; there is no cancellation mid-retry.

use crate::cleanup;
use crate::config::ConversionConfig;
use crate::credentials::{CredentialResolver, EnvCredentials};
use crate::error::{classify, ConvertError, ErrorClass};
use crate::prompts::DEFAULT_CONVERSION_PROMPT;
use crate::provider::{GeminiProvider, GenerationParams, GenerativeProvider};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// One user-submitted file, request-scoped and single-use.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Raw file bytes, shipped to the model inline.
    pub data: Vec<u8>,
    /// Declared media type, e.g. `application/pdf`.
    pub mime_type: String,
    /// Original file name; the output name derives from its stem.
    pub file_name: String,
}

impl ConversionRequest {
    pub fn new(
        data: Vec<u8>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// File name without its final extension.
    pub fn base_name(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }
}

/// The orchestrator's output: cleaned markup plus the output base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    /// Body-only HTML markup, unfenced and trimmed.
    pub markup: String,
    /// Base name for the exported file (no extension).
    pub base_name: String,
}

/// Convert a submitted file to Word-compatible HTML markup.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// * [`ConvertError::SizeExceeded`] — payload over the ceiling; checked
///   before any network call.
/// * [`ConvertError::MissingCredential`] — no key resolved; checked before
///   any network call.
/// * [`ConvertError::Fatal`] — the service rejected the request itself.
/// * [`ConvertError::ServersBusy`] / [`ConvertError::Exhausted`] — every
///   roster candidate failed; the variant reflects the terminal failure
///   class.
pub async fn convert(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConvertedDocument, ConvertError> {
    if request.size() > config.max_file_size {
        return Err(ConvertError::SizeExceeded {
            size: request.size(),
            limit: config.max_file_size,
        });
    }

    let provider = resolve_provider(config)?;
    let prompt = config.prompt.as_deref().unwrap_or(DEFAULT_CONVERSION_PROMPT);

    info!(
        "Starting conversion: {} ({} bytes, {} models)",
        request.file_name,
        request.size(),
        config.models.len()
    );
    if let Some(ref obs) = config.observer {
        obs.on_conversion_start(&request.file_name, request.size());
    }

    let mut last_failure: Option<(ErrorClass, String)> = None;

    'candidates: for model in &config.models {
        if let Some(ref obs) = config.observer {
            obs.on_model_start(&model.id);
        }

        // The provider forwards the budget only to reasoning-capable models.
        let params = GenerationParams {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            thinking_budget: config.thinking_budget,
        };

        for attempt in 1..=config.max_retries {
            debug!("Model {}: attempt {}/{}", model.id, attempt, config.max_retries);

            let err = match provider.generate(model, request, prompt, &params).await {
                Ok(raw) => {
                    let markup = cleanup::clean_markup(&raw);
                    info!(
                        "Model {} succeeded on attempt {} ({} chars)",
                        model.id,
                        attempt,
                        markup.len()
                    );
                    if let Some(ref obs) = config.observer {
                        obs.on_conversion_complete(&model.id, markup.len());
                    }
                    return Ok(ConvertedDocument {
                        markup,
                        base_name: request.base_name().to_string(),
                    });
                }
                Err(err) => err,
            };

            let class = classify(err.status, &err.message);
            warn!(
                "Model {}: attempt {}/{} failed ({:?}): {}",
                model.id, attempt, config.max_retries, class, err.message
            );
            last_failure = Some((class, err.message.clone()));

            match class {
                // The request itself is bad; no other model can save it.
                ErrorClass::FatalClient => {
                    return Err(ConvertError::Fatal {
                        message: err.message,
                    })
                }
                // Retired identifier or unclassifiable failure: one strike.
                ErrorClass::NotFound | ErrorClass::Unknown => {
                    if let Some(ref obs) = config.observer {
                        obs.on_model_exhausted(&model.id, &err.message);
                    }
                    continue 'candidates;
                }
                // Quota rejection: a long fixed wait lets the token bucket refill.
                ErrorClass::RateLimited if attempt < config.max_retries => {
                    let delay = Duration::from_millis(config.rate_limit_backoff_ms);
                    debug!("Model {}: quota hit, waiting {:?}", model.id, delay);
                    if let Some(ref obs) = config.observer {
                        obs.on_retry(&model.id, attempt, delay);
                    }
                    sleep(delay).await;
                }
                // Busy backend or network glitch: linear backoff.
                ErrorClass::ServerBusy | ErrorClass::NetworkTransient
                    if attempt < config.max_retries =>
                {
                    let delay =
                        Duration::from_millis(config.transient_backoff_ms * u64::from(attempt));
                    if let Some(ref obs) = config.observer {
                        obs.on_retry(&model.id, attempt, delay);
                    }
                    sleep(delay).await;
                }
                // Attempts exhausted on a retryable class.
                _ => {
                    if let Some(ref obs) = config.observer {
                        obs.on_model_exhausted(&model.id, &err.message);
                    }
                    continue 'candidates;
                }
            }
        }
    }

    // Every candidate exhausted: surface the terminal failure, with quota
    // exhaustion given its own friendlier message.
    match last_failure {
        Some((ErrorClass::RateLimited, _)) => Err(ConvertError::ServersBusy),
        Some((_, message)) => Err(ConvertError::Exhausted { message }),
        None => Err(ConvertError::InvalidConfig(
            "Model roster must contain at least one candidate".into(),
        )),
    }
}

/// Convert a PDF file on disk.
///
/// Validates the `%PDF` magic bytes before submitting, so a mislabelled
/// file gets a meaningful error instead of a model-side rejection.
pub async fn convert_file(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConvertedDocument, ConvertError> {
    let path = path.as_ref();

    let data = tokio::fs::read(path)
        .await
        .map_err(|_| ConvertError::FileNotFound {
            path: path.to_path_buf(),
        })?;

    if data.len() >= 4 && &data[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[..4]);
        return Err(ConvertError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document.pdf")
        .to_string();

    let request = ConversionRequest::new(data, "application/pdf", file_name);
    convert(&request, config).await
}

/// Resolve the provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and configured the provider entirely; used as-is. An injected provider
///    carries its own auth, so credential resolution is skipped. Useful in
///    tests and for custom middleware.
///
/// 2. **Credential resolution** — the configured resolver (or the env-var
///    default) is asked for a key: user override first, deployment default
///    second. Absence of both is fatal before any network attempt.
fn resolve_provider(
    config: &ConversionConfig,
) -> Result<Arc<dyn GenerativeProvider>, ConvertError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let env_default;
    let resolver: &dyn CredentialResolver = match config.credentials {
        Some(ref r) => r.as_ref(),
        None => {
            env_default = EnvCredentials::default();
            &env_default
        }
    };

    let key = resolver.resolve().ok_or(ConvertError::MissingCredential)?;
    let provider = GeminiProvider::new(key, config.api_timeout_secs)?;
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;

    #[test]
    fn base_name_strips_extension() {
        let request = ConversionRequest::new(vec![1, 2, 3], "application/pdf", "exam.final.pdf");
        assert_eq!(request.base_name(), "exam.final");
    }

    #[test]
    fn base_name_without_extension() {
        let request = ConversionRequest::new(vec![], "application/pdf", "exam");
        assert_eq!(request.base_name(), "exam");
    }

    #[tokio::test]
    async fn missing_credential_reported_before_network() {
        let config = ConversionConfig::builder()
            .credentials(Arc::new(StaticCredentials::default()))
            .build()
            .unwrap();
        let request = ConversionRequest::new(vec![0u8; 16], "application/pdf", "a.pdf");

        let err = convert(&request, &config).await.unwrap_err();
        assert!(matches!(err, ConvertError::MissingCredential));
    }

    #[tokio::test]
    async fn size_checked_before_credentials() {
        // Oversized payload fails on size even with no credential configured.
        let config = ConversionConfig::builder()
            .max_file_size(8)
            .credentials(Arc::new(StaticCredentials::default()))
            .build()
            .unwrap();
        let request = ConversionRequest::new(vec![0u8; 9], "application/pdf", "a.pdf");

        let err = convert(&request, &config).await.unwrap_err();
        assert!(matches!(err, ConvertError::SizeExceeded { size: 9, limit: 8 }));
    }
}
