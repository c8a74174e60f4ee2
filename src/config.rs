//! Configuration types for PDF-to-Word conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across tasks and to diff two runs to understand
//! why their outcomes differ.
//!
//! The model roster is data, not code: operators change tiers or swap model
//! identifiers by supplying a different `Vec<ModelCandidate>`, never by
//! touching the orchestration loop.

use crate::credentials::CredentialResolver;
use crate::error::ConvertError;
use crate::progress::ConversionObserver;
use crate::provider::GenerativeProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One identifiable remote generation endpoint/version.
///
/// Candidates are tried strictly in roster order; the first success wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    /// Remote model identifier, e.g. `"gemini-3-pro-preview"`.
    pub id: String,
    /// Whether this model accepts an extended-reasoning (thinking) budget.
    /// The budget is only forwarded to candidates that support it.
    pub reasoning: bool,
}

impl ModelCandidate {
    /// A candidate with no extended-reasoning support.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reasoning: false,
        }
    }

    /// A candidate that accepts an extended-reasoning budget.
    pub fn with_reasoning(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reasoning: true,
        }
    }
}

/// The default model roster, highest priority first.
///
/// The fast experimental model goes first because it is cheapest and usually
/// available; the pro preview follows as the quality fallback; the flash
/// preview is the last resort when both of the above are retired or saturated.
pub fn default_roster() -> Vec<ModelCandidate> {
    vec![
        ModelCandidate::new("gemini-2.0-flash-exp"),
        ModelCandidate::with_reasoning("gemini-3-pro-preview"),
        ModelCandidate::new("gemini-3-flash-preview"),
    ]
}

/// Deployment tier: controls the payload ceiling and how patiently the
/// orchestrator waits out quota rejections.
///
/// The shared tier runs on a deployment-bundled key where one user's big
/// upload competes with everyone else's, so the ceiling is low and the
/// quota wait is long. The dedicated tier assumes a user-supplied key with
/// its own token bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServiceTier {
    /// Deployment-bundled credential, shared quota. (default)
    #[default]
    Shared,
    /// User-supplied credential, private quota.
    Dedicated,
}

impl ServiceTier {
    /// Payload ceiling in bytes for this tier.
    pub fn max_file_size(self) -> u64 {
        match self {
            ServiceTier::Shared => 10 * 1024 * 1024,
            ServiceTier::Dedicated => 20 * 1024 * 1024,
        }
    }

    /// Fixed wait before retrying a rate-limited model, in milliseconds.
    ///
    /// 12 s on the shared tier is what it empirically takes for the shared
    /// token bucket to refill under load; a private key recovers much faster.
    pub fn rate_limit_backoff_ms(self) -> u64 {
        match self {
            ServiceTier::Shared => 12_000,
            ServiceTier::Dedicated => 2_000,
        }
    }
}

/// Configuration for one conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2doc::{ConversionConfig, ModelCandidate, ServiceTier};
///
/// let config = ConversionConfig::builder()
///     .tier(ServiceTier::Dedicated)
///     .models(vec![ModelCandidate::new("gemini-3-flash-preview")])
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Deployment tier. Default: [`ServiceTier::Shared`].
    pub tier: ServiceTier,

    /// Ordered model roster, highest priority first. Default: [`default_roster`].
    pub models: Vec<ModelCandidate>,

    /// Attempts per model before falling through to the next. Default: 3.
    ///
    /// Three attempts absorb the common case of one 429 plus one 503 burst
    /// without keeping the caller waiting through a genuinely dead model.
    pub max_retries: u32,

    /// Fixed wait before retrying a rate-limited model, in milliseconds.
    /// Default: the tier's value (12 s shared / 2 s dedicated).
    pub rate_limit_backoff_ms: u64,

    /// Linear backoff unit for busy/transient retries, in milliseconds.
    /// The wait before attempt *n*+1 is `n * transient_backoff_ms`. Default: 2000.
    pub transient_backoff_ms: u64,

    /// Sampling temperature for the model. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is on the page —
    /// exactly what you want for transcription, not creativity.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 65536.
    ///
    /// A dense multi-page exam paper routinely exceeds 30k output tokens;
    /// setting this too low silently truncates the document mid-question.
    pub max_output_tokens: u32,

    /// Extended-reasoning budget in tokens, forwarded only to roster
    /// candidates with `reasoning = true`. Default: None.
    pub thinking_budget: Option<u32>,

    /// Payload ceiling in bytes. Default: the tier's value.
    pub max_file_size: u64,

    /// Per-call HTTP timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Custom instruction prompt. If None, uses the built-in default.
    pub prompt: Option<String>,

    /// Pre-constructed provider. Takes precedence over credential resolution;
    /// an injected provider is assumed to carry its own auth.
    pub provider: Option<Arc<dyn GenerativeProvider>>,

    /// Credential resolver (user override > deployment default). If None,
    /// [`crate::credentials::EnvCredentials`] defaults are used.
    pub credentials: Option<Arc<dyn CredentialResolver>>,

    /// Observer for attempt/fallback events. If None, events are dropped.
    pub observer: Option<Arc<dyn ConversionObserver>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        let tier = ServiceTier::default();
        Self {
            tier,
            models: default_roster(),
            max_retries: 3,
            rate_limit_backoff_ms: tier.rate_limit_backoff_ms(),
            transient_backoff_ms: 2_000,
            temperature: 0.1,
            max_output_tokens: 65_536,
            thinking_budget: None,
            max_file_size: tier.max_file_size(),
            api_timeout_secs: 120,
            prompt: None,
            provider: None,
            credentials: None,
            observer: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("tier", &self.tier)
            .field("models", &self.models)
            .field("max_retries", &self.max_retries)
            .field("rate_limit_backoff_ms", &self.rate_limit_backoff_ms)
            .field("transient_backoff_ms", &self.transient_backoff_ms)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("thinking_budget", &self.thinking_budget)
            .field("max_file_size", &self.max_file_size)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn GenerativeProvider>"))
            .field("credentials", &self.credentials.as_ref().map(|_| "<dyn CredentialResolver>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// Set the tier and re-derive its dependent defaults (size ceiling,
    /// rate-limit backoff). Call before overriding either individually.
    pub fn tier(mut self, tier: ServiceTier) -> Self {
        self.config.tier = tier;
        self.config.max_file_size = tier.max_file_size();
        self.config.rate_limit_backoff_ms = tier.rate_limit_backoff_ms();
        self
    }

    pub fn models(mut self, models: Vec<ModelCandidate>) -> Self {
        self.config.models = models;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.max(1);
        self
    }

    pub fn rate_limit_backoff_ms(mut self, ms: u64) -> Self {
        self.config.rate_limit_backoff_ms = ms;
        self
    }

    pub fn transient_backoff_ms(mut self, ms: u64) -> Self {
        self.config.transient_backoff_ms = ms;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn thinking_budget(mut self, tokens: u32) -> Self {
        self.config.thinking_budget = Some(tokens);
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn GenerativeProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn credentials(mut self, resolver: Arc<dyn CredentialResolver>) -> Self {
        self.config.credentials = Some(resolver);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ConversionObserver>) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.models.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "Model roster must contain at least one candidate".into(),
            ));
        }
        if c.max_file_size == 0 {
            return Err(ConvertError::InvalidConfig(
                "Payload ceiling must be > 0 bytes".into(),
            ));
        }
        Ok(self.config)
    }
}
