//! Observer trait for attempt/fallback events during orchestration.
//!
//! Inject an [`Arc<dyn ConversionObserver>`] via
//! [`crate::config::ConversionConfigBuilder::observer`] to receive real-time
//! events as the orchestrator walks the model roster. Callers can forward
//! events to a status line, a progress UI, or a log sink without the library
//! knowing how the host application communicates.
//!
//! All methods have default no-op implementations so callers only override
//! what they care about.

use std::time::Duration;

/// Called by the orchestrator as it tries models and schedules retries.
///
/// Implementations must be `Send + Sync`. Within one conversion the calls
/// arrive strictly in order — retries are deliberate blocking waits on the
/// calling task, never concurrent.
pub trait ConversionObserver: Send + Sync {
    /// Called once before the first model attempt.
    fn on_conversion_start(&self, _file_name: &str, _size: u64) {}

    /// Called before the first attempt against each model.
    fn on_model_start(&self, _model: &str) {}

    /// Called when a retry against the same model has been scheduled.
    /// `attempt` is the attempt that just failed (1-based); the orchestrator
    /// sleeps `delay` before the next one.
    fn on_retry(&self, _model: &str, _attempt: u32, _delay: Duration) {}

    /// Called when a model is abandoned (attempts exhausted, identifier
    /// retired, or an unclassifiable error).
    fn on_model_exhausted(&self, _model: &str, _error: &str) {}

    /// Called once when a model succeeds, before `convert` returns.
    fn on_conversion_complete(&self, _model: &str, _markup_len: usize) {}
}

/// No-op observer, useful as a placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}
