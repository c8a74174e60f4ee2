//! Error types for the pdf2doc library.
//!
//! Two layers of failure exist and must not be conflated:
//!
//! * [`ConvertError`] — **Fatal**: the conversion cannot produce a document
//!   (file too large, no credential, the request itself was rejected, or
//!   every configured model was exhausted). Returned as `Err(ConvertError)`
//!   from the top-level `convert*` functions.
//!
//! * [`ErrorClass`] — **Tactical**: the normalized category of one failed
//!   model attempt, derived from heterogeneous transport signals by
//!   [`classify`]. It never reaches the caller directly; the orchestrator
//!   consumes it to decide between retry, model fallback, and abort.
//!
//! Graphic-level failures in the export path are absorbed on the spot and
//! have no public error type at all — a bad SVG degrades to its original
//! markup, never to an `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2doc library.
///
/// Every variant renders as a single human-readable sentence; callers can
/// surface `Display` output directly without unpacking raw transport errors.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Precondition errors ───────────────────────────────────────────────
    /// The payload exceeds the configured ceiling. No network call was made.
    #[error("The file is too large ({size} bytes). The limit for this tier is {limit} bytes; please use a smaller file.")]
    SizeExceeded { size: u64, limit: u64 },

    /// Neither a user override key nor a deployment default key resolved.
    #[error("No API credential found. Add your own key or configure a deployment default.")]
    MissingCredential,

    // ── Input errors (file-based entry points) ────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Orchestration errors ──────────────────────────────────────────────
    /// The service rejected the request itself; retrying or switching
    /// models cannot help, so orchestration stopped immediately.
    #[error("The conversion request was rejected: {message}")]
    Fatal { message: String },

    /// Every model was exhausted and the terminal failure was a quota or
    /// rate-limit rejection.
    #[error("The conversion servers are overloaded right now. Try again in a minute, or add your own API key.")]
    ServersBusy,

    /// Every model was exhausted; the terminal failure was not quota-related.
    #[error("Conversion failed on every configured model: {message}")]
    Exhausted { message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the exported document file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Normalized category of one failed model attempt.
///
/// Drives the orchestrator's retry/fallback decision:
///
/// | Class              | Decision                                        |
/// |--------------------|-------------------------------------------------|
/// | `NotFound`         | abandon this model immediately, try the next    |
/// | `RateLimited`      | long fixed wait, retry same model               |
/// | `ServerBusy`       | linear backoff, retry same model                |
/// | `NetworkTransient` | linear backoff, retry same model                |
/// | `FatalClient`      | abort the whole orchestration                   |
/// | `Unknown`          | abandon this model, try the next                |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The model identifier no longer exists (retired or mistyped).
    NotFound,
    /// Quota exhausted or requests-per-minute ceiling hit.
    RateLimited,
    /// The backend is up but over capacity.
    ServerBusy,
    /// Connection reset, DNS failure, timeout, or an empty response body.
    NetworkTransient,
    /// The request itself is malformed or unauthorized; no retry can help.
    FatalClient,
    /// Anything the matching rules below do not recognize.
    Unknown,
}

/// Classify a raw failure signal into an [`ErrorClass`].
///
/// The transport may surface a structured HTTP status, a free-text message,
/// or both, so both are inspected: status codes first (authoritative when
/// present), then case-insensitive substring rules over the message. The
/// message rules are inherently fragile against upstream format changes,
/// which is exactly why they live in this one function and nowhere else.
pub fn classify(status: Option<u16>, message: &str) -> ErrorClass {
    match status {
        Some(404) => return ErrorClass::NotFound,
        Some(429) => return ErrorClass::RateLimited,
        Some(503) => return ErrorClass::ServerBusy,
        Some(400) | Some(401) | Some(403) => return ErrorClass::FatalClient,
        _ => {}
    }

    let msg = message.to_lowercase();

    if msg.contains("not found") || msg.contains("404") {
        ErrorClass::NotFound
    } else if msg.contains("429")
        || msg.contains("quota")
        || msg.contains("rate limit")
        || msg.contains("resource_exhausted")
    {
        ErrorClass::RateLimited
    } else if msg.contains("503") || msg.contains("overloaded") || msg.contains("unavailable") {
        ErrorClass::ServerBusy
    } else if msg.contains("timed out")
        || msg.contains("timeout")
        || msg.contains("connect")
        || msg.contains("network")
        || msg.contains("empty response")
    {
        ErrorClass::NetworkTransient
    } else if msg.contains("invalid argument")
        || msg.contains("api key not valid")
        || msg.contains("unsupported")
        || msg.contains("permission denied")
    {
        ErrorClass::FatalClient
    } else {
        ErrorClass::Unknown
    }
}
