//! # pdf2doc
//!
//! Convert PDF documents to Word-compatible HTML using generative AI models.
//!
//! ## Why this crate?
//!
//! Teachers and clerks live in legacy word processors, not in PDFs. This
//! crate ships a scanned or digital PDF to a remote generative model that
//! transcribes it into editable HTML — diagrams redrawn as inline SVG — and
//! then rewrites that output into a `.doc`-importable document. The remote
//! service is quota-limited, intermittently over capacity, and retires model
//! identifiers without notice, so the interesting engineering is the
//! orchestration around it, not the call itself.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Preconditions  size ceiling, credential resolution
//!  ├─ 2. Orchestrate    model roster × bounded retries, classified errors
//!  ├─ 3. Cleanup        strip code fences, trim
//!  ├─ 4. Substitute     inline SVG → supersampled raster <img> (fan-out/fan-in)
//!  └─ 5. Shell          BOM + @page geometry + Section1 wrapper → .doc bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2doc::{convert_file, prepare_for_export, write_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential auto-resolved from PDF2DOC_API_KEY / GEMINI_API_KEY
//!     let config = ConversionConfig::default();
//!     let converted = convert_file("exam.pdf", &config).await?;
//!     let doc = prepare_for_export(&converted.markup, &converted.base_name).await;
//!     write_to_file(&doc, &doc.file_name).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2doc` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2doc = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cleanup;
pub mod config;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod export;
pub mod progress;
pub mod prompts;
pub mod provider;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    default_roster, ConversionConfig, ConversionConfigBuilder, ModelCandidate, ServiceTier,
};
pub use convert::{convert, convert_file, ConversionRequest, ConvertedDocument};
pub use credentials::{CredentialResolver, EnvCredentials, StaticCredentials};
pub use error::{classify, ConvertError, ErrorClass};
pub use export::{
    prepare_for_export, prepare_for_export_with, substitute_graphics, write_to_file,
    ExportableDocument, RasterError, ResvgRasterizer, SvgRasterizer, DOC_MIME_TYPE,
};
pub use progress::{ConversionObserver, NoopObserver};
pub use provider::{GeminiProvider, GenerationParams, GenerativeProvider, ModelError};
