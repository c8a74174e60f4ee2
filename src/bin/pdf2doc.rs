//! CLI binary for pdf2doc.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, runs the conversion, and writes the exported `.doc`.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2doc::{
    convert_file, prepare_for_export, write_to_file, ConversionConfig, ConversionObserver,
    ModelCandidate, ServiceTier, StaticCredentials,
};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Terminal observer ────────────────────────────────────────────────────────

/// Prints model attempts and retry waits to stderr so long waits (a quota
/// backoff can be 12 s) don't look like a hang.
struct StderrObserver;

impl ConversionObserver for StderrObserver {
    fn on_model_start(&self, model: &str) {
        eprintln!("  {} {}", dim("→"), dim(model));
    }

    fn on_retry(&self, model: &str, attempt: u32, delay: Duration) {
        eprintln!(
            "  {} {} attempt {} failed, retrying in {:.1}s",
            dim("⟳"),
            model,
            attempt,
            delay.as_secs_f64()
        );
    }

    fn on_model_exhausted(&self, model: &str, error: &str) {
        let msg: String = if error.len() > 80 {
            error.chars().take(79).collect()
        } else {
            error.to_string()
        };
        eprintln!("  {} {} gave up: {}", dim("✗"), model, dim(&msg));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes exam.doc next to exam.pdf)
  pdf2doc exam.pdf

  # Convert to a specific output file
  pdf2doc exam.pdf -o /tmp/exam.doc

  # Use your own API key (dedicated tier: bigger files, shorter quota waits)
  pdf2doc --api-key AIza... --tier dedicated exam.pdf

  # Override the model roster (tried in the order given)
  pdf2doc --model gemini-3-pro-preview --model gemini-3-flash-preview exam.pdf

ENVIRONMENT VARIABLES:
  PDF2DOC_API_KEY   User override key (same priority as --api-key)
  GEMINI_API_KEY    Deployment default key

SETUP:
  1. Set API key:   export GEMINI_API_KEY=AIza...
  2. Convert:       pdf2doc exam.pdf
"#;

/// Convert PDF files to Word-compatible .doc documents using generative AI.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2doc",
    version,
    about = "Convert PDF files to Word-compatible .doc documents using generative AI",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write the .doc to this path instead of next to the input.
    #[arg(short, long, env = "PDF2DOC_OUTPUT")]
    output: Option<PathBuf>,

    /// User override API key (beats GEMINI_API_KEY).
    #[arg(long, env = "PDF2DOC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Deployment tier: shared or dedicated.
    #[arg(long, env = "PDF2DOC_TIER", value_enum, default_value = "shared")]
    tier: TierArg,

    /// Model roster override, highest priority first. Repeatable.
    #[arg(long = "model")]
    models: Vec<String>,

    /// Extended-reasoning budget in tokens, for models that support it.
    #[arg(long, env = "PDF2DOC_THINKING_BUDGET")]
    thinking_budget: Option<u32>,

    /// Attempts per model before falling through to the next.
    #[arg(long, env = "PDF2DOC_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-call HTTP timeout in seconds.
    #[arg(long, env = "PDF2DOC_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2DOC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2DOC_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum TierArg {
    Shared,
    Dedicated,
}

impl From<TierArg> for ServiceTier {
    fn from(v: TierArg) -> Self {
        match v {
            TierArg::Shared => ServiceTier::Shared,
            TierArg::Dedicated => ServiceTier::Dedicated,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let credentials = StaticCredentials {
        user: cli.api_key.clone(),
        default: std::env::var("GEMINI_API_KEY").ok(),
    };

    let mut builder = ConversionConfig::builder()
        .tier(cli.tier.clone().into())
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .credentials(Arc::new(credentials));

    if !cli.models.is_empty() {
        // Roster built from flags: pro models get the reasoning flag so a
        // configured thinking budget reaches them.
        let roster = cli
            .models
            .iter()
            .map(|id| {
                if id.contains("pro") {
                    ModelCandidate::with_reasoning(id)
                } else {
                    ModelCandidate::new(id)
                }
            })
            .collect();
        builder = builder.models(roster);
    }
    if let Some(budget) = cli.thinking_budget {
        builder = builder.thinking_budget(budget);
    }
    if !cli.quiet && io::stderr().is_terminal() {
        builder = builder.observer(Arc::new(StderrObserver));
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Convert ──────────────────────────────────────────────────────────
    if !cli.quiet {
        eprintln!("{} {}", bold("Converting"), cli.input.display());
    }

    let converted = convert_file(&cli.input, &config)
        .await
        .context("Conversion failed")?;

    // ── Export ───────────────────────────────────────────────────────────
    let doc = prepare_for_export(&converted.markup, &converted.base_name).await;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_file_name(&doc.file_name));

    write_to_file(&doc, &output_path)
        .await
        .context("Failed to write output document")?;

    if !cli.quiet {
        eprintln!(
            "{}  {}  →  {}",
            green("✔"),
            dim(&format!("{} bytes", doc.bytes.len())),
            bold(&output_path.display().to_string()),
        );
    }

    Ok(())
}
