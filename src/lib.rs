//! # pdf2notes
//!
//! Convert PDF lecture notes into LaTeX, Markdown, and HTML using a remote
//! Mathpix-compatible OCR service.
//!
//! ## Why this crate?
//!
//! Local PDF-to-text tooling falls apart on handwritten lecture notes and
//! dense mathematical typesetting. This crate delegates the recognition to a
//! remote OCR engine that understands formulas and tables, and concentrates
//! on everything around it: estimating what a document will cost before
//! submitting it, tracking the remote job to completion, and filing the
//! results into a tidy per-run output directory.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (path or URL)
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Probe     local page count via lopdf
//!  ├─ 3. Estimate  tiered per-page price, optional confirmation gate
//!  ├─ 4. Submit    multipart upload → remote job id
//!  ├─ 5. Poll      fixed-interval status loop, bounded by max_wait
//!  └─ 6. Assemble  <output_dir>/<timestamp>/notes.{tex,md,html}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2notes::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials auto-detected from MATHPIX_APP_ID / MATHPIX_APP_KEY
//!     let config = ConversionConfig::default();
//!     let report = convert("notes.pdf", &config).await?;
//!     println!("wrote {}", report.manifest.dir.display());
//!     eprintln!("estimated {}", report.estimate);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2notes` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2notes = { version = "0.1", default-features = false }
//! ```
//!
//! ## Testing without the network
//!
//! The remote engine sits behind the [`RecognitionService`] trait; inject a
//! fake via [`ConversionConfigBuilder::service`] and the whole pipeline —
//! submission, polling, timeout, assembly — runs in-memory. Poll timing uses
//! `tokio::time`, so `#[tokio::test(start_paused = true)]` simulates a full
//! ten-minute wait in microseconds.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod pricing;
pub mod progress;
pub mod remote;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConfirmGate, ConversionConfig, ConversionConfigBuilder, Credentials, DEFAULT_BASE_URL,
    ENV_APP_ID, ENV_APP_KEY,
};
pub use convert::{convert, inspect};
pub use error::{ConvertError, Stage};
pub use job::{ConversionJob, JobStatus, OutputFormat};
pub use output::{ConversionResult, OutputManifest, RunReport, RunStats};
pub use pricing::{estimate, CostEstimate};
pub use progress::{ConversionProgress, NoopProgress, ProgressHandle};
pub use remote::{MathpixClient, PollOutcome, RecognitionService};
