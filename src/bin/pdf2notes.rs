//! CLI binary for pdf2notes.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, renders progress, and prints the manifest.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2notes::{
    convert, inspect, ConversionConfig, ConversionProgress, CostEstimate, OutputFormat,
    OutputManifest, ProgressHandle,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress reporter using indicatif ────────────────────────────────────

/// Terminal progress reporter: a spinner while the remote job is in flight,
/// plus one line per pipeline milestone.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        Arc::new(Self { bar })
    }
}

impl ConversionProgress for CliProgress {
    fn on_estimate(&self, estimate: &CostEstimate) {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Estimated cost: {estimate}"))
        );
    }

    fn on_submitted(&self, job_id: &str) {
        self.bar.set_prefix("Processing");
        self.bar.set_message(format!("job {job_id}"));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_polling(&self, elapsed: Duration, percent_done: Option<f32>) {
        let pct = percent_done
            .map(|p| format!("{p:.0}%  "))
            .unwrap_or_default();
        self.bar
            .set_message(format!("{pct}{}s elapsed", elapsed.as_secs()));
    }

    fn on_completed(&self) {
        self.bar.finish_and_clear();
        eprintln!("{} recognition complete", green("✔"));
    }

    fn on_failed(&self, reason: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} remote failure: {}", red("✘"), red(reason));
    }

    fn on_timed_out(&self, waited: Duration) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} no result after {}s — job may still be processing remotely",
            red("✘"),
            waited.as_secs()
        );
    }

    fn on_assembled(&self, manifest: &OutputManifest) {
        eprintln!(
            "{} {}",
            green("✔"),
            bold(&format!("Output written to {}", manifest.dir.display()))
        );
        for (format, path) in &manifest.files {
            eprintln!(
                "  {} {}  {}",
                dim("-"),
                format,
                dim(&path.display().to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a local PDF into LaTeX + Markdown + HTML
  pdf2notes lecture_notes.pdf

  # Markdown only, custom output root
  pdf2notes --formats md -o converted lecture_notes.pdf

  # From a URL, skip the cost prompt
  pdf2notes -y https://example.edu/notes/week3.pdf

  # Just the price, no conversion (no credentials needed)
  pdf2notes --estimate-only thesis.pdf

  # Patient mode for very large documents
  pdf2notes --max-wait 1800 --poll-interval 5 book.pdf

PRICING:
  Pages 1-40,000:   $0.025/page
  Pages beyond:     $0.010/page (marginal — earlier pages keep their rate)

  100-page document:     $2.50
  50,000-page document:  $1,100.00

OUTPUT LAYOUT:
  <output-dir>/<timestamp>/notes.tex
  <output-dir>/<timestamp>/notes.md
  <output-dir>/<timestamp>/notes.html

  Each run gets its own timestamped directory; prior runs are never touched.

ENVIRONMENT VARIABLES:
  MATHPIX_APP_ID     Application id for the recognition service
  MATHPIX_APP_KEY    Application key for the recognition service

  Both are also read from a .env file in the working directory.

SETUP:
  1. Set credentials:  export MATHPIX_APP_ID=... MATHPIX_APP_KEY=...
  2. Convert:          pdf2notes document.pdf
"#;

/// Convert PDF lecture notes to LaTeX, Markdown, and HTML via remote OCR.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2notes",
    version,
    about = "Convert PDF lecture notes to LaTeX, Markdown, and HTML via remote OCR",
    long_about = "Convert PDF documents (local files or URLs) into LaTeX, Markdown, and HTML \
using a remote Mathpix-compatible OCR service. Estimates the processing cost up front, \
tracks the remote job to completion, and files results into a timestamped output directory.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(default_value = "notes.pdf")]
    input: String,

    /// Root directory for timestamped output manifests.
    #[arg(short, long, env = "PDF2NOTES_OUTPUT_DIR", default_value = "processed_notes")]
    output_dir: PathBuf,

    /// Output formats: comma-separated list of tex, md, html.
    #[arg(long, env = "PDF2NOTES_FORMATS", default_value = "tex,md,html")]
    formats: String,

    /// Seconds between status polls.
    #[arg(long, env = "PDF2NOTES_POLL_INTERVAL", default_value_t = 2)]
    poll_interval: u64,

    /// Maximum seconds to wait for the remote job.
    #[arg(long, env = "PDF2NOTES_MAX_WAIT", default_value_t = 600)]
    max_wait: u64,

    /// Base URL of the recognition service.
    #[arg(long, env = "PDF2NOTES_BASE_URL", default_value = pdf2notes::DEFAULT_BASE_URL)]
    base_url: String,

    /// Print the cost estimate and exit without converting.
    #[arg(long)]
    estimate_only: bool,

    /// Skip the cost-confirmation prompt.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Print per-stage timings after the run.
    #[arg(long, env = "PDF2NOTES_TIMING")]
    timing: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2NOTES_NO_PROGRESS")]
    no_progress: bool,

    /// HTTP download timeout for URL inputs, in seconds.
    #[arg(long, env = "PDF2NOTES_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-request HTTP timeout, in seconds.
    #[arg(long, env = "PDF2NOTES_HTTP_TIMEOUT", default_value_t = 30)]
    http_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2NOTES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2NOTES_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the user-facing feedback channel; keep library INFO
    // logs quiet unless --verbose asks for them.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let formats = parse_formats(&cli.formats)?;

    // ── Estimate-only mode (no credentials, no network) ──────────────────
    if cli.estimate_only {
        let config = ConversionConfig::builder()
            .download_timeout_secs(cli.download_timeout)
            .build()
            .context("Invalid configuration")?;
        let estimate = inspect(&cli.input, &config)
            .await
            .context("Failed to estimate")?;
        println!("{estimate}");
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ConversionConfig::builder()
        .formats(formats)
        .poll_interval_secs(cli.poll_interval)
        .max_wait_secs(cli.max_wait)
        .output_dir(&cli.output_dir)
        .base_url(&cli.base_url)
        .download_timeout_secs(cli.download_timeout)
        .http_timeout_secs(cli.http_timeout);

    if !cli.quiet && !cli.no_progress {
        builder = builder.progress(CliProgress::new() as ProgressHandle);
    }
    if !cli.yes {
        builder = builder.confirm(Arc::new(prompt_confirmation));
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    match convert(&cli.input, &config).await {
        Ok(report) => {
            if !cli.quiet {
                eprintln!(
                    "{}  {} pages  {}  →  {}",
                    green("✔"),
                    report.stats.page_count,
                    dim(&format!("est. ${:.2}", report.estimate.amount)),
                    bold(&report.manifest.dir.display().to_string()),
                );
            }
            if cli.timing {
                eprintln!(
                    "   submit {}ms  poll {}ms ({} polls)  assemble {}ms  total {}ms",
                    report.stats.submit_ms,
                    report.stats.poll_ms,
                    report.stats.polls,
                    report.stats.assemble_ms,
                    report.stats.total_ms,
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("\n{} {} failed: {e}", red("✘"), e.stage());
            std::process::exit(1);
        }
    }
}

/// Blocking stdin prompt used as the driver's confirmation gate.
fn prompt_confirmation(estimate: &CostEstimate) -> bool {
    eprint!("Proceed with conversion at an estimated {estimate}? [y/N] ");
    io::stderr().flush().ok();

    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Parse `--formats` into a list of `OutputFormat`.
fn parse_formats(s: &str) -> Result<Vec<OutputFormat>> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.parse::<OutputFormat>()
                .with_context(|| format!("Invalid format '{}'", part.trim()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_formats_accepts_mixed_aliases() {
        let formats = parse_formats("tex, markdown,HTML").unwrap();
        assert_eq!(
            formats,
            vec![OutputFormat::Latex, OutputFormat::Markdown, OutputFormat::Html]
        );
    }

    #[test]
    fn parse_formats_rejects_unknown() {
        assert!(parse_formats("tex,docx").is_err());
    }

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["pdf2notes"]);
        assert_eq!(cli.input, "notes.pdf");
        assert_eq!(cli.output_dir, PathBuf::from("processed_notes"));
        assert_eq!(cli.poll_interval, 2);
        assert_eq!(cli.max_wait, 600);
        assert!(!cli.estimate_only);
    }
}
