//! Pipeline driver: one document, start to finish.
//!
//! [`convert`] sequences the whole run — resolve input, probe pages,
//! estimate cost, confirm, submit, poll, assemble — strictly in that order,
//! with exactly one [`ConversionJob`] in flight. Every stage failure aborts
//! the run immediately and surfaces the originating error unchanged.
//!
//! ## Polling
//!
//! The only loop in the system. It re-polls at a fixed interval until the
//! job reaches a terminal status or `max_wait` elapses, and it never issues
//! a poll for a job it has already observed terminal. Timing uses
//! `tokio::time`, so tests running under a paused runtime simulate the
//! entire wait instantly.

use crate::config::{ConversionConfig, Credentials};
use crate::error::ConvertError;
use crate::job::{ConversionJob, JobStatus};
use crate::output::{RunReport, RunStats};
use crate::pipeline::{assemble, input, probe};
use crate::pricing::{self, CostEstimate};
use crate::progress::{NoopProgress, ProgressHandle};
use crate::remote::{MathpixClient, PollOutcome, RecognitionService};
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Convert a PDF file or URL into the configured output formats.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Conversion configuration
///
/// # Returns
/// `Ok(RunReport)` once the output manifest has been written.
///
/// # Errors
/// Any stage failure, classified by [`ConvertError::stage`]; see the
/// crate-level docs for the taxonomy. Notably [`ConvertError::Timeout`]
/// when `max_wait` elapses with the job still in flight, and
/// [`ConvertError::RemoteFailure`] when the service reports the job failed.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<RunReport, ConvertError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    let progress = progress_handle(config);
    info!("Starting conversion: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Probe pages, estimate cost ───────────────────────────────
    let page_count = probe::page_count(&pdf_path).await?;
    let estimate = pricing::estimate(page_count);
    info!("PDF has {} pages, estimated {}", page_count, estimate);
    progress.on_estimate(&estimate);

    // ── Step 3: Confirmation gate ────────────────────────────────────────
    if let Some(ref confirm) = config.confirm {
        if !confirm(&estimate) {
            return Err(ConvertError::Declined {
                estimated: estimate.amount,
            });
        }
    }

    // ── Step 4: Read the document and submit ─────────────────────────────
    // The file is fully read before the service is even resolved, so an
    // unreadable input can never produce a network call.
    let document = tokio::fs::read(&pdf_path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::SourceNotFound {
                path: pdf_path.clone(),
            },
            std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
                path: pdf_path.clone(),
            },
            _ => ConvertError::SourceUnreadable {
                path: pdf_path.clone(),
                source: e,
            },
        })?;

    let service = resolve_service(config)?;

    let submit_start = Instant::now();
    let remote_id = service.submit(&document, &config.formats).await?;
    let submit_ms = submit_start.elapsed().as_millis() as u64;

    let mut job = ConversionJob::new(pdf_path, remote_id, config.formats.clone());
    info!("Submitted as job {}", job.remote_id);
    progress.on_submitted(&job.remote_id);

    // ── Step 5: Poll until terminal or max_wait ──────────────────────────
    let poll_start = Instant::now();
    let mut polls: u32 = 0;
    let result = loop {
        let elapsed = poll_start.elapsed();
        if elapsed >= config.max_wait {
            // The job is NOT known to be cancelled; it stays non-terminal
            // locally and is abandoned remotely.
            warn!(
                "Job {} still {} after {:?}; giving up",
                job.remote_id, job.status, elapsed
            );
            progress.on_timed_out(elapsed);
            return Err(ConvertError::Timeout {
                waited_secs: config.max_wait.as_secs(),
            });
        }

        polls += 1;
        match service.poll(&job.remote_id, &job.formats).await? {
            PollOutcome::Processing { percent_done } => {
                job.advance(JobStatus::Processing);
                debug!(
                    "Job {}: processing ({:?}%), {:?} elapsed",
                    job.remote_id, percent_done, elapsed
                );
                progress.on_polling(elapsed, percent_done);
            }
            PollOutcome::Complete(result) => {
                job.advance(JobStatus::Complete);
                info!("Job {} complete after {} poll(s)", job.remote_id, polls);
                progress.on_completed();
                break result;
            }
            PollOutcome::Failed { reason } => {
                job.advance(JobStatus::Failed);
                progress.on_failed(&reason);
                return Err(ConvertError::RemoteFailure { reason });
            }
        }

        sleep(config.poll_interval).await;
    };
    let poll_ms = poll_start.elapsed().as_millis() as u64;

    // ── Step 6: Assemble the manifest ────────────────────────────────────
    let assemble_start = Instant::now();
    let timestamp = assemble::run_timestamp(chrono::Local::now());
    let manifest = assemble::assemble(&result, &config.output_dir, &timestamp).await?;
    let assemble_ms = assemble_start.elapsed().as_millis() as u64;
    progress.on_assembled(&manifest);

    let stats = RunStats {
        page_count,
        polls,
        submit_ms,
        poll_ms,
        assemble_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} file(s) in {} ({}ms total)",
        manifest.files.len(),
        manifest.dir.display(),
        stats.total_ms
    );

    Ok(RunReport {
        job,
        estimate,
        manifest,
        stats,
    })
}

/// Probe the document and return the cost estimate without converting.
///
/// Does not require credentials and never contacts the recognition service.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<CostEstimate, ConvertError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout).await?;
    let page_count = probe::page_count(resolved.path()).await?;
    Ok(pricing::estimate(page_count))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn progress_handle(config: &ConversionConfig) -> ProgressHandle {
    config
        .progress
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgress))
}

/// Resolve the recognition service, most-specific first:
///
/// 1. **Pre-built service** (`config.service`) — used as-is. This is how
///    the test suite substitutes an in-memory fake.
/// 2. **Configured credentials** (`config.credentials`) — a production
///    client against `config.base_url`.
/// 3. **Environment** — [`Credentials::from_env`], reading a `.env` file if
///    present. Missing credentials surface as a submission-stage error
///    before any network call.
fn resolve_service(
    config: &ConversionConfig,
) -> Result<Arc<dyn RecognitionService>, ConvertError> {
    if let Some(ref service) = config.service {
        return Ok(Arc::clone(service));
    }

    let credentials = match config.credentials {
        Some(ref c) => c.clone(),
        None => Credentials::from_env()?,
    };

    let client = MathpixClient::new(credentials, &config.base_url, config.http_timeout)?;
    Ok(Arc::new(client))
}
