//! Progress-reporting trait for pipeline events.
//!
//! Inject an `Arc<dyn ConversionProgress>` via
//! [`crate::config::ConversionConfigBuilder::progress`] to receive events as
//! the driver moves a job through its stages.
//!
//! # Reporting is observational
//!
//! The driver calls these methods and never looks back: every method returns
//! `()`, so an implementation cannot alter job state or abort the pipeline.
//! Implementations that do I/O (a terminal bar, a log sink) must swallow
//! their own failures — a broken output stream is not a conversion error.
//! All methods have no-op defaults so callers only override what they care
//! about.

use std::sync::Arc;
use std::time::Duration;

use crate::output::OutputManifest;
use crate::pricing::CostEstimate;

/// Called by the pipeline driver as a job progresses.
///
/// Implementations must be `Send + Sync`; the driver itself is single-task,
/// but configs (and the reporters inside them) are shared across threads.
pub trait ConversionProgress: Send + Sync {
    /// The cost estimate was computed, before any network call.
    fn on_estimate(&self, estimate: &CostEstimate) {
        let _ = estimate;
    }

    /// The document was accepted; `job_id` is the remote identifier.
    fn on_submitted(&self, job_id: &str) {
        let _ = job_id;
    }

    /// One status poll completed with the job still in flight.
    ///
    /// `elapsed` is measured from the start of the poll loop;
    /// `percent_done` is the service's own progress figure when it
    /// reports one.
    fn on_polling(&self, elapsed: Duration, percent_done: Option<f32>) {
        let _ = (elapsed, percent_done);
    }

    /// The remote job completed and results were fetched.
    fn on_completed(&self) {}

    /// The remote job failed; `reason` is the service's verbatim text.
    fn on_failed(&self, reason: &str) {
        let _ = reason;
    }

    /// The maximum wait elapsed with the job still non-terminal.
    fn on_timed_out(&self, waited: Duration) {
        let _ = waited;
    }

    /// The output manifest was written.
    fn on_assembled(&self, manifest: &OutputManifest) {
        let _ = manifest;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl ConversionProgress for NoopProgress {}

/// Convenience alias matching the type stored in
/// [`crate::config::ConversionConfig`].
pub type ProgressHandle = Arc<dyn ConversionProgress>;
