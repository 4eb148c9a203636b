//! Error types for the pdf2notes library.
//!
//! A single [`ConvertError`] enum covers the whole pipeline, but every
//! variant belongs to exactly one [`Stage`] so callers (and the CLI) can
//! say *which* step of the pipeline failed without string-matching on the
//! message. Nothing in the pipeline downgrades or re-wraps an error: the
//! reason text produced at the failure site is the reason text the user
//! sees.
//!
//! The one distinction worth calling out: [`ConvertError::Timeout`] means
//! *we* stopped waiting while the remote job was still non-terminal, whereas
//! [`ConvertError::RemoteFailure`] means the service itself reported the job
//! as failed. A timed-out job may well still complete remotely.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2notes library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The local page-count probe could not parse the document.
    #[error("Could not read page count from '{path}': {detail}")]
    ProbeFailed { path: PathBuf, detail: String },

    // ── Submission errors ─────────────────────────────────────────────────
    /// No credentials were configured and none were found in the environment.
    #[error(
        "Missing Mathpix credentials.\n\
         Set MATHPIX_APP_ID and MATHPIX_APP_KEY in the environment or a .env file."
    )]
    MissingCredentials,

    /// The recognition service rejected the supplied credentials (401/403).
    #[error("Recognition service rejected the credentials: {detail}")]
    AuthRejected { detail: String },

    /// The submission request could not be completed.
    #[error("Failed to submit document: {reason}")]
    SubmitFailed { reason: String },

    // ── Polling errors ────────────────────────────────────────────────────
    /// A status request could not be completed.
    #[error("Failed to poll job status: {reason}")]
    PollFailed { reason: String },

    /// The service answered, but with a body we could not interpret.
    #[error("Unexpected response from recognition service: {detail}")]
    MalformedResponse { detail: String },

    /// The service itself reported the job as failed.
    #[error("Recognition service reported failure: {reason}")]
    RemoteFailure { reason: String },

    /// The job was still non-terminal when the maximum wait elapsed.
    ///
    /// The remote job is NOT known to be cancelled — it may still be
    /// processing. Callers must not treat this as a remote rejection.
    #[error(
        "Gave up waiting after {waited_secs}s — the job may still be processing remotely.\n\
         Increase --max-wait or submit again later."
    )]
    Timeout { waited_secs: u64 },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// Could not create the output directory or write an output file.
    #[error("Failed to write output '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config / driver errors ────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The confirmation gate declined the estimated cost.
    #[error("Conversion declined at an estimated ${estimated:.2}")]
    Declined { estimated: f64 },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Config validation, input resolution, page probe, cost gate.
    Setup,
    /// Reading the document and the submission request.
    Submission,
    /// Status polling, result fetching, remote failure, timeout.
    Polling,
    /// Writing the output manifest.
    Assembly,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Submission => "submission",
            Stage::Polling => "polling",
            Stage::Assembly => "assembly",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConvertError {
    /// Classify this error by the pipeline stage it belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            ConvertError::SourceNotFound { .. }
            | ConvertError::PermissionDenied { .. }
            | ConvertError::SourceUnreadable { .. }
            | ConvertError::NotAPdf { .. }
            | ConvertError::MissingCredentials
            | ConvertError::AuthRejected { .. }
            | ConvertError::SubmitFailed { .. } => Stage::Submission,

            ConvertError::PollFailed { .. }
            | ConvertError::MalformedResponse { .. }
            | ConvertError::RemoteFailure { .. }
            | ConvertError::Timeout { .. } => Stage::Polling,

            ConvertError::WriteFailed { .. } => Stage::Assembly,

            ConvertError::DownloadFailed { .. }
            | ConvertError::DownloadTimeout { .. }
            | ConvertError::ProbeFailed { .. }
            | ConvertError::InvalidConfig(_)
            | ConvertError::Declined { .. }
            | ConvertError::Internal(_) => Stage::Setup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_mentions_duration() {
        let e = ConvertError::Timeout { waited_secs: 600 };
        let msg = e.to_string();
        assert!(msg.contains("600s"), "got: {msg}");
        assert!(msg.contains("still be processing"), "got: {msg}");
    }

    #[test]
    fn remote_failure_keeps_reason_verbatim() {
        let e = ConvertError::RemoteFailure {
            reason: "unsupported file".into(),
        };
        assert!(e.to_string().contains("unsupported file"));
    }

    #[test]
    fn write_failed_carries_source() {
        use std::error::Error;
        let e = ConvertError::WriteFailed {
            path: PathBuf::from("/out/notes.tex"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(e.to_string().contains("notes.tex"));
        assert!(e.source().is_some());
    }

    #[test]
    fn stage_classification() {
        assert_eq!(
            ConvertError::SubmitFailed {
                reason: "connection refused".into()
            }
            .stage(),
            Stage::Submission
        );
        assert_eq!(
            ConvertError::Timeout { waited_secs: 1 }.stage(),
            Stage::Polling
        );
        assert_eq!(
            ConvertError::RemoteFailure { reason: "x".into() }.stage(),
            Stage::Polling
        );
        assert_eq!(
            ConvertError::WriteFailed {
                path: PathBuf::from("a"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "boom"),
            }
            .stage(),
            Stage::Assembly
        );
        assert_eq!(
            ConvertError::Declined { estimated: 2.5 }.stage(),
            Stage::Setup
        );
    }

    #[test]
    fn missing_credentials_names_both_variables() {
        let msg = ConvertError::MissingCredentials.to_string();
        assert!(msg.contains("MATHPIX_APP_ID"));
        assert!(msg.contains("MATHPIX_APP_KEY"));
    }
}
