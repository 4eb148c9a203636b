//! Job model: one submitted document and its lifecycle.
//!
//! A [`ConversionJob`] moves strictly forward through [`JobStatus`]:
//! `Pending → Processing → {Complete, Failed}`. Once a job is terminal it
//! never changes again, and the pipeline driver stops polling it — the
//! [`ConversionJob::advance`] guard makes a backwards or post-terminal
//! transition a no-op rather than a panic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConvertError;

/// One output rendering requested from the recognition service.
///
/// The variant order is the canonical write order for manifests
/// (`notes.tex`, `notes.md`, `notes.html`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Latex,
    Markdown,
    Html,
}

impl OutputFormat {
    /// All formats, in canonical order.
    pub const ALL: [OutputFormat; 3] =
        [OutputFormat::Latex, OutputFormat::Markdown, OutputFormat::Html];

    /// File extension for the assembled output file.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Latex => "tex",
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
        }
    }

    /// Format key used on the wire when requesting/fetching this rendering.
    pub fn remote_key(&self) -> &'static str {
        // Same spelling as the extension for all current formats; kept as a
        // separate accessor because the wire vocabulary is the service's,
        // not ours.
        self.extension()
    }

    /// Canonical output file name (`notes.tex`, `notes.md`, `notes.html`).
    pub fn file_name(&self) -> String {
        format!("notes.{}", self.extension())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tex" | "latex" => Ok(OutputFormat::Latex),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            other => Err(ConvertError::InvalidConfig(format!(
                "unknown output format '{other}' (expected tex, md, or html)"
            ))),
        }
    }
}

/// Lifecycle status of a [`ConversionJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the service, not yet observed processing.
    Pending,
    /// At least one poll has seen the job in flight.
    Processing,
    /// The service finished and results were fetched.
    Complete,
    /// The service reported the job as failed.
    Failed,
}

impl JobStatus {
    /// Terminal statuses are never left and never re-polled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One submitted document, identified remotely by `remote_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Local path of the submitted PDF.
    pub source: PathBuf,
    /// Identifier assigned by the recognition service at submission.
    pub remote_id: String,
    /// Requested output renderings, deduplicated, canonical order.
    pub formats: Vec<OutputFormat>,
    /// When the submission was accepted.
    pub submitted_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: JobStatus,
}

impl ConversionJob {
    /// Create a freshly-submitted job in `Pending` status.
    pub fn new(source: PathBuf, remote_id: String, formats: Vec<OutputFormat>) -> Self {
        Self {
            source,
            remote_id,
            formats,
            submitted_at: Utc::now(),
            status: JobStatus::Pending,
        }
    }

    /// Advance the status. No-op once the job is terminal.
    pub fn advance(&mut self, next: JobStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ConversionJob {
        ConversionJob::new(
            PathBuf::from("notes.pdf"),
            "pdf-123".into(),
            vec![OutputFormat::Latex, OutputFormat::Markdown],
        )
    }

    #[test]
    fn new_job_is_pending() {
        assert_eq!(job().status, JobStatus::Pending);
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn terminal_status_is_sticky() {
        let mut j = job();
        j.advance(JobStatus::Processing);
        j.advance(JobStatus::Complete);
        assert_eq!(j.status, JobStatus::Complete);

        // Terminal: further transitions are ignored.
        j.advance(JobStatus::Failed);
        assert_eq!(j.status, JobStatus::Complete);
        j.advance(JobStatus::Pending);
        assert_eq!(j.status, JobStatus::Complete);
    }

    #[test]
    fn failed_is_terminal_too() {
        let mut j = job();
        j.advance(JobStatus::Failed);
        j.advance(JobStatus::Complete);
        assert_eq!(j.status, JobStatus::Failed);
    }

    #[test]
    fn format_extensions_and_names() {
        assert_eq!(OutputFormat::Latex.extension(), "tex");
        assert_eq!(OutputFormat::Markdown.extension(), "md");
        assert_eq!(OutputFormat::Html.extension(), "html");
        assert_eq!(OutputFormat::Latex.file_name(), "notes.tex");
    }

    #[test]
    fn format_parsing_accepts_aliases() {
        assert_eq!("latex".parse::<OutputFormat>().unwrap(), OutputFormat::Latex);
        assert_eq!("TEX".parse::<OutputFormat>().unwrap(), OutputFormat::Latex);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!(
            "markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!("docx".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn canonical_order_is_tex_md_html() {
        let mut v = vec![OutputFormat::Html, OutputFormat::Latex, OutputFormat::Markdown];
        v.sort();
        assert_eq!(v, OutputFormat::ALL.to_vec());
    }
}
