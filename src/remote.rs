//! Remote conversion client: all interaction with the recognition service.
//!
//! The service is the true engine of this system and it is opaque — we treat
//! it as a capability with exactly two operations, [`RecognitionService::submit`]
//! and [`RecognitionService::poll`], behind a dyn-capable trait. The entire
//! test suite runs against an in-memory implementation of this trait; only
//! [`MathpixClient`] ever opens a socket.
//!
//! ## Wire contract
//!
//! * `POST {base}/pdf` — multipart form with a `file` part and an
//!   `options_json` field naming the requested conversion formats. Returns
//!   `{"pdf_id": "..."}`.
//! * `GET {base}/pdf/{id}` — returns `{"status": "...", "percent_done": n}`;
//!   `completed` and `error` are terminal, anything else means the job is
//!   still in flight.
//! * `GET {base}/pdf/{id}.{ext}` — the finished rendering for one format.
//!
//! Both endpoints authenticate via `app_id` / `app_key` headers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Credentials;
use crate::error::ConvertError;
use crate::job::OutputFormat;
use crate::output::ConversionResult;

/// Outcome of one status poll.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Job still in flight; `percent_done` when the service reports one.
    Processing { percent_done: Option<f32> },
    /// Job finished; all requested renderings fetched.
    Complete(ConversionResult),
    /// The service reported the job as failed, with its verbatim reason.
    Failed { reason: String },
}

/// The remote recognition capability.
///
/// Exactly two operations: submit a document, poll a job. `poll` fetches the
/// per-format results itself when it observes completion, so a caller never
/// issues a third kind of request. Implementations must not be called for a
/// job the caller already knows to be terminal — that contract is enforced
/// by the pipeline driver's loop, not here.
#[async_trait]
pub trait RecognitionService: Send + Sync {
    /// Submit a document for recognition. Returns the remote job id.
    async fn submit(
        &self,
        document: &[u8],
        formats: &[OutputFormat],
    ) -> Result<String, ConvertError>;

    /// Query job status; on completion, fetch and return the results for
    /// `formats`.
    async fn poll(
        &self,
        job_id: &str,
        formats: &[OutputFormat],
    ) -> Result<PollOutcome, ConvertError>;
}

// ── Wire types ───────────────────────────────────────────────────────────

/// Processing options sent alongside the document in `options_json`.
///
/// The math delimiters and table/equation switches are fixed: they describe
/// how recognised math is spelled in the output, and every consumer of the
/// assembled notes expects the `$`/`$$` convention.
#[derive(Debug, Serialize)]
struct ProcessingOptions {
    conversion_formats: BTreeMap<&'static str, bool>,
    math_inline_delimiters: [&'static str; 2],
    math_display_delimiters: [&'static str; 2],
    rm_spaces: bool,
    enable_tables_fallback: bool,
    include_equation_tags: bool,
    numbers_default_to_math: bool,
}

impl ProcessingOptions {
    fn for_formats(formats: &[OutputFormat]) -> Self {
        Self {
            conversion_formats: formats.iter().map(|f| (f.remote_key(), true)).collect(),
            math_inline_delimiters: ["$", "$"],
            math_display_delimiters: ["$$", "$$"],
            rm_spaces: true,
            enable_tables_fallback: true,
            include_equation_tags: true,
            numbers_default_to_math: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    pdf_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    percent_done: Option<f32>,
    #[serde(default)]
    error: Option<String>,
}

// ── Production client ────────────────────────────────────────────────────

/// Production [`RecognitionService`] over HTTP.
pub struct MathpixClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl MathpixClient {
    /// Construct a client with an explicit credential value.
    ///
    /// `base_url` has no trailing slash (e.g. `https://api.mathpix.com/v3`).
    pub fn new(
        credentials: Credentials,
        base_url: impl Into<String>,
        http_timeout: Duration,
    ) -> Result<Self, ConvertError> {
        let http = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .map_err(|e| ConvertError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("app_id", &self.credentials.app_id)
            .header("app_key", &self.credentials.app_key)
    }

    /// Fetch the finished rendering for one format.
    async fn fetch_format(
        &self,
        job_id: &str,
        format: OutputFormat,
    ) -> Result<String, ConvertError> {
        let url = format!("{}/pdf/{}.{}", self.base_url, job_id, format.remote_key());
        let response = self
            .authed(self.http.get(&url))
            .send()
            .await
            .map_err(|e| ConvertError::PollFailed {
                reason: format!("fetching {format} result: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(ConvertError::PollFailed {
                reason: format!("fetching {format} result: HTTP {}", response.status()),
            });
        }

        response.text().await.map_err(|e| ConvertError::MalformedResponse {
            detail: format!("reading {format} result body: {e}"),
        })
    }
}

#[async_trait]
impl RecognitionService for MathpixClient {
    async fn submit(
        &self,
        document: &[u8],
        formats: &[OutputFormat],
    ) -> Result<String, ConvertError> {
        let options = ProcessingOptions::for_formats(formats);
        let options_json = serde_json::to_string(&options)
            .map_err(|e| ConvertError::Internal(format!("options_json: {e}")))?;

        let file_part = reqwest::multipart::Part::bytes(document.to_vec())
            .file_name("document.pdf")
            .mime_str("application/pdf")
            .map_err(|e| ConvertError::Internal(format!("multipart: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("options_json", options_json);

        debug!("Submitting {} bytes to {}/pdf", document.len(), self.base_url);

        let response = self
            .authed(self.http.post(format!("{}/pdf", self.base_url)))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ConvertError::SubmitFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            let detail = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ConvertError::AuthRejected { detail });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConvertError::SubmitFailed {
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let body: SubmitResponse =
            response
                .json()
                .await
                .map_err(|e| ConvertError::MalformedResponse {
                    detail: format!("submission response: {e}"),
                })?;

        if let Some(error) = body.error {
            return Err(ConvertError::SubmitFailed { reason: error });
        }
        body.pdf_id.ok_or_else(|| ConvertError::MalformedResponse {
            detail: "submission response carried neither pdf_id nor error".into(),
        })
    }

    async fn poll(
        &self,
        job_id: &str,
        formats: &[OutputFormat],
    ) -> Result<PollOutcome, ConvertError> {
        let url = format!("{}/pdf/{}", self.base_url, job_id);
        let response = self
            .authed(self.http.get(&url))
            .send()
            .await
            .map_err(|e| ConvertError::PollFailed {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ConvertError::PollFailed {
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body: StatusResponse =
            response
                .json()
                .await
                .map_err(|e| ConvertError::MalformedResponse {
                    detail: format!("status response: {e}"),
                })?;

        match body.status.as_str() {
            "completed" => {
                let mut result = ConversionResult::new();
                for &format in formats {
                    let content = self.fetch_format(job_id, format).await?;
                    result.insert(format, content);
                }
                Ok(PollOutcome::Complete(result))
            }
            "error" => {
                let reason = body
                    .error
                    .unwrap_or_else(|| "remote processing error".to_string());
                warn!("Job {job_id} failed remotely: {reason}");
                Ok(PollOutcome::Failed { reason })
            }
            // "loaded", "split", "processing", and anything the service
            // invents later all mean "not done yet" — unknown statuses are
            // never treated as failures.
            other => {
                debug!("Job {job_id}: status {other:?} ({:?}%)", body.percent_done);
                Ok(PollOutcome::Processing {
                    percent_done: body.percent_done,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_json_names_requested_formats_only() {
        let options =
            ProcessingOptions::for_formats(&[OutputFormat::Latex, OutputFormat::Markdown]);
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains(r#""tex":true"#), "got: {json}");
        assert!(json.contains(r#""md":true"#), "got: {json}");
        assert!(!json.contains("html"), "got: {json}");
        assert!(json.contains(r#""math_inline_delimiters":["$","$"]"#));
    }

    #[test]
    fn submit_response_parses_both_shapes() {
        let ok: SubmitResponse = serde_json::from_str(r#"{"pdf_id":"abc123"}"#).unwrap();
        assert_eq!(ok.pdf_id.as_deref(), Some("abc123"));
        assert!(ok.error.is_none());

        let err: SubmitResponse =
            serde_json::from_str(r#"{"error":"invalid request"}"#).unwrap();
        assert!(err.pdf_id.is_none());
        assert_eq!(err.error.as_deref(), Some("invalid request"));
    }

    #[test]
    fn status_response_tolerates_extra_fields() {
        let body = r#"{
            "status": "processing",
            "percent_done": 42.5,
            "num_pages": 10,
            "num_pages_completed": 4
        }"#;
        let parsed: StatusResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "processing");
        assert_eq!(parsed.percent_done, Some(42.5));
    }

    #[test]
    fn client_strips_trailing_slash_from_base_url() {
        let client = MathpixClient::new(
            Credentials::new("id", "key"),
            "https://api.example.test/v3/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.example.test/v3");
    }
}
