//! Configuration types for a conversion run.
//!
//! All behaviour is controlled through [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs, log them, and diff two runs.
//!
//! # Credentials are a value, not ambient state
//!
//! The remote service authenticates with an application id/key pair.
//! [`Credentials`] is an explicitly-constructed value handed to the client
//! at construction time; nothing inside the pipeline reads the process
//! environment. [`Credentials::from_env`] exists for the common case and is
//! called exactly once, at the edge, when no credentials were configured.

use crate::error::ConvertError;
use crate::job::OutputFormat;
use crate::pricing::CostEstimate;
use crate::progress::ProgressHandle;
use crate::remote::RecognitionService;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the application id.
pub const ENV_APP_ID: &str = "MATHPIX_APP_ID";
/// Environment variable holding the application key.
pub const ENV_APP_KEY: &str = "MATHPIX_APP_KEY";

/// Default endpoint of the recognition service.
pub const DEFAULT_BASE_URL: &str = "https://api.mathpix.com/v3";

/// Gate called with the cost estimate before submission; `false` aborts.
pub type ConfirmGate = Arc<dyn Fn(&CostEstimate) -> bool + Send + Sync>;

/// Credential pair for the recognition service.
#[derive(Clone)]
pub struct Credentials {
    pub app_id: String,
    pub app_key: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_key: app_key.into(),
        }
    }

    /// Load credentials from the process environment, reading a `.env` file
    /// first if one is present.
    pub fn from_env() -> Result<Self, ConvertError> {
        // A missing .env file is fine; real env vars still apply.
        dotenvy::dotenv().ok();

        let app_id = std::env::var(ENV_APP_ID).ok().filter(|v| !v.is_empty());
        let app_key = std::env::var(ENV_APP_KEY).ok().filter(|v| !v.is_empty());

        match (app_id, app_key) {
            (Some(app_id), Some(app_key)) => Ok(Self { app_id, app_key }),
            _ => Err(ConvertError::MissingCredentials),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The key never appears in logs.
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .finish()
    }
}

/// Configuration for one conversion run.
///
/// Built via [`ConversionConfig::builder()`] or
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2notes::{ConversionConfig, OutputFormat};
///
/// let config = ConversionConfig::builder()
///     .formats(vec![OutputFormat::Latex, OutputFormat::Markdown])
///     .poll_interval_secs(2)
///     .max_wait_secs(600)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Output renderings to request. Deduplicated, canonical order.
    /// Default: all three (tex, md, html).
    pub formats: Vec<OutputFormat>,

    /// Delay between status polls. Default: 2 s.
    pub poll_interval: Duration,

    /// Maximum total time to wait for the remote job. Default: 600 s.
    ///
    /// Exceeding this yields [`ConvertError::Timeout`]; the remote job is
    /// left in whatever state the service had it in.
    pub max_wait: Duration,

    /// Root under which the timestamped manifest directory is created.
    /// Default: `processed_notes`.
    pub output_dir: PathBuf,

    /// Base URL of the recognition service. Default: [`DEFAULT_BASE_URL`].
    /// Overridable so tests can point the production client at a local
    /// server.
    pub base_url: String,

    /// Explicit credentials. If `None`, [`Credentials::from_env`] is
    /// consulted when the client is constructed.
    pub credentials: Option<Credentials>,

    /// Pre-constructed service. Takes precedence over `credentials` /
    /// `base_url`; this is the seam the test suite fakes.
    pub service: Option<Arc<dyn RecognitionService>>,

    /// Progress reporter. Default: none (no-op).
    pub progress: Option<ProgressHandle>,

    /// Cost-confirmation gate, called after the estimate and before any
    /// network call. `None` means proceed unconditionally.
    pub confirm: Option<ConfirmGate>,

    /// Per-HTTP-request timeout. Default: 30 s.
    pub http_timeout: Duration,

    /// Download timeout for URL inputs. Default: 120 s.
    pub download_timeout: Duration,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            formats: OutputFormat::ALL.to_vec(),
            poll_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(600),
            output_dir: PathBuf::from("processed_notes"),
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: None,
            service: None,
            progress: None,
            confirm: None,
            http_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(120),
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("formats", &self.formats)
            .field("poll_interval", &self.poll_interval)
            .field("max_wait", &self.max_wait)
            .field("output_dir", &self.output_dir)
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("service", &self.service.as_ref().map(|_| "<dyn RecognitionService>"))
            .field("progress", &self.progress.as_ref().map(|_| "<dyn ConversionProgress>"))
            .field("confirm", &self.confirm.as_ref().map(|_| "<gate>"))
            .field("http_timeout", &self.http_timeout)
            .field("download_timeout", &self.download_timeout)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn formats(mut self, formats: Vec<OutputFormat>) -> Self {
        self.config.formats = formats;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn poll_interval_secs(self, secs: u64) -> Self {
        self.poll_interval(Duration::from_secs(secs))
    }

    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.config.max_wait = max_wait;
        self
    }

    pub fn max_wait_secs(self, secs: u64) -> Self {
        self.max_wait(Duration::from_secs(secs))
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    pub fn service(mut self, service: Arc<dyn RecognitionService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn progress(mut self, progress: ProgressHandle) -> Self {
        self.config.progress = Some(progress);
        self
    }

    pub fn confirm(mut self, gate: ConfirmGate) -> Self {
        self.config.confirm = Some(gate);
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout = Duration::from_secs(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout = Duration::from_secs(secs);
        self
    }

    /// Build the configuration, validating constraints and normalising the
    /// format list (sorted, deduplicated).
    pub fn build(mut self) -> Result<ConversionConfig, ConvertError> {
        self.config.formats.sort_unstable();
        self.config.formats.dedup();

        if self.config.formats.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "at least one output format is required".into(),
            ));
        }
        if self.config.poll_interval.is_zero() {
            return Err(ConvertError::InvalidConfig(
                "poll interval must be non-zero".into(),
            ));
        }
        if self.config.max_wait < self.config.poll_interval {
            return Err(ConvertError::InvalidConfig(format!(
                "max wait ({:?}) must be at least the poll interval ({:?})",
                self.config.max_wait, self.config.poll_interval
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requests_all_formats() {
        let config = ConversionConfig::default();
        assert_eq!(config.formats, OutputFormat::ALL.to_vec());
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.max_wait, Duration::from_secs(600));
        assert_eq!(config.output_dir, PathBuf::from("processed_notes"));
    }

    #[test]
    fn builder_dedups_and_sorts_formats() {
        let config = ConversionConfig::builder()
            .formats(vec![
                OutputFormat::Html,
                OutputFormat::Latex,
                OutputFormat::Html,
            ])
            .build()
            .unwrap();
        assert_eq!(config.formats, vec![OutputFormat::Latex, OutputFormat::Html]);
    }

    #[test]
    fn empty_formats_rejected() {
        let err = ConversionConfig::builder()
            .formats(vec![])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let err = ConversionConfig::builder()
            .poll_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn max_wait_shorter_than_interval_rejected() {
        let err = ConversionConfig::builder()
            .poll_interval_secs(10)
            .max_wait_secs(5)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn credentials_debug_redacts_key() {
        let creds = Credentials::new("my-app", "sekrit");
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("my-app"));
        assert!(!dbg.contains("sekrit"));
    }
}
