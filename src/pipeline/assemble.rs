//! Output assembly: persist a completed job's renderings to disk.
//!
//! Each run writes into its own `<output_dir>/<timestamp>/` directory, one
//! file per format with the canonical name (`notes.tex`, `notes.md`,
//! `notes.html`). A fresh timestamp never touches a prior run's directory;
//! re-running with the same timestamp and content rewrites the same bytes.
//!
//! Formats are written in canonical order and the first failure aborts the
//! pass. Files already written before a later failure are left in place —
//! there is no rollback.

use crate::error::ConvertError;
use crate::output::{ConversionResult, OutputManifest};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Format `now` as a manifest directory name (`YYYYmmdd_HHMMSS`).
pub fn run_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Write one file per format under `<output_dir>/<timestamp>/`.
pub async fn assemble(
    result: &ConversionResult,
    output_dir: &Path,
    timestamp: &str,
) -> Result<OutputManifest, ConvertError> {
    let dir = output_dir.join(timestamp);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ConvertError::WriteFailed {
            path: dir.clone(),
            source: e,
        })?;

    let mut files = BTreeMap::new();
    for (format, content) in result.iter() {
        let path = dir.join(format.file_name());
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ConvertError::WriteFailed {
                path: path.clone(),
                source: e,
            })?;
        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        files.insert(format, path);
    }

    info!("Assembled {} file(s) in {}", files.len(), dir.display());
    Ok(OutputManifest { dir, files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::OutputFormat;
    use tempfile::TempDir;

    fn two_format_result() -> ConversionResult {
        [
            (OutputFormat::Latex, "\\section{Notes}\n".to_string()),
            (OutputFormat::Markdown, "# Notes\n".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn writes_exactly_the_requested_formats() {
        let out = TempDir::new().unwrap();
        let manifest = assemble(&two_format_result(), out.path(), "20260806_120000")
            .await
            .unwrap();

        assert_eq!(manifest.dir, out.path().join("20260806_120000"));
        assert_eq!(manifest.files.len(), 2);

        let mut names: Vec<String> = std::fs::read_dir(&manifest.dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["notes.md", "notes.tex"]);

        let tex = std::fs::read_to_string(manifest.dir.join("notes.tex")).unwrap();
        assert_eq!(tex, "\\section{Notes}\n");
    }

    #[tokio::test]
    async fn fresh_timestamp_never_touches_prior_manifest() {
        let out = TempDir::new().unwrap();
        let first = assemble(&two_format_result(), out.path(), "20260806_120000")
            .await
            .unwrap();
        let before = std::fs::read_to_string(first.dir.join("notes.md")).unwrap();

        let mut changed = ConversionResult::new();
        changed.insert(OutputFormat::Markdown, "# Different\n".into());
        let second = assemble(&changed, out.path(), "20260806_130000")
            .await
            .unwrap();

        assert_ne!(first.dir, second.dir);
        let after = std::fs::read_to_string(first.dir.join("notes.md")).unwrap();
        assert_eq!(before, after);
        assert!(first.dir.join("notes.tex").exists());
    }

    #[tokio::test]
    async fn same_timestamp_rewrites_deterministically() {
        let out = TempDir::new().unwrap();
        let a = assemble(&two_format_result(), out.path(), "20260806_120000")
            .await
            .unwrap();
        let b = assemble(&two_format_result(), out.path(), "20260806_120000")
            .await
            .unwrap();

        assert_eq!(a.dir, b.dir);
        let content = std::fs::read_to_string(b.dir.join("notes.md")).unwrap();
        assert_eq!(content, "# Notes\n");
    }

    #[tokio::test]
    async fn unwritable_directory_is_write_failed() {
        let out = TempDir::new().unwrap();
        // A file where the manifest directory should go.
        std::fs::write(out.path().join("blocked"), b"file").unwrap();

        let err = assemble(&two_format_result(), &out.path().join("blocked"), "ts")
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::WriteFailed { .. }), "got: {err}");
    }

    #[test]
    fn timestamp_format_matches_manifest_convention() {
        use chrono::TimeZone;
        let dt = Local.with_ymd_and_hms(2026, 8, 6, 9, 5, 3).unwrap();
        assert_eq!(run_timestamp(dt), "20260806_090503");
    }
}
