//! Local page-count probe.
//!
//! The cost estimate needs a page count before anything is sent over the
//! network, so we parse the document locally with `lopdf`. Parsing is
//! CPU-bound and synchronous; it runs under `spawn_blocking` to stay off the
//! async executor's hot path.

use crate::error::ConvertError;
use std::path::Path;
use tracing::debug;

/// Count the pages of a local PDF.
pub async fn page_count(path: &Path) -> Result<u64, ConvertError> {
    let owned = path.to_path_buf();
    let count = tokio::task::spawn_blocking(move || {
        let doc = lopdf::Document::load(&owned).map_err(|e| ConvertError::ProbeFailed {
            path: owned.clone(),
            detail: e.to_string(),
        })?;
        Ok::<u64, ConvertError>(doc.get_pages().len() as u64)
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("probe task: {e}")))??;

    debug!("Probed {}: {} pages", path.display(), count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a minimal valid PDF with the given number of empty pages.
    fn minimal_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::with_capacity(pages);
        for _ in 0..pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save in-memory PDF");
        buf
    }

    #[tokio::test]
    async fn counts_pages_of_generated_pdf() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("three.pdf");
        std::fs::write(&path, minimal_pdf(3)).unwrap();

        assert_eq!(page_count(&path).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn unparseable_file_is_probe_failed() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("junk.pdf");
        std::fs::write(&path, b"%PDF-1.5 but then garbage").unwrap();

        let err = page_count(&path).await.unwrap_err();
        assert!(matches!(err, ConvertError::ProbeFailed { .. }), "got: {err}");
    }
}
