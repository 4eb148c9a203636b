//! Result and output types: what a completed job yields, and what the
//! assembler writes to disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::job::{ConversionJob, OutputFormat};
use crate::pricing::CostEstimate;

/// The payload of a completed job: one rendering per requested format.
///
/// Lives only long enough to be persisted by the assembler. The map is a
/// `BTreeMap` so iteration follows the canonical format order
/// (tex, md, html) deterministically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionResult {
    contents: BTreeMap<OutputFormat, String>,
}

impl ConversionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, format: OutputFormat, content: String) {
        self.contents.insert(format, content);
    }

    pub fn get(&self, format: OutputFormat) -> Option<&str> {
        self.contents.get(&format).map(String::as_str)
    }

    /// Formats present, in canonical order.
    pub fn formats(&self) -> Vec<OutputFormat> {
        self.contents.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OutputFormat, &str)> {
        self.contents.iter().map(|(f, c)| (*f, c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

impl FromIterator<(OutputFormat, String)> for ConversionResult {
    fn from_iter<T: IntoIterator<Item = (OutputFormat, String)>>(iter: T) -> Self {
        Self {
            contents: iter.into_iter().collect(),
        }
    }
}

/// The on-disk product of one successful job: a timestamp-named directory
/// and the files written into it, one per format. Never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputManifest {
    /// `<output_dir>/<timestamp>`
    pub dir: PathBuf,
    /// Written files, keyed by format, in canonical order.
    pub files: BTreeMap<OutputFormat, PathBuf>,
}

/// Per-stage wall-clock timings and counters for one run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Pages reported by the local probe.
    pub page_count: u64,
    /// Number of status polls issued.
    pub polls: u32,
    pub submit_ms: u64,
    pub poll_ms: u64,
    pub assemble_ms: u64,
    pub total_ms: u64,
}

/// Everything the driver can tell you about a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub job: ConversionJob,
    pub estimate: CostEstimate,
    pub manifest: OutputManifest,
    pub stats: RunStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_iterates_in_canonical_order() {
        let mut result = ConversionResult::new();
        result.insert(OutputFormat::Html, "<p>hi</p>".into());
        result.insert(OutputFormat::Latex, "\\section{Hi}".into());
        result.insert(OutputFormat::Markdown, "# Hi".into());

        let formats: Vec<OutputFormat> = result.iter().map(|(f, _)| f).collect();
        assert_eq!(formats, OutputFormat::ALL.to_vec());
    }

    #[test]
    fn result_insert_overwrites() {
        let mut result = ConversionResult::new();
        result.insert(OutputFormat::Markdown, "old".into());
        result.insert(OutputFormat::Markdown, "new".into());
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(OutputFormat::Markdown), Some("new"));
        assert_eq!(result.get(OutputFormat::Latex), None);
    }
}
