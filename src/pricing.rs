//! Cost estimation from page count.
//!
//! Two-tier **marginal** schedule: every page up to the threshold is billed
//! at the tier-1 rate, and only the pages beyond it at the cheaper tier-2
//! rate. A 40 001-page document therefore costs one tier-2 page more than a
//! 40 000-page one — there is no cliff where the whole document suddenly
//! re-prices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-page rate for pages 1..=[`TIER1_PAGE_CAP`], in dollars.
pub const TIER1_RATE: f64 = 0.025;
/// Per-page rate for pages beyond [`TIER1_PAGE_CAP`], in dollars.
pub const TIER2_RATE: f64 = 0.01;
/// Number of pages billed at the tier-1 rate.
pub const TIER1_PAGE_CAP: u64 = 40_000;

/// A derived, read-only price estimate. Recomputed fresh each run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Total pages in the document.
    pub pages: u64,
    /// Pages billed at [`TIER1_RATE`].
    pub tier1_pages: u64,
    /// Pages billed at [`TIER2_RATE`].
    pub tier2_pages: u64,
    /// Estimated total, in dollars.
    pub amount: f64,
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2} ({} pages)", self.amount, self.pages)
    }
}

/// Estimate the processing cost for a document of `pages` pages.
///
/// Pure function; `estimate(0)` is a valid zero-dollar estimate.
pub fn estimate(pages: u64) -> CostEstimate {
    let tier1_pages = pages.min(TIER1_PAGE_CAP);
    let tier2_pages = pages.saturating_sub(TIER1_PAGE_CAP);
    let amount = tier1_pages as f64 * TIER1_RATE + tier2_pages as f64 * TIER2_RATE;
    CostEstimate {
        pages,
        tier1_pages,
        tier2_pages,
        amount,
    }
}
