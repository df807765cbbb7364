//! Failures that end a scrape attempt.
//!
//! Everything else (a missing optional field, a bad spec row, a broken image
//! node) is contained where it happens and shows up as [`Field::NotFound`]
//! or a shorter list in the record.
//!
//! [`Field::NotFound`]: crate::models::Field::NotFound

use thiserror::Error;

/// Why a scrape attempt produced no record.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The page never loaded.
    #[error("Failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// The page loaded but no title could be extracted. The title is the
    /// only mandatory field.
    #[error("Could not find a product title on {url}")]
    MissingTitle { url: String },
}

impl ScrapeError {
    /// Returns the URL of the failed attempt.
    pub fn url(&self) -> &str {
        match self {
            ScrapeError::Navigation { url, .. } | ScrapeError::MissingTitle { url } => url,
        }
    }
}
