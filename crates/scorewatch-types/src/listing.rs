//! Live match listing entries.

use serde::{Deserialize, Serialize};

/// One match on the live scores page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchListing {
    /// Position on the listing page (0-indexed).
    pub index: usize,
    /// Display title, cut at its first comma.
    pub title: String,
    /// Site-relative link to the match page.
    pub link: String,
}

impl MatchListing {
    /// Build a listing entry, shortening the raw title the way the listing
    /// menu shows it.
    pub fn new(index: usize, raw_title: &str, link: String) -> Self {
        Self {
            index,
            title: short_title(raw_title),
            link,
        }
    }
}

/// Keep the part of a listing title before its first comma.
pub fn short_title(raw: &str) -> String {
    raw.split(',').next().unwrap_or_default().trim().to_owned()
}
