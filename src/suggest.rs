//! Title suggestions for the guess input

use crate::domain::catalog::Catalog;

/// Default number of suggestions shown under the guess input
pub const DEFAULT_LIMIT: usize = 5;

pub struct SuggestionIndex;

impl SuggestionIndex {
    /// Titles containing `text` (case-insensitive), in catalog order, at most `limit` of them.
    ///
    /// Blank input yields nothing.
    pub fn query(text: &str, catalog: &Catalog, limit: usize) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let needle = text.to_lowercase();

        catalog
            .titles()
            .filter(|title| title.to_lowercase().contains(&needle))
            .take(limit)
            .map(str::to_string)
            .collect()
    }
}
