//! Reader configuration

use serde::{Deserialize, Serialize};

/// Default cap on pages followed per table
pub const DEFAULT_MAX_PAGES_PER_TABLE: usize = 100_000;

/// Default ceiling for a page's row count
pub const DEFAULT_MAX_ROWS_PER_PAGE: usize = 10_000;

/// Safety bounds applied while walking page chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Stop following `next_page` links after this many pages
    pub max_pages_per_table: usize,
    /// Pages claiming more rows than this are treated as empty
    pub max_rows_per_page: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_pages_per_table: DEFAULT_MAX_PAGES_PER_TABLE,
            max_rows_per_page: DEFAULT_MAX_ROWS_PER_PAGE,
        }
    }
}
