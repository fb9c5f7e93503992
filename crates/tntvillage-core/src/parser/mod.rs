//! HTML parsers for TNTVillage pages
//!
//! - `releases`: pagination control and release table of the release list

pub mod releases;

// Re-export main parsing functions
pub use releases::{
    download_token, normalize_title, parse_last_page, parse_releases, ReleaseTable, MAX_LAST_PAGE,
};
