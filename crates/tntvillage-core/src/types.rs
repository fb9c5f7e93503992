//! Data types for the TNTVillage scraper
//!
//! This module contains the core data structures used throughout the library.
//! Externally visible types implement Serialize and Deserialize for JSON output.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Release list category on TNTVillage.
///
/// The numeric identifier is what the site expects in the `cat` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Serie TV
    #[default]
    SerieTv,
    /// Cartoni
    Cartoni,
    /// Anime
    Anime,
    /// Programmi e Film TV
    ProgrammiEFilmTv,
    /// Documentari
    Documentari,
    /// Every category
    All,
}

impl Category {
    /// Identifier used by the release list form.
    pub fn id(self) -> u32 {
        match self {
            Category::SerieTv => 29,
            Category::Cartoni => 8,
            Category::Anime => 7,
            Category::ProgrammiEFilmTv => 1,
            Category::Documentari => 14,
            Category::All => 0,
        }
    }
}

/// Search mode a batch of query strings belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    /// Periodic feed poll; per-result diagnostics are suppressed
    #[serde(rename = "RSS")]
    Rss,
    /// Whole-season search
    Season,
    /// Single-episode search
    Episode,
}

impl SearchMode {
    pub fn is_rss(self) -> bool {
        matches!(self, SearchMode::Rss)
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchMode::Rss => "RSS",
            SearchMode::Season => "Season",
            SearchMode::Episode => "Episode",
        };
        f.write_str(label)
    }
}

/// Ordered search strings grouped by mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub modes: Vec<(SearchMode, Vec<String>)>,
}

impl SearchParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mode with its search strings, keeping insertion order.
    pub fn mode<I, S>(mut self, mode: SearchMode, strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modes
            .push((mode, strings.into_iter().map(Into::into).collect()));
        self
    }

    /// Single Season-mode query, the common interactive case
    pub fn season(query: impl Into<String>) -> Self {
        Self::new().mode(SearchMode::Season, [query.into()])
    }
}

/// One release list request: query text, category and page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub category: Category,
    pub page: u32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, category: Category, page: u32) -> Self {
        Self {
            query: query.into(),
            category,
            page,
        }
    }

    /// Same query, different page
    pub fn at_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Form fields posted to the release list endpoint.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("srcrel", self.query.clone()),
            ("cat", self.category.id().to_string()),
            ("page", self.page.to_string()),
        ]
    }
}

/// A release row as extracted from the HTML table, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    /// Title with non-breaking spaces and dots replaced by spaces
    pub title: String,
    /// Attachment id taken from the row's download link
    pub download_token: String,
    pub seeders: u32,
    pub leechers: u32,
    /// Declared size in bytes; the release list never exposes it
    pub size: Option<u64>,
}

/// A classified release handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub title: String,
    /// Resolved download URL
    pub link: String,
    /// Size in bytes, `None` when unknown
    pub size: Option<u64>,
    pub seeders: u32,
    pub leechers: u32,
    /// Info hash; TNTVillage does not publish one so this is always empty
    pub hash: String,
}

/// Walk progress for one search string.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    /// Page currently being processed (1-based)
    pub page: u32,
    /// Highest page number, known after the first fetch
    pub last_page: u32,
    /// Results accepted so far
    pub items: Vec<NormalizedResult>,
}

impl PageState {
    pub fn new(start_page: u32, last_page: u32) -> Self {
        Self {
            page: start_page,
            last_page,
            items: Vec::new(),
        }
    }
}

/// Sort results by seeders, highest first, keeping extraction order on ties.
pub fn rank_by_seeders(items: &mut [NormalizedResult]) {
    items.sort_by(|a, b| b.seeders.cmp(&a.seeders));
}
