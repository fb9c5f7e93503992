//! TNTVillage Scraper Core Library
//!
//! This crate searches the TNTVillage release list and turns its HTML
//! tables into ranked, classified release candidates.
//!
//! # Features
//! - Walk every page of a release list search
//! - Infer release quality from loosely written tags
//! - Detect Italian/English audio and subtitle-only releases
//! - Recognize season packs against a local episode library
//! - Rate-limited HTTP client to avoid server overload

pub mod client;
pub mod config;
pub mod detect;
pub mod episodes;
pub mod error;
pub mod names;
pub mod parser;
pub mod provider;
pub mod quality;
pub mod types;

// Re-export main types for convenience
pub use client::{ClientConfig, PageFetcher, RateLimiter, TntClient};
pub use config::{load_config, load_config_from_str, Config, ConfigError, ProviderConfig, SiteUrls};
pub use episodes::{EpisodeCounter, EpisodeIndex, SqliteEpisodeIndex};
pub use error::{Result, TntError};
pub use names::{NameParseError, NameParser, ParsedName, SceneNameParser, ShowEntry};
pub use provider::{proper_search_strings, TntVillageProvider, WalkAborted, PROPER_STRINGS};
pub use quality::QualityTier;
pub use types::{
    Category, NormalizedResult, PageState, RawCandidate, SearchMode, SearchParams, SearchQuery,
};
