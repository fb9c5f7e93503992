//! Release name resolution
//!
//! Turns a scene-style release name ("Show S01E01-E06 720p HDTV x264") into
//! a known show, a season number and the episode numbers it covers.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a release name could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameParseError {
    /// No season/episode marker could be found
    #[error("Unable to parse release name: {0}")]
    InvalidName(String),

    /// The show part does not match any known show
    #[error("Unknown show: {0}")]
    InvalidShow(String),

    /// The show part matches more than one known show
    #[error("Ambiguous show name: {0}")]
    AmbiguousShow(String),
}

/// A resolved release name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
    /// Indexer id of the matched show
    pub show_id: u64,
    pub show_name: String,
    pub season: u32,
    /// Episode numbers, in the order they appear (ranges expanded)
    pub episodes: Vec<u32>,
}

/// Resolves release names to show identities.
pub trait NameParser: Send + Sync {
    fn parse(&self, name: &str) -> Result<ParsedName, NameParseError>;
}

/// A show known to the local library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowEntry {
    pub id: u64,
    pub name: String,
}

impl ShowEntry {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

static RELEASE_NAME: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<show>.+?)[ ._-]+s(?P<season>\d{1,2})(?P<episodes>(?:e\d{1,3}|-e?\d{1,3})*)(?:[ ._\[(-]|$)",
    )
    .ok()
});

static EPISODE_TOKEN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(-)?e?(\d{1,3})").ok());

/// Scene-name parser matching shows against a fixed registry.
///
/// Understands `SxxEyy`, `SxxEyyEzz`, `SxxEyy-Ezz`, `SxxEyy-zz` and
/// season-only `Sxx` markers.
#[derive(Debug, Clone, Default)]
pub struct SceneNameParser {
    shows: Vec<ShowEntry>,
}

impl SceneNameParser {
    pub fn new(shows: Vec<ShowEntry>) -> Self {
        Self { shows }
    }

    /// Register one more show
    pub fn add_show(&mut self, show: ShowEntry) {
        self.shows.push(show);
    }

    fn resolve_show(&self, raw: &str) -> Result<&ShowEntry, NameParseError> {
        let wanted = normalize_show_name(raw);
        let mut matches = self
            .shows
            .iter()
            .filter(|show| normalize_show_name(&show.name) == wanted);

        let first = matches
            .next()
            .ok_or_else(|| NameParseError::InvalidShow(raw.trim().to_string()))?;

        if matches.any(|other| other.id != first.id) {
            return Err(NameParseError::AmbiguousShow(raw.trim().to_string()));
        }

        Ok(first)
    }
}

impl NameParser for SceneNameParser {
    fn parse(&self, name: &str) -> Result<ParsedName, NameParseError> {
        let invalid = || NameParseError::InvalidName(name.to_string());

        let re = RELEASE_NAME.as_ref().ok_or_else(invalid)?;
        let caps = re.captures(name.trim()).ok_or_else(invalid)?;

        let show = self.resolve_show(&caps["show"])?;
        let season = caps["season"].parse().map_err(|_| invalid())?;
        let episodes = parse_episode_numbers(&caps["episodes"]);

        Ok(ParsedName {
            show_id: show.id,
            show_name: show.name.clone(),
            season,
            episodes,
        })
    }
}

/// Expand an episode marker tail ("E01-E06", "E01E02", "E03-05") into numbers.
pub fn parse_episode_numbers(marker: &str) -> Vec<u32> {
    let Some(re) = EPISODE_TOKEN.as_ref() else {
        return Vec::new();
    };

    let mut episodes: Vec<u32> = Vec::new();
    for caps in re.captures_iter(marker) {
        let Ok(number) = caps[2].parse::<u32>() else {
            continue;
        };
        let is_range = caps.get(1).is_some();

        match episodes.last().copied() {
            Some(previous) if is_range && number > previous => {
                episodes.extend(previous + 1..=number);
            }
            _ => episodes.push(number),
        }
    }

    episodes
}

/// Lowercase, treat dots/dashes/underscores as spaces, collapse whitespace.
fn normalize_show_name(name: &str) -> String {
    name.to_lowercase()
        .replace(['.', '_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
