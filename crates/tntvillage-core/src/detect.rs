//! Language and scope detection
//!
//! Pure checks over a release title and its bracketed tag: Italian audio,
//! English audio, and whether the release bundles a whole season.

use tracing::{debug, warn};

use crate::episodes::EpisodeCounter;
use crate::names::NameParser;

/// Markers announcing that a release carries subtitles
const SUBTITLE_MARKERS: &[&str] = &["sub", "softsub"];

/// Characters that may surround an isolated language token
const TOKEN_SEPARATORS: &[char] = &[' ', '-', '_', '.', '|', '[', ']', '(', ')'];

/// Placeholder the site uses for a missing field
const MISSING: &str = "None";

fn is_missing(value: &str) -> bool {
    value.is_empty() || value == MISSING
}

/// True when `needle` occurs in `haystack` with a separator (or the string
/// edge) on both sides.
fn has_isolated_token(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| TOKEN_SEPARATORS.contains(&c));
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| TOKEN_SEPARATORS.contains(&c));
        before_ok && after_ok
    })
}

/// Whether a release has Italian audio.
///
/// When the tag mentions subtitles, only the part of the tag before the
/// subtitle marker describes the audio, and there `ita` must be a separate
/// token ("Ita Eng - Sub Eng"). Without any subtitle marker a plain `ita`
/// anywhere in the tag is enough.
///
/// # Examples
/// ```
/// use tntvillage_core::detect::is_italian;
///
/// assert!(is_italian("Show S01E01", "[720p - H264 - Ita Eng - Sub Ita]"));
/// assert!(is_italian("Show", "ITA 720p"));
/// assert!(!is_italian("Show", "[720p - Eng - Sub Ita]"));
/// assert!(!is_italian("Show S01E01", "None"));
/// ```
pub fn is_italian(title: &str, tag: &str) -> bool {
    if is_missing(title) || is_missing(tag) {
        return false;
    }

    let lower = tag.to_lowercase();
    let mut subtitled = false;

    for marker in SUBTITLE_MARKERS {
        let Some(pos) = lower.find(marker) else {
            continue;
        };
        subtitled = true;

        if has_isolated_token(&lower[..pos], "ita") {
            debug!(title = title, "Found Italian release");
            return true;
        }
    }

    if !subtitled && lower.contains("ita") {
        debug!(title = title, "Found Italian release");
        return true;
    }

    false
}

/// Whether a release mentions English audio or subtitles.
///
/// Plain case-insensitive substring check on the tag.
pub fn is_english(title: &str, tag: &str) -> bool {
    if is_missing(title) || is_missing(tag) {
        return false;
    }

    let english = tag.to_lowercase().contains("eng");
    if english {
        debug!(title = title, "Found English release");
    }
    english
}

/// Whether a release covers every known episode of its season.
///
/// Names that cannot be resolved, and library lookups that fail, count as
/// "not a season pack". The answer is only as good as the local library: a
/// stale episode list misclassifies releases.
pub fn is_season_pack(title: &str, names: &dyn NameParser, episodes: &dyn EpisodeCounter) -> bool {
    let parsed = match names.parse(title) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(title = title, error = %e, "Release name not resolved");
            return false;
        }
    };

    match episodes.count_episodes(parsed.show_id, parsed.season) {
        Ok(known) => known == parsed.episodes.len(),
        Err(e) => {
            warn!(
                show_id = parsed.show_id,
                season = parsed.season,
                error = %e,
                "Episode count lookup failed"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episodes::EpisodeIndex;
    use crate::error::{Result, TntError};
    use crate::names::{SceneNameParser, ShowEntry};

    struct BrokenLibrary;

    impl EpisodeCounter for BrokenLibrary {
        fn count_episodes(&self, _show_id: u64, _season: u32) -> Result<usize> {
            Err(TntError::Database(rusqlite::Error::InvalidQuery))
        }
    }

    fn names() -> SceneNameParser {
        SceneNameParser::new(vec![ShowEntry::new(7, "Show")])
    }

    #[test]
    fn test_is_italian_placeholder_and_empty() {
        assert!(!is_italian("Show S01E01", "None"));
        assert!(!is_italian("Show S01E01", ""));
        assert!(!is_italian("", "[Ita]"));
        assert!(!is_italian("None", "[Ita]"));
    }

    #[test]
    fn test_is_italian_bare_ita() {
        assert!(is_italian("Show", "ITA 720p"));
        assert!(is_italian("Show", "[DVDMux XviD - Italian]"));
    }

    #[test]
    fn test_is_italian_audio_before_subtitles() {
        assert!(is_italian("Show", "[720p - H264 - Ita Eng Ac3 - Sub Ita Eng]"));
        assert!(is_italian("Show", "[Ita|Eng SoftSub]"));
    }

    #[test]
    fn test_is_italian_subtitles_only() {
        // "ita" after the subtitle marker names the subtitle language
        assert!(!is_italian("Show", "ENG SUB ITA"));
        assert!(!is_italian("Show", "[720p - Eng Ac3 - Sub Ita]"));
    }

    #[test]
    fn test_is_italian_requires_isolated_token_with_subtitles() {
        // "vita" is not an audio tag
        assert!(!is_italian("Show", "[vitamin Sub Ita]"));
    }

    #[test]
    fn test_is_english() {
        assert!(is_english("Show", "ENG"));
        assert!(is_english("Show", "[720p - Ita Eng]"));
        assert!(!is_english("Show", ""));
        assert!(!is_english("Show", "None"));
        assert!(!is_english("Show", "[720p - Ita]"));
    }

    #[test]
    fn test_is_season_pack_full_season() {
        let library = EpisodeIndex::new().with_season(7, 1, 6);
        assert!(is_season_pack("Show S01E01-E06", &names(), &library));
    }

    #[test]
    fn test_is_season_pack_partial_season() {
        let library = EpisodeIndex::new().with_season(7, 1, 10);
        assert!(!is_season_pack("Show S01E01-E06", &names(), &library));
        assert!(!is_season_pack("Show S01E03", &names(), &library));
    }

    #[test]
    fn test_is_season_pack_unknown_show() {
        let library = EpisodeIndex::new().with_season(7, 1, 1);
        assert!(!is_season_pack("Other S01E01", &names(), &library));
    }

    #[test]
    fn test_is_season_pack_lookup_failure() {
        assert!(!is_season_pack("Show S01E01-E06", &names(), &BrokenLibrary));
    }
}
