//! TNTVillage search provider
//!
//! Walks every page of the release list for each search string, classifies
//! each row and returns the accepted releases ranked by seeders.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use thiserror::Error;
use tracing::{debug, error};

use crate::client::PageFetcher;
use crate::config::ProviderConfig;
use crate::detect::{is_english, is_italian, is_season_pack};
use crate::episodes::EpisodeCounter;
use crate::error::TntError;
use crate::names::{NameParser, ParsedName};
use crate::parser::{parse_last_page, parse_releases};
use crate::quality::{infer_quality, name_quality, render_quality_suffix, QualityTier};
use crate::types::{
    rank_by_seeders, NormalizedResult, PageState, RawCandidate, SearchMode, SearchParams,
    SearchQuery,
};

static SEASON_MARKER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[Ss]\d+").ok());
static EPISODE_MARKER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[Ee][\d-]+").ok());

/// Tags marking a re-release that replaces a broken one
pub const PROPER_STRINGS: &[&str] = &["PROPER", "REPACK"];

/// A search string whose page walk stopped early.
///
/// Carries whatever was accepted before the failure.
#[derive(Error, Debug)]
#[error("page walk aborted after {} results: {source}", .items.len())]
pub struct WalkAborted {
    pub items: Vec<NormalizedResult>,
    #[source]
    pub source: TntError,
}

/// Search provider for the TNTVillage release list.
///
/// # Example
/// ```no_run
/// use tntvillage_core::{
///     EpisodeIndex, ProviderConfig, SceneNameParser, SearchParams, ShowEntry, TntClient,
///     TntVillageProvider,
/// };
///
/// # async fn example() -> Result<(), tntvillage_core::TntError> {
/// let provider = TntVillageProvider::new(
///     TntClient::new()?,
///     SceneNameParser::new(vec![ShowEntry::new(1, "Show")]),
///     EpisodeIndex::new().with_season(1, 1, 10),
///     ProviderConfig::default(),
/// );
///
/// let results = provider.search(&SearchParams::season("Show S01"), 0, None).await;
/// for release in results {
///     println!("{} ({} seeders)", release.title, release.seeders);
/// }
/// # Ok(())
/// # }
/// ```
pub struct TntVillageProvider<F, N, E> {
    fetcher: F,
    names: N,
    episodes: E,
    config: ProviderConfig,
}

impl<F, N, E> TntVillageProvider<F, N, E>
where
    F: PageFetcher,
    N: NameParser,
    E: EpisodeCounter,
{
    pub fn new(fetcher: F, names: N, episodes: E, config: ProviderConfig) -> Self {
        Self {
            fetcher,
            names,
            episodes,
            config,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run every search string of every mode and collect the results.
    ///
    /// Each search string's results are ranked by seeders on their own and
    /// appended in order; results of different strings are not merged.
    /// Failures never escape: a string whose walk breaks contributes what it
    /// had gathered so far.
    ///
    /// `age` and `episode` are accepted for interface parity with other
    /// providers; the release list offers no way to filter on them.
    pub async fn search(
        &self,
        params: &SearchParams,
        age: u32,
        episode: Option<&ParsedName>,
    ) -> Vec<NormalizedResult> {
        debug!(age, episode = ?episode, "Starting TNTVillage search");
        let mut results = Vec::new();

        for (mode, search_strings) in &params.modes {
            debug!(mode = %mode, "Search mode");

            for search_string in search_strings {
                if search_string.is_empty() {
                    continue;
                }

                let search_string = search_string.replace('.', " ");
                debug!(search = %search_string, "Search string");

                let mut items = match self.walk(*mode, &search_string).await {
                    Ok(items) => items,
                    Err(aborted) => {
                        error!(
                            search = %search_string,
                            kept = aborted.items.len(),
                            error = %aborted.source,
                            "Failed parsing provider page"
                        );
                        aborted.items
                    }
                };

                rank_by_seeders(&mut items);
                results.extend(items);
            }
        }

        results
    }

    /// Walk all pages of one search string.
    ///
    /// A first page without readable pagination aborts the walk. Later pages
    /// that are missing or carry no release table are skipped, so in practice
    /// an aborted walk has gathered nothing.
    async fn walk(
        &self,
        mode: SearchMode,
        search_string: &str,
    ) -> Result<Vec<NormalizedResult>, WalkAborted> {
        let url = self.config.urls.search_page.as_str();
        let start = self.config.start_page;
        let query = SearchQuery::new(search_string, self.config.category, start);

        let Some(first_body) = self.fetcher.fetch(url, &query.form_fields()).await else {
            debug!(search = search_string, "No data returned from provider");
            return Ok(Vec::new());
        };

        let last_page = parse_last_page(&first_body).map_err(|source| WalkAborted {
            items: Vec::new(),
            source,
        })?;

        if last_page == 0 {
            debug!(search = search_string, "Data returned from provider does not contain any torrents");
            return Ok(Vec::new());
        }

        let mut state = PageState::new(start, last_page);
        let mut first_body = Some(first_body);

        for page in start..=last_page {
            state.page = page;

            let body = if page == start {
                first_body.take()
            } else {
                self.fetcher
                    .fetch(url, &query.at_page(page).form_fields())
                    .await
            };

            let Some(body) = body else {
                debug!(page, "No data returned from provider");
                continue;
            };

            let table = match parse_releases(&body) {
                Ok(table) => table,
                Err(source) => {
                    return Err(WalkAborted {
                        items: state.items,
                        source,
                    })
                }
            };

            debug!(
                page,
                last_page = state.last_page,
                found = table.row_count,
                "Inspecting page"
            );

            if table.row_count == 0 {
                debug!(page, "Data returned from provider does not contain any torrents");
                continue;
            }

            for candidate in table.candidates {
                if let Some(result) = self.normalize(mode, search_string, candidate) {
                    state.items.push(result);
                }
            }
        }

        Ok(state.items)
    }

    /// Classify and filter one extracted row.
    fn normalize(
        &self,
        mode: SearchMode,
        search_string: &str,
        candidate: RawCandidate,
    ) -> Option<NormalizedResult> {
        let RawCandidate {
            mut title,
            download_token,
            seeders,
            leechers,
            size,
        } = candidate;

        let tag = release_tag(&title).unwrap_or_default().to_string();
        let suffix = render_quality_suffix(infer_quality(&tag));

        if name_quality(&title) == QualityTier::Unknown {
            title.push_str(suffix);
        }

        if !is_italian(&title, &tag) && !self.config.subtitle {
            debug!(title = %title, "Torrent is subtitled, skipping");
            return None;
        }

        if self.config.english_release && !is_english(&title, &tag) {
            debug!(title = %title, "Torrent isn't english audio/subtitled, skipping");
            return None;
        }

        if let Some(rebuilt) = rebuild_title(search_string, &title, suffix) {
            title = rebuilt;
        }

        if title.is_empty() || download_token.is_empty() {
            return None;
        }
        let link = self.config.urls.download_url(&download_token);

        let bare_title = if suffix.is_empty() {
            title.clone()
        } else {
            title.replace(suffix, "")
        };
        if is_season_pack(&bare_title, &self.names, &self.episodes) {
            title = strip_episode_markers(&title);
        }

        if seeders < self.config.min_seeders || leechers < self.config.min_leechers {
            if !mode.is_rss() {
                debug!(
                    title = %title,
                    seeders,
                    leechers,
                    "Discarding torrent because it doesn't meet the minimum seeders or leechers"
                );
            }
            return None;
        }

        if !mode.is_rss() {
            debug!(title = %title, seeders, leechers, "Found result");
        }

        Some(NormalizedResult {
            title,
            link,
            size,
            seeders,
            leechers,
            hash: String::new(),
        })
    }
}

/// First bracketed segment of a title, brackets included.
pub fn release_tag(title: &str) -> Option<&str> {
    let start = title.find('[')?;
    let len = title[start..].find(']')?;
    Some(&title[start..=start + len])
}

/// Rebuild a title as `<search show> <season/episode token><suffix>`.
///
/// The show part comes from the search string (everything before its
/// season marker); the token is the title from its own season marker up to
/// the next space. `None` when the title carries no season marker.
pub fn rebuild_title(search_string: &str, title: &str, suffix: &str) -> Option<String> {
    let marker = SEASON_MARKER.as_ref()?;

    let show = match marker.find(search_string) {
        Some(m) => &search_string[..m.start()],
        None => search_string,
    };

    let found = marker.find(title)?;
    let token = title[found.start()..]
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_uppercase();

    let show = show.trim();
    if show.is_empty() {
        Some(format!("{}{}", token, suffix))
    } else {
        Some(format!("{} {}{}", show, token, suffix))
    }
}

/// Search strings looking for re-releases of `search_string`, one per
/// entry of [`PROPER_STRINGS`].
pub fn proper_search_strings(search_string: &str) -> Vec<String> {
    let base = search_string.trim();
    PROPER_STRINGS
        .iter()
        .map(|tag| format!("{} {}", base, tag))
        .collect()
}

/// Remove episode markers so a title reads as a season release.
pub fn strip_episode_markers(title: &str) -> String {
    match EPISODE_MARKER.as_ref() {
        Some(re) => re.replace_all(title, "").into_owned(),
        None => title.to_string(),
    }
}
