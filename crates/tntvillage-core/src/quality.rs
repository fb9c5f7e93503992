//! Release quality classification
//!
//! TNTVillage tags describe encodings loosely ("720p - H264 - Ita Ac3",
//! "DVDMux XviD", "BDMux 1080p"). This module maps those tags to a coarse
//! [`QualityTier`], renders a tier back into a scene-style fragment, and
//! recognizes scene-style quality markers already present in a release name.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Coarse quality tier of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    SdTv,
    SdDvd,
    HdTv,
    FullHdTv,
    RawHdTv,
    HdWebDl,
    FullHdWebDl,
    HdBluRay,
    FullHdBluRay,
    Unknown,
}

impl QualityTier {
    /// Every tier except `Unknown`
    pub const KNOWN: [QualityTier; 9] = [
        QualityTier::SdTv,
        QualityTier::SdDvd,
        QualityTier::HdTv,
        QualityTier::FullHdTv,
        QualityTier::RawHdTv,
        QualityTier::HdWebDl,
        QualityTier::FullHdWebDl,
        QualityTier::HdBluRay,
        QualityTier::FullHdBluRay,
    ];
}

const DVD_MARKERS: &[&str] = &["dvd", "dvdrip", "dvdmux", "dvd9", "dvd5"];
const BLURAY_MARKERS: &[&str] = &["bd", "bdmux", "bdrip", "brrip", "bluray"];
const SD_MARKERS: &[&str] = &[
    "h264", "divx", "xvid", "tv", "tvrip", "satrip", "dttrip", "mpeg2",
];
const HD_MARKERS: &[&str] = &["720p"];
const FULL_HD_MARKERS: &[&str] = &["1080p", "fullhd"];
const WEBDL_MARKERS: &[&str] = &[
    "webdl",
    "webmux",
    "webrip",
    "dl-webmux",
    "web-dlmux",
    "webdl-mux",
    "web-dl",
    "webdlmux",
    "dlmux",
];

/// Outcome of the six marker probes over one tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Probes {
    dvd: bool,
    bluray: bool,
    sd: bool,
    hd: bool,
    full_hd: bool,
    webdl: bool,
}

impl Probes {
    fn run(text: &str) -> Self {
        let lower = text.to_lowercase();
        let any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

        Self {
            dvd: any(DVD_MARKERS),
            bluray: any(BLURAY_MARKERS),
            sd: any(SD_MARKERS),
            hd: any(HD_MARKERS),
            full_hd: any(FULL_HD_MARKERS),
            webdl: any(WEBDL_MARKERS),
        }
    }
}

type Rule = (fn(&Probes) -> bool, QualityTier);

/// Decision table, evaluated top to bottom; the first matching rule wins.
/// The probes overlap, so the explicit negations here are load-bearing.
const TAG_RULES: &[Rule] = &[
    (|p: &Probes| p.sd && !p.dvd && !p.full_hd && !p.hd, QualityTier::SdTv),
    (|p: &Probes| p.dvd, QualityTier::SdDvd),
    (|p: &Probes| p.hd && !p.bluray && !p.full_hd && !p.webdl, QualityTier::HdTv),
    (|p: &Probes| p.full_hd && !p.hd && !p.bluray && !p.webdl, QualityTier::FullHdTv),
    (|p: &Probes| p.hd && !p.bluray && !p.full_hd && p.webdl, QualityTier::HdWebDl),
    (|p: &Probes| p.full_hd && !p.hd && !p.bluray && p.webdl, QualityTier::FullHdWebDl),
    (|p: &Probes| p.bluray && p.hd && !p.full_hd, QualityTier::HdBluRay),
    (|p: &Probes| p.bluray && p.full_hd && !p.hd, QualityTier::FullHdBluRay),
];

/// Infer the quality tier from a release tag.
///
/// Matching is case-insensitive substring search; text matching no rule
/// yields [`QualityTier::Unknown`].
///
/// # Examples
/// ```
/// use tntvillage_core::quality::{infer_quality, QualityTier};
///
/// assert_eq!(infer_quality("[DVDMux XviD - Ita]"), QualityTier::SdDvd);
/// assert_eq!(infer_quality("[720p - H264 - Ita Ac3]"), QualityTier::HdTv);
/// assert_eq!(infer_quality("[BDMux 1080p - Ita Eng]"), QualityTier::FullHdBluRay);
/// assert_eq!(infer_quality("nothing useful"), QualityTier::Unknown);
/// ```
pub fn infer_quality(text: &str) -> QualityTier {
    let probes = Probes::run(text);
    TAG_RULES
        .iter()
        .find(|(matches, _)| matches(&probes))
        .map(|(_, tier)| *tier)
        .unwrap_or(QualityTier::Unknown)
}

/// Scene-style fragment appended to a title to carry its quality.
///
/// `Unknown` renders to an empty string.
pub fn render_quality_suffix(tier: QualityTier) -> &'static str {
    match tier {
        QualityTier::SdTv => " HDTV x264",
        QualityTier::SdDvd => " DVDRIP",
        QualityTier::HdTv => " 720p HDTV x264",
        QualityTier::FullHdTv => " 1080p HDTV x264",
        QualityTier::RawHdTv => " 1080i HDTV mpeg2",
        QualityTier::HdWebDl => " 720p WEB-DL h264",
        QualityTier::FullHdWebDl => " 1080p WEB-DL h264",
        QualityTier::HdBluRay => " 720p Bluray x264",
        QualityTier::FullHdBluRay => " 1080p Bluray x264",
        QualityTier::Unknown => "",
    }
}

const SD_SOURCE: &str = r"(?i)\b(hdtv|pdtv|dsr|tvrip|satrip|dttrip)\b";
const SD_CODEC: &str = r"(?i)\b(xvid|divx|x264|h\.?264)\b";
const BLURAY: &str = r"(?i)\bblu-?ray\b";
const WEB: &str = r"(?i)\b(web-?dl|webrip|webmux|web-?dlmux)\b";
const HDTV: &str = r"(?i)\bhdtv\b";
const P720: &str = r"(?i)\b720p\b";
const P1080: &str = r"(?i)\b1080p\b";

/// Scene naming rules: every pattern of a rule must match.
static NAME_RULES: Lazy<Vec<(Vec<Regex>, QualityTier)>> = Lazy::new(|| {
    let table: &[(&[&str], QualityTier)] = &[
        (&[r"(?i)\b1080i\b", HDTV, r"(?i)\bmpeg-?2\b"], QualityTier::RawHdTv),
        (&[P1080, BLURAY], QualityTier::FullHdBluRay),
        (&[P720, BLURAY], QualityTier::HdBluRay),
        (&[P1080, WEB], QualityTier::FullHdWebDl),
        (&[P720, WEB], QualityTier::HdWebDl),
        (&[P1080, HDTV], QualityTier::FullHdTv),
        (&[P720, HDTV], QualityTier::HdTv),
        (&[r"(?i)\b(dvd|b[rd])rip\b"], QualityTier::SdDvd),
        (&[SD_SOURCE, SD_CODEC], QualityTier::SdTv),
    ];

    table
        .iter()
        .map(|(patterns, tier)| {
            let compiled: Vec<Regex> = patterns
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect();
            (compiled, *tier)
        })
        .collect()
});

/// Quality carried by a scene-style release name.
///
/// Used to decide whether a title already advertises its quality; a name
/// with no recognizable markers is [`QualityTier::Unknown`].
pub fn name_quality(name: &str) -> QualityTier {
    NAME_RULES
        .iter()
        .find(|(patterns, _)| !patterns.is_empty() && patterns.iter().all(|re| re.is_match(name)))
        .map(|(_, tier)| *tier)
        .unwrap_or(QualityTier::Unknown)
}
