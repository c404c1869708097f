//! Core data types for extracted media records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier taken from the page URL (`/minitv/tp/<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub String);

impl PageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized description of one playable item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: ContentKind,
    pub duration: Option<u64>,
    pub webpage_url: String,
    pub formats: Vec<Format>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subtitles: Option<Subtitles>,
}

impl MediaRecord {
    /// The preferred format. Formats are kept best first.
    pub fn best_format(&self) -> Option<&Format> {
        self.formats.first()
    }

    /// Episode details, if this record is part of a series.
    pub fn episode(&self) -> Option<&EpisodeInfo> {
        match &self.kind {
            ContentKind::Episode(info) => Some(info),
            ContentKind::Standalone => None,
        }
    }
}

/// Whether the item stands alone or belongs to a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentKind {
    Standalone,
    Episode(EpisodeInfo),
}

/// Series placement of an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    pub series: String,
    pub season: Option<String>,
    pub season_number: Option<u64>,
    /// Episode title. The provider only exposes the content name, so this
    /// always equals the record title.
    pub episode: String,
    pub episode_number: Option<u64>,
}

/// One playable encoding variant from the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Format {
    pub format_id: String,
    pub url: String,
    pub manifest_url: String,
    pub ext: String,
    pub protocol: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    /// Total bitrate in kbit/s.
    pub tbr: Option<f64>,
    /// Audio sampling rate in Hz.
    pub asr: Option<u32>,
    pub vcodec: String,
    pub acodec: String,
    pub language: Option<String>,
    /// Fragment addressing when the representation is segmented.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub segments: Option<Segments>,
}

impl Format {
    pub fn has_video(&self) -> bool {
        self.vcodec != "none"
    }

    pub fn has_audio(&self) -> bool {
        self.acodec != "none"
    }
}

/// How a segmented representation addresses its fragments. All URLs are
/// absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "addressing", rename_all = "snake_case")]
pub enum Segments {
    /// `SegmentTemplate` addressing. `$RepresentationID$` and `$Bandwidth$`
    /// are already filled in; `$Number$` and `$Time$` are left for the
    /// downloader.
    Template {
        initialization: Option<String>,
        media: String,
        start_number: u64,
        timescale: u64,
        duration: Option<u64>,
    },
    /// `SegmentList` addressing with every fragment spelled out.
    List {
        initialization: Option<String>,
        fragments: Vec<String>,
    },
}

/// A subtitle file for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub url: String,
    pub ext: String,
}

/// Subtitle tracks keyed by language code.
pub type Subtitles = BTreeMap<String, Vec<SubtitleTrack>>;

/// Formats and subtitles resolved from a manifest.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub formats: Vec<Format>,
    pub subtitles: Subtitles,
}

/// Errors that can occur while extracting a media page.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    /// The provider served the page without content metadata, e.g. for
    /// removed or geo-restricted items.
    #[error("Content Not Available")]
    NotAvailable,

    #[error("Malformed page: {0}")]
    MalformedPage(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid field {path}: {reason}")]
    InvalidField { path: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Manifest error: {0}")]
    Manifest(String),
}

impl ExtractError {
    /// Whether this is a normal, displayable outcome rather than a failure
    /// worth reporting as a bug.
    pub fn is_expected(&self) -> bool {
        matches!(self, ExtractError::NotAvailable)
    }
}

/// Convenience result type.
pub type ExtractResult<T> = Result<T, ExtractError>;
