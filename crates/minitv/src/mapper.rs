//! Map provider metadata onto a [`MediaRecord`].

use serde_json::Value;

use crate::navigate::{PageData, CONTENT_DETAILS};
use crate::types::{
    ContentKind, EpisodeInfo, ExtractError, ExtractResult, Manifest, MediaRecord, PageId,
};

/// `vodType` tag of series episodes.
pub const EPISODE_VOD_TYPE: &str = "EPISODE";

/// Lenient integer coercion for provider numbers.
///
/// Integers map to themselves, floats truncate and integer strings are
/// parsed. Decimal strings such as `"12.5"` are not integers and stay unset,
/// as does anything else.
///
/// Every field this feeds (durations, season and episode numbers) is a
/// count, so negative values are also treated as unset.
pub fn int_or_none(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Classify the item as standalone or episode.
pub fn content_kind(page: &PageData) -> ExtractResult<ContentKind> {
    let details = &page.details;
    if details.vod_type.as_deref() != Some(EPISODE_VOD_TYPE) {
        return Ok(ContentKind::Standalone);
    }

    let series = details
        .series_name
        .clone()
        .ok_or_else(|| ExtractError::MissingField(format!("{CONTENT_DETAILS}/seriesName")))?;

    Ok(ContentKind::Episode(EpisodeInfo {
        series,
        season: details.season_name.clone(),
        season_number: int_or_none(details.season_number.as_ref()),
        episode: details.name.clone(),
        episode_number: int_or_none(details.episode_number.as_ref()),
    }))
}

/// Build the output record from page data and the resolved manifest.
///
/// `page_url` is used as the webpage URL when the page has no canonical URL.
pub fn map_record(
    id: &PageId,
    page_url: &str,
    page: PageData,
    manifest: Manifest,
) -> ExtractResult<MediaRecord> {
    let kind = content_kind(&page)?;
    let duration = int_or_none(page.details.content_length_in_seconds.as_ref());
    let subtitles = Some(manifest.subtitles).filter(|s| !s.is_empty());

    Ok(MediaRecord {
        id: id.to_string(),
        title: page.details.name,
        thumbnail: page.details.image_src,
        description: page.details.synopsis,
        kind,
        duration,
        webpage_url: page.canonical_url.unwrap_or_else(|| page_url.to_string()),
        formats: manifest.formats,
        subtitles,
    })
}
