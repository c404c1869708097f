//! Typed access to the server-side props inside the page blob.
//!
//! The blob shape is fixed by the provider's frontend and is not versioned.
//! Every lookup fails with an error naming the path it expected.

use serde::Deserialize;
use serde_json::Value;

use crate::types::{ExtractError, ExtractResult};

const SSR_PROPS: &str = "/props/pageProps/ssrProps";
pub(crate) const CONTENT_DETAILS: &str = "/props/pageProps/ssrProps/metaData/contentDetails";
const WIDGETS: &str = "/props/pageProps/ssrProps/widgets";
const MANIFEST_URL: &str = "/data/playbackAssets/manifestURL";

/// Provider description of one content item (`metaData.contentDetails`).
///
/// Numeric fields stay as raw JSON so they can be coerced leniently.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetails {
    pub name: String,
    pub synopsis: Option<String>,
    pub image_src: Option<String>,
    pub vod_type: Option<String>,
    pub series_name: Option<String>,
    pub season_name: Option<String>,
    pub season_number: Option<Value>,
    pub episode_number: Option<Value>,
    pub content_length_in_seconds: Option<Value>,
}

/// Everything the field mapper needs from one page.
#[derive(Debug, Clone)]
pub struct PageData {
    pub details: ContentDetails,
    pub canonical_url: Option<String>,
    pub manifest_url: String,
}

/// Walk the blob down to the content details and the manifest reference.
///
/// A missing or null `metaData` section means the provider withheld the
/// item and yields [`ExtractError::NotAvailable`].
pub fn navigate(blob: &Value) -> ExtractResult<PageData> {
    let ssr = blob
        .pointer(SSR_PROPS)
        .ok_or_else(|| ExtractError::MissingField(SSR_PROPS.to_string()))?;

    let meta = match ssr.get("metaData") {
        Some(meta) if !meta.is_null() => meta,
        _ => return Err(ExtractError::NotAvailable),
    };

    let details = meta
        .get("contentDetails")
        .ok_or_else(|| ExtractError::MissingField(CONTENT_DETAILS.to_string()))?;
    let details =
        ContentDetails::deserialize(details).map_err(|e| ExtractError::InvalidField {
            path: CONTENT_DETAILS.to_string(),
            reason: e.to_string(),
        })?;

    let canonical_url = meta
        .get("canonicalUrl")
        .and_then(Value::as_str)
        .map(str::to_string);

    let manifest_url = manifest_url(ssr)?;

    Ok(PageData {
        details,
        canonical_url,
        manifest_url,
    })
}

/// Find the manifest URL among the page widgets.
///
/// The player widget has always been first in the list, but the lookup
/// takes the first widget that carries playback assets so a reordered list
/// still resolves.
fn manifest_url(ssr: &Value) -> ExtractResult<String> {
    let widgets = ssr
        .get("widgets")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractError::MissingField(WIDGETS.to_string()))?;

    let (index, url) = widgets
        .iter()
        .enumerate()
        .find_map(|(i, w)| w.pointer(MANIFEST_URL).and_then(Value::as_str).map(|u| (i, u)))
        .ok_or_else(|| ExtractError::MissingField(format!("{WIDGETS}/*{MANIFEST_URL}")))?;

    if index != 0 {
        tracing::warn!(index, "playback widget is not first in the widget list");
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blob(ssr: Value) -> Value {
        json!({ "props": { "pageProps": { "ssrProps": ssr } } })
    }

    #[test]
    fn test_navigate_full_page() {
        let data = navigate(&blob(json!({
            "metaData": {
                "canonicalUrl": "https://www.amazon.in/minitv/tp/abc",
                "contentDetails": {
                    "name": "Movie",
                    "synopsis": "Plot",
                    "imageSrc": "https://img/1.jpg",
                    "vodType": "MOVIE",
                    "contentLengthInSeconds": 5400
                }
            },
            "widgets": [
                { "data": { "playbackAssets": { "manifestURL": "https://cdn/a.mpd" } } }
            ]
        })))
        .unwrap();

        assert_eq!(data.details.name, "Movie");
        assert_eq!(data.details.vod_type.as_deref(), Some("MOVIE"));
        assert_eq!(data.details.image_src.as_deref(), Some("https://img/1.jpg"));
        assert_eq!(data.details.content_length_in_seconds, Some(json!(5400)));
        assert_eq!(data.canonical_url.as_deref(), Some("https://www.amazon.in/minitv/tp/abc"));
        assert_eq!(data.manifest_url, "https://cdn/a.mpd");
    }

    #[test]
    fn test_missing_metadata_is_not_available() {
        let result = navigate(&blob(json!({ "widgets": [] })));
        assert!(matches!(result, Err(ExtractError::NotAvailable)));
    }

    #[test]
    fn test_null_metadata_is_not_available() {
        let result = navigate(&blob(json!({ "metaData": null, "widgets": [] })));
        assert!(matches!(result, Err(ExtractError::NotAvailable)));
    }

    #[test]
    fn test_missing_ssr_props() {
        let result = navigate(&json!({ "props": { "pageProps": {} } }));
        match result {
            Err(ExtractError::MissingField(path)) => assert_eq!(path, SSR_PROPS),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_content_details() {
        let result = navigate(&blob(json!({ "metaData": {}, "widgets": [] })));
        assert!(matches!(result, Err(ExtractError::MissingField(p)) if p == CONTENT_DETAILS));
    }

    #[test]
    fn test_content_details_without_name_is_invalid() {
        let result = navigate(&blob(json!({
            "metaData": { "contentDetails": { "synopsis": "x" } },
            "widgets": []
        })));
        assert!(matches!(result, Err(ExtractError::InvalidField { .. })));
    }

    #[test]
    fn test_empty_widget_list_is_missing_field() {
        let result = navigate(&blob(json!({
            "metaData": { "contentDetails": { "name": "x" } },
            "widgets": []
        })));
        assert!(matches!(result, Err(ExtractError::MissingField(p)) if p.contains("manifestURL")));
    }

    #[test]
    fn test_manifest_found_in_later_widget() {
        let data = navigate(&blob(json!({
            "metaData": { "contentDetails": { "name": "x" } },
            "widgets": [
                { "data": { "title": "banner" } },
                { "data": { "playbackAssets": { "manifestURL": "https://cdn/b.mpd" } } }
            ]
        })))
        .unwrap();
        assert_eq!(data.manifest_url, "https://cdn/b.mpd");
    }
}
