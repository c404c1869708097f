//! The media page extractor: fetch, locate, navigate, resolve, map.

use crate::blob;
use crate::http_client::{ClientConfig, Fetcher, HttpClient};
use crate::manifest::{sort_formats, DashResolver, ManifestResolver};
use crate::mapper::map_record;
use crate::navigate::navigate;
use crate::page_url::{self, VALID_URL};
use crate::types::{ExtractResult, MediaRecord, PageId};

/// Extractor name reported to hosts.
pub const EXTRACTOR_NAME: &str = "MiniTV";

/// Countries the provider serves content to.
pub const GEO_COUNTRIES: &[&str] = &["IN"];

/// Static description of the extractor.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExtractorInfo {
    pub name: &'static str,
    pub valid_url: &'static str,
    pub geo_countries: &'static [&'static str],
}

pub fn info() -> ExtractorInfo {
    ExtractorInfo {
        name: EXTRACTOR_NAME,
        valid_url: VALID_URL,
        geo_countries: GEO_COUNTRIES,
    }
}

/// Whether `url` is handled by this extractor.
pub fn suitable(url: &str) -> bool {
    page_url::is_suitable(url)
}

/// Extractor for `amazon.in/minitv/tp/<id>` pages.
///
/// Each call to [`extract`](Self::extract) is one independent sequential
/// pass; the extractor holds no per-request state.
#[derive(Debug, Clone)]
pub struct MiniTvExtractor<F, M> {
    fetcher: F,
    resolver: M,
}

impl MiniTvExtractor<HttpClient, DashResolver<HttpClient>> {
    /// Build an extractor that fetches pages and DASH manifests over HTTP.
    pub fn with_config(config: &ClientConfig) -> ExtractResult<Self> {
        let client = HttpClient::new(config)?;
        Ok(Self::new(client.clone(), DashResolver::new(client)))
    }
}

impl<F: Fetcher, M: ManifestResolver> MiniTvExtractor<F, M> {
    pub fn new(fetcher: F, resolver: M) -> Self {
        Self { fetcher, resolver }
    }

    /// Extract the media record for the page at `url`.
    pub async fn extract(&self, url: &str) -> ExtractResult<MediaRecord> {
        let id = page_url::page_id(url)?;
        tracing::debug!(%id, "downloading webpage");
        let html = self.fetcher.fetch(url).await?;
        self.extract_from_html(&id, url, &html).await
    }

    /// Run everything after the page download on already fetched `html`.
    pub async fn extract_from_html(
        &self,
        id: &PageId,
        url: &str,
        html: &str,
    ) -> ExtractResult<MediaRecord> {
        let blob = blob::extract(html)?;
        let page = navigate(&blob)?;

        tracing::debug!(%id, manifest_url = %page.manifest_url, "resolving manifest");
        let mut manifest = self.resolver.resolve(&page.manifest_url, id.as_str()).await?;
        sort_formats(&mut manifest.formats);

        let record = map_record(id, url, page, manifest)?;
        tracing::info!(
            %id,
            title = %record.title,
            formats = record.formats.len(),
            "extracted media record"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentKind, ExtractError, Format, Manifest};
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticPage(String);

    #[async_trait]
    impl Fetcher for StaticPage {
        async fn fetch(&self, _url: &str) -> ExtractResult<String> {
            Ok(self.0.clone())
        }
    }

    struct OneFormat;

    #[async_trait]
    impl ManifestResolver for OneFormat {
        async fn resolve(&self, manifest_url: &str, _video_id: &str) -> ExtractResult<Manifest> {
            Ok(Manifest {
                formats: vec![Format {
                    format_id: "dash-1".to_string(),
                    url: "https://cdn/1.mp4".to_string(),
                    manifest_url: manifest_url.to_string(),
                    ext: "mp4".to_string(),
                    protocol: "http_dash_segments".to_string(),
                    width: Some(1280),
                    height: Some(720),
                    fps: None,
                    tbr: Some(2000.0),
                    asr: None,
                    vcodec: "avc1".to_string(),
                    acodec: "none".to_string(),
                    language: None,
                    segments: None,
                }],
                subtitles: Default::default(),
            })
        }
    }

    fn page(ssr: serde_json::Value) -> String {
        let blob = json!({ "props": { "pageProps": { "ssrProps": ssr } } });
        format!(
            r#"<html><body><script id="__NEXT_DATA__" type="application/json" crossorigin="anonymous">{blob}</script></body></html>"#
        )
    }

    const URL: &str = "https://www.amazon.in/minitv/tp/38f200a1-953a-414c-955a-cd21d9aba047";

    #[test]
    fn test_extract_standalone() {
        let html = page(json!({
            "metaData": {
                "canonicalUrl": URL,
                "contentDetails": { "name": "A Film", "vodType": "MOVIE", "contentLengthInSeconds": 6000 }
            },
            "widgets": [{ "data": { "playbackAssets": { "manifestURL": "https://cdn/m.mpd" } } }]
        }));
        let extractor = MiniTvExtractor::new(StaticPage(html), OneFormat);
        let record = tokio_test::block_on(extractor.extract(URL)).unwrap();

        assert_eq!(record.id, "38f200a1-953a-414c-955a-cd21d9aba047");
        assert_eq!(record.title, "A Film");
        assert_eq!(record.kind, ContentKind::Standalone);
        assert_eq!(record.duration, Some(6000));
        assert_eq!(record.best_format().unwrap().manifest_url, "https://cdn/m.mpd");
        assert!(record.subtitles.is_none());
    }

    #[test]
    fn test_unsupported_url_fails_before_fetch() {
        let extractor = MiniTvExtractor::new(StaticPage(String::new()), OneFormat);
        let result = tokio_test::block_on(extractor.extract("https://example.com/video/1"));
        assert!(matches!(result, Err(ExtractError::UnsupportedUrl(_))));
    }

    #[test]
    fn test_missing_metadata_is_not_available() {
        let html = page(json!({ "widgets": [] }));
        let extractor = MiniTvExtractor::new(StaticPage(html), OneFormat);
        let err = tokio_test::block_on(extractor.extract(URL)).unwrap_err();
        assert!(err.is_expected());
        assert_eq!(err.to_string(), "Content Not Available");
    }

    #[test]
    fn test_page_without_blob_is_malformed() {
        let extractor = MiniTvExtractor::new(StaticPage("<html></html>".to_string()), OneFormat);
        let result = tokio_test::block_on(extractor.extract(URL));
        assert!(matches!(result, Err(ExtractError::MalformedPage(_))));
    }

    #[test]
    fn test_info() {
        let info = info();
        assert_eq!(info.name, "MiniTV");
        assert_eq!(info.geo_countries, &["IN"]);
        assert!(suitable(URL));
    }
}
