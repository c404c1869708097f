//! Manifest resolution: turning a manifest URL into formats and subtitles.

pub mod dash;

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::types::{ExtractResult, Format, Manifest};

pub use dash::{parse_mpd, DashResolver};

/// Resolves an adaptive-streaming manifest into playable formats.
#[async_trait]
pub trait ManifestResolver: Send + Sync {
    /// Fetch and parse the manifest at `manifest_url`. `video_id` is only
    /// used for log correlation.
    async fn resolve(&self, manifest_url: &str, video_id: &str) -> ExtractResult<Manifest>;
}

/// Order formats best first.
///
/// Video beats audio-only, then higher resolution, frame rate and bitrate.
/// Muxed audio and sampling rate break the remaining ties; equal formats keep
/// their manifest order.
pub fn sort_formats(formats: &mut [Format]) {
    formats.sort_by(|a, b| compare_quality(b, a));
}

fn compare_quality(a: &Format, b: &Format) -> Ordering {
    a.has_video()
        .cmp(&b.has_video())
        .then_with(|| a.height.unwrap_or(0).cmp(&b.height.unwrap_or(0)))
        .then_with(|| a.fps.unwrap_or(0.0).total_cmp(&b.fps.unwrap_or(0.0)))
        .then_with(|| a.tbr.unwrap_or(0.0).total_cmp(&b.tbr.unwrap_or(0.0)))
        .then_with(|| a.has_audio().cmp(&b.has_audio()))
        .then_with(|| a.asr.unwrap_or(0).cmp(&b.asr.unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(id: &str, vcodec: &str, height: Option<u32>, tbr: Option<f64>) -> Format {
        Format {
            format_id: id.to_string(),
            url: format!("https://cdn/{id}.mp4"),
            manifest_url: "https://cdn/a.mpd".to_string(),
            ext: "mp4".to_string(),
            protocol: "http_dash_segments".to_string(),
            width: None,
            height,
            fps: None,
            tbr,
            asr: None,
            vcodec: vcodec.to_string(),
            acodec: if vcodec == "none" { "mp4a.40.2".to_string() } else { "none".to_string() },
            language: None,
            segments: None,
        }
    }

    fn ids(formats: &[Format]) -> Vec<&str> {
        formats.iter().map(|f| f.format_id.as_str()).collect()
    }

    #[test]
    fn test_sort_video_by_height_then_bitrate() {
        let mut formats = vec![
            format("360", "avc1", Some(360), Some(800.0)),
            format("720-low", "avc1", Some(720), Some(2000.0)),
            format("720-high", "avc1", Some(720), Some(3000.0)),
            format("1080", "avc1", Some(1080), Some(2500.0)),
        ];
        sort_formats(&mut formats);
        assert_eq!(ids(&formats), vec!["1080", "720-high", "720-low", "360"]);
    }

    #[test]
    fn test_audio_sorts_after_video() {
        let mut formats = vec![
            format("audio", "none", None, Some(9000.0)),
            format("240", "avc1", Some(240), Some(300.0)),
        ];
        sort_formats(&mut formats);
        assert_eq!(ids(&formats), vec!["240", "audio"]);
    }

    #[test]
    fn test_equal_formats_keep_order() {
        let mut formats = vec![
            format("a", "avc1", Some(480), Some(1000.0)),
            format("b", "avc1", Some(480), Some(1000.0)),
        ];
        sort_formats(&mut formats);
        assert_eq!(ids(&formats), vec!["a", "b"]);
    }
}
