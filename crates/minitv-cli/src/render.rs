//! Human-readable rendering of extracted records.

use std::fmt::Write;

use minitv::{ContentKind, MediaRecord};

/// Render a record as a short multi-line summary.
pub fn render_summary(record: &MediaRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", record.title, record.id);

    if let ContentKind::Episode(ep) = &record.kind {
        let season = match (&ep.season, ep.season_number) {
            (Some(name), _) => name.clone(),
            (None, Some(n)) => format!("Season {n}"),
            (None, None) => "Season ?".to_string(),
        };
        let episode = ep
            .episode_number
            .map_or_else(|| "?".to_string(), |n| n.to_string());
        let _ = writeln!(out, "  Series:    {} / {} / Episode {}", ep.series, season, episode);
    }

    if let Some(duration) = record.duration {
        let _ = writeln!(out, "  Duration:  {}", format_duration(duration));
    }
    let _ = writeln!(out, "  URL:       {}", record.webpage_url);
    if let Some(thumbnail) = &record.thumbnail {
        let _ = writeln!(out, "  Thumbnail: {thumbnail}");
    }

    let _ = writeln!(out, "  Formats:   {}", record.formats.len());
    for f in &record.formats {
        let resolution = match (f.width, f.height) {
            (Some(w), Some(h)) => format!("{w}x{h}"),
            (None, Some(h)) => format!("{h}p"),
            _ if f.has_video() => "video".to_string(),
            _ => "audio only".to_string(),
        };
        let bitrate = f.tbr.map(|t| format!("{t:.0}k")).unwrap_or_default();
        let _ = writeln!(
            out,
            "    {:<16} {:<5} {:<11} {:>7}  {}/{}",
            f.format_id, f.ext, resolution, bitrate, f.vcodec, f.acodec
        );
    }

    if let Some(subtitles) = &record.subtitles {
        let langs: Vec<&str> = subtitles.keys().map(String::as_str).collect();
        let _ = writeln!(out, "  Subtitles: {}", langs.join(", "));
    }
    out
}

fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
