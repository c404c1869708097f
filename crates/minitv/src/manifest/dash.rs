//! DASH (MPD) manifest parsing.
//!
//! Streams the XML with quick-xml and keeps a stack of open
//! `MPD`/`Period`/`AdaptationSet`/`Representation` frames. Attributes set on an
//! adaptation set are inherited by its representations and `BaseURL` elements
//! resolve against the enclosing frame's base. `SegmentTemplate` is inherited
//! the same way, with representation-level attributes taking precedence;
//! `SegmentList` fragments are collected as they appear.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use url::Url;

use super::ManifestResolver;
use crate::http_client::Fetcher;
use crate::types::{ExtractError, ExtractResult, Format, Manifest, Segments, SubtitleTrack};

/// Format id prefix for DASH representations.
pub const MPD_ID: &str = "dash";

const DASH_PROTOCOL: &str = "http_dash_segments";

/// [`ManifestResolver`] for DASH manifests, fetching through `F`.
#[derive(Debug, Clone)]
pub struct DashResolver<F> {
    fetcher: F,
}

impl<F: Fetcher> DashResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<F: Fetcher> ManifestResolver for DashResolver<F> {
    async fn resolve(&self, manifest_url: &str, video_id: &str) -> ExtractResult<Manifest> {
        let xml = self.fetcher.fetch(manifest_url).await?;
        let manifest = parse_mpd(&xml, manifest_url)?;
        tracing::debug!(
            video_id,
            formats = manifest.formats.len(),
            subtitle_languages = manifest.subtitles.len(),
            "resolved DASH manifest"
        );
        Ok(manifest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Mpd,
    Period,
    AdaptationSet,
    Representation,
}

impl Node {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"MPD" => Some(Node::Mpd),
            b"Period" => Some(Node::Period),
            b"AdaptationSet" => Some(Node::AdaptationSet),
            b"Representation" => Some(Node::Representation),
            _ => None,
        }
    }
}

/// Attributes relevant to format extraction.
#[derive(Debug, Clone, Default)]
struct Attrs {
    id: Option<String>,
    mime_type: Option<String>,
    content_type: Option<String>,
    codecs: Option<String>,
    lang: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    frame_rate: Option<String>,
    sampling_rate: Option<u32>,
    bandwidth: Option<u64>,
}

impl Attrs {
    fn read(e: &BytesStart<'_>) -> Self {
        let mut attrs = Attrs::default();
        for attr in e.attributes().flatten() {
            let value = match attr.unescape_value() {
                Ok(v) => v.trim().to_string(),
                Err(_) => continue,
            };
            match attr.key.local_name().as_ref() {
                b"id" => attrs.id = Some(value),
                b"mimeType" => attrs.mime_type = Some(value),
                b"contentType" => attrs.content_type = Some(value),
                b"codecs" => attrs.codecs = Some(value),
                b"lang" => attrs.lang = Some(value),
                b"width" => attrs.width = value.parse().ok(),
                b"height" => attrs.height = value.parse().ok(),
                b"frameRate" => attrs.frame_rate = Some(value),
                b"audioSamplingRate" => attrs.sampling_rate = value.parse().ok(),
                b"bandwidth" => attrs.bandwidth = value.parse().ok(),
                _ => {}
            }
        }
        attrs
    }

    /// Fill unset fields from `parent`. Ids and bandwidth are per
    /// representation and are never inherited.
    fn inherit(mut self, parent: &Attrs) -> Self {
        self.mime_type = self.mime_type.or_else(|| parent.mime_type.clone());
        self.content_type = self.content_type.or_else(|| parent.content_type.clone());
        self.codecs = self.codecs.or_else(|| parent.codecs.clone());
        self.lang = self.lang.or_else(|| parent.lang.clone());
        self.width = self.width.or(parent.width);
        self.height = self.height.or(parent.height);
        self.frame_rate = self.frame_rate.or_else(|| parent.frame_rate.clone());
        self.sampling_rate = self.sampling_rate.or(parent.sampling_rate);
        self
    }
}

/// `SegmentTemplate` attributes. Unset fields fall back to the enclosing
/// template.
#[derive(Debug, Clone, Default)]
struct Template {
    initialization: Option<String>,
    media: Option<String>,
    start_number: Option<u64>,
    timescale: Option<u64>,
    duration: Option<u64>,
}

impl Template {
    fn read(e: &BytesStart<'_>, parent: Option<&Template>) -> Self {
        let mut template = parent.cloned().unwrap_or_default();
        for attr in e.attributes().flatten() {
            let value = match attr.unescape_value() {
                Ok(v) => v.trim().to_string(),
                Err(_) => continue,
            };
            match attr.key.local_name().as_ref() {
                b"initialization" => template.initialization = Some(value),
                b"media" => template.media = Some(value),
                b"startNumber" => template.start_number = value.parse().ok(),
                b"timescale" => template.timescale = value.parse().ok(),
                b"duration" => template.duration = value.parse().ok(),
                _ => {}
            }
        }
        template
    }
}

/// Contents of a `SegmentList`.
#[derive(Debug, Clone, Default)]
struct SegmentUrls {
    initialization: Option<String>,
    media: Vec<String>,
}

#[derive(Debug, Clone)]
struct Frame {
    node: Node,
    attrs: Attrs,
    base: Url,
    template: Option<Template>,
    list: Option<SegmentUrls>,
}

/// Parse an MPD document. Relative URLs resolve against `manifest_url`.
pub fn parse_mpd(xml: &str, manifest_url: &str) -> ExtractResult<Manifest> {
    let manifest_base = Url::parse(manifest_url)
        .map_err(|e| ExtractError::Manifest(format!("invalid manifest URL {manifest_url}: {e}")))?;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut manifest = Manifest::default();
    let mut stack: Vec<Frame> = Vec::new();
    let mut saw_root = false;
    let mut base_text: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"BaseURL" {
                    base_text = Some(String::new());
                } else if let Some(node) = Node::from_name(name.as_ref()) {
                    saw_root |= node == Node::Mpd;
                    let frame = open_frame(node, &e, &stack, &manifest_base);
                    stack.push(frame);
                } else {
                    segment_element(name.as_ref(), &e, &mut stack);
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if let Some(node) = Node::from_name(name.as_ref()) {
                    saw_root |= node == Node::Mpd;
                    let frame = open_frame(node, &e, &stack, &manifest_base);
                    if node == Node::Representation {
                        emit(&frame, manifest_url, &mut manifest);
                    }
                } else {
                    segment_element(name.as_ref(), &e, &mut stack);
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(text) = base_text.as_mut() {
                    text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"BaseURL" {
                    if let (Some(text), Some(top)) = (base_text.take(), stack.last_mut()) {
                        match top.base.join(text.trim()) {
                            Ok(joined) => top.base = joined,
                            Err(err) => tracing::warn!(base_url = %text, "unresolvable BaseURL: {err}"),
                        }
                    }
                } else if Node::from_name(name.as_ref()).is_some() {
                    if let Some(frame) = stack.pop() {
                        if frame.node == Node::Representation {
                            emit(&frame, manifest_url, &mut manifest);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::Manifest(format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ExtractError::Manifest("no MPD root element".to_string()));
    }
    Ok(manifest)
}

fn open_frame(node: Node, e: &BytesStart<'_>, stack: &[Frame], manifest_base: &Url) -> Frame {
    let parent = stack.last();
    let own = Attrs::read(e);
    let attrs = match (node, parent) {
        (Node::Representation, Some(p)) => own.inherit(&p.attrs),
        _ => own,
    };
    Frame {
        node,
        attrs,
        base: parent.map_or_else(|| manifest_base.clone(), |p| p.base.clone()),
        template: parent.and_then(|p| p.template.clone()),
        list: parent.and_then(|p| p.list.clone()),
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.trim().to_string())
}

/// Record segment addressing on the innermost open frame.
fn segment_element(name: &[u8], e: &BytesStart<'_>, stack: &mut [Frame]) {
    let Some(top) = stack.last_mut() else {
        return;
    };
    match name {
        b"SegmentTemplate" => {
            let template = Template::read(e, top.template.as_ref());
            top.template = Some(template);
        }
        b"SegmentList" => top.list = Some(SegmentUrls::default()),
        b"Initialization" => {
            if let (Some(list), Some(source)) = (top.list.as_mut(), attr_value(e, b"sourceURL")) {
                list.initialization = Some(source);
            }
        }
        b"SegmentURL" => {
            if let (Some(list), Some(media)) = (top.list.as_mut(), attr_value(e, b"media")) {
                list.media.push(media);
            }
        }
        _ => {}
    }
}

/// Resolve the frame's segment addressing into absolute URLs.
fn segments(frame: &Frame) -> Option<Segments> {
    let attrs = &frame.attrs;
    let fill = |pattern: &str| {
        let filled = pattern.replace("$RepresentationID$", attrs.id.as_deref().unwrap_or(""));
        match attrs.bandwidth {
            Some(bandwidth) => filled.replace("$Bandwidth$", &bandwidth.to_string()),
            None => filled,
        }
    };
    let resolve = |relative: &str| match frame.base.join(relative) {
        Ok(url) => Some(url.to_string()),
        Err(err) => {
            tracing::warn!(segment_url = relative, "unresolvable segment URL: {err}");
            None
        }
    };

    if let Some(template) = &frame.template {
        if let Some(media) = template.media.as_deref().and_then(|m| resolve(&fill(m))) {
            return Some(Segments::Template {
                initialization: template.initialization.as_deref().and_then(|i| resolve(&fill(i))),
                media,
                start_number: template.start_number.unwrap_or(1),
                timescale: template.timescale.unwrap_or(1),
                duration: template.duration,
            });
        }
    }

    let list = frame.list.as_ref().filter(|l| !l.media.is_empty())?;
    Some(Segments::List {
        initialization: list.initialization.as_deref().and_then(|i| resolve(i)),
        fragments: list.media.iter().filter_map(|m| resolve(m)).collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackKind {
    Video,
    Audio,
    Text,
    Other,
}

fn track_kind(attrs: &Attrs) -> TrackKind {
    let mime = attrs.mime_type.as_deref().unwrap_or("");
    let codecs = attrs.codecs.as_deref().unwrap_or("");
    let content_type = attrs
        .content_type
        .as_deref()
        .unwrap_or_else(|| mime.split('/').next().unwrap_or(""));

    if content_type == "text"
        || mime == "application/ttml+xml"
        || codecs.starts_with("stpp")
        || codecs.starts_with("wvtt")
    {
        return TrackKind::Text;
    }
    match content_type {
        "video" => TrackKind::Video,
        "audio" => TrackKind::Audio,
        _ if attrs.width.is_some() || attrs.height.is_some() => TrackKind::Video,
        _ => TrackKind::Other,
    }
}

fn emit(frame: &Frame, manifest_url: &str, manifest: &mut Manifest) {
    let attrs = &frame.attrs;
    let segments = segments(frame);
    // Segmented representations point at their first downloadable piece.
    let url = match &segments {
        Some(Segments::Template {
            initialization: Some(init),
            ..
        })
        | Some(Segments::List {
            initialization: Some(init),
            ..
        }) => init.clone(),
        Some(Segments::Template { media, .. }) => media.clone(),
        Some(Segments::List { fragments, .. }) => fragments
            .first()
            .cloned()
            .unwrap_or_else(|| frame.base.to_string()),
        None => frame.base.to_string(),
    };

    match track_kind(attrs) {
        TrackKind::Text => {
            let lang = attrs.lang.clone().unwrap_or_else(|| "und".to_string());
            manifest.subtitles.entry(lang).or_default().push(SubtitleTrack {
                url,
                ext: subtitle_ext(attrs),
            });
        }
        kind @ (TrackKind::Video | TrackKind::Audio) => {
            let format_id = match &attrs.id {
                Some(id) => format!("{MPD_ID}-{id}"),
                None => format!("{MPD_ID}-{}", manifest.formats.len()),
            };
            if manifest.formats.iter().any(|f| f.format_id == format_id) {
                tracing::debug!(format_id, "skipping representation repeated across periods");
                return;
            }
            let (vcodec, acodec) = split_codecs(attrs.codecs.as_deref(), kind);
            manifest.formats.push(Format {
                format_id,
                url,
                manifest_url: manifest_url.to_string(),
                ext: mimetype_ext(attrs.mime_type.as_deref(), kind),
                protocol: DASH_PROTOCOL.to_string(),
                width: attrs.width,
                height: attrs.height,
                fps: attrs.frame_rate.as_deref().and_then(parse_frame_rate),
                tbr: attrs.bandwidth.map(|b| b as f64 / 1000.0),
                asr: attrs.sampling_rate,
                vcodec,
                acodec,
                language: attrs.lang.clone(),
                segments,
            });
        }
        TrackKind::Other => {
            tracing::debug!(mime_type = ?attrs.mime_type, "ignoring non-media representation");
        }
    }
}

fn is_video_codec(codec: &str) -> bool {
    const VIDEO: [&str; 8] = ["avc", "hvc", "hev", "vp8", "vp9", "vp09", "av01", "dvh"];
    VIDEO.iter().any(|p| codec.starts_with(p))
}

/// Split a DASH `codecs` attribute into `(vcodec, acodec)`. Missing sides are
/// `"none"`.
fn split_codecs(codecs: Option<&str>, kind: TrackKind) -> (String, String) {
    let none = || "none".to_string();
    let parts: Vec<&str> = codecs
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    match parts.as_slice() {
        [] if kind == TrackKind::Video => ("unknown".to_string(), none()),
        [] => (none(), "unknown".to_string()),
        [single] if kind == TrackKind::Audio => (none(), single.to_string()),
        [single] => (single.to_string(), none()),
        many => {
            let vcodec = many.iter().find(|c| is_video_codec(c));
            let acodec = many.iter().find(|c| !is_video_codec(c));
            (
                vcodec.map_or_else(none, |c| c.to_string()),
                acodec.map_or_else(none, |c| c.to_string()),
            )
        }
    }
}

fn mimetype_ext(mime: Option<&str>, kind: TrackKind) -> String {
    match mime.unwrap_or("") {
        "video/mp4" => "mp4",
        "audio/mp4" => "m4a",
        "video/webm" | "audio/webm" => "webm",
        "video/mp2t" => "ts",
        "" if kind == TrackKind::Audio => "m4a",
        "" => "mp4",
        other => return other.rsplit('/').next().unwrap_or(other).to_string(),
    }
    .to_string()
}

fn subtitle_ext(attrs: &Attrs) -> String {
    match attrs.mime_type.as_deref().unwrap_or("") {
        "text/vtt" => "vtt",
        "application/ttml+xml" => "ttml",
        "application/mp4" => "mp4",
        "text/srt" | "application/x-subrip" => "srt",
        _ if attrs.codecs.as_deref().is_some_and(|c| c.starts_with("stpp")) => "ttml",
        _ => "vtt",
    }
    .to_string()
}

/// Parse `"25"` or `"30000/1001"`.
fn parse_frame_rate(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => value.trim().parse().ok(),
    }
}
