//! minitv — media page extractor for Amazon miniTV: metadata, DASH formats and subtitles.

pub mod blob;
pub mod extractor;
pub mod http_client;
pub mod manifest;
pub mod mapper;
pub mod navigate;
pub mod page_url;
pub mod types;

pub use extractor::{info, suitable, ExtractorInfo, MiniTvExtractor, GEO_COUNTRIES};
pub use http_client::{ClientConfig, Fetcher, HttpClient};
pub use manifest::{sort_formats, DashResolver, ManifestResolver};
pub use mapper::int_or_none;
pub use page_url::{is_suitable, page_id};
pub use types::*;
