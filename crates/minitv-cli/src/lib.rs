//! minitv command-line front end: configuration and output rendering.

pub mod config;
pub mod render;

pub use config::resolve_client_config;
pub use render::render_summary;
