//! Locate and parse the Next.js `__NEXT_DATA__` state blob embedded in a page.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::types::{ExtractError, ExtractResult};

fn next_data_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<script[^>]*\bid="__NEXT_DATA__"[^>]*>(.*?)</script>"#)
            .expect("next data regex is valid")
    })
}

/// Return the text content of the `__NEXT_DATA__` script tag.
pub fn locate(html: &str) -> ExtractResult<&str> {
    next_data_re()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ExtractError::MalformedPage("__NEXT_DATA__ script not found".to_string()))
}

/// Locate the blob in `html` and parse it as JSON.
pub fn extract(html: &str) -> ExtractResult<Value> {
    let text = locate(html)?;
    tracing::debug!(bytes = text.len(), "found __NEXT_DATA__ blob");
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_next_data() {
        let html = r#"<html><head></head><body>
        <div id="__next"></div>
        <script id="__NEXT_DATA__" type="application/json" crossorigin="anonymous">{"props":{}}</script>
        </body></html>"#;
        assert_eq!(locate(html).unwrap(), r#"{"props":{}}"#);
    }

    #[test]
    fn test_locate_tolerates_attribute_order_and_newlines() {
        let html = "<script type=\"application/json\" id=\"__NEXT_DATA__\">\n{\"a\":\n1}\n</script>";
        assert_eq!(extract(html).unwrap()["a"], 1);
    }

    #[test]
    fn test_ignores_other_scripts() {
        let html = r#"<script id="analytics">{"x":1}</script>
        <script id="__NEXT_DATA__" type="application/json">{"y":2}</script>"#;
        assert_eq!(extract(html).unwrap()["y"], 2);
    }

    #[test]
    fn test_missing_blob_is_malformed_page() {
        let html = "<html><body><script>var x = 1;</script></body></html>";
        assert!(matches!(locate(html), Err(ExtractError::MalformedPage(_))));
    }

    #[test]
    fn test_empty_blob_is_malformed_page() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">  </script>"#;
        assert!(matches!(locate(html), Err(ExtractError::MalformedPage(_))));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">{"props": </script>"#;
        assert!(matches!(extract(html), Err(ExtractError::Parse(_))));
    }
}
