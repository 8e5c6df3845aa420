//! Escaping for text that lands inside generated markup.

use crate::error::{DocError, DocResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Escape text for use in element content and double-quoted attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Serialize `value` as JSON that is safe inside a `<script>` element.
///
/// `<`, `>` and `&` only ever occur inside JSON strings, so rewriting them as
/// `\uXXXX` escapes keeps the JSON equivalent while making `</script` and
/// `<!--` impossible. U+2028/U+2029 are escaped for older JS parsers.
pub fn json_for_script<T: Serialize + ?Sized>(value: &T) -> DocResult<String> {
    let raw = serde_json::to_string(value)?;
    let mut out = String::with_capacity(raw.len() + 16);
    for ch in raw.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    Ok(out)
}

/// Find the `<script type="application/json" id="{id}">` block in `html` and parse it.
pub fn extract_json_script<T: DeserializeOwned>(html: &str, id: &str) -> DocResult<T> {
    let marker = format!("<script type=\"application/json\" id=\"{}\">", escape_html(id));
    let start = html.find(&marker).ok_or(DocError::MissingBootData)?;
    let rest = &html[start + marker.len()..];
    let end = rest.find("</script>").ok_or(DocError::MissingBootData)?;
    Ok(serde_json::from_str(rest[..end].trim())?)
}
