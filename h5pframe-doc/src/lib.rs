//! # h5pframe guest document synthesis
//!
//! Turns a settings record into a standalone HTML document that boots an
//! embedded content runtime (player or editor) inside an isolated iframe.
//!
//! ## Features
//! - Ordered content entries with an explicit first-entry-wins policy
//! - Asset URL resolution against an absolute base URL
//! - Settings embedded as script-safe JSON that parses back losslessly
//! - Guest bootstrap that reports height, forwards telemetry and, in editor
//!   mode, submits content and accepts token refreshes
//!
//! ## Example
//! ```ignore
//! use h5pframe_doc::{synthesize, Mode, Settings};
//!
//! let settings = Settings::from_json_str(json)?;
//! let doc = synthesize(&settings, Mode::Player, "en")?;
//! iframe.load(&doc.html);
//! ```

pub mod assets;
pub mod document;
pub mod embed;
pub mod error;
pub mod settings;

pub use assets::{is_absolute_url, resolve_asset_url, resolve_asset_urls};
pub use document::{
    extract_boot_data, synthesize, BootData, DocumentBuilder, GeneratedDocument, Mode,
    BOOT_DATA_ID, CONTENT_ELEMENT_ID, SUBMIT_ID, WRAPPER_ID,
};
pub use embed::{escape_html, json_for_script};
pub use error::{DocError, DocResult};
pub use settings::{ContentEntry, Contents, CoreAssets, Settings};

/// Parse settings text: a leading `{` means JSON, anything else is read as YAML.
pub fn parse_settings(text: &str) -> DocResult<Settings> {
    if text.trim_start().starts_with('{') {
        Settings::from_json_str(text)
    } else {
        Settings::from_yaml_str(text)
    }
}
