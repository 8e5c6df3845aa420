use crate::assets::resolve_asset_urls;
use crate::embed::{escape_html, extract_json_script, json_for_script};
use crate::error::{DocError, DocResult};
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

/// Id of the `application/json` block holding [`BootData`].
pub const BOOT_DATA_ID: &str = "h5pframe-boot";
/// Element the guest observes for size changes.
pub const WRAPPER_ID: &str = "h5pframe-wrapper";
/// Mount point handed to the content runtime.
pub const CONTENT_ELEMENT_ID: &str = "h5pframe-content";
/// Editor-only button that requests the current content.
pub const SUBMIT_ID: &str = "h5pframe-submit";

const DEFAULT_LOCALE: &str = "en";
const DEFAULT_TITLE: &str = "H5P";
const DEFAULT_SUBMIT_LABEL: &str = "Save";

const GUEST_COMMON_JS: &str = include_str!("guest/common.js");
const GUEST_PLAYER_JS: &str = include_str!("guest/player.js");
const GUEST_EDITOR_JS: &str = include_str!("guest/editor.js");

/// Base document styles. The wrapper is a block formatting context so its
/// measured height includes child margins.
const FRAME_BASE_STYLES: &str = "html,body{margin:0;padding:0;overflow:hidden;}\
#h5pframe-wrapper{display:flow-root;}\
#h5pframe-submit{margin:12px 0 0;padding:8px 16px;cursor:pointer;}";

/// Which runtime the guest document boots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Player,
    Editor,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Player => "player",
            Mode::Editor => "editor",
        }
    }

    fn bootstrap_js(self) -> &'static str {
        match self {
            Mode::Player => GUEST_PLAYER_JS,
            Mode::Editor => GUEST_EDITOR_JS,
        }
    }
}

/// Everything the guest bootstrap reads at startup. There is no second round-trip:
/// this block is the guest's only source of initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootData {
    pub mode: Mode,
    pub locale: String,
    pub content_id: String,
    pub library: String,
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub token: Option<String>,
    pub wrapper_id: String,
    pub content_element_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_id: Option<String>,
    pub settings: Settings,
}

/// A synthesized guest document
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDocument {
    pub html: String,
    pub mode: Mode,
    pub content_id: String,
    pub library: String,
    /// Resolved script URLs in load order
    pub scripts: Vec<String>,
    /// Resolved stylesheet URLs in load order
    pub styles: Vec<String>,
    /// Parsed `jsonContent` of the rendered entry
    pub params: Value,
}

/// Builds a standalone guest document from settings.
pub struct DocumentBuilder<'a> {
    settings: &'a Settings,
    mode: Mode,
    locale: String,
    submit_label: String,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            mode: Mode::default(),
            locale: DEFAULT_LOCALE.to_string(),
            submit_label: DEFAULT_SUBMIT_LABEL.to_string(),
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Language tag for `<html lang>` and the runtime. Empty falls back to `en`.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        let locale = locale.into();
        if !locale.trim().is_empty() {
            self.locale = locale;
        }
        self
    }

    pub fn submit_label(mut self, label: impl Into<String>) -> Self {
        self.submit_label = label.into();
        self
    }

    pub fn build(&self) -> DocResult<GeneratedDocument> {
        let (content_id, entry) = self
            .settings
            .contents
            .first()
            .ok_or(DocError::MissingContent)?;
        let params = entry.params(content_id)?;

        let base_url = self.settings.base_url.as_str();
        let scripts = resolve_asset_urls(
            [self.settings.core.scripts.as_slice(), entry.scripts.as_slice()],
            base_url,
        );
        let styles = resolve_asset_urls(
            [self.settings.core.styles.as_slice(), entry.styles.as_slice()],
            base_url,
        );

        let mut embedded = self.settings.clone();
        if embedded.loaded_js.is_none() {
            embedded.loaded_js = Some(scripts.clone());
        }
        if embedded.loaded_css.is_none() {
            embedded.loaded_css = Some(styles.clone());
        }

        let title = entry
            .extra
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        let boot = BootData {
            mode: self.mode,
            locale: self.locale.clone(),
            content_id: content_id.to_string(),
            library: entry.library.clone(),
            params: params.clone(),
            metadata: entry.extra.get("metadata").cloned(),
            token: self.settings.token.clone(),
            wrapper_id: WRAPPER_ID.to_string(),
            content_element_id: CONTENT_ELEMENT_ID.to_string(),
            submit_id: (self.mode == Mode::Editor).then(|| SUBMIT_ID.to_string()),
            settings: embedded,
        };

        let html = self.render(&boot, &title, &scripts, &styles)?;
        tracing::debug!(
            mode = self.mode.as_str(),
            content_id,
            scripts = scripts.len(),
            styles = styles.len(),
            bytes = html.len(),
            "synthesized guest document"
        );

        Ok(GeneratedDocument {
            html,
            mode: self.mode,
            content_id: content_id.to_string(),
            library: entry.library.clone(),
            scripts,
            styles,
            params,
        })
    }

    fn render(
        &self,
        boot: &BootData,
        title: &str,
        scripts: &[String],
        styles: &[String],
    ) -> DocResult<String> {
        let mut html = String::new();
        write!(
            html,
            r#"<!DOCTYPE html>
<html lang="{}">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
"#,
            escape_html(&self.locale),
            escape_html(title)
        )?;
        for style in styles {
            writeln!(html, r#"<link rel="stylesheet" href="{}">"#, escape_html(style))?;
        }
        writeln!(html, "<style>{}</style>", FRAME_BASE_STYLES)?;
        writeln!(
            html,
            r#"<script type="application/json" id="{}">{}</script>"#,
            BOOT_DATA_ID,
            json_for_script(boot)?
        )?;
        for script in scripts {
            writeln!(html, r#"<script src="{}"></script>"#, escape_html(script))?;
        }
        html.push_str("</head>\n<body>\n");

        write!(html, r#"<div id="{}" class="h5pframe-wrapper">"#, WRAPPER_ID)?;
        write!(
            html,
            r#"<div id="{}" class="h5pframe-content" data-content-id="{}"></div>"#,
            CONTENT_ELEMENT_ID,
            escape_html(&boot.content_id)
        )?;
        if self.mode == Mode::Editor {
            write!(
                html,
                r#"<button id="{}" type="button">{}</button>"#,
                SUBMIT_ID,
                escape_html(&self.submit_label)
            )?;
        }
        html.push_str("</div>\n");

        write!(
            html,
            "<script>\n(function () {{\n'use strict';\n{}\n{}\n}})();\n</script>\n",
            GUEST_COMMON_JS,
            self.mode.bootstrap_js()
        )?;
        html.push_str("</body>\n</html>\n");
        Ok(html)
    }
}

/// Synthesize the guest document for `settings` in `mode`.
pub fn synthesize(settings: &Settings, mode: Mode, locale: &str) -> DocResult<GeneratedDocument> {
    DocumentBuilder::new(settings).mode(mode).locale(locale).build()
}

/// Parse the boot data back out of a synthesized document.
pub fn extract_boot_data(html: &str) -> DocResult<BootData> {
    extract_json_script(html, BOOT_DATA_ID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ContentEntry;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings
            .contents
            .insert("cid-1", ContentEntry::new(r#"{"a":1}"#, "H5P.Foo 1.0"));
        settings
    }

    #[test]
    fn test_bootstrap_scripts_never_close_the_script_element() {
        for js in [GUEST_COMMON_JS, GUEST_PLAYER_JS, GUEST_EDITOR_JS] {
            assert!(!js.to_lowercase().contains("</script"));
        }
    }

    #[test]
    fn test_editor_bootstrap_listens_for_token_changes() {
        assert!(GUEST_EDITOR_JS.contains("TOKEN_CHANGED"));
        assert!(GUEST_EDITOR_JS.contains("_token="));
        assert!(GUEST_EDITOR_JS.contains("h5pEditorStatus: 'success'"));
        assert!(GUEST_EDITOR_JS.contains("h5pEditorStatus: 'error'"));
        assert!(!GUEST_PLAYER_JS.contains("TOKEN_CHANGED"));
    }

    #[test]
    fn test_common_bootstrap_reports_height_and_telemetry() {
        assert!(GUEST_COMMON_JS.contains("iFrameHeight"));
        assert!(GUEST_COMMON_JS.contains("ResizeObserver"));
        assert!(GUEST_COMMON_JS.contains("statement:"));
        assert!(GUEST_COMMON_JS.contains(BOOT_DATA_ID));
    }

    #[test]
    fn test_empty_locale_falls_back() {
        let settings = settings();
        let doc = DocumentBuilder::new(&settings).locale("  ").build().unwrap();
        assert!(doc.html.contains(r#"<html lang="en">"#));
    }

    #[test]
    fn test_submit_label_is_escaped() {
        let settings = settings();
        let doc = DocumentBuilder::new(&settings)
            .mode(Mode::Editor)
            .submit_label("Save & <close>")
            .build()
            .unwrap();
        assert!(doc.html.contains("Save &amp; &lt;close&gt;</button>"));
    }

    #[test]
    fn test_missing_content() {
        let result = synthesize(&Settings::default(), Mode::Player, "en");
        assert_eq!(result.unwrap_err(), DocError::MissingContent);
    }
}
