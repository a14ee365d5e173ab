//! Inline font resources for HTML output.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Font family name used by the embedded `@font-face` rule.
pub const EMBEDDED_FONT_FAMILY: &str = "FanqieFont";

/// A downloaded font to inline into an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFont {
    /// Where the font was downloaded from
    pub url: String,
    /// Raw font payload
    pub bytes: Vec<u8>,
}

impl EmbeddedFont {
    /// Wrap a downloaded payload.
    pub fn new(url: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            bytes,
        }
    }

    /// MIME type and CSS `format()` hint, guessed from the URL extension.
    pub fn format_hint(&self) -> (&'static str, &'static str) {
        let path = self.url.split(['?', '#']).next().unwrap_or(&self.url);
        let extension = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "woff" => ("font/woff", "woff"),
            "ttf" => ("font/ttf", "truetype"),
            "otf" => ("font/otf", "opentype"),
            _ => ("font/woff2", "woff2"),
        }
    }

    /// `data:` URL carrying the payload in base64.
    pub fn data_url(&self) -> String {
        let (mime, _) = self.format_hint();
        format!("data:{};charset=utf-8;base64,{}", mime, BASE64.encode(&self.bytes))
    }

    /// `@font-face` rule declaring [`EMBEDDED_FONT_FAMILY`].
    pub fn font_face_css(&self) -> String {
        let (_, format) = self.format_hint();
        format!(
            "@font-face {{ font-family: '{}'; src: url({}) format('{}'); }}",
            EMBEDDED_FONT_FAMILY,
            self.data_url(),
            format
        )
    }
}
