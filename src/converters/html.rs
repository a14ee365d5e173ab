//! HTML document renderer.
//!
//! Produces one self-contained page: a title block, then one `div.chapter`
//! per chapter with each text line in its own paragraph. When a font is
//! supplied it is inlined as a `data:` URL and applied to chapter bodies.

use super::font_embed::{EMBEDDED_FONT_FAMILY, EmbeddedFont};
use super::DocumentRenderer;
use crate::extractors::NovelMetadata;
use crate::reconstruct::ReconstructedChapter;

const BASE_STYLE: &str = "body { font-family: sans-serif; line-height: 1.6; max-width: 800px; \
margin: 0 auto; padding: 20px; background-color: #f4f4f4; }
.chapter { background: #fff; padding: 20px; margin-bottom: 20px; border-radius: 8px; \
box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
h1 { text-align: center; color: #333; }
h2 { border-bottom: 1px solid #eee; padding-bottom: 10px; }
p { margin-bottom: 1em; text-indent: 2em; }
.author { text-align: center; text-indent: 0; }";

/// Renders novels as a styled HTML page.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    font: Option<EmbeddedFont>,
}

impl HtmlRenderer {
    /// Renderer without an embedded font.
    pub fn new() -> Self {
        Self { font: None }
    }

    /// Renderer that inlines `font` and uses it for chapter bodies.
    pub fn with_font(font: EmbeddedFont) -> Self {
        Self { font: Some(font) }
    }

    fn style(&self) -> String {
        let mut style = BASE_STYLE.to_string();
        if let Some(font) = &self.font {
            style.push('\n');
            style.push_str(&font.font_face_css());
            style.push_str(&format!(
                "\n.chapter-body {{ font-family: '{}', sans-serif; }}",
                EMBEDDED_FONT_FAMILY
            ));
        }
        style
    }
}

impl DocumentRenderer for HtmlRenderer {
    fn render(&self, metadata: &NovelMetadata, chapters: &[ReconstructedChapter]) -> String {
        let title = escape_html(&metadata.title);
        let author = escape_html(&metadata.author);

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"zh-CN\">\n<head>\n");
        html.push_str("<meta charset=\"UTF-8\">\n");
        html.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str(&format!("<title>{} - {}</title>\n", title, author));
        html.push_str(&format!("<style>\n{}\n</style>\n", self.style()));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{}</h1>\n", title));
        html.push_str(&format!("<p class=\"author\">作者：{}</p>\n", author));

        for chapter in chapters {
            html.push_str("<div class=\"chapter\">\n");
            html.push_str(&format!("<h2>{}</h2>\n", escape_html(&chapter.title)));
            html.push_str("<div class=\"chapter-body\">\n");
            for line in chapter.text.lines().filter(|l| !l.trim().is_empty()) {
                html.push_str("<p>");
                html.push_str(&escape_html(line));
                html.push_str("</p>\n");
            }
            html.push_str("</div>\n</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

/// Escape HTML special characters in text.
///
/// # Examples
///
/// ```
/// # use fontmask::converters::html::escape_html;
/// let text = "AT&T <Company>";
/// let escaped = escape_html(text);
/// assert_eq!(escaped, "AT&amp;T &lt;Company&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
