//! Output document assembly.
//!
//! This module turns reconstructed chapters into one output document:
//! - **Plain text**: title block, then each chapter followed by a separator line
//! - **HTML**: styled document that can also embed the obfuscation font, so a
//!   browser draws the right glyphs even where substitution was incomplete
//!
//! # Examples
//!
//! ```
//! use fontmask::converters::{OutputFormat, assemble};
//! use fontmask::extractors::NovelMetadata;
//!
//! let metadata = NovelMetadata::default();
//! let text = assemble(OutputFormat::Text, &metadata, &[], None);
//! assert!(text.starts_with("Unknown Title\n作者：Unknown Author"));
//! ```

pub mod font_embed;
pub mod html;
pub mod text;

use std::fmt;
use std::str::FromStr;

pub use font_embed::EmbeddedFont;
pub use html::{HtmlRenderer, escape_html};
pub use text::TextRenderer;

use crate::error::Error;
use crate::extractors::NovelMetadata;
use crate::reconstruct::ReconstructedChapter;

/// Characters kept in output file names besides alphanumerics.
const FILENAME_EXTRA_CHARS: &str = " -_.()！，";

/// Output document format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// UTF-8 plain text
    #[default]
    Text,
    /// Self-contained HTML
    Html,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(OutputFormat::Text),
            "html" | "htm" => Ok(OutputFormat::Html),
            other => Err(Error::InvalidInput(format!("unknown output format '{}'", other))),
        }
    }
}

/// Renders a whole novel into one document.
pub trait DocumentRenderer {
    /// Render `chapters` in the given order under the novel's title block.
    fn render(&self, metadata: &NovelMetadata, chapters: &[ReconstructedChapter]) -> String;
}

/// Render chapters in `format`.
///
/// Chapter order is kept exactly; `font` is only used by HTML output.
pub fn assemble(
    format: OutputFormat,
    metadata: &NovelMetadata,
    chapters: &[ReconstructedChapter],
    font: Option<&EmbeddedFont>,
) -> String {
    match format {
        OutputFormat::Text => TextRenderer::new().render(metadata, chapters),
        OutputFormat::Html => {
            let renderer = match font {
                Some(font) => HtmlRenderer::with_font(font.clone()),
                None => HtmlRenderer::new(),
            };
            renderer.render(metadata, chapters)
        },
    }
}

/// File stem for a novel title, safe on common filesystems.
///
/// # Examples
///
/// ```
/// use fontmask::converters::clean_filename;
///
/// assert_eq!(clean_filename("星河/长明: 第一卷?"), "星河长明 第一卷");
/// ```
pub fn clean_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || FILENAME_EXTRA_CHARS.contains(*c))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "novel".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconstruct::ChapterStatus;

    fn chapter(title: &str, text: &str) -> ReconstructedChapter {
        ReconstructedChapter {
            title: title.to_string(),
            text: text.to_string(),
            font_url: None,
            status: ChapterStatus::Plain,
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("TXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!("epub".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Html.extension(), "html");
        assert_eq!(OutputFormat::Text.to_string(), "txt");
    }

    #[test]
    fn test_assemble_dispatch() {
        let metadata = NovelMetadata::default();
        let chapters = vec![chapter("一", "甲")];
        assert!(assemble(OutputFormat::Html, &metadata, &chapters, None).starts_with("<!DOCTYPE html>"));
        assert!(assemble(OutputFormat::Text, &metadata, &chapters, None).contains("一\n\n甲\n\n"));
    }

    #[test]
    fn test_clean_filename() {
        assert_eq!(clean_filename("A Tale (Vol. 1)"), "A Tale (Vol. 1)");
        assert_eq!(clean_filename("你好！世界，"), "你好！世界，");
        assert_eq!(clean_filename("  <>:\"/\\|?*  "), "novel");
        assert_eq!(clean_filename(" 书名\n"), "书名");
    }
}
