//! Plain-text document renderer.

use super::DocumentRenderer;
use crate::extractors::NovelMetadata;
use crate::reconstruct::ReconstructedChapter;

/// Width of the separator line closing each chapter.
pub const SEPARATOR_WIDTH: usize = 20;

/// Renders novels as UTF-8 plain text.
///
/// ```text
/// {title}
/// 作者：{author}
///
/// {chapter title}
///
/// {chapter text}
///
/// ====================
///
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextRenderer;

impl TextRenderer {
    /// Create a plain-text renderer.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for TextRenderer {
    fn render(&self, metadata: &NovelMetadata, chapters: &[ReconstructedChapter]) -> String {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        let mut out = format!("{}\n作者：{}\n\n", metadata.title, metadata.author);

        for chapter in chapters {
            out.push_str(&chapter.title);
            out.push_str("\n\n");
            out.push_str(&chapter.text);
            out.push_str("\n\n");
            out.push_str(&separator);
            out.push_str("\n\n");
        }

        out
    }
}
