//! Text reconstruction.
//!
//! Turns an extracted content fragment into plain text and runs it through the
//! font's codepoint table. Characters the table does not know pass through
//! unchanged; chapters that cannot be decoded at all carry a visible marker
//! instead of silently garbled text.

use scraper::{ElementRef, Html, Node};

use crate::extractors::{ChapterContent, FailureReason};
use crate::fonts::{CodepointCharMap, FontMapSource, FontOutcome};

/// First line of the text of a chapter whose font yielded no mapping.
pub const DECODE_FAILURE_MARKER: &str = "[系统提示：字体解密失败 (Mapping Empty)]";

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre", "section", "table",
    "tr", "ul",
];

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Accumulates flattened text, one entry per non-empty block line.
#[derive(Default)]
struct LineBuilder {
    lines: Vec<String>,
    current: String,
    pending_space: bool,
}

impl LineBuilder {
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_ascii_whitespace() {
                self.pending_space = true;
                continue;
            }
            if self.pending_space && !self.current.is_empty() {
                self.current.push(' ');
            }
            self.pending_space = false;
            self.current.push(c);
        }
    }

    fn break_line(&mut self) {
        let line = self.current.trim_matches(|c: char| c.is_ascii_whitespace());
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
        self.pending_space = false;
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

fn walk(element: ElementRef<'_>, out: &mut LineBuilder) {
    let name = element.value().name();
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }
    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        out.break_line();
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_text(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    walk(child, out);
                }
            },
            _ => {},
        }
    }

    if block {
        out.break_line();
    }
}

/// Flatten HTML markup to plain text.
///
/// Block elements and `<br>` become line breaks, runs of ASCII whitespace
/// collapse to one space, and empty lines are dropped. Other characters,
/// including ideographic spaces and private-use codepoints, are kept as-is.
///
/// # Examples
///
/// ```
/// use fontmask::reconstruct::flatten_fragment;
///
/// let text = flatten_fragment("<div><p>第一段</p>\n<p>  second   line </p></div>");
/// assert_eq!(text, "第一段\nsecond line");
/// ```
pub fn flatten_fragment(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    let mut out = LineBuilder::default();
    walk(document.root_element(), &mut out);
    out.finish()
}

/// Replace every mapped codepoint in `text`, leaving the rest untouched.
pub fn substitute(text: &str, map: &CodepointCharMap) -> String {
    text.chars()
        .map(|c| map.get(&(c as u32)).copied().unwrap_or(c))
        .collect()
}

/// Like [`substitute`], also counting private-use characters left unmapped.
pub fn substitute_counting(text: &str, map: &CodepointCharMap) -> (String, usize) {
    let mut unresolved = 0;
    let output = text
        .chars()
        .map(|c| match map.get(&(c as u32)) {
            Some(&mapped) => mapped,
            None => {
                if is_private_use(c) {
                    unresolved += 1;
                }
                c
            },
        })
        .collect();
    (output, unresolved)
}

/// Flatten `fragment` and decode it with `map`.
pub fn reconstruct(fragment: &str, map: &CodepointCharMap) -> String {
    substitute(&flatten_fragment(fragment), map)
}

/// Whether `c` lies in a Unicode Private Use Area.
pub fn is_private_use(c: char) -> bool {
    matches!(c as u32, 0xE000..=0xF8FF | 0xF0000..=0xFFFFD | 0x100000..=0x10FFFD)
}

/// Marker prepended to a chapter whose font gave an empty table.
pub fn decode_failure_marker(font_url: &str) -> String {
    format!("{}\n[Font URL: {}]\n", DECODE_FAILURE_MARKER, font_url)
}

/// Text standing in for a chapter whose content could not be extracted.
pub fn missing_placeholder(reason: &FailureReason) -> String {
    format!("[章节内容获取失败：{} ({})]", reason.description(), reason.tag())
}

/// How a chapter's text was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterStatus {
    /// Page was not obfuscated
    Plain,
    /// Decoded with a non-empty table
    Decoded {
        /// Private-use characters the table did not cover
        unresolved: usize,
    },
    /// Font yielded an empty table; text carries the failure marker
    DecodeFailed {
        /// Result of resolving the font
        outcome: FontOutcome,
    },
    /// No content; text is a placeholder
    Missing(FailureReason),
}

/// Final text of one chapter, always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedChapter {
    /// Chapter title
    pub title: String,
    /// Recovered text, marker-prefixed text, or placeholder
    pub text: String,
    /// Font the page referenced
    pub font_url: Option<String>,
    /// How `text` was produced
    pub status: ChapterStatus,
}

impl ReconstructedChapter {
    /// Whether the chapter text is readable content.
    pub fn is_success(&self) -> bool {
        matches!(self.status, ChapterStatus::Plain | ChapterStatus::Decoded { .. })
    }

    /// Whether the chapter is a placeholder for missing content.
    pub fn is_missing(&self) -> bool {
        matches!(self.status, ChapterStatus::Missing(_))
    }

    /// Whether the font could not be used to decode the chapter.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self.status, ChapterStatus::DecodeFailed { .. })
    }
}

/// Produce the final text of one chapter.
///
/// Missing content becomes a tagged placeholder, an unusable font adds the
/// decode failure marker, and anything else is substituted through the
/// font's table. Never fails.
pub fn reconstruct_chapter(chapter: &ChapterContent, fonts: &dyn FontMapSource) -> ReconstructedChapter {
    let title = chapter.title().to_string();
    let font_url = chapter.font_url().map(str::to_string);

    let Some(fragment) = chapter.fragment() else {
        let reason = chapter
            .failure()
            .cloned()
            .unwrap_or(FailureReason::StructureNotFound);
        log::warn!("Chapter '{}' missing: {}", title, reason);
        return ReconstructedChapter {
            title,
            text: missing_placeholder(&reason),
            font_url,
            status: ChapterStatus::Missing(reason),
        };
    };

    let flat = flatten_fragment(fragment);
    let Some(url) = chapter.font_url() else {
        return ReconstructedChapter {
            title,
            text: flat,
            font_url,
            status: ChapterStatus::Plain,
        };
    };

    let resolved = fonts.resolve_font(url);
    if resolved.is_empty() {
        log::warn!("Chapter '{}': font {} gave no mapping", title, url);
        return ReconstructedChapter {
            title,
            text: format!("{}{}", decode_failure_marker(url), flat),
            font_url,
            status: ChapterStatus::DecodeFailed {
                outcome: resolved.outcome,
            },
        };
    }

    let (text, unresolved) = substitute_counting(&flat, &resolved.map);
    if unresolved > 0 {
        log::warn!(
            "Chapter '{}': {} private-use characters not covered by {}",
            title,
            unresolved,
            url
        );
    }
    ReconstructedChapter {
        title,
        text,
        font_url,
        status: ChapterStatus::Decoded { unresolved },
    }
}
