//! Page extraction.
//!
//! Pulls the pieces the pipeline needs out of fetched HTML: the chapter
//! content fragment and font URL from a reader page, and the novel metadata
//! and chapter list from a catalog page.

pub mod catalog;
pub mod chapter;

use std::fmt;

pub use catalog::{
    Catalog, ChapterRef, NovelMetadata, absolute_url, chapter_id, parse_catalog,
    parse_chapter_list, parse_novel_metadata,
};
pub use chapter::{ContentExtractor, ExtractedFragment, find_font_url};

/// Why a chapter has no content fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The page could not be downloaded
    Fetch(String),
    /// The page has no content container; the site layout probably changed
    StructureNotFound,
    /// The page withholds its content pending higher access (paid chapter, login)
    AccessRestricted,
}

impl FailureReason {
    /// Stable machine-readable tag.
    pub fn tag(&self) -> &'static str {
        match self {
            FailureReason::Fetch(_) => "FetchError",
            FailureReason::StructureNotFound => "StructureNotFound",
            FailureReason::AccessRestricted => "AccessRestricted",
        }
    }

    /// Human-readable reason shown in placeholders.
    pub fn description(&self) -> String {
        match self {
            FailureReason::Fetch(reason) => format!("网络请求失败 {}", reason),
            FailureReason::StructureNotFound => "未找到正文内容，页面结构可能已变化".to_string(),
            FailureReason::AccessRestricted => "章节受限，可能需要Cookie或为付费章节".to_string(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.tag())
    }
}

/// One chapter as extracted from its page.
///
/// Either a content fragment is present, or a [`FailureReason`] says why not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterContent {
    title: String,
    fragment: Option<String>,
    font_url: Option<String>,
    failure: Option<FailureReason>,
}

impl ChapterContent {
    /// A successfully extracted chapter.
    pub fn extracted(title: impl Into<String>, extracted: ExtractedFragment) -> Self {
        Self {
            title: title.into(),
            fragment: Some(extracted.fragment),
            font_url: extracted.font_url,
            failure: None,
        }
    }

    /// A chapter whose content could not be obtained.
    pub fn failed(title: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            title: title.into(),
            fragment: None,
            font_url: None,
            failure: Some(reason),
        }
    }

    /// Chapter title from the catalog.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Raw content container markup, absent on failure.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Obfuscation font referenced by the page, if any.
    pub fn font_url(&self) -> Option<&str> {
        self.font_url.as_deref()
    }

    /// Why extraction failed, if it did.
    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }
}
