//! Catalog page parsing: novel metadata and the ordered chapter list.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

/// Title used when the catalog page has none.
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Author used when the catalog page has none.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

lazy_static! {
    static ref TITLE: Selector = Selector::parse("h1").unwrap();
    static ref AUTHOR: Selector = Selector::parse("span.author-name-text").unwrap();
    static ref COVER: Selector = Selector::parse("img.novel-cover-image").unwrap();
    static ref CHAPTER_LINK: Selector = Selector::parse(".chapter-item a").unwrap();
}

/// Novel-level information shown at the top of the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovelMetadata {
    /// Novel title
    pub title: String,
    /// Author name
    pub author: String,
    /// Cover image URL
    pub cover_url: Option<String>,
}

impl Default for NovelMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            cover_url: None,
        }
    }
}

/// A chapter link from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    /// Link text
    pub title: String,
    /// Absolute reader page URL
    pub url: String,
}

impl ChapterRef {
    /// Create a chapter reference.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// Identifier taken from the last path segment of the URL.
    pub fn id(&self) -> &str {
        chapter_id(&self.url)
    }
}

/// Everything read from a catalog page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Novel title, author and cover
    pub metadata: NovelMetadata,
    /// Chapters in reading order
    pub chapters: Vec<ChapterRef>,
}

/// Parse a catalog page.
///
/// # Arguments
///
/// * `body` - Catalog page HTML
/// * `base_url` - Site root used to absolutise relative chapter links
pub fn parse_catalog(body: &str, base_url: &str) -> Catalog {
    let document = Html::parse_document(body);
    let catalog = Catalog {
        metadata: parse_novel_metadata(&document),
        chapters: parse_chapter_list(&document, base_url),
    };
    log::info!(
        "Catalog '{}' by {}: {} chapters",
        catalog.metadata.title,
        catalog.metadata.author,
        catalog.chapters.len()
    );
    catalog
}

/// Title, author and cover of a parsed catalog page.
pub fn parse_novel_metadata(document: &Html) -> NovelMetadata {
    let defaults = NovelMetadata::default();
    NovelMetadata {
        title: first_text(document, &TITLE).unwrap_or(defaults.title),
        author: first_text(document, &AUTHOR).unwrap_or(defaults.author),
        cover_url: document
            .select(&COVER)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string),
    }
}

/// Chapter links of a parsed catalog page, in document order.
///
/// Links without an `href` are skipped.
pub fn parse_chapter_list(document: &Html, base_url: &str) -> Vec<ChapterRef> {
    document
        .select(&CHAPTER_LINK)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            Some(ChapterRef::new(element_text(link), absolute_url(href, base_url)))
        })
        .collect()
}

/// Resolve a catalog link against the site root.
///
/// # Examples
///
/// ```
/// use fontmask::extractors::absolute_url;
///
/// let base = "https://fanqienovel.com";
/// assert_eq!(absolute_url("/reader/42", base), "https://fanqienovel.com/reader/42");
/// assert_eq!(absolute_url("https://x.com/reader/1", base), "https://x.com/reader/1");
/// ```
pub fn absolute_url(href: &str, base_url: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{}", rest);
    }

    let base = base_url.trim_end_matches('/');
    match href.strip_prefix('/') {
        Some(path) => format!("{}/{}", base, path),
        None => format!("{}/{}", base, href),
    }
}

/// Last non-empty path segment of a chapter URL, without query or fragment.
pub fn chapter_id(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or(path)
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
