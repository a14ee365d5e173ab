//! Reader page content extraction.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

use super::FailureReason;
use crate::error::{Error, Result};

/// Content container on reader pages.
pub const CONTENT_SELECTOR: &str = "div.muye-reader-content";

/// Placeholder shown instead of the container when access is withheld.
pub const RESTRICTED_SELECTOR: &str = "div.no-content";

lazy_static! {
    static ref FONT_URL_RE: Regex =
        Regex::new(r#"https://[^"'\s()<>]+\.(?:woff2|woff|ttf|otf)"#).unwrap();
    static ref DEFAULT_CONTENT: Selector = Selector::parse(CONTENT_SELECTOR).unwrap();
    static ref DEFAULT_RESTRICTED: Selector = Selector::parse(RESTRICTED_SELECTOR).unwrap();
}

/// The content container and font reference of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFragment {
    /// Outer HTML of the content container
    pub fragment: String,
    /// First web-font URL anywhere in the page
    pub font_url: Option<String>,
}

/// First web-font URL in `body`, searching the whole page text.
///
/// # Examples
///
/// ```
/// use fontmask::extractors::find_font_url;
///
/// let page = r#"<style>src:url("https://cdn.example.com/f/a1.woff2")</style>"#;
/// assert_eq!(find_font_url(page).as_deref(), Some("https://cdn.example.com/f/a1.woff2"));
/// assert_eq!(find_font_url("<p>plain</p>"), None);
/// ```
pub fn find_font_url(body: &str) -> Option<String> {
    FONT_URL_RE.find(body).map(|m| m.as_str().to_string())
}

/// Isolates the content fragment of a reader page.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    content: Selector,
    restricted: Selector,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor {
    /// Extractor for the site's reader page layout.
    pub fn new() -> Self {
        Self {
            content: DEFAULT_CONTENT.clone(),
            restricted: DEFAULT_RESTRICTED.clone(),
        }
    }

    /// Extractor with custom CSS selectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either selector does not parse.
    pub fn with_selectors(content: &str, restricted: &str) -> Result<Self> {
        let parse = |css: &str| {
            Selector::parse(css)
                .map_err(|e| Error::InvalidInput(format!("bad selector '{}': {}", css, e)))
        };
        Ok(Self {
            content: parse(content)?,
            restricted: parse(restricted)?,
        })
    }

    /// Pull the content container and font URL out of a page body.
    ///
    /// A missing container is reported as [`FailureReason::AccessRestricted`]
    /// when the restriction marker is present, [`FailureReason::StructureNotFound`]
    /// otherwise. A page without a font URL is simply not obfuscated.
    pub fn extract(&self, body: &str) -> std::result::Result<ExtractedFragment, FailureReason> {
        let document = Html::parse_document(body);

        let Some(container) = document.select(&self.content).next() else {
            if document.select(&self.restricted).next().is_some() {
                log::debug!("Content container missing, restriction marker present");
                return Err(FailureReason::AccessRestricted);
            }
            log::debug!("Content container missing");
            return Err(FailureReason::StructureNotFound);
        };

        let font_url = find_font_url(body);
        match &font_url {
            Some(url) => log::debug!("Font URL found: {}", url),
            None => log::debug!("No font URL on page"),
        }

        Ok(ExtractedFragment {
            fragment: container.html(),
            font_url,
        })
    }
}
