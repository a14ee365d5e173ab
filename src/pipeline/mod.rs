//! Sequential download pipeline.
//!
//! ```text
//! catalog page
//!     ↓
//! [parse_catalog] (metadata + ChapterRef[])
//!     ↓  one chapter at a time, paced
//! [ContentExtractor] (reader page → fragment + font URL)
//!     ↓
//! [FontResolver] (font URL → codepoint table, cached)
//!     ↓
//! [reconstruct_chapter] (ReconstructedChapter)
//!     ↓
//! [assemble] (text / HTML document)
//! ```
//!
//! Chapters are processed in the order given. A chapter that fails at any
//! stage still yields a placeholder entry in its slot, so the report always
//! has one entry per processed chapter.

pub mod pacing;
pub mod selection;

use std::ops::ControlFlow;
use std::sync::Arc;

pub use pacing::Pacer;
pub use selection::{apply_selection, select_chapters};

use crate::config::DownloadConfig;
use crate::converters::{EmbeddedFont, OutputFormat, assemble};
use crate::diagnostics::{DiagnosticSink, FileSink, NullSink, record};
use crate::error::{Error, Result};
use crate::extractors::{
    Catalog, ChapterContent, ChapterRef, ContentExtractor, FailureReason, NovelMetadata,
    parse_catalog,
};
use crate::fonts::{FontCache, FontResolver};
use crate::net::{Fetcher, RequestProfile, fetch_success};
use crate::reconstruct::{ReconstructedChapter, reconstruct_chapter};

/// Progress after one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress<'a> {
    /// 1-based position of the chapter just finished
    pub index: usize,
    /// Number of chapters requested
    pub total: usize,
    /// Title of the chapter just finished
    pub title: &'a str,
    /// Readable chapters so far
    pub succeeded: usize,
    /// Placeholder chapters so far
    pub failed: usize,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One entry per processed chapter, in request order
    pub chapters: Vec<ReconstructedChapter>,
    /// Number of chapters requested
    pub requested: usize,
    /// Chapters with readable text
    pub succeeded: usize,
    /// Chapters replaced by a placeholder
    pub failed: usize,
    /// Chapters kept with a font decoding marker
    pub decode_failed: usize,
    /// Whether the batch stopped before the last requested chapter
    pub cancelled: bool,
}

impl BatchReport {
    fn new(requested: usize) -> Self {
        Self {
            chapters: Vec::with_capacity(requested),
            requested,
            ..Self::default()
        }
    }

    fn push(&mut self, chapter: ReconstructedChapter) {
        if chapter.is_success() {
            self.succeeded += 1;
        } else if chapter.is_missing() {
            self.failed += 1;
        } else if chapter.is_decode_failure() {
            self.decode_failed += 1;
        }
        self.chapters.push(chapter);
    }

    /// Font URL of the first readable chapter, used for HTML font embedding.
    ///
    /// Placeholder and decode-failure entries are skipped.
    pub fn first_font_url(&self) -> Option<&str> {
        self.chapters
            .iter()
            .find(|c| c.is_success())
            .and_then(|c| c.font_url.as_deref())
    }
}

/// Drives catalog parsing, chapter fetching, decoding and assembly.
pub struct Downloader {
    config: DownloadConfig,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn DiagnosticSink>,
    cache: FontCache,
    profile: RequestProfile,
    extractor: ContentExtractor,
    pacer: Pacer,
}

impl Downloader {
    /// Create a downloader.
    ///
    /// Diagnostics go to a [`FileSink`] when `config.diagnostics_dir` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not validate.
    pub fn new(config: DownloadConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;
        let sink: Arc<dyn DiagnosticSink> = match &config.diagnostics_dir {
            Some(dir) => Arc::new(FileSink::new(dir)),
            None => Arc::new(NullSink),
        };
        Ok(Self {
            profile: RequestProfile::from_config(&config),
            pacer: Pacer::from_config(&config),
            extractor: ContentExtractor::new(),
            cache: FontCache::new(),
            fetcher,
            sink,
            config,
        })
    }

    /// Send diagnostics to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Use a different pacing policy.
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Use a different content extractor.
    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Session configuration.
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Fonts resolved so far.
    pub fn font_cache(&self) -> &FontCache {
        &self.cache
    }

    fn resolver(&self) -> FontResolver<'_> {
        FontResolver::new(self.fetcher.as_ref(), &self.cache, &self.profile)
            .with_timeout(self.config.font_timeout())
    }

    fn note(&self, message: &str) {
        record(self.sink.as_ref(), message);
    }

    /// Fetch and parse a catalog page.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if the page cannot be downloaded.
    pub fn fetch_catalog(&self, url: &str) -> Result<Catalog> {
        self.note(&format!("Fetching catalog: {}", url));
        let request = self.profile.request(url, self.config.page_timeout());
        let response = fetch_success(self.fetcher.as_ref(), &request)?;
        Ok(parse_catalog(&response.text(), &self.config.base_url))
    }

    /// Fetch one reader page and extract its content.
    ///
    /// Never fails: download and extraction problems come back as a
    /// [`ChapterContent`] carrying the [`FailureReason`].
    pub fn fetch_chapter(&self, chapter: &ChapterRef) -> ChapterContent {
        self.note(&format!("Fetching chapter: {}", chapter.url));
        let request = self.profile.request(&chapter.url, self.config.page_timeout());

        let response = match fetch_success(self.fetcher.as_ref(), &request) {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Chapter '{}' fetch failed: {}", chapter.title, e);
                self.note(&format!("Error fetching chapter content: {}", e));
                return ChapterContent::failed(&chapter.title, FailureReason::Fetch(e.to_string()));
            },
        };

        let body = response.text();
        self.note(&format!("Response length: {}", body.len()));

        match self.extractor.extract(&body) {
            Ok(extracted) => {
                match &extracted.font_url {
                    Some(url) => self.note(&format!("Font URL found: {}", url)),
                    None => self.note("Font URL not found"),
                }
                ChapterContent::extracted(&chapter.title, extracted)
            },
            Err(reason) => {
                self.note(&format!("Content not extracted: {}", reason));
                self.sink.save_page(chapter.id(), &body);
                ChapterContent::failed(&chapter.title, reason)
            },
        }
    }

    /// Download and decode `chapters` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `chapters` is empty. Per-chapter
    /// failures never abort the batch.
    pub fn download(&self, chapters: &[ChapterRef]) -> Result<BatchReport> {
        self.download_with(chapters, |_| ControlFlow::Continue(()))
    }

    /// Like [`download`](Self::download), reporting progress after each chapter.
    ///
    /// Returning [`ControlFlow::Break`] from `progress` stops the batch; the
    /// chapters finished so far are kept and the report is marked cancelled.
    pub fn download_with<F>(&self, chapters: &[ChapterRef], mut progress: F) -> Result<BatchReport>
    where
        F: FnMut(&Progress<'_>) -> ControlFlow<()>,
    {
        if chapters.is_empty() {
            return Err(Error::InvalidInput("no chapters selected".to_string()));
        }

        let total = chapters.len();
        let resolver = self.resolver();
        let mut report = BatchReport::new(total);
        log::info!("Downloading {} chapters", total);

        for (index, chapter) in chapters.iter().enumerate() {
            if index > 0 {
                self.pacer.pause();
            }

            let content = self.fetch_chapter(chapter);
            let rebuilt = reconstruct_chapter(&content, &resolver);
            log::debug!("[{}/{}] {} -> {:?}", index + 1, total, chapter.title, rebuilt.status);
            report.push(rebuilt);

            let update = Progress {
                index: index + 1,
                total,
                title: &chapter.title,
                succeeded: report.succeeded,
                failed: report.failed,
            };
            if progress(&update).is_break() {
                report.cancelled = index + 1 < total;
                log::info!("Batch stopped after chapter {} of {}", index + 1, total);
                break;
            }
        }

        self.note(&format!(
            "Batch finished: {} succeeded, {} failed, {} font failures",
            report.succeeded, report.failed, report.decode_failed
        ));
        log::info!(
            "Downloaded {} of {} chapters ({} failed)",
            report.succeeded,
            total,
            report.failed
        );
        Ok(report)
    }

    /// The first readable chapter's font, downloaded for HTML embedding.
    ///
    /// Returns `None` when that chapter has no font or the download fails.
    pub fn embedded_font(&self, report: &BatchReport) -> Option<EmbeddedFont> {
        let url = report.first_font_url()?;
        match self.resolver().fetch_bytes(url) {
            Ok(bytes) => Some(EmbeddedFont::new(url, bytes)),
            Err(e) => {
                log::warn!("Could not download font for embedding: {}", e);
                None
            },
        }
    }

    /// Assemble a finished batch into an output document.
    pub fn render(&self, format: OutputFormat, metadata: &NovelMetadata, report: &BatchReport) -> String {
        let font = match format {
            OutputFormat::Html => self.embedded_font(report),
            OutputFormat::Text => None,
        };
        assemble(format, metadata, &report.chapters, font.as_ref())
    }
}
