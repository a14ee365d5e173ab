//! Font cache and resolver.
//!
//! Each font URL is fetched and parsed at most once per [`FontCache`]. The
//! cache is an explicit object handed to the resolver rather than global
//! state, and it keeps failures too: a URL whose font could not be fetched or
//! parsed stays mapped to an empty table for the rest of the session.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use super::glyph_map::{CodepointCharMap, try_build_map};
use crate::alphabet::ReferenceAlphabet;
use crate::error::Result;
use crate::net::{FetchRequest, Fetcher, RequestProfile, fetch_success};

/// Default timeout for a font download.
pub const DEFAULT_FONT_TIMEOUT: Duration = Duration::from_secs(10);

/// How a cached font entry came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontOutcome {
    /// Font downloaded and parsed; the map may still be partial
    Parsed,
    /// Download failed; the map is empty
    FetchFailed(String),
    /// Payload was not a readable font; the map is empty
    ParseFailed(String),
}

impl FontOutcome {
    /// Whether the font was parsed.
    pub fn is_parsed(&self) -> bool {
        matches!(self, FontOutcome::Parsed)
    }
}

/// A cache entry: the codepoint table plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFont {
    /// Codepoint → character table, shared with every reader of the entry
    pub map: Arc<CodepointCharMap>,
    /// Fetch and parse result
    pub outcome: FontOutcome,
}

impl ResolvedFont {
    /// A parsed font entry.
    pub fn parsed(map: CodepointCharMap) -> Self {
        Self {
            map: Arc::new(map),
            outcome: FontOutcome::Parsed,
        }
    }

    /// An empty entry recording a failure.
    pub fn failed(outcome: FontOutcome) -> Self {
        Self {
            map: Arc::new(CodepointCharMap::new()),
            outcome,
        }
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Process-wide font URL → [`ResolvedFont`] table.
///
/// Entries are written once and never overwritten or evicted. Concurrent first
/// lookups of the same URL block on a per-key cell, so the resolve closure
/// runs at most once per URL.
#[derive(Debug, Default)]
pub struct FontCache {
    entries: Mutex<HashMap<String, Arc<OnceLock<ResolvedFont>>>>,
}

impl FontCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, url: &str) -> Arc<OnceLock<ResolvedFont>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(url.to_string()).or_default())
    }

    /// Cached entry for `url`, without resolving.
    pub fn get(&self, url: &str) -> Option<ResolvedFont> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(url).and_then(|slot| slot.get().cloned())
    }

    /// Cached entry for `url`, running `resolve` only if there is none yet.
    pub fn get_or_resolve<F>(&self, url: &str, resolve: F) -> ResolvedFont
    where
        F: FnOnce() -> ResolvedFont,
    {
        self.slot(url).get_or_init(resolve).clone()
    }

    /// Whether `url` has a finished entry.
    pub fn contains(&self, url: &str) -> bool {
        self.get(url).is_some()
    }

    /// Number of finished entries.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|slot| slot.get().is_some()).count()
    }

    /// Whether no entry has been finished.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Anything that can turn a font URL into a codepoint table.
pub trait FontMapSource {
    /// Resolve `url`, never failing; failures come back as empty entries.
    fn resolve_font(&self, url: &str) -> ResolvedFont;
}

/// Fetches, parses and caches obfuscation fonts.
pub struct FontResolver<'a> {
    fetcher: &'a dyn Fetcher,
    cache: &'a FontCache,
    profile: &'a RequestProfile,
    alphabet: &'a ReferenceAlphabet,
    timeout: Duration,
}

impl<'a> FontResolver<'a> {
    /// Resolver using the standard alphabet and the default font timeout.
    pub fn new(fetcher: &'a dyn Fetcher, cache: &'a FontCache, profile: &'a RequestProfile) -> Self {
        Self {
            fetcher,
            cache,
            profile,
            alphabet: ReferenceAlphabet::standard(),
            timeout: DEFAULT_FONT_TIMEOUT,
        }
    }

    /// Use a different decoding key.
    pub fn with_alphabet(mut self, alphabet: &'a ReferenceAlphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    /// Use a different download timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Codepoint table for `url`; empty if the font is unusable.
    pub fn resolve(&self, url: &str) -> Arc<CodepointCharMap> {
        self.resolve_font(url).map
    }

    /// Download the raw font payload, bypassing the cache.
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let request: FetchRequest = self.profile.request(url, self.timeout);
        let response = fetch_success(self.fetcher, &request)?;
        Ok(response.body)
    }

    fn load(&self, url: &str) -> ResolvedFont {
        log::debug!("Resolving font {}", url);

        let bytes = match self.fetch_bytes(url) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Font download failed for {}: {}", url, e);
                return ResolvedFont::failed(FontOutcome::FetchFailed(e.to_string()));
            },
        };

        let parsed = spool_payload(bytes).and_then(|spool| self.parse_spooled(spool));
        match parsed {
            Ok(map) => {
                log::info!("Font {} mapped {} codepoints", url, map.len());
                ResolvedFont::parsed(map)
            },
            Err(e) => {
                log::warn!("Font parse failed for {}: {}", url, e);
                ResolvedFont::failed(FontOutcome::ParseFailed(e.to_string()))
            },
        }
    }

    /// Parse a spooled payload. The file is closed, and reclaimed by the OS,
    /// before the tables are walked.
    fn parse_spooled(&self, mut spool: File) -> Result<CodepointCharMap> {
        let mut data = Vec::new();
        spool.read_to_end(&mut data)?;
        drop(spool);

        Ok(try_build_map(&data, self.alphabet)?)
    }
}

/// Move a downloaded payload into an anonymous temporary file, releasing the
/// response buffer. The returned file is rewound to the start.
fn spool_payload(bytes: Vec<u8>) -> Result<File> {
    let mut spool = tempfile::tempfile()?;
    spool.write_all(&bytes)?;
    drop(bytes);
    spool.seek(SeekFrom::Start(0))?;
    Ok(spool)
}

impl FontMapSource for FontResolver<'_> {
    fn resolve_font(&self, url: &str) -> ResolvedFont {
        self.cache.get_or_resolve(url, || self.load(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::net::FetchResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        response: Option<FetchResponse>,
    }

    impl CountingFetcher {
        fn new(response: Option<FetchResponse>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().ok_or_else(|| Error::Http {
                url: request.url.clone(),
                reason: "connection refused".to_string(),
            })
        }
    }

    const URL: &str = "https://cdn.example.com/font/abc.woff2";

    #[test]
    fn test_spooled_payload_reads_back() {
        let mut spool = spool_payload(b"wOF2 payload".to_vec()).unwrap();
        let mut data = Vec::new();
        spool.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"wOF2 payload");
    }

    #[test]
    fn test_parse_spooled_reports_font_error() {
        let fetcher = CountingFetcher::new(None);
        let cache = FontCache::new();
        let profile = RequestProfile::default();
        let resolver = FontResolver::new(&fetcher, &cache, &profile);

        let spool = spool_payload(b"not a font".to_vec()).unwrap();
        assert!(matches!(resolver.parse_spooled(spool), Err(Error::Font(_))));
    }

    #[test]
    fn test_fetch_failure_cached_once() {
        let fetcher = CountingFetcher::new(None);
        let cache = FontCache::new();
        let profile = RequestProfile::default();
        let resolver = FontResolver::new(&fetcher, &cache, &profile);

        let first = resolver.resolve_font(URL);
        assert!(first.is_empty());
        assert!(matches!(first.outcome, FontOutcome::FetchFailed(_)));

        let second = resolver.resolve_font(URL);
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_garbage_payload_is_parse_failure() {
        let fetcher = CountingFetcher::new(Some(FetchResponse::ok(b"not a font".to_vec())));
        let cache = FontCache::new();
        let profile = RequestProfile::default();
        let resolver = FontResolver::new(&fetcher, &cache, &profile);

        assert!(resolver.resolve(URL).is_empty());
        assert!(resolver.resolve(URL).is_empty());
        assert_eq!(fetcher.calls(), 1);
        assert!(matches!(
            cache.get(URL).map(|f| f.outcome),
            Some(FontOutcome::ParseFailed(_))
        ));
    }

    #[test]
    fn test_error_status_is_fetch_failure() {
        let fetcher = CountingFetcher::new(Some(FetchResponse {
            status: 404,
            body: Vec::new(),
        }));
        let cache = FontCache::new();
        let profile = RequestProfile::default();
        let resolver = FontResolver::new(&fetcher, &cache, &profile);

        let resolved = resolver.resolve_font(URL);
        assert!(matches!(resolved.outcome, FontOutcome::FetchFailed(_)));
    }

    #[test]
    fn test_cache_never_overwrites() {
        let cache = FontCache::new();
        let mut map = CodepointCharMap::new();
        map.insert(0xE001, 'X');

        cache.get_or_resolve(URL, || ResolvedFont::parsed(map));
        let again = cache.get_or_resolve(URL, || {
            ResolvedFont::failed(FontOutcome::ParseFailed("late".to_string()))
        });

        assert!(again.outcome.is_parsed());
        assert_eq!(again.map.get(&0xE001), Some(&'X'));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_empty_and_contains() {
        let cache = FontCache::new();
        assert!(cache.is_empty());
        assert!(!cache.contains(URL));
        assert!(cache.get(URL).is_none());

        cache.get_or_resolve(URL, || ResolvedFont::failed(FontOutcome::FetchFailed("x".into())));
        assert!(cache.contains(URL));
        assert!(!cache.contains("https://cdn.example.com/other.woff2"));
    }

    #[test]
    fn test_concurrent_first_access_resolves_once() {
        let cache = Arc::new(FontCache::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let runs = Arc::clone(&runs);
                std::thread::spawn(move || {
                    cache.get_or_resolve(URL, || {
                        runs.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(20));
                        ResolvedFont::parsed(CodepointCharMap::new())
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
