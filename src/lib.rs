// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::new_without_default)]
#![allow(clippy::len_without_is_empty)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # fontmask
//!
//! Recover the real text of web-novel chapters that hide their characters
//! behind a per-page obfuscation font.
//!
//! Reader pages on the target site replace most characters with decoy
//! private-use codepoints and ship a custom web font that draws the right
//! glyph for each decoy. The glyph *order* inside those fonts is fixed; only
//! the codepoints change. Pairing the glyph order with a known
//! [reference alphabet](alphabet) gives back a codepoint → character table.
//!
//! ## Pipeline
//!
//! - **Extraction**: isolate the content container and font URL of a page ([`extractors`])
//! - **Font resolution**: download, unwrap WOFF/WOFF2, parse the cmap and glyph
//!   order, and cache one table per font URL ([`fonts`])
//! - **Reconstruction**: flatten the fragment and substitute codepoints, with
//!   visible markers for chapters that could not be decoded ([`reconstruct`])
//! - **Assembly**: plain-text or HTML output with the font embedded ([`converters`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use fontmask::config::DownloadConfig;
//! use fontmask::converters::OutputFormat;
//! use fontmask::net::HttpFetcher;
//! use fontmask::pipeline::Downloader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DownloadConfig::new().with_cookie("sessionid=...");
//! let downloader = Downloader::new(config, Arc::new(HttpFetcher::new()?))?;
//!
//! let catalog = downloader.fetch_catalog("https://fanqienovel.com/page/7143038691944959011")?;
//! let report = downloader.download(&catalog.chapters)?;
//! let text = downloader.render(OutputFormat::Text, &catalog.metadata, &report);
//! println!("{} chapters, {} failed", report.chapters.len(), report.failed);
//! # let _ = text;
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 (<http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license (<http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// De-obfuscation key
pub mod alphabet;

// Stream decoders
pub mod decoders;

// Font containers, tables and mapping
pub mod fonts;

// Page retrieval
pub mod net;

// Best-effort diagnostic trail
pub mod diagnostics;

// Page extraction
pub mod extractors;

// Text reconstruction
pub mod reconstruct;

// Output documents
pub mod converters;

// Batch pipeline
pub mod pipeline;

// Configuration
pub mod config;

// Re-exports
pub use alphabet::{REFERENCE_ALPHABET, ReferenceAlphabet};
pub use config::DownloadConfig;
pub use converters::OutputFormat;
pub use error::{Error, Result};
pub use extractors::{ChapterContent, FailureReason, NovelMetadata};
pub use fonts::{CodepointCharMap, FontCache, FontResolver, build_map};
pub use pipeline::{BatchReport, Downloader};
pub use reconstruct::{ReconstructedChapter, reconstruct};
