//! Font handling for obfuscated chapter text.
//!
//! This module turns a downloaded web font into a codepoint → character table:
//! unwrap the WOFF/WOFF2 container, read the glyph order and preferred cmap,
//! and line the glyph order up against the reference alphabet.

pub mod cache;
pub mod container;
pub mod glyph_map;
pub mod tables;

pub use cache::{FontCache, FontMapSource, FontOutcome, FontResolver, ResolvedFont};
pub use container::{ContainerKind, unwrap_container};
pub use glyph_map::{
    CodepointCharMap, GlyphCharMap, build_codepoint_map, build_glyph_char_map, build_map,
    try_build_map, uni_name_to_char,
};
pub use tables::FontTables;

/// Error types for font container and table parsing.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// Font payload is empty
    #[error("Font data is empty")]
    Empty,

    /// First four bytes are not a known font signature
    #[error("Unknown font container signature 0x{0:08X}")]
    UnknownContainer(u32),

    /// Recognised container using a feature this crate does not handle
    #[error("Unsupported font container: {0}")]
    Unsupported(String),

    /// Header or directory ended early
    #[error("Font data truncated: {0}")]
    Truncated(#[from] std::io::Error),

    /// Table directory points outside the payload
    #[error("Table '{0}' lies outside the font data")]
    TableOutOfBounds(String),

    /// Compressed table data could not be decoded
    #[error("Failed to decompress font tables: {0}")]
    Decompress(String),

    /// sfnt structure rejected by the table parser
    #[error("Failed to parse font: {0}")]
    Parse(String),
}

/// Result type for font operations.
pub type FontResult<T> = Result<T, FontError>;
