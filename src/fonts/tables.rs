//! Glyph order and cmap extraction.
//!
//! This module wraps the `ttf-parser` crate to pull out the two tables the
//! mapping engine needs: the glyph order (glyph id → glyph name) and the
//! preferred codepoint → glyph id subtable.

use std::collections::BTreeMap;

use ttf_parser::{Face, GlyphId, PlatformId};

use super::container::unwrap_container;
use super::{FontError, FontResult};

/// cmap subtables in order of preference, as (platform, encoding).
///
/// Full-repertoire Unicode first, then BMP-only Unicode tables.
const CMAP_PREFERENCE: [(PlatformId, u16); 8] = [
    (PlatformId::Windows, 10),
    (PlatformId::Unicode, 6),
    (PlatformId::Unicode, 4),
    (PlatformId::Windows, 1),
    (PlatformId::Unicode, 3),
    (PlatformId::Unicode, 2),
    (PlatformId::Unicode, 1),
    (PlatformId::Unicode, 0),
];

/// The tables of one font that drive de-obfuscation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontTables {
    /// Glyph names indexed by glyph id; index 0 is `.notdef`
    pub glyph_order: Vec<String>,
    /// Codepoint → glyph id from the preferred cmap subtable
    pub cmap: BTreeMap<u32, GlyphId>,
}

impl FontTables {
    /// Parse a font binary in any supported container.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Empty`] for empty input, and container or parse
    /// errors for anything that is not a readable font.
    pub fn parse(data: &[u8]) -> FontResult<Self> {
        let sfnt = unwrap_container(data)?;
        Self::from_sfnt(&sfnt)
    }

    /// Parse an uncompressed sfnt binary.
    pub fn from_sfnt(sfnt: &[u8]) -> FontResult<Self> {
        let face = Face::parse(sfnt, 0).map_err(|e| FontError::Parse(e.to_string()))?;

        let glyph_order: Vec<String> = (0..face.number_of_glyphs())
            .map(|id| match face.glyph_name(GlyphId(id)) {
                Some(name) => name.to_string(),
                None => format!("glyph{:05}", id),
            })
            .collect();
        let cmap = preferred_cmap(&face);

        log::debug!(
            "Parsed font: {} glyphs, {} cmap entries",
            glyph_order.len(),
            cmap.len()
        );

        Ok(Self { glyph_order, cmap })
    }

    /// Name of a glyph, if the id is inside the glyph order.
    pub fn glyph_name(&self, glyph: GlyphId) -> Option<&str> {
        self.glyph_order.get(glyph.0 as usize).map(String::as_str)
    }
}

fn preferred_cmap(face: &Face<'_>) -> BTreeMap<u32, GlyphId> {
    let mut mapping = BTreeMap::new();
    let Some(table) = face.tables().cmap else {
        log::debug!("Font has no cmap table");
        return mapping;
    };

    for (platform, encoding) in CMAP_PREFERENCE {
        let chosen = table
            .subtables
            .into_iter()
            .find(|s| s.platform_id == platform && s.encoding_id == encoding);

        if let Some(subtable) = chosen {
            log::trace!("Using cmap subtable ({:?}, {})", platform, encoding);
            subtable.codepoints(|codepoint| {
                if let Some(glyph) = subtable.glyph_index(codepoint) {
                    mapping.insert(codepoint, glyph);
                }
            });
            return mapping;
        }
    }

    log::debug!("Font has no Unicode cmap subtable");
    mapping
}
