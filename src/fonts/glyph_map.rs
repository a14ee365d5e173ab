//! Glyph mapping engine.
//!
//! An obfuscation font keeps its glyphs in a fixed order that matches the
//! [reference alphabet](crate::alphabet), while the cmap sends decoy codepoints
//! to those glyphs. Joining the two gives the codepoint → character table:
//!
//! ```text
//! glyph order:  [.notdef, g1,  g2,  g3 ...]
//! alphabet:     [         '0', '1', '2' ...]
//! cmap:         0xE3E8 → g2
//! result:       0xE3E8 → '1'
//! ```

use std::collections::HashMap;

use ttf_parser::GlyphId;

use super::FontResult;
use super::tables::FontTables;
use crate::alphabet::ReferenceAlphabet;

/// Glyph id → recovered character.
pub type GlyphCharMap = HashMap<GlyphId, char>;

/// Codepoint → recovered character; the de-obfuscation table for one font.
pub type CodepointCharMap = HashMap<u32, char>;

/// Pair glyph order positions with the alphabet.
///
/// Glyph 0 (`.notdef`) is skipped; glyph `i` takes `alphabet[i - 1]`. Glyphs
/// past the end of the alphabet get no entry.
pub fn build_glyph_char_map(glyph_count: usize, alphabet: &ReferenceAlphabet) -> GlyphCharMap {
    let limit = glyph_count.min(alphabet.len() + 1).min(u16::MAX as usize + 1);
    (1..limit)
        .filter_map(|index| {
            alphabet
                .get(index - 1)
                .map(|c| (GlyphId(index as u16), c))
        })
        .collect()
}

/// Decode a `uniXXXX` glyph name to its character.
///
/// # Examples
///
/// ```
/// use fontmask::fonts::uni_name_to_char;
///
/// assert_eq!(uni_name_to_char("uni4E00"), Some('一'));
/// assert_eq!(uni_name_to_char("uni4E00.alt"), None);
/// assert_eq!(uni_name_to_char("gid58344"), None);
/// ```
pub fn uni_name_to_char(name: &str) -> Option<char> {
    let hex = name.strip_prefix("uni")?;
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Build the codepoint → character table from parsed font tables.
///
/// A cmap entry whose glyph has a position in the alphabet takes that
/// character; otherwise a `uniXXXX` glyph name supplies it; otherwise the
/// codepoint is left out. A partial table is a normal result.
pub fn build_codepoint_map(tables: &FontTables, alphabet: &ReferenceAlphabet) -> CodepointCharMap {
    let glyph_chars = build_glyph_char_map(tables.glyph_order.len(), alphabet);

    let mut mapping = CodepointCharMap::with_capacity(tables.cmap.len());
    for (&codepoint, &glyph) in &tables.cmap {
        if let Some(&c) = glyph_chars.get(&glyph) {
            mapping.insert(codepoint, c);
        } else if let Some(c) = tables.glyph_name(glyph).and_then(uni_name_to_char) {
            mapping.insert(codepoint, c);
        } else {
            log::trace!("No mapping for U+{:04X} (glyph {})", codepoint, glyph.0);
        }
    }

    log::debug!(
        "Built codepoint map: {} of {} cmap entries mapped",
        mapping.len(),
        tables.cmap.len()
    );
    mapping
}

/// Parse `font` and build its codepoint table, reporting parse failures.
pub fn try_build_map(font: &[u8], alphabet: &ReferenceAlphabet) -> FontResult<CodepointCharMap> {
    let tables = FontTables::parse(font)?;
    Ok(build_codepoint_map(&tables, alphabet))
}

/// Parse `font` and build its codepoint table; unreadable fonts give an empty table.
pub fn build_map(font: &[u8], alphabet: &ReferenceAlphabet) -> CodepointCharMap {
    match try_build_map(font, alphabet) {
        Ok(mapping) => mapping,
        Err(e) => {
            log::warn!("Font could not be parsed: {}", e);
            CodepointCharMap::new()
        },
    }
}
