//! Web font container unwrapping.
//!
//! Pages reference their obfuscation font as WOFF2, occasionally WOFF or a
//! bare sfnt. The table parser only understands sfnt, so compressed containers
//! are rebuilt into an sfnt binary first.
//!
//! WOFF2 may apply a transform to `glyf`, `loca` and `hmtx`. Reversing it
//! reconstructs outlines, which the mapping never looks at, so transformed
//! tables are dropped from the rebuilt font instead.

use std::borrow::Cow;
use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::{FontError, FontResult};
use crate::decoders::{BrotliDecoder, FlateDecoder, decode_exact};

const SFNT_TRUETYPE: u32 = 0x0001_0000;
const SFNT_OPENTYPE: u32 = u32::from_be_bytes(*b"OTTO");
const SFNT_APPLE: u32 = u32::from_be_bytes(*b"true");
const SFNT_COLLECTION: u32 = u32::from_be_bytes(*b"ttcf");
const WOFF_SIGNATURE: u32 = u32::from_be_bytes(*b"wOFF");
const WOFF2_SIGNATURE: u32 = u32::from_be_bytes(*b"wOF2");

const WOFF_HEADER_LEN: u64 = 44;
const WOFF2_HEADER_LEN: u64 = 48;

/// Table tags addressed by index in a WOFF2 directory entry.
const WOFF2_KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

/// Outer container of a font binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Plain TrueType/OpenType
    Sfnt,
    /// WOFF 1.0 (per-table zlib)
    Woff,
    /// WOFF 2.0 (single Brotli stream)
    Woff2,
}

impl ContainerKind {
    /// Identify the container from its leading signature.
    pub fn detect(data: &[u8]) -> FontResult<Self> {
        if data.is_empty() {
            return Err(FontError::Empty);
        }
        let signature = Cursor::new(data).read_u32::<BigEndian>()?;
        match signature {
            SFNT_TRUETYPE | SFNT_OPENTYPE | SFNT_APPLE => Ok(ContainerKind::Sfnt),
            WOFF_SIGNATURE => Ok(ContainerKind::Woff),
            WOFF2_SIGNATURE => Ok(ContainerKind::Woff2),
            SFNT_COLLECTION => Err(FontError::Unsupported("font collection".to_string())),
            other => Err(FontError::UnknownContainer(other)),
        }
    }
}

/// Return the sfnt binary inside `data`, decompressing if needed.
///
/// Plain sfnt input is borrowed unchanged.
///
/// # Errors
///
/// Returns a [`FontError`] for empty or unrecognised input, truncated headers,
/// out-of-range table offsets, and corrupt compressed data.
pub fn unwrap_container(data: &[u8]) -> FontResult<Cow<'_, [u8]>> {
    match ContainerKind::detect(data)? {
        ContainerKind::Sfnt => Ok(Cow::Borrowed(data)),
        ContainerKind::Woff => unwrap_woff(data).map(Cow::Owned),
        ContainerKind::Woff2 => unwrap_woff2(data).map(Cow::Owned),
    }
}

fn tag_name(tag: &[u8; 4]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

fn unwrap_woff(data: &[u8]) -> FontResult<Vec<u8>> {
    let mut reader = Cursor::new(data);
    reader.set_position(4);
    let flavor = reader.read_u32::<BigEndian>()?;
    let _length = reader.read_u32::<BigEndian>()?;
    let num_tables = reader.read_u16::<BigEndian>()?;
    reader.set_position(WOFF_HEADER_LEN);

    let mut tables = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        let offset = reader.read_u32::<BigEndian>()? as usize;
        let comp_length = reader.read_u32::<BigEndian>()? as usize;
        let orig_length = reader.read_u32::<BigEndian>()? as usize;
        let _orig_checksum = reader.read_u32::<BigEndian>()?;

        let raw = offset
            .checked_add(comp_length)
            .and_then(|end| data.get(offset..end))
            .ok_or_else(|| FontError::TableOutOfBounds(tag_name(&tag)))?;

        let table = if comp_length < orig_length {
            decode_exact(&FlateDecoder, raw, orig_length)
                .map_err(|e| FontError::Decompress(format!("{}: {}", tag_name(&tag), e)))?
        } else if comp_length == orig_length {
            raw.to_vec()
        } else {
            return Err(FontError::Parse(format!(
                "table '{}' compressed length {} exceeds original {}",
                tag_name(&tag),
                comp_length,
                orig_length
            )));
        };
        tables.push((tag, table));
    }

    log::debug!("Unwrapped WOFF with {} tables", tables.len());
    build_sfnt(flavor, tables)
}

struct Woff2Entry {
    tag: [u8; 4],
    stream_length: usize,
    transformed: bool,
}

fn read_base128<R: Read>(reader: &mut R) -> FontResult<u32> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8()?;
        if i == 0 && byte == 0x80 {
            return Err(FontError::Parse("UIntBase128 with leading zero".to_string()));
        }
        if value & 0xFE00_0000 != 0 {
            return Err(FontError::Parse("UIntBase128 overflow".to_string()));
        }
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(FontError::Parse("UIntBase128 longer than 5 bytes".to_string()))
}

fn unwrap_woff2(data: &[u8]) -> FontResult<Vec<u8>> {
    let mut reader = Cursor::new(data);
    reader.set_position(4);
    let flavor = reader.read_u32::<BigEndian>()?;
    if flavor == SFNT_COLLECTION {
        return Err(FontError::Unsupported("WOFF2 font collection".to_string()));
    }
    let _length = reader.read_u32::<BigEndian>()?;
    let num_tables = reader.read_u16::<BigEndian>()?;
    let _reserved = reader.read_u16::<BigEndian>()?;
    let _total_sfnt_size = reader.read_u32::<BigEndian>()?;
    let total_compressed_size = reader.read_u32::<BigEndian>()? as usize;
    reader.set_position(WOFF2_HEADER_LEN);

    let mut entries = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        let flags = reader.read_u8()?;
        let tag = match (flags & 0x3F) as usize {
            63 => {
                let mut tag = [0u8; 4];
                reader.read_exact(&mut tag)?;
                tag
            },
            index => *WOFF2_KNOWN_TAGS[index],
        };
        let transform_version = (flags >> 6) & 0x03;
        let orig_length = read_base128(&mut reader)? as usize;

        // glyf/loca use version 3 as the null transform, every other table uses 0
        let transformed = if &tag == b"glyf" || &tag == b"loca" {
            transform_version != 3
        } else {
            transform_version != 0
        };
        let stream_length = if transformed {
            read_base128(&mut reader)? as usize
        } else {
            orig_length
        };

        entries.push(Woff2Entry {
            tag,
            stream_length,
            transformed,
        });
    }

    let start = reader.position() as usize;
    let compressed = start
        .checked_add(total_compressed_size)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| FontError::TableOutOfBounds("WOFF2 stream".to_string()))?;

    let expected = entries
        .iter()
        .try_fold(0usize, |sum, e| sum.checked_add(e.stream_length))
        .ok_or_else(|| FontError::Parse("WOFF2 table lengths overflow".to_string()))?;
    let stream = decode_exact(&BrotliDecoder, compressed, expected)
        .map_err(|e| FontError::Decompress(e.to_string()))?;

    let mut tables = Vec::with_capacity(entries.len());
    let mut offset = 0;
    for entry in entries {
        let end = offset + entry.stream_length;
        if entry.transformed {
            log::debug!("Dropping transformed WOFF2 table '{}'", tag_name(&entry.tag));
        } else {
            tables.push((entry.tag, stream[offset..end].to_vec()));
        }
        offset = end;
    }

    log::debug!("Unwrapped WOFF2 with {} usable tables", tables.len());
    build_sfnt(flavor, tables)
}

fn table_checksum(table: &[u8]) -> u32 {
    table.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Assemble an sfnt binary from `(tag, data)` pairs.
///
/// Table records are written in ascending tag order and each table is padded
/// to a four-byte boundary.
///
/// # Errors
///
/// Returns [`FontError::Parse`] for an empty table list, 4096 or more tables,
/// or offsets that do not fit in 32 bits.
pub fn build_sfnt(flavor: u32, mut tables: Vec<([u8; 4], Vec<u8>)>) -> FontResult<Vec<u8>> {
    if tables.is_empty() {
        return Err(FontError::Parse("font has no tables".to_string()));
    }
    tables.sort_by(|a, b| a.0.cmp(&b.0));

    let num_tables = u16::try_from(tables.len())
        .ok()
        .filter(|&n| u32::from(n) * 16 <= u32::from(u16::MAX))
        .ok_or_else(|| {
            FontError::Parse(format!("{} tables do not fit an sfnt directory", tables.len()))
        })?;

    let mut power = 1u32;
    let mut entry_selector = 0u16;
    while power * 2 <= u32::from(num_tables) {
        power *= 2;
        entry_selector += 1;
    }
    // num_tables * 16 <= u16::MAX, so both values fit
    let search_range = (power * 16) as u16;
    let range_shift = num_tables * 16 - search_range;

    let mut out = Vec::new();
    out.write_u32::<BigEndian>(flavor)?;
    out.write_u16::<BigEndian>(num_tables)?;
    out.write_u16::<BigEndian>(search_range)?;
    out.write_u16::<BigEndian>(entry_selector)?;
    out.write_u16::<BigEndian>(range_shift)?;

    let mut offset = 12 + 16 * tables.len();
    for (tag, table) in &tables {
        let table_offset = u32::try_from(offset)
            .map_err(|_| FontError::Parse(format!("table '{}' offset exceeds 4 GB", tag_name(tag))))?;
        let table_len = u32::try_from(table.len())
            .map_err(|_| FontError::Parse(format!("table '{}' exceeds 4 GB", tag_name(tag))))?;
        out.extend_from_slice(tag);
        out.write_u32::<BigEndian>(table_checksum(table))?;
        out.write_u32::<BigEndian>(table_offset)?;
        out.write_u32::<BigEndian>(table_len)?;
        offset += (table.len() + 3) & !3;
    }

    for (_, table) in &tables {
        out.extend_from_slice(table);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }

    Ok(out)
}
