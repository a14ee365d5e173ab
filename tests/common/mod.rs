//! Shared fixtures for integration tests: a hand-assembled font and a
//! scripted network fetcher.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use byteorder::{BigEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use fontmask::fonts::container::build_sfnt;
use fontmask::net::{FetchRequest, FetchResponse, Fetcher};
use fontmask::{Error, Result};

const SFNT_TRUETYPE: u32 = 0x0001_0000;

/// Build a minimal TrueType font.
///
/// Glyph 0 is `.notdef`; glyph `i + 1` is named `names[i]` and is reached
/// from codepoint `first_codepoint + i` through a format 4 cmap subtable.
pub fn build_font(names: &[&str], first_codepoint: u16) -> Vec<u8> {
    let num_glyphs = names.len() as u16 + 1;
    let tables = vec![
        (*b"head", head_table()),
        (*b"hhea", vec![0u8; 36]),
        (*b"maxp", maxp_table(num_glyphs)),
        (*b"post", post_table(names)),
        (*b"cmap", cmap_table(names.len() as u16, first_codepoint)),
    ];
    build_sfnt(SFNT_TRUETYPE, tables).unwrap()
}

fn head_table() -> Vec<u8> {
    let mut head = Vec::with_capacity(54);
    head.write_u32::<BigEndian>(0x0001_0000).unwrap(); // version
    head.write_u32::<BigEndian>(0x0001_0000).unwrap(); // fontRevision
    head.write_u32::<BigEndian>(0).unwrap(); // checkSumAdjustment
    head.write_u32::<BigEndian>(0x5F0F_3CF5).unwrap(); // magicNumber
    head.write_u16::<BigEndian>(0).unwrap(); // flags
    head.write_u16::<BigEndian>(1000).unwrap(); // unitsPerEm
    head.write_u64::<BigEndian>(0).unwrap(); // created
    head.write_u64::<BigEndian>(0).unwrap(); // modified
    for _ in 0..4 {
        head.write_i16::<BigEndian>(0).unwrap(); // bbox
    }
    head.write_u16::<BigEndian>(0).unwrap(); // macStyle
    head.write_u16::<BigEndian>(8).unwrap(); // lowestRecPPEM
    head.write_i16::<BigEndian>(2).unwrap(); // fontDirectionHint
    head.write_i16::<BigEndian>(0).unwrap(); // indexToLocFormat
    head.write_i16::<BigEndian>(0).unwrap(); // glyphDataFormat
    assert_eq!(head.len(), 54);
    head
}

fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut maxp = Vec::with_capacity(6);
    maxp.write_u32::<BigEndian>(0x0000_5000).unwrap();
    maxp.write_u16::<BigEndian>(num_glyphs).unwrap();
    maxp
}

fn post_table(names: &[&str]) -> Vec<u8> {
    let mut post = Vec::new();
    post.write_u32::<BigEndian>(0x0002_0000).unwrap();
    post.resize(32, 0);
    post.write_u16::<BigEndian>(names.len() as u16 + 1).unwrap();
    post.write_u16::<BigEndian>(0).unwrap(); // .notdef
    for i in 0..names.len() {
        post.write_u16::<BigEndian>(258 + i as u16).unwrap();
    }
    for name in names {
        post.push(name.len() as u8);
        post.extend_from_slice(name.as_bytes());
    }
    post
}

fn cmap_table(count: u16, first_codepoint: u16) -> Vec<u8> {
    let mut segments: Vec<(u16, u16, u16)> = Vec::new();
    if count > 0 {
        let delta = 1u16.wrapping_sub(first_codepoint);
        segments.push((first_codepoint, first_codepoint + count - 1, delta));
    }
    segments.push((0xFFFF, 0xFFFF, 1));

    let seg_count = segments.len() as u16;
    let length = 16 + 8 * seg_count;

    let mut cmap = Vec::new();
    cmap.write_u16::<BigEndian>(0).unwrap(); // version
    cmap.write_u16::<BigEndian>(1).unwrap(); // numTables
    cmap.write_u16::<BigEndian>(3).unwrap(); // Windows
    cmap.write_u16::<BigEndian>(1).unwrap(); // Unicode BMP
    cmap.write_u32::<BigEndian>(12).unwrap();

    cmap.write_u16::<BigEndian>(4).unwrap();
    cmap.write_u16::<BigEndian>(length).unwrap();
    cmap.write_u16::<BigEndian>(0).unwrap(); // language
    cmap.write_u16::<BigEndian>(seg_count * 2).unwrap();
    cmap.write_u16::<BigEndian>(2).unwrap(); // searchRange
    cmap.write_u16::<BigEndian>(0).unwrap(); // entrySelector
    cmap.write_u16::<BigEndian>(seg_count * 2 - 2).unwrap(); // rangeShift
    for &(_, end, _) in &segments {
        cmap.write_u16::<BigEndian>(end).unwrap();
    }
    cmap.write_u16::<BigEndian>(0).unwrap(); // reservedPad
    for &(start, _, _) in &segments {
        cmap.write_u16::<BigEndian>(start).unwrap();
    }
    for &(_, _, delta) in &segments {
        cmap.write_u16::<BigEndian>(delta).unwrap();
    }
    for _ in &segments {
        cmap.write_u16::<BigEndian>(0).unwrap(); // idRangeOffset
    }
    cmap
}

/// `(tag, data)` pairs of an sfnt binary, in directory order, and its flavor.
pub fn sfnt_tables(sfnt: &[u8]) -> (u32, Vec<([u8; 4], Vec<u8>)>) {
    let read_u16 = |at: usize| u16::from_be_bytes([sfnt[at], sfnt[at + 1]]);
    let read_u32 =
        |at: usize| u32::from_be_bytes([sfnt[at], sfnt[at + 1], sfnt[at + 2], sfnt[at + 3]]);

    let tables = (0..read_u16(4) as usize)
        .map(|i| {
            let record = 12 + 16 * i;
            let offset = read_u32(record + 8) as usize;
            let length = read_u32(record + 12) as usize;
            let mut tag = [0u8; 4];
            tag.copy_from_slice(&sfnt[record..record + 4]);
            (tag, sfnt[offset..offset + length].to_vec())
        })
        .collect();
    (read_u32(0), tables)
}

/// Re-wrap an sfnt binary as WOFF 1.0 with zlib-compressed tables.
pub fn to_woff(sfnt: &[u8]) -> Vec<u8> {
    let (flavor, tables) = sfnt_tables(sfnt);
    let mut offset = 44 + 20 * tables.len();
    let mut directory = Vec::new();
    let mut bodies = Vec::new();

    for (tag, data) in &tables {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(data).unwrap();
        let compressed = encoder.finish().unwrap();
        let stored = if compressed.len() < data.len() {
            compressed
        } else {
            data.clone()
        };

        directory.extend_from_slice(tag);
        directory.write_u32::<BigEndian>(offset as u32).unwrap();
        directory.write_u32::<BigEndian>(stored.len() as u32).unwrap();
        directory.write_u32::<BigEndian>(data.len() as u32).unwrap();
        directory.write_u32::<BigEndian>(0).unwrap();
        offset += stored.len();
        bodies.extend_from_slice(&stored);
    }

    let mut woff = Vec::new();
    woff.extend_from_slice(b"wOFF");
    woff.write_u32::<BigEndian>(flavor).unwrap();
    woff.write_u32::<BigEndian>(offset as u32).unwrap();
    woff.write_u16::<BigEndian>(tables.len() as u16).unwrap();
    woff.resize(44, 0);
    woff.extend_from_slice(&directory);
    woff.extend_from_slice(&bodies);
    woff
}

/// WOFF 1.0 header declaring `count` zero-length tables.
pub fn woff_with_empty_tables(count: u16) -> Vec<u8> {
    let end = 44 + 20 * count as u32;
    let mut woff = Vec::new();
    woff.extend_from_slice(b"wOFF");
    woff.write_u32::<BigEndian>(SFNT_TRUETYPE).unwrap();
    woff.write_u32::<BigEndian>(end).unwrap();
    woff.write_u16::<BigEndian>(count).unwrap();
    woff.resize(44, 0);
    for i in 0..count {
        woff.extend_from_slice(b"xx");
        woff.write_u16::<BigEndian>(i).unwrap();
        woff.write_u32::<BigEndian>(end).unwrap(); // offset
        woff.write_u32::<BigEndian>(0).unwrap(); // compLength
        woff.write_u32::<BigEndian>(0).unwrap(); // origLength
        woff.write_u32::<BigEndian>(0).unwrap(); // origChecksum
    }
    woff
}

/// How a WOFF 2.0 file stores its `glyf`/`loca` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outlines {
    /// Tables stored as-is (transform version 3)
    Untransformed,
    /// Tables stored with the glyf transform (version 0)
    Transformed,
}

fn write_base128(mut value: u32, out: &mut Vec<u8>) {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    bytes.reverse();
    out.extend_from_slice(&bytes);
}

/// Re-wrap an sfnt binary as WOFF 2.0, adding an empty `glyf`/`loca` pair.
///
/// Every glyph gets an empty outline. With [`Outlines::Transformed`] the pair
/// is stored as a transformed `glyf` stream and a zero-length `loca`.
pub fn to_woff2(sfnt: &[u8], outlines: Outlines) -> Vec<u8> {
    let (flavor, mut tables) = sfnt_tables(sfnt);
    let maxp = &tables.iter().find(|(tag, _)| tag == b"maxp").unwrap().1;
    let num_glyphs = u16::from_be_bytes([maxp[4], maxp[5]]) as usize;
    tables.push((*b"glyf", vec![0u8; 4]));
    tables.push((*b"loca", vec![0u8; (num_glyphs + 1) * 2]));

    let mut directory = Vec::new();
    let mut stream = Vec::new();
    for (tag, data) in &tables {
        let outline = tag == b"glyf" || tag == b"loca";
        let transformed = outline && outlines == Outlines::Transformed;
        // Index 63: the tag follows the flags byte
        let flags = if outline && !transformed { 0xC0 | 63 } else { 63 };
        directory.push(flags);
        directory.extend_from_slice(tag);
        write_base128(data.len() as u32, &mut directory);

        if !transformed {
            stream.extend_from_slice(data);
        } else if tag == b"glyf" {
            let glyf_stream = vec![0u8; 36];
            write_base128(glyf_stream.len() as u32, &mut directory);
            stream.extend_from_slice(&glyf_stream);
        } else {
            write_base128(0, &mut directory);
        }
    }

    let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, 11, 22);
    writer.write_all(&stream).unwrap();
    let compressed = writer.into_inner();

    let padded: usize = tables.iter().map(|(_, d)| (d.len() + 3) & !3).sum();
    let total_sfnt_size = 12 + 16 * tables.len() + padded;
    let mut woff2 = Vec::new();
    woff2.extend_from_slice(b"wOF2");
    woff2.write_u32::<BigEndian>(flavor).unwrap();
    woff2.write_u32::<BigEndian>((48 + directory.len() + compressed.len()) as u32).unwrap();
    woff2.write_u16::<BigEndian>(tables.len() as u16).unwrap();
    woff2.write_u16::<BigEndian>(0).unwrap(); // reserved
    woff2.write_u32::<BigEndian>(total_sfnt_size as u32).unwrap();
    woff2.write_u32::<BigEndian>(compressed.len() as u32).unwrap();
    woff2.write_u16::<BigEndian>(1).unwrap(); // majorVersion
    woff2.resize(48, 0);
    woff2.extend_from_slice(&directory);
    woff2.extend_from_slice(&compressed);
    woff2
}

/// Fetcher serving canned responses and recording every request.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, FetchResponse>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `url`.
    pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) -> &Self {
        self.respond(url, FetchResponse::ok(body))
    }

    /// Serve an empty body with `status` at `url`.
    pub fn serve_status(&self, url: &str, status: u16) -> &Self {
        self.respond(
            url,
            FetchResponse {
                status,
                body: Vec::new(),
            },
        )
    }

    fn respond(&self, url: &str, response: FetchResponse) -> &Self {
        self.responses.lock().unwrap().insert(url.to_string(), response);
        self
    }

    /// How many times `url` was requested.
    pub fn hits(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    /// Every request made, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .ok_or_else(|| Error::Http {
                url: request.url.clone(),
                reason: "connection refused".to_string(),
            })
    }
}

/// Reader page whose content container holds one paragraph per entry.
pub fn reader_page(paragraphs: &[&str], font_url: Option<&str>) -> String {
    let style = font_url
        .map(|url| format!("<style>@font-face {{ src: url({}) }}</style>", url))
        .unwrap_or_default();
    let body: String = paragraphs.iter().map(|p| format!("<p>{}</p>", p)).collect();
    format!(
        "<html><head>{}</head><body><div class=\"muye-reader-content noselect\">{}</div></body></html>",
        style, body
    )
}
