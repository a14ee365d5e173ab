//! Stream decoders for compressed font containers.
//!
//! Web fonts wrap their sfnt tables in one of two compression layers:
//! - Zlib - used per table by WOFF 1.0
//! - Brotli - used for the single table stream of WOFF 2.0
//!
//! Both decoders stop reading once the output passes a caller-supplied limit,
//! since the expected size comes from an untrusted header.

use crate::error::{Error, Result};

mod brotli;
mod flate;

pub use self::brotli::BrotliDecoder;
pub use self::flate::FlateDecoder;

/// Security limits for decompression (decompression bomb protection).
///
/// Real obfuscation fonts are a few hundred kilobytes; anything that claims to
/// expand past these limits is rejected.
///
/// Default values:
/// - Max decompression ratio: 100:1 (decompressed:compressed)
/// - Max decompressed size: 32 MB
pub const DEFAULT_MAX_DECOMPRESSION_RATIO: u32 = 100;
/// Upper bound on any single decoded buffer.
pub const DEFAULT_MAX_DECOMPRESSED_SIZE: usize = 32 * 1024 * 1024;

/// Trait for font stream decoders.
pub trait StreamDecoder {
    /// Decode the input data.
    ///
    /// # Arguments
    ///
    /// * `input` - The compressed data
    /// * `limit` - Largest acceptable output; decoding stops as soon as the
    ///   stream would produce more
    ///
    /// # Returns
    ///
    /// The decoded data or an error if decoding fails or exceeds `limit`.
    fn decode(&self, input: &[u8], limit: usize) -> Result<Vec<u8>>;

    /// Get the name of this decoder (e.g., "Brotli").
    fn name(&self) -> &str;
}

/// Decode `input` and check the result against the size the container declared.
///
/// # Arguments
///
/// * `decoder` - Decoder for the compression layer
/// * `input` - Compressed bytes
/// * `expected_len` - Decoded length declared by the container header
///
/// # Errors
///
/// Returns [`Error::Decode`] if the declared size exceeds the security limits,
/// the decoder fails, or the decoded length differs from `expected_len`.
pub fn decode_exact(
    decoder: &dyn StreamDecoder,
    input: &[u8],
    expected_len: usize,
) -> Result<Vec<u8>> {
    check_limits(input.len(), expected_len)?;

    let decoded = decoder.decode(input, expected_len)?;
    if decoded.len() != expected_len {
        return Err(Error::Decode(format!(
            "{} produced {} bytes, header declared {}",
            decoder.name(),
            decoded.len(),
            expected_len
        )));
    }

    log::trace!("{} decoded {} -> {} bytes", decoder.name(), input.len(), decoded.len());
    Ok(decoded)
}

/// Read `reader` to the end, buffering at most `limit + 1` bytes.
pub(crate) fn read_bounded<R: std::io::Read>(reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
    use std::io::Read;

    let mut output = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut output)?;
    Ok(output)
}

/// Reject output that ran past `limit`.
pub(crate) fn ensure_within(output: Vec<u8>, limit: usize, name: &str) -> Result<Vec<u8>> {
    if output.len() > limit {
        return Err(Error::Decode(format!("{} output exceeds limit of {} bytes", name, limit)));
    }
    Ok(output)
}

fn check_limits(compressed_size: usize, expected_len: usize) -> Result<()> {
    if expected_len > DEFAULT_MAX_DECOMPRESSED_SIZE {
        return Err(Error::Decode(format!(
            "Decompression bomb detected: declared size {} bytes exceeds limit {} bytes",
            expected_len, DEFAULT_MAX_DECOMPRESSED_SIZE
        )));
    }

    let ratio = expected_len as u64 / compressed_size.max(1) as u64;
    if ratio > DEFAULT_MAX_DECOMPRESSION_RATIO as u64 {
        return Err(Error::Decode(format!(
            "Decompression bomb detected: ratio {}:1 exceeds limit {}:1 (compressed: {} bytes, declared: {} bytes)",
            ratio, DEFAULT_MAX_DECOMPRESSION_RATIO, compressed_size, expected_len
        )));
    }

    Ok(())
}
