//! Zlib implementation for WOFF 1.0 table data.
//!
//! Each compressed WOFF table is an independent zlib stream.
//! Uses the flate2 crate for decompression.

use crate::decoders::{StreamDecoder, ensure_within, read_bounded};
use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, ZlibDecoder};

/// Zlib decoder for WOFF tables.
pub struct FlateDecoder;

impl StreamDecoder for FlateDecoder {
    fn decode(&self, input: &[u8], limit: usize) -> Result<Vec<u8>> {
        match read_bounded(ZlibDecoder::new(input), limit) {
            Ok(output) => ensure_within(output, limit, self.name()),
            Err(e) => {
                // Some encoders emit raw deflate without the zlib wrapper
                log::debug!("Zlib decode failed ({}), trying raw deflate", e);
                match read_bounded(DeflateDecoder::new(input), limit) {
                    Ok(output) if !output.is_empty() => {
                        log::debug!("Raw deflate recovery succeeded: {} bytes", output.len());
                        ensure_within(output, limit, self.name())
                    },
                    _ => Err(Error::Decode(format!("Zlib decompression failed: {}", e))),
                }
            },
        }
    }

    fn name(&self) -> &str {
        "Zlib"
    }
}
