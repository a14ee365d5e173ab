//! Brotli implementation for the WOFF 2.0 table stream.

use crate::decoders::{StreamDecoder, ensure_within, read_bounded};
use crate::error::{Error, Result};

const BUFFER_SIZE: usize = 4096;

/// Brotli decoder for WOFF2 compressed data.
pub struct BrotliDecoder;

impl StreamDecoder for BrotliDecoder {
    fn decode(&self, input: &[u8], limit: usize) -> Result<Vec<u8>> {
        let decoder = brotli_decompressor::Decompressor::new(input, BUFFER_SIZE);
        let output = read_bounded(decoder, limit)
            .map_err(|e| Error::Decode(format!("Brotli decompression failed: {}", e)))?;
        ensure_within(output, limit, self.name())
    }

    fn name(&self) -> &str {
        "Brotli"
    }
}
