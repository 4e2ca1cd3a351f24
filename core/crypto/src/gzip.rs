//! GZip compression helpers.

use std::io::{self, Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use tracing::debug;

use sealkit_common::{Error, Result};

/// Compress `data` into a GZip member.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    compress_stream(data, &mut output)?;
    Ok(output)
}

/// Compress the UTF-8 bytes of `data`.
pub fn compress_str(data: &str) -> Result<Vec<u8>> {
    compress(data.as_bytes())
}

/// Compress everything from `reader` into `writer`.
///
/// Returns the number of uncompressed bytes consumed.
pub fn compress_stream<R: Read, W: Write>(mut reader: R, writer: W) -> Result<u64> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    let consumed = io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?.flush()?;

    debug!(bytes = consumed, "gzip compressed");
    Ok(consumed)
}

/// Decompress a GZip member.
///
/// # Errors
/// - `Io` if `data` is not valid GZip
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    decompress_stream(data, &mut output)?;
    Ok(output)
}

/// Decompress a Base64-encoded GZip member.
///
/// # Errors
/// - `Encoding` if `data` is not Base64
/// - `Io` if the decoded bytes are not valid GZip
pub fn decompress_base64(data: &str) -> Result<Vec<u8>> {
    let compressed = STANDARD
        .decode(data)
        .map_err(|e| Error::Encoding(format!("Invalid base64: {}", e)))?;
    decompress(&compressed)
}

/// Decompress everything from `reader` into `writer`.
///
/// Returns the number of decompressed bytes written.
pub fn decompress_stream<R: Read, W: Write>(reader: R, mut writer: W) -> Result<u64> {
    let mut decoder = GzDecoder::new(reader);
    let written = io::copy(&mut decoder, &mut writer)?;
    writer.flush()?;

    debug!(bytes = written, "gzip decompressed");
    Ok(written)
}
