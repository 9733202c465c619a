//! Compression codec for large text columns
//!
//! Text is zlib-compressed and stored as a lowercase hex string.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use thiserror::Error;

/// Errors raised while encoding or decoding a stored text column
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid hex payload: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Deflate stream error: {0}")]
    Deflate(#[from] std::io::Error),

    #[error("Decompressed text is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Compresses text into a hex-encoded zlib stream
pub fn compress(text: &str) -> Result<String, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let bytes = encoder.finish()?;
    Ok(hex::encode(bytes))
}

/// Restores text produced by `compress`
pub fn decompress(payload: &str) -> Result<String, CodecError> {
    let bytes = hex::decode(payload)?;
    let mut decoder = ZlibDecoder::new(bytes.as_slice());
    let mut output = Vec::new();
    decoder.read_to_end(&mut output)?;
    Ok(String::from_utf8(output)?)
}
