//! Test utilities for building synthetic JPEG streams.
//!
//! Real encoders produce megabytes of scan data; the marker-segment layer
//! only cares about structure, so tests describe streams segment by segment.
//!
//! # Usage
//!
//! ```
//! use jpeg_splice::test_utils::JpegBuilder;
//!
//! let jpeg = JpegBuilder::new()
//!     .segment(0xE1, b"Exif\0\0")
//!     .segment(0xDB, &[0x00; 4])
//!     .scan(&[0x01, 0x00], &[0x12, 0xFF, 0x00, 0x34])
//!     .build();
//!
//! assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
//! assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
//! ```

use crate::marker::{EOI, MARKER_PREFIX, SOI, SOS};
use std::path::{Path, PathBuf};

/// Builder for JPEG streams made of opaque segments
#[derive(Debug, Clone, Default)]
pub struct JpegBuilder {
    body: Vec<u8>,
    trailing: Vec<u8>,
}

impl JpegBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment with a length field
    ///
    /// Panics if the payload does not fit a 16-bit length.
    pub fn segment(mut self, marker: u8, payload: &[u8]) -> Self {
        self.body.extend_from_slice(&segment_bytes(marker, payload));
        self
    }

    /// Append an SOS header followed by entropy-coded bytes
    pub fn scan(mut self, header: &[u8], entropy: &[u8]) -> Self {
        self.body.extend_from_slice(&segment_bytes(SOS, header));
        self.body.extend_from_slice(entropy);
        self
    }

    /// Append a two-byte marker with no length field
    pub fn marker(mut self, marker: u8) -> Self {
        self.body.extend_from_slice(&[MARKER_PREFIX, marker]);
        self
    }

    /// Append raw bytes verbatim
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    /// Bytes to place after EOI
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing = bytes.to_vec();
        self
    }

    /// Complete stream framed by SOI and EOI
    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![MARKER_PREFIX, SOI];
        out.extend_from_slice(&self.body);
        out.extend_from_slice(&[MARKER_PREFIX, EOI]);
        out.extend_from_slice(&self.trailing);
        out
    }

    /// Stream with SOI but without EOI
    pub fn build_unterminated(&self) -> Vec<u8> {
        let mut out = vec![MARKER_PREFIX, SOI];
        out.extend_from_slice(&self.body);
        out
    }

    /// Segment bytes only, without SOI/EOI framing
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Encode one segment: marker, big-endian length (counting itself), payload
pub fn segment_bytes(marker: u8, payload: &[u8]) -> Vec<u8> {
    let length = u16::try_from(payload.len() + 2).expect("payload too large for a JPEG segment");
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.extend_from_slice(&[MARKER_PREFIX, marker]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Write `bytes` to `name` inside `dir` and return the path
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_bytes_length_counts_itself() {
        assert_eq!(segment_bytes(0xFE, b"ab"), vec![0xFF, 0xFE, 0x00, 0x04, b'a', b'b']);
        assert_eq!(segment_bytes(0xFE, b""), vec![0xFF, 0xFE, 0x00, 0x02]);
    }

    #[test]
    fn test_builder_framing() {
        let builder = JpegBuilder::new().marker(0xD0).trailing(&[0xAA]);
        assert_eq!(builder.build(), vec![0xFF, 0xD8, 0xFF, 0xD0, 0xFF, 0xD9, 0xAA]);
        assert_eq!(builder.build_unterminated(), vec![0xFF, 0xD8, 0xFF, 0xD0]);
        assert_eq!(builder.body(), &[0xFF, 0xD0]);
    }
}
