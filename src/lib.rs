//! Streaming JPEG marker-segment splicing.
//!
//! This crate carries metadata segments (Exif, APP14, comments, ...) from one
//! JPEG stream into another, typically after the second one was produced by a
//! re-encoder or lossless optimizer that stripped them.
//!
//! # Design Principles
//!
//! - **Streaming**: Segments are copied as they are read; nothing beyond a
//!   look-ahead buffer is held in memory
//! - **Opaque payloads**: Only marker bytes and lengths are interpreted
//! - **Exact scans**: Entropy-coded data passes through byte for byte,
//!   including stuffed `FF 00` bytes and restart markers
//! - **Safe replacement**: In-place updates go through a temporary file, so a
//!   failed splice never leaves a truncated image behind
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> jpeg_splice::Result<()> {
//! // Copy Exif/APP14/COM from the original into the optimized image
//! jpeg_splice::splice_metadata("original.jpg", "optimized.jpg")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Stream API
//!
//! ```
//! use jpeg_splice::{splice_streams, MetadataSet};
//! use std::io::Cursor;
//!
//! # fn main() -> jpeg_splice::Result<()> {
//! let donor = [0xFF, 0xD8, 0xFF, 0xFE, 0x00, 0x03, b'c', 0xFF, 0xD9];
//! let target = [0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x03, 0x00, 0xFF, 0xD9];
//!
//! let mut out = Vec::new();
//! splice_streams(&mut out, Cursor::new(donor), Cursor::new(target), &MetadataSet::default())?;
//!
//! assert_eq!(
//!     out,
//!     [0xFF, 0xD8, 0xFF, 0xFE, 0x00, 0x03, b'c', 0xFF, 0xDB, 0x00, 0x03, 0x00, 0xFF, 0xD9]
//! );
//! # Ok(())
//! # }
//! ```

mod error;
mod jpeg_io;
pub mod marker;
mod source;
mod splice;

pub use error::{Error, Result};
pub use jpeg_io::{
    copy_segments, scan_segments, BodyStats, CopyStats, SegmentHeader, SegmentInfo, SegmentReader,
};
pub use marker::{is_metadata_marker, marker_label, MetadataSet};
pub use source::{PeekReader, DEFAULT_BUFFER_SIZE};
pub use splice::{
    splice_files, splice_metadata, splice_metadata_with, splice_streams, SpliceOptions,
    SpliceReport,
};

// Test utilities - only compiled for tests or when explicitly enabled
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
