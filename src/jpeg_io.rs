//! JPEG marker-segment reader and filtering copier
//!
//! The reader walks a JPEG stream strictly front to back, one segment at a
//! time. Segment payloads are never buffered whole; they are streamed to the
//! destination (or discarded) as they are read. Entropy-coded data after an
//! SOS header is located by scanning for the next marker that is neither a
//! stuffed `FF 00` nor a restart marker `FF D0..D7`.

use crate::{
    error::{Error, Result},
    marker::{
        is_restart, is_standalone, marker_label, EOI, MARKER_PREFIX, SOI, SOS, STUFFED_ZERO,
    },
    source::PeekReader,
};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use log::{debug, trace};
use std::io::{self, Read, Write};

/// Marker and length of one segment as it appears in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Marker byte following the 0xFF prefix
    pub marker: u8,
    /// Offset of the 0xFF prefix in the source
    pub offset: u64,
    /// Declared length (counts itself); `None` for markers without a length field
    pub length: Option<u16>,
}

impl SegmentHeader {
    /// Number of payload bytes that follow the length field
    pub fn payload_len(&self) -> u64 {
        self.length.map_or(0, |len| u64::from(len) - 2)
    }

    /// Marker plus length field, in bytes
    pub fn header_len(&self) -> u64 {
        if self.length.is_some() {
            4
        } else {
            2
        }
    }

    pub fn is_sos(&self) -> bool {
        self.marker == SOS
    }

    pub fn label(&self) -> &'static str {
        marker_label(self.marker)
    }

    /// Write the marker and, if present, the length field
    pub fn write_to<W: Write + ?Sized>(&self, dst: &mut W) -> Result<u64> {
        dst.write_u8(MARKER_PREFIX)?;
        dst.write_u8(self.marker)?;
        if let Some(length) = self.length {
            dst.write_u16::<BigEndian>(length)?;
        }
        Ok(self.header_len())
    }
}

/// Bytes consumed from the source for one segment body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyStats {
    /// Payload bytes covered by the length field
    pub payload: u64,
    /// Entropy-coded bytes following an SOS header
    pub entropy: u64,
}

impl BodyStats {
    pub fn total(&self) -> u64 {
        self.payload + self.entropy
    }
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    Nothing,
    Payload { remaining: u64, then_entropy: bool },
    Entropy,
}

/// Streaming reader over the segments of one JPEG stream
///
/// Call [`next_segment`](Self::next_segment) to get each header, then either
/// [`copy_body`](Self::copy_body) or [`skip_body`](Self::skip_body). A body
/// left untouched is skipped automatically by the next `next_segment` call,
/// so the source always advances by exactly the declared payload length.
///
/// After any error the reader is left mid-segment and must not be reused.
pub struct SegmentReader<R> {
    source: PeekReader<R>,
    pending: Pending,
    eoi_offset: Option<u64>,
}

impl<R: Read> SegmentReader<R> {
    /// Start reading a stream; fails unless it begins with SOI
    pub fn new(source: R) -> Result<Self> {
        Self::from_peek_reader(PeekReader::new(source))
    }

    /// Start reading from an already-wrapped source
    pub fn from_peek_reader(mut source: PeekReader<R>) -> Result<Self> {
        let offset = source.offset();
        let soi = source.read_array::<2>("SOI marker")?;
        if soi != [MARKER_PREFIX, SOI] {
            return Err(Error::malformed(
                offset,
                format!("Expected SOI (FF D8), got {:02X} {:02X}", soi[0], soi[1]),
            ));
        }
        Ok(Self {
            source,
            pending: Pending::Nothing,
            eoi_offset: None,
        })
    }

    /// Offset of the next unconsumed source byte
    pub fn offset(&self) -> u64 {
        self.source.offset()
    }

    /// Offset of the EOI marker, once it has been reached
    pub fn eoi_offset(&self) -> Option<u64> {
        self.eoi_offset
    }

    /// Read the next segment header, or `None` once EOI is reached
    ///
    /// EOI itself is not returned. Bytes after EOI are left unread and
    /// ignored. Fill bytes (extra 0xFF before a marker) are skipped.
    pub fn next_segment(&mut self) -> Result<Option<SegmentHeader>> {
        if self.eoi_offset.is_some() {
            return Ok(None);
        }
        self.skip_body()?;

        loop {
            let offset = self.source.offset();
            let bytes = self.source.peek(2, "marker")?;
            let (prefix, marker) = (bytes[0], bytes[1]);

            if prefix != MARKER_PREFIX {
                return Err(Error::malformed(
                    offset,
                    format!("Expected 0xFF, got 0x{:02X}", prefix),
                ));
            }

            // Fill byte
            if marker == MARKER_PREFIX {
                self.source.consume(1);
                continue;
            }
            self.source.consume(2);

            if marker == EOI {
                self.eoi_offset = Some(offset);
                self.note_trailing_data()?;
                return Ok(None);
            }

            if is_standalone(marker) {
                return Ok(Some(SegmentHeader {
                    marker,
                    offset,
                    length: None,
                }));
            }

            let length = BigEndian::read_u16(&self.source.read_array::<2>("segment length")?);
            if length < 2 {
                return Err(Error::malformed(
                    offset + 2,
                    format!(
                        "{} segment declares length {} (minimum is 2)",
                        marker_label(marker),
                        length
                    ),
                ));
            }

            self.pending = Pending::Payload {
                remaining: u64::from(length) - 2,
                then_entropy: marker == SOS,
            };
            return Ok(Some(SegmentHeader {
                marker,
                offset,
                length: Some(length),
            }));
        }
    }

    /// Stream the current segment's payload (and scan data, after SOS) to `dst`
    pub fn copy_body<W: Write + ?Sized>(&mut self, dst: &mut W) -> Result<BodyStats> {
        self.drain(dst)
    }

    /// Consume and drop the current segment's payload (and scan data, after SOS)
    pub fn skip_body(&mut self) -> Result<BodyStats> {
        self.drain(&mut io::sink())
    }

    fn drain<W: Write + ?Sized>(&mut self, dst: &mut W) -> Result<BodyStats> {
        let mut stats = BodyStats::default();

        if let Pending::Payload {
            remaining,
            then_entropy,
        } = self.pending
        {
            stats.payload = self.source.copy_to(dst, remaining, "segment payload")?;
            self.pending = if then_entropy {
                Pending::Entropy
            } else {
                Pending::Nothing
            };
        }

        if let Pending::Entropy = self.pending {
            stats.entropy = self.copy_entropy(dst)?;
            self.pending = Pending::Nothing;
        }

        Ok(stats)
    }

    /// Pass entropy-coded bytes through until the next structural marker
    ///
    /// Leaves the terminating marker unconsumed.
    fn copy_entropy<W: Write + ?Sized>(&mut self, dst: &mut W) -> Result<u64> {
        let start = self.source.offset();
        let mut copied = 0u64;

        loop {
            let chunk = self.source.buffered()?;
            if chunk.is_empty() {
                return Err(Error::UnexpectedEndOfStream {
                    offset: self.source.offset(),
                    context: "entropy-coded data",
                });
            }

            // Everything up to the next 0xFF is plain scan data
            let run = chunk
                .iter()
                .position(|&b| b == MARKER_PREFIX)
                .unwrap_or(chunk.len());
            if run > 0 {
                dst.write_all(&chunk[..run])?;
                self.source.consume(run);
                copied += run as u64;
                continue;
            }

            let next = self.source.peek(2, "entropy-coded data")?[1];
            if next == STUFFED_ZERO || is_restart(next) {
                // Stuffed byte or restart marker: one byte at a time, then re-peek
                dst.write_u8(MARKER_PREFIX)?;
                self.source.consume(1);
                copied += 1;
                continue;
            }

            trace!(
                "entropy-coded data at {}: {} bytes, ends at {}",
                start,
                copied,
                marker_label(next)
            );
            return Ok(copied);
        }
    }

    fn note_trailing_data(&mut self) -> Result<()> {
        // Some cameras append data after EOI; it is neither copied nor rejected
        if !self.source.buffered()?.is_empty() {
            debug!(
                "ignoring trailing data after EOI at offset {}",
                self.source.offset()
            );
        }
        Ok(())
    }
}

/// Outcome of one filtered copy pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Segments written to the destination
    pub kept: usize,
    /// Segments consumed and discarded
    pub dropped: usize,
    /// Bytes written to the destination
    pub bytes_written: u64,
}

/// Copy every segment of `source` whose marker passes `keep` to `dst`
///
/// The source must start with SOI and is consumed up to and including EOI.
/// Neither SOI nor EOI is written; the caller frames the output. Kept SOS
/// segments carry their entropy-coded data with them unchanged.
pub fn copy_segments<R, W, F>(dst: &mut W, source: R, mut keep: F) -> Result<CopyStats>
where
    R: Read,
    W: Write + ?Sized,
    F: FnMut(u8) -> bool,
{
    let mut reader = SegmentReader::new(source)?;
    let mut stats = CopyStats::default();

    while let Some(header) = reader.next_segment()? {
        if keep(header.marker) {
            let written = header.write_to(dst)?;
            let body = reader.copy_body(dst)?;
            stats.kept += 1;
            stats.bytes_written += written + body.total();
            debug!(
                "kept {} at offset {} ({} bytes)",
                header.label(),
                header.offset,
                written + body.total()
            );
        } else {
            let body = reader.skip_body()?;
            stats.dropped += 1;
            debug!(
                "dropped {} at offset {} ({} bytes)",
                header.label(),
                header.offset,
                header.header_len() + body.total()
            );
        }
    }

    Ok(stats)
}

/// One entry of a segment listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    pub marker: u8,
    pub offset: u64,
    pub length: Option<u16>,
    /// Entropy-coded bytes following the segment (SOS only)
    pub entropy_len: u64,
}

impl SegmentInfo {
    pub fn label(&self) -> &'static str {
        marker_label(self.marker)
    }

    /// Bytes occupied in the stream, including scan data
    pub fn total_size(&self) -> u64 {
        match self.length {
            Some(length) => 2 + u64::from(length) + self.entropy_len,
            None => 2,
        }
    }
}

/// List every segment of a stream, including SOI and EOI
pub fn scan_segments<R: Read>(source: R) -> Result<Vec<SegmentInfo>> {
    let mut reader = SegmentReader::new(source)?;
    let mut segments = vec![SegmentInfo {
        marker: SOI,
        offset: 0,
        length: None,
        entropy_len: 0,
    }];

    while let Some(header) = reader.next_segment()? {
        let body = reader.skip_body()?;
        segments.push(SegmentInfo {
            marker: header.marker,
            offset: header.offset,
            length: header.length,
            entropy_len: body.entropy,
        });
    }

    if let Some(offset) = reader.eoi_offset() {
        segments.push(SegmentInfo {
            marker: EOI,
            offset,
            length: None,
            entropy_len: 0,
        });
    }

    Ok(segments)
}
