//! Buffered byte source with look-ahead
//!
//! Segment parsing needs two primitives a plain `BufRead` cannot give across
//! buffer boundaries: "peek N bytes without consuming" and "consume exactly N
//! bytes". [`PeekReader`] provides both on top of any `Read`, and tracks the
//! absolute offset of the next unconsumed byte for error reporting.

use crate::error::{Error, Result};
use std::io::{self, Read, Write};

/// Default look-ahead buffer size (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 65536;

/// Smallest buffer that still allows a marker + length peek
const MIN_BUFFER_SIZE: usize = 8;

/// Sequential byte source supporting bounded peeks
pub struct PeekReader<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    end: usize,
    offset: u64,
}

impl<R: Read> PeekReader<R> {
    /// Wrap a reader with the default buffer size
    pub fn new(inner: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, inner)
    }

    /// Wrap a reader with a specific buffer size
    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner,
            buf: vec![0u8; capacity.max(MIN_BUFFER_SIZE)].into_boxed_slice(),
            pos: 0,
            end: 0,
            offset: 0,
        }
    }

    /// Absolute offset of the next unconsumed byte
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Unwrap, discarding any buffered bytes
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Try to have at least `n` bytes buffered; returns how many are available
    fn fill_to(&mut self, n: usize) -> io::Result<usize> {
        debug_assert!(n <= self.buf.len());
        if self.end - self.pos >= n {
            return Ok(self.end - self.pos);
        }
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.end, 0);
            self.end -= self.pos;
            self.pos = 0;
        }
        while self.end < n {
            match self.inner.read(&mut self.buf[self.end..]) {
                Ok(0) => break,
                Ok(read) => self.end += read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(self.end - self.pos)
    }

    /// Look at the next `n` bytes without consuming them
    pub fn peek(&mut self, n: usize, context: &'static str) -> Result<&[u8]> {
        if self.fill_to(n)? < n {
            return Err(Error::UnexpectedEndOfStream {
                offset: self.offset,
                context,
            });
        }
        Ok(&self.buf[self.pos..self.pos + n])
    }

    /// Whatever is buffered, refilling first if empty; empty only at end of stream
    pub fn buffered(&mut self) -> Result<&[u8]> {
        self.fill_to(1)?;
        Ok(&self.buf[self.pos..self.end])
    }

    /// Consume `n` bytes that were previously peeked
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.end - self.pos, "consume past buffered data");
        let n = n.min(self.end - self.pos);
        self.pos += n;
        self.offset += n as u64;
    }

    /// Read and consume exactly `N` bytes
    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.peek(N, context)?);
        self.consume(N);
        Ok(out)
    }

    /// Copy exactly `n` bytes to `dst`
    ///
    /// Fails with `UnexpectedEndOfStream` if the source runs out first; the
    /// bytes copied before that point have already been written to `dst`.
    pub fn copy_to<W: Write + ?Sized>(
        &mut self,
        dst: &mut W,
        n: u64,
        context: &'static str,
    ) -> Result<u64> {
        let mut remaining = n;
        while remaining > 0 {
            let chunk = self.buffered()?;
            if chunk.is_empty() {
                return Err(Error::UnexpectedEndOfStream {
                    offset: self.offset,
                    context,
                });
            }
            let take = chunk.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
            dst.write_all(&chunk[..take])?;
            self.consume(take);
            remaining -= take as u64;
        }
        Ok(n)
    }

    /// Consume and drop exactly `n` bytes
    pub fn discard(&mut self, n: u64, context: &'static str) -> Result<u64> {
        self.copy_to(&mut io::sink(), n, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out one byte per call to exercise refills
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.split_first() {
                Some((&b, rest)) if !buf.is_empty() => {
                    buf[0] = b;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_peek_across_buffer_boundary() {
        let data: Vec<u8> = (0u8..32).collect();
        let mut reader = PeekReader::with_capacity(8, Trickle(&data));

        reader.discard(7, "test").unwrap();
        // Only one byte left in the first buffer fill; peek must compact and refill
        assert_eq!(reader.peek(2, "test").unwrap(), &[7, 8]);
        assert_eq!(reader.offset(), 7);

        reader.consume(1);
        assert_eq!(reader.read_array::<3>("test").unwrap(), [8, 9, 10]);
        assert_eq!(reader.offset(), 11);
    }

    #[test]
    fn test_copy_exact_count() {
        let mut reader = PeekReader::with_capacity(8, Cursor::new(vec![1u8; 20]));
        let mut out: Vec<u8> = Vec::new();

        assert_eq!(reader.copy_to(&mut out, 13, "test").unwrap(), 13);
        assert_eq!(out.len(), 13);
        assert_eq!(reader.offset(), 13);

        reader.discard(7, "test").unwrap();
        assert!(reader.buffered().unwrap().is_empty());
    }

    #[test]
    fn test_short_source_is_unexpected_end() {
        let mut reader = PeekReader::new(Cursor::new(vec![0xFFu8]));
        match reader.peek(2, "marker") {
            Err(Error::UnexpectedEndOfStream { offset, context }) => {
                assert_eq!(offset, 0);
                assert_eq!(context, "marker");
            }
            other => panic!("expected UnexpectedEndOfStream, got {:?}", other.map(|b| b.to_vec())),
        }

        let mut reader = PeekReader::new(Cursor::new(vec![0u8; 4]));
        assert!(matches!(
            reader.discard(5, "payload"),
            Err(Error::UnexpectedEndOfStream { offset: 4, .. })
        ));
    }

    #[test]
    fn test_buffered_empty_at_end() {
        let mut reader = PeekReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.buffered().unwrap().is_empty());
    }
}
