//! Error types for jpeg-splice

use std::io;

/// Result type for jpeg-splice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, filtering, or splicing JPEG streams
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (open, read, write, rename)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream violates the marker-segment structure
    #[error("Malformed stream at offset {offset}: {reason}")]
    MalformedStream { offset: u64, reason: String },

    /// The stream ended while more bytes were required
    #[error("Unexpected end of stream at offset {offset} while reading {context}")]
    UnexpectedEndOfStream { offset: u64, context: &'static str },
}

impl Error {
    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Self::MalformedStream {
            offset,
            reason: reason.into(),
        }
    }

    /// True for errors caused by the byte stream itself rather than the environment
    pub fn is_format_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
