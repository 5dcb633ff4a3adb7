//! Metadata splicing: donor metadata segments + target image segments
//!
//! A splice writes a fresh SOI, every metadata segment of the donor (in donor
//! order), every non-metadata segment of the target (in target order, scans
//! untouched), and a fresh EOI. Metadata must come first for downstream
//! readers to find it.
//!
//! File-level splices never write into the path being replaced. The output
//! goes to a temporary file next to the destination, which is flushed,
//! synced and then persisted over the destination in one rename. On any
//! failure the temporary file is removed and the destination is untouched.

use crate::{
    error::{Error, Result},
    jpeg_io::{copy_segments, CopyStats},
    marker::{MetadataSet, EOI, MARKER_PREFIX, SOI},
};
use log::{debug, warn};
use std::{
    fs::{self, File},
    io::{BufWriter, Read, Write},
    path::Path,
};
use tempfile::NamedTempFile;

/// Options for file-level splices
///
/// The default carries Exif APP1, APP14 and COM segments over and keeps the
/// replaced file's modification time.
///
/// # Example
///
/// ```
/// use jpeg_splice::{MetadataSet, SpliceOptions};
///
/// let options = SpliceOptions::new()
///     .metadata(MetadataSet::default().with(0xE2))
///     .preserve_modified_time(false);
/// assert!(options.metadata.contains(0xE2));
/// ```
#[derive(Debug, Clone)]
pub struct SpliceOptions {
    /// Markers taken from the donor and dropped from the target
    pub metadata: MetadataSet,
    /// Give the output the modification time of the target it was built from
    pub preserve_modified_time: bool,
}

impl Default for SpliceOptions {
    fn default() -> Self {
        Self {
            metadata: MetadataSet::default(),
            preserve_modified_time: true,
        }
    }
}

impl SpliceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different metadata marker set
    pub fn metadata(mut self, metadata: MetadataSet) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn preserve_modified_time(mut self, preserve: bool) -> Self {
        self.preserve_modified_time = preserve;
        self
    }
}

/// What a splice wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpliceReport {
    /// Donor pass: metadata segments kept, everything else dropped
    pub donor: CopyStats,
    /// Target pass: metadata segments dropped, everything else kept
    pub target: CopyStats,
    /// Total bytes written, including the SOI/EOI framing
    pub bytes_written: u64,
}

/// Splice two JPEG streams into `dst`
///
/// Reads `donor` and `target` strictly sequentially and flushes `dst` before
/// returning. On error `dst` holds a partial stream and must be discarded.
pub fn splice_streams<D, T, W>(
    dst: &mut W,
    donor: D,
    target: T,
    metadata: &MetadataSet,
) -> Result<SpliceReport>
where
    D: Read,
    T: Read,
    W: Write + ?Sized,
{
    dst.write_all(&[MARKER_PREFIX, SOI])?;

    // Metadata goes first
    let donor_stats = copy_segments(dst, donor, |marker| metadata.contains(marker))?;
    debug!(
        "donor pass: kept {} metadata segments, dropped {}",
        donor_stats.kept, donor_stats.dropped
    );

    let target_stats = copy_segments(dst, target, |marker| !metadata.contains(marker))?;
    debug!(
        "target pass: kept {} segments, dropped {} metadata segments",
        target_stats.kept, target_stats.dropped
    );

    dst.write_all(&[MARKER_PREFIX, EOI])?;
    dst.flush()?;

    Ok(SpliceReport {
        donor: donor_stats,
        target: target_stats,
        bytes_written: 4 + donor_stats.bytes_written + target_stats.bytes_written,
    })
}

/// Splice metadata from `donor_path` into `target_path` in place
///
/// Reads metadata segments from the donor, all other segments from the
/// current contents of the target, and replaces the target with the result.
/// The target is left untouched if anything fails.
pub fn splice_metadata<P: AsRef<Path>, Q: AsRef<Path>>(donor_path: P, target_path: Q) -> Result<()> {
    splice_metadata_with(donor_path, target_path, &SpliceOptions::default()).map(|_| ())
}

/// [`splice_metadata`] with explicit options
pub fn splice_metadata_with<P: AsRef<Path>, Q: AsRef<Path>>(
    donor_path: P,
    target_path: Q,
    options: &SpliceOptions,
) -> Result<SpliceReport> {
    let target_path = target_path.as_ref();
    splice_files(donor_path.as_ref(), target_path, target_path, options)
}

/// Splice metadata from `donor_path` and image segments from `target_path` into `destination`
///
/// `destination` may be the same path as either input. It receives the
/// target's permissions, and its modification time when
/// [`SpliceOptions::preserve_modified_time`] is set.
pub fn splice_files<P, Q, D>(
    donor_path: P,
    target_path: Q,
    destination: D,
    options: &SpliceOptions,
) -> Result<SpliceReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    D: AsRef<Path>,
{
    let donor_path = donor_path.as_ref();
    let target_path = target_path.as_ref();
    let destination = destination.as_ref();

    debug!(
        "splicing metadata from {} into {} -> {}",
        donor_path.display(),
        target_path.display(),
        destination.display()
    );

    let target_meta = fs::metadata(target_path)?;
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir)?;

    let report = match write_spliced(&temp, donor_path, target_path, options) {
        Ok(report) => report,
        Err(e) => {
            if let Err(cleanup) = temp.close() {
                warn!("failed to remove temporary splice output: {}", cleanup);
            }
            return Err(e);
        }
    };

    if let Err(e) = finalize(&temp, &target_meta, options) {
        if let Err(cleanup) = temp.close() {
            warn!("failed to remove temporary splice output: {}", cleanup);
        }
        return Err(e);
    }

    temp.persist(destination).map_err(|e| Error::Io(e.error))?;
    debug!(
        "wrote {} bytes to {}",
        report.bytes_written,
        destination.display()
    );
    Ok(report)
}

/// Run both passes into the temporary file; all input handles close on return
fn write_spliced(
    temp: &NamedTempFile,
    donor_path: &Path,
    target_path: &Path,
    options: &SpliceOptions,
) -> Result<SpliceReport> {
    let donor = File::open(donor_path)?;
    let target = File::open(target_path)?;
    let mut writer = BufWriter::new(temp.as_file());
    splice_streams(&mut writer, donor, target, &options.metadata)
}

/// Make the written output durable and carry over the target's attributes
fn finalize(temp: &NamedTempFile, target_meta: &fs::Metadata, options: &SpliceOptions) -> Result<()> {
    let file = temp.as_file();
    file.sync_all()?;
    if options.preserve_modified_time {
        file.set_modified(target_meta.modified()?)?;
    }
    file.set_permissions(target_meta.permissions())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{APP1, COM};
    use std::io::Cursor;

    #[test]
    fn test_splice_streams_scenario() {
        let donor = vec![
            0xFF, 0xD8, 0xFF, APP1, 0x00, 0x06, b'h', b'a', b'b', b'c', 0xFF, 0xD9,
        ];
        let target = vec![0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x04, 0x01, 0x02, 0xFF, 0xD9];

        let mut out: Vec<u8> = Vec::new();
        let report = splice_streams(
            &mut out,
            Cursor::new(donor),
            Cursor::new(target),
            &MetadataSet::default(),
        )
        .unwrap();

        assert_eq!(
            out,
            vec![
                0xFF, 0xD8, //
                0xFF, APP1, 0x00, 0x06, b'h', b'a', b'b', b'c', //
                0xFF, 0xDB, 0x00, 0x04, 0x01, 0x02, //
                0xFF, 0xD9,
            ]
        );
        assert_eq!(report.donor.kept, 1);
        assert_eq!(report.target.kept, 1);
        assert_eq!(report.bytes_written, out.len() as u64);
    }

    #[test]
    fn test_target_metadata_replaced() {
        let donor = vec![0xFF, 0xD8, 0xFF, COM, 0x00, 0x03, b'n', 0xFF, 0xD9];
        let target = vec![
            0xFF, 0xD8, 0xFF, COM, 0x00, 0x03, b'o', 0xFF, 0xE0, 0x00, 0x02, 0xFF, 0xD9,
        ];

        let mut out: Vec<u8> = Vec::new();
        let report = splice_streams(
            &mut out,
            Cursor::new(donor),
            Cursor::new(target),
            &MetadataSet::default(),
        )
        .unwrap();

        assert_eq!(
            out,
            vec![0xFF, 0xD8, 0xFF, COM, 0x00, 0x03, b'n', 0xFF, 0xE0, 0x00, 0x02, 0xFF, 0xD9]
        );
        assert_eq!(report.target.dropped, 1);
    }

    #[test]
    fn test_malformed_donor_aborts() {
        let donor = vec![0x00, 0x00];
        let target = vec![0xFF, 0xD8, 0xFF, 0xD9];
        let result = splice_streams(
            &mut std::io::sink(),
            Cursor::new(donor),
            Cursor::new(target),
            &MetadataSet::default(),
        );
        assert!(matches!(result, Err(Error::MalformedStream { .. })));
    }

    #[test]
    fn test_options_default() {
        let options = SpliceOptions::default();
        assert_eq!(options.metadata, MetadataSet::default());
        assert!(options.preserve_modified_time);
    }
}
