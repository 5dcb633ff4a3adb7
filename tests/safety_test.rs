//! Safety tests - a failed splice must never destroy the caller's file
//!
//! These tests verify that malformed or truncated input is rejected with the
//! right error kind and that the target file survives every failure.
//! Arbitrary-input robustness is covered by fuzzing (cargo-fuzz).

use jpeg_splice::{splice_metadata, test_utils::*, Error};
use std::{fs, path::Path};
use tempfile::TempDir;

fn valid_target() -> Vec<u8> {
    JpegBuilder::new()
        .segment(0xE0, b"JFIF\0")
        .segment(0xDB, &[0x02; 8])
        .scan(&[0x01, 0x00], &[0x10, 0xFF, 0x00, 0x20])
        .build()
}

fn valid_donor() -> Vec<u8> {
    JpegBuilder::new().segment(0xE1, b"Exif\0\0data").build()
}

fn dir_entries(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

/// Run a splice expected to fail and check the target is untouched
fn assert_fails_safely(donor: &[u8], target: &[u8]) -> Error {
    let dir = TempDir::new().unwrap();
    let donor_path = write_fixture(dir.path(), "donor.jpg", donor).unwrap();
    let target_path = write_fixture(dir.path(), "target.jpg", target).unwrap();

    let err = splice_metadata(&donor_path, &target_path).expect_err("splice should fail");

    assert_eq!(fs::read(&target_path).unwrap(), target, "target must be untouched");
    assert_eq!(dir_entries(dir.path()), 2, "temporary output must be removed");
    err
}

#[test]
fn test_target_missing_eoi() {
    let target = JpegBuilder::new()
        .segment(0xDB, &[0x02; 8])
        .build_unterminated();
    let err = assert_fails_safely(&valid_donor(), &target);
    assert!(matches!(err, Error::UnexpectedEndOfStream { .. }));
}

#[test]
fn test_target_scan_without_terminator() {
    let target = JpegBuilder::new()
        .scan(&[0x01, 0x00], &[0x10, 0xFF, 0x00, 0x20, 0xFF, 0xD3])
        .build_unterminated();
    let err = assert_fails_safely(&valid_donor(), &target);
    assert!(matches!(
        err,
        Error::UnexpectedEndOfStream {
            context: "entropy-coded data",
            ..
        }
    ));
}

#[test]
fn test_length_beyond_end_of_stream() {
    // DQT claims 0x0100 bytes but only a handful follow
    let target = JpegBuilder::new()
        .raw(&[0xFF, 0xDB, 0x01, 0x00, 0x01, 0x02, 0x03])
        .build();
    let err = assert_fails_safely(&valid_donor(), &target);
    assert!(matches!(err, Error::UnexpectedEndOfStream { .. }));
}

#[test]
fn test_declared_length_below_minimum() {
    let target = JpegBuilder::new().raw(&[0xFF, 0xDB, 0x00, 0x00]).build();
    let err = assert_fails_safely(&valid_donor(), &target);
    assert!(matches!(err, Error::MalformedStream { .. }));
    assert!(err.is_format_error());
}

#[test]
fn test_garbage_where_marker_expected() {
    let target = JpegBuilder::new()
        .segment(0xDB, &[0x02; 2])
        .raw(&[0x00, 0x11])
        .build();
    let err = assert_fails_safely(&valid_donor(), &target);
    assert!(matches!(err, Error::MalformedStream { .. }));
}

#[test]
fn test_donor_not_a_jpeg() {
    let err = assert_fails_safely(b"\x89PNG\r\n\x1a\n", &valid_target());
    assert!(matches!(err, Error::MalformedStream { offset: 0, .. }));
}

#[test]
fn test_empty_donor() {
    let err = assert_fails_safely(b"", &valid_target());
    assert!(matches!(
        err,
        Error::UnexpectedEndOfStream {
            offset: 0,
            context: "SOI marker"
        }
    ));
}

#[test]
fn test_missing_donor_is_io_error() {
    let dir = TempDir::new().unwrap();
    let target_path = write_fixture(dir.path(), "target.jpg", &valid_target()).unwrap();

    let err = splice_metadata(dir.path().join("missing.jpg"), &target_path).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!err.is_format_error());
    assert_eq!(fs::read(&target_path).unwrap(), valid_target());
    assert_eq!(dir_entries(dir.path()), 1);
}

#[test]
fn test_missing_target_is_io_error() {
    let dir = TempDir::new().unwrap();
    let donor_path = write_fixture(dir.path(), "donor.jpg", &valid_donor()).unwrap();

    let err = splice_metadata(&donor_path, dir.path().join("missing.jpg")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(dir_entries(dir.path()), 1);
}

#[test]
fn test_trailing_data_after_eoi_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let donor = JpegBuilder::new()
        .segment(0xE1, b"Exif\0\0data")
        .trailing(b"camera appendix")
        .build();
    let donor_path = write_fixture(dir.path(), "donor.jpg", &donor).unwrap();
    let target_path = write_fixture(
        dir.path(),
        "target.jpg",
        &JpegBuilder::new()
            .segment(0xDB, &[0x02; 8])
            .trailing(&[0x00])
            .build(),
    )
    .unwrap();

    splice_metadata(&donor_path, &target_path).unwrap();

    let expected = JpegBuilder::new()
        .segment(0xE1, b"Exif\0\0data")
        .segment(0xDB, &[0x02; 8])
        .build();
    assert_eq!(fs::read(&target_path).unwrap(), expected);
}
