#![no_main]

use jpeg_splice::{splice_streams, MetadataSet};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    // First byte picks the split point between donor and target
    let split = (data[0] as usize).min(data.len() - 1) + 1;
    let (donor, target) = data[1..].split_at(split - 1);

    let mut out = Vec::new();
    if let Ok(report) = splice_streams(
        &mut out,
        Cursor::new(donor),
        Cursor::new(target),
        &MetadataSet::default(),
    ) {
        assert_eq!(report.bytes_written, out.len() as u64);
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        assert_eq!(&out[out.len() - 2..], &[0xFF, 0xD9]);
    }
});
