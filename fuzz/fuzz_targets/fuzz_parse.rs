#![no_main]

use jpeg_splice::{copy_segments, scan_segments};
use libfuzzer_sys::fuzz_target;
use std::io::{sink, Cursor};

fuzz_target!(|data: &[u8]| {
    // Any input must either parse or return an error - never panic or hang
    let listed = scan_segments(Cursor::new(data));

    let mut out = Vec::new();
    let copied = copy_segments(&mut out, Cursor::new(data), |_| true);

    // Both walks see the same structure
    assert_eq!(listed.is_ok(), copied.is_ok());

    if let Ok(stats) = copied {
        assert_eq!(stats.bytes_written, out.len() as u64);
        // Re-framing the copied segments must parse again
        let mut reframed = vec![0xFF, 0xD8];
        reframed.extend_from_slice(&out);
        reframed.extend_from_slice(&[0xFF, 0xD9]);
        assert!(copy_segments(&mut sink(), Cursor::new(reframed), |_| true).is_ok());
    }
});
