#![no_main]

use libfuzzer_sys::fuzz_target;
use rsflate::{Decompressor, Format, InflateConfig};

fuzz_target!(|data: &[u8]| {
    // Arbitrary input must only ever produce errors, never panics
    for format in [Format::Raw, Format::Zlib, Format::Gzip, Format::Auto] {
        let config = InflateConfig { format, ..Default::default() };
        let Ok(mut decompressor) = Decompressor::new(&config) else {
            return;
        };
        // Split the input to exercise resumption
        let split = data.len() / 2;
        if decompressor.push(&data[..split]).is_ok() && decompressor.push(&data[split..]).is_ok() {
            let _ = decompressor.finish();
        }
    }
});
