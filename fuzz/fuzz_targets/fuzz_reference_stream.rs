#![no_main]

use libfuzzer_sys::fuzz_target;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rsflate::{decompress, Format, InflateConfig};
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Limit data size to avoid slowdowns
    let data = if data.len() > 64 * 1024 { &data[..64 * 1024] } else { data };

    let level = Compression::new(u32::from(data[0] % 10));
    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    if encoder.write_all(data).is_err() {
        return;
    }
    let zlib_data = match encoder.finish() {
        Ok(d) => d,
        Err(_) => return,
    };

    // Valid reference output must always decode
    let decoded = decompress(&zlib_data, &InflateConfig { format: Format::Auto, ..Default::default() })
        .expect("failed to decode valid zlib stream");
    assert_eq!(decoded, data);
});
