#![no_main]

use libfuzzer_sys::fuzz_target;
use flate2::read::MultiGzDecoder;
use rsflate::{
    compress, decompress, CompressionLevel, DeflateConfig, Format, InflateConfig, Strategy,
};
use std::io::Read;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First two bytes pick the settings
    let level = CompressionLevel::from_level(data[0] % 10);
    let strategy = match data[1] % 5 {
        0 => Strategy::Default,
        1 => Strategy::Filtered,
        2 => Strategy::HuffmanOnly,
        3 => Strategy::Rle,
        _ => Strategy::Fixed,
    };
    let window_bits = 9 + (data[1] / 5) % 7;
    let payload = &data[2..];

    let config = DeflateConfig { level, strategy, format: Format::Gzip, window_bits, ..Default::default() };
    let compressed = compress(payload, &config).expect("compression failed");

    let decoded = decompress(&compressed, &InflateConfig { format: Format::Gzip, ..Default::default() })
        .expect("decompression failed");
    assert_eq!(decoded, payload);

    let mut reference = Vec::new();
    MultiGzDecoder::new(&compressed[..]).read_to_end(&mut reference).expect("flate2 rejected output");
    assert_eq!(reference, payload);
});
