//! Property-based tests for rsflate
//!
//! Randomized inputs across levels, strategies, wrappers, and chunkings.

use rsflate::bits::reverse_bits;
use rsflate::huffman::builder::MAX_BITS;
use rsflate::huffman::HuffmanTree;
use rsflate::{
    compress, decompress, CompressionLevel, Compressor, DeflateConfig, Decompressor, Format,
    InflateConfig, Strategy,
};
use proptest::prelude::*;

fn strategy_from_index(index: usize) -> Strategy {
    [Strategy::Default, Strategy::Filtered, Strategy::HuffmanOnly, Strategy::Rle, Strategy::Fixed]
        [index % 5]
}

fn format_from_index(index: usize) -> Format {
    [Format::Raw, Format::Zlib, Format::Gzip][index % 3]
}

proptest! {
    #[test]
    fn test_decompression_never_panics(data in prop::collection::vec(any::<u8>(), 0..1000)) {
        // Arbitrary bytes are rarely a valid stream; only errors are allowed
        for format in [Format::Raw, Format::Zlib, Format::Gzip, Format::Auto] {
            let _ = decompress(&data, &InflateConfig { format, ..Default::default() });
        }
    }
}

proptest! {
    #[test]
    fn test_round_trip_any_settings(
        data in prop::collection::vec(any::<u8>(), 0..4000),
        level in 0u8..=9,
        strategy in 0usize..5,
        format in 0usize..3,
    ) {
        let format = format_from_index(format);
        let config = DeflateConfig {
            level: CompressionLevel::from_level(level),
            strategy: strategy_from_index(strategy),
            format,
            ..Default::default()
        };
        let compressed = compress(&data, &config).unwrap();
        let decompressed = decompress(&compressed, &InflateConfig { format, ..Default::default() }).unwrap();
        prop_assert_eq!(&data[..], &decompressed[..]);
    }
}

proptest! {
    #[test]
    fn test_repetitive_patterns(
        pattern in prop::collection::vec(any::<u8>(), 1..20),
        repeat_count in 2..400usize,
        level in 1u8..=9,
    ) {
        let data: Vec<u8> = pattern.iter().cycle().take(pattern.len() * repeat_count).copied().collect();
        let config = DeflateConfig { level: CompressionLevel::from_level(level), ..Default::default() };
        let compressed = compress(&data, &config).unwrap();
        let decompressed = decompress(&compressed, &InflateConfig::default()).unwrap();
        prop_assert_eq!(&data[..], &decompressed[..]);
        prop_assert!(compressed.len() <= data.len() + 11, "expanded: {} -> {}", data.len(), compressed.len());
    }
}

proptest! {
    #[test]
    fn test_incompressible_overhead_bounded(data in prop::collection::vec(any::<u8>(), 0..20_000)) {
        // Stored blocks cost 5 bytes each, on top of the zlib framing
        let compressed = compress(&data, &DeflateConfig::default()).unwrap();
        let blocks = data.len() / 16_000 + 1;
        prop_assert!(compressed.len() <= data.len() + 5 * blocks + 6 + 5);
    }
}

proptest! {
    #[test]
    fn test_chunking_does_not_change_output(
        data in prop::collection::vec(0u8..8, 0..5000),
        chunk in 1usize..700,
        level in 1u8..=9,
        strategy in 0usize..5,
    ) {
        // Level 0 is left out: its stored blocks end where input chunks end
        let config = DeflateConfig {
            format: Format::Gzip,
            level: CompressionLevel::from_level(level),
            strategy: strategy_from_index(strategy),
            ..Default::default()
        };
        let one_shot = compress(&data, &config).unwrap();

        let mut compressor = Compressor::new(&config).unwrap();
        let mut streamed = Vec::new();
        for piece in data.chunks(chunk) {
            streamed.extend(compressor.push(piece).unwrap());
        }
        streamed.extend(compressor.finish().unwrap());
        prop_assert_eq!(&one_shot, &streamed);

        let mut decompressor = Decompressor::new(&InflateConfig { format: Format::Gzip, ..Default::default() }).unwrap();
        let mut decoded = Vec::new();
        for piece in one_shot.chunks(chunk) {
            decoded.extend(decompressor.push(piece).unwrap());
        }
        decoded.extend(decompressor.finish().unwrap());
        prop_assert_eq!(&data, &decoded);
    }
}

proptest! {
    #[test]
    fn test_canonical_codes_valid(freqs in prop::collection::vec(0u32..100_000, 2..286)) {
        let tree = HuffmanTree::build(&freqs, MAX_BITS);

        // Every used symbol gets a code, and none is longer than the limit
        for (freq, &len) in freqs.iter().zip(&tree.lengths) {
            prop_assert!(len <= MAX_BITS);
            if *freq > 0 {
                prop_assert!(len > 0);
            }
        }

        // Kraft sum never exceeds one
        let kraft: u64 = tree.lengths.iter().filter(|&&l| l > 0).map(|&l| 1u64 << (MAX_BITS - l)).sum();
        prop_assert!(kraft <= 1u64 << MAX_BITS);

        // Prefix-free, and consecutive within a length in symbol order
        let codes: Vec<(u32, u8)> = tree
            .lengths
            .iter()
            .zip(&tree.codes)
            .filter(|(&l, _)| l > 0)
            .map(|(&l, &c)| (reverse_bits(c as u32, l), l))
            .collect();
        for (i, &(a, la)) in codes.iter().enumerate() {
            for &(b, lb) in &codes[i + 1..] {
                let shorter = la.min(lb);
                prop_assert_ne!(a >> (la - shorter), b >> (lb - shorter));
            }
        }
        for len in 1..=MAX_BITS {
            let same: Vec<u32> = codes.iter().filter(|&&(_, l)| l == len).map(|&(c, _)| c).collect();
            for pair in same.windows(2) {
                prop_assert_eq!(pair[1], pair[0] + 1);
            }
        }
    }
}
