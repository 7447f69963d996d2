use std::sync::OnceLock;

use super::builder::HuffmanTree;
use crate::deflate::tables::D_CODES;

/// Literal/length symbols in the fixed code, including the two unused ones
pub const FIXED_LITERAL_CODES: usize = 288;

/// Fixed Huffman literal/length code lengths (RFC 1951 section 3.2.6)
pub fn fixed_literal_lengths() -> [u8; FIXED_LITERAL_CODES] {
    let mut lengths = [0u8; FIXED_LITERAL_CODES];
    lengths[0..=143].fill(8);
    lengths[144..=255].fill(9);
    lengths[256..=279].fill(7);
    lengths[280..=287].fill(8);
    lengths
}

/// Fixed Huffman distance code lengths (all 5 bits, 30 and 31 never used)
pub fn fixed_distance_lengths() -> [u8; 32] {
    [5u8; 32]
}

/// Encoding trees for fixed-code blocks
pub struct StaticTrees {
    pub literal: HuffmanTree,
    pub distance: HuffmanTree,
}

/// Fixed trees, built on first use
pub fn static_trees() -> &'static StaticTrees {
    static TREES: OnceLock<StaticTrees> = OnceLock::new();
    TREES.get_or_init(|| StaticTrees {
        literal: HuffmanTree::from_lengths(&fixed_literal_lengths()),
        distance: HuffmanTree::from_lengths(&fixed_distance_lengths()[..D_CODES]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::reverse_bits;

    #[test]
    fn test_fixed_literal_codes() {
        let trees = static_trees();
        let lit = &trees.literal;
        assert_eq!(lit.lengths.len(), 288);

        // 0-143: 8 bits starting at 00110000
        assert_eq!(reverse_bits(lit.codes[0] as u32, 8), 0b0011_0000);
        assert_eq!(reverse_bits(lit.codes[143] as u32, 8), 0b1011_1111);
        // 144-255: 9 bits starting at 110010000
        assert_eq!(reverse_bits(lit.codes[144] as u32, 9), 0b1_1001_0000);
        // 256-279: 7 bits starting at 0000000
        assert_eq!(lit.codes[256], 0);
        assert_eq!(lit.lengths[256], 7);
        // 280-287: 8 bits starting at 11000000
        assert_eq!(reverse_bits(lit.codes[280] as u32, 8), 0b1100_0000);
    }

    #[test]
    fn test_fixed_distance_codes() {
        let dist = &static_trees().distance;
        assert_eq!(dist.lengths.len(), 30);
        assert_eq!(reverse_bits(dist.codes[29] as u32, 5), 29);
    }
}
