use std::sync::OnceLock;

use crate::bits::{reverse_bits, BitReader};
use crate::error::{Error, Result};

/// Bits resolved by a single table lookup; longer codes take the slow path
const LOOKUP_BITS: u8 = 9;

/// Canonical Huffman decoder
///
/// Codes up to 9 bits decode with one table lookup. Longer codes are
/// resolved bit by bit against the first code of each length.
pub struct HuffmanDecoder {
    /// Indexed by the next 9 input bits: symbol in the low 12 bits, code
    /// length in the high 4 (0 = not resolvable here)
    lookup: Vec<u16>,
    /// Maximum code length
    max_bits: u8,
    /// For each bit length: (first_code, first_symbol_index, count)
    bit_info: [(u32, usize, usize); 16],
    /// Symbols sorted by code length, then by symbol value
    symbols: Vec<u16>,
}

impl HuffmanDecoder {
    /// Build from code lengths (for dynamic Huffman blocks)
    ///
    /// Over-subscribed lengths are always rejected. An incomplete code is
    /// accepted only when `allow_single` is set and the code is a single
    /// 1-bit code; an all-zero set yields a decoder that rejects every input.
    pub fn from_code_lengths(lengths: &[u8], allow_single: bool) -> Result<Self> {
        let mut bl_count = [0u32; 16];
        for &len in lengths {
            if len > 15 {
                return Err(Error::InvalidCodeLength(len));
            }
            bl_count[len as usize] += 1;
        }
        bl_count[0] = 0;

        let mut left = 1i32;
        for &count in &bl_count[1..] {
            left <<= 1;
            left -= count as i32;
            if left < 0 {
                return Err(Error::HuffmanOversubscribed);
            }
        }

        let max_bits = (1..=15u8).rev().find(|&b| bl_count[b as usize] > 0).unwrap_or(0);
        if left > 0 && max_bits > 0 && !(allow_single && max_bits == 1) {
            return Err(Error::HuffmanIncomplete);
        }

        Ok(Self::build(lengths))
    }

    /// Build tables without validating the lengths
    fn build(lengths: &[u8]) -> Self {
        let mut bl_count = [0u32; 16];
        for &len in lengths {
            bl_count[len as usize] += 1;
        }
        bl_count[0] = 0;
        let max_bits = (1..=15u8).rev().find(|&b| bl_count[b as usize] > 0).unwrap_or(0);

        // Compute first code for each bit length
        let mut next_code = [0u32; 16];
        let mut code = 0u32;
        for bits in 1..16 {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        // Sort symbols by code length, then by symbol value
        let mut sorted: Vec<(u16, u8)> = lengths
            .iter()
            .enumerate()
            .filter(|(_, &len)| len > 0)
            .map(|(sym, &len)| (sym as u16, len))
            .collect();
        sorted.sort_by_key(|&(sym, len)| (len, sym));
        let symbols: Vec<u16> = sorted.iter().map(|&(sym, _)| sym).collect();

        let mut bit_info = [(0u32, 0usize, 0usize); 16];
        let mut symbol_idx = 0;
        for bits in 1..16 {
            bit_info[bits] = (next_code[bits], symbol_idx, bl_count[bits] as usize);
            symbol_idx += bl_count[bits] as usize;
        }

        let mut lookup = vec![0u16; 1 << LOOKUP_BITS];
        for &(sym, len) in &sorted {
            if len > LOOKUP_BITS {
                break;
            }
            let code = next_code[len as usize];
            next_code[len as usize] += 1;
            let reversed = reverse_bits(code, len) as usize;
            let entry = sym | ((len as u16) << 12);
            for fill in 0..1usize << (LOOKUP_BITS - len) {
                lookup[reversed | (fill << len)] = entry;
            }
        }

        Self { lookup, max_bits, bit_info, symbols }
    }

    /// Fixed literal/length decoder (RFC 1951 section 3.2.6)
    pub fn fixed_literal_length() -> &'static Self {
        static DECODER: OnceLock<HuffmanDecoder> = OnceLock::new();
        DECODER.get_or_init(|| Self::build(&super::tables::fixed_literal_lengths()))
    }

    /// Fixed distance decoder
    pub fn fixed_distance() -> &'static Self {
        static DECODER: OnceLock<HuffmanDecoder> = OnceLock::new();
        DECODER.get_or_init(|| Self::build(&super::tables::fixed_distance_lengths()))
    }

    /// Decode next symbol from bitstream
    ///
    /// Returns [`Error::UnexpectedEof`] if the input ends inside a code; the
    /// reader may have consumed bits by then.
    #[inline]
    pub fn decode(&self, bits: &mut BitReader) -> Result<u16> {
        if self.max_bits == 0 {
            return Err(Error::InvalidHuffmanCode);
        }

        let available = bits.fill_up_to(self.max_bits);
        let entry = self.lookup[bits.peek_loaded(LOOKUP_BITS) as usize];
        let len = (entry >> 12) as u8;
        if len > 0 {
            if len > available {
                return Err(Error::UnexpectedEof);
            }
            bits.consume_bits(len);
            return Ok(entry & 0x0FFF);
        }

        self.decode_slow(bits)
    }

    fn decode_slow(&self, bits: &mut BitReader) -> Result<u16> {
        let mut code = 0u32;
        for len in 1..=self.max_bits {
            code = (code << 1) | bits.read_bits(1)?;
            let (first_code, first_idx, count) = self.bit_info[len as usize];
            if count > 0 && code >= first_code && code < first_code + count as u32 {
                return Ok(self.symbols[first_idx + (code - first_code) as usize]);
            }
        }
        Err(Error::InvalidHuffmanCode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;
    use crate::huffman::builder::HuffmanTree;

    fn reader(data: &[u8]) -> BitReader {
        let mut reader = BitReader::new();
        reader.push_input(data);
        reader
    }

    #[test]
    fn test_fixed_tables() {
        let lit = HuffmanDecoder::fixed_literal_length();
        assert_eq!(lit.symbols.len(), 288);
        assert_eq!(lit.max_bits, 9);

        let dist = HuffmanDecoder::fixed_distance();
        assert_eq!(dist.max_bits, 5);
        assert_eq!(dist.symbols.len(), 32);
    }

    #[test]
    fn test_simple_decode() {
        // Symbol 0 = code 0, symbol 1 = code 1
        let decoder = HuffmanDecoder::from_code_lengths(&[1, 1], false).unwrap();
        assert_eq!(decoder.decode(&mut reader(&[0b0000_0000])).unwrap(), 0);
        assert_eq!(decoder.decode(&mut reader(&[0b0000_0001])).unwrap(), 1);
    }

    #[test]
    fn test_oversubscribed_rejected() {
        let result = HuffmanDecoder::from_code_lengths(&[1, 1, 1], true);
        assert!(matches!(result, Err(Error::HuffmanOversubscribed)));
    }

    #[test]
    fn test_incomplete_rejected() {
        let result = HuffmanDecoder::from_code_lengths(&[2, 2, 2, 0], true);
        assert!(matches!(result, Err(Error::HuffmanIncomplete)));

        // A lone 1-bit code is fine for literal/distance tables only
        assert!(HuffmanDecoder::from_code_lengths(&[0, 1], true).is_ok());
        assert!(matches!(
            HuffmanDecoder::from_code_lengths(&[0, 1], false),
            Err(Error::HuffmanIncomplete)
        ));
    }

    #[test]
    fn test_single_code_rejects_other_bit() {
        let decoder = HuffmanDecoder::from_code_lengths(&[0, 1], true).unwrap();
        assert_eq!(decoder.decode(&mut reader(&[0x00])).unwrap(), 1);
        assert!(matches!(decoder.decode(&mut reader(&[0x01])), Err(Error::InvalidHuffmanCode)));
    }

    #[test]
    fn test_long_codes_use_slow_path() {
        // Skewed frequencies force codes longer than the lookup width
        let freqs: Vec<u32> = (0..20).map(|i| 1u32 << (19 - i).min(16)).collect();
        let tree = HuffmanTree::build(&freqs, 15);
        assert!(tree.lengths.iter().any(|&l| l > LOOKUP_BITS));

        let mut writer = BitWriter::new();
        for sym in 0..20 {
            writer.write_bits(tree.codes[sym] as u32, tree.lengths[sym]);
        }
        let data = writer.finish();

        let decoder = HuffmanDecoder::from_code_lengths(&tree.lengths, false).unwrap();
        let mut reader = reader(&data);
        for sym in 0..20u16 {
            assert_eq!(decoder.decode(&mut reader).unwrap(), sym);
        }
    }

    #[test]
    fn test_truncated_code_reports_eof() {
        let decoder = HuffmanDecoder::fixed_literal_length();
        // Symbol 144 has a 9-bit code; supply only 8 bits
        let mut reader = reader(&[0b0001_0011]);
        assert!(matches!(decoder.decode(&mut reader), Err(Error::UnexpectedEof)));
    }
}
