use log::trace;

use super::builder::{HuffmanTree, MAX_BITS, MAX_BL_BITS};
use super::tables::static_trees;
use crate::bits::BitWriter;
use crate::deflate::tables::{
    distance_symbol, length_symbol_index, BL_CODES, CODE_LENGTH_EXTRA_BITS, CODE_LENGTH_ORDER,
    DISTANCE_TABLE, D_CODES, END_BLOCK, LENGTH_TABLE, L_CODES,
};
use crate::deflate::tokens::{LZ77Token, TokenBuffer};

/// Largest payload of a single stored block
pub const MAX_STORED_BLOCK: usize = 65535;

const REP_3_6: u8 = 16;
const REPZ_3_10: u8 = 17;
const REPZ_11_138: u8 = 18;

/// Frequency counter for dynamic Huffman code generation
#[derive(Clone, Debug)]
pub struct FrequencyCounter {
    /// Frequencies for literal (0-255), EOB (256), and length codes (257-285)
    pub literal_freq: [u32; L_CODES],
    /// Frequencies for distance codes (0-29)
    pub distance_freq: [u32; D_CODES],
}

impl FrequencyCounter {
    /// Empty counter; end-of-block is always counted once
    pub fn new() -> Self {
        let mut counter = Self { literal_freq: [0; L_CODES], distance_freq: [0; D_CODES] };
        counter.literal_freq[END_BLOCK] = 1;
        counter
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn count_literal(&mut self, byte: u8) {
        self.literal_freq[byte as usize] += 1;
    }

    #[inline]
    pub fn count_copy(&mut self, length: usize, distance: usize) {
        self.literal_freq[length_symbol_index(length) + 257] += 1;
        self.distance_freq[distance_symbol(distance)] += 1;
    }

    /// Extra bits needed by lengths and distances, the same for every tree
    fn extra_bits(&self) -> u64 {
        let lengths: u64 = LENGTH_TABLE
            .iter()
            .zip(&self.literal_freq[257..])
            .map(|(&(_, extra), &f)| f as u64 * extra as u64)
            .sum();
        let distances: u64 = DISTANCE_TABLE
            .iter()
            .zip(&self.distance_freq)
            .map(|(&(_, extra), &f)| f as u64 * extra as u64)
            .sum();
        lengths + distances
    }
}

impl Default for FrequencyCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// How a block was encoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockType {
    Stored,
    Fixed,
    Dynamic,
}

impl BlockType {
    /// BTYPE field value
    fn code(self) -> u32 {
        match self {
            BlockType::Stored => 0,
            BlockType::Fixed => 1,
            BlockType::Dynamic => 2,
        }
    }
}

/// Trees for a dynamic block together with their run-length description
pub struct DynamicTrees {
    literal: HuffmanTree,
    distance: HuffmanTree,
    bl: HuffmanTree,
    bl_freq: [u32; BL_CODES],
    /// Code length symbols with their extra bits; literal lengths first
    ops: Vec<(u8, u8)>,
    /// Number of code length codes sent, minus one
    max_blindex: usize,
}

impl DynamicTrees {
    pub fn build(freq: &FrequencyCounter) -> Self {
        let literal = HuffmanTree::build(&freq.literal_freq, MAX_BITS);
        let distance = HuffmanTree::build(&freq.distance_freq, MAX_BITS);

        let mut ops = Vec::with_capacity(L_CODES + D_CODES);
        run_length_ops(&literal.lengths[..=literal.max_code], &mut ops);
        run_length_ops(&distance.lengths[..=distance.max_code], &mut ops);

        let mut bl_freq = [0u32; BL_CODES];
        for &(sym, _) in &ops {
            bl_freq[sym as usize] += 1;
        }
        let bl = HuffmanTree::build(&bl_freq, MAX_BL_BITS);

        // At least 4 code length codes are always sent
        let mut max_blindex = BL_CODES - 1;
        while max_blindex >= 3 && bl.lengths[CODE_LENGTH_ORDER[max_blindex]] == 0 {
            max_blindex -= 1;
        }

        Self { literal, distance, bl, bl_freq, ops, max_blindex }
    }

    /// Bits for the tree description and the block's symbols (no block header)
    pub fn cost(&self, freq: &FrequencyCounter) -> u64 {
        let header = 3 * (self.max_blindex as u64 + 1) + 5 + 5 + 4;
        let bl_extra: u64 = self
            .bl_freq
            .iter()
            .zip(&CODE_LENGTH_EXTRA_BITS)
            .map(|(&f, &extra)| f as u64 * extra as u64)
            .sum();
        header
            + self.bl.cost(&self.bl_freq)
            + bl_extra
            + self.literal.cost(&freq.literal_freq)
            + self.distance.cost(&freq.distance_freq)
            + freq.extra_bits()
    }

    fn write_header(&self, writer: &mut BitWriter) {
        let lcodes = self.literal.max_code + 1;
        let dcodes = self.distance.max_code + 1;
        writer.write_bits((lcodes - 257) as u32, 5);
        writer.write_bits((dcodes - 1) as u32, 5);
        writer.write_bits((self.max_blindex + 1 - 4) as u32, 4);

        for &sym in &CODE_LENGTH_ORDER[..=self.max_blindex] {
            writer.write_bits(self.bl.lengths[sym] as u32, 3);
        }

        for &(sym, extra) in &self.ops {
            let s = sym as usize;
            writer.write_bits(self.bl.codes[s] as u32, self.bl.lengths[s]);
            let extra_bits = CODE_LENGTH_EXTRA_BITS[s];
            if extra_bits > 0 {
                writer.write_bits(extra as u32, extra_bits);
            }
        }
    }
}

/// Describe `lengths` with the code length alphabet, runs collapsed into
/// symbols 16, 17 and 18
fn run_length_ops(lengths: &[u8], ops: &mut Vec<(u8, u8)>) {
    let mut prevlen: Option<u8> = None;
    let mut count = 0usize;
    let (mut max_count, mut min_count) = if lengths.first() == Some(&0) { (138, 3) } else { (7, 4) };

    for (n, &curlen) in lengths.iter().enumerate() {
        let nextlen = lengths.get(n + 1).copied();
        count += 1;
        if count < max_count && Some(curlen) == nextlen {
            continue;
        }

        if count < min_count {
            ops.extend(std::iter::repeat((curlen, 0)).take(count));
        } else if curlen != 0 {
            if Some(curlen) != prevlen {
                ops.push((curlen, 0));
                count -= 1;
            }
            ops.push((REP_3_6, (count - 3) as u8));
        } else if count <= 10 {
            ops.push((REPZ_3_10, (count - 3) as u8));
        } else {
            ops.push((REPZ_11_138, (count - 11) as u8));
        }

        count = 0;
        prevlen = Some(curlen);
        (max_count, min_count) = match nextlen {
            Some(0) => (138, 3),
            Some(next) if next == curlen => (6, 3),
            _ => (7, 4),
        };
    }
}

/// Bits for the block's symbols under the fixed trees (no block header)
pub fn fixed_cost(freq: &FrequencyCounter) -> u64 {
    let trees = static_trees();
    trees.literal.cost(&freq.literal_freq) + trees.distance.cost(&freq.distance_freq) + freq.extra_bits()
}

/// Emit `data` as stored blocks of at most 65535 bytes each
///
/// Only the last piece carries the final flag when `last` is set.
pub fn write_stored_block(writer: &mut BitWriter, data: &[u8], last: bool) {
    let mut pieces = data.chunks(MAX_STORED_BLOCK).peekable();
    if pieces.peek().is_none() {
        write_stored_piece(writer, &[], last);
        return;
    }
    while let Some(piece) = pieces.next() {
        let final_piece = last && pieces.peek().is_none();
        write_stored_piece(writer, piece, final_piece);
    }
}

fn write_stored_piece(writer: &mut BitWriter, piece: &[u8], last: bool) {
    writer.write_bits((BlockType::Stored.code() << 1) | last as u32, 3);
    writer.align_to_byte();
    let len = piece.len() as u16;
    writer.write_u16_le(len);
    writer.write_u16_le(!len);
    writer.write_bytes(piece);
}

/// Emit tokens as a fixed-code block
pub fn write_fixed_block(writer: &mut BitWriter, tokens: &[LZ77Token], last: bool) {
    let trees = static_trees();
    writer.write_bits((BlockType::Fixed.code() << 1) | last as u32, 3);
    write_tokens(writer, tokens, &trees.literal, &trees.distance);
}

/// Emit tokens as a dynamic-code block using prebuilt trees
pub fn write_dynamic_block(
    writer: &mut BitWriter,
    tokens: &[LZ77Token],
    trees: &DynamicTrees,
    last: bool,
) {
    writer.write_bits((BlockType::Dynamic.code() << 1) | last as u32, 3);
    trees.write_header(writer);
    write_tokens(writer, tokens, &trees.literal, &trees.distance);
}

/// Encode tokens and the end-of-block code
fn write_tokens(
    writer: &mut BitWriter,
    tokens: &[LZ77Token],
    literal: &HuffmanTree,
    distance: &HuffmanTree,
) {
    for token in tokens {
        match *token {
            LZ77Token::Literal(byte) => {
                let s = byte as usize;
                writer.write_bits(literal.codes[s] as u32, literal.lengths[s]);
            }
            LZ77Token::Copy { length, distance: dist } => {
                let idx = length_symbol_index(length as usize);
                let sym = idx + 257;
                writer.write_bits(literal.codes[sym] as u32, literal.lengths[sym]);
                let (base, extra) = LENGTH_TABLE[idx];
                if extra > 0 {
                    writer.write_bits((length - base) as u32, extra);
                }

                let code = distance_symbol(dist as usize);
                writer.write_bits(distance.codes[code] as u32, distance.lengths[code]);
                let (base, extra) = DISTANCE_TABLE[code];
                if extra > 0 {
                    writer.write_bits((dist - base) as u32, extra);
                }
            }
        }
    }
    writer.write_bits(literal.codes[END_BLOCK] as u32, literal.lengths[END_BLOCK]);
}

/// How the block compressor wants a block encoded
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockOptions {
    /// Level 0: never build trees
    pub stored_only: bool,
    /// Always use fixed trees when not storing
    pub fixed_only: bool,
}

/// Encode the buffered block in its cheapest form
///
/// `stored` holds the block's raw bytes when they are still available; a
/// stored block is only possible then.
pub fn flush_block(
    writer: &mut BitWriter,
    buf: &TokenBuffer,
    stored: Option<&[u8]>,
    last: bool,
    options: BlockOptions,
) -> BlockType {
    let freq = buf.frequencies();
    let stored_len = stored.map_or(0, <[u8]>::len) as u64;

    let (mut opt_bytes, static_bytes, trees) = if options.stored_only {
        (stored_len + 5, stored_len + 5, None)
    } else {
        let trees = DynamicTrees::build(freq);
        let opt = (trees.cost(freq) + 3 + 7) >> 3;
        let fixed = (fixed_cost(freq) + 3 + 7) >> 3;
        trace!("block costs: dynamic {} bytes, fixed {} bytes, stored {} bytes", opt, fixed, stored_len);
        (opt, fixed, Some(trees))
    };
    if static_bytes <= opt_bytes || options.fixed_only {
        opt_bytes = static_bytes;
    }

    let block_type = match (stored, trees) {
        (Some(data), _) if stored_len + 4 <= opt_bytes => {
            write_stored_block(writer, data, last);
            BlockType::Stored
        }
        (_, Some(trees)) if static_bytes != opt_bytes && !options.fixed_only => {
            write_dynamic_block(writer, buf.tokens(), &trees, last);
            BlockType::Dynamic
        }
        _ => {
            write_fixed_block(writer, buf.tokens(), last);
            BlockType::Fixed
        }
    };

    trace!("flushed {:?} block: {} tokens, last={}", block_type, buf.len(), last);
    if last {
        writer.align_to_byte();
    }
    block_type
}
