//! Length-limited Huffman tree construction
//!
//! Trees are built with a binary heap of node indices ordered by frequency,
//! ties going to the shallower subtree. Lengths that exceed the limit are
//! repaired by pushing leaves down from a shorter level, then canonical
//! codes are assigned from the per-length counts.

use crate::bits::reverse_bits;

/// Longest code allowed for literal/length and distance trees
pub const MAX_BITS: u8 = 15;

/// Longest code allowed for the code length tree
pub const MAX_BL_BITS: u8 = 7;

/// A Huffman tree ready for encoding
#[derive(Clone, Debug, Default)]
pub struct HuffmanTree {
    /// Code length per symbol (0 = unused)
    pub lengths: Vec<u8>,
    /// Bit-reversed canonical code per symbol, ready for LSB-first output
    pub codes: Vec<u16>,
    /// Largest symbol with a non-zero length
    pub max_code: usize,
}

impl HuffmanTree {
    /// Build an optimal tree for `freqs` with no code longer than `max_length`
    ///
    /// Symbols with zero frequency get no code. If fewer than two symbols are
    /// used, phantom symbols are added so the tree has two leaves.
    pub fn build(freqs: &[u32], max_length: u8) -> Self {
        let mut builder = TreeBuilder::new(freqs);
        builder.run(max_length);
        let lengths = builder.len[..freqs.len()].to_vec();
        let codes = canonical_codes(&lengths);
        Self { lengths, codes, max_code: builder.max_code }
    }

    /// Tree from fixed code lengths
    pub fn from_lengths(lengths: &[u8]) -> Self {
        let max_code = lengths.iter().rposition(|&l| l > 0).unwrap_or(0);
        Self { lengths: lengths.to_vec(), codes: canonical_codes(lengths), max_code }
    }

    /// Total bits for `freqs` under this tree, ignoring extra bits
    pub fn cost(&self, freqs: &[u32]) -> u64 {
        freqs.iter().zip(&self.lengths).map(|(&f, &l)| f as u64 * l as u64).sum()
    }
}

/// Scratch state for one tree construction
struct TreeBuilder {
    /// Node frequencies: leaves first, internal nodes from `elems` on
    freq: Vec<u32>,
    /// Subtree depth per node, used to break frequency ties
    depth: Vec<u8>,
    /// Parent node per node
    dad: Vec<usize>,
    /// Bit length per node
    len: Vec<u8>,
    /// heap[1..=heap_len] is the priority queue, heap[heap_max..] the
    /// nodes in the order they were removed
    heap: Vec<usize>,
    heap_len: usize,
    heap_max: usize,
    elems: usize,
    max_code: usize,
}

impl TreeBuilder {
    fn new(freqs: &[u32]) -> Self {
        let elems = freqs.len();
        let nodes = 2 * elems + 1;
        let mut freq = vec![0u32; nodes];
        freq[..elems].copy_from_slice(freqs);
        Self {
            freq,
            depth: vec![0; nodes],
            dad: vec![0; nodes],
            len: vec![0; nodes],
            heap: vec![0; nodes],
            heap_len: 0,
            heap_max: nodes,
            elems,
            max_code: 0,
        }
    }

    #[inline]
    fn smaller(&self, n: usize, m: usize) -> bool {
        self.freq[n] < self.freq[m] || (self.freq[n] == self.freq[m] && self.depth[n] <= self.depth[m])
    }

    /// Restore the heap property by sifting node at `k` down
    fn sift_down(&mut self, mut k: usize) {
        let v = self.heap[k];
        let mut j = k << 1;
        while j <= self.heap_len {
            if j < self.heap_len && self.smaller(self.heap[j + 1], self.heap[j]) {
                j += 1;
            }
            if self.smaller(v, self.heap[j]) {
                break;
            }
            self.heap[k] = self.heap[j];
            k = j;
            j <<= 1;
        }
        self.heap[k] = v;
    }

    fn pop(&mut self) -> usize {
        let top = self.heap[1];
        self.heap[1] = self.heap[self.heap_len];
        self.heap_len -= 1;
        self.sift_down(1);
        top
    }

    fn run(&mut self, max_length: u8) {
        let mut max_code: Option<usize> = None;
        for n in 0..self.elems {
            if self.freq[n] != 0 {
                self.heap_len += 1;
                self.heap[self.heap_len] = n;
                max_code = Some(n);
            }
        }

        // Two leaves minimum, so even a single symbol gets a 1-bit code
        while self.heap_len < 2 {
            let node = match max_code {
                Some(m) if m >= 2 || m + 1 >= self.elems => 0,
                Some(m) => {
                    max_code = Some(m + 1);
                    m + 1
                }
                None => {
                    max_code = Some(0);
                    0
                }
            };
            self.heap_len += 1;
            self.heap[self.heap_len] = node;
            self.freq[node] = 1;
            self.depth[node] = 0;
        }
        self.max_code = max_code.unwrap_or(0);

        for n in (1..=self.heap_len / 2).rev() {
            self.sift_down(n);
        }

        let mut node = self.elems;
        loop {
            let n = self.pop();
            let m = self.heap[1];

            self.heap_max -= 1;
            self.heap[self.heap_max] = n;
            self.heap_max -= 1;
            self.heap[self.heap_max] = m;

            self.freq[node] = self.freq[n] + self.freq[m];
            self.depth[node] = self.depth[n].max(self.depth[m]) + 1;
            self.dad[n] = node;
            self.dad[m] = node;

            self.heap[1] = node;
            node += 1;
            self.sift_down(1);

            if self.heap_len < 2 {
                break;
            }
        }
        self.heap_max -= 1;
        self.heap[self.heap_max] = self.heap[1];

        self.assign_lengths(max_length);
    }

    /// Walk nodes from the root outwards, then repair over-long codes
    fn assign_lengths(&mut self, max_length: u8) {
        let mut bl_count = [0u16; MAX_BITS as usize + 1];
        let root = self.heap[self.heap_max];
        self.len[root] = 0;

        let mut overflow = 0i32;
        for h in self.heap_max + 1..self.heap.len() {
            let n = self.heap[h];
            let mut bits = self.len[self.dad[n]] + 1;
            if bits > max_length {
                bits = max_length;
                overflow += 1;
            }
            self.len[n] = bits;
            if n > self.max_code {
                continue;
            }
            bl_count[bits as usize] += 1;
        }
        if overflow == 0 {
            return;
        }

        // Move a leaf down from the deepest non-full level above the limit
        // and give its slot to two over-long leaves
        while overflow > 0 {
            let mut bits = max_length as usize - 1;
            while bl_count[bits] == 0 {
                bits -= 1;
            }
            bl_count[bits] -= 1;
            bl_count[bits + 1] += 2;
            bl_count[max_length as usize] -= 1;
            overflow -= 2;
        }

        // Hand out the repaired lengths to leaves, least frequent first
        let mut h = self.heap.len();
        for bits in (1..=max_length as usize).rev() {
            let mut n = bl_count[bits];
            while n != 0 {
                h -= 1;
                let m = self.heap[h];
                if m > self.max_code {
                    continue;
                }
                self.len[m] = bits as u8;
                n -= 1;
            }
        }
    }
}

/// Canonical codes for `lengths`, bit-reversed for LSB-first emission
///
/// Codes of one length are consecutive in symbol order, and shorter codes
/// sort before longer ones.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u16> {
    let mut bl_count = [0u16; MAX_BITS as usize + 1];
    for &len in lengths {
        bl_count[len as usize] += 1;
    }
    bl_count[0] = 0;

    let mut next_code = [0u16; MAX_BITS as usize + 1];
    let mut code = 0u16;
    for bits in 1..=MAX_BITS as usize {
        code = (code.wrapping_add(bl_count[bits - 1])) << 1;
        next_code[bits] = code;
    }

    lengths
        .iter()
        .map(|&len| {
            if len == 0 {
                return 0;
            }
            let code = next_code[len as usize];
            next_code[len as usize] += 1;
            reverse_bits(code as u32, len) as u16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kraft_sum(lengths: &[u8], max: u8) -> u64 {
        lengths.iter().filter(|&&l| l > 0).map(|&l| 1u64 << (max - l)).sum()
    }

    /// Un-reverse codes and check no code is a prefix of another
    fn assert_prefix_free(tree: &HuffmanTree) {
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
                assert_ne!(a >> (la - shorter), b >> (lb - shorter), "prefix clash between codes");
            }
        }
    }

    #[test]
    fn test_equal_frequencies() {
        let tree = HuffmanTree::build(&[1, 1, 1, 1], MAX_BITS);
        assert_eq!(tree.lengths, vec![2, 2, 2, 2]);
        assert_eq!(tree.max_code, 3);
        assert_prefix_free(&tree);
    }

    #[test]
    fn test_skewed_frequencies() {
        let tree = HuffmanTree::build(&[100, 1, 1, 1], MAX_BITS);
        assert_eq!(tree.lengths[0], 1);
        assert!(tree.lengths[1..].iter().all(|&l| l == 3 || l == 2));
        assert_eq!(kraft_sum(&tree.lengths, MAX_BITS), 1 << MAX_BITS);
    }

    #[test]
    fn test_single_symbol_gets_partner() {
        let tree = HuffmanTree::build(&[0, 0, 0, 0, 0, 7, 0], MAX_BITS);
        assert_eq!(tree.lengths[5], 1);
        assert_eq!(tree.lengths[0], 1);
        assert_eq!(tree.max_code, 5);

        let tree = HuffmanTree::build(&[3, 0, 0], MAX_BITS);
        assert_eq!(tree.lengths, vec![1, 1, 0]);
        assert_eq!(tree.max_code, 1);
    }

    #[test]
    fn test_no_symbols() {
        let tree = HuffmanTree::build(&[0; 30], MAX_BITS);
        assert_eq!(&tree.lengths[..2], &[1, 1]);
        assert_eq!(tree.max_code, 1);
    }

    #[test]
    fn test_length_limit_enforced() {
        // Fibonacci frequencies produce a maximally deep tree
        let mut freqs = vec![0u32; 30];
        let (mut a, mut b) = (1u32, 1u32);
        for f in freqs.iter_mut() {
            *f = a;
            let next = a.saturating_add(b);
            a = b;
            b = next;
        }
        let tree = HuffmanTree::build(&freqs, MAX_BITS);
        assert!(tree.lengths.iter().all(|&l| (1..=MAX_BITS).contains(&l)));
        assert_eq!(kraft_sum(&tree.lengths, MAX_BITS), 1 << MAX_BITS);
        assert_prefix_free(&tree);

        let tree = HuffmanTree::build(&freqs[..19], MAX_BL_BITS);
        assert!(tree.lengths.iter().all(|&l| (1..=MAX_BL_BITS).contains(&l)));
        assert_eq!(kraft_sum(&tree.lengths, MAX_BL_BITS), 1 << MAX_BL_BITS);
    }

    #[test]
    fn test_canonical_codes_consecutive() {
        // RFC 1951 section 3.2.2 example
        let lengths = [3, 3, 3, 3, 3, 2, 4, 4];
        let codes: Vec<u32> = canonical_codes(&lengths)
            .iter()
            .zip(&lengths)
            .map(|(&c, &l)| reverse_bits(c as u32, l))
            .collect();
        assert_eq!(codes, vec![0b010, 0b011, 0b100, 0b101, 0b110, 0b00, 0b1110, 0b1111]);
    }

    #[test]
    fn test_frequent_symbols_get_short_codes() {
        let freqs: Vec<u32> = (1..=40).map(|i| i * i).collect();
        let tree = HuffmanTree::build(&freqs, MAX_BITS);
        for w in tree.lengths.windows(2) {
            assert!(w[0] >= w[1]);
        }
    }
}
