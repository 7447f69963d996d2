//! LZ77 window and hash-chain match finder
//!
//! The window holds `2 * w_size` bytes. New input is appended after the
//! lookahead; once the cursor passes `w_size + max_dist()` the upper half is
//! moved down and every stored position is rebased.

use super::config::LevelParams;
use super::tables::{MAX_MATCH, MIN_MATCH};

/// Lookahead needed before a match search: a full match plus the next
/// string's hash bytes
pub const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH + 1;

/// Length-3 matches further back than this are not worth a back-reference
pub const TOO_FAR: usize = 4096;

/// Position value meaning "no entry" in `head` and `prev`
const NIL: u16 = 0;

/// Sliding window with hash chains and the per-step match state
pub struct MatchWindow {
    pub window: Vec<u8>,
    w_size: usize,
    w_mask: usize,

    /// Most recent position for each hash value
    head: Vec<u16>,
    /// Previous position with the same hash, indexed by `pos & w_mask`
    prev: Vec<u16>,
    ins_h: usize,
    hash_mask: usize,
    hash_shift: u32,

    /// Start of the string to be processed
    pub strstart: usize,
    /// Window position where the current block began; negative once the
    /// block start has slid out of the window
    pub block_start: isize,
    /// Valid bytes from `strstart` on
    pub lookahead: usize,
    /// Bytes before `strstart` still to be inserted into the hash chains
    pub insert: usize,

    pub match_start: usize,
    pub match_length: usize,
    pub prev_length: usize,
    pub prev_match: usize,
    pub match_available: bool,

    pub max_chain_length: usize,
    pub max_lazy_match: usize,
    pub good_match: usize,
    pub nice_match: usize,
}

impl MatchWindow {
    pub fn new(window_bits: u8, mem_level: u8, params: LevelParams) -> Self {
        let w_size = 1usize << window_bits;
        let hash_bits = mem_level as u32 + 7;
        let hash_size = 1usize << hash_bits;
        let mut lz = Self {
            window: vec![0; 2 * w_size],
            w_size,
            w_mask: w_size - 1,
            head: vec![NIL; hash_size],
            prev: vec![NIL; w_size],
            ins_h: 0,
            hash_mask: hash_size - 1,
            hash_shift: (hash_bits + MIN_MATCH as u32 - 1) / MIN_MATCH as u32,
            strstart: 0,
            block_start: 0,
            lookahead: 0,
            insert: 0,
            match_start: 0,
            match_length: MIN_MATCH - 1,
            prev_length: MIN_MATCH - 1,
            prev_match: 0,
            match_available: false,
            max_chain_length: 0,
            max_lazy_match: 0,
            good_match: 0,
            nice_match: 0,
        };
        lz.set_params(params);
        lz
    }

    pub fn set_params(&mut self, params: LevelParams) {
        self.max_chain_length = params.max_chain as usize;
        self.max_lazy_match = params.max_lazy as usize;
        self.good_match = params.good_length as usize;
        self.nice_match = params.nice_length as usize;
    }

    /// Forget all history and positions
    pub fn reset(&mut self) {
        self.clear_hash();
        self.strstart = 0;
        self.block_start = 0;
        self.lookahead = 0;
        self.insert = 0;
        self.match_start = 0;
        self.match_length = MIN_MATCH - 1;
        self.prev_length = MIN_MATCH - 1;
        self.prev_match = 0;
        self.match_available = false;
        self.ins_h = 0;
    }

    pub fn clear_hash(&mut self) {
        self.head.fill(NIL);
    }

    pub fn w_size(&self) -> usize {
        self.w_size
    }

    /// Furthest distance a match may reach back
    #[inline]
    pub fn max_dist(&self) -> usize {
        self.w_size - MIN_LOOKAHEAD
    }

    #[inline]
    fn update_hash(&self, h: usize, byte: u8) -> usize {
        ((h << self.hash_shift) ^ byte as usize) & self.hash_mask
    }

    /// Link the string at `pos` into its chain, returning the previous head
    #[inline]
    pub fn insert_string(&mut self, pos: usize) -> usize {
        self.ins_h = self.update_hash(self.ins_h, self.window[pos + MIN_MATCH - 1]);
        let match_head = self.head[self.ins_h];
        self.prev[pos & self.w_mask] = match_head;
        self.head[self.ins_h] = pos as u16;
        match_head as usize
    }

    /// Seed the rolling hash with the two bytes at `pos`
    #[inline]
    pub fn prime_hash(&mut self, pos: usize) {
        self.ins_h = self.window[pos] as usize;
        self.ins_h = self.update_hash(self.ins_h, self.window[pos + 1]);
    }

    /// Move the upper half of the window down by `w_size`
    fn slide(&mut self) {
        let w_size = self.w_size;
        self.window.copy_within(w_size..2 * w_size, 0);
        self.match_start = self.match_start.saturating_sub(w_size);
        self.strstart -= w_size;
        self.block_start -= w_size as isize;

        let rebase = |p: &mut u16| {
            *p = (*p as usize).saturating_sub(w_size) as u16;
        };
        self.head.iter_mut().for_each(rebase);
        self.prev.iter_mut().for_each(rebase);
    }

    /// Top up the lookahead from `input[*pos..]`, advancing `*pos`
    ///
    /// Stops once the lookahead reaches `MIN_LOOKAHEAD` or the input runs
    /// out. Hash insertions deferred by `insert` are completed as soon as
    /// enough bytes follow them.
    pub fn fill_window(&mut self, input: &[u8], pos: &mut usize) {
        loop {
            let mut more = self.window.len() - self.lookahead - self.strstart;

            if self.strstart >= self.w_size + self.max_dist() {
                self.slide();
                more += self.w_size;
            }
            if *pos >= input.len() {
                break;
            }

            let n = more.min(input.len() - *pos);
            let dst = self.strstart + self.lookahead;
            self.window[dst..dst + n].copy_from_slice(&input[*pos..*pos + n]);
            *pos += n;
            self.lookahead += n;

            if self.lookahead + self.insert >= MIN_MATCH {
                let mut s = self.strstart - self.insert;
                self.prime_hash(s);
                while self.insert > 0 {
                    self.insert_string(s);
                    s += 1;
                    self.insert -= 1;
                    if self.lookahead + self.insert < MIN_MATCH {
                        break;
                    }
                }
            }

            if self.lookahead >= MIN_LOOKAHEAD || *pos >= input.len() {
                break;
            }
        }
    }

    /// Longest match for the string at `strstart`, walking the chain from
    /// `cur_match`
    ///
    /// Sets `match_start` when a match longer than `prev_length` is found.
    /// The result never exceeds the lookahead.
    pub fn longest_match(&mut self, mut cur_match: usize) -> usize {
        let mut chain_length = self.max_chain_length;
        let scan = self.strstart;
        let mut best_len = self.prev_length;
        let mut nice_match = self.nice_match;
        let limit = self.strstart.saturating_sub(self.max_dist());
        let max_len = MAX_MATCH.min(self.window.len() - scan);

        if self.prev_length >= self.good_match {
            chain_length >>= 2;
        }
        if nice_match > self.lookahead {
            nice_match = self.lookahead;
        }

        loop {
            if best_len < max_len {
                let w = &self.window;
                let candidate = cur_match;
                if w[candidate + best_len] == w[scan + best_len]
                    && w[candidate + best_len - 1] == w[scan + best_len - 1]
                    && w[candidate] == w[scan]
                    && w[candidate + 1] == w[scan + 1]
                {
                    let len = 2 + w[scan + 2..scan + max_len]
                        .iter()
                        .zip(&w[candidate + 2..candidate + max_len])
                        .take_while(|(a, b)| a == b)
                        .count();

                    if len > best_len {
                        self.match_start = candidate;
                        best_len = len;
                        if len >= nice_match {
                            break;
                        }
                    }
                }
            }

            cur_match = self.prev[cur_match & self.w_mask] as usize;
            chain_length = chain_length.saturating_sub(1);
            if cur_match <= limit || chain_length == 0 {
                break;
            }
        }

        best_len.min(self.lookahead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompressionLevel;

    fn window_with(data: &[u8], level: CompressionLevel) -> MatchWindow {
        let mut lz = MatchWindow::new(15, 8, level.params());
        let mut pos = 0;
        lz.fill_window(data, &mut pos);
        assert_eq!(pos, data.len());
        lz
    }

    #[test]
    fn test_fill_window_copies_input() {
        let lz = window_with(b"hello world", CompressionLevel::Level6);
        assert_eq!(lz.lookahead, 11);
        assert_eq!(&lz.window[..11], b"hello world");
    }

    #[test]
    fn test_finds_repeat() {
        let data = b"abcdefabcdefabcdef";
        let mut lz = window_with(data, CompressionLevel::Level6);
        lz.prime_hash(0);
        for i in 0..6 {
            lz.insert_string(i);
        }
        lz.strstart = 6;
        lz.lookahead = data.len() - 6;
        let head = lz.insert_string(6);
        assert_eq!(head, 0, "position 0 is never linked");

        // Skip past position 0 so the chain has a usable entry
        let mut lz = window_with(b"xabcdefabcdefabcdef", CompressionLevel::Level6);
        lz.prime_hash(0);
        for i in 0..7 {
            lz.insert_string(i);
        }
        lz.strstart = 7;
        lz.lookahead = 12;
        let head = lz.insert_string(7);
        assert_eq!(head, 1);
        let len = lz.longest_match(head);
        assert_eq!(len, 12);
        assert_eq!(lz.match_start, 1);
    }

    #[test]
    fn test_match_clamped_to_lookahead() {
        let data = vec![b'z'; 100];
        let mut lz = window_with(&data, CompressionLevel::Level9);
        lz.insert_string(1);
        lz.strstart = 2;
        lz.lookahead = 40;
        let len = lz.longest_match(1);
        assert_eq!(len, 40);
    }

    #[test]
    fn test_slide_rebases_positions() {
        let mut lz = MatchWindow::new(9, 1, CompressionLevel::Level6.params());
        let data: Vec<u8> = (0..4000u32).map(|i| (i % 251) as u8).collect();
        let mut pos = 0;
        while pos < data.len() {
            lz.fill_window(&data, &mut pos);
            // Pretend everything was processed
            while lz.lookahead > 0 {
                if lz.lookahead >= MIN_MATCH {
                    lz.insert_string(lz.strstart);
                }
                lz.strstart += 1;
                lz.lookahead -= 1;
            }
        }
        assert!(lz.strstart < lz.window.len());
        assert!(lz.head.iter().all(|&p| (p as usize) < lz.window.len()));
        assert!(lz.prev.iter().all(|&p| (p as usize) < lz.strstart.max(1)));
    }
}
