//! Block loops: turn window contents into tokens and emit blocks
//!
//! Each loop runs until it needs more input, the output fills up, or the
//! requested flush has been carried out.

use super::config::{LevelFunction, Strategy};
use super::deflater::{BlockState, Deflater, Flush, Input, Output};
use super::matcher::{MIN_LOOKAHEAD, TOO_FAR};
use super::tables::{MAX_MATCH, MIN_MATCH};

impl Deflater {
    pub(super) fn run_block_loop(
        &mut self,
        input: &mut Input<'_>,
        out: &mut Output<'_>,
        flush: Flush,
    ) -> BlockState {
        match self.strategy {
            Strategy::HuffmanOnly => self.deflate_huff(input, out, flush),
            Strategy::Rle => self.deflate_rle(input, out, flush),
            _ => match self.params.function {
                LevelFunction::Stored => self.deflate_stored(input, out, flush),
                LevelFunction::Fast => self.deflate_fast(input, out, flush),
                LevelFunction::Slow => self.deflate_slow(input, out, flush),
            },
        }
    }

    /// Top up the window, checksumming whatever input it takes
    fn fill_window(&mut self, input: &mut Input<'_>) {
        let start = input.pos;
        self.lz.fill_window(input.data, &mut input.pos);
        if input.pos > start {
            self.checksum.update(&input.data[start..input.pos]);
            self.total_in += (input.pos - start) as u64;
        }
    }

    /// Emit the current block; true when the output buffer is now full
    fn flush_block(&mut self, last: bool, out: &mut Output<'_>) -> bool {
        self.flush_block_only(last, out);
        out.is_full()
    }

    /// Common tail of the token-producing loops
    fn end_of_input(&mut self, out: &mut Output<'_>, flush: Flush) -> BlockState {
        if flush == Flush::Finish {
            return if self.flush_block(true, out) {
                BlockState::FinishStarted
            } else {
                BlockState::FinishDone
            };
        }
        if !self.tokens.is_empty() && self.flush_block(false, out) {
            return BlockState::NeedMore;
        }
        BlockState::BlockDone
    }

    /// Level 0: copy input into stored blocks
    fn deflate_stored(
        &mut self,
        input: &mut Input<'_>,
        out: &mut Output<'_>,
        flush: Flush,
    ) -> BlockState {
        let max_block_size = self.max_block_size as isize;

        loop {
            if self.lz.lookahead <= 1 {
                self.fill_window(input);
                if self.lz.lookahead == 0 {
                    if flush == Flush::NoFlush {
                        return BlockState::NeedMore;
                    }
                    break;
                }
            }

            self.lz.strstart += self.lz.lookahead;
            self.lz.lookahead = 0;

            let max_start = self.lz.block_start + max_block_size;
            if self.lz.strstart as isize >= max_start {
                let max_start = max_start as usize;
                self.lz.lookahead = self.lz.strstart - max_start;
                self.lz.strstart = max_start;
                if self.flush_block(false, out) {
                    return BlockState::NeedMore;
                }
            }
            // Flush before the block start can slide out of the window
            if self.lz.strstart as isize - self.lz.block_start >= self.lz.max_dist() as isize
                && self.flush_block(false, out)
            {
                return BlockState::NeedMore;
            }
        }

        self.lz.insert = 0;
        if flush == Flush::Finish {
            return if self.flush_block(true, out) {
                BlockState::FinishStarted
            } else {
                BlockState::FinishDone
            };
        }
        if self.lz.strstart as isize > self.lz.block_start && self.flush_block(false, out) {
            return BlockState::NeedMore;
        }
        BlockState::BlockDone
    }

    /// Greedy matching: take every match found, never look ahead
    fn deflate_fast(
        &mut self,
        input: &mut Input<'_>,
        out: &mut Output<'_>,
        flush: Flush,
    ) -> BlockState {
        loop {
            if self.lz.lookahead < MIN_LOOKAHEAD {
                self.fill_window(input);
                if self.lz.lookahead < MIN_LOOKAHEAD && flush == Flush::NoFlush {
                    return BlockState::NeedMore;
                }
                if self.lz.lookahead == 0 {
                    break;
                }
            }

            let lz = &mut self.lz;
            let mut hash_head = 0;
            if lz.lookahead >= MIN_MATCH {
                hash_head = lz.insert_string(lz.strstart);
            }
            if hash_head != 0 && lz.strstart - hash_head <= lz.max_dist() {
                lz.match_length = lz.longest_match(hash_head);
            }

            let full = if lz.match_length >= MIN_MATCH {
                let full = self.tokens.push_copy(lz.match_length, lz.strstart - lz.match_start);
                lz.lookahead -= lz.match_length;

                // Index the strings inside short matches too
                if lz.match_length <= lz.max_lazy_match && lz.lookahead >= MIN_MATCH {
                    lz.match_length -= 1;
                    while lz.match_length > 0 {
                        lz.strstart += 1;
                        lz.insert_string(lz.strstart);
                        lz.match_length -= 1;
                    }
                    lz.strstart += 1;
                } else {
                    lz.strstart += lz.match_length;
                    lz.match_length = 0;
                    if lz.lookahead >= MIN_MATCH {
                        lz.prime_hash(lz.strstart);
                    }
                }
                full
            } else {
                let full = self.tokens.push_literal(lz.window[lz.strstart]);
                lz.lookahead -= 1;
                lz.strstart += 1;
                full
            };

            if full && self.flush_block(false, out) {
                return BlockState::NeedMore;
            }
        }

        self.lz.insert = self.lz.strstart.min(MIN_MATCH - 1);
        self.end_of_input(out, flush)
    }

    /// Lazy matching: a match is only taken if the next position does not
    /// start a longer one
    fn deflate_slow(
        &mut self,
        input: &mut Input<'_>,
        out: &mut Output<'_>,
        flush: Flush,
    ) -> BlockState {
        let filtered = self.strategy == Strategy::Filtered;

        loop {
            if self.lz.lookahead < MIN_LOOKAHEAD {
                self.fill_window(input);
                if self.lz.lookahead < MIN_LOOKAHEAD && flush == Flush::NoFlush {
                    return BlockState::NeedMore;
                }
                if self.lz.lookahead == 0 {
                    break;
                }
            }

            let lz = &mut self.lz;
            let mut hash_head = 0;
            if lz.lookahead >= MIN_MATCH {
                hash_head = lz.insert_string(lz.strstart);
            }

            lz.prev_length = lz.match_length;
            lz.prev_match = lz.match_start;
            lz.match_length = MIN_MATCH - 1;

            if hash_head != 0
                && lz.prev_length < lz.max_lazy_match
                && lz.strstart - hash_head <= lz.max_dist()
            {
                lz.match_length = lz.longest_match(hash_head);
                if lz.match_length <= 5
                    && (filtered
                        || (lz.match_length == MIN_MATCH && lz.strstart - lz.match_start > TOO_FAR))
                {
                    lz.match_length = MIN_MATCH - 1;
                }
            }

            if lz.prev_length >= MIN_MATCH && lz.match_length <= lz.prev_length {
                // The previous match wins; it started one byte back
                let max_insert = lz.strstart + lz.lookahead - MIN_MATCH;
                let full =
                    self.tokens.push_copy(lz.prev_length, lz.strstart - 1 - lz.prev_match);
                lz.lookahead -= lz.prev_length - 1;
                lz.prev_length -= 2;
                while lz.prev_length > 0 {
                    lz.strstart += 1;
                    if lz.strstart <= max_insert {
                        lz.insert_string(lz.strstart);
                    }
                    lz.prev_length -= 1;
                }
                lz.match_available = false;
                lz.match_length = MIN_MATCH - 1;
                lz.strstart += 1;

                if full && self.flush_block(false, out) {
                    return BlockState::NeedMore;
                }
            } else if lz.match_available {
                // No better match here, so the previous byte goes out alone
                let full = self.tokens.push_literal(lz.window[lz.strstart - 1]);
                if full {
                    self.flush_block_only(false, out);
                }
                self.lz.strstart += 1;
                self.lz.lookahead -= 1;
                if out.is_full() {
                    return BlockState::NeedMore;
                }
            } else {
                // Defer this position to compare against the next one
                lz.match_available = true;
                lz.strstart += 1;
                lz.lookahead -= 1;
            }
        }

        if self.lz.match_available {
            self.tokens.push_literal(self.lz.window[self.lz.strstart - 1]);
            self.lz.match_available = false;
        }
        self.lz.insert = self.lz.strstart.min(MIN_MATCH - 1);
        self.end_of_input(out, flush)
    }

    /// Run-length matching: only distance-1 copies of the previous byte
    fn deflate_rle(
        &mut self,
        input: &mut Input<'_>,
        out: &mut Output<'_>,
        flush: Flush,
    ) -> BlockState {
        loop {
            if self.lz.lookahead <= MAX_MATCH {
                self.fill_window(input);
                if self.lz.lookahead <= MAX_MATCH && flush == Flush::NoFlush {
                    return BlockState::NeedMore;
                }
                if self.lz.lookahead == 0 {
                    break;
                }
            }

            let lz = &mut self.lz;
            let mut run = 0;
            if lz.lookahead >= MIN_MATCH && lz.strstart > 0 {
                let prev = lz.window[lz.strstart - 1];
                let max = MAX_MATCH.min(lz.lookahead);
                run = lz.window[lz.strstart..lz.strstart + max]
                    .iter()
                    .take_while(|&&b| b == prev)
                    .count();
            }

            let full = if run >= MIN_MATCH {
                let full = self.tokens.push_copy(run, 1);
                lz.lookahead -= run;
                lz.strstart += run;
                full
            } else {
                let full = self.tokens.push_literal(lz.window[lz.strstart]);
                lz.lookahead -= 1;
                lz.strstart += 1;
                full
            };

            if full && self.flush_block(false, out) {
                return BlockState::NeedMore;
            }
        }

        self.lz.insert = 0;
        self.end_of_input(out, flush)
    }

    /// Literals only; no string matching at all
    fn deflate_huff(
        &mut self,
        input: &mut Input<'_>,
        out: &mut Output<'_>,
        flush: Flush,
    ) -> BlockState {
        loop {
            if self.lz.lookahead == 0 {
                self.fill_window(input);
                if self.lz.lookahead == 0 {
                    if flush == Flush::NoFlush {
                        return BlockState::NeedMore;
                    }
                    break;
                }
            }

            let full = self.tokens.push_literal(self.lz.window[self.lz.strstart]);
            self.lz.lookahead -= 1;
            self.lz.strstart += 1;

            if full && self.flush_block(false, out) {
                return BlockState::NeedMore;
            }
        }

        self.lz.insert = 0;
        self.end_of_input(out, flush)
    }
}
