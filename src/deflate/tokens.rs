use crate::huffman::encoder::FrequencyCounter;

/// Represents a single token in the LZ77 stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LZ77Token {
    /// A literal byte
    Literal(u8),
    /// A back-reference: copy `length` bytes from `distance` bytes back
    Copy { length: u16, distance: u16 },
}

/// Tokens of the block under construction, with running symbol counts
#[derive(Clone, Debug)]
pub struct TokenBuffer {
    tokens: Vec<LZ77Token>,
    freq: FrequencyCounter,
    /// Token count at which the block must be flushed
    limit: usize,
}

impl TokenBuffer {
    /// Buffer for `capacity` tokens; reports full one token early so the
    /// last slot is never needed
    pub fn new(capacity: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(capacity),
            freq: FrequencyCounter::new(),
            limit: capacity.saturating_sub(1).max(1),
        }
    }

    /// Record a literal; true when the block should be flushed
    #[inline]
    pub fn push_literal(&mut self, byte: u8) -> bool {
        self.tokens.push(LZ77Token::Literal(byte));
        self.freq.count_literal(byte);
        self.tokens.len() >= self.limit
    }

    /// Record a match; true when the block should be flushed
    #[inline]
    pub fn push_copy(&mut self, length: usize, distance: usize) -> bool {
        debug_assert!((3..=258).contains(&length));
        debug_assert!((1..=32768).contains(&distance));
        self.tokens.push(LZ77Token::Copy { length: length as u16, distance: distance as u16 });
        self.freq.count_copy(length, distance);
        self.tokens.len() >= self.limit
    }

    pub fn tokens(&self) -> &[LZ77Token] {
        &self.tokens
    }

    pub fn frequencies(&self) -> &FrequencyCounter {
        &self.freq
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Start a new block
    pub fn clear(&mut self) {
        self.tokens.clear();
        self.freq.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_reports_full_before_capacity() {
        let mut buf = TokenBuffer::new(4);
        assert!(!buf.push_literal(b'a'));
        assert!(!buf.push_copy(3, 1));
        assert!(buf.push_literal(b'b'));
        assert_eq!(buf.len(), 3);

        assert_eq!(buf.tokens()[1], LZ77Token::Copy { length: 3, distance: 1 });

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.frequencies().literal_freq[b'a' as usize], 0);
        assert_eq!(buf.frequencies().literal_freq[256], 1);
    }
}
