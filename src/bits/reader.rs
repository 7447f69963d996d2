use crate::error::{Error, Result};

/// Bit-level reader for DEFLATE streams
///
/// DEFLATE uses LSB-first bit ordering within bytes.
/// Bits are read from LSB to MSB within each byte.
///
/// Input arrives in chunks through [`BitReader::push_input`]. Running out of
/// input mid-read yields [`Error::UnexpectedEof`]; callers that can wait for
/// more data take a [`Checkpoint`] first and restore it on that error.
#[derive(Debug, Default)]
pub struct BitReader {
    /// Unconsumed input bytes (plus the bytes currently held in `buffer`)
    input: Vec<u8>,
    /// Next byte of `input` to load into `buffer`
    pos: usize,
    /// Buffer holding up to 64 bits
    buffer: u64,
    /// Number of valid bits in buffer (0-64)
    bits_available: u8,
}

/// Saved reader position, valid until the next [`BitReader::push_input`]
#[derive(Clone, Copy, Debug)]
pub struct Checkpoint {
    pos: usize,
    buffer: u64,
    bits_available: u8,
}

impl BitReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of input, dropping bytes that are fully consumed
    pub fn push_input(&mut self, data: &[u8]) {
        let keep_from = self.pos - (self.bits_available / 8) as usize;
        if keep_from > 0 {
            self.input.drain(..keep_from);
            self.pos -= keep_from;
        }
        self.input.extend_from_slice(data);
    }

    /// Ensure at least `n` bits are available in buffer
    ///
    /// Uses bulk refill: loads up to 8 bytes at once when the slice has them.
    #[inline]
    fn fill_buffer(&mut self, n: u8) -> Result<()> {
        debug_assert!(n <= 57, "Cannot request more than 57 bits at once");

        // Fast path: already have enough bits
        if self.bits_available >= n {
            return Ok(());
        }

        while self.bits_available <= 56 && self.pos < self.input.len() {
            self.buffer |= (self.input[self.pos] as u64) << self.bits_available;
            self.bits_available += 8;
            self.pos += 1;
        }

        if self.bits_available >= n {
            Ok(())
        } else {
            Err(Error::UnexpectedEof)
        }
    }

    /// Load as many bits as possible (up to `n`) and report how many are available
    #[inline]
    pub fn fill_up_to(&mut self, n: u8) -> u8 {
        let _ = self.fill_buffer(n);
        self.bits_available
    }

    /// Read `n` bits (1-32) in LSB-first order (standard DEFLATE order)
    pub fn read_bits(&mut self, n: u8) -> Result<u32> {
        debug_assert!(n <= 32, "Cannot read more than 32 bits at once");

        if n == 0 {
            return Ok(0);
        }

        self.fill_buffer(n)?;

        let mask = (1u64 << n) - 1;
        let result = (self.buffer & mask) as u32;
        self.buffer >>= n;
        self.bits_available -= n;

        Ok(result)
    }

    /// Peek at `n` bits without consuming them (for table-based Huffman decoding)
    #[inline]
    pub fn peek_bits(&mut self, n: u8) -> Result<u32> {
        debug_assert!(n <= 32, "Cannot peek more than 32 bits at once");

        if n == 0 {
            return Ok(0);
        }

        self.fill_buffer(n)?;

        let mask = (1u64 << n) - 1;
        Ok((self.buffer & mask) as u32)
    }

    /// Low `n` bits of the buffer, whatever is currently loaded (missing bits read as 0)
    #[inline]
    pub fn peek_loaded(&self, n: u8) -> u32 {
        let mask = (1u64 << n) - 1;
        (self.buffer & mask) as u32
    }

    /// Consume `n` bits that were previously peeked
    #[inline]
    pub fn consume_bits(&mut self, n: u8) {
        debug_assert!(n <= self.bits_available, "Cannot consume more bits than available");
        self.buffer >>= n;
        self.bits_available -= n;
    }

    /// Read a single bit
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Discard remaining bits in current byte, align to next byte boundary
    pub fn align_to_byte(&mut self) {
        let discard = self.bits_available % 8;
        if discard > 0 {
            self.buffer >>= discard;
            self.bits_available -= discard;
        }
    }

    /// Read a complete byte (aligns to byte boundary first)
    pub fn read_byte(&mut self) -> Result<u8> {
        self.align_to_byte();
        self.read_bits(8).map(|v| v as u8)
    }

    /// Read a 16-bit little-endian value (aligns to byte boundary first)
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.align_to_byte();
        Ok(self.read_bits(16)? as u16)
    }

    /// Read a 32-bit little-endian value (aligns to byte boundary first)
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.align_to_byte();
        self.read_bits(32)
    }

    /// Read a 32-bit big-endian value (aligns to byte boundary first)
    pub fn read_u32_be(&mut self) -> Result<u32> {
        Ok(self.read_u32_le()?.swap_bytes())
    }

    /// Copy up to `buf.len()` whole bytes, returning how many were copied
    ///
    /// The reader must be byte-aligned.
    pub fn copy_bytes(&mut self, buf: &mut [u8]) -> usize {
        debug_assert_eq!(self.bits_available % 8, 0);
        let mut n = 0;
        // Drain whole bytes still sitting in the bit buffer first
        while n < buf.len() && self.bits_available >= 8 {
            buf[n] = self.buffer as u8;
            self.buffer >>= 8;
            self.bits_available -= 8;
            n += 1;
        }
        let direct = (buf.len() - n).min(self.input.len() - self.pos);
        buf[n..n + direct].copy_from_slice(&self.input[self.pos..self.pos + direct]);
        self.pos += direct;
        n + direct
    }

    /// Whole bytes available, counting buffered bits
    pub fn available_bytes(&self) -> usize {
        (self.bits_available / 8) as usize + (self.input.len() - self.pos)
    }

    /// Save the current position
    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            buffer: self.buffer,
            bits_available: self.bits_available,
        }
    }

    /// Return to a position saved by [`BitReader::checkpoint`]
    #[inline]
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.buffer = checkpoint.buffer;
        self.bits_available = checkpoint.bits_available;
    }

    /// Align, then hand whole buffered bytes back to the unread input
    pub fn rewind_to_byte(&mut self) {
        self.align_to_byte();
        let whole = (self.bits_available / 8) as usize;
        self.pos -= whole;
        self.buffer = 0;
        self.bits_available = 0;
    }

    /// Input bytes not yet loaded into the bit buffer
    pub fn unread_input(&self) -> &[u8] {
        &self.input[self.pos..]
    }

    /// Drop the last `n` unread bytes (returned to the caller)
    pub fn truncate_unread(&mut self, n: usize) {
        let keep = self.input.len() - n.min(self.input.len() - self.pos);
        self.input.truncate(keep);
    }

    /// Forget all input and bit state
    pub fn clear(&mut self) {
        self.input.clear();
        self.pos = 0;
        self.buffer = 0;
        self.bits_available = 0;
    }
}

/// Byte-level reads for wrapper headers and trailers; aligns first
impl std::io::Read for BitReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.align_to_byte();
        Ok(self.copy_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &[u8]) -> BitReader {
        let mut reader = BitReader::new();
        reader.push_input(data);
        reader
    }

    #[test]
    fn test_read_bits() {
        // Binary: 11010011 10101010 = 0xD3 0xAA
        let mut reader = reader(&[0xD3, 0xAA]);

        // Read LSB first: 0xD3 = 11010011, reading from LSB:
        // bits 0-2: 011 = 3
        assert_eq!(reader.read_bits(3).unwrap(), 0b011);
        // bits 3-7: 11010 = 26
        assert_eq!(reader.read_bits(5).unwrap(), 0b11010);
        // next byte
        assert_eq!(reader.read_bits(8).unwrap(), 0xAA);
    }

    #[test]
    fn test_read_bit() {
        let mut reader = reader(&[0b10110001]);

        // LSB first
        assert!(reader.read_bit().unwrap()); // 1
        assert!(!reader.read_bit().unwrap()); // 0
        assert!(!reader.read_bit().unwrap()); // 0
        assert!(!reader.read_bit().unwrap()); // 0
        assert!(reader.read_bit().unwrap()); // 1
        assert!(reader.read_bit().unwrap()); // 1
        assert!(!reader.read_bit().unwrap()); // 0
        assert!(reader.read_bit().unwrap()); // 1
    }

    #[test]
    fn test_align_to_byte() {
        let mut reader = reader(&[0xFF, 0xAB]);

        reader.read_bits(3).unwrap();
        reader.align_to_byte();
        assert_eq!(reader.read_bits(8).unwrap(), 0xAB);
    }

    #[test]
    fn test_read_u16_le() {
        let mut reader = reader(&[0x34, 0x12]); // Little-endian 0x1234
        assert_eq!(reader.read_u16_le().unwrap(), 0x1234);
    }

    #[test]
    fn test_read_u32_le_and_be() {
        let mut reader = reader(&[0x78, 0x56, 0x34, 0x12, 0x12, 0x34, 0x56, 0x78]);
        assert_eq!(reader.read_u32_le().unwrap(), 0x12345678);
        assert_eq!(reader.read_u32_be().unwrap(), 0x12345678);
    }

    #[test]
    fn test_cross_byte_boundary() {
        let mut reader = reader(&[0xFF, 0x00]);

        // Read 12 bits across byte boundary
        assert_eq!(reader.read_bits(12).unwrap(), 0x0FF);
    }

    #[test]
    fn test_insufficient_input_then_resume() {
        let mut reader = reader(&[0xAB]);
        let checkpoint = reader.checkpoint();
        assert!(matches!(reader.read_bits(12), Err(Error::UnexpectedEof)));

        reader.restore(checkpoint);
        reader.push_input(&[0x0C]);
        assert_eq!(reader.read_bits(12).unwrap(), 0xCAB);
    }

    #[test]
    fn test_copy_bytes_drains_buffer_first() {
        let mut reader = reader(&[1, 2, 3, 4, 5]);
        reader.peek_bits(16).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(reader.copy_bytes(&mut buf), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(reader.available_bytes(), 1);
    }

    #[test]
    fn test_rewind_returns_unread_bytes() {
        let mut reader = reader(&[0x01, 0xAA, 0xBB]);
        reader.read_bits(3).unwrap();
        // Loads all three bytes into the buffer
        reader.peek_bits(16).unwrap();
        reader.rewind_to_byte();
        assert_eq!(reader.unread_input(), &[0xAA, 0xBB]);
        assert_eq!(reader.available_bytes(), 2);
    }

    #[test]
    fn test_push_input_keeps_buffered_bytes() {
        let mut reader = reader(&[0x11, 0x22, 0x33]);
        reader.read_bits(4).unwrap();
        reader.push_input(&[0x44]);
        reader.rewind_to_byte();
        assert_eq!(reader.unread_input(), &[0x22, 0x33, 0x44]);
    }
}
