/// Bit-level writer for DEFLATE output
///
/// Writes bits LSB-first to match DEFLATE format. Completed bytes collect in
/// a pending buffer until [`BitWriter::drain_into`] hands them to the caller.
pub struct BitWriter {
    /// Accumulated output bytes
    output: Vec<u8>,
    /// Bytes of `output` already handed out
    drained: usize,
    /// Bits not yet forming a whole byte (LSB first)
    bit_buffer: u64,
    /// Valid bits in `bit_buffer` (0-63)
    bits_in_buffer: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(65536)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { output: Vec::with_capacity(capacity), drained: 0, bit_buffer: 0, bits_in_buffer: 0 }
    }

    /// Write `n` bits (1-32) from value in LSB-first order
    #[inline]
    pub fn write_bits(&mut self, value: u32, n: u8) {
        debug_assert!(n <= 32);

        if n == 0 {
            return;
        }

        let mask = (1u64 << n) - 1;
        self.bit_buffer |= (value as u64 & mask) << self.bits_in_buffer;
        self.bits_in_buffer += n;

        while self.bits_in_buffer >= 8 {
            self.output.push(self.bit_buffer as u8);
            self.bit_buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
    }

    /// Write bits in reversed order (for Huffman codes stored MSB-first)
    /// The code is `length` bits, with MSB first
    pub fn write_bits_reversed(&mut self, code: u32, length: u8) {
        let reversed = reverse_bits(code, length);
        self.write_bits(reversed, length);
    }

    /// Pad to byte boundary with zero bits
    pub fn align_to_byte(&mut self) {
        if self.bits_in_buffer > 0 {
            self.output.push(self.bit_buffer as u8);
            self.bit_buffer = 0;
            self.bits_in_buffer = 0;
        }
    }

    /// Write a raw byte
    pub fn write_byte(&mut self, byte: u8) {
        if self.bits_in_buffer == 0 {
            self.output.push(byte);
        } else {
            // Not aligned, write through bits
            self.write_bits(byte as u32, 8);
        }
    }

    /// Write a 16-bit value in little-endian
    pub fn write_u16_le(&mut self, value: u16) {
        self.write_byte(value as u8);
        self.write_byte((value >> 8) as u8);
    }

    /// Write a 32-bit value in little-endian
    pub fn write_u32_le(&mut self, value: u32) {
        for b in value.to_le_bytes() {
            self.write_byte(b);
        }
    }

    /// Write a 32-bit value in big-endian (zlib trailer)
    pub fn write_u32_be(&mut self, value: u32) {
        for b in value.to_be_bytes() {
            self.write_byte(b);
        }
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bits_in_buffer == 0 {
            self.output.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_byte(b);
            }
        }
    }

    /// Copy completed bytes into `out`, returning how many were copied
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let pending = &self.output[self.drained..];
        let n = pending.len().min(out.len());
        out[..n].copy_from_slice(&pending[..n]);
        self.drained += n;
        if self.drained == self.output.len() {
            self.output.clear();
            self.drained = 0;
        }
        n
    }

    /// Completed bytes not yet drained
    pub fn pending_len(&self) -> usize {
        self.output.len() - self.drained
    }

    /// Finish and return the output bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.output.split_off(self.drained)
    }

    /// Get current output length in bytes (including partial byte)
    pub fn len(&self) -> usize {
        self.pending_len() + if self.bits_in_buffer > 0 { 1 } else { 0 }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.pending_len() == 0 && self.bits_in_buffer == 0
    }

    /// Peek at undrained output without consuming
    pub fn as_bytes(&self) -> &[u8] {
        &self.output[self.drained..]
    }

    /// Clear the writer for reuse
    pub fn clear(&mut self) {
        self.output.clear();
        self.drained = 0;
        self.bit_buffer = 0;
        self.bits_in_buffer = 0;
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse the bottom `n` bits of `value`
pub fn reverse_bits(value: u32, n: u8) -> u32 {
    if n == 0 {
        return 0;
    }
    value.reverse_bits() >> (32 - n as u32)
}
