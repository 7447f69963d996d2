//! Stream checksums: Adler-32 for zlib, CRC-32 for gzip

const ADLER_MOD: u32 = 65521;

/// Largest n such that 255*n*(n+1)/2 + (n+1)*(ADLER_MOD-1) fits in u32
const NMAX: usize = 5552;

/// Running Adler-32 (RFC 1950)
#[derive(Clone, Copy, Debug)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    pub fn update(&mut self, data: &[u8]) {
        for block in data.chunks(NMAX) {
            for &byte in block {
                self.a += byte as u32;
                self.b += self.a;
            }
            self.a %= ADLER_MOD;
            self.b %= ADLER_MOD;
        }
    }

    pub fn finish(&self) -> u32 {
        (self.b << 16) | self.a
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Adler-32 of a whole buffer
pub fn adler32(data: &[u8]) -> u32 {
    let mut adler = Adler32::new();
    adler.update(data);
    adler.finish()
}

/// Checksum carried by a stream's wrapper
#[derive(Clone, Debug)]
pub enum Checksum {
    None,
    Adler32(Adler32),
    Crc32(crc32fast::Hasher),
}

impl Checksum {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Checksum::None => {}
            Checksum::Adler32(adler) => adler.update(data),
            Checksum::Crc32(crc) => crc.update(data),
        }
    }

    /// Current value; 0 for raw streams
    pub fn value(&self) -> u32 {
        match self {
            Checksum::None => 0,
            Checksum::Adler32(adler) => adler.finish(),
            Checksum::Crc32(crc) => crc.clone().finalize(),
        }
    }

    /// Start over with the same algorithm
    pub fn reset(&mut self) {
        *self = match self {
            Checksum::None => Checksum::None,
            Checksum::Adler32(_) => Checksum::Adler32(Adler32::new()),
            Checksum::Crc32(_) => Checksum::Crc32(crc32fast::Hasher::new()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adler32_known_values() {
        assert_eq!(adler32(b""), 1);
        assert_eq!(adler32(b"a"), 0x0062_0062);
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn test_adler32_incremental_matches_oneshot() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i * 7 + 3) as u8).collect();
        let mut adler = Adler32::new();
        for chunk in data.chunks(777) {
            adler.update(chunk);
        }
        assert_eq!(adler.finish(), adler32(&data));
    }

    #[test]
    fn test_adler32_large_run_of_ff() {
        // Exercises the deferred modulo at its limit
        let data = vec![0xFFu8; NMAX * 3 + 1];
        let mut a = 1u64;
        let mut b = 0u64;
        for &byte in &data {
            a = (a + byte as u64) % ADLER_MOD as u64;
            b = (b + a) % ADLER_MOD as u64;
        }
        assert_eq!(adler32(&data), ((b << 16) | a) as u32);
    }

    #[test]
    fn test_checksum_crc32() {
        let mut checksum = Checksum::Crc32(crc32fast::Hasher::new());
        checksum.update(b"123456789");
        assert_eq!(checksum.value(), 0xCBF4_3926);
        checksum.reset();
        assert_eq!(checksum.value(), 0);
    }
}
