use crate::error::{Error, Result};

/// Circular history buffer for resolving back-references
pub struct SlidingWindow {
    buffer: Box<[u8]>,
    mask: usize,
    /// Next write position
    write_pos: usize,
    /// Total bytes ever written
    total_written: u64,
}

impl SlidingWindow {
    /// Window of `1 << window_bits` bytes
    pub fn new(window_bits: u8) -> Self {
        let size = 1usize << window_bits;
        Self {
            buffer: vec![0u8; size].into_boxed_slice(),
            mask: size - 1,
            write_pos: 0,
            total_written: 0,
        }
    }

    /// Add a single byte to the window
    #[inline]
    pub fn push_byte(&mut self, byte: u8) {
        self.buffer[self.write_pos] = byte;
        self.write_pos = (self.write_pos + 1) & self.mask;
        self.total_written += 1;
    }

    /// Add multiple bytes to the window
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        let size = self.buffer.len();
        self.total_written += bytes.len() as u64;
        // Only the tail can survive
        let bytes = &bytes[bytes.len().saturating_sub(size)..];
        let first = bytes.len().min(size - self.write_pos);
        self.buffer[self.write_pos..self.write_pos + first].copy_from_slice(&bytes[..first]);
        let rest = &bytes[first..];
        self.buffer[..rest.len()].copy_from_slice(rest);
        self.write_pos = (self.write_pos + bytes.len()) & self.mask;
    }

    /// Copy `out.len()` bytes starting `distance` back, appending each to
    /// the window as it is produced
    ///
    /// A length greater than the distance repeats the most recent
    /// `distance` bytes.
    pub fn copy_match(&mut self, distance: usize, out: &mut [u8]) -> Result<()> {
        let available = self.available();
        if distance == 0 || distance > available {
            return Err(Error::DistanceTooFarBack { distance, available });
        }
        let mut read_pos = (self.write_pos + self.buffer.len() - distance) & self.mask;
        for byte in out.iter_mut() {
            let b = self.buffer[read_pos];
            *byte = b;
            self.buffer[self.write_pos] = b;
            self.write_pos = (self.write_pos + 1) & self.mask;
            read_pos = (read_pos + 1) & self.mask;
        }
        self.total_written += out.len() as u64;
        Ok(())
    }

    /// Bytes of history a back-reference may reach
    pub fn available(&self) -> usize {
        self.total_written.min(self.buffer.len() as u64) as usize
    }

    /// Reset the window
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.total_written = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(window: &mut SlidingWindow, distance: usize, length: usize) -> Vec<u8> {
        let mut out = vec![0u8; length];
        window.copy_match(distance, &mut out).unwrap();
        out
    }

    #[test]
    fn test_window_basic() {
        let mut window = SlidingWindow::new(15);
        window.push_bytes(b"ABC");

        assert_eq!(copy(&mut window, 3, 3), b"ABC");
        assert_eq!(window.available(), 6);
        assert_eq!(copy(&mut window, 1, 1), b"C");
    }

    #[test]
    fn test_window_rle() {
        let mut window = SlidingWindow::new(15);
        window.push_byte(b'A');
        assert_eq!(copy(&mut window, 1, 5), b"AAAAA");
    }

    #[test]
    fn test_window_rle_pattern() {
        let mut window = SlidingWindow::new(15);
        window.push_bytes(b"AB");
        assert_eq!(copy(&mut window, 2, 6), b"ABABAB");
    }

    #[test]
    fn test_window_wrap() {
        let mut window = SlidingWindow::new(15);
        let data: Vec<u8> = (0..40000u32).map(|i| (i & 0xFF) as u8).collect();
        window.push_bytes(&data[..1000]);
        window.push_bytes(&data[1000..]);

        assert_eq!(window.available(), 32768);
        // Most recent byte is 39999 & 0xFF
        assert_eq!(copy(&mut window, 1, 1), vec![63]);
        assert_eq!(copy(&mut window, 32768, 2), vec![data[40001 - 32768], data[40002 - 32768]]);
    }

    #[test]
    fn test_distance_limits() {
        let mut window = SlidingWindow::new(15);
        window.push_bytes(b"hello");
        assert_eq!(copy(&mut window, 5, 5), b"hello");
        let mut out = [0u8; 1];
        assert!(matches!(
            window.copy_match(11, &mut out),
            Err(Error::DistanceTooFarBack { distance: 11, available: 10 })
        ));
    }

    #[test]
    fn test_small_window() {
        let mut window = SlidingWindow::new(9);
        window.push_bytes(&[7u8; 600]);
        assert_eq!(window.available(), 512);
        let mut out = [0u8; 1];
        assert!(window.copy_match(513, &mut out).is_err());
        assert!(window.copy_match(512, &mut out).is_ok());
    }
}
