pub mod bits;
pub mod checksum;
pub mod deflate;
pub mod error;
pub mod format;
pub mod gzip;
pub mod huffman;
pub mod inflate;
pub mod pipeline;
pub mod stream;

pub use deflate::{Deflater, Flush, LZ77Token, Strategy};
pub use error::{Error, Result};
pub use format::Format;
pub use gzip::GzipHeader;
pub use inflate::Inflater;
pub use pipeline::{decompress_stream, DecompressStats, ParallelCompressor, SingleThreadedCompressor};
pub use stream::{Compressor, Decompressor, DeflateEncoder, EntrySummary, InflateDecoder};

use std::io::{Read, Write};

/// Compression level (0-9)
///
/// - Level 0: stored blocks only
/// - Levels 1-3: greedy matching
/// - Levels 4-9: lazy matching with progressively longer chain searches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionLevel {
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
    #[default]
    Level6 = 6,
    Level7 = 7,
    Level8 = 8,
    Level9 = 9,
}

impl CompressionLevel {
    /// Create from numeric level, clamped to 0-9
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Level0,
            1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            4 => Self::Level4,
            5 => Self::Level5,
            6 => Self::Level6,
            7 => Self::Level7,
            8 => Self::Level8,
            _ => Self::Level9,
        }
    }

    /// Get numeric level (0-9)
    pub fn level(&self) -> u8 {
        *self as u8
    }
}

/// Configuration for compression
#[derive(Clone, Debug)]
pub struct DeflateConfig {
    pub level: CompressionLevel,
    pub strategy: Strategy,
    pub format: Format,
    /// log2 of the history window (9-15)
    pub window_bits: u8,
    /// Memory for the hash table and token buffer (1-9)
    pub mem_level: u8,
    /// Gzip header fields to write; defaults apply when unset
    pub gzip_header: Option<GzipHeader>,
    /// Preset dictionary (raw and zlib only)
    pub dictionary: Option<Vec<u8>>,
    /// Buffer size for I/O operations
    pub chunk_size: usize,
    /// Number of threads for parallel compression (0 = auto, 1 = single-threaded)
    pub num_threads: usize,
    /// Uncompressed bytes per independently compressed chunk
    pub parallel_chunk_size: usize,
}

impl DeflateConfig {
    /// Reject out-of-range settings
    pub fn validate(&self) -> Result<()> {
        if !(9..=15).contains(&self.window_bits) {
            return Err(Error::InvalidParameter(format!(
                "window_bits must be 9-15, got {}",
                self.window_bits
            )));
        }
        if !(1..=9).contains(&self.mem_level) {
            return Err(Error::InvalidParameter(format!(
                "mem_level must be 1-9, got {}",
                self.mem_level
            )));
        }
        if self.chunk_size == 0 || self.parallel_chunk_size == 0 {
            return Err(Error::InvalidParameter("chunk sizes must be non-zero".into()));
        }
        if self.dictionary.is_some() && self.format == Format::Gzip {
            return Err(Error::InvalidParameter(
                "gzip streams cannot use a preset dictionary".into(),
            ));
        }
        Ok(())
    }
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self {
            level: CompressionLevel::Level6,
            strategy: Strategy::Default,
            format: Format::Zlib,
            window_bits: 15,
            mem_level: 8,
            gzip_header: None,
            dictionary: None,
            chunk_size: 128 * 1024,
            num_threads: 0,
            parallel_chunk_size: 128 * 1024,
        }
    }
}

/// Configuration for decompression
#[derive(Clone, Debug)]
pub struct InflateConfig {
    pub format: Format,
    /// log2 of the largest window accepted (8-15)
    pub window_bits: u8,
    /// Preset dictionary for raw streams, or for zlib streams that ask for one
    pub dictionary: Option<Vec<u8>>,
    /// Keep decoding gzip members that follow the first one
    pub multi_member: bool,
    /// Buffer size for I/O operations
    pub chunk_size: usize,
}

impl InflateConfig {
    /// Reject out-of-range settings
    pub fn validate(&self) -> Result<()> {
        if !(8..=15).contains(&self.window_bits) {
            return Err(Error::InvalidParameter(format!(
                "window_bits must be 8-15, got {}",
                self.window_bits
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::InvalidParameter("chunk_size must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for InflateConfig {
    fn default() -> Self {
        Self {
            format: Format::Zlib,
            window_bits: 15,
            dictionary: None,
            multi_member: true,
            chunk_size: 128 * 1024,
        }
    }
}

/// Why a step call returned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// All input consumed; more is needed to continue
    NeedInput,
    /// The output buffer is full
    NeedOutput,
    /// A requested flush completed
    Progress,
    /// The stream is complete
    Done,
}

/// Outcome of one `compress` or `decompress` call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamResult {
    /// Input bytes taken
    pub consumed: usize,
    /// Output bytes written
    pub produced: usize,
    pub status: Status,
}

/// Statistics from a whole-stream operation
#[derive(Clone, Debug, Default)]
pub struct CompressStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Chunks compressed independently (1 when single-threaded)
    pub chunks: u64,
    /// Wrapper checksum of the uncompressed data (0 for raw streams)
    pub checksum: u32,
}

/// Trait for the complete compression operation
pub trait StreamCompressor {
    /// Compress everything from `input` into `output`
    fn compress_stream<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<CompressStats>;
}

/// Compress a whole buffer
pub fn compress(data: &[u8], config: &DeflateConfig) -> Result<Vec<u8>> {
    let mut deflater = Deflater::new(config)?;
    let mut out = Vec::with_capacity(data.len() / 2 + 64);
    deflater.compress_to_vec(data, &mut out, Flush::Finish)?;
    Ok(out)
}

/// Decompress a whole buffer; a truncated stream is an error
pub fn decompress(data: &[u8], config: &InflateConfig) -> Result<Vec<u8>> {
    let mut decompressor = Decompressor::new(config)?;
    let mut out = decompressor.push(data)?;
    out.extend(decompressor.finish()?);
    Ok(out)
}
