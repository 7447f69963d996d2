//! Whole-stream compression and decompression between readers and writers

pub mod parallel;
pub mod single;

use std::io::{BufReader, BufWriter, Read, Write};

use log::debug;

use crate::error::Result;
use crate::stream::Decompressor;
use crate::InflateConfig;

pub use parallel::ParallelCompressor;
pub use single::SingleThreadedCompressor;

/// Statistics from [`decompress_stream`]
#[derive(Clone, Debug, Default)]
pub struct DecompressStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Streams decoded (gzip members)
    pub members: u64,
    /// Bytes after the last stream that were ignored
    pub trailing_bytes: u64,
}

/// Append up to `size` bytes from `reader` to `buf`, returning how many
/// were read; fewer than `size` only at end of input
pub(crate) fn read_chunk<R: Read>(reader: &mut R, buf: &mut Vec<u8>, size: usize) -> Result<usize> {
    Ok(reader.by_ref().take(size as u64).read_to_end(buf)?)
}

/// Decompress everything from `input` into `output`
///
/// Fails with `UnexpectedEof` if the input ends before the stream does.
pub fn decompress_stream<R: Read, W: Write>(
    input: R,
    output: W,
    config: &InflateConfig,
) -> Result<DecompressStats> {
    let mut reader = BufReader::with_capacity(config.chunk_size, input);
    let mut writer = BufWriter::with_capacity(config.chunk_size, output);
    let mut decompressor = Decompressor::new(config)?;
    let mut chunk = Vec::with_capacity(config.chunk_size);

    loop {
        chunk.clear();
        if read_chunk(&mut reader, &mut chunk, config.chunk_size)? == 0 {
            break;
        }
        let out = decompressor.push(&chunk)?;
        writer.write_all(&out)?;
    }
    let tail = decompressor.finish()?;
    writer.write_all(&tail)?;
    writer.flush()?;

    let stats = DecompressStats {
        input_bytes: decompressor.total_in(),
        output_bytes: decompressor.total_out(),
        members: decompressor.members(),
        trailing_bytes: decompressor.trailing_bytes(),
    };
    debug!("decompressed {} bytes into {}", stats.input_bytes, stats.output_bytes);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::Error;
    use std::io::Cursor;

    #[test]
    fn test_decompress_stream() {
        let data = b"streaming decompression ".repeat(20_000);
        let compressed = crate::compress(
            &data,
            &crate::DeflateConfig { format: Format::Gzip, ..Default::default() },
        )
        .unwrap();

        let config = InflateConfig { format: Format::Auto, chunk_size: 1000, ..Default::default() };
        let mut output = Vec::new();
        let stats = decompress_stream(Cursor::new(&compressed), &mut output, &config).unwrap();
        assert_eq!(output, data);
        assert_eq!(stats.input_bytes, compressed.len() as u64);
        assert_eq!(stats.output_bytes, data.len() as u64);
        assert_eq!(stats.members, 1);
    }

    #[test]
    fn test_decompress_stream_truncated() {
        let compressed = crate::compress(b"truncated", &crate::DeflateConfig::default()).unwrap();
        let mut output = Vec::new();
        let result = decompress_stream(
            Cursor::new(&compressed[..compressed.len() - 1]),
            &mut output,
            &InflateConfig::default(),
        );
        assert!(matches!(result, Err(Error::UnexpectedEof)));
    }
}
