use std::io::{BufReader, BufWriter, Read, Write};

use log::debug;

use super::read_chunk;
use crate::deflate::{Deflater, Flush};
use crate::error::Result;
use crate::{CompressStats, DeflateConfig, StreamCompressor};

/// Single-threaded whole-stream compressor
pub struct SingleThreadedCompressor {
    config: DeflateConfig,
}

impl SingleThreadedCompressor {
    pub fn new(config: DeflateConfig) -> Self {
        Self { config }
    }
}

impl StreamCompressor for SingleThreadedCompressor {
    fn compress_stream<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<CompressStats> {
        let mut reader = BufReader::with_capacity(self.config.chunk_size, input);
        let mut writer = BufWriter::with_capacity(self.config.chunk_size, output);

        let mut deflater = Deflater::new(&self.config)?;
        let mut chunk = Vec::with_capacity(self.config.chunk_size);
        let mut out = Vec::with_capacity(self.config.chunk_size);
        let mut stats = CompressStats { chunks: 1, ..Default::default() };

        loop {
            chunk.clear();
            let n = read_chunk(&mut reader, &mut chunk, self.config.chunk_size)?;
            let flush = if n == 0 { Flush::Finish } else { Flush::NoFlush };

            out.clear();
            deflater.compress_to_vec(&chunk, &mut out, flush)?;
            writer.write_all(&out)?;

            if flush == Flush::Finish {
                break;
            }
        }
        writer.flush()?;

        stats.input_bytes = deflater.total_in();
        stats.output_bytes = deflater.total_out();
        stats.checksum = deflater.checksum();
        debug!("compressed {} bytes into {}", stats.input_bytes, stats.output_bytes);
        Ok(stats)
    }
}
