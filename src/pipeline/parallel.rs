//! Parallel compressor using a producer-consumer pipeline.
//!
//! Architecture:
//! - Main thread: read fixed-size chunks, keep the running checksum, send jobs
//! - Worker pool: compress each chunk as raw DEFLATE, primed with the 32 KiB
//!   before it as a preset dictionary
//! - Main thread: receive compressed chunks in order, frame them with one
//!   header and trailer
//!
//! Every chunk but the last ends with a sync flush, so the pieces concatenate
//! into a single valid stream.

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Read, Write};

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use log::debug;

use super::read_chunk;
use crate::bits::BitWriter;
use crate::checksum::adler32;
use crate::deflate::{Deflater, Flush};
use crate::error::{Error, Result};
use crate::format::{self, Format, WrapperParams};
use crate::{CompressStats, DeflateConfig, StreamCompressor};

/// A chunk to compress
struct CompressJob {
    /// Sequence number for ordering output
    chunk_id: u64,
    /// Uncompressed bytes preceding this chunk
    dictionary: Vec<u8>,
    data: Vec<u8>,
    last: bool,
}

/// Raw DEFLATE for one chunk
struct CompressedChunk {
    /// Sequence number for ordering output
    chunk_id: u64,
    data: Vec<u8>,
}

/// Output bookkeeping on the main thread
struct OrderedWriter<'a, W: Write> {
    writer: &'a mut W,
    /// Chunks that arrived ahead of their turn
    pending: BTreeMap<u64, CompressedChunk>,
    next_write_id: u64,
    output_bytes: u64,
}

impl<W: Write> OrderedWriter<'_, W> {
    fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.output_bytes += data.len() as u64;
        Ok(())
    }

    fn accept(&mut self, chunk: CompressedChunk) -> Result<()> {
        if chunk.chunk_id != self.next_write_id {
            self.pending.insert(chunk.chunk_id, chunk);
            return Ok(());
        }
        self.write_raw(&chunk.data)?;
        self.next_write_id += 1;

        // Write any consecutive buffered chunks
        while let Some(buffered) = self.pending.remove(&self.next_write_id) {
            self.write_raw(&buffered.data)?;
            self.next_write_id += 1;
        }
        Ok(())
    }
}

/// Multi-threaded whole-stream compressor
pub struct ParallelCompressor {
    config: DeflateConfig,
}

impl ParallelCompressor {
    pub fn new(config: DeflateConfig) -> Self {
        Self { config }
    }

    fn effective_threads(&self) -> usize {
        match self.config.num_threads {
            0 => num_cpus::get().clamp(1, 32),
            n => n.clamp(1, 32),
        }
    }
}

impl StreamCompressor for ParallelCompressor {
    fn compress_stream<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<CompressStats> {
        let num_threads = self.effective_threads();

        // For single thread, delegate to single-threaded implementation for efficiency
        if num_threads == 1 {
            let mut single = super::single::SingleThreadedCompressor::new(self.config.clone());
            return single.compress_stream(input, output);
        }

        self.compress_parallel(input, output, num_threads)
    }
}

impl ParallelCompressor {
    fn compress_parallel<R: Read, W: Write>(
        &mut self,
        input: R,
        mut output: W,
        num_threads: usize,
    ) -> Result<CompressStats> {
        self.config.validate()?;
        if self.config.format == Format::Auto {
            return Err(Error::InvalidParameter(
                "auto format is only valid for decompression".into(),
            ));
        }

        // Channel capacity - enough to keep workers busy without excessive memory
        let channel_capacity = num_threads * 2;

        let (job_tx, job_rx): (Sender<CompressJob>, Receiver<CompressJob>) =
            bounded(channel_capacity);
        let (result_tx, result_rx): (
            Sender<Result<CompressedChunk>>,
            Receiver<Result<CompressedChunk>>,
        ) = bounded(channel_capacity);

        let worker_config = DeflateConfig {
            format: Format::Raw,
            gzip_header: None,
            dictionary: None,
            ..self.config.clone()
        };

        // Use crossbeam's scoped threads to avoid 'static lifetime requirements
        let result = crossbeam::scope(|scope| {
            for _ in 0..num_threads {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let config = worker_config.clone();

                scope.spawn(move |_| {
                    worker_thread(job_rx, result_tx, &config);
                });
            }

            // Drop our copies of the channels that workers use
            drop(job_rx);
            drop(result_tx);

            self.read_dispatch_and_write(input, &mut output, job_tx, result_rx)
        });

        result.map_err(|_| Error::Internal("Thread panicked".to_string()))?
    }

    fn read_dispatch_and_write<R: Read, W: Write>(
        &self,
        input: R,
        output: &mut W,
        job_tx: Sender<CompressJob>,
        result_rx: Receiver<Result<CompressedChunk>>,
    ) -> Result<CompressStats> {
        let chunk_size = self.config.parallel_chunk_size;
        let w_size = 1usize << self.config.window_bits;
        let mut reader = BufReader::with_capacity(self.config.chunk_size, input);
        let mut writer = BufWriter::with_capacity(self.config.chunk_size, output);
        let mut out = OrderedWriter {
            writer: &mut writer,
            pending: BTreeMap::new(),
            next_write_id: 0,
            output_bytes: 0,
        };

        let format = self.config.format;
        let mut checksum = format.new_checksum();
        let mut framing = BitWriter::new();
        let dictionary_id = match (format, &self.config.dictionary) {
            (Format::Zlib, Some(dict)) => Some(adler32(dict)),
            _ => None,
        };
        format::write_header(
            &mut framing,
            &WrapperParams {
                format,
                level: self.config.level,
                strategy: self.config.strategy,
                window_bits: self.config.window_bits,
                gzip_header: self.config.gzip_header.as_ref(),
                dictionary_id,
            },
        );
        out.write_raw(framing.as_bytes())?;
        framing.clear();

        let mut dictionary = match &self.config.dictionary {
            Some(dict) => dict[dict.len().saturating_sub(w_size)..].to_vec(),
            None => Vec::new(),
        };
        let mut current = Vec::with_capacity(chunk_size);
        read_chunk(&mut reader, &mut current, chunk_size)?;

        let mut next_chunk_id: u64 = 0;
        let mut input_bytes: u64 = 0;

        loop {
            // Read ahead so the last chunk is known when it is sent
            let mut next = Vec::with_capacity(chunk_size);
            let last = read_chunk(&mut reader, &mut next, chunk_size)? == 0;

            checksum.update(&current);
            input_bytes += current.len() as u64;

            let next_dictionary = if current.len() >= w_size {
                current[current.len() - w_size..].to_vec()
            } else {
                let mut joined = dictionary.clone();
                joined.extend_from_slice(&current);
                joined.split_off(joined.len().saturating_sub(w_size))
            };

            let job = CompressJob {
                chunk_id: next_chunk_id,
                dictionary: std::mem::replace(&mut dictionary, next_dictionary),
                data: std::mem::replace(&mut current, next),
                last,
            };
            next_chunk_id += 1;
            send_job(&job_tx, &result_rx, job, &mut out)?;

            if last {
                break;
            }
        }

        // Drop job_tx to signal workers we're done
        drop(job_tx);

        while out.next_write_id < next_chunk_id {
            match result_rx.recv() {
                Ok(result) => out.accept(result?)?,
                Err(_) => {
                    return Err(Error::Internal("Result channel disconnected".to_string()));
                }
            }
        }

        format::write_trailer(&mut framing, format, checksum.value(), input_bytes);
        out.write_raw(framing.as_bytes())?;
        let output_bytes = out.output_bytes;
        writer.flush()?;

        debug!(
            "parallel compression: {} chunks, {} bytes in, {} bytes out",
            next_chunk_id, input_bytes, output_bytes
        );
        Ok(CompressStats {
            input_bytes,
            output_bytes,
            chunks: next_chunk_id,
            checksum: checksum.value(),
        })
    }
}

/// Queue a job, writing finished chunks while the queue is full
fn send_job<W: Write>(
    job_tx: &Sender<CompressJob>,
    result_rx: &Receiver<Result<CompressedChunk>>,
    mut job: CompressJob,
    out: &mut OrderedWriter<'_, W>,
) -> Result<()> {
    loop {
        match job_tx.try_send(job) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(returned)) => {
                job = returned;
                match result_rx.recv() {
                    Ok(result) => out.accept(result?)?,
                    Err(_) => {
                        return Err(Error::Internal("Result channel disconnected".to_string()));
                    }
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                return Err(Error::Internal("Workers disconnected".to_string()));
            }
        }
    }
}

/// Worker thread function: compresses chunks until the job channel closes
fn worker_thread(
    job_rx: Receiver<CompressJob>,
    result_tx: Sender<Result<CompressedChunk>>,
    config: &DeflateConfig,
) {
    let mut deflater = match Deflater::new(config) {
        Ok(deflater) => deflater,
        Err(e) => {
            let _ = result_tx.send(Err(e));
            return;
        }
    };

    while let Ok(job) = job_rx.recv() {
        let result = compress_chunk(&mut deflater, job);

        if result_tx.send(result).is_err() {
            // Main thread has stopped, exit
            break;
        }
    }
}

/// Compress one chunk as a run of raw DEFLATE blocks
fn compress_chunk(deflater: &mut Deflater, job: CompressJob) -> Result<CompressedChunk> {
    deflater.reset();
    if !job.dictionary.is_empty() {
        deflater.set_dictionary(&job.dictionary)?;
    }
    let flush = if job.last { Flush::Finish } else { Flush::SyncFlush };
    let mut data = Vec::with_capacity(job.data.len() / 2 + 64);
    deflater.compress_to_vec(&job.data, &mut data, flush)?;
    Ok(CompressedChunk { chunk_id: job.chunk_id, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InflateConfig;
    use std::io::{Cursor, Read};

    fn sample(len: usize) -> Vec<u8> {
        (0..len as u32).map(|i| b"ACGT"[((i * 7 + i / 13) % 4) as usize]).collect()
    }

    #[test]
    fn test_parallel_gzip_matches_input() {
        let data = sample(1_000_000);
        let config = DeflateConfig {
            format: Format::Gzip,
            num_threads: 4,
            parallel_chunk_size: 64 * 1024,
            ..Default::default()
        };
        let mut compressor = ParallelCompressor::new(config);

        let mut output = Vec::new();
        let stats = compressor.compress_stream(Cursor::new(&data), &mut output).unwrap();

        assert_eq!(stats.input_bytes, data.len() as u64);
        assert_eq!(stats.output_bytes, output.len() as u64);
        assert_eq!(stats.chunks, 16);
        assert_eq!(stats.checksum, crc32fast::hash(&data));

        // Readable as one ordinary member
        let mut decoded = Vec::new();
        flate2::read::GzDecoder::new(&output[..]).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_chunks_smaller_than_window() {
        let data = b"small chunks still share history. ".repeat(3000);
        let config = DeflateConfig {
            format: Format::Zlib,
            num_threads: 3,
            parallel_chunk_size: 1000,
            ..Default::default()
        };
        let mut output = Vec::new();
        ParallelCompressor::new(config).compress_stream(Cursor::new(&data), &mut output).unwrap();
        assert_eq!(crate::decompress(&output, &InflateConfig::default()).unwrap(), data);
    }

    #[test]
    fn test_parallel_empty_input() {
        let config = DeflateConfig { format: Format::Raw, num_threads: 2, ..Default::default() };
        let mut output = Vec::new();
        let stats =
            ParallelCompressor::new(config).compress_stream(Cursor::new(Vec::new()), &mut output).unwrap();
        assert_eq!(stats.chunks, 1);
        let inflate = InflateConfig { format: Format::Raw, ..Default::default() };
        assert!(crate::decompress(&output, &inflate).unwrap().is_empty());
    }

    #[test]
    fn test_effective_threads() {
        let config = DeflateConfig { num_threads: 0, ..Default::default() };
        let compressor = ParallelCompressor::new(config);
        let threads = compressor.effective_threads();
        assert!(threads >= 1);
        assert!(threads <= 32);

        let config2 = DeflateConfig { num_threads: 100, ..Default::default() };
        let compressor2 = ParallelCompressor::new(config2);
        assert_eq!(compressor2.effective_threads(), 32); // Capped at 32
    }
}
