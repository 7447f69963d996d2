//! Chunk-oriented and `std::io::Write` front ends over the step functions

use std::io::{self, Write};

use log::{debug, warn};

use crate::deflate::{Deflater, Flush};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::gzip::{GzipHeader, GZIP_MAGIC};
use crate::inflate::Inflater;
use crate::{DeflateConfig, InflateConfig, Status};

/// Output growth step when draining a step function
const OUT_CHUNK: usize = 32 * 1024;

/// What an archive writer needs to describe a compressed entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntrySummary {
    /// CRC-32 of the uncompressed data
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

/// Push-style compressor returning the bytes each call produced
pub struct Compressor {
    deflater: Deflater,
    crc: crc32fast::Hasher,
}

impl Compressor {
    pub fn new(config: &DeflateConfig) -> Result<Self> {
        Ok(Self { deflater: Deflater::new(config)?, crc: crc32fast::Hasher::new() })
    }

    fn run(&mut self, chunk: &[u8], flush: Flush) -> Result<Vec<u8>> {
        self.crc.update(chunk);
        let mut out = Vec::new();
        self.deflater.compress_to_vec(chunk, &mut out, flush)?;
        Ok(out)
    }

    /// Compress a chunk; output may lag behind the input
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        self.run(chunk, Flush::NoFlush)
    }

    /// Emit everything pushed so far, ending on a byte boundary
    pub fn flush(&mut self) -> Result<Vec<u8>> {
        self.run(&[], Flush::SyncFlush)
    }

    /// Like [`Compressor::flush`], and later data will not refer back past
    /// this point
    pub fn full_flush(&mut self) -> Result<Vec<u8>> {
        self.run(&[], Flush::FullFlush)
    }

    /// Emit the final block and the trailer
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        self.run(&[], Flush::Finish)
    }

    pub fn is_finished(&self) -> bool {
        self.deflater.is_finished()
    }

    /// Sizes and CRC-32 so far; final once [`Compressor::finish`] returned
    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            crc32: self.crc.clone().finalize(),
            compressed_size: self.deflater.total_out(),
            uncompressed_size: self.deflater.total_in(),
        }
    }
}

/// Push-style decompressor
///
/// With `multi_member` set, gzip members that follow one another are
/// decoded as one stream. Anything after the last stream that does not
/// start a new member is ignored with a warning.
pub struct Decompressor {
    inflater: Inflater,
    multi_member: bool,
    /// Bytes after the end of the stream that were dropped
    trailing: u64,
    /// A lone 0x1f after a gzip member, waiting for the next byte
    held_id1: bool,
    members: u64,
    /// Input totals of completed members
    finished_in: u64,
    finished_out: u64,
}

impl Decompressor {
    pub fn new(config: &InflateConfig) -> Result<Self> {
        Ok(Self {
            inflater: Inflater::new(config)?,
            multi_member: config.multi_member,
            trailing: 0,
            held_id1: false,
            members: 0,
            finished_in: 0,
            finished_out: 0,
        })
    }

    /// Decompress a chunk, returning all output it completes
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.feed(chunk, &mut out)?;
        Ok(out)
    }

    fn feed(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> Result<()> {
        let mut carry: Vec<u8>;
        let mut input = chunk;

        loop {
            if self.trailing > 0 {
                self.trailing += input.len() as u64;
                return Ok(());
            }
            if self.inflater.is_finished() {
                if input.is_empty() {
                    return Ok(());
                }
                match self.next_member(input) {
                    Some(member) => {
                        carry = member;
                        input = &carry;
                    }
                    None => return Ok(()),
                }
            }

            let start = out.len();
            out.resize(start + OUT_CHUNK, 0);
            let result = self.inflater.decompress(input, &mut out[start..]);
            let produced = result.as_ref().map_or(0, |r| r.produced);
            out.truncate(start + produced);
            let result = result?;
            input = &input[result.consumed..];

            match result.status {
                Status::NeedOutput => {}
                Status::Done => {
                    self.members += 1;
                    self.finished_in += self.inflater.total_in();
                    self.finished_out += self.inflater.total_out();
                    carry = self.inflater.unused_input().iter().chain(input).copied().collect();
                    input = &carry;
                }
                Status::NeedInput | Status::Progress => return Ok(()),
            }
        }
    }

    /// Sort out the data after a finished stream
    ///
    /// Returns the bytes to decode when they start another gzip member. A
    /// lone ID1 byte is held back until the byte after it arrives; anything
    /// else is trailing data.
    fn next_member(&mut self, input: &[u8]) -> Option<Vec<u8>> {
        let mut data = Vec::with_capacity(input.len() + 1);
        if self.held_id1 {
            data.push(GZIP_MAGIC[0]);
            self.held_id1 = false;
        }
        data.extend_from_slice(input);

        let may_continue = self.multi_member && self.inflater.format() == Format::Gzip;
        if may_continue && data == GZIP_MAGIC[..1] {
            self.held_id1 = true;
            return None;
        }
        if may_continue && data.starts_with(&GZIP_MAGIC) {
            debug!("starting gzip member {}", self.members + 1);
            self.inflater.reset();
            return Some(data);
        }
        self.ignore_trailing(data.len() as u64);
        None
    }

    fn ignore_trailing(&mut self, len: u64) {
        if self.trailing == 0 {
            warn!("ignoring trailing data after the compressed stream");
        }
        self.trailing += len;
    }

    /// Check that the stream ended; a truncated stream is an error
    ///
    /// After the first gzip member, a held ID1 byte or a member cut off
    /// inside its header counts as trailing data.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        if self.held_id1 {
            self.held_id1 = false;
            self.ignore_trailing(1);
        }
        if self.trailing == 0 && !self.inflater.is_finished() {
            if self.members > 0 && self.inflater.is_reading_header() {
                self.ignore_trailing(self.inflater.total_in());
            } else {
                return Err(Error::UnexpectedEof);
            }
        }
        Ok(Vec::new())
    }

    /// Supply the preset dictionary a zlib stream asked for
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        self.inflater.set_dictionary(dictionary)
    }

    pub fn is_finished(&self) -> bool {
        self.inflater.is_finished()
    }

    /// Completed streams (gzip members)
    pub fn members(&self) -> u64 {
        self.members
    }

    /// Header of the most recent gzip member
    pub fn gzip_header(&self) -> Option<&GzipHeader> {
        self.inflater.gzip_header()
    }

    /// Ignored bytes after the end of the stream
    pub fn trailing_bytes(&self) -> u64 {
        self.trailing
    }

    pub fn total_in(&self) -> u64 {
        if self.inflater.is_finished() || self.trailing > 0 {
            self.finished_in
        } else {
            self.finished_in + self.inflater.total_in()
        }
    }

    pub fn total_out(&self) -> u64 {
        if self.inflater.is_finished() || self.trailing > 0 {
            self.finished_out
        } else {
            self.finished_out + self.inflater.total_out()
        }
    }
}

/// Compressing [`Write`] adapter
///
/// Data written is compressed into the inner writer. Call
/// [`DeflateEncoder::finish`] to write the trailer and get the writer back;
/// dropping the encoder finishes the stream and ignores errors.
pub struct DeflateEncoder<W: Write> {
    inner: Option<W>,
    compressor: Compressor,
}

impl<W: Write> DeflateEncoder<W> {
    pub fn new(inner: W, config: &DeflateConfig) -> Result<Self> {
        Ok(Self { inner: Some(inner), compressor: Compressor::new(config)? })
    }

    fn write_out(&mut self, data: &[u8]) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.write_all(data),
            None => Err(io::Error::new(io::ErrorKind::Other, Error::SessionFinished)),
        }
    }

    /// Finish the stream and return the inner writer
    pub fn finish(mut self) -> Result<W> {
        let tail = self.compressor.finish()?;
        self.write_out(&tail)?;
        let mut inner = self.inner.take().ok_or(Error::SessionFinished)?;
        inner.flush()?;
        Ok(inner)
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }

    pub fn summary(&self) -> EntrySummary {
        self.compressor.summary()
    }
}

impl<W: Write> Write for DeflateEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let out = self.compressor.push(buf)?;
        self.write_out(&out)?;
        Ok(buf.len())
    }

    /// Sync-flushes the compressor so the inner writer holds a decodable prefix
    fn flush(&mut self) -> io::Result<()> {
        let out = self.compressor.flush()?;
        self.write_out(&out)?;
        match self.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for DeflateEncoder<W> {
    fn drop(&mut self) {
        if self.inner.is_some() && !self.compressor.is_finished() {
            if let Ok(tail) = self.compressor.finish() {
                let _ = self.write_out(&tail);
            }
        }
    }
}

/// Decompressing [`Write`] adapter: compressed bytes in, plain bytes to the
/// inner writer
pub struct InflateDecoder<W: Write> {
    inner: W,
    decompressor: Decompressor,
}

impl<W: Write> InflateDecoder<W> {
    pub fn new(inner: W, config: &InflateConfig) -> Result<Self> {
        Ok(Self { inner, decompressor: Decompressor::new(config)? })
    }

    /// Check the stream is complete and return the inner writer
    pub fn finish(mut self) -> Result<W> {
        let tail = self.decompressor.finish()?;
        self.inner.write_all(&tail)?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn total_out(&self) -> u64 {
        self.decompressor.total_out()
    }
}

impl<W: Write> Write for InflateDecoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let out = self.decompressor.push(buf)?;
        self.inner.write_all(&out)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
