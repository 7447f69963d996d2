use log::debug;

use super::config::{LevelParams, Strategy};
use super::matcher::MatchWindow;
use super::tables::MIN_MATCH;
use super::tokens::TokenBuffer;
use crate::bits::BitWriter;
use crate::checksum::{adler32, Checksum};
use crate::error::{Error, Result};
use crate::format::{self, Format, WrapperParams};
use crate::gzip::GzipHeader;
use crate::huffman::encoder::{self, BlockOptions};
use crate::{CompressionLevel, DeflateConfig, Status, StreamResult};

/// Growth step for [`Deflater::compress_to_vec`]
const VEC_CHUNK: usize = 32 * 1024;

/// How much of the buffered data a [`Deflater::compress`] call must emit
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Flush {
    /// Emit whatever is convenient; keep buffering
    NoFlush,
    /// Emit everything so far and byte-align with an empty stored block
    SyncFlush,
    /// Sync flush, then drop history so decoding can restart here
    FullFlush,
    /// Emit the final block and the trailer
    Finish,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeflateState {
    /// Header not yet written
    Init,
    Busy,
    /// Final block emitted; trailer may still be pending
    Finishing,
    /// Everything handed to the caller
    Done,
}

/// Outcome of one run of a block loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum BlockState {
    /// Out of input or out of output
    NeedMore,
    /// Flush requested and the block was emitted
    BlockDone,
    /// Final block emitted but output is full
    FinishStarted,
    /// Final block emitted and handed over
    FinishDone,
}

/// Caller input being consumed
pub(super) struct Input<'a> {
    pub data: &'a [u8],
    pub pos: usize,
}

/// Caller output being filled
pub(super) struct Output<'a> {
    pub buf: &'a mut [u8],
    pub len: usize,
}

impl Output<'_> {
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }
}

/// Streaming DEFLATE compressor
///
/// Push input with [`Deflater::compress`]; compressed bytes are copied into
/// the caller's buffer. Output that does not fit stays pending inside the
/// compressor, and no further input is taken until it has been drained.
pub struct Deflater {
    pub(super) lz: MatchWindow,
    pub(super) tokens: TokenBuffer,
    pub(super) pending: BitWriter,
    pub(super) level: CompressionLevel,
    pub(super) strategy: Strategy,
    pub(super) params: LevelParams,
    /// Largest stored block the level-0 loop emits
    pub(super) max_block_size: usize,
    pub(super) checksum: Checksum,
    pub(super) total_in: u64,
    format: Format,
    window_bits: u8,
    gzip_header: Option<GzipHeader>,
    dictionary_id: Option<u32>,
    state: DeflateState,
    trailer_written: bool,
    /// Flush mode of the previous call; `None` after a call that ran out of output
    last_flush: Option<Flush>,
    total_out: u64,
}

impl Deflater {
    pub fn new(config: &DeflateConfig) -> Result<Self> {
        config.validate()?;
        if config.format == Format::Auto {
            return Err(Error::InvalidParameter(
                "auto format is only valid for decompression".into(),
            ));
        }

        let params = config.level.params();
        let lit_bufsize = 1usize << (config.mem_level + 6);
        let mut deflater = Self {
            lz: MatchWindow::new(config.window_bits, config.mem_level, params),
            tokens: TokenBuffer::new(lit_bufsize),
            pending: BitWriter::with_capacity(lit_bufsize * 4),
            level: config.level,
            strategy: config.strategy,
            params,
            max_block_size: 0xFFFF.min(lit_bufsize * 4 - 5),
            checksum: config.format.new_checksum(),
            total_in: 0,
            format: config.format,
            window_bits: config.window_bits,
            gzip_header: config.gzip_header.clone(),
            dictionary_id: None,
            state: DeflateState::Init,
            trailer_written: false,
            last_flush: Some(Flush::NoFlush),
            total_out: 0,
        };
        if let Some(dict) = &config.dictionary {
            deflater.set_dictionary(dict)?;
        }
        debug!(
            "deflate session: format={:?} level={} strategy={:?} window_bits={} mem_level={}",
            config.format,
            config.level.level(),
            config.strategy,
            config.window_bits,
            config.mem_level
        );
        Ok(deflater)
    }

    /// Preload history that matches may refer to
    ///
    /// Raw streams accept a dictionary whenever no input is buffered; zlib
    /// streams only before any output, and the header then carries the
    /// dictionary's Adler-32. Gzip has no way to signal a dictionary.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        match self.format {
            Format::Gzip | Format::Auto => {
                return Err(Error::InvalidParameter(
                    "gzip streams cannot use a preset dictionary".into(),
                ))
            }
            Format::Zlib if self.state != DeflateState::Init => {
                return Err(Error::InvalidParameter(
                    "dictionary must be set before compressing".into(),
                ))
            }
            _ => {}
        }
        if self.lz.lookahead != 0
            || matches!(self.state, DeflateState::Finishing | DeflateState::Done)
        {
            return Err(Error::InvalidParameter("dictionary cannot be set mid-stream".into()));
        }

        if self.format == Format::Zlib {
            self.dictionary_id = Some(adler32(dictionary));
        }

        let w_size = self.lz.w_size();
        let mut dict = dictionary;
        if dict.len() >= w_size {
            if self.format == Format::Raw {
                self.lz.reset();
            }
            dict = &dict[dict.len() - w_size..];
        }

        // Feed the dictionary through the window without checksumming it
        let mut pos = 0;
        self.lz.fill_window(dict, &mut pos);
        while self.lz.lookahead >= MIN_MATCH {
            let mut s = self.lz.strstart;
            for _ in 0..self.lz.lookahead - (MIN_MATCH - 1) {
                self.lz.insert_string(s);
                s += 1;
            }
            self.lz.strstart = s;
            self.lz.lookahead = MIN_MATCH - 1;
            self.lz.fill_window(dict, &mut pos);
        }
        self.lz.strstart += self.lz.lookahead;
        self.lz.block_start = self.lz.strstart as isize;
        self.lz.insert = self.lz.lookahead;
        self.lz.lookahead = 0;
        self.lz.match_length = MIN_MATCH - 1;
        self.lz.prev_length = MIN_MATCH - 1;
        self.lz.match_available = false;
        Ok(())
    }

    /// Compress `input` into `output`
    ///
    /// Returns how much of each buffer was used and why the call stopped:
    /// - `NeedInput`: all input consumed and nothing left to flush
    /// - `NeedOutput`: the output buffer is full; call again with more room
    /// - `Progress`: the requested flush completed
    /// - `Done`: the stream is complete
    pub fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: Flush,
    ) -> Result<StreamResult> {
        match self.state {
            DeflateState::Done => return Err(Error::SessionFinished),
            DeflateState::Finishing if !input.is_empty() => return Err(Error::InputAfterFinish),
            _ => {}
        }

        let mut input = Input { data: input, pos: 0 };
        let mut out = Output { buf: output, len: 0 };
        let status = self.step(&mut input, &mut out, flush);

        Ok(StreamResult { consumed: input.pos, produced: out.len, status })
    }

    /// Compress `input`, appending to `out` until the flush completes
    pub fn compress_to_vec(
        &mut self,
        mut input: &[u8],
        out: &mut Vec<u8>,
        flush: Flush,
    ) -> Result<Status> {
        loop {
            let start = out.len();
            out.resize(start + VEC_CHUNK, 0);
            let result = self.compress(input, &mut out[start..], flush);
            let produced = result.as_ref().map_or(0, |r| r.produced);
            out.truncate(start + produced);
            let result = result?;

            input = &input[result.consumed..];
            match result.status {
                Status::NeedOutput => continue,
                Status::Done => return Ok(Status::Done),
                status if input.is_empty() => return Ok(status),
                _ => continue,
            }
        }
    }

    fn step(&mut self, input: &mut Input<'_>, out: &mut Output<'_>, flush: Flush) -> Status {
        let old_flush = self.last_flush;
        self.last_flush = Some(flush);

        if self.state == DeflateState::Init {
            self.write_header();
            self.state = DeflateState::Busy;
        }
        // A finish request sticks once the final block is out
        let flush = if self.state == DeflateState::Finishing { Flush::Finish } else { flush };

        if self.pending.pending_len() > 0 {
            self.flush_pending(out);
            if self.pending.pending_len() > 0 {
                self.last_flush = None;
                return Status::NeedOutput;
            }
        } else if input.data.is_empty()
            && flush != Flush::Finish
            && old_flush.map_or(false, |old| flush <= old)
        {
            // Nothing new since an equal or stronger flush
            return Self::idle_status(flush);
        }

        if input.pos < input.data.len()
            || self.lz.lookahead != 0
            || (flush != Flush::NoFlush && self.state != DeflateState::Finishing)
        {
            let bstate = self.run_block_loop(input, out, flush);

            if matches!(bstate, BlockState::FinishStarted | BlockState::FinishDone) {
                self.state = DeflateState::Finishing;
            }
            match bstate {
                BlockState::NeedMore | BlockState::FinishStarted => {
                    if out.is_full() {
                        self.last_flush = None;
                        return Status::NeedOutput;
                    }
                    return Status::NeedInput;
                }
                BlockState::BlockDone => {
                    self.finish_flush(flush);
                    self.flush_pending(out);
                    if self.pending.pending_len() > 0 {
                        self.last_flush = None;
                        return Status::NeedOutput;
                    }
                }
                BlockState::FinishDone => {}
            }
        }

        if flush != Flush::Finish {
            return Self::idle_status(flush);
        }

        if !self.trailer_written {
            self.write_trailer();
            self.trailer_written = true;
        }
        self.flush_pending(out);
        if self.pending.pending_len() > 0 {
            return Status::NeedOutput;
        }
        self.state = DeflateState::Done;
        debug!("deflate finished: {} bytes in, {} bytes out", self.total_in, self.total_out);
        Status::Done
    }

    fn idle_status(flush: Flush) -> Status {
        if flush == Flush::NoFlush {
            Status::NeedInput
        } else {
            Status::Progress
        }
    }

    /// Byte-align after a sync or full flush
    fn finish_flush(&mut self, flush: Flush) {
        if !matches!(flush, Flush::SyncFlush | Flush::FullFlush) {
            return;
        }
        encoder::write_stored_block(&mut self.pending, &[], false);
        if flush == Flush::FullFlush {
            self.lz.clear_hash();
            if self.lz.lookahead == 0 {
                self.lz.strstart = 0;
                self.lz.block_start = 0;
                self.lz.insert = 0;
            }
        }
    }

    fn write_header(&mut self) {
        let params = WrapperParams {
            format: self.format,
            level: self.level,
            strategy: self.strategy,
            window_bits: self.window_bits,
            gzip_header: self.gzip_header.as_ref(),
            dictionary_id: self.dictionary_id,
        };
        format::write_header(&mut self.pending, &params);
    }

    fn write_trailer(&mut self) {
        format::write_trailer(&mut self.pending, self.format, self.checksum.value(), self.total_in);
    }

    /// Move pending bytes into the caller's buffer
    pub(super) fn flush_pending(&mut self, out: &mut Output<'_>) {
        let n = self.pending.drain_into(&mut out.buf[out.len..]);
        out.len += n;
        self.total_out += n as u64;
    }

    /// Encode the buffered tokens as one block and hand out what fits
    pub(super) fn flush_block_only(&mut self, last: bool, out: &mut Output<'_>) {
        let options = BlockOptions {
            stored_only: self.level == CompressionLevel::Level0,
            fixed_only: self.strategy == Strategy::Fixed,
        };
        let stored = usize::try_from(self.lz.block_start)
            .ok()
            .map(|start| &self.lz.window[start..self.lz.strstart]);
        encoder::flush_block(&mut self.pending, &self.tokens, stored, last, options);
        self.tokens.clear();
        self.lz.block_start = self.lz.strstart as isize;
        self.flush_pending(out);
    }

    /// Start over as a fresh stream with the same settings
    pub fn reset(&mut self) {
        self.lz.reset();
        self.lz.set_params(self.params);
        self.tokens.clear();
        self.pending.clear();
        self.checksum.reset();
        self.dictionary_id = None;
        self.state = DeflateState::Init;
        self.trailer_written = false;
        self.last_flush = Some(Flush::NoFlush);
        self.total_in = 0;
        self.total_out = 0;
    }

    /// Uncompressed bytes consumed so far
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Compressed bytes handed to the caller so far
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Running checksum of the consumed input (CRC-32 for gzip, Adler-32 for
    /// zlib, 0 for raw)
    pub fn checksum(&self) -> u32 {
        self.checksum.value()
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_finished(&self) -> bool {
        self.state == DeflateState::Done
    }
}
