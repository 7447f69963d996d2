use log::{debug, trace, warn};

use super::window::SlidingWindow;
use crate::bits::BitReader;
use crate::checksum::{adler32, Checksum};
use crate::deflate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_TABLE, D_CODES, END_BLOCK, LENGTH_TABLE, L_CODES,
};
use crate::error::{Error, Result};
use crate::format::{Format, ZlibHeader};
use crate::gzip::{GzipHeader, GzipTrailer};
use crate::huffman::HuffmanDecoder;
use crate::{InflateConfig, Status, StreamResult};

/// Where the decoder is within the stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InflateState {
    /// Wrapper header
    Header,
    /// Zlib header asked for a preset dictionary with this Adler-32
    Dictionary(u32),
    BlockHeader,
    /// LEN/NLEN of a stored block
    StoredHeader,
    Stored { remaining: usize },
    /// Code length tables of a dynamic block
    DynamicHeader,
    Codes,
    /// Back-reference partially copied when the output filled up
    Match { remaining: usize, distance: usize },
    Trailer,
    Done,
    Failed,
}

/// Decoders for the current compressed block
enum BlockTables {
    Fixed,
    Dynamic(Box<DynamicTables>),
}

struct DynamicTables {
    literal: HuffmanDecoder,
    distance: HuffmanDecoder,
}

/// One decoded literal/length symbol with its operands
enum Symbol {
    Literal(u8),
    Copy { length: usize, distance: usize },
    EndOfBlock,
}

/// What the state machine does after a step
enum Step {
    Continue,
    Yield(Status),
}

/// Caller output being filled
struct OutBuf<'a> {
    buf: &'a mut [u8],
    len: usize,
    /// Bytes already added to the checksum
    checked: usize,
}

impl OutBuf<'_> {
    #[inline]
    fn space(&self) -> usize {
        self.buf.len() - self.len
    }
}

/// Streaming DEFLATE decompressor
///
/// Input may be split anywhere; a unit that is cut off (a header, a table
/// description, a symbol and its extra bits) is retried from its start once
/// more input arrives. Copies interrupted by a full output buffer resume on
/// the next call.
pub struct Inflater {
    bits: BitReader,
    window: SlidingWindow,
    state: InflateState,
    configured_format: Format,
    /// Resolved wrapper; `Auto` turns into zlib or gzip at the header
    format: Format,
    window_bits: u8,
    dictionary: Option<Vec<u8>>,
    last_block: bool,
    tables: BlockTables,
    checksum: Checksum,
    gzip_header: Option<GzipHeader>,
    total_in: u64,
    total_out: u64,
}

impl Inflater {
    pub fn new(config: &InflateConfig) -> Result<Self> {
        config.validate()?;
        let mut inflater = Self {
            bits: BitReader::new(),
            window: SlidingWindow::new(config.window_bits),
            state: InflateState::Header,
            configured_format: config.format,
            format: config.format,
            window_bits: config.window_bits,
            dictionary: config.dictionary.clone(),
            last_block: false,
            tables: BlockTables::Fixed,
            checksum: config.format.new_checksum(),
            gzip_header: None,
            total_in: 0,
            total_out: 0,
        };
        inflater.preload_raw_dictionary();
        Ok(inflater)
    }

    fn preload_raw_dictionary(&mut self) {
        if self.format == Format::Raw {
            if let Some(dict) = &self.dictionary {
                self.window.push_bytes(dict);
            }
        }
    }

    /// Supply a preset dictionary
    ///
    /// For zlib streams this answers [`Error::DictionaryRequired`]; the
    /// dictionary's Adler-32 must match the id in the header. Raw streams
    /// accept one before the first block.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        match self.state {
            InflateState::Dictionary(expected) => {
                let found = adler32(dictionary);
                if found != expected {
                    return Err(Error::DictionaryMismatch { expected, found });
                }
                self.window.push_bytes(dictionary);
                self.state = InflateState::BlockHeader;
                Ok(())
            }
            InflateState::Header | InflateState::BlockHeader
                if self.format == Format::Raw && self.total_out == 0 =>
            {
                self.window.push_bytes(dictionary);
                Ok(())
            }
            _ => Err(Error::InvalidParameter(
                "no dictionary expected at this point of the stream".into(),
            )),
        }
    }

    /// Decompress `input` into `output`
    ///
    /// All input is taken unless the stream ends inside it; bytes after the
    /// end are left unconsumed. The returned status says why the call
    /// stopped: `NeedInput`, `NeedOutput` or `Done`.
    pub fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<StreamResult> {
        match self.state {
            InflateState::Done | InflateState::Failed => return Err(Error::SessionFinished),
            InflateState::Dictionary(id) => return Err(Error::DictionaryRequired(id)),
            _ => {}
        }

        self.bits.push_input(input);
        let mut out = OutBuf { buf: output, len: 0, checked: 0 };
        let result = self.run(&mut out);
        self.sync_checksum(&mut out);
        let produced = out.len;

        match result {
            Ok(status) => {
                let mut consumed = input.len();
                if status == Status::Done {
                    // Hand back whatever follows the stream
                    let trailing = self.bits.unread_input().len();
                    let from_this_call = trailing.min(input.len());
                    self.bits.truncate_unread(from_this_call);
                    consumed -= from_this_call;
                    self.total_in -= (trailing - from_this_call) as u64;
                }
                self.total_in += consumed as u64;
                Ok(StreamResult { consumed, produced, status })
            }
            Err(Error::DictionaryRequired(id)) => {
                self.total_in += input.len() as u64;
                Err(Error::DictionaryRequired(id))
            }
            Err(e) => {
                warn!("inflate failed after {} bytes of output: {}", self.total_out, e);
                self.state = InflateState::Failed;
                Err(e)
            }
        }
    }

    fn run(&mut self, out: &mut OutBuf<'_>) -> Result<Status> {
        loop {
            let checkpoint = self.bits.checkpoint();
            match self.step(out) {
                Ok(Step::Continue) => {}
                Ok(Step::Yield(status)) => return Ok(status),
                Err(Error::UnexpectedEof) => {
                    self.bits.restore(checkpoint);
                    return Ok(Status::NeedInput);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Advance by one unit; `UnexpectedEof` means the unit was incomplete
    fn step(&mut self, out: &mut OutBuf<'_>) -> Result<Step> {
        match self.state {
            InflateState::Header => self.read_header()?,
            InflateState::Dictionary(id) => return Err(Error::DictionaryRequired(id)),
            InflateState::BlockHeader => self.read_block_header()?,
            InflateState::StoredHeader => {
                let len = self.bits.read_u16_le()?;
                let nlen = self.bits.read_u16_le()?;
                if len != !nlen {
                    return Err(Error::StoredBlockLengthMismatch { len, nlen });
                }
                trace!("stored block: {} bytes", len);
                self.state = InflateState::Stored { remaining: len as usize };
            }
            InflateState::Stored { remaining } => {
                if remaining == 0 {
                    self.end_of_block();
                    return Ok(Step::Continue);
                }
                if out.space() == 0 {
                    return Ok(Step::Yield(Status::NeedOutput));
                }
                let n = remaining.min(out.space()).min(self.bits.available_bytes());
                if n == 0 {
                    return Err(Error::UnexpectedEof);
                }
                let dst = &mut out.buf[out.len..out.len + n];
                self.bits.copy_bytes(dst);
                self.window.push_bytes(dst);
                out.len += n;
                self.state = InflateState::Stored { remaining: remaining - n };
            }
            InflateState::DynamicHeader => self.read_dynamic_tables()?,
            InflateState::Codes => {
                if out.space() == 0 {
                    return Ok(Step::Yield(Status::NeedOutput));
                }
                match self.decode_symbol()? {
                    Symbol::Literal(byte) => {
                        out.buf[out.len] = byte;
                        out.len += 1;
                        self.window.push_byte(byte);
                    }
                    Symbol::Copy { length, distance } => {
                        let available = self.window.available();
                        if distance > available {
                            return Err(Error::DistanceTooFarBack { distance, available });
                        }
                        self.state = InflateState::Match { remaining: length, distance };
                    }
                    Symbol::EndOfBlock => self.end_of_block(),
                }
            }
            InflateState::Match { remaining, distance } => {
                let n = remaining.min(out.space());
                if n == 0 {
                    return Ok(Step::Yield(Status::NeedOutput));
                }
                self.window.copy_match(distance, &mut out.buf[out.len..out.len + n])?;
                out.len += n;
                self.state = if n == remaining {
                    InflateState::Codes
                } else {
                    InflateState::Match { remaining: remaining - n, distance }
                };
            }
            InflateState::Trailer => {
                self.sync_checksum(out);
                self.read_trailer()?;
                self.bits.rewind_to_byte();
                self.state = InflateState::Done;
                debug!(
                    "inflate finished: {:?} stream, {} bytes out",
                    self.format, self.total_out
                );
                return Ok(Step::Yield(Status::Done));
            }
            InflateState::Done => return Ok(Step::Yield(Status::Done)),
            InflateState::Failed => return Err(Error::SessionFinished),
        }
        Ok(Step::Continue)
    }

    fn read_header(&mut self) -> Result<()> {
        if self.format == Format::Auto {
            let magic = self.bits.peek_bits(16)?;
            self.format = if magic == 0x8b1f { Format::Gzip } else { Format::Zlib };
            self.checksum = self.format.new_checksum();
            debug!("detected {:?} stream", self.format);
        }

        match self.format {
            Format::Raw | Format::Auto => {}
            Format::Gzip => {
                let header = GzipHeader::parse(&mut self.bits)?;
                debug!(
                    "gzip header: name={:?} mtime={} os={}",
                    header.filename, header.mtime, header.os
                );
                self.gzip_header = Some(header);
            }
            Format::Zlib => {
                let cmf = self.bits.read_byte()?;
                let flg = self.bits.read_byte()?;
                let header = ZlibHeader::parse(cmf, flg)?;
                if header.window_bits > self.window_bits {
                    return Err(Error::InvalidWindowSize {
                        needed: header.window_bits,
                        configured: self.window_bits,
                    });
                }
                if header.needs_dictionary {
                    let expected = self.bits.read_u32_be()?;
                    match &self.dictionary {
                        Some(dict) => {
                            let found = adler32(dict);
                            if found != expected {
                                return Err(Error::DictionaryMismatch { expected, found });
                            }
                            self.window.push_bytes(dict);
                        }
                        None => {
                            self.state = InflateState::Dictionary(expected);
                            return Err(Error::DictionaryRequired(expected));
                        }
                    }
                }
                debug!("zlib header: window_bits={}", header.window_bits);
            }
        }
        self.state = InflateState::BlockHeader;
        Ok(())
    }

    fn read_block_header(&mut self) -> Result<()> {
        let last = self.bits.read_bit()?;
        let block_type = self.bits.read_bits(2)? as u8;
        trace!("block header: type={} last={}", block_type, last);

        self.state = match block_type {
            0 => InflateState::StoredHeader,
            1 => {
                self.tables = BlockTables::Fixed;
                InflateState::Codes
            }
            2 => InflateState::DynamicHeader,
            _ => return Err(Error::InvalidBlockType(block_type)),
        };
        self.last_block = last;
        Ok(())
    }

    fn read_dynamic_tables(&mut self) -> Result<()> {
        let hlit = self.bits.read_bits(5)? as usize + 257;
        let hdist = self.bits.read_bits(5)? as usize + 1;
        let hclen = self.bits.read_bits(4)? as usize + 4;
        if hlit > L_CODES || hdist > D_CODES {
            return Err(Error::TooManySymbols { literals: hlit, distances: hdist });
        }

        let mut code_length_lengths = [0u8; 19];
        for &index in &CODE_LENGTH_ORDER[..hclen] {
            code_length_lengths[index] = self.bits.read_bits(3)? as u8;
        }
        let code_length_decoder = HuffmanDecoder::from_code_lengths(&code_length_lengths, false)?;

        // Literal/length and distance lengths form one sequence; repeats may
        // cross from one into the other
        let total = hlit + hdist;
        let mut lengths = Vec::with_capacity(total);
        while lengths.len() < total {
            let sym = code_length_decoder.decode(&mut self.bits)?;
            let (value, repeat) = match sym {
                0..=15 => (sym as u8, 1),
                16 => {
                    let prev = *lengths.last().ok_or(Error::InvalidCodeLengthRepeat)?;
                    (prev, self.bits.read_bits(2)? as usize + 3)
                }
                17 => (0, self.bits.read_bits(3)? as usize + 3),
                _ => (0, self.bits.read_bits(7)? as usize + 11),
            };
            if lengths.len() + repeat > total {
                return Err(Error::InvalidCodeLengthRepeat);
            }
            lengths.resize(lengths.len() + repeat, value);
        }

        if lengths[END_BLOCK] == 0 {
            return Err(Error::MissingEndOfBlock);
        }
        let literal = HuffmanDecoder::from_code_lengths(&lengths[..hlit], true)?;
        let distance = HuffmanDecoder::from_code_lengths(&lengths[hlit..], true)?;
        trace!("dynamic tables: hlit={} hdist={} hclen={}", hlit, hdist, hclen);

        self.tables = BlockTables::Dynamic(Box::new(DynamicTables { literal, distance }));
        self.state = InflateState::Codes;
        Ok(())
    }

    /// Decode one literal/length symbol plus its length and distance
    fn decode_symbol(&mut self) -> Result<Symbol> {
        let (literal, distance) = match &self.tables {
            BlockTables::Fixed => {
                (HuffmanDecoder::fixed_literal_length(), HuffmanDecoder::fixed_distance())
            }
            BlockTables::Dynamic(tables) => (&tables.literal, &tables.distance),
        };

        let sym = literal.decode(&mut self.bits)?;
        match sym {
            0..=255 => Ok(Symbol::Literal(sym as u8)),
            256 => Ok(Symbol::EndOfBlock),
            257..=285 => {
                let (base, extra_bits) = LENGTH_TABLE[(sym - 257) as usize];
                let length = base as usize + self.bits.read_bits(extra_bits)? as usize;

                let dist_sym = distance.decode(&mut self.bits)?;
                if dist_sym as usize >= D_CODES {
                    return Err(Error::InvalidDistanceCode(dist_sym));
                }
                let (base, extra_bits) = DISTANCE_TABLE[dist_sym as usize];
                let distance = base as usize + self.bits.read_bits(extra_bits)? as usize;
                Ok(Symbol::Copy { length, distance })
            }
            _ => Err(Error::InvalidLengthCode(sym)),
        }
    }

    fn end_of_block(&mut self) {
        self.state = if self.last_block { InflateState::Trailer } else { InflateState::BlockHeader };
    }

    fn read_trailer(&mut self) -> Result<()> {
        self.bits.align_to_byte();
        match self.format {
            Format::Raw | Format::Auto => {}
            Format::Zlib => {
                let expected = self.bits.read_u32_be()?;
                let found = self.checksum.value();
                if expected != found {
                    return Err(Error::ChecksumMismatch { expected, found });
                }
            }
            Format::Gzip => {
                let trailer = GzipTrailer::parse(&mut self.bits)?;
                let found = self.checksum.value();
                if trailer.crc32 != found {
                    return Err(Error::ChecksumMismatch { expected: trailer.crc32, found });
                }
                let size = self.total_out as u32;
                if trailer.isize != size {
                    return Err(Error::SizeMismatch { expected: trailer.isize, found: size });
                }
            }
        }
        Ok(())
    }

    /// Fold newly produced output into the checksum and totals
    fn sync_checksum(&mut self, out: &mut OutBuf<'_>) {
        if out.len > out.checked {
            self.checksum.update(&out.buf[out.checked..out.len]);
            self.total_out += (out.len - out.checked) as u64;
            out.checked = out.len;
        }
    }

    /// Start over for a new stream with the same settings
    pub fn reset(&mut self) {
        self.bits.clear();
        self.window.clear();
        self.state = InflateState::Header;
        self.format = self.configured_format;
        self.last_block = false;
        self.tables = BlockTables::Fixed;
        self.checksum = self.format.new_checksum();
        self.gzip_header = None;
        self.total_in = 0;
        self.total_out = 0;
        self.preload_raw_dictionary();
    }

    /// Input buffered by earlier calls that lies past the end of the stream
    pub fn unused_input(&self) -> &[u8] {
        if self.state == InflateState::Done {
            self.bits.unread_input()
        } else {
            &[]
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == InflateState::Done
    }

    /// Still waiting for the complete wrapper header
    pub fn is_reading_header(&self) -> bool {
        self.state == InflateState::Header
    }

    /// Header of the current gzip member, once parsed
    pub fn gzip_header(&self) -> Option<&GzipHeader> {
        self.gzip_header.as_ref()
    }

    /// Wrapper in use; reports the detected one for `Format::Auto`
    pub fn format(&self) -> Format {
        self.format
    }

    /// Compressed bytes consumed so far
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Decompressed bytes produced so far
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Running checksum of the output (CRC-32 for gzip, Adler-32 for zlib)
    pub fn checksum(&self) -> u32 {
        self.checksum.value()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::bits::BitWriter;

    fn config(format: Format) -> InflateConfig {
        InflateConfig { format, ..Default::default() }
    }

    fn inflate_all(format: Format, data: &[u8]) -> Result<Vec<u8>> {
        let mut inflater = Inflater::new(&config(format))?;
        let mut out = vec![0u8; 1 << 20];
        let result = inflater.decompress(data, &mut out)?;
        if result.status != Status::Done {
            return Err(Error::UnexpectedEof);
        }
        out.truncate(result.produced);
        Ok(out)
    }

    fn flate2_zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn flate2_gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::best());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_stored_block() {
        let data = [0x01, 0x03, 0x00, 0xFC, 0xFF, b'a', b'b', b'c'];
        assert_eq!(inflate_all(Format::Raw, &data).unwrap(), b"abc");
    }

    #[test]
    fn test_empty_zlib() {
        let data = [0x78, 0x9C, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01];
        assert_eq!(inflate_all(Format::Zlib, &data).unwrap(), b"");
    }

    #[test]
    fn test_flate2_streams() {
        let text = b"It was the best of times, it was the worst of times. ".repeat(200);
        assert_eq!(inflate_all(Format::Zlib, &flate2_zlib(&text)).unwrap(), text);
        assert_eq!(inflate_all(Format::Gzip, &flate2_gzip(&text)).unwrap(), text);
        assert_eq!(inflate_all(Format::Auto, &flate2_gzip(&text)).unwrap(), text);
        assert_eq!(inflate_all(Format::Auto, &flate2_zlib(&text)).unwrap(), text);
    }

    #[test]
    fn test_byte_at_a_time_with_tiny_output() {
        let text: Vec<u8> = (0..20_000u32).map(|i| ((i / 7) % 61) as u8 + b' ').collect();
        let compressed = flate2_gzip(&text);

        let mut inflater = Inflater::new(&config(Format::Gzip)).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 3];
        let mut done = false;
        for &byte in &compressed {
            let mut input: &[u8] = &[byte];
            loop {
                let result = inflater.decompress(input, &mut buf).unwrap();
                input = &input[result.consumed..];
                out.extend_from_slice(&buf[..result.produced]);
                match result.status {
                    Status::NeedOutput => continue,
                    Status::Done => {
                        done = true;
                        break;
                    }
                    _ => break,
                }
            }
        }
        assert!(done);
        assert_eq!(out, text);
        assert_eq!(inflater.total_in(), compressed.len() as u64);
        assert_eq!(inflater.gzip_header().map(|h| h.os), Some(flate2_gzip(b"")[9]));
    }

    #[test]
    fn test_reserved_block_type() {
        // BFINAL=1, BTYPE=11
        let result = inflate_all(Format::Raw, &[0x07]);
        assert!(matches!(result, Err(Error::InvalidBlockType(3))));
    }

    #[test]
    fn test_stored_length_mismatch() {
        let data = [0x01, 0x03, 0x00, 0x00, 0x00, b'a', b'b', b'c'];
        assert!(matches!(
            inflate_all(Format::Raw, &data),
            Err(Error::StoredBlockLengthMismatch { len: 3, nlen: 0 })
        ));
    }

    fn fixed_block_with_copy(distance_code: u32, extra: (u32, u8)) -> Vec<u8> {
        let lit = crate::huffman::tables::static_trees();
        let mut writer = BitWriter::new();
        writer.write_bits(1, 1);
        writer.write_bits(1, 2);
        for &b in b"abcd" {
            writer.write_bits(lit.literal.codes[b as usize] as u32, lit.literal.lengths[b as usize]);
        }
        // Length 3 is symbol 257
        writer.write_bits(lit.literal.codes[257] as u32, lit.literal.lengths[257]);
        writer.write_bits_reversed(distance_code, 5);
        writer.write_bits(extra.0, extra.1);
        writer.write_bits(lit.literal.codes[256] as u32, lit.literal.lengths[256]);
        writer.finish()
    }

    #[test]
    fn test_distance_equal_to_window_is_valid() {
        // Distance code 3 is distance 4: exactly the four bytes written
        let data = fixed_block_with_copy(3, (0, 0));
        assert_eq!(inflate_all(Format::Raw, &data).unwrap(), b"abcdabc");
    }

    #[test]
    fn test_distance_past_window_is_rejected() {
        // Distance code 4 with extra bit 0 is distance 5
        let data = fixed_block_with_copy(4, (0, 1));
        assert!(matches!(
            inflate_all(Format::Raw, &data),
            Err(Error::DistanceTooFarBack { distance: 5, available: 4 })
        ));
    }

    #[test]
    fn test_invalid_distance_symbol() {
        let data = fixed_block_with_copy(30, (0, 0));
        assert!(matches!(inflate_all(Format::Raw, &data), Err(Error::InvalidDistanceCode(30))));
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut data = flate2_zlib(b"checksum me");
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        assert!(matches!(inflate_all(Format::Zlib, &data), Err(Error::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_gzip_size_mismatch() {
        let mut data = flate2_gzip(b"size me");
        let last = data.len() - 4;
        data[last] ^= 0x01;
        assert!(matches!(inflate_all(Format::Gzip, &data), Err(Error::SizeMismatch { .. })));
    }

    #[test]
    fn test_errors_are_terminal() {
        let mut inflater = Inflater::new(&config(Format::Raw)).unwrap();
        let mut out = [0u8; 16];
        assert!(inflater.decompress(&[0x07], &mut out).is_err());
        assert!(matches!(inflater.decompress(&[], &mut out), Err(Error::SessionFinished)));
    }

    #[test]
    fn test_truncated_stream_needs_input() {
        let data = flate2_zlib(b"truncated stream truncated stream");
        let mut inflater = Inflater::new(&config(Format::Zlib)).unwrap();
        let mut out = [0u8; 256];
        let result = inflater.decompress(&data[..data.len() - 3], &mut out).unwrap();
        assert_eq!(result.status, Status::NeedInput);
        let rest = inflater.decompress(&data[data.len() - 3..], &mut out[result.produced..]).unwrap();
        assert_eq!(rest.status, Status::Done);
        assert_eq!(&out[..result.produced + rest.produced], b"truncated stream truncated stream");
    }

    #[test]
    fn test_trailing_bytes_left_unconsumed() {
        let mut data = flate2_zlib(b"payload");
        data.extend_from_slice(b"XYZ");
        let mut inflater = Inflater::new(&config(Format::Zlib)).unwrap();
        let mut out = [0u8; 64];
        let result = inflater.decompress(&data, &mut out).unwrap();
        assert_eq!(result.status, Status::Done);
        assert_eq!(result.consumed, data.len() - 3);
        assert_eq!(&out[..result.produced], b"payload");
    }

    #[test]
    fn test_zlib_dictionary_required() {
        let deflate_config = crate::DeflateConfig {
            dictionary: Some(b"common words".to_vec()),
            ..Default::default()
        };
        let mut deflater = crate::deflate::Deflater::new(&deflate_config).unwrap();
        let mut data = Vec::new();
        deflater
            .compress_to_vec(b"common words are common", &mut data, crate::deflate::Flush::Finish)
            .unwrap();

        let mut inflater = Inflater::new(&config(Format::Zlib)).unwrap();
        let mut out = [0u8; 64];
        let id = adler32(b"common words");
        assert!(matches!(
            inflater.decompress(&data, &mut out),
            Err(Error::DictionaryRequired(found)) if found == id
        ));
        assert!(matches!(
            inflater.set_dictionary(b"wrong words"),
            Err(Error::DictionaryMismatch { .. })
        ));
        inflater.set_dictionary(b"common words").unwrap();
        let result = inflater.decompress(&[], &mut out).unwrap();
        assert_eq!(result.status, Status::Done);
        assert_eq!(&out[..result.produced], b"common words are common");
    }
}
