//! Stream wrappers around raw DEFLATE data
//!
//! - Raw: no header or trailer
//! - Zlib (RFC 1950): 2-byte header, optional dictionary id, Adler-32 trailer
//! - Gzip (RFC 1952): variable header, CRC-32 + ISIZE trailer
//! - Auto: decode only, picks zlib or gzip from the first two bytes

use crate::bits::BitWriter;
use crate::checksum::{Adler32, Checksum};
use crate::deflate::config::Strategy;
use crate::error::{Error, Result};
use crate::gzip::GzipHeader;
use crate::CompressionLevel;

/// CM value for DEFLATE in both zlib and gzip headers
pub const DEFLATED: u8 = 8;

/// FDICT flag in the zlib FLG byte
const PRESET_DICT: u8 = 0x20;

/// Stream wrapper
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Format {
    /// Bare DEFLATE blocks
    Raw,
    #[default]
    Zlib,
    Gzip,
    /// Detect zlib or gzip when decoding
    Auto,
}

impl Format {
    /// Fresh checksum for this wrapper's trailer
    pub fn new_checksum(self) -> Checksum {
        match self {
            Format::Raw => Checksum::None,
            Format::Zlib => Checksum::Adler32(Adler32::new()),
            Format::Gzip => Checksum::Crc32(crc32fast::Hasher::new()),
            Format::Auto => Checksum::None,
        }
    }

    /// Parse a format name as used on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "raw" | "deflate" => Some(Format::Raw),
            "zlib" => Some(Format::Zlib),
            "gzip" | "gz" => Some(Format::Gzip),
            "auto" => Some(Format::Auto),
            _ => None,
        }
    }
}

/// Values carried in a zlib header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZlibHeader {
    /// log2 of the window the stream was compressed with (8-15)
    pub window_bits: u8,
    /// FDICT is set; a 4-byte dictionary id follows the header
    pub needs_dictionary: bool,
}

impl ZlibHeader {
    /// Validate CMF and FLG
    pub fn parse(cmf: u8, flg: u8) -> Result<Self> {
        let check = ((cmf as u16) << 8) | flg as u16;
        if check % 31 != 0 {
            return Err(Error::InvalidZlibHeader(check));
        }
        if cmf & 0x0F != DEFLATED {
            return Err(Error::UnsupportedCompressionMethod(cmf & 0x0F));
        }
        Ok(Self { window_bits: (cmf >> 4) + 8, needs_dictionary: flg & PRESET_DICT != 0 })
    }
}

/// Zlib CMF/FLG for the given settings
pub fn zlib_header(
    level: CompressionLevel,
    strategy: Strategy,
    window_bits: u8,
    has_dictionary: bool,
) -> [u8; 2] {
    let cmf = ((window_bits - 8) << 4) | DEFLATED;
    let level = level.level();
    let level_flags: u8 = if strategy.is_huffman_only_or_above() || level < 2 {
        0
    } else if level < 6 {
        1
    } else if level == 6 {
        2
    } else {
        3
    };
    let mut flg = level_flags << 6;
    if has_dictionary {
        flg |= PRESET_DICT;
    }
    let header = ((cmf as u16) << 8) | flg as u16;
    flg += (31 - header % 31) as u8;
    [cmf, flg]
}

/// Gzip XFL byte: 2 for maximum compression, 4 for the fastest settings
pub fn gzip_extra_flags(level: CompressionLevel, strategy: Strategy) -> u8 {
    if level.level() == 9 {
        2
    } else if strategy.is_huffman_only_or_above() || level.level() < 2 {
        4
    } else {
        0
    }
}

/// Settings that shape a compressed stream's wrapper
#[derive(Clone, Copy, Debug)]
pub struct WrapperParams<'a> {
    pub format: Format,
    pub level: CompressionLevel,
    pub strategy: Strategy,
    pub window_bits: u8,
    pub gzip_header: Option<&'a GzipHeader>,
    /// Adler-32 of the preset dictionary (zlib only)
    pub dictionary_id: Option<u32>,
}

/// Queue the wrapper header
pub fn write_header(writer: &mut BitWriter, params: &WrapperParams<'_>) {
    match params.format {
        Format::Raw | Format::Auto => {}
        Format::Zlib => {
            let header = zlib_header(
                params.level,
                params.strategy,
                params.window_bits,
                params.dictionary_id.is_some(),
            );
            writer.write_bytes(&header);
            if let Some(id) = params.dictionary_id {
                writer.write_u32_be(id);
            }
        }
        Format::Gzip => {
            let default_header = GzipHeader::default();
            let header = params.gzip_header.unwrap_or(&default_header);
            writer.write_bytes(&header.to_bytes(gzip_extra_flags(params.level, params.strategy)));
        }
    }
}

/// Queue the wrapper trailer
pub fn write_trailer(writer: &mut BitWriter, format: Format, checksum: u32, total_in: u64) {
    match format {
        Format::Raw | Format::Auto => {}
        Format::Zlib => writer.write_u32_be(checksum),
        Format::Gzip => {
            writer.write_u32_le(checksum);
            writer.write_u32_le(total_in as u32);
        }
    }
}
