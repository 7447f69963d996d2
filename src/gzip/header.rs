use crate::error::{Error, Result};
use crate::format::DEFLATED;
use std::io::Read;

/// Gzip header flags (RFC 1952)
const FTEXT: u8 = 1 << 0;
const FHCRC: u8 = 1 << 1;
const FEXTRA: u8 = 1 << 2;
const FNAME: u8 = 1 << 3;
const FCOMMENT: u8 = 1 << 4;
const RESERVED: u8 = 0xE0;

/// ID1 and ID2 at the start of every member
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// OS byte written by default (Unix)
pub const OS_UNIX: u8 = 3;

/// Gzip member header (RFC 1952)
///
/// Parsed from each member when decoding; supplied through
/// `DeflateConfig::gzip_header` to customize what the encoder writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipHeader {
    /// FTEXT: the payload is probably text
    pub text: bool,
    pub mtime: u32,
    /// XFL as read; the encoder derives its own from the level
    pub extra_flags: u8,
    pub os: u8,
    pub extra: Option<Vec<u8>>,
    pub filename: Option<String>,
    pub comment: Option<String>,
    /// FHCRC: a CRC-16 of the header follows it
    pub header_crc: bool,
}

impl Default for GzipHeader {
    fn default() -> Self {
        Self {
            text: false,
            mtime: 0,
            extra_flags: 0,
            os: OS_UNIX,
            extra: None,
            filename: None,
            comment: None,
            header_crc: false,
        }
    }
}

impl GzipHeader {
    /// Parse a gzip header from a reader, verifying FHCRC when present
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut reader = CrcReader { inner: reader, crc: crc32fast::Hasher::new() };

        let mut buf = [0u8; 10];
        reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;

        // Check magic bytes
        let magic = u16::from_le_bytes([buf[0], buf[1]]);
        if magic != 0x8b1f {
            return Err(Error::InvalidGzipMagic(magic));
        }

        // Compression method (must be 8 for DEFLATE)
        let compression_method = buf[2];
        if compression_method != DEFLATED {
            return Err(Error::UnsupportedCompressionMethod(compression_method));
        }

        let flags = buf[3];
        if flags & RESERVED != 0 {
            return Err(Error::ReservedGzipFlags(flags));
        }
        let mtime = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let extra_flags = buf[8];
        let os = buf[9];

        // Parse optional fields based on flags
        let extra = if flags & FEXTRA != 0 {
            let mut xlen_buf = [0u8; 2];
            reader.read_exact(&mut xlen_buf).map_err(|_| Error::UnexpectedEof)?;
            let xlen = u16::from_le_bytes(xlen_buf) as usize;

            let mut extra_data = vec![0u8; xlen];
            reader.read_exact(&mut extra_data).map_err(|_| Error::UnexpectedEof)?;
            Some(extra_data)
        } else {
            None
        };

        let filename =
            if flags & FNAME != 0 { Some(read_null_terminated_string(&mut reader)?) } else { None };

        let comment = if flags & FCOMMENT != 0 {
            Some(read_null_terminated_string(&mut reader)?)
        } else {
            None
        };

        if flags & FHCRC != 0 {
            let expected = reader.crc.clone().finalize() as u16;
            let mut crc_buf = [0u8; 2];
            reader.inner.read_exact(&mut crc_buf).map_err(|_| Error::UnexpectedEof)?;
            let found = u16::from_le_bytes(crc_buf);
            if found != expected {
                return Err(Error::GzipHeaderCrcMismatch { expected, found });
            }
        }

        Ok(GzipHeader {
            text: flags & FTEXT != 0,
            mtime,
            extra_flags,
            os,
            extra,
            filename,
            comment,
            header_crc: flags & FHCRC != 0,
        })
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.text {
            flags |= FTEXT;
        }
        if self.header_crc {
            flags |= FHCRC;
        }
        if self.extra.is_some() {
            flags |= FEXTRA;
        }
        if self.filename.is_some() {
            flags |= FNAME;
        }
        if self.comment.is_some() {
            flags |= FCOMMENT;
        }
        flags
    }

    /// Serialize with the given XFL byte
    ///
    /// Extra fields longer than 65535 bytes are truncated; names and
    /// comments end at their first NUL.
    pub fn to_bytes(&self, extra_flags: u8) -> Vec<u8> {
        let mut out = Vec::with_capacity(10);
        out.extend_from_slice(&GZIP_MAGIC);
        out.extend_from_slice(&[DEFLATED, self.flags()]);
        out.extend_from_slice(&self.mtime.to_le_bytes());
        out.push(extra_flags);
        out.push(self.os);

        if let Some(extra) = &self.extra {
            let len = extra.len().min(u16::MAX as usize);
            out.extend_from_slice(&(len as u16).to_le_bytes());
            out.extend_from_slice(&extra[..len]);
        }
        for text in [&self.filename, &self.comment].into_iter().flatten() {
            out.extend(text.bytes().take_while(|&b| b != 0));
            out.push(0);
        }
        if self.header_crc {
            let crc = crc32fast::hash(&out) as u16;
            out.extend_from_slice(&crc.to_le_bytes());
        }
        out
    }
}

/// Gzip trailer (8 bytes at end of each member)
#[derive(Debug, Clone)]
pub struct GzipTrailer {
    pub crc32: u32,
    /// Uncompressed size modulo 2^32
    pub isize: u32,
}

impl GzipTrailer {
    /// Parse a gzip trailer from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;

        let crc32 = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let isize = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);

        Ok(GzipTrailer { crc32, isize })
    }
}

/// Reader that checksums everything passing through it
struct CrcReader<'a, R> {
    inner: &'a mut R,
    crc: crc32fast::Hasher,
}

impl<R: Read> Read for CrcReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.crc.update(&buf[..n]);
        Ok(n)
    }
}

/// Read a null-terminated string from a reader
fn read_null_terminated_string<R: Read>(reader: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        reader.read_exact(&mut byte).map_err(|_| Error::UnexpectedEof)?;
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }

    // Gzip uses ISO-8859-1 (Latin-1); keep valid UTF-8 as is
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => Ok(e.into_bytes().iter().map(|&b| b as char).collect()),
    }
}
