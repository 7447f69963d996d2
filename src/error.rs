use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Wrapper header errors
    #[error("Invalid gzip magic bytes: expected 0x1f8b, got 0x{0:04x}")]
    InvalidGzipMagic(u16),

    #[error("Unsupported compression method: {0} (only DEFLATE/8 supported)")]
    UnsupportedCompressionMethod(u8),

    #[error("Gzip header has reserved flag bits set: 0x{0:02x}")]
    ReservedGzipFlags(u8),

    #[error("Gzip header CRC mismatch: expected 0x{expected:04x}, got 0x{found:04x}")]
    GzipHeaderCrcMismatch { expected: u16, found: u16 },

    #[error("Incorrect zlib header check: 0x{0:04x}")]
    InvalidZlibHeader(u16),

    #[error("Invalid window size: stream needs 2^{needed} bytes, configured for 2^{configured}")]
    InvalidWindowSize { needed: u8, configured: u8 },

    #[error("Stream requires a preset dictionary with Adler-32 0x{0:08x}")]
    DictionaryRequired(u32),

    #[error("Preset dictionary mismatch: stream wants 0x{expected:08x}, got 0x{found:08x}")]
    DictionaryMismatch { expected: u32, found: u32 },

    // DEFLATE format violations
    #[error("Invalid DEFLATE block type: {0}")]
    InvalidBlockType(u8),

    #[error("Stored block length mismatch: LEN={len}, NLEN={nlen}")]
    StoredBlockLengthMismatch { len: u16, nlen: u16 },

    #[error("Too many length or distance symbols: HLIT={literals}, HDIST={distances}")]
    TooManySymbols { literals: usize, distances: usize },

    #[error("Invalid code length repeat")]
    InvalidCodeLengthRepeat,

    #[error("Invalid code: missing end-of-block")]
    MissingEndOfBlock,

    #[error("Invalid Huffman code length: {0} (max 15)")]
    InvalidCodeLength(u8),

    #[error("Huffman code oversubscribed: more codes than possible for bit length")]
    HuffmanOversubscribed,

    #[error("Huffman code incomplete: not all codes assigned")]
    HuffmanIncomplete,

    #[error("Invalid Huffman code in bitstream")]
    InvalidHuffmanCode,

    #[error("Invalid length code: {0}")]
    InvalidLengthCode(u16),

    #[error("Invalid distance code: {0}")]
    InvalidDistanceCode(u16),

    #[error("Invalid distance too far back: {distance} exceeds available window {available}")]
    DistanceTooFarBack { distance: usize, available: usize },

    // Checksum errors
    #[error("Incorrect data check: expected 0x{expected:08x}, got 0x{found:08x}")]
    ChecksumMismatch { expected: u32, found: u32 },

    #[error("Incorrect length check: expected {expected} bytes, got {found}")]
    SizeMismatch { expected: u32, found: u32 },

    // Caller misuse
    #[error("Session already finished")]
    SessionFinished,

    #[error("Input supplied after the stream was finished")]
    InputAfterFinish,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // Truncated input where no more data will arrive
    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors caused by malformed compressed data
    pub fn is_corrupt_data(&self) -> bool {
        !matches!(
            self,
            Error::Io(_)
                | Error::DictionaryRequired(_)
                | Error::SessionFinished
                | Error::InputAfterFinish
                | Error::InvalidParameter(_)
                | Error::UnexpectedEof
                | Error::Internal(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::UnexpectedEof => std::io::Error::new(std::io::ErrorKind::UnexpectedEof, err),
            e if e.is_corrupt_data() => std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            e => std::io::Error::new(std::io::ErrorKind::Other, e),
        }
    }
}
