pub mod header;

pub use header::{GzipHeader, GzipTrailer, GZIP_MAGIC};
