//! DEFLATE decompression

pub mod inflater;
pub mod window;

pub use inflater::Inflater;
