//! DEFLATE compression: LZ77 matching and block emission

pub mod config;
pub mod deflater;
pub mod matcher;
mod strategy;
pub mod tables;
pub mod tokens;

pub use config::Strategy;
pub use deflater::{Deflater, Flush};
pub use tokens::LZ77Token;
