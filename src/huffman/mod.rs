pub mod builder;
pub mod decoder;
pub mod encoder;
pub mod tables;

pub use builder::HuffmanTree;
pub use decoder::HuffmanDecoder;
pub use encoder::{BlockType, FrequencyCounter};
