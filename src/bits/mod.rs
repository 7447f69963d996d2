pub mod reader;
pub mod writer;

pub use reader::{BitReader, Checkpoint};
pub use writer::{reverse_bits, BitWriter};
