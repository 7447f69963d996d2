use crate::CompressionLevel;

/// Match-finding strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Default,
    /// Lazy matching that drops short matches, for data with small random
    /// variations such as filtered images
    Filtered,
    /// Literals only
    HuffmanOnly,
    /// Matches at distance 1 only
    Rle,
    /// Never emit dynamic trees
    Fixed,
}

impl Strategy {
    /// Strategies that skip or limit string matching
    pub fn is_huffman_only_or_above(&self) -> bool {
        matches!(self, Strategy::HuffmanOnly | Strategy::Rle | Strategy::Fixed)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Some(Strategy::Default),
            "filtered" => Some(Strategy::Filtered),
            "huffman" | "huffman-only" => Some(Strategy::HuffmanOnly),
            "rle" => Some(Strategy::Rle),
            "fixed" => Some(Strategy::Fixed),
            _ => None,
        }
    }
}

/// Which block loop a level runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelFunction {
    Stored,
    Fast,
    Slow,
}

/// Match-finder tuning for one compression level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelParams {
    /// Shorten the chain search once the current match is this long
    pub good_length: u16,
    /// Slow: skip lazy evaluation beyond this length. Fast: only insert
    /// strings for matches up to this length
    pub max_lazy: u16,
    /// Stop searching once a match is this long
    pub nice_length: u16,
    /// Maximum hash chain steps per search
    pub max_chain: u16,
    pub function: LevelFunction,
}

const fn params(good: u16, lazy: u16, nice: u16, chain: u16, function: LevelFunction) -> LevelParams {
    LevelParams { good_length: good, max_lazy: lazy, nice_length: nice, max_chain: chain, function }
}

/// Tuning per level 0-9
pub const CONFIGURATION_TABLE: [LevelParams; 10] = [
    params(0, 0, 0, 0, LevelFunction::Stored),
    params(4, 4, 8, 4, LevelFunction::Fast),
    params(4, 5, 16, 8, LevelFunction::Fast),
    params(4, 6, 32, 32, LevelFunction::Fast),
    params(4, 4, 16, 16, LevelFunction::Slow),
    params(8, 16, 32, 32, LevelFunction::Slow),
    params(8, 16, 128, 128, LevelFunction::Slow),
    params(8, 32, 128, 256, LevelFunction::Slow),
    params(32, 128, 258, 1024, LevelFunction::Slow),
    params(32, 258, 258, 4096, LevelFunction::Slow),
];

impl CompressionLevel {
    /// Match-finder tuning for this level
    pub fn params(&self) -> LevelParams {
        CONFIGURATION_TABLE[self.level() as usize]
    }
}
