//! Compression level presets: each level maps to a `good/lazy/nice/chain`
//! parameter set for the match finder, the same shape zlib's
//! `configuration_table` uses.

/// `good`: once a match at least this long is found, halve `max_chain`
/// for subsequent searches at this position (diminishing returns).
/// `lazy`: don't bother checking position+1 for a better match if the
/// current one is already at least this long.
/// `nice`: stop searching as soon as a match at least this long is found.
/// `chain`: maximum number of hash-chain links to follow per lookup.
#[derive(Clone, Copy, Debug)]
pub struct LevelParams {
    pub good: usize,
    pub lazy: usize,
    pub nice: usize,
    pub chain: usize,
    pub use_lazy_matching: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Level(pub(crate) u8);

impl Level {
    pub const STORE: Level = Level(0);
    pub const FASTEST: Level = Level(1);
    pub const FAST: Level = Level(4);
    pub const DEFAULT: Level = Level(6);
    pub const BEST: Level = Level(9);

    pub fn new(n: u8) -> Self {
        Level(n.min(9))
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }

    pub fn params(self) -> LevelParams {
        LEVEL_TABLE[self.0 as usize]
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::DEFAULT
    }
}

/// Indexed by level 0..=9. Level 0 is never consulted for match-finder
/// parameters (it always takes the store-only path); its row is a
/// placeholder.
const LEVEL_TABLE: [LevelParams; 10] = [
    LevelParams { good: 0, lazy: 0, nice: 0, chain: 0, use_lazy_matching: false },
    LevelParams { good: 4, lazy: 4, nice: 8, chain: 4, use_lazy_matching: false },
    LevelParams { good: 4, lazy: 5, nice: 16, chain: 8, use_lazy_matching: false },
    LevelParams { good: 4, lazy: 6, nice: 32, chain: 32, use_lazy_matching: false },
    LevelParams { good: 4, lazy: 4, nice: 16, chain: 16, use_lazy_matching: true },
    LevelParams { good: 8, lazy: 16, nice: 32, chain: 32, use_lazy_matching: true },
    LevelParams { good: 8, lazy: 16, nice: 128, chain: 128, use_lazy_matching: true },
    LevelParams { good: 8, lazy: 32, nice: 128, chain: 256, use_lazy_matching: true },
    LevelParams { good: 32, lazy: 128, nice: 258, chain: 1024, use_lazy_matching: true },
    LevelParams { good: 32, lazy: 258, nice: 258, chain: 4096, use_lazy_matching: true },
];
