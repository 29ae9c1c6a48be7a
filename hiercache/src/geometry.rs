use crate::error::GeometryError;

/// Largest supported number of set bits. Each set owns a lock and a slab of lines, so this bounds
/// the allocation made at construction
pub const MAX_SETS_LOG2: u32 = 24;

/// The fixed dimensions of a set-associative cache
///
/// A geometry can only be built through [`CacheGeometry::new`], so every instance has been
/// validated. With `sets_log2 == 0` the cache degenerates to a single fully associative set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeometry {
    ways: usize,
    sets_log2: u32,
    line_size_log2: u32,
}

/// An address split into its cache-relevant parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decomposed {
    pub tag: u64,
    pub set: usize,
    pub offset: u64,
}

impl CacheGeometry {
    /// Validates and creates a geometry
    ///
    /// # Arguments
    ///
    /// * `ways`: The associativity, must be at least 1
    /// * `sets_log2`: log2 of the number of sets
    /// * `line_size_log2`: log2 of the line size in bytes
    ///
    /// returns: Result<CacheGeometry, GeometryError>
    pub fn new(ways: usize, sets_log2: u32, line_size_log2: u32) -> Result<Self, GeometryError> {
        if ways == 0 {
            return Err(GeometryError::ZeroWays);
        }
        if sets_log2 > MAX_SETS_LOG2 {
            return Err(GeometryError::TooManySets { sets_log2, max: MAX_SETS_LOG2 });
        }
        if sets_log2 + line_size_log2 >= u64::BITS {
            return Err(GeometryError::AddressTooNarrow { sets_log2, line_size_log2 });
        }
        Ok(Self { ways, sets_log2, line_size_log2 })
    }

    pub fn ways(&self) -> usize {
        self.ways
    }

    pub fn sets_log2(&self) -> u32 {
        self.sets_log2
    }

    pub fn line_size_log2(&self) -> u32 {
        self.line_size_log2
    }

    pub fn sets(&self) -> usize {
        1 << self.sets_log2
    }

    pub fn line_size(&self) -> u64 {
        1 << self.line_size_log2
    }

    /// Total number of line slots, `ways * 2^sets_log2`
    pub fn lines(&self) -> usize {
        self.ways * self.sets()
    }

    /// Capacity in bytes, `ways * 2^sets_log2 * 2^line_size_log2`
    pub fn capacity(&self) -> u64 {
        self.lines() as u64 * self.line_size()
    }

    /// Splits an address into tag, set and offset
    ///
    /// The set is taken from the low bits of the tag rather than directly from the address, so a
    /// given address always lands in the same set for both lookup and insertion
    pub fn decompose(&self, address: u64) -> Decomposed {
        let tag = address >> self.line_size_log2;
        Decomposed {
            tag,
            set: (tag & ((1 << self.sets_log2) - 1)) as usize,
            offset: address & (self.line_size() - 1),
        }
    }

    /// The line-aligned address for a tag
    pub fn block_address(&self, tag: u64) -> u64 {
        tag << self.line_size_log2
    }
}
