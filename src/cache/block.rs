use crate::address;

/// A single cache line.
///
/// Lines start out invalid and become valid on their first fill. After
/// that they are only ever overwritten, never invalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Line {
    /// Tag of the block held by this line, meaningful only when valid.
    pub tag: address,
    /// Position of this line in the replacement order of its set.
    ///
    /// Rank 0 is the next victim, the highest rank the most recently
    /// inserted (or, for LRU, used) line.
    pub rank: usize,
    pub valid: bool,
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.valid {
            f.debug_struct("Line")
                .field("tag", &self.tag)
                .field("rank", &self.rank)
                .finish()
        } else {
            write!(f, "Line(INVALID)")
        }
    }
}

impl Line {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills an empty line.
    #[inline]
    pub fn fill(&mut self, tag: address, rank: usize) {
        debug_assert!(!self.valid, "filling a valid line");
        self.tag = tag;
        self.rank = rank;
        self.valid = true;
    }

    #[inline]
    #[must_use]
    pub fn matches(&self, tag: address) -> bool {
        self.valid && self.tag == tag
    }
}
