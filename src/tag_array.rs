use super::{address, cache};
use crate::cache::{config::ReplacementPolicy, Geometry, Line, RequestStatus};

pub trait CacheAddressTranslation: std::fmt::Debug + Sync + Send + 'static {
    /// Compute cache line tag for an address.
    #[must_use]
    fn tag(&self, addr: address) -> address;

    /// Compute the block address (the address without its block offset).
    #[must_use]
    fn block_addr(&self, addr: address) -> address;

    /// Compute set index for an address.
    #[must_use]
    fn set_index(&self, addr: address) -> u64;
}

/// Linear set indexing: the set index is made of the low bits of the block address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Linear {
    block_offset_bits: u32,
    set_index_bits: u32,
    num_sets: usize,
}

impl Linear {
    #[must_use]
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            block_offset_bits: geometry.block_offset_bits,
            set_index_bits: geometry.set_index_bits,
            num_sets: geometry.num_sets,
        }
    }
}

impl CacheAddressTranslation for Linear {
    #[inline]
    fn tag(&self, addr: address) -> address {
        self.block_addr(addr) >> self.set_index_bits
    }

    #[inline]
    fn block_addr(&self, addr: address) -> address {
        addr >> self.block_offset_bits
    }

    #[inline]
    fn set_index(&self, addr: address) -> u64 {
        let set_idx = self.block_addr(addr) & (self.num_sets as u64 - 1);
        debug_assert!(set_idx < self.num_sets as u64, "set index out of bounds");
        set_idx
    }
}

/// Result of scanning a set for a tag.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Lookup {
    /// Way holding the requested tag.
    hit: Option<usize>,
    /// First way not holding a valid line.
    empty: Option<usize>,
    num_valid: usize,
    max_rank: usize,
    /// Way holding the line at rank 0.
    victim: usize,
}

impl Lookup {
    /// Scans a set low to high.
    ///
    /// Lines are filled low to high and never invalidated, so the first
    /// invalid line ends the valid part of the set.
    fn scan(set: &[Line], tag: address) -> Self {
        let mut lookup = Self::default();
        for (way, line) in set.iter().enumerate() {
            if !line.valid {
                lookup.empty = Some(way);
                break;
            }
            lookup.num_valid += 1;
            if line.rank == 0 {
                lookup.victim = way;
            }
            lookup.max_rank = lookup.max_rank.max(line.rank);
            if line.tag == tag {
                lookup.hit = Some(way);
            }
        }
        lookup
    }
}

/// Tag array.
///
/// A flat array of `num_sets x associativity` lines, where set `i` is
/// the contiguous run of lines starting at `i * associativity`.
///
/// Within every set, the ranks of the valid lines are always exactly
/// `0..num_valid`. Rank 0 is evicted next under both replacement
/// policies, LRU hits move the hit line to the highest rank.
#[derive(Debug)]
pub struct TagArray<T = Linear> {
    lines: Vec<Line>,
    geometry: Geometry,
    replacement_policy: ReplacementPolicy,
    addr_translation: T,
}

impl TagArray<Linear> {
    #[must_use]
    pub fn new(geometry: Geometry, replacement_policy: ReplacementPolicy) -> Self {
        Self::with_translation(geometry, replacement_policy, Linear::new(&geometry))
    }
}

impl<T> TagArray<T>
where
    T: CacheAddressTranslation,
{
    #[must_use]
    pub fn with_translation(
        geometry: Geometry,
        replacement_policy: ReplacementPolicy,
        addr_translation: T,
    ) -> Self {
        let lines = (0..geometry.num_blocks).map(|_| Line::new()).collect();
        Self {
            lines,
            geometry,
            replacement_policy,
            addr_translation,
        }
    }

    #[inline]
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    #[must_use]
    pub fn replacement_policy(&self) -> ReplacementPolicy {
        self.replacement_policy
    }

    #[inline]
    #[must_use]
    pub fn addr_translation(&self) -> &T {
        &self.addr_translation
    }

    /// The maximum number of tags this array can hold.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.lines.len()
    }

    /// Lines of the set with index `set_index`.
    #[inline]
    #[must_use]
    pub fn set(&self, set_index: usize) -> &[Line] {
        let assoc = self.geometry.associativity;
        &self.lines[set_index * assoc..(set_index + 1) * assoc]
    }

    /// Iterate over all sets.
    pub fn sets(&self) -> impl Iterator<Item = &[Line]> + '_ {
        self.lines.chunks(self.geometry.associativity)
    }

    /// Checks whether the block holding `addr` is cached, without side effects.
    #[must_use]
    pub fn contains(&self, addr: address) -> bool {
        let set_index = self.addr_translation.set_index(addr) as usize;
        let tag = self.addr_translation.tag(addr);
        self.set(set_index).iter().any(|line| line.matches(tag))
    }

    /// Probes the tag array, allocating the block on a miss.
    ///
    /// Prefetch probes never reorder the set on a hit.
    pub fn probe(&mut self, addr: address, is_prefetch: bool) -> cache::RequestStatus {
        let set_index = self.addr_translation.set_index(addr) as usize;
        let tag = self.addr_translation.tag(addr);
        let assoc = self.geometry.associativity;
        let replacement_policy = self.replacement_policy;
        let set = &mut self.lines[set_index * assoc..(set_index + 1) * assoc];

        let lookup = Lookup::scan(set, tag);
        log::trace!(
            "tag_array::probe(addr={}, prefetch={}) set_idx = {}, tag = {}, {:?}",
            addr,
            is_prefetch,
            set_index,
            tag,
            lookup,
        );

        if let Some(way) = lookup.hit {
            if replacement_policy == ReplacementPolicy::LRU && !is_prefetch {
                promote(set, way, lookup.max_rank);
            }
            return RequestStatus::HIT;
        }

        match lookup.empty {
            Some(way) => {
                let rank = if lookup.num_valid == 0 {
                    0
                } else {
                    lookup.max_rank + 1
                };
                log::trace!(
                    "tag_array::fill(set={}, way={}, tag={}, rank={})",
                    set_index,
                    way,
                    tag,
                    rank
                );
                set[way].fill(tag, rank);
            }
            None => {
                log::trace!(
                    "tag_array::evict(set={}, way={}, evicted={}, tag={})",
                    set_index,
                    lookup.victim,
                    set[lookup.victim],
                    tag
                );
                replace(set, lookup.victim, tag, lookup.max_rank);
            }
        }
        RequestStatus::MISS
    }
}

/// Moves the line at `way` to the highest rank.
///
/// Every line ranked above it moves down by one.
fn promote(set: &mut [Line], way: usize, max_rank: usize) {
    let rank = set[way].rank;
    for line in set.iter_mut().take_while(|line| line.valid) {
        if line.rank > rank {
            line.rank -= 1;
        }
    }
    set[way].rank = max_rank;
}

/// Replaces the rank 0 line of a full set with a new block.
fn replace(set: &mut [Line], victim: usize, tag: address, max_rank: usize) {
    for (way, line) in set.iter_mut().enumerate() {
        if way == victim {
            line.tag = tag;
            line.rank = max_rank;
        } else {
            line.rank -= 1;
        }
    }
}
