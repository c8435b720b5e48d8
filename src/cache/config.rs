use crate::config::{Error, Parameter};

use serde::{Deserialize, Serialize};

/// A cache replacement policy
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReplacementPolicy {
    LRU,  // L
    FIFO, // F
}

/// Base 2 logarithm of a power of two.
#[inline]
#[must_use]
pub fn logb2(n: u64) -> u32 {
    n.max(1).ilog2()
}

/// Addressing geometry of a cache.
///
/// Derived once from the cache size, associativity and block size. All
/// three are powers of two, so an address decomposes by shifting and
/// masking only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    /// Total cache size in bytes.
    pub cache_size: u64,
    /// Number of lines per set.
    pub associativity: usize,
    /// Block (line) size in bytes.
    pub block_size: u64,

    /// Total number of lines.
    pub num_blocks: usize,
    /// Number of sets.
    pub num_sets: usize,
    pub block_offset_bits: u32,
    pub set_index_bits: u32,
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let size = human_bytes::human_bytes(self.cache_size as f64);
        write!(
            f,
            "{size} ({} set, {}-way, {} byte line)",
            self.num_sets, self.associativity, self.block_size
        )
    }
}

impl Geometry {
    /// Derives the geometry of a cache.
    ///
    /// # Errors
    /// If a size is not a power of two, the block size exceeds the cache
    /// size, or there are fewer blocks than ways.
    pub fn new(cache_size: u64, associativity: usize, block_size: u64) -> Result<Self, Error> {
        check_power_of_two(Parameter::CacheSize, cache_size)?;
        check_power_of_two(Parameter::BlockSize, block_size)?;
        if block_size > cache_size {
            return Err(Error::BlockSizeExceedsCacheSize {
                block_size,
                cache_size,
            });
        }
        let num_blocks = cache_size / block_size;
        let num_blocks =
            usize::try_from(num_blocks).map_err(|_| Error::TooManyBlocks { num_blocks })?;

        check_power_of_two(Parameter::Associativity, associativity as u64)?;
        if associativity > num_blocks {
            return Err(Error::AssociativityExceedsBlocks {
                associativity,
                num_blocks,
            });
        }

        let num_sets = num_blocks / associativity;
        Ok(Self {
            cache_size,
            associativity,
            block_size,
            num_blocks,
            num_sets,
            block_offset_bits: logb2(block_size),
            set_index_bits: logb2(num_sets as u64),
        })
    }

    #[inline]
    #[must_use]
    pub fn is_direct_mapped(&self) -> bool {
        self.associativity == 1
    }

    #[inline]
    #[must_use]
    pub fn is_fully_associative(&self) -> bool {
        self.num_sets == 1
    }
}

pub(crate) fn check_power_of_two(parameter: Parameter, value: u64) -> Result<(), Error> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(Error::NotPowerOfTwo { parameter, value })
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, ReplacementPolicy};
    use crate::config::{Error, Parameter};
    use similar_asserts as diff;

    #[test]
    fn test_direct_mapped() -> Result<(), Error> {
        let geometry = Geometry::new(1024, 1, 16)?;
        diff::assert_eq!(
            have: geometry,
            want: Geometry {
                cache_size: 1024,
                associativity: 1,
                block_size: 16,
                num_blocks: 64,
                num_sets: 64,
                block_offset_bits: 4,
                set_index_bits: 6,
            }
        );
        assert!(geometry.is_direct_mapped());
        assert!(!geometry.is_fully_associative());
        Ok(())
    }

    #[test]
    fn test_fully_associative() -> Result<(), Error> {
        let geometry = Geometry::new(256, 8, 32)?;
        diff::assert_eq!(have: geometry.num_blocks, want: 8);
        diff::assert_eq!(have: geometry.num_sets, want: 1);
        diff::assert_eq!(have: geometry.set_index_bits, want: 0);
        diff::assert_eq!(have: geometry.block_offset_bits, want: 5);
        assert!(geometry.is_fully_associative());
        Ok(())
    }

    #[test]
    fn test_set_associative() -> Result<(), Error> {
        let geometry = Geometry::new(256, 2, 32)?;
        diff::assert_eq!(have: geometry.num_sets, want: 4);
        diff::assert_eq!(have: geometry.set_index_bits, want: 2);
        assert!(geometry
            .to_string()
            .ends_with("(4 set, 2-way, 32 byte line)"));
        Ok(())
    }

    #[test]
    fn test_block_as_large_as_cache() -> Result<(), Error> {
        let geometry = Geometry::new(64, 1, 64)?;
        diff::assert_eq!(have: geometry.num_blocks, want: 1);
        diff::assert_eq!(have: geometry.num_sets, want: 1);
        diff::assert_eq!(have: geometry.set_index_bits, want: 0);
        Ok(())
    }

    #[test]
    fn test_invalid_geometry() {
        diff::assert_eq!(
            have: Geometry::new(1000, 1, 16),
            want: Err(Error::NotPowerOfTwo {
                parameter: Parameter::CacheSize,
                value: 1000
            })
        );
        diff::assert_eq!(
            have: Geometry::new(1024, 1, 0),
            want: Err(Error::NotPowerOfTwo {
                parameter: Parameter::BlockSize,
                value: 0
            })
        );
        diff::assert_eq!(
            have: Geometry::new(1024, 3, 16),
            want: Err(Error::NotPowerOfTwo {
                parameter: Parameter::Associativity,
                value: 3
            })
        );
        diff::assert_eq!(
            have: Geometry::new(16, 1, 32),
            want: Err(Error::BlockSizeExceedsCacheSize {
                block_size: 32,
                cache_size: 16
            })
        );
        diff::assert_eq!(
            have: Geometry::new(256, 16, 32),
            want: Err(Error::AssociativityExceedsBlocks {
                associativity: 16,
                num_blocks: 8
            })
        );
    }

    #[test]
    fn test_parse_replacement_policy() {
        assert_eq!(
            "lru".parse::<ReplacementPolicy>().ok(),
            Some(ReplacementPolicy::LRU)
        );
        assert_eq!(
            "FIFO".parse::<ReplacementPolicy>().ok(),
            Some(ReplacementPolicy::FIFO)
        );
        assert!("random".parse::<ReplacementPolicy>().is_err());
        diff::assert_eq!(have: ReplacementPolicy::FIFO.to_string(), want: "fifo");
    }
}
