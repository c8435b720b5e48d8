use crate::cache::config::{check_power_of_two, Geometry, ReplacementPolicy};

use serde::{Deserialize, Serialize};

/// A cache parameter that can be rejected during validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Parameter {
    CacheSize,
    Associativity,
    ReplacementPolicy,
    BlockSize,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("bad {parameter} value {value}: must be a power of two")]
    NotPowerOfTwo { parameter: Parameter, value: u64 },

    #[error("bad block_size value {block_size}: must be <= cache_size ({cache_size})")]
    BlockSizeExceedsCacheSize { block_size: u64, cache_size: u64 },

    #[error("bad associativity value {associativity}: must be <= the number of blocks ({num_blocks})")]
    AssociativityExceedsBlocks {
        associativity: usize,
        num_blocks: usize,
    },

    #[error("cache of {num_blocks} blocks is too large to simulate")]
    TooManyBlocks { num_blocks: u64 },

    #[error("failed to parse {parameter} from {value:?}")]
    Parse { parameter: Parameter, value: String },
}

/// Cache associativity.
///
/// Parsed from `direct`, `assoc` (fully associative) or `assoc:<n>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Associativity {
    /// One line per set.
    Direct,
    /// A single set holding every line.
    Full,
    /// `n` lines per set.
    Ways(usize),
}

impl Associativity {
    /// Number of lines per set for a cache of `num_blocks` lines.
    #[must_use]
    pub fn ways(self, num_blocks: usize) -> usize {
        match self {
            Self::Direct => 1,
            Self::Full => num_blocks,
            Self::Ways(n) => n,
        }
    }
}

impl std::str::FromStr for Associativity {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parse_err = || Error::Parse {
            parameter: Parameter::Associativity,
            value: value.to_string(),
        };
        match value.trim() {
            "direct" => Ok(Self::Direct),
            "assoc" => Ok(Self::Full),
            other => {
                let ways = other.strip_prefix("assoc:").ok_or_else(parse_err)?;
                let ways: usize = ways.parse().map_err(|_| parse_err())?;
                Ok(Self::Ways(ways))
            }
        }
    }
}

impl std::fmt::Display for Associativity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Full => write!(f, "assoc"),
            Self::Ways(n) => write!(f, "assoc:{n}"),
        }
    }
}

impl TryFrom<String> for Associativity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Associativity> for String {
    fn from(associativity: Associativity) -> Self {
        associativity.to_string()
    }
}

/// Configuration of a single simulated cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Total cache size in bytes.
    pub cache_size: u64,
    pub associativity: Associativity,
    /// Block size in bytes.
    pub block_size: u64,
    pub replacement_policy: ReplacementPolicy,
    /// Prefetch the next block on every miss.
    #[serde(default)]
    pub prefetch: bool,
}

/// Parses a replacement policy name (`fifo` or `lru`).
///
/// # Errors
/// If the name is not a known policy.
pub fn parse_replacement_policy(value: &str) -> Result<ReplacementPolicy, Error> {
    value.trim().parse().map_err(|_| Error::Parse {
        parameter: Parameter::ReplacementPolicy,
        value: value.to_string(),
    })
}

impl Config {
    /// Builds a configuration from unparsed command line values.
    ///
    /// # Errors
    /// Every violated constraint: the size checks of [`Config::errors`]
    /// followed by the parse failures.
    pub fn from_args(
        cache_size: u64,
        associativity: &str,
        replacement_policy: &str,
        block_size: u64,
    ) -> Result<Self, Vec<Error>> {
        let associativity = associativity.parse::<Associativity>();
        let replacement_policy = parse_replacement_policy(replacement_policy);

        // a direct mapped stand-in adds no errors of its own
        let config = Self {
            cache_size,
            associativity: associativity.clone().unwrap_or(Associativity::Direct),
            block_size,
            replacement_policy: replacement_policy.clone().unwrap_or(ReplacementPolicy::FIFO),
            prefetch: false,
        };
        let mut errors = config.errors();
        errors.extend(associativity.err());
        errors.extend(replacement_policy.err());
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }

    /// Validates the configuration and derives its geometry.
    ///
    /// # Errors
    /// The first constraint the configuration violates.
    pub fn geometry(&self) -> Result<Geometry, Error> {
        check_power_of_two(Parameter::CacheSize, self.cache_size)?;
        check_power_of_two(Parameter::BlockSize, self.block_size)?;
        let num_blocks = usize::try_from(self.cache_size / self.block_size).unwrap_or(usize::MAX);
        Geometry::new(
            self.cache_size,
            self.associativity.ways(num_blocks),
            self.block_size,
        )
    }

    /// Every constraint the configuration violates.
    ///
    /// Unlike [`Config::geometry`], this keeps checking after the first
    /// failure so that all bad parameters can be reported at once.
    #[must_use]
    pub fn errors(&self) -> Vec<Error> {
        let mut errors = Vec::new();
        let cache_size = check_power_of_two(Parameter::CacheSize, self.cache_size);
        let block_size = check_power_of_two(Parameter::BlockSize, self.block_size);
        let sizes_valid = cache_size.is_ok() && block_size.is_ok();
        errors.extend(cache_size.err());
        errors.extend(block_size.err());

        if sizes_valid {
            if self.block_size > self.cache_size {
                errors.push(Error::BlockSizeExceedsCacheSize {
                    block_size: self.block_size,
                    cache_size: self.cache_size,
                });
            } else if let Err(err) = self.geometry() {
                errors.push(err);
            }
        } else if let Associativity::Ways(n) = self.associativity {
            errors.extend(check_power_of_two(Parameter::Associativity, n as u64).err());
        }
        errors
    }
}
