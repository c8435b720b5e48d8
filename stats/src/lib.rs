#![allow(non_camel_case_types, clippy::upper_case_acronyms)]

pub mod cache;

pub use cache::{Cache, Counter};

use serde::{Deserialize, Serialize};

/// Statistics of one simulated cache instance.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Whether the instance prefetched the next block on a miss.
    pub prefetch: bool,
    pub cache: Cache,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    pub prefetch: bool,
    pub counter: Counter,
    pub value: u64,
}

impl Stats {
    #[must_use]
    pub fn new(prefetch: bool, cache: Cache) -> Self {
        Self { prefetch, cache }
    }

    pub fn flatten(self) -> Vec<CsvRow> {
        self.cache
            .flatten()
            .into_iter()
            .map(|(counter, value)| CsvRow {
                prefetch: self.prefetch,
                counter,
                value,
            })
            .collect()
    }
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Prefetch {}", u8::from(self.prefetch))?;
        writeln!(f, "Memory reads: {}", self.cache.mem_reads)?;
        writeln!(f, "Memory writes: {}", self.cache.mem_writes)?;
        writeln!(f, "Cache hits: {}", self.cache.hits)?;
        writeln!(f, "Cache misses: {}", self.cache.misses)
    }
}
