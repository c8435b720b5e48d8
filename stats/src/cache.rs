use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

#[derive(
    Debug,
    strum::EnumIter,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub enum RequestStatus {
    HIT = 0,
    MISS,
}

/// The counters tracked for every simulated cache.
#[derive(
    Debug,
    strum::EnumIter,
    strum::Display,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    MemReads,
    MemWrites,
    Hits,
    Misses,
}

pub type CacheCsvRow = (Counter, u64);

/// Access counters of a single cache.
///
/// `mem_reads` counts every block fetched from memory, which includes
/// blocks brought in by a prefetch probe. `hits` and `misses` only count
/// demand accesses.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cache {
    pub mem_reads: u64,
    pub mem_writes: u64,
    pub hits: u64,
    pub misses: u64,
}

impl Cache {
    #[inline]
    pub fn inc(&mut self, status: impl Into<RequestStatus>) {
        match status.into() {
            RequestStatus::HIT => self.hits += 1,
            RequestStatus::MISS => self.misses += 1,
        }
    }

    #[must_use]
    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::MemReads => self.mem_reads,
            Counter::MemWrites => self.mem_writes,
            Counter::Hits => self.hits,
            Counter::Misses => self.misses,
        }
    }

    #[must_use]
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of demand accesses that hit, or `None` before the first access.
    #[must_use]
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.total_accesses();
        if total == 0 {
            return None;
        }
        Some(self.hits as f64 / total as f64)
    }

    pub fn flatten(self) -> Vec<CacheCsvRow> {
        Counter::iter()
            .map(|counter| (counter, self.get(counter)))
            .collect()
    }
}

impl std::ops::AddAssign for Cache {
    fn add_assign(&mut self, other: Self) {
        self.mem_reads += other.mem_reads;
        self.mem_writes += other.mem_writes;
        self.hits += other.hits;
        self.misses += other.misses;
    }
}
