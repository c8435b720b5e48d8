use crate::{address, cache, config, tag_array::TagArray, trace};

/// A simulated cache together with its access counters.
///
/// Instances share no state, so a driver can replay the same trace into
/// several of them side by side and compare their statistics.
#[derive(Debug)]
pub struct Simulation {
    tag_array: TagArray,
    prefetch: bool,
    stats: stats::Cache,
}

impl Simulation {
    /// Creates a simulation with all lines invalid and all counters zero.
    ///
    /// # Errors
    /// If the configuration does not describe a valid cache geometry.
    pub fn new(config: &config::Config) -> Result<Self, config::Error> {
        let geometry = config.geometry()?;
        Ok(Self::from_geometry(
            geometry,
            config.replacement_policy,
            config.prefetch,
        ))
    }

    #[must_use]
    pub fn from_geometry(
        geometry: cache::Geometry,
        replacement_policy: cache::ReplacementPolicy,
        prefetch: bool,
    ) -> Self {
        Self {
            tag_array: TagArray::new(geometry, replacement_policy),
            prefetch,
            stats: stats::Cache::default(),
        }
    }

    /// Performs a single memory access.
    ///
    /// On a miss with prefetching enabled, the following block is probed as
    /// well. The prefetch probe only counts towards memory reads.
    pub fn access(&mut self, is_write: bool, addr: address) {
        let status = self.probe(addr, false);
        self.stats.inc(status);
        if status.is_miss() && self.prefetch {
            let next_block = addr.wrapping_add(self.tag_array.geometry().block_size);
            let prefetch_status = self.probe(next_block, true);
            log::trace!(
                "sim::prefetch(addr={}, next_block={}) => {:?}",
                addr,
                next_block,
                prefetch_status
            );
        }
        if is_write {
            self.stats.mem_writes += 1;
        }
    }

    fn probe(&mut self, addr: address, is_prefetch: bool) -> cache::RequestStatus {
        let status = self.tag_array.probe(addr, is_prefetch);
        if status.is_miss() {
            self.stats.mem_reads += 1;
        }
        status
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> &stats::Cache {
        &self.stats
    }

    #[must_use]
    pub fn report(&self) -> stats::Stats {
        stats::Stats::new(self.prefetch, self.stats)
    }

    #[inline]
    #[must_use]
    pub fn is_prefetching(&self) -> bool {
        self.prefetch
    }

    #[inline]
    #[must_use]
    pub fn tag_array(&self) -> &TagArray {
        &self.tag_array
    }
}

/// Replays a trace into every simulation, in order.
///
/// # Returns
/// The number of accesses replayed.
///
/// # Errors
/// The first error reading the trace. Accesses before it have been applied.
pub fn replay<I>(simulations: &mut [Simulation], trace: I) -> Result<u64, trace::Error>
where
    I: IntoIterator<Item = Result<trace::Access, trace::Error>>,
{
    let mut num_accesses = 0;
    for access in trace {
        let access = access?;
        for sim in simulations.iter_mut() {
            sim.access(access.is_write, access.address);
        }
        num_accesses += 1;
    }
    log::debug!(
        "replayed {} accesses into {} simulation(s)",
        num_accesses,
        simulations.len()
    );
    Ok(num_accesses)
}
