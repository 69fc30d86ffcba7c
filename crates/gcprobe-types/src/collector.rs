use facet::Facet;

/// Cumulative counters for one collector generation.
#[derive(Facet, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Number of collection passes run over this generation.
    pub collections: u64,
    /// Objects reclaimed by those passes.
    pub collected: u64,
    /// Objects found unreachable but not reclaimable.
    pub uncollectable: u64,
}

/// Collector state as the host reported it at one call.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct CollectorSnapshot {
    pub enabled: bool,
    /// Allocation counts per generation since their last collection.
    pub generation_counts: Vec<u32>,
    pub thresholds: Vec<u32>,
    pub per_generation_stats: Vec<GenerationStats>,
    /// Objects currently tracked by the collector.
    pub tracked_objects: u64,
}

/// One entry in the forced-collection history.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    pub timestamp_ns: i64,
    /// Generation that was collected.
    pub generation: u32,
    /// Objects the host reported as collected by this pass.
    pub collected: u64,
    pub generation_counts: Vec<u32>,
    pub stats: Vec<GenerationStats>,
    pub tracked_objects: u64,
}

/// Result of collecting a single generation during a full sweep.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct GenerationSweep {
    pub generation: u32,
    pub collected: u64,
    pub before_count: u64,
    pub after_count: u64,
    pub net_change: i64,
}
