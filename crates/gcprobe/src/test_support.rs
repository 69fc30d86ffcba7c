use parking_lot::Mutex;

use crate::collector::CollectorControl;
use crate::error::ProbeError;
use crate::gauges::MemoryGauges;
use gcprobe_types::{GenerationStats, MemoryReading, TypeCount};

/// In-memory stand-in for a generational host collector.
///
/// Objects are either live (reachable) or garbage (unreachable, waiting for a
/// collection). Any collection reclaims all garbage.
pub(crate) struct FakeCollector {
    state: Mutex<FakeState>,
}

struct FakeState {
    enabled: bool,
    counts: Vec<u32>,
    thresholds: Vec<u32>,
    stats: Vec<GenerationStats>,
    live: u64,
    garbage: u64,
    census: Vec<TypeCount>,
    debug_flags: u32,
}

impl FakeCollector {
    pub(crate) fn new(generations: usize) -> Self {
        Self {
            state: Mutex::new(FakeState {
                enabled: true,
                counts: vec![0; generations],
                thresholds: (0..generations)
                    .map(|g| if g == 0 { 700 } else { 10 })
                    .collect(),
                stats: vec![GenerationStats::default(); generations],
                live: 0,
                garbage: 0,
                census: Vec::new(),
                debug_flags: 0,
            }),
        }
    }

    pub(crate) fn allocate(&self, live: u64, garbage: u64) {
        let mut state = self.state.lock();
        state.live += live;
        state.garbage += garbage;
        if let Some(young) = state.counts.first_mut() {
            *young = young.saturating_add((live + garbage) as u32);
        }
    }

    pub(crate) fn set_census(&self, census: Vec<TypeCount>) {
        self.state.lock().census = census;
    }
}

impl CollectorControl for FakeCollector {
    fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    fn enable(&self) {
        self.state.lock().enabled = true;
    }

    fn disable(&self) {
        self.state.lock().enabled = false;
    }

    fn collect(&self, generation: usize) -> u64 {
        let mut state = self.state.lock();
        let collected = state.garbage;
        state.garbage = 0;
        let generations = state.counts.len();
        for g in 0..=generation.min(generations.saturating_sub(1)) {
            if generations == 0 {
                break;
            }
            state.counts[g] = 0;
            state.stats[g].collections += 1;
        }
        if generation < generations {
            state.stats[generation].collected += collected;
        }
        collected
    }

    fn counts(&self) -> Vec<u32> {
        self.state.lock().counts.clone()
    }

    fn thresholds(&self) -> Vec<u32> {
        self.state.lock().thresholds.clone()
    }

    fn set_thresholds(&self, thresholds: &[u32]) {
        self.state.lock().thresholds = thresholds.to_vec();
    }

    fn generation_stats(&self) -> Vec<GenerationStats> {
        self.state.lock().stats.clone()
    }

    fn tracked_object_count(&self) -> u64 {
        let state = self.state.lock();
        state.live + state.garbage
    }

    fn type_census(&self) -> Vec<TypeCount> {
        self.state.lock().census.clone()
    }

    fn set_debug(&self, flags: u32) {
        self.state.lock().debug_flags = flags;
    }

    fn debug_flags(&self) -> u32 {
        self.state.lock().debug_flags
    }
}

/// Gauges returning whatever reading the test last set.
pub(crate) struct FakeGauges {
    reading: Mutex<MemoryReading>,
}

impl FakeGauges {
    pub(crate) fn new(resident_set_bytes: u64) -> Self {
        Self {
            reading: Mutex::new(MemoryReading {
                resident_set_bytes,
                virtual_mem_bytes: resident_set_bytes * 4,
                percent_of_system: 0.5,
            }),
        }
    }

    pub(crate) fn set_resident(&self, resident_set_bytes: u64) {
        let mut reading = self.reading.lock();
        reading.resident_set_bytes = resident_set_bytes;
        reading.virtual_mem_bytes = resident_set_bytes * 4;
    }
}

impl MemoryGauges for FakeGauges {
    fn read(&self) -> Result<MemoryReading, ProbeError> {
        Ok(*self.reading.lock())
    }
}

/// Gauges for a host without any process-introspection facility.
pub(crate) struct NoGauges;

impl MemoryGauges for NoGauges {
    fn read(&self) -> Result<MemoryReading, ProbeError> {
        Err(ProbeError::unavailable(
            "process memory gauges",
            "no process-introspection facility installed",
        ))
    }
}
