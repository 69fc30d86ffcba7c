//! Process memory gauges and time-series monitoring.

use std::time::{Duration, Instant};

use gcprobe_types::{MemoryReading, MemorySample, now_unix_ns};
use parking_lot::Mutex;
use sysinfo::{MemoryRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

use crate::collector::CollectorControl;
use crate::error::ProbeError;

const GAUGES_FEATURE: &str = "process memory gauges";

/// Source of process memory readings.
pub trait MemoryGauges: Send + Sync {
    /// Fails with [`ProbeError::FeatureUnavailable`] when the host has no way
    /// to introspect the process.
    fn read(&self) -> Result<MemoryReading, ProbeError>;
}

/// Gauges for the current process, read through `sysinfo`.
pub struct ProcessGauges {
    pid: Pid,
    system: Mutex<System>,
}

impl ProcessGauges {
    pub fn new() -> Result<Self, ProbeError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::unavailable(
                GAUGES_FEATURE,
                format!("unsupported platform: {}", std::env::consts::OS),
            ));
        }
        let pid = sysinfo::get_current_pid()
            .map_err(|reason| ProbeError::unavailable(GAUGES_FEATURE, reason))?;
        Ok(Self {
            pid,
            system: Mutex::new(System::new()),
        })
    }
}

impl MemoryGauges for ProcessGauges {
    fn read(&self) -> Result<MemoryReading, ProbeError> {
        let mut system = self.system.lock();
        system.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let process = system.process(self.pid).ok_or_else(|| {
            ProbeError::unavailable(GAUGES_FEATURE, format!("process {} not found", self.pid))
        })?;

        let resident_set_bytes = process.memory();
        let total = system.total_memory();
        let percent_of_system = if total == 0 {
            0.0
        } else {
            resident_set_bytes as f64 / total as f64 * 100.0
        };

        Ok(MemoryReading {
            resident_set_bytes,
            virtual_mem_bytes: process.virtual_memory(),
            percent_of_system,
        })
    }
}

impl<G: MemoryGauges + ?Sized> MemoryGauges for std::sync::Arc<G> {
    fn read(&self) -> Result<MemoryReading, ProbeError> {
        (**self).read()
    }
}

/// Sample memory and collector counters every `interval` until `duration`
/// has elapsed. At least one sample is always taken.
///
/// Fails with [`ProbeError::ZeroInterval`] before sampling when `interval` is
/// zero.
pub fn monitor<G, C>(
    gauges: &G,
    collector: &C,
    duration: Duration,
    interval: Duration,
) -> Result<Vec<MemorySample>, ProbeError>
where
    G: MemoryGauges + ?Sized,
    C: CollectorControl + ?Sized,
{
    if interval.is_zero() {
        return Err(ProbeError::ZeroInterval);
    }
    let started = Instant::now();
    let mut samples = Vec::new();
    loop {
        let reading = gauges.read()?;
        samples.push(MemorySample {
            timestamp_ns: now_unix_ns(),
            resident_set_bytes: reading.resident_set_bytes,
            virtual_mem_bytes: reading.virtual_mem_bytes,
            percent_of_system: reading.percent_of_system,
            tracked_objects: collector.tracked_object_count(),
            generation_counts: collector.counts(),
        });

        if started.elapsed() + interval >= duration {
            break;
        }
        std::thread::sleep(interval);
    }
    debug!(samples = samples.len(), ?duration, ?interval, "memory monitoring finished");
    Ok(samples)
}
