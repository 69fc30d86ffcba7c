//! Adapter over the host runtime's collector controls.
//!
//! The host collector is process-wide mutable state. Instead of calling it
//! through globals, [`CollectorFacade`] takes it as a [`CollectorControl`]
//! capability, which keeps the facade testable against a fake host.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gcprobe_types::{
    CollectionRecord, CollectorSnapshot, GenerationStats, GenerationSweep, TypeCount, now_unix_ns,
    signed_delta,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::ProbeError;

/// Debug flag asking the host collector to log statistics for each pass.
pub const DEBUG_STATS: u32 = 1;

/// Collector controls a host runtime exposes.
///
/// Generations are numbered from 0 (youngest). All methods reflect live host
/// state at call time.
pub trait CollectorControl: Send + Sync {
    fn is_enabled(&self) -> bool;

    fn enable(&self);

    fn disable(&self);

    /// Collect `generation` and every younger one. Returns the number of
    /// objects reclaimed.
    fn collect(&self, generation: usize) -> u64;

    /// Allocation counts per generation since each was last collected.
    fn counts(&self) -> Vec<u32>;

    fn thresholds(&self) -> Vec<u32>;

    /// Callers validate the arity; hosts may assume one value per generation.
    fn set_thresholds(&self, thresholds: &[u32]);

    fn generation_stats(&self) -> Vec<GenerationStats>;

    /// Number of objects the collector currently tracks.
    fn tracked_object_count(&self) -> u64;

    fn generation_count(&self) -> usize {
        self.counts().len()
    }

    /// Tracked objects grouped by type name. Hosts that cannot enumerate their
    /// objects keep the default, which reports nothing.
    fn type_census(&self) -> Vec<TypeCount> {
        Vec::new()
    }

    /// Replace the host collector's debug flags. Hosts without a debugging
    /// facility ignore the call and keep reporting 0.
    fn set_debug(&self, _flags: u32) {}

    fn debug_flags(&self) -> u32 {
        0
    }
}

impl<C: CollectorControl + ?Sized> CollectorControl for Arc<C> {
    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn enable(&self) {
        (**self).enable()
    }

    fn disable(&self) {
        (**self).disable()
    }

    fn collect(&self, generation: usize) -> u64 {
        (**self).collect(generation)
    }

    fn counts(&self) -> Vec<u32> {
        (**self).counts()
    }

    fn thresholds(&self) -> Vec<u32> {
        (**self).thresholds()
    }

    fn set_thresholds(&self, thresholds: &[u32]) {
        (**self).set_thresholds(thresholds)
    }

    fn generation_stats(&self) -> Vec<GenerationStats> {
        (**self).generation_stats()
    }

    fn tracked_object_count(&self) -> u64 {
        (**self).tracked_object_count()
    }

    fn generation_count(&self) -> usize {
        (**self).generation_count()
    }

    fn type_census(&self) -> Vec<TypeCount> {
        (**self).type_census()
    }

    fn set_debug(&self, flags: u32) {
        (**self).set_debug(flags)
    }

    fn debug_flags(&self) -> u32 {
        (**self).debug_flags()
    }
}

/// Host without a tracing collector: memory is reclaimed by reference
/// counting alone, as in a plain Rust process.
///
/// Exposes zero generations, never reclaims anything on request, and tracks no
/// objects. Only the enabled flag is kept.
#[derive(Debug)]
pub struct RefCountOnly {
    enabled: AtomicBool,
}

impl RefCountOnly {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }
}

impl Default for RefCountOnly {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorControl for RefCountOnly {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    fn collect(&self, _generation: usize) -> u64 {
        0
    }

    fn counts(&self) -> Vec<u32> {
        Vec::new()
    }

    fn thresholds(&self) -> Vec<u32> {
        Vec::new()
    }

    fn set_thresholds(&self, _thresholds: &[u32]) {}

    fn generation_stats(&self) -> Vec<GenerationStats> {
        Vec::new()
    }

    fn tracked_object_count(&self) -> u64 {
        0
    }
}

/// Thin wrapper over a host collector that keeps a history of forced
/// collections.
///
/// The history is append-only and unbounded; call
/// [`CollectorFacade::reset_history`] to release it.
pub struct CollectorFacade<C> {
    control: C,
    enabled: AtomicBool,
    history: Mutex<Vec<CollectionRecord>>,
}

impl<C: CollectorControl> CollectorFacade<C> {
    pub fn new(control: C) -> Self {
        let enabled = control.is_enabled();
        Self {
            control,
            enabled: AtomicBool::new(enabled),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn enable(&self) {
        self.control.enable();
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.control.disable();
        self.enabled.store(false, Ordering::Release);
    }

    /// Last enabled state set through this facade or observed by
    /// [`CollectorFacade::snapshot`].
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Full collection of the oldest generation.
    pub fn force_collect(&self) -> u64 {
        let oldest = self.control.generation_count().saturating_sub(1);
        self.collect_and_record(oldest)
    }

    pub fn force_collect_generation(&self, generation: usize) -> Result<u64, ProbeError> {
        let generations = self.control.generation_count();
        if generation >= generations {
            return Err(ProbeError::UnknownGeneration {
                generation,
                generations,
            });
        }
        Ok(self.collect_and_record(generation))
    }

    /// Collect every generation in turn, youngest first, reporting the tracked
    /// object count around each pass.
    pub fn collect_each_generation(&self) -> Vec<GenerationSweep> {
        (0..self.control.generation_count())
            .map(|generation| {
                let before_count = self.control.tracked_object_count();
                let collected = self.collect_and_record(generation);
                let after_count = self.control.tracked_object_count();
                GenerationSweep {
                    generation: generation as u32,
                    collected,
                    before_count,
                    after_count,
                    net_change: signed_delta(before_count, after_count),
                }
            })
            .collect()
    }

    pub fn stats(&self) -> Vec<GenerationStats> {
        self.control.generation_stats()
    }

    pub fn counts(&self) -> Vec<u32> {
        self.control.counts()
    }

    pub fn thresholds(&self) -> Vec<u32> {
        self.control.thresholds()
    }

    pub fn tracked_object_count(&self) -> u64 {
        self.control.tracked_object_count()
    }

    pub fn set_thresholds(&self, thresholds: &[u32]) -> Result<(), ProbeError> {
        let expected = self.control.generation_count();
        if thresholds.len() != expected {
            return Err(ProbeError::ThresholdArity {
                expected,
                got: thresholds.len(),
            });
        }
        self.control.set_thresholds(thresholds);
        Ok(())
    }

    /// Turn on host collector debugging, e.g. [`DEBUG_STATS`].
    pub fn set_debug(&self, flags: u32) {
        debug!(flags, "setting collector debug flags");
        self.control.set_debug(flags);
    }

    pub fn clear_debug(&self) {
        self.set_debug(0);
    }

    pub fn debug_flags(&self) -> u32 {
        self.control.debug_flags()
    }

    /// Current host collector state. Refreshes the cached enabled flag.
    pub fn snapshot(&self) -> CollectorSnapshot {
        let enabled = self.control.is_enabled();
        self.enabled.store(enabled, Ordering::Release);
        CollectorSnapshot {
            enabled,
            generation_counts: self.control.counts(),
            thresholds: self.control.thresholds(),
            per_generation_stats: self.control.generation_stats(),
            tracked_objects: self.control.tracked_object_count(),
        }
    }

    pub fn history(&self) -> Vec<CollectionRecord> {
        self.history.lock().clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn reset_history(&self) {
        self.history.lock().clear();
    }

    fn collect_and_record(&self, generation: usize) -> u64 {
        let collected = self.control.collect(generation);
        let record = CollectionRecord {
            timestamp_ns: now_unix_ns(),
            generation: generation as u32,
            collected,
            generation_counts: self.control.counts(),
            stats: self.control.generation_stats(),
            tracked_objects: self.control.tracked_object_count(),
        };
        debug!(
            generation,
            collected,
            tracked_objects = record.tracked_objects,
            "forced collection"
        );
        self.history.lock().push(record);
        collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCollector;

    #[test]
    fn enabled_flag_follows_host() {
        let host = Arc::new(FakeCollector::new(3));
        let facade = CollectorFacade::new(host.clone());
        assert!(facade.is_enabled());

        facade.disable();
        assert!(!facade.is_enabled());
        assert!(!host.is_enabled());

        // idempotent
        facade.disable();
        assert!(!host.is_enabled());

        facade.enable();
        facade.enable();
        assert!(facade.is_enabled());
        assert!(host.is_enabled());
    }

    #[test]
    fn snapshot_resyncs_enabled_flag() {
        let host = Arc::new(FakeCollector::new(3));
        let facade = CollectorFacade::new(host.clone());
        host.disable();
        assert!(facade.is_enabled(), "cache is only refreshed on snapshot");
        let snapshot = facade.snapshot();
        assert!(!snapshot.enabled);
        assert!(!facade.is_enabled());
    }

    #[test]
    fn force_collect_records_history() {
        let host = Arc::new(FakeCollector::new(3));
        host.allocate(5, 20);
        let facade = CollectorFacade::new(host.clone());

        assert_eq!(facade.force_collect(), 20);
        assert_eq!(facade.force_collect(), 0);

        let history = facade.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].generation, 2);
        assert_eq!(history[0].collected, 20);
        assert_eq!(history[0].tracked_objects, 5);
        assert_eq!(history[0].generation_counts, vec![0, 0, 0]);
        assert_eq!(history[1].stats[2].collections, 2);
        assert!(history[0].timestamp_ns <= history[1].timestamp_ns);
    }

    #[test]
    fn reset_history_leaves_returned_copies_intact() {
        let facade = CollectorFacade::new(FakeCollector::new(3));
        facade.force_collect();
        let copy = facade.history();
        facade.reset_history();
        assert_eq!(facade.history_len(), 0);
        assert_eq!(copy.len(), 1);
    }

    #[test]
    fn collecting_unknown_generation_fails() {
        let facade = CollectorFacade::new(FakeCollector::new(3));
        let err = facade
            .force_collect_generation(3)
            .expect_err("generation 3 does not exist");
        assert!(matches!(
            err,
            ProbeError::UnknownGeneration {
                generation: 3,
                generations: 3
            }
        ));
        assert_eq!(facade.history_len(), 0);
        assert_eq!(facade.force_collect_generation(0).expect("gen 0 exists"), 0);
        assert_eq!(facade.history_len(), 1);
    }

    #[test]
    fn collect_each_generation_reports_net_change() {
        let host = Arc::new(FakeCollector::new(3));
        host.allocate(10, 30);
        let facade = CollectorFacade::new(host);

        let sweeps = facade.collect_each_generation();
        assert_eq!(sweeps.len(), 3);
        assert_eq!(sweeps[0].before_count, 40);
        assert_eq!(sweeps[0].after_count, 10);
        assert_eq!(sweeps[0].net_change, -30);
        assert_eq!(sweeps[0].collected, 30);
        assert!(sweeps[1..].iter().all(|s| s.collected == 0 && s.net_change == 0));
        assert_eq!(facade.history_len(), 3);
    }

    #[test]
    fn thresholds_must_match_generation_count() {
        let facade = CollectorFacade::new(FakeCollector::new(3));
        let err = facade
            .set_thresholds(&[100, 5])
            .expect_err("two thresholds for three generations");
        assert_eq!(err, ProbeError::ThresholdArity { expected: 3, got: 2 });

        facade
            .set_thresholds(&[100, 5, 5])
            .expect("matching arity is accepted");
        assert_eq!(facade.thresholds(), vec![100, 5, 5]);
    }

    #[test]
    fn debug_flags_pass_through_to_host() {
        let host = Arc::new(FakeCollector::new(3));
        let facade = CollectorFacade::new(host.clone());
        assert_eq!(facade.debug_flags(), 0);

        facade.set_debug(DEBUG_STATS);
        assert_eq!(host.debug_flags(), DEBUG_STATS);
        assert_eq!(facade.debug_flags(), DEBUG_STATS);

        facade.clear_debug();
        assert_eq!(host.debug_flags(), 0);
    }

    #[test]
    fn ref_count_only_host_ignores_debug_flags() {
        let facade = CollectorFacade::new(RefCountOnly::new());
        facade.set_debug(DEBUG_STATS);
        assert_eq!(facade.debug_flags(), 0);
    }

    #[test]
    fn ref_count_only_host_has_nothing_to_collect() {
        let facade = CollectorFacade::new(RefCountOnly::new());
        assert_eq!(facade.force_collect(), 0);
        assert!(facade.counts().is_empty());
        assert!(facade.collect_each_generation().is_empty());
        facade.set_thresholds(&[]).expect("no generations, no thresholds");
        let snapshot = facade.snapshot();
        assert!(snapshot.enabled);
        assert_eq!(snapshot.tracked_objects, 0);
        assert_eq!(facade.history_len(), 1);
    }
}
