//! Labeled point-in-time memory snapshots.

use gcprobe_types::{Snapshot, SnapshotDiff, now_unix_ns};
use parking_lot::Mutex;
use tracing::debug;

use crate::collector::CollectorControl;
use crate::error::ProbeError;
use crate::gauges::MemoryGauges;

/// Ordered in-memory list of snapshots.
///
/// Indices are insertion order and stay stable until [`SnapshotStore::clear`];
/// nothing is evicted automatically.
pub struct SnapshotStore<G, C> {
    gauges: G,
    collector: C,
    snapshots: Mutex<Vec<Snapshot>>,
}

impl<G: MemoryGauges, C: CollectorControl> SnapshotStore<G, C> {
    pub fn new(gauges: G, collector: C) -> Self {
        Self {
            gauges,
            collector,
            snapshots: Mutex::new(Vec::new()),
        }
    }

    /// Read gauges and collector state, append the result, and return a copy.
    pub fn capture(&self, label: impl Into<String>) -> Result<Snapshot, ProbeError> {
        let reading = self.gauges.read()?;
        let snapshot = Snapshot {
            label: label.into(),
            timestamp_ns: now_unix_ns(),
            resident_set_bytes: reading.resident_set_bytes,
            virtual_mem_bytes: reading.virtual_mem_bytes,
            tracked_object_count: self.collector.tracked_object_count(),
            collector_generation_counts: self.collector.counts(),
        };

        let index = {
            let mut snapshots = self.snapshots.lock();
            snapshots.push(snapshot.clone());
            snapshots.len() - 1
        };
        debug!(
            index,
            label = %snapshot.label,
            rss = snapshot.resident_set_bytes,
            tracked_objects = snapshot.tracked_object_count,
            "captured snapshot"
        );
        Ok(snapshot)
    }

    /// Changes from snapshot `from` to snapshot `to`.
    pub fn diff(&self, from: usize, to: usize) -> Result<SnapshotDiff, ProbeError> {
        let snapshots = self.snapshots.lock();
        let len = snapshots.len();
        let first = snapshots
            .get(from)
            .ok_or(ProbeError::SnapshotOutOfRange { index: from, len })?;
        let second = snapshots
            .get(to)
            .ok_or(ProbeError::SnapshotOutOfRange { index: to, len })?;
        Ok(SnapshotDiff::between(from, first, to, second))
    }

    pub fn get(&self, index: usize) -> Option<Snapshot> {
        self.snapshots.lock().get(index).cloned()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }

    /// Drop every stored snapshot. Copies already returned stay valid.
    pub fn clear(&self) {
        self.snapshots.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeCollector, FakeGauges, NoGauges};
    use std::sync::Arc;

    fn store() -> (
        Arc<FakeGauges>,
        Arc<FakeCollector>,
        SnapshotStore<Arc<FakeGauges>, Arc<FakeCollector>>,
    ) {
        let gauges = Arc::new(FakeGauges::new(4096));
        let collector = Arc::new(FakeCollector::new(3));
        let store = SnapshotStore::new(gauges.clone(), collector.clone());
        (gauges, collector, store)
    }

    #[test]
    fn capture_appends_in_order() {
        let (gauges, collector, store) = store();
        let first = store.capture("first").expect("capture");
        gauges.set_resident(8192);
        collector.allocate(3, 0);
        let second = store.capture("second").expect("capture");

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0), Some(first));
        assert_eq!(store.get(1), Some(second.clone()));
        assert_eq!(second.resident_set_bytes, 8192);
        assert_eq!(second.tracked_object_count, 3);
        assert_eq!(second.collector_generation_counts, vec![3, 0, 0]);
    }

    #[test]
    fn diff_is_antisymmetric() {
        let (gauges, collector, store) = store();
        store.capture("a").expect("capture");
        gauges.set_resident(10_000);
        collector.allocate(50, 0);
        store.capture("b").expect("capture");

        let forward = store.diff(0, 1).expect("valid indices");
        let backward = store.diff(1, 0).expect("valid indices");
        assert_eq!(forward.resident_set_delta, 10_000 - 4096);
        assert_eq!(forward.resident_set_delta, -backward.resident_set_delta);
        assert_eq!(forward.virtual_mem_delta, -backward.virtual_mem_delta);
        assert_eq!(forward.tracked_object_count_delta, 50);
        assert_eq!(
            forward.tracked_object_count_delta,
            -backward.tracked_object_count_delta
        );
        assert_eq!(forward.time_delta_secs, -backward.time_delta_secs);
        assert_eq!((forward.label_from.as_str(), forward.label_to.as_str()), ("a", "b"));
        assert_eq!((backward.label_from.as_str(), backward.label_to.as_str()), ("b", "a"));
    }

    #[test]
    fn diff_rejects_out_of_range_indices() {
        let (_, _, store) = store();
        store.capture("only").expect("capture");
        assert_eq!(
            store.diff(0, 1).expect_err("index 1 does not exist"),
            ProbeError::SnapshotOutOfRange { index: 1, len: 1 }
        );
        assert_eq!(
            store.diff(5, 0).expect_err("index 5 does not exist"),
            ProbeError::SnapshotOutOfRange { index: 5, len: 1 }
        );
        assert!(store.diff(0, 0).is_ok());
    }

    #[test]
    fn clear_keeps_returned_snapshots() {
        let (_, _, store) = store();
        let kept = store.capture("kept").expect("capture");
        let listed = store.snapshots();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.get(0), None);
        assert!(matches!(
            store.diff(0, 0),
            Err(ProbeError::SnapshotOutOfRange { index: 0, len: 0 })
        ));
        assert_eq!(kept.label, "kept");
        assert_eq!(listed, vec![kept]);
    }

    #[test]
    fn missing_gauges_fail_without_storing() {
        let store = SnapshotStore::new(NoGauges, FakeCollector::new(3));
        let err = store.capture("x").expect_err("no gauges");
        assert!(matches!(
            err,
            ProbeError::FeatureUnavailable {
                feature: "process memory gauges",
                ..
            }
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn unlabeled_snapshots_diff_by_position() {
        let (_, _, store) = store();
        store.capture("").expect("capture");
        store.capture("").expect("capture");
        let diff = store.diff(0, 1).expect("valid indices");
        assert_eq!(diff.label_from, "snapshot 0");
        assert_eq!(diff.label_to, "snapshot 1");
    }
}
