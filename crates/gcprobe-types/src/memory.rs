use facet::Facet;

use crate::{CollectorSnapshot, signed_delta};

/// Process memory gauges read from the operating system.
#[derive(Facet, Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryReading {
    pub resident_set_bytes: u64,
    pub virtual_mem_bytes: u64,
    /// Resident set as a percentage of total system memory.
    pub percent_of_system: f64,
}

/// A labeled point-in-time record of memory and collector state.
///
/// Snapshots are independent copies: clearing the store that produced one
/// does not affect values already handed out.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub label: String,
    pub timestamp_ns: i64,
    pub resident_set_bytes: u64,
    pub virtual_mem_bytes: u64,
    pub tracked_object_count: u64,
    pub collector_generation_counts: Vec<u32>,
}

impl Snapshot {
    /// Label used in reports; unlabeled snapshots are named by position.
    pub fn display_label(&self, index: usize) -> String {
        if self.label.is_empty() {
            format!("snapshot {index}")
        } else {
            self.label.clone()
        }
    }
}

/// Change between two snapshots, computed as `to - from`.
#[derive(Facet, Debug, Clone, PartialEq)]
pub struct SnapshotDiff {
    pub time_delta_secs: f64,
    pub resident_set_delta: i64,
    pub virtual_mem_delta: i64,
    pub tracked_object_count_delta: i64,
    pub label_from: String,
    pub label_to: String,
}

impl SnapshotDiff {
    pub fn between(from_index: usize, from: &Snapshot, to_index: usize, to: &Snapshot) -> Self {
        let time_delta_ns = i128::from(to.timestamp_ns) - i128::from(from.timestamp_ns);
        Self {
            time_delta_secs: time_delta_ns as f64 / 1e9,
            resident_set_delta: signed_delta(from.resident_set_bytes, to.resident_set_bytes),
            virtual_mem_delta: signed_delta(from.virtual_mem_bytes, to.virtual_mem_bytes),
            tracked_object_count_delta: signed_delta(
                from.tracked_object_count,
                to.tracked_object_count,
            ),
            label_from: from.display_label(from_index),
            label_to: to.display_label(to_index),
        }
    }
}

/// One sample taken while monitoring memory over time.
#[derive(Facet, Debug, Clone, PartialEq)]
pub struct MemorySample {
    pub timestamp_ns: i64,
    pub resident_set_bytes: u64,
    pub virtual_mem_bytes: u64,
    pub percent_of_system: f64,
    pub tracked_objects: u64,
    pub generation_counts: Vec<u32>,
}

#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct TypeCount {
    pub type_name: String,
    pub count: u64,
}

/// Combined memory and collector analysis at one instant.
#[derive(Facet, Debug, Clone, PartialEq)]
pub struct MemoryReport {
    pub timestamp_ns: i64,
    pub memory: MemoryReading,
    pub collector: CollectorSnapshot,
    /// Objects counted by the type census, or the collector's tracked total
    /// when the host has no census.
    pub total_objects: u64,
    /// Most common tracked object types, largest first. Empty when the host
    /// cannot enumerate its objects.
    pub top_types: Vec<TypeCount>,
}
