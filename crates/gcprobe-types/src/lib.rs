//! Core data types for gcprobe.
//!
//! Everything here is plain data: identities for objects and tracked handles,
//! cycle records produced by graph traversal, point-in-time memory snapshots,
//! collector state, and liveness reports. All types derive [`facet::Facet`] so
//! callers can emit them as JSON without extra glue.

use std::error::Error;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

mod collector;
mod cycles;
mod ids;
mod memory;
mod tracking;

pub use collector::{CollectionRecord, CollectorSnapshot, GenerationStats, GenerationSweep};
pub use cycles::{CycleRecord, CycleSearch};
pub use ids::{HandleId, ObjectId, ParseIdError};
pub use memory::{MemoryReading, MemoryReport, MemorySample, Snapshot, SnapshotDiff, TypeCount};
pub use tracking::{ReferenceKind, TrackedStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    EmptyCycle,
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCycle => write!(f, "cycle records must contain at least one node"),
        }
    }
}

impl Error for InvariantError {}

/// Wall-clock time in nanoseconds since the unix epoch.
pub fn now_unix_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}

/// Signed difference `to - from`, saturating at the `i64` range.
pub fn signed_delta(from: u64, to: u64) -> i64 {
    let delta = i128::from(to) - i128::from(from);
    delta.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_delta_is_antisymmetric() {
        assert_eq!(signed_delta(10, 25), 15);
        assert_eq!(signed_delta(25, 10), -15);
        assert_eq!(signed_delta(7, 7), 0);
    }

    #[test]
    fn signed_delta_saturates() {
        assert_eq!(signed_delta(0, u64::MAX), i64::MAX);
        assert_eq!(signed_delta(u64::MAX, 0), i64::MIN);
    }
}
