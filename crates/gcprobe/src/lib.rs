//! Runtime memory introspection for a live process.
//!
//! gcprobe looks at a process from the inside: it walks the object reference
//! graph looking for cycles, records labeled snapshots of memory gauges and
//! collector state, and tracks the liveness of chosen objects without keeping
//! them alive.
//!
//! The pieces are independent and meant to be composed by a caller:
//!
//! - [`CycleDetector`] explores the graph reachable from a root, up to a depth
//!   bound, over any [`ReferenceGraph`].
//! - [`SnapshotStore`] captures [`Snapshot`]s and diffs them.
//! - [`WeakTrackRegistry`] observes objects through non-owning handles.
//! - [`CollectorFacade`] wraps the host collector behind [`CollectorControl`].
//!
//! The host runtime is injected as capabilities ([`CollectorControl`],
//! [`MemoryGauges`], [`ReferenceGraph`]) rather than reached through globals, so
//! every component can run against a fake host in tests.
//!
//! # Logging
//!
//! The library emits `tracing` events and never installs a subscriber.
//!
//! # Configuration
//!
//! [`ProbeConfig::from_env`] reads `GCPROBE_MAX_DEPTH`, `GCPROBE_NODE_BUDGET`,
//! `GCPROBE_MONITOR_INTERVAL_MS` and `GCPROBE_MONITOR_DURATION_MS`.

pub mod collector;
pub mod config;
pub mod cycles;
pub mod error;
pub mod gauges;
pub mod graph;
pub mod report;
pub mod snapshot;
pub mod tracking;

#[cfg(test)]
mod test_support;

pub use collector::{CollectorControl, CollectorFacade, DEBUG_STATS, RefCountOnly};
pub use config::ProbeConfig;
pub use cycles::CycleDetector;
pub use error::{IntrospectionDenied, ProbeError};
pub use gauges::{MemoryGauges, ProcessGauges, monitor};
pub use graph::{AdjacencyGraph, ArcGraph, GraphDocument, GraphError, ReferenceGraph, Traceable};
pub use report::gather_report;
pub use snapshot::SnapshotStore;
pub use tracking::WeakTrackRegistry;

pub use gcprobe_types::{
    CollectionRecord, CollectorSnapshot, CycleRecord, CycleSearch, GenerationStats,
    GenerationSweep, HandleId, MemoryReading, MemoryReport, MemorySample, ObjectId,
    ReferenceKind, Snapshot, SnapshotDiff, TrackedStatus, TypeCount,
};
