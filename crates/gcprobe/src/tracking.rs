//! Liveness tracking through non-owning handles.
//!
//! Registration stores a [`Weak`] for shared objects, so the registry never
//! extends their lifetime. Values without shared ownership cannot be weakly
//! referenced; [`WeakTrackRegistry::track_strong`] takes ownership of those
//! instead and reports [`ReferenceKind::StrengthenedFallback`].

use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use gcprobe_types::{HandleId, ReferenceKind, TrackedStatus, now_unix_ns};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::ProbeError;

trait LivenessProbe: Send + Sync {
    fn is_alive(&self) -> bool;
}

impl<T: ?Sized + Send + Sync> LivenessProbe for Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

struct Owned(#[allow(dead_code)] Box<dyn Any + Send + Sync>);

impl LivenessProbe for Owned {
    fn is_alive(&self) -> bool {
        true
    }
}

struct TrackedEntry {
    probe: Box<dyn LivenessProbe>,
    reference_kind: ReferenceKind,
    label: String,
    type_name: &'static str,
    created_at_ns: i64,
}

impl TrackedEntry {
    fn status(&self) -> TrackedStatus {
        TrackedStatus {
            label: self.label.clone(),
            type_name: self.type_name.to_string(),
            created_at_ns: self.created_at_ns,
            alive: self.probe.is_alive(),
            reference_kind: self.reference_kind,
        }
    }
}

/// Registry of objects observed for liveness.
///
/// Every registration gets its own [`HandleId`]; registering the same object
/// twice creates two independent handles. Liveness is recomputed on every
/// read.
pub struct WeakTrackRegistry {
    entries: Mutex<BTreeMap<HandleId, Arc<TrackedEntry>>>,
    next_id: AtomicU64,
}

impl WeakTrackRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Observe a shared object without keeping it alive.
    pub fn track<T>(&self, object: &Arc<T>, label: impl Into<String>) -> HandleId
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert(
            Box::new(Arc::downgrade(object)),
            ReferenceKind::Weak,
            label.into(),
            type_name::<T>(),
        )
    }

    /// Observe a value that has no shared owner to downgrade. The registry
    /// keeps the value alive until the handle is removed.
    pub fn track_strong<T>(&self, object: T, label: impl Into<String>) -> HandleId
    where
        T: Send + Sync + 'static,
    {
        self.insert(
            Box::new(Owned(Box::new(object))),
            ReferenceKind::StrengthenedFallback,
            label.into(),
            type_name::<T>(),
        )
    }

    pub fn status(&self, id: HandleId) -> Result<TrackedStatus, ProbeError> {
        let entry = self
            .entries
            .lock()
            .get(&id)
            .cloned()
            .ok_or(ProbeError::HandleNotFound { id })?;
        Ok(entry.status())
    }

    /// Status of every handle, in registration order.
    pub fn list_all(&self) -> BTreeMap<HandleId, TrackedStatus> {
        let entries: Vec<(HandleId, Arc<TrackedEntry>)> = self
            .entries
            .lock()
            .iter()
            .map(|(id, entry)| (*id, Arc::clone(entry)))
            .collect();
        entries
            .into_iter()
            .map(|(id, entry)| (id, entry.status()))
            .collect()
    }

    /// Remove one handle, returning its final status.
    pub fn untrack(&self, id: HandleId) -> Result<TrackedStatus, ProbeError> {
        let entry = self
            .entries
            .lock()
            .remove(&id)
            .ok_or(ProbeError::HandleNotFound { id })?;
        Ok(entry.status())
    }

    pub fn alive_count(&self) -> usize {
        self.list_all().values().filter(|status| status.alive).count()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn insert(
        &self,
        probe: Box<dyn LivenessProbe>,
        reference_kind: ReferenceKind,
        label: String,
        type_name: &'static str,
    ) -> HandleId {
        let id = HandleId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(%id, %label, type_name, ?reference_kind, "tracking object");
        let entry = Arc::new(TrackedEntry {
            probe,
            reference_kind,
            label,
            type_name,
            created_at_ns: now_unix_ns(),
        });
        self.entries.lock().insert(id, entry);
        id
    }
}

impl Default for WeakTrackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
